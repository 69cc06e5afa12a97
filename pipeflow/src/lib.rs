//! Pipeflow: flow-controlled streaming interconnect with valid/ready handshake combinators.
//!
//! Data items move between synchronous components over *pipes*: a [`PipeSpec`]
//! describes an item's shape, a [`PipeInlet`]/[`PipeOutlet`] pair instantiates
//! that shape as a directional signal bundle, and a [`Pipeline`] wires matching
//! endpoints of adjacent stages together. All state lives in a [`Design`]
//! arena and advances once per global clock tick.

// # Tries to deny most lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
//
#![deny(unreachable_pub)]
//
#![allow(elided_lifetimes_in_paths)]

pub mod design;
pub mod endpoint;
pub mod pipeline;
pub mod signal;
pub mod spec;
pub mod utils;

pub use design::{Component, Design, OpenEndpoint, SimError};
pub use endpoint::{connect, ConnectError, Connection, EndpointKind, PipeInlet, PipeOutlet};
pub use pipeline::{MatchPolicy, Pipeline, PipelineError, Stage};
pub use signal::{Shape, Signal};
pub use spec::{
    Field, PayloadShape, PipeSpec, PortName, SignalDesc, SignalDirection, SpecError, DATA_SIZE, START_STOP,
};
pub use utils::*;
