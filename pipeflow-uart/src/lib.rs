//! Asynchronous-serial (UART) engine for pipeflow designs.
//!
//! The line protocol is fixed: idle-high, one start bit (0), `data_bits`
//! data bits LSB-first, one stop bit (1), no parity. Word width and the
//! tick-per-bit divisor are the only knobs. [`UartRx`]/[`UartTx`] expose the
//! raw register interface; the [`pipe`] adapters wrap them behind pipe
//! endpoints so a UART can sit in a [`pipeflow::Pipeline`].

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

pub mod pipe;
pub mod rx;
pub mod timer;
pub mod tx;
pub mod uart;

pub use pipe::{PipeUart, PipeUartRx, PipeUartTx};
pub use rx::UartRx;
pub use timer::{BitTimer, UartError};
pub use tx::UartTx;
pub use uart::Uart;
