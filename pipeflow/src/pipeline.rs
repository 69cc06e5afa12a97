//! Pipeline composition: discovering and wiring adjacent stages.

use itertools::Itertools;
use thiserror::Error;

use crate::design::{Component, Design};
use crate::endpoint::{connect, ConnectError, Connection, PipeInlet, PipeOutlet};

/// A component that can participate in a pipeline.
///
/// Stages declare their endpoints explicitly, in declaration order; the
/// composer never scans for anything that merely looks like an endpoint.
/// Producers expose [`PipeInlet`]s, consumers expose [`PipeOutlet`]s, and a
/// stage in the middle of a pipeline exposes both.
pub trait Stage: Component {
    /// The stage's inlets, in declaration order.
    fn inlets(&self) -> Vec<&PipeInlet> {
        Vec::new()
    }

    /// The stage's outlets, in declaration order.
    fn outlets(&self) -> Vec<&PipeOutlet> {
        Vec::new()
    }
}

/// How the composer resolves several compatible endpoint pairs between two
/// stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Connect the first inlet / first outlet pair in declaration order.
    #[default]
    FirstDeclared,
    /// Reject ambiguous configurations outright.
    RequireUnique,
}

/// Composition failures, each a distinct wiring-time configuration error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A producing stage exposes no inlets.
    #[error("stage `{stage}` exposes no pipe inlets")]
    NoInlets {
        /// Stage name.
        stage: String,
    },
    /// A consuming stage exposes no outlets.
    #[error("stage `{stage}` exposes no pipe outlets")]
    NoOutlets {
        /// Stage name.
        stage: String,
    },
    /// No inlet/outlet pair between the two stages has structurally equal
    /// specs.
    #[error("stages `{producer}` and `{consumer}` have no matching pipe endpoints")]
    NoMatch {
        /// Producing stage name.
        producer: String,
        /// Consuming stage name.
        consumer: String,
    },
    /// Several pairs match and the policy is [`MatchPolicy::RequireUnique`].
    #[error("stages `{producer}` and `{consumer}` have {count} matching endpoint pairs")]
    AmbiguousMatch {
        /// Producing stage name.
        producer: String,
        /// Consuming stage name.
        consumer: String,
        /// Number of compatible pairs found.
        count: usize,
    },
    /// A matched endpoint could not be connected.
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Wires an ordered sequence of stages into a pipeline.
///
/// For each adjacent (producer, consumer) pair the composer enumerates the
/// producer's inlets and the consumer's outlets and connects exactly one
/// pair with structurally equal specs. Endpoints that take no part in a
/// connection stay open; run [`Design::check_endpoints`] after composition
/// to have them reported.
#[derive(Debug, Default)]
pub struct Pipeline {
    policy: MatchPolicy,
}

impl Pipeline {
    /// A composer with the default [`MatchPolicy::FirstDeclared`] tie-break.
    pub fn new() -> Self {
        Self::default()
    }

    /// A composer with an explicit match policy.
    pub fn with_policy(policy: MatchPolicy) -> Self {
        Pipeline { policy }
    }

    /// Connects every adjacent stage pair, returning the connections made.
    pub fn compose(&self, design: &mut Design, stages: &[&dyn Stage]) -> Result<Vec<Connection>, PipelineError> {
        let mut connections = Vec::new();
        for (producer, consumer) in stages.iter().tuple_windows() {
            let inlets = producer.inlets();
            if inlets.is_empty() {
                return Err(PipelineError::NoInlets { stage: producer.name().to_string() });
            }
            let outlets = consumer.outlets();
            if outlets.is_empty() {
                return Err(PipelineError::NoOutlets { stage: consumer.name().to_string() });
            }

            let mut candidates = inlets
                .iter()
                .cartesian_product(outlets.iter())
                .filter(|(inlet, outlet)| inlet.spec() == outlet.spec());
            let (inlet, outlet) = match candidates.next() {
                Some(pair) => pair,
                None => {
                    return Err(PipelineError::NoMatch {
                        producer: producer.name().to_string(),
                        consumer: consumer.name().to_string(),
                    });
                }
            };
            if self.policy == MatchPolicy::RequireUnique {
                let rest = candidates.count();
                if rest > 0 {
                    return Err(PipelineError::AmbiguousMatch {
                        producer: producer.name().to_string(),
                        consumer: consumer.name().to_string(),
                        count: rest + 1,
                    });
                }
            }

            let connection = connect(design, *inlet, *outlet)?;
            log::debug!(
                "pipeline: connected `{}` -> `{}` ({} signals)",
                connection.inlet,
                connection.outlet,
                connection.len(),
            );
            connections.push(connection);
        }
        Ok(connections)
    }
}
