use miette::Diagnostic;

use crate::FactSide;

/// The errors which may be reported by the [crate::DataFlowSolver]
///
/// Node handles are rendered using their `Debug` implementation, so that this type need not be
/// generic over the graph being analyzed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum SolverError {
    #[error("cannot run '{analysis}' on an empty graph")]
    #[diagnostic(help("a graph must contain at least an entry and an exit node"))]
    EmptyGraph { analysis: &'static str },
    #[error("invalid {direction} analysis '{analysis}': boundary node {node} is not reachable")]
    #[diagnostic(help(
        "the exit node of a control-flow graph must be reachable from its entry node"
    ))]
    UnreachableBoundary {
        analysis: &'static str,
        direction: &'static str,
        node: String,
    },
    #[error(
        "invalid {direction} analysis '{analysis}': boundary node {node} has {count} incoming \
         flow edge(s)"
    )]
    #[diagnostic(help(
        "a forward analysis requires an entry node without predecessors, and a backward analysis \
         requires an exit node without successors"
    ))]
    BoundaryHasFlowEdges {
        analysis: &'static str,
        direction: &'static str,
        node: String,
        count: usize,
    },
    #[error("analysis '{analysis}' did not converge within {limit} passes")]
    #[diagnostic(help("this usually indicates a meet or transfer function which is not monotone"))]
    IterationLimitExceeded { analysis: &'static str, limit: usize },
    #[error("the transfer function of '{analysis}' is not monotone at node {node}")]
    #[diagnostic(help("transfer functions must never remove information from the fact they update"))]
    NonMonotonicTransfer { analysis: &'static str, node: String },
    #[error(
        "the transfer function of '{analysis}' reported {reported} at node {node}, but the fact \
         was {actual}"
    )]
    InexactChangeFlag {
        analysis: &'static str,
        node: String,
        reported: &'static str,
        actual: &'static str,
    },
    #[error("the results of '{analysis}' are not a fixpoint: {side} fact of node {node} changed")]
    NotAFixpoint {
        analysis: &'static str,
        node: String,
        side: FactSide,
    },
    #[error("the results of '{analysis}' have no facts for node {node}")]
    MissingFacts { analysis: &'static str, node: String },
    #[error("unknown analysis '{0}'")]
    UnknownAnalysis(String),
    #[error("analysis '{0}' has not been registered")]
    UnregisteredAnalysis(&'static str),
    #[error("the results of analysis '{analysis}' are not of the requested type")]
    #[diagnostic(help("the fact type of the requested analysis must match the registered one"))]
    ResultTypeMismatch { analysis: &'static str },
}
