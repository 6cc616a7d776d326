//! An iterative dataflow engine: a [DataFlowSolver] which runs any [DataFlowAnalysis] over a
//! control-flow graph until the facts it computes for each node reach a fixpoint.
//!
//! Analyses are described by their direction, boundary and initial facts, meet operator and
//! transfer function. See [analyses] for the analyses provided by this crate, and
//! [AnalysisRegistry] for selecting analyses by identifier.
#![deny(warnings)]

extern crate alloc;

pub mod analyses;
mod analysis;
mod change_result;
mod config;
mod direction;
mod error;
mod fact;
pub mod registry;
mod result;
mod solver;

pub use self::{
    analyses::{LiveVariableAnalysis, Liveness},
    analysis::DataFlowAnalysis,
    change_result::ChangeResult,
    config::{DEFAULT_MAX_PASSES, SolveStrategy, SolverConfig},
    direction::{FactSide, FlowDirection},
    error::SolverError,
    fact::{DataFlowFact, SetFact},
    registry::{AnalysisKind, AnalysisRegistry},
    result::{DataFlowResult, NodeFacts, SolveStats},
    solver::{DataFlowSolver, SolverState},
};
