//! Selection of analyses by identifier.
//!
//! A driver owns an [AnalysisRegistry], populated with the analyses it wants to make available,
//! and looks them up by [AnalysisKind], which can in turn be parsed from a textual identifier.
use core::{any::Any, fmt, str::FromStr};
use std::collections::BTreeMap;

use dataflow_ir::{DefUse, Graph, InvertibleGraph, LabeledGraph};

use crate::{DataFlowAnalysis, DataFlowResult, DataFlowSolver, LiveVariableAnalysis, SolverError};

/// The analyses known to this crate
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnalysisKind {
    /// See [LiveVariableAnalysis]
    LiveVariables,
}

impl AnalysisKind {
    /// All known analyses
    pub const ALL: &'static [Self] = &[Self::LiveVariables];

    /// The textual identifier of this analysis
    pub const fn id(self) -> &'static str {
        match self {
            Self::LiveVariables => LiveVariableAnalysis::ID,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AnalysisKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| SolverError::UnknownAnalysis(s.to_string()))
    }
}

/// An analysis whose result type has been erased, so that analyses with different fact types can
/// be stored side by side.
trait ErasedAnalysis<G> {
    fn solve_erased(
        &self,
        solver: &mut DataFlowSolver,
        graph: &G,
    ) -> Result<Box<dyn Any>, SolverError>;
}

impl<G, A> ErasedAnalysis<G> for A
where
    G: InvertibleGraph,
    <G as Graph>::Node: 'static,
    A: DataFlowAnalysis<G>,
    A::Fact: 'static,
{
    fn solve_erased(
        &self,
        solver: &mut DataFlowSolver,
        graph: &G,
    ) -> Result<Box<dyn Any>, SolverError> {
        let result = solver.solve(graph, self)?;
        Ok(Box::new(result))
    }
}

/// A set of analyses which can be run over graphs of type `G`, keyed by [AnalysisKind]
pub struct AnalysisRegistry<G> {
    analyses: BTreeMap<AnalysisKind, Box<dyn ErasedAnalysis<G>>>,
}

impl<G> Default for AnalysisRegistry<G> {
    fn default() -> Self {
        Self {
            analyses: BTreeMap::new(),
        }
    }
}

impl<G> AnalysisRegistry<G>
where
    G: InvertibleGraph,
    <G as Graph>::Node: 'static,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `analysis` as the implementation of `kind`, replacing any previous registration
    pub fn register<A>(&mut self, kind: AnalysisKind, analysis: A) -> &mut Self
    where
        A: DataFlowAnalysis<G> + 'static,
        A::Fact: 'static,
    {
        if self.analyses.insert(kind, Box::new(analysis)).is_some() {
            log::debug!(target: "dataflow-registry", "replaced registration of '{kind}'");
        }
        self
    }

    /// Returns true if an analysis has been registered for `kind`
    pub fn contains(&self, kind: AnalysisKind) -> bool {
        self.analyses.contains_key(&kind)
    }

    /// Iterate over the registered kinds, in a stable order
    pub fn kinds(&self) -> impl ExactSizeIterator<Item = AnalysisKind> + '_ {
        self.analyses.keys().copied()
    }

    /// Run the analysis registered for `kind` over `graph`.
    ///
    /// The result is the [DataFlowResult] produced by the solver, with its type erased.
    pub fn run(
        &self,
        kind: AnalysisKind,
        solver: &mut DataFlowSolver,
        graph: &G,
    ) -> Result<Box<dyn Any>, SolverError> {
        let analysis = self
            .analyses
            .get(&kind)
            .ok_or(SolverError::UnregisteredAnalysis(kind.id()))?;
        log::debug!(target: "dataflow-registry", "running '{kind}'");
        analysis.solve_erased(solver, graph)
    }

    /// Run the analysis registered for `kind` over `graph`, and recover the result type of `A`.
    ///
    /// Fails with [SolverError::ResultTypeMismatch] if the analysis registered for `kind` has a
    /// different fact type than `A`.
    pub fn run_as<A>(
        &self,
        kind: AnalysisKind,
        solver: &mut DataFlowSolver,
        graph: &G,
    ) -> Result<DataFlowResult<<G as Graph>::Node, A::Fact>, SolverError>
    where
        A: DataFlowAnalysis<G>,
        A::Fact: 'static,
    {
        self.run(kind, solver, graph)?
            .downcast::<DataFlowResult<<G as Graph>::Node, A::Fact>>()
            .map(|result| *result)
            .map_err(|_| SolverError::ResultTypeMismatch {
                analysis: kind.id(),
            })
    }
}

impl<G> AnalysisRegistry<G>
where
    G: LabeledGraph,
    <G as Graph>::Node: 'static,
    <G as LabeledGraph>::Label: DefUse,
    <<G as LabeledGraph>::Label as DefUse>::Var: 'static,
{
    /// Create a registry populated with every analysis provided by this crate
    pub fn with_builtin_analyses() -> Self {
        let mut registry = Self::new();
        registry.register(AnalysisKind::LiveVariables, LiveVariableAnalysis);
        registry
    }
}

impl<G> fmt::Debug for AnalysisRegistry<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.analyses.keys()).finish()
    }
}
