use dataflow_ir::{Direction, Graph, InvertibleGraph};

use crate::{ChangeResult, DataFlowFact, FlowDirection};

/// This trait describes a single dataflow analysis, in terms of the pieces the
/// [crate::DataFlowSolver] needs in order to compute its fixpoint over a graph of type `G`:
///
/// * The direction in which information flows, see [FlowDirection]
/// * The boundary fact, which holds at the entry node of a forward analysis, or the exit node of a
///   backward analysis
/// * The initial fact, held by every other node before the first iteration
/// * The meet operator, combining the facts of multiple flow sources into one
/// * The transfer function, deriving one side of a node's facts from the other
///
/// An analysis is stateless with respect to the nodes it visits: it is borrowed immutably for the
/// duration of a run, and everything it needs to know about a node is derived from the graph and
/// the facts passed to [DataFlowAnalysis::transfer_node].
///
/// ## Well-formedness
///
/// The solver is guaranteed to reach a fixpoint in a bounded number of iterations only if the
/// analysis is monotone over a lattice of finite height:
///
/// * [DataFlowAnalysis::new_initial_fact] must return the bottom element of the lattice, with
///   respect to the meet operator
/// * [DataFlowAnalysis::meet_into] must be commutative, associative and idempotent, so that the
///   order in which flow sources are visited does not matter
/// * [DataFlowAnalysis::transfer_node] must never remove information from the fact it updates
///
/// See [crate::SolverConfig] for the safeguards the solver offers against analyses which violate
/// these requirements.
pub trait DataFlowAnalysis<G: InvertibleGraph> {
    /// The direction in which information is propagated, i.e. [dataflow_ir::Forward] or
    /// [dataflow_ir::Backward]
    type Direction: FlowDirection;
    /// The type of fact computed for each side of each node
    type Fact: DataFlowFact;

    /// The name of this analysis, used as the target of its log messages and in diagnostics
    fn debug_name(&self) -> &'static str;

    /// Returns true if information flows in control-flow order, i.e. from entry to exit
    #[inline]
    fn is_forward(&self) -> bool {
        <Self::Direction as Direction>::is_forward()
    }

    /// Create the fact injected at the boundary of `graph` before the first iteration
    fn new_boundary_fact(&self, graph: &G) -> Self::Fact;

    /// Create the fact assigned to every non-boundary node before the first iteration
    fn new_initial_fact(&self) -> Self::Fact;

    /// Meet `fact` into `target`, i.e. `target ← target ⊔ fact`
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Apply the transfer function of `node`.
    ///
    /// For a forward analysis, this derives `out_fact` from `in_fact`, and vice versa for a backward
    /// analysis. The result must be [ChangeResult::Changed] if, and only if, the derived fact was
    /// modified by this call.
    fn transfer_node(
        &self,
        graph: &G,
        node: <G as Graph>::Node,
        in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> ChangeResult;
}
