use core::hash::Hash;

use dataflow_ir::{Backward, DefUse, Graph, LabeledGraph};

use crate::{ChangeResult, DataFlowAnalysis, DataFlowResult, DataFlowSolver, SetFact, SolverError};

/// This analysis computes the set of variables which are live on entry to, and on exit from, each
/// node of a control-flow graph whose nodes are labeled with statements.
///
/// A variable is live at a program point if there is a path from that point to a use of the
/// variable which does not pass through a definition of it. Information flows backward: the live
/// variables on exit from a node are the union of those live on entry to its successors, and the
/// live variables on entry to a node are derived from those live on exit by the usual equation:
///
/// ```text
/// IN[n] = uses(n) ∪ (OUT[n] - def(n))
/// ```
///
/// Nothing is live on exit from the exit node, and every other node starts out with nothing live.
/// Only variables are tracked: constant operands never become live.
#[derive(Debug, Default, Copy, Clone)]
pub struct LiveVariableAnalysis;

impl LiveVariableAnalysis {
    /// The identifier under which this analysis is registered
    pub const ID: &'static str = "livevar";
}

impl<G> DataFlowAnalysis<G> for LiveVariableAnalysis
where
    G: LabeledGraph,
    <G as LabeledGraph>::Label: DefUse,
{
    type Direction = Backward;
    type Fact = SetFact<<<G as LabeledGraph>::Label as DefUse>::Var>;

    fn debug_name(&self) -> &'static str {
        "liveness"
    }

    fn new_boundary_fact(&self, _graph: &G) -> Self::Fact {
        SetFact::new()
    }

    fn new_initial_fact(&self) -> Self::Fact {
        SetFact::new()
    }

    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) {
        let _ = target.union(fact);
    }

    fn transfer_node(
        &self,
        graph: &G,
        node: <G as Graph>::Node,
        in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> ChangeResult {
        let stmt = graph.label(node);
        let uses = stmt.uses().collect::<SetFact<_>>();
        let def = stmt.def();

        log::trace!(target: "liveness", "{node:?}: uses = {uses:?}, def = {def:?}");

        let mut live_in = out_fact.clone();
        if let Some(def) = def {
            live_in.remove(&def);
        }
        live_in.extend(uses);
        in_fact.union(&live_in)
    }
}

/// The live variables of every node of a graph, as computed by [LiveVariableAnalysis]
pub struct Liveness<N, V> {
    result: DataFlowResult<N, SetFact<V>>,
}

impl<N, V> Liveness<N, V>
where
    N: Copy + Eq + Hash,
    V: Copy + Eq + Hash,
{
    /// Compute liveness for `graph` using a solver with the default configuration
    pub fn compute<G>(graph: &G) -> Result<Self, SolverError>
    where
        G: LabeledGraph<Node = N>,
        <G as LabeledGraph>::Label: DefUse<Var = V>,
    {
        Self::compute_with(&mut DataFlowSolver::default(), graph)
    }

    /// Compute liveness for `graph` using `solver`
    pub fn compute_with<G>(solver: &mut DataFlowSolver, graph: &G) -> Result<Self, SolverError>
    where
        G: LabeledGraph<Node = N>,
        <G as LabeledGraph>::Label: DefUse<Var = V>,
    {
        solver.solve(graph, &LiveVariableAnalysis).map(Self::from)
    }

    /// Get the variables live on entry to `node`
    pub fn live_in(&self, node: N) -> Option<&SetFact<V>> {
        self.result.in_fact(node)
    }

    /// Get the variables live on exit from `node`
    pub fn live_out(&self, node: N) -> Option<&SetFact<V>> {
        self.result.out_fact(node)
    }

    /// Returns true if `var` is live on entry to `node`
    pub fn is_live_in(&self, node: N, var: V) -> bool {
        self.live_in(node).is_some_and(|live| live.contains(&var))
    }

    /// Returns true if `var` is live on exit from `node`
    pub fn is_live_out(&self, node: N, var: V) -> bool {
        self.live_out(node).is_some_and(|live| live.contains(&var))
    }

    #[inline]
    pub fn result(&self) -> &DataFlowResult<N, SetFact<V>> {
        &self.result
    }

    #[inline]
    pub fn into_result(self) -> DataFlowResult<N, SetFact<V>> {
        self.result
    }
}

impl<N, V> From<DataFlowResult<N, SetFact<V>>> for Liveness<N, V> {
    fn from(result: DataFlowResult<N, SetFact<V>>) -> Self {
        Self { result }
    }
}

impl<N: core::fmt::Debug, V: core::fmt::Debug> core::fmt::Debug for Liveness<N, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Liveness").field("result", &self.result).finish()
    }
}

#[cfg(test)]
mod tests {
    use dataflow_ir::{BinaryOp, ControlFlowGraph, EntityRef, NodeId, Stmt, Var};
    use pretty_assertions::assert_eq;

    use super::*;

    fn vars<const N: usize>(vars: [Var; N]) -> SetFact<Var> {
        SetFact::from_iter(vars)
    }

    #[test]
    fn transfer_kills_def_and_adds_uses() {
        let x = Var::new(0);
        let y = Var::new(1);
        let z = Var::new(2);

        let mut cfg = ControlFlowGraph::new();
        let n = cfg.push(Stmt::binary(x, BinaryOp::Add, y, 1i64));

        let mut in_fact = SetFact::new();
        let mut out_fact = vars([x, z]);
        let changed = LiveVariableAnalysis.transfer_node(&cfg, n, &mut in_fact, &mut out_fact);
        assert!(changed.is_changed());
        assert_eq!(in_fact, vars([y, z]));
        assert_eq!(out_fact, vars([x, z]));

        // A second application with the same OUT fact is a no-op
        let changed = LiveVariableAnalysis.transfer_node(&cfg, n, &mut in_fact, &mut out_fact);
        assert!(changed.is_unchanged());
    }

    #[test]
    fn constants_are_never_live() {
        let x = Var::new(0);

        let mut cfg = ControlFlowGraph::new();
        let a = cfg.push(Stmt::assign(x, 42i64));
        let b = cfg.push(Stmt::Return(Some(x.into())));
        cfg.connect(a, b);

        let liveness = Liveness::compute(&cfg).unwrap();
        assert_eq!(liveness.live_in(a), Some(&SetFact::new()));
        assert_eq!(liveness.live_out(a), Some(&vars([x])));
        assert!(liveness.is_live_in(b, x));
        assert!(!liveness.is_live_out(b, x));
    }

    #[test]
    fn liveness_of_straight_line_code() {
        let x = Var::new(0);
        let y = Var::new(1);

        // A: x = 1; B: y = x; C: return y
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.push(Stmt::assign(x, 1i64));
        let b = cfg.push(Stmt::assign(y, x));
        let c = cfg.push(Stmt::Return(Some(y.into())));
        cfg.connect_chain(&[a, b, c]);

        let liveness = Liveness::compute(&cfg).unwrap();
        let live_in = |node: NodeId| liveness.live_in(node).unwrap().to_sorted_vec();
        let live_out = |node: NodeId| liveness.live_out(node).unwrap().to_sorted_vec();

        assert_eq!(live_out(c), vec![]);
        assert_eq!(live_in(c), vec![y]);
        assert_eq!(live_out(b), vec![y]);
        assert_eq!(live_in(b), vec![x]);
        assert_eq!(live_out(a), vec![x]);
        assert_eq!(live_in(a), vec![]);
    }

    #[test]
    fn liveness_joins_over_branches() {
        let p = Var::new(0);
        let q = Var::new(1);
        let r = Var::new(2);

        // B branches to C1 (uses p) and C2 (uses q), both of which flow to the exit X
        let mut cfg = ControlFlowGraph::new();
        let b = cfg.push(Stmt::If { cond: r.into() });
        let c1 = cfg.push(Stmt::invoke(None, "use", [p]));
        let c2 = cfg.push(Stmt::invoke(None, "use", [q]));
        let x = cfg.push(Stmt::Return(None));
        cfg.connect(b, c1);
        cfg.connect(b, c2);
        cfg.connect(c1, x);
        cfg.connect(c2, x);

        let liveness = Liveness::compute(&cfg).unwrap();
        assert_eq!(liveness.live_out(b).unwrap().to_sorted_vec(), vec![p, q]);
        assert_eq!(liveness.live_in(b).unwrap().to_sorted_vec(), vec![p, q, r]);
        assert!(liveness.is_live_in(c1, p));
        assert!(!liveness.is_live_in(c1, q));
        assert!(liveness.live_in(x).unwrap().is_empty());
    }
}
