use dataflow_analysis::{
    ChangeResult, DataFlowAnalysis, DataFlowSolver, FactSide, LiveVariableAnalysis, SetFact,
    SolveStrategy, SolverConfig, SolverError, SolverState,
};
use dataflow_ir::{
    ControlFlowGraph, DefUse, EntityRef, Forward, Graph, InvertibleGraph, LabeledGraph, Stmt, Var,
};
use pretty_assertions::assert_eq;

fn init_logger() {
    let _ = env_logger::Builder::from_env("DATAFLOW_TRACE")
        .format_timestamp(None)
        .is_test(true)
        .try_init();
}

fn config(strategy: SolveStrategy, max_passes: usize, verify_transfer: bool) -> SolverConfig {
    let mut config = SolverConfig::new();
    config
        .set_strategy(strategy)
        .set_max_passes(Some(max_passes))
        .set_verify_transfer(verify_transfer);
    config
}

/// A forward analysis computing the variables which may have been assigned on some path from the
/// entry, where the parameters count as assigned on entry.
struct AssignedVariables {
    params: SetFact<Var>,
}

impl<G> DataFlowAnalysis<G> for AssignedVariables
where
    G: LabeledGraph,
    <G as LabeledGraph>::Label: DefUse<Var = Var>,
{
    type Direction = Forward;
    type Fact = SetFact<Var>;

    fn debug_name(&self) -> &'static str {
        "assigned"
    }

    fn new_boundary_fact(&self, _graph: &G) -> Self::Fact {
        self.params.clone()
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
        let mut assigned = in_fact.clone();
        assigned.extend(graph.label(node).def());
        out_fact.union(&assigned)
    }
}

/// An analysis whose transfer function alternates between adding and removing an element, and
/// thus never converges.
struct Oscillating;

impl<G: InvertibleGraph> DataFlowAnalysis<G> for Oscillating {
    type Direction = Forward;
    type Fact = SetFact<u32>;

    fn debug_name(&self) -> &'static str {
        "oscillating"
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
        _graph: &G,
        _node: <G as Graph>::Node,
        _in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> ChangeResult {
        if out_fact.is_empty() {
            out_fact.add(1);
        } else {
            out_fact.clear();
        }
        ChangeResult::Changed
    }
}

/// An analysis which updates its facts, but never reports doing so
struct Forgetful;

impl<G: InvertibleGraph> DataFlowAnalysis<G> for Forgetful {
    type Direction = Forward;
    type Fact = SetFact<u32>;

    fn debug_name(&self) -> &'static str {
        "forgetful"
    }

    fn new_boundary_fact(&self, _graph: &G) -> Self::Fact {
        SetFact::from_iter([7])
    }

    fn new_initial_fact(&self) -> Self::Fact {
        SetFact::new()
    }

    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact) {
        let _ = target.union(fact);
    }

    fn transfer_node(
        &self,
        _graph: &G,
        _node: <G as Graph>::Node,
        in_fact: &mut Self::Fact,
        out_fact: &mut Self::Fact,
    ) -> ChangeResult {
        let _ = out_fact.union(in_fact);
        ChangeResult::Unchanged
    }
}

/// ```text
/// n0 -> n1 <-> n2
/// ```
fn cyclic_graph() -> ControlFlowGraph<Stmt> {
    let mut cfg = ControlFlowGraph::new();
    let n0 = cfg.push(Stmt::Nop);
    let n1 = cfg.push(Stmt::Nop);
    let n2 = cfg.push(Stmt::Nop);
    cfg.connect_chain(&[n0, n1, n2, n1]);
    cfg
}

#[test]
fn forward_analysis_seeds_entry_with_boundary_fact() -> Result<(), SolverError> {
    init_logger();

    let p = Var::new(0);
    let x = Var::new(1);
    let y = Var::new(2);
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.push(Stmt::assign(x, p));
    let b = cfg.push(Stmt::If { cond: x.into() });
    let c = cfg.push(Stmt::assign(y, x));
    let d = cfg.push(Stmt::Return(Some(x.into())));
    cfg.connect_chain(&[a, b, c, d]);
    cfg.connect(b, d);

    let analysis = AssignedVariables {
        params: SetFact::from_iter([p]),
    };
    for strategy in [SolveStrategy::RoundRobin, SolveStrategy::Worklist] {
        let mut solver = DataFlowSolver::new(config(strategy, 100, true));
        let result = solver.solve(&cfg, &analysis)?;
        assert_eq!(solver.state(), SolverState::Converged);

        assert_eq!(result.in_fact(a), Some(&SetFact::from_iter([p])));
        assert_eq!(result.out_fact(a), Some(&SetFact::from_iter([p, x])));
        assert_eq!(result.in_fact(c), Some(&SetFact::from_iter([p, x])));
        assert_eq!(result.in_fact(d), Some(&SetFact::from_iter([p, x, y])));
        assert_eq!(result.out_fact(d), Some(&SetFact::from_iter([p, x, y])));
        solver.verify_fixpoint(&cfg, &analysis, &result)?;
    }

    Ok(())
}

#[test]
fn empty_graph_is_rejected() {
    let cfg = ControlFlowGraph::<Stmt>::new();
    let mut solver = DataFlowSolver::default();
    assert_eq!(
        solver.solve(&cfg, &LiveVariableAnalysis).unwrap_err(),
        SolverError::EmptyGraph {
            analysis: "liveness"
        }
    );
    assert_eq!(solver.state(), SolverState::Uninitialized);
}

#[test]
fn exit_with_successors_is_rejected() {
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.push(Stmt::Nop);
    let b = cfg.push(Stmt::Nop);
    cfg.connect(a, b);
    cfg.connect(b, a);

    let err = DataFlowSolver::default()
        .solve(&cfg, &LiveVariableAnalysis)
        .unwrap_err();
    assert_eq!(
        err,
        SolverError::BoundaryHasFlowEdges {
            analysis: "liveness",
            direction: "backward",
            node: "n1".to_string(),
            count: 1,
        }
    );
}

#[test]
fn entry_with_predecessors_is_rejected() {
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.push(Stmt::Nop);
    let b = cfg.push(Stmt::Nop);
    let c = cfg.push(Stmt::Nop);
    cfg.connect_chain(&[a, b, a]);
    cfg.connect(b, c);

    let err = DataFlowSolver::default().solve(&cfg, &Oscillating).unwrap_err();
    assert_eq!(
        err,
        SolverError::BoundaryHasFlowEdges {
            analysis: "oscillating",
            direction: "forward",
            node: "n0".to_string(),
            count: 1,
        }
    );
}

#[test]
fn unreachable_exit_is_rejected() {
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.push(Stmt::Nop);
    let b = cfg.push(Stmt::Nop);
    let c = cfg.push(Stmt::Nop);
    cfg.connect(a, b);
    cfg.set_exit(c);

    let err = DataFlowSolver::default()
        .solve(&cfg, &LiveVariableAnalysis)
        .unwrap_err();
    assert_eq!(
        err,
        SolverError::UnreachableBoundary {
            analysis: "liveness",
            direction: "backward",
            node: "n2".to_string(),
        }
    );
}

#[test]
fn iteration_limit_is_enforced() {
    init_logger();

    let cfg = cyclic_graph();
    for strategy in [SolveStrategy::RoundRobin, SolveStrategy::Worklist] {
        let mut solver = DataFlowSolver::new(config(strategy, 5, false));
        let err = solver.solve(&cfg, &Oscillating).unwrap_err();
        assert_eq!(
            err,
            SolverError::IterationLimitExceeded {
                analysis: "oscillating",
                limit: 5,
            }
        );
        assert_eq!(err.to_string(), "analysis 'oscillating' did not converge within 5 passes");
        assert_eq!(solver.state(), SolverState::Uninitialized);
    }
}

#[test]
fn non_monotonic_transfer_is_detected() {
    let cfg = cyclic_graph();
    let err = DataFlowSolver::new(config(SolveStrategy::RoundRobin, 100, true))
        .solve(&cfg, &Oscillating)
        .unwrap_err();
    assert_eq!(
        err,
        SolverError::NonMonotonicTransfer {
            analysis: "oscillating",
            node: "n0".to_string(),
        }
    );
}

#[test]
fn inexact_change_flag_is_detected() {
    let cfg = cyclic_graph();
    let mut solver = DataFlowSolver::new(config(SolveStrategy::RoundRobin, 100, true));
    let err = solver.solve(&cfg, &Forgetful).unwrap_err();
    assert_eq!(
        err,
        SolverError::InexactChangeFlag {
            analysis: "forgetful",
            node: "n0".to_string(),
            reported: "no change",
            actual: "a change",
        }
    );

    // Without verification, the lie goes unnoticed and the solver stops after a single pass
    let mut solver = DataFlowSolver::new(config(SolveStrategy::RoundRobin, 100, false));
    let result = solver.solve(&cfg, &Forgetful).unwrap();
    assert_eq!(result.stats().passes, 1);
    assert_eq!(solver.state(), SolverState::Converged);
}

#[test]
fn fixpoint_violations_name_the_changed_side() {
    let x = Var::new(0);
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.push(Stmt::assign(x, 1i64));
    let b = cfg.push(Stmt::Return(None));
    cfg.connect(a, b);

    let analysis = AssignedVariables {
        params: SetFact::new(),
    };
    let solver = DataFlowSolver::default();
    let result = DataFlowSolver::default().solve(&cfg, &analysis).unwrap();

    // Different parameters change the boundary fact
    let other = AssignedVariables {
        params: SetFact::from_iter([Var::new(1)]),
    };
    let err = solver.verify_fixpoint(&cfg, &other, &result).unwrap_err();
    assert_eq!(
        err,
        SolverError::NotAFixpoint {
            analysis: "assigned",
            node: "n0".to_string(),
            side: FactSide::In,
        }
    );

    // Assigning a different variable in `a` grows its OUT fact
    let mut changed = ControlFlowGraph::new();
    let a2 = changed.push(Stmt::assign(Var::new(2), 1i64));
    let b2 = changed.push(Stmt::Return(None));
    changed.connect(a2, b2);
    let err = solver.verify_fixpoint(&changed, &analysis, &result).unwrap_err();
    assert_eq!(
        err,
        SolverError::NotAFixpoint {
            analysis: "assigned",
            node: "n0".to_string(),
            side: FactSide::Out,
        }
    );
}
