use std::collections::VecDeque;

use bitvec::prelude::*;
use dataflow_ir::{Direction, FxHashMap, Graph, InvertibleGraph, is_reachable, reverse_postorder};
use smallvec::SmallVec;

use crate::{
    ChangeResult, DataFlowAnalysis, DataFlowFact, DataFlowResult, FlowDirection,
    NodeFacts, SolveStats, SolveStrategy, SolverConfig, SolverError,
};

/// The phases the [DataFlowSolver] moves through while computing a fixpoint
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum SolverState {
    /// No facts have been seeded yet, or the last run failed
    #[default]
    Uninitialized,
    /// Facts have been seeded, and the solver is propagating them
    Iterating {
        /// The current pass over the graph, starting from 1
        pass: usize,
    },
    /// No fact changed during the last pass, i.e. the facts are a fixpoint
    Converged,
}

/// The [DataFlowSolver] is responsible for running a [DataFlowAnalysis] over a graph, such that the
/// facts it computes for each node reach a fixpoint.
///
/// A run proceeds as follows:
///
/// 1. The graph is validated against the direction of the analysis: it must be non-empty, its
///    boundary node must be reachable, and the boundary node must not have any incoming flow edges
///    (i.e. successors, for a backward analysis).
/// 2. Every node has both of its facts seeded with [DataFlowAnalysis::new_initial_fact], except
///    the input side of the boundary node, which is seeded with
///    [DataFlowAnalysis::new_boundary_fact].
/// 3. Nodes are visited in reverse post-order of the flow graph (see [FlowDirection]). Visiting a
///    node resets its input side to the initial fact, meets the output side of each of its flow
///    sources into it, and then applies the transfer function. The input side of the boundary node
///    is never recomputed.
/// 4. Step 3 is repeated until no transfer function reports a change.
///
/// Each run allocates its own facts, so the same solver can be used to run any number of analyses,
/// over any number of graphs, one after the other.
#[derive(Debug, Default)]
pub struct DataFlowSolver {
    /// Configuration for all runs of this solver
    config: SolverConfig,
    /// The state of the current (or last) run
    state: SolverState,
}

impl DataFlowSolver {
    /// Create a new solver instance with the provided configuration
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            state: SolverState::Uninitialized,
        }
    }

    /// Access the current solver configuration
    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Get the state of the current (or last) run
    #[inline]
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Run `analysis` over `graph` to fixpoint, returning the facts computed for every node.
    ///
    /// Configuration errors (see [SolverError]) are reported before any fact is computed. If the
    /// solver gives up before reaching a fixpoint, or a transfer function misbehaves, the partial
    /// results are discarded and the error is returned.
    pub fn solve<G, A>(
        &mut self,
        graph: &G,
        analysis: &A,
    ) -> Result<DataFlowResult<<G as Graph>::Node, A::Fact>, SolverError>
    where
        G: InvertibleGraph,
        A: DataFlowAnalysis<G>,
    {
        self.state = SolverState::Uninitialized;
        let result = self.run(graph, analysis);
        self.state = if result.is_ok() {
            SolverState::Converged
        } else {
            SolverState::Uninitialized
        };
        result
    }

    fn run<G, A>(
        &mut self,
        graph: &G,
        analysis: &A,
    ) -> Result<DataFlowResult<<G as Graph>::Node, A::Fact>, SolverError>
    where
        G: InvertibleGraph,
        A: DataFlowAnalysis<G>,
    {
        log::debug!(
            target: "dataflow-solver",
            "running {} analysis '{}' over {} nodes using {} strategy",
            <A::Direction as Direction>::NAME,
            analysis.debug_name(),
            graph.size(),
            self.config.strategy(),
        );

        let mut run = Run::new(graph, analysis, self.config.verify_transfer())?;
        let order = run.visit_order();
        let stats = match self.config.strategy() {
            SolveStrategy::RoundRobin => self.round_robin(&mut run, &order)?,
            SolveStrategy::Worklist => self.worklist(&mut run, &order)?,
        };

        log::debug!(
            target: "dataflow-solver",
            "'{}' converged after {} passes ({} node visits)",
            analysis.debug_name(),
            stats.passes,
            stats.visits,
        );

        Ok(run.into_result(stats))
    }

    /// Visit every node in `order` on each pass, until a pass completes without any change
    fn round_robin<G, A>(
        &mut self,
        run: &mut Run<'_, G, A>,
        order: &[usize],
    ) -> Result<SolveStats, SolverError>
    where
        G: InvertibleGraph,
        A: DataFlowAnalysis<G>,
    {
        let mut passes = 0;
        let mut visits = 0;
        loop {
            if let Some(limit) = self.config.max_passes()
                && passes >= limit
            {
                return Err(SolverError::IterationLimitExceeded {
                    analysis: run.analysis.debug_name(),
                    limit,
                });
            }
            passes += 1;
            self.state = SolverState::Iterating { pass: passes };

            let mut changed = ChangeResult::Unchanged;
            for &index in order {
                changed |= run.visit(index)?;
            }
            visits += order.len();

            log::trace!(
                target: "dataflow-solver",
                "pass {passes} of '{}' complete (changed = {})",
                run.analysis.debug_name(),
                changed.is_changed(),
            );

            if changed.is_unchanged() {
                break;
            }
        }

        Ok(SolveStats {
            strategy: SolveStrategy::RoundRobin,
            passes,
            visits,
        })
    }

    /// Visit every node in `order` once, then revisit only the flow dependents of nodes whose output
    /// side changed, until no such nodes remain.
    fn worklist<G, A>(
        &mut self,
        run: &mut Run<'_, G, A>,
        order: &[usize],
    ) -> Result<SolveStats, SolverError>
    where
        G: InvertibleGraph,
        A: DataFlowAnalysis<G>,
    {
        let len = run.nodes.len();
        let visit_limit = self.config.max_passes().map(|limit| limit.saturating_mul(len));

        let mut worklist = VecDeque::from_iter(order.iter().copied());
        let mut queued = bitvec![0; len];
        for &index in order {
            queued.set(index, true);
        }

        let mut visits = 0usize;
        while let Some(index) = worklist.pop_front() {
            queued.set(index, false);
            if let Some(limit) = visit_limit
                && visits >= limit
            {
                return Err(SolverError::IterationLimitExceeded {
                    analysis: run.analysis.debug_name(),
                    limit: self.config.max_passes().unwrap_or_default(),
                });
            }
            visits += 1;
            self.state = SolverState::Iterating {
                pass: visits.div_ceil(len),
            };

            if run.visit(index)?.is_changed() {
                for dependent in run.flow_dependents(index) {
                    if !queued[dependent] {
                        log::trace!(
                            target: "dataflow-solver",
                            "enqueuing {:?}",
                            run.nodes[dependent],
                        );
                        queued.set(dependent, true);
                        worklist.push_back(dependent);
                    }
                }
            }
        }

        Ok(SolveStats {
            strategy: SolveStrategy::Worklist,
            passes: visits.div_ceil(len),
            visits,
        })
    }

    /// Check that `result` is a fixpoint of `analysis` over `graph`.
    ///
    /// The boundary fact of `result` must match the one `analysis` would seed. Then each node is
    /// visited once more, in solver order, on a copy of `result` with transfer verification
    /// enabled: its input side is met over its flow sources, and its output side is recomputed by
    /// the transfer function starting from the initial fact. Both must equal the facts in
    /// `result`, so facts which are too small or too large are both rejected.
    pub fn verify_fixpoint<G, A>(
        &self,
        graph: &G,
        analysis: &A,
        result: &DataFlowResult<<G as Graph>::Node, A::Fact>,
    ) -> Result<(), SolverError>
    where
        G: InvertibleGraph,
        A: DataFlowAnalysis<G>,
    {
        let mut run = Run::new(graph, analysis, true)?;
        for (index, node) in run.nodes.iter().enumerate() {
            let Some(facts) = result.facts(*node) else {
                return Err(SolverError::MissingFacts {
                    analysis: analysis.debug_name(),
                    node: format!("{node:?}"),
                });
            };
            run.facts[index] = facts.clone();
        }

        let input = <A::Direction as FlowDirection>::INPUT;
        if input.of(&run.facts[run.boundary]) != &analysis.new_boundary_fact(graph) {
            return Err(SolverError::NotAFixpoint {
                analysis: analysis.debug_name(),
                node: format!("{:?}", run.nodes[run.boundary]),
                side: input,
            });
        }

        let output = <A::Direction as FlowDirection>::OUTPUT;
        for index in run.visit_order() {
            let expected = run.facts[index].clone();
            // The output side is recomputed from scratch
            *output.of_mut(&mut run.facts[index]) = analysis.new_initial_fact();
            let _ = run.visit(index)?;

            let facts = &run.facts[index];
            let side = [input, output].into_iter().find(|side| side.of(facts) != side.of(&expected));
            if let Some(side) = side {
                return Err(SolverError::NotAFixpoint {
                    analysis: analysis.debug_name(),
                    node: format!("{:?}", run.nodes[index]),
                    side,
                });
            }
        }

        Ok(())
    }
}

/// The working state of a single run of an analysis over a graph.
///
/// Nodes are identified by their index in the order they were reported by [Graph::nodes], and all
/// per-node state is stored in vectors indexed the same way.
struct Run<'a, G, A>
where
    G: InvertibleGraph,
    A: DataFlowAnalysis<G>,
{
    graph: &'a G,
    /// The view of `graph` in which edges follow the direction of the analysis
    flow: <A::Direction as FlowDirection>::FlowGraph<'a, G>,
    analysis: &'a A,
    verify_transfer: bool,
    /// The index of the boundary node
    boundary: usize,
    nodes: Vec<<G as Graph>::Node>,
    index: FxHashMap<<G as Graph>::Node, usize>,
    facts: Vec<NodeFacts<A::Fact>>,
}

impl<'a, G, A> Run<'a, G, A>
where
    G: InvertibleGraph,
    A: DataFlowAnalysis<G>,
{
    /// Validate `graph` for use with `analysis`, and seed the initial facts of every node
    fn new(graph: &'a G, analysis: &'a A, verify_transfer: bool) -> Result<Self, SolverError> {
        let flow = <A::Direction as FlowDirection>::flow_graph(graph);
        let boundary = Self::validate(graph, &flow, analysis)?;

        let nodes = graph.nodes().collect::<Vec<_>>();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (*node, index))
            .collect::<FxHashMap<_, _>>();
        let mut facts = nodes
            .iter()
            .map(|_| NodeFacts::new(analysis.new_initial_fact(), analysis.new_initial_fact()))
            .collect::<Vec<_>>();

        let boundary = index[&boundary];
        let input = <A::Direction as FlowDirection>::INPUT;
        *input.of_mut(&mut facts[boundary]) = analysis.new_boundary_fact(graph);

        log::debug!(
            target: analysis.debug_name(),
            "seeded {} nodes, boundary {:?} has {} = {:?}",
            nodes.len(),
            nodes[boundary],
            input,
            input.of(&facts[boundary]),
        );

        Ok(Self {
            graph,
            flow,
            analysis,
            verify_transfer,
            boundary,
            nodes,
            index,
            facts,
        })
    }

    /// Check that `graph` is well-formed for an analysis in the direction of `flow`, returning the
    /// boundary node if so.
    fn validate(
        graph: &G,
        flow: &<A::Direction as FlowDirection>::FlowGraph<'a, G>,
        analysis: &A,
    ) -> Result<<G as Graph>::Node, SolverError> {
        if graph.is_empty() {
            return Err(SolverError::EmptyGraph {
                analysis: analysis.debug_name(),
            });
        }

        let direction = <A::Direction as Direction>::NAME;
        let boundary = flow.entry_node();
        if !graph.contains(boundary) || !is_reachable(graph, graph.entry_node(), boundary) {
            return Err(SolverError::UnreachableBoundary {
                analysis: analysis.debug_name(),
                direction,
                node: format!("{boundary:?}"),
            });
        }

        let count = flow.inverse_children(boundary).len();
        if count > 0 {
            return Err(SolverError::BoundaryHasFlowEdges {
                analysis: analysis.debug_name(),
                direction,
                node: format!("{boundary:?}"),
                count,
            });
        }

        Ok(boundary)
    }

    /// Compute the order in which nodes are visited on each pass.
    ///
    /// This is the reverse post-order of the flow graph from the boundary node, followed by any
    /// nodes not reachable from the boundary along flow edges, in graph order for forward analyses
    /// and in reverse graph order for backward analyses.
    fn visit_order(&self) -> Vec<usize> {
        let mut order = reverse_postorder(&self.flow, self.nodes[self.boundary])
            .into_iter()
            .map(|node| self.index[&node])
            .collect::<Vec<_>>();

        if order.len() < self.nodes.len() {
            let mut visited = bitvec![0; self.nodes.len()];
            for &index in order.iter() {
                visited.set(index, true);
            }
            let unvisited = visited.iter_zeros();
            if <A::Direction as Direction>::is_forward() {
                order.extend(unvisited);
            } else {
                order.extend(unvisited.rev());
            }
        }

        order
    }

    /// Visit the node at `index`, returning whether its output side changed.
    fn visit(&mut self, index: usize) -> Result<ChangeResult, SolverError> {
        let node = self.nodes[index];
        let input = <A::Direction as FlowDirection>::INPUT;
        let output = <A::Direction as FlowDirection>::OUTPUT;

        if index != self.boundary {
            let mut fact = self.analysis.new_initial_fact();
            for source in self.flow.inverse_children(node) {
                let source = &self.facts[self.index[&source]];
                self.analysis.meet_into(output.of(source), &mut fact);
            }
            *input.of_mut(&mut self.facts[index]) = fact;
        }

        let facts = &mut self.facts[index];
        let before = self.verify_transfer.then(|| output.of(facts).clone());
        let changed =
            self.analysis
                .transfer_node(self.graph, node, &mut facts.in_fact, &mut facts.out_fact);

        log::trace!(
            target: self.analysis.debug_name(),
            "visited {node:?}: IN = {:?}, OUT = {:?} (changed = {})",
            facts.in_fact,
            facts.out_fact,
            changed.is_changed(),
        );

        if let Some(before) = before {
            let after = output.of(facts);
            if !before.subsumed_by(after) {
                return Err(SolverError::NonMonotonicTransfer {
                    analysis: self.analysis.debug_name(),
                    node: format!("{node:?}"),
                });
            }
            let actual = ChangeResult::from(&before != after);
            if actual != changed {
                return Err(SolverError::InexactChangeFlag {
                    analysis: self.analysis.debug_name(),
                    node: format!("{node:?}"),
                    reported: change_name(changed),
                    actual: change_name(actual),
                });
            }
        }

        Ok(changed)
    }

    /// Get the nodes which meet over the output side of the node at `index`
    fn flow_dependents(&self, index: usize) -> SmallVec<[usize; 4]> {
        self.flow
            .children(self.nodes[index])
            .map(|node| self.index[&node])
            .collect()
    }

    fn into_result(self, stats: SolveStats) -> DataFlowResult<<G as Graph>::Node, A::Fact> {
        DataFlowResult::new(self.nodes, self.index, self.facts, stats)
    }
}

fn change_name(result: ChangeResult) -> &'static str {
    match result {
        ChangeResult::Changed => "a change",
        ChangeResult::Unchanged => "no change",
    }
}
