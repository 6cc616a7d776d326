use core::{fmt, hash::Hash};

use dataflow_ir::FxHashMap;

use crate::SolveStrategy;

/// The pair of facts the solver associates with each node: the fact holding on entry to the node,
/// and the fact holding on exit from it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeFacts<F> {
    pub in_fact: F,
    pub out_fact: F,
}

impl<F> NodeFacts<F> {
    #[inline]
    pub const fn new(in_fact: F, out_fact: F) -> Self {
        Self { in_fact, out_fact }
    }
}

/// Statistics about a single run of the solver
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SolveStats {
    /// The strategy used to schedule node visits
    pub strategy: SolveStrategy,
    /// The number of passes over the graph, including the final pass which confirmed convergence.
    ///
    /// For [SolveStrategy::Worklist], this is the number of node visits divided by the number of
    /// nodes, rounded up.
    pub passes: usize,
    /// The total number of times a node was visited, i.e. had its transfer function applied
    pub visits: usize,
}

/// The fixpoint computed by the solver: the IN and OUT facts of every node in the graph.
pub struct DataFlowResult<N, F> {
    /// Nodes, in the order they were reported by the graph
    nodes: Vec<N>,
    /// Maps a node to its index in `nodes` and `facts`
    index: FxHashMap<N, usize>,
    facts: Vec<NodeFacts<F>>,
    stats: SolveStats,
}

impl<N: Copy + Eq + Hash, F> DataFlowResult<N, F> {
    pub(crate) fn new(
        nodes: Vec<N>,
        index: FxHashMap<N, usize>,
        facts: Vec<NodeFacts<F>>,
        stats: SolveStats,
    ) -> Self {
        debug_assert_eq!(nodes.len(), facts.len());
        Self {
            nodes,
            index,
            facts,
            stats,
        }
    }

    /// The number of nodes with facts in this result
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get both facts of `node`, or `None` if `node` was not part of the analyzed graph
    pub fn facts(&self, node: N) -> Option<&NodeFacts<F>> {
        self.index.get(&node).map(|&index| &self.facts[index])
    }

    /// Get the fact holding on entry to `node`
    #[inline]
    pub fn in_fact(&self, node: N) -> Option<&F> {
        self.facts(node).map(|facts| &facts.in_fact)
    }

    /// Get the fact holding on exit from `node`
    #[inline]
    pub fn out_fact(&self, node: N) -> Option<&F> {
        self.facts(node).map(|facts| &facts.out_fact)
    }

    /// Iterate over all nodes and their facts, in the order the nodes were reported by the graph
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (N, &NodeFacts<F>)> + '_ {
        self.nodes.iter().copied().zip(self.facts.iter())
    }

    /// Get statistics about the run which produced this result
    #[inline]
    pub fn stats(&self) -> SolveStats {
        self.stats
    }
}

impl<N: fmt::Debug, F: fmt::Debug> fmt::Debug for DataFlowResult<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.nodes.iter().zip(self.facts.iter())).finish()
    }
}

impl<N: fmt::Display, F: fmt::Display> fmt::Display for DataFlowResult<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, facts) in self.nodes.iter().zip(self.facts.iter()) {
            writeln!(f, "{node}: IN={} OUT={}", facts.in_fact, facts.out_fact)?;
        }
        Ok(())
    }
}
