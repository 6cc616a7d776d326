use alloc::vec::Vec;

use smallvec::{SmallVec, smallvec};

use crate::{FxHashSet, Graph};

/// A basic iterator over a depth-first traversal of nodes in a graph, producing them in post-order.
///
/// Only nodes reachable from the root are produced.
pub struct PostOrderIter<'a, G: Graph> {
    graph: &'a G,
    /// The nodes we have already visited
    visited: FxHashSet<<G as Graph>::Node>,
    /// The stack of discovered nodes currently being visited
    stack: SmallVec<[VisitNode<<G as Graph>::Node>; 8]>,
}

/// Represents a node in the graph which has been reached during traversal, and is in the process of
/// being visited.
struct VisitNode<T> {
    /// The node in the underlying graph being visited
    node: T,
    /// The successors of this node which remain to be visited, in reverse order
    successors: SmallVec<[T; 2]>,
    /// Set to `true` once this node has been marked visited
    reached: bool,
}

impl<'a, G: Graph> PostOrderIter<'a, G> {
    /// Visit all nodes of `graph` reachable from `root` in post-order
    pub fn new(graph: &'a G, root: <G as Graph>::Node) -> Self {
        Self {
            graph,
            visited: FxHashSet::default(),
            stack: smallvec![Self::discover(graph, root)],
        }
    }

    fn discover(graph: &G, node: <G as Graph>::Node) -> VisitNode<<G as Graph>::Node> {
        // Successors are popped from the end, so store them reversed in order to visit them in
        // the order the graph reports them
        let mut successors = SmallVec::from_iter(graph.children(node));
        successors.reverse();
        VisitNode {
            node,
            successors,
            reached: false,
        }
    }
}

impl<G: Graph> core::iter::FusedIterator for PostOrderIter<'_, G> {}

impl<G: Graph> Iterator for PostOrderIter<'_, G> {
    type Item = <G as Graph>::Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;

            if !top.reached {
                top.reached = true;
                if !self.visited.insert(top.node) {
                    self.stack.pop();
                }
                continue;
            }

            // If we've visited all successors of this node, we've got our next item
            let Some(successor) = top.successors.pop() else {
                return self.stack.pop().map(|visit| visit.node);
            };

            if !self.visited.contains(&successor) {
                let visit = Self::discover(self.graph, successor);
                self.stack.push(visit);
            }
        }
    }
}

/// Compute the reverse post-order of the nodes of `graph` reachable from `root`.
///
/// In a reverse post-order, every node is visited before its successors, except along back edges.
/// This is the most efficient order in which to propagate information along the edges of a graph.
pub fn reverse_postorder<G: Graph>(graph: &G, root: <G as Graph>::Node) -> Vec<<G as Graph>::Node> {
    let mut order = PostOrderIter::new(graph, root).collect::<Vec<_>>();
    order.reverse();
    order
}

/// Returns true if `target` can be reached from `root` by following the edges of `graph`
pub fn is_reachable<G: Graph>(
    graph: &G,
    root: <G as Graph>::Node,
    target: <G as Graph>::Node,
) -> bool {
    root == target || PostOrderIter::new(graph, root).any(|node| node == target)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{ControlFlowGraph, Inverse, Stmt};

    /// ```text
    /// n0 -> n1 -> n3
    ///  \--> n2 --^
    /// n4 (unreachable)
    /// ```
    fn diamond() -> ControlFlowGraph<Stmt> {
        let mut cfg = ControlFlowGraph::new();
        let n0 = cfg.push(Stmt::Nop);
        let n1 = cfg.push(Stmt::Nop);
        let n2 = cfg.push(Stmt::Nop);
        let n3 = cfg.push(Stmt::Nop);
        let _n4 = cfg.push(Stmt::Nop);
        cfg.connect(n0, n1);
        cfg.connect(n0, n2);
        cfg.connect(n1, n3);
        cfg.connect(n2, n3);
        cfg.set_exit(n3);
        cfg
    }

    #[test]
    fn postorder_visits_successors_first() {
        let cfg = diamond();
        let order = PostOrderIter::new(&cfg, cfg.entry_node()).collect::<Vec<_>>();
        let ids = order.iter().map(|n| n.as_u32()).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 1, 2, 0]);
    }

    #[test]
    fn reverse_postorder_of_inverse_starts_at_exit() {
        let cfg = diamond();
        let inverse = Inverse::new(&cfg);
        let order = reverse_postorder(&inverse, inverse.entry_node());
        let ids = order.iter().map(|n| n.as_u32()).collect::<Vec<_>>();
        assert_eq!(ids, vec![3, 2, 1, 0]);
    }

    #[test]
    fn reachability() {
        let cfg = diamond();
        let nodes = cfg.nodes().collect::<Vec<_>>();
        assert!(is_reachable(&cfg, nodes[0], nodes[3]));
        assert!(!is_reachable(&cfg, nodes[0], nodes[4]));
        assert!(!is_reachable(&cfg, nodes[3], nodes[0]));
    }

    #[test]
    fn postorder_terminates_on_cycles() {
        let mut cfg = diamond();
        let nodes = cfg.nodes().collect::<Vec<_>>();
        cfg.connect(nodes[3], nodes[0]);
        let order = PostOrderIter::new(&cfg, nodes[0]).count();
        assert_eq!(order, 4);
    }
}
