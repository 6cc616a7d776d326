use core::fmt;

use cranelift_entity::{PrimaryMap, entity_impl};
use smallvec::SmallVec;

use crate::{Graph, InvertibleGraph, LabeledGraph};

/// A handle to a node of a [ControlFlowGraph]
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);
entity_impl!(NodeId, "n");

struct NodeData<S> {
    stmt: S,
    successors: SmallVec<[NodeId; 2]>,
    predecessors: SmallVec<[NodeId; 2]>,
}

/// A control-flow graph whose nodes are single statements of type `S`.
///
/// Edges are deduplicated, so a node is never reported as a successor (or predecessor) of another
/// node more than once. Unless set explicitly, the entry node is the first node pushed, and the
/// exit node is the last.
pub struct ControlFlowGraph<S> {
    nodes: PrimaryMap<NodeId, NodeData<S>>,
    entry: Option<NodeId>,
    exit: Option<NodeId>,
}

impl<S> Default for ControlFlowGraph<S> {
    fn default() -> Self {
        Self {
            nodes: PrimaryMap::new(),
            entry: None,
            exit: None,
        }
    }
}

impl<S> ControlFlowGraph<S> {
    /// Create a new, empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new node labeled with `stmt`, with no edges
    pub fn push(&mut self, stmt: S) -> NodeId {
        self.nodes.push(NodeData {
            stmt,
            successors: SmallVec::new(),
            predecessors: SmallVec::new(),
        })
    }

    /// Add a control-flow edge from `from` to `to`.
    ///
    /// Returns false if the edge was already present, or if either node does not belong to this
    /// graph, in which case the graph is left unchanged.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.nodes.is_valid(from)
            || !self.nodes.is_valid(to)
            || self.nodes[from].successors.contains(&to)
        {
            return false;
        }
        self.nodes[from].successors.push(to);
        self.nodes[to].predecessors.push(from);
        true
    }

    /// Connect each node in `nodes` to the one following it
    pub fn connect_chain(&mut self, nodes: &[NodeId]) {
        for pair in nodes.windows(2) {
            self.connect(pair[0], pair[1]);
        }
    }

    /// Designate `node` as the entry of this graph.
    ///
    /// Returns false, leaving the entry unchanged, if `node` does not belong to this graph.
    pub fn set_entry(&mut self, node: NodeId) -> bool {
        let valid = self.nodes.is_valid(node);
        if valid {
            self.entry = Some(node);
        }
        valid
    }

    /// Designate `node` as the exit of this graph.
    ///
    /// Returns false, leaving the exit unchanged, if `node` does not belong to this graph.
    pub fn set_exit(&mut self, node: NodeId) -> bool {
        let valid = self.nodes.is_valid(node);
        if valid {
            self.exit = Some(node);
        }
        valid
    }

    /// Get the statement attached to `node`
    ///
    /// Panics if `node` does not belong to this graph, as do the other accessors taking a node.
    #[inline]
    pub fn stmt(&self, node: NodeId) -> &S {
        &self.nodes[node].stmt
    }

    /// Get the control-flow successors of `node`
    #[inline]
    pub fn successors(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].successors
    }

    /// Get the control-flow predecessors of `node`
    #[inline]
    pub fn predecessors(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].predecessors
    }
}

impl<S> Graph for ControlFlowGraph<S> {
    type Node = NodeId;

    fn size(&self) -> usize {
        self.nodes.len()
    }

    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.is_valid(node)
    }

    fn entry_node(&self) -> NodeId {
        self.entry
            .or_else(|| self.nodes.keys().next())
            .expect("cannot get the entry of an empty graph")
    }

    fn exit_node(&self) -> NodeId {
        self.exit
            .or_else(|| self.nodes.keys().last())
            .expect("cannot get the exit of an empty graph")
    }

    fn children(&self, parent: NodeId) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.nodes[parent].successors.iter().copied()
    }
}

impl<S> InvertibleGraph for ControlFlowGraph<S> {
    fn inverse_children(&self, parent: NodeId) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        self.nodes[parent].predecessors.iter().copied()
    }
}

impl<S> LabeledGraph for ControlFlowGraph<S> {
    type Label = S;

    #[inline]
    fn label(&self, node: NodeId) -> &S {
        self.stmt(node)
    }
}

impl<S: fmt::Display> fmt::Display for ControlFlowGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = (!self.nodes.is_empty()).then(|| self.entry_node());
        let exit = (!self.nodes.is_empty()).then(|| self.exit_node());
        for (id, data) in self.nodes.iter() {
            write!(f, "{id}: {}", data.stmt)?;
            if Some(id) == entry {
                f.write_str(" (entry)")?;
            }
            if Some(id) == exit {
                f.write_str(" (exit)")?;
            }
            if !data.successors.is_empty() {
                f.write_str(" ->")?;
                for succ in data.successors.iter() {
                    write!(f, " {succ}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<S: fmt::Debug> fmt::Debug for ControlFlowGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.nodes
                    .iter()
                    .map(|(id, data)| (id, (&data.stmt, data.successors.as_slice()))),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Stmt, Var};

    #[test]
    fn edges_are_deduplicated() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.push(Stmt::Nop);
        let b = cfg.push(Stmt::Nop);
        assert!(cfg.connect(a, b));
        assert!(!cfg.connect(a, b));
        assert_eq!(cfg.successors(a), &[b]);
        assert_eq!(cfg.predecessors(b), &[a]);
        assert_eq!(cfg.children(a).len(), 1);
    }

    #[test]
    fn default_entry_and_exit() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.push(Stmt::Nop);
        let b = cfg.push(Stmt::Nop);
        let c = cfg.push(Stmt::Return(None));
        cfg.connect_chain(&[a, b, c]);
        assert_eq!(cfg.entry_node(), a);
        assert_eq!(cfg.exit_node(), c);
        cfg.set_exit(b);
        assert_eq!(cfg.exit_node(), b);
    }

    #[test]
    fn foreign_nodes_are_rejected() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.push(Stmt::Nop);
        let b = cfg.push(Stmt::Nop);
        let foreign = NodeId::from_u32(5);
        assert!(!cfg.connect(a, foreign));
        assert!(!cfg.connect(foreign, b));
        assert!(cfg.successors(a).is_empty());
        assert!(cfg.predecessors(b).is_empty());
        assert!(!cfg.set_entry(foreign));
        assert!(!cfg.set_exit(foreign));
        assert_eq!(cfg.entry_node(), a);
        assert_eq!(cfg.exit_node(), b);
        assert!(cfg.set_exit(a));
        assert_eq!(cfg.exit_node(), a);
    }

    #[test]
    fn display() {
        let mut cfg = ControlFlowGraph::new();
        let x = Var::from_u32(0);
        let a = cfg.push(Stmt::assign(x, 1i64));
        let b = cfg.push(Stmt::Return(Some(x.into())));
        cfg.connect(a, b);
        assert_eq!(cfg.to_string(), "n0: v0 = 1 (entry) -> n1\nn1: return v0 (exit)\n");
    }
}
