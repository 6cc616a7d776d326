use core::{fmt, hash::Hash};

/// This is an abstraction over the control-flow graphs an analysis can be run on.
///
/// A graph has a designated entry node, where control enters, and a designated exit node, where
/// control leaves. Edges are directed, and follow the flow of control, i.e. the children of a node
/// are its control-flow successors.
///
/// Nodes are expected to be cheap, copyable handles (e.g. indices), as the dataflow solver keys its
/// per-node state by them.
pub trait Graph {
    /// The type of node represented in the graph.
    type Node: Copy + Eq + Hash + fmt::Debug;

    /// An empty graph has no nodes.
    #[inline]
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
    /// Get the number of nodes in this graph
    fn size(&self) -> usize;
    /// Get an iterator over all nodes of this graph, in a stable order
    fn nodes(&self) -> impl Iterator<Item = Self::Node> + '_;
    /// Returns true if `node` belongs to this graph
    fn contains(&self, node: Self::Node) -> bool;
    /// Get the entry node of the graph.
    ///
    /// It is expected that a non-empty graph always has an entry. As such, this function may panic
    /// if called on an "empty" graph. You should check whether the graph is empty _first_, if you
    /// are working with a possibly-empty graph.
    fn entry_node(&self) -> Self::Node;
    /// Get the exit node of the graph.
    ///
    /// The same caveats as [Graph::entry_node] apply.
    fn exit_node(&self) -> Self::Node;
    /// Get an iterator over the children (successors) of `parent`
    fn children(&self, parent: Self::Node) -> impl ExactSizeIterator<Item = Self::Node> + '_;
}

impl<G: Graph> Graph for &G {
    type Node = <G as Graph>::Node;

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn nodes(&self) -> impl Iterator<Item = Self::Node> + '_ {
        (**self).nodes()
    }

    fn contains(&self, node: Self::Node) -> bool {
        (**self).contains(node)
    }

    fn entry_node(&self) -> Self::Node {
        (**self).entry_node()
    }

    fn exit_node(&self) -> Self::Node {
        (**self).exit_node()
    }

    fn children(&self, parent: Self::Node) -> impl ExactSizeIterator<Item = Self::Node> + '_ {
        (**self).children(parent)
    }
}

/// An [InvertibleGraph] is a [Graph] which can be "inverted", i.e. edges are reversed.
///
/// Every control-flow graph is invertible: visiting a CFG in reverse is exactly what a backward
/// dataflow analysis does, with the exit node playing the role of the entry.
///
/// This is primarily consumed via [Inverse].
pub trait InvertibleGraph: Graph {
    /// Get an iterator over the predecessors of `parent`.
    ///
    /// NOTE: `parent` in this case will actually be a child of the nodes in the iterator, but we
    /// preserve the naming so as to make it apparent we are working with an inversion of the
    /// original graph.
    fn inverse_children(
        &self,
        parent: Self::Node,
    ) -> impl ExactSizeIterator<Item = Self::Node> + '_;
}

impl<G: InvertibleGraph> InvertibleGraph for &G {
    fn inverse_children(
        &self,
        parent: Self::Node,
    ) -> impl ExactSizeIterator<Item = Self::Node> + '_ {
        (**self).inverse_children(parent)
    }
}

/// This is a wrapper type for [InvertibleGraph] implementations, used to indicate that a graph
/// should be traversed against the direction of its edges.
///
/// The entry and exit nodes of the inversion are the exit and entry nodes of the underlying graph,
/// and the children of a node are its predecessors in the underlying graph.
#[derive(Debug, Copy, Clone)]
pub struct Inverse<G> {
    graph: G,
}

impl<G: InvertibleGraph> Inverse<G> {
    /// Construct an inversion over `graph`
    #[inline]
    pub fn new(graph: G) -> Self {
        Self { graph }
    }

    /// Recover the underlying graph
    #[inline]
    pub fn into_inner(self) -> G {
        self.graph
    }
}

impl<G: InvertibleGraph> Graph for Inverse<G> {
    type Node = <G as Graph>::Node;

    fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    fn size(&self) -> usize {
        self.graph.size()
    }

    fn nodes(&self) -> impl Iterator<Item = Self::Node> + '_ {
        self.graph.nodes()
    }

    fn contains(&self, node: Self::Node) -> bool {
        self.graph.contains(node)
    }

    fn entry_node(&self) -> Self::Node {
        self.graph.exit_node()
    }

    fn exit_node(&self) -> Self::Node {
        self.graph.entry_node()
    }

    fn children(&self, parent: Self::Node) -> impl ExactSizeIterator<Item = Self::Node> + '_ {
        self.graph.inverse_children(parent)
    }
}

impl<G: InvertibleGraph> InvertibleGraph for Inverse<G> {
    fn inverse_children(
        &self,
        parent: Self::Node,
    ) -> impl ExactSizeIterator<Item = Self::Node> + '_ {
        self.graph.children(parent)
    }
}
