use core::fmt;

use dataflow_ir::{Backward, Direction, Forward, Graph, Inverse, InvertibleGraph};

use crate::NodeFacts;

/// Identifies one of the two facts the solver maintains for each node
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FactSide {
    /// The fact holding on entry to the node
    In,
    /// The fact holding on exit from the node
    Out,
}

impl FactSide {
    /// Select this side of `facts`
    #[inline]
    pub fn of<F>(self, facts: &NodeFacts<F>) -> &F {
        match self {
            Self::In => &facts.in_fact,
            Self::Out => &facts.out_fact,
        }
    }

    /// Select this side of `facts`, mutably
    #[inline]
    pub fn of_mut<F>(self, facts: &mut NodeFacts<F>) -> &mut F {
        match self {
            Self::In => &mut facts.in_fact,
            Self::Out => &mut facts.out_fact,
        }
    }
}

impl fmt::Display for FactSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => f.write_str("IN"),
            Self::Out => f.write_str("OUT"),
        }
    }
}

/// This trait resolves the roles played by each side of a node's facts, and the shape of the graph
/// information flows over, for a given [Direction].
///
/// The solver never branches on the direction of an analysis: it always meets the _output_ side of
/// a node's flow sources into the node's _input_ side, then applies the transfer function, which
/// updates the output side. For a forward analysis, the input side is IN, and the flow sources of a
/// node are its control-flow predecessors. For a backward analysis, the input side is OUT, and the
/// flow sources are its control-flow successors.
///
/// The flow graph is the view of the control-flow graph in which edges point in the direction
/// information flows, so its entry node is the boundary of the analysis: the entry node of the
/// control-flow graph for forward analyses, and the exit node for backward analyses.
pub trait FlowDirection: Direction {
    /// The side of a node's facts computed by meeting over its flow sources
    const INPUT: FactSide;
    /// The side of a node's facts computed by the transfer function
    const OUTPUT: FactSide;

    /// The type of graph information flows over in this direction
    type FlowGraph<'a, G>: InvertibleGraph<Node = <G as Graph>::Node>
    where
        G: InvertibleGraph + 'a;

    /// Get the view of `graph` in which edges follow the flow of information
    fn flow_graph<'a, G>(graph: &'a G) -> Self::FlowGraph<'a, G>
    where
        G: InvertibleGraph + 'a;
}

impl FlowDirection for Forward {
    type FlowGraph<'a, G>
        = &'a G
    where
        G: InvertibleGraph + 'a;

    const INPUT: FactSide = FactSide::In;
    const OUTPUT: FactSide = FactSide::Out;

    #[inline]
    fn flow_graph<'a, G>(graph: &'a G) -> Self::FlowGraph<'a, G>
    where
        G: InvertibleGraph + 'a,
    {
        graph
    }
}

impl FlowDirection for Backward {
    type FlowGraph<'a, G>
        = Inverse<&'a G>
    where
        G: InvertibleGraph + 'a;

    const INPUT: FactSide = FactSide::Out;
    const OUTPUT: FactSide = FactSide::In;

    #[inline]
    fn flow_graph<'a, G>(graph: &'a G) -> Self::FlowGraph<'a, G>
    where
        G: InvertibleGraph + 'a,
    {
        Inverse::new(graph)
    }
}
