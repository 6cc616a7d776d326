//! The collaborators a dataflow analysis is run against: control-flow graphs, the direction in
//! which information is propagated over them, and the statements labeling their nodes.
//!
//! The traits in this crate are what the dataflow engine depends on. The concrete
//! [ControlFlowGraph] and [Stmt] types are a minimal implementation of those traits, suitable for
//! tests and small drivers.
#![no_std]
#![deny(warnings)]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod cfg;
mod direction;
mod graph;
mod stmt;
mod visit;

pub use cranelift_entity::EntityRef;
pub use smallvec::{SmallVec, smallvec};

pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, rustc_hash::FxBuildHasher>;
pub type FxHashSet<K> = hashbrown::HashSet<K, rustc_hash::FxBuildHasher>;
pub use rustc_hash::{FxBuildHasher, FxHasher};

pub use self::{
    cfg::{ControlFlowGraph, NodeId},
    direction::{Backward, Direction, Forward},
    graph::{Graph, Inverse, InvertibleGraph},
    stmt::{BinaryOp, DefUse, LabeledGraph, Operand, Stmt, Var},
    visit::{PostOrderIter, is_reachable, reverse_postorder},
};
