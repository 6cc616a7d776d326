use core::fmt;

use cranelift_entity::entity_impl;
use smallvec::SmallVec;

use crate::InvertibleGraph;

/// This trait is implemented by node labels (i.e. statements) which can report the variables they
/// read and write.
///
/// Only variables are reported: operands which are not variables (e.g. constants) must be filtered
/// out by the implementation, as they can never be live or defined.
pub trait DefUse {
    /// The type of variable referenced by the label
    type Var: Copy + Eq + core::hash::Hash + fmt::Debug;

    /// Get the variables read by this label, in operand order
    ///
    /// A variable read more than once may be reported more than once.
    fn uses(&self) -> impl Iterator<Item = Self::Var> + '_;

    /// Get the variable written by this label, if any
    ///
    /// A label defines at most one variable.
    fn def(&self) -> Option<Self::Var>;
}

impl<T: DefUse> DefUse for &T {
    type Var = <T as DefUse>::Var;

    #[inline]
    fn uses(&self) -> impl Iterator<Item = Self::Var> + '_ {
        (**self).uses()
    }

    #[inline]
    fn def(&self) -> Option<Self::Var> {
        (**self).def()
    }
}

/// A [LabeledGraph] is a graph whose nodes carry a label, typically the IR statement found at the
/// corresponding program point.
pub trait LabeledGraph: InvertibleGraph {
    type Label;

    /// Get the label attached to `node`
    fn label(&self, node: Self::Node) -> &Self::Label;
}

impl<G: LabeledGraph> LabeledGraph for &G {
    type Label = <G as LabeledGraph>::Label;

    #[inline]
    fn label(&self, node: Self::Node) -> &Self::Label {
        (**self).label(node)
    }
}

/// A local variable of the analyzed program
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);
entity_impl!(Var, "v");

/// An operand of a [Stmt]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A read of a local variable
    Var(Var),
    /// An integer literal
    Const(i64),
}

impl Operand {
    /// Get the variable referenced by this operand, if it is one
    #[inline]
    pub fn as_var(&self) -> Option<Var> {
        match self {
            Self::Var(var) => Some(*var),
            Self::Const(_) => None,
        }
    }
}

impl From<Var> for Operand {
    #[inline]
    fn from(var: Var) -> Self {
        Self::Var(var)
    }
}

impl From<i64> for Operand {
    #[inline]
    fn from(imm: i64) -> Self {
        Self::Const(imm)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(var) => write!(f, "{var}"),
            Self::Const(imm) => write!(f, "{imm}"),
        }
    }
}

/// A binary operator used by [Stmt::Binary]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Lt,
    Eq,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Lt => "<",
            Self::Eq => "==",
        })
    }
}

/// A minimal three-address statement, used to label the nodes of a [crate::ControlFlowGraph]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Does nothing; commonly used for synthetic entry/exit nodes
    Nop,
    /// `dest = value`
    Assign { dest: Var, value: Operand },
    /// `dest = lhs op rhs`
    Binary {
        dest: Var,
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// `if cond goto ...`, the targets are given by the edges of the graph
    If { cond: Operand },
    /// `[dest =] callee(args...)`
    Invoke {
        dest: Option<Var>,
        callee: &'static str,
        args: SmallVec<[Operand; 4]>,
    },
    /// `return [value]`
    Return(Option<Operand>),
}

impl Stmt {
    /// Construct `dest = value`
    pub fn assign(dest: Var, value: impl Into<Operand>) -> Self {
        Self::Assign {
            dest,
            value: value.into(),
        }
    }

    /// Construct `dest = lhs op rhs`
    pub fn binary(
        dest: Var,
        op: BinaryOp,
        lhs: impl Into<Operand>,
        rhs: impl Into<Operand>,
    ) -> Self {
        Self::Binary {
            dest,
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// Construct `[dest =] callee(args...)`
    pub fn invoke<I>(dest: Option<Var>, callee: &'static str, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        Self::Invoke {
            dest,
            callee,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Get all operands of this statement, variables or otherwise
    pub fn operands(&self) -> SmallVec<[Operand; 4]> {
        match self {
            Self::Nop | Self::Return(None) => SmallVec::new(),
            Self::Assign { value, .. } => SmallVec::from_slice(&[*value]),
            Self::Binary { lhs, rhs, .. } => SmallVec::from_slice(&[*lhs, *rhs]),
            Self::If { cond } => SmallVec::from_slice(&[*cond]),
            Self::Invoke { args, .. } => args.clone(),
            Self::Return(Some(value)) => SmallVec::from_slice(&[*value]),
        }
    }
}

impl DefUse for Stmt {
    type Var = Var;

    fn uses(&self) -> impl Iterator<Item = Var> + '_ {
        self.operands().into_iter().filter_map(|operand| operand.as_var())
    }

    fn def(&self) -> Option<Var> {
        match self {
            Self::Assign { dest, .. } | Self::Binary { dest, .. } => Some(*dest),
            Self::Invoke { dest, .. } => *dest,
            Self::Nop | Self::If { .. } | Self::Return(_) => None,
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => f.write_str("nop"),
            Self::Assign { dest, value } => write!(f, "{dest} = {value}"),
            Self::Binary { dest, op, lhs, rhs } => write!(f, "{dest} = {lhs} {op} {rhs}"),
            Self::If { cond } => write!(f, "if {cond}"),
            Self::Invoke { dest, callee, args } => {
                if let Some(dest) = dest {
                    write!(f, "{dest} = ")?;
                }
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Return(None) => f.write_str("return"),
            Self::Return(Some(value)) => write!(f, "return {value}"),
        }
    }
}
