use core::{fmt, hash::Hash};

use dataflow_ir::FxHashSet;

use crate::ChangeResult;

/// This trait must be implemented by the facts (abstract program states) a [DataFlowAnalysis]
/// propagates.
///
/// Facts are elements of a lattice. The solver itself only ever combines facts through the
/// analysis' own meet and transfer functions, but it requires access to the partial order of the
/// lattice in order to verify that those functions are monotone, see
/// [SolverConfig::set_verify_transfer].
///
/// [DataFlowAnalysis]: crate::DataFlowAnalysis
/// [SolverConfig::set_verify_transfer]: crate::SolverConfig::set_verify_transfer
pub trait DataFlowFact: Clone + Eq + fmt::Debug {
    /// Returns true if `self` is less than or equal to `other` in the partial order of the lattice,
    /// i.e. `other` carries at least as much information as `self`.
    fn subsumed_by(&self, other: &Self) -> bool;
}

/// A [SetFact] is a finite set of elements, typically program variables, with the operations
/// needed to use it as the fact type of a set-based dataflow analysis.
///
/// With union as the join, the empty set is the bottom element of the lattice, and the partial
/// order is set inclusion. With intersection as the meet, the roles are reversed.
///
/// Cloning a [SetFact] produces a deep copy sharing no state with the original. Equality is
/// element-wise, regardless of insertion order.
#[derive(Clone)]
pub struct SetFact<T> {
    set: FxHashSet<T>,
}

impl<T> Default for SetFact<T> {
    fn default() -> Self {
        Self {
            set: FxHashSet::default(),
        }
    }
}

impl<T> SetFact<T> {
    /// Create a new, empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of elements in this set
    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Remove all elements of this set
    pub fn clear(&mut self) {
        self.set.clear();
    }

    /// Iterate over the elements of this set, in an unspecified order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.set.iter()
    }
}

impl<T: Copy + Eq + Hash> SetFact<T> {
    /// Insert `elem` into this set.
    ///
    /// Returns true if `elem` was not already present.
    #[inline]
    pub fn add(&mut self, elem: T) -> bool {
        self.set.insert(elem)
    }

    /// Remove `elem` from this set.
    ///
    /// Returns true if `elem` was present.
    #[inline]
    pub fn remove(&mut self, elem: &T) -> bool {
        self.set.remove(elem)
    }

    #[inline]
    pub fn contains(&self, elem: &T) -> bool {
        self.set.contains(elem)
    }

    /// Join `other` into `self`, i.e. `self ← self ∪ other`
    pub fn union(&mut self, other: &Self) -> ChangeResult {
        let len = self.set.len();
        self.set.extend(other.set.iter().copied());
        ChangeResult::from(self.set.len() != len)
    }

    /// Meet `other` into `self`, i.e. `self ← self ∩ other`
    pub fn intersect(&mut self, other: &Self) -> ChangeResult {
        let len = self.set.len();
        self.set.retain(|elem| other.set.contains(elem));
        ChangeResult::from(self.set.len() != len)
    }

    /// Remove all elements of `other` from `self`, i.e. `self ← self \ other`
    pub fn difference(&mut self, other: &Self) -> ChangeResult {
        let len = self.set.len();
        self.set.retain(|elem| !other.set.contains(elem));
        ChangeResult::from(self.set.len() != len)
    }

    /// Replace the contents of `self` with those of `other`
    pub fn set_to(&mut self, other: &Self) -> ChangeResult {
        if self == other {
            return ChangeResult::Unchanged;
        }
        self.set.clone_from(&other.set);
        ChangeResult::Changed
    }

    /// Returns true if every element of `self` is also an element of `other`
    #[inline]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.set.is_subset(&other.set)
    }
}

impl<T: Ord + Clone> SetFact<T> {
    /// Get the elements of this set in ascending order
    pub fn to_sorted_vec(&self) -> Vec<T> {
        let mut elems = self.set.iter().cloned().collect::<Vec<_>>();
        elems.sort();
        elems
    }
}

impl<T: Eq + Hash> PartialEq for SetFact<T> {
    fn eq(&self, other: &Self) -> bool {
        self.set == other.set
    }
}

impl<T: Eq + Hash> Eq for SetFact<T> {}

impl<T: Copy + Eq + Hash + fmt::Debug> DataFlowFact for SetFact<T> {
    #[inline]
    fn subsumed_by(&self, other: &Self) -> bool {
        self.is_subset(other)
    }
}

impl<T: Copy + Eq + Hash> FromIterator<T> for SetFact<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            set: FxHashSet::from_iter(iter),
        }
    }
}

impl<T: Copy + Eq + Hash> Extend<T> for SetFact<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.set.extend(iter);
    }
}

impl<T> IntoIterator for SetFact<T> {
    type IntoIter = hashbrown::hash_set::IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        self.set.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a SetFact<T> {
    type IntoIter = hashbrown::hash_set::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.set.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for SetFact<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.set.iter()).finish()
    }
}

impl<T: Ord + Clone + fmt::Display> fmt::Display for SetFact<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, elem) in self.to_sorted_vec().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{elem}")?;
        }
        f.write_str("}")
    }
}
