/// The result of an operation which may or may not have modified some state, e.g. joining two facts.
///
/// The solver relies on this being exact: reporting `Unchanged` for a modification stalls
/// propagation, while reporting `Changed` spuriously only costs an extra pass.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub enum ChangeResult {
    #[default]
    Unchanged,
    Changed,
}

impl ChangeResult {
    #[inline(always)]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }

    #[inline(always)]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl From<bool> for ChangeResult {
    #[inline]
    fn from(changed: bool) -> Self {
        if changed { Self::Changed } else { Self::Unchanged }
    }
}

impl From<ChangeResult> for bool {
    #[inline]
    fn from(result: ChangeResult) -> Self {
        result.is_changed()
    }
}

impl core::ops::BitOr for ChangeResult {
    type Output = ChangeResult;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        if self.is_changed() { self } else { rhs }
    }
}

impl core::ops::BitOrAssign for ChangeResult {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}
