use core::fmt;

/// The maximum number of passes the solver performs before giving up, unless configured otherwise
pub const DEFAULT_MAX_PASSES: usize = 10_000;

/// The strategy used by the [crate::DataFlowSolver] to decide which nodes to (re-)visit.
///
/// Both strategies compute the same fixpoint, they only differ in how much work is performed to
/// reach it.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum SolveStrategy {
    /// Visit every node of the graph on each pass, until a pass completes without changing any fact
    #[default]
    RoundRobin,
    /// Only revisit the nodes whose inputs may have changed since they were last visited
    Worklist,
}

impl fmt::Display for SolveStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRobin => f.write_str("round-robin"),
            Self::Worklist => f.write_str("worklist"),
        }
    }
}

/// Configuration for the data flow solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// How the solver schedules node visits
    strategy: SolveStrategy,
    /// The maximum number of passes over the graph before the solver gives up
    max_passes: Option<usize>,
    /// Whether to check each application of a transfer function for monotonicity and an exact
    /// change flag
    verify_transfer: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: SolveStrategy::default(),
            max_passes: Some(DEFAULT_MAX_PASSES),
            verify_transfer: cfg!(debug_assertions),
        }
    }
}

impl SolverConfig {
    /// Get a new, default configuration
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub const fn strategy(&self) -> SolveStrategy {
        self.strategy
    }

    #[inline(always)]
    pub const fn max_passes(&self) -> Option<usize> {
        self.max_passes
    }

    #[inline(always)]
    pub const fn verify_transfer(&self) -> bool {
        self.verify_transfer
    }

    /// Set the strategy used to schedule node visits
    pub fn set_strategy(&mut self, strategy: SolveStrategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    /// Set the maximum number of passes over the graph before the solver reports a failure to
    /// converge, or `None` to iterate for as long as it takes.
    ///
    /// A well-formed (i.e. monotone) analysis over a finite lattice always converges, so the limit
    /// only matters when a meet or transfer function is not monotone, in which case the solver may
    /// otherwise loop forever. When using [SolveStrategy::Worklist], the limit is applied to the
    /// number of node visits, as a multiple of the number of nodes in the graph.
    pub fn set_max_passes(&mut self, limit: Option<usize>) -> &mut Self {
        self.max_passes = limit;
        self
    }

    /// Set whether the solver should verify each application of a transfer function.
    ///
    /// When enabled, the solver checks that the fact produced by the transfer function is never
    /// smaller than it was before the call, and that the change flag returned by the function
    /// matches whether the fact actually changed. This requires copying the fact on every call, so
    /// it is only enabled by default in debug builds.
    pub fn set_verify_transfer(&mut self, yes: bool) -> &mut Self {
        self.verify_transfer = yes;
        self
    }
}
