/// A marker trait for abstracting over the direction in which information is propagated through a
/// control-flow graph by an analysis, i.e. forward or backward.
///
/// This trait is sealed as there are only two possible directions.
#[allow(private_bounds)]
pub trait Direction: sealed::Direction {
    /// A human-readable name for the direction, used in diagnostics
    const NAME: &'static str;

    fn is_forward() -> bool {
        Self::IS_FORWARD
    }
    fn is_backward() -> bool {
        !Self::IS_FORWARD
    }
}

impl Direction for Forward {
    const NAME: &'static str = "forward";
}

impl Direction for Backward {
    const NAME: &'static str = "backward";
}

mod sealed {
    pub trait Direction: Default + Copy + core::fmt::Debug + 'static {
        const IS_FORWARD: bool;
    }

    /// Information flows in control-flow order, from the entry node towards the exit node
    #[derive(Debug, Copy, Clone, Default)]
    pub struct Forward;
    impl Direction for Forward {
        const IS_FORWARD: bool = true;
    }

    /// Information flows against control-flow order, from the exit node towards the entry node
    #[derive(Debug, Copy, Clone, Default)]
    pub struct Backward;
    impl Direction for Backward {
        const IS_FORWARD: bool = false;
    }
}

pub use self::sealed::{Backward, Forward};
