pub mod liveness;

pub use self::liveness::{LiveVariableAnalysis, Liveness};
