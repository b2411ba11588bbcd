pub mod core;

pub mod tournament;

pub use self::core::{Solution, SolveError, Stats};
