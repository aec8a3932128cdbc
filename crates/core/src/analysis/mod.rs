pub mod disclosure;
pub mod instrument;
pub mod news;
pub mod signal;
pub mod technical;

pub use instrument::{Analyzer, CycleInputs};
