pub mod evaluator;
pub mod selector;
pub mod simulator;

pub use selector::RocketWeights;
