pub mod detector;
pub mod evaluator;
pub mod spread;
