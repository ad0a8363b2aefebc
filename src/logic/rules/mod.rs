pub mod engine;
pub mod evaluator;

pub use engine::ComparisonEngine;
pub use evaluator::rule_triggered;
