pub mod dream;
pub mod indicators;
pub mod select;

pub use dream::{evaluate, evaluate_detailed, evaluate_with, StrategyParams};
pub use select::select_top_n;
