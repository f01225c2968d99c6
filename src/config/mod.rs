mod provision;
mod strategies;

pub use provision::ProvisionConfig;
pub use strategies::{StrategyFile, StrategyKind, StrategySpec};
