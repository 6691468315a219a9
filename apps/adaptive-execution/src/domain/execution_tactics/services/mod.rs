//! Execution Tactics Domain Services

mod market_timing;
mod repricing_planner;
mod spread_classifier;
mod tick_resolver;

pub use market_timing::{MarketTimingAdvisor, exchange_local_time};
pub use repricing_planner::RepricingPlanner;
pub use spread_classifier::SpreadClassifier;
pub use tick_resolver::TickResolver;
