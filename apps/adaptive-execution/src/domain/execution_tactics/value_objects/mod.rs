//! Execution Tactics Value Objects

mod attempt;
mod spread;
mod strategy_config;
mod timing;

pub use attempt::{AttemptPlan, AttemptState};
pub use spread::{ExecutionUrgency, SpreadClass, SpreadRecommendation, SpreadThresholds};
pub use strategy_config::{StrategyConfig, TickSizeConfig};
pub use timing::{MarketTimingConfig, TimingAdvice};
