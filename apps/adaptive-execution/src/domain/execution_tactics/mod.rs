//! Execution Tactics Bounded Context
//!
//! Pricing and pacing decisions for the adaptive limit-order sequence:
//! tick resolution, per-attempt repricing, spread classification and
//! post-open timing advice. Everything here is pure.

pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::TacticError;
pub use services::{
    MarketTimingAdvisor, RepricingPlanner, SpreadClassifier, TickResolver, exchange_local_time,
};
pub use value_objects::{
    AttemptPlan, AttemptState, ExecutionUrgency, MarketTimingConfig, SpreadClass,
    SpreadRecommendation, SpreadThresholds, StrategyConfig, TickSizeConfig, TimingAdvice,
};
