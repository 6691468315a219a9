//! Position Sizing Bounded Context
//!
//! Turns dollar-denominated trade intents into share quantities that never
//! oversell a position.

pub mod services;
pub mod value_objects;

pub use services::{QuantitySafeguard, SafeguardConfig, ShareResolution, SizingBasis};
pub use value_objects::{AssetInfo, TradeItem};
