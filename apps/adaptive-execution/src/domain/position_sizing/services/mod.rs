//! Position Sizing Domain Services

mod quantity_safeguard;

pub use quantity_safeguard::{QuantitySafeguard, SafeguardConfig, ShareResolution, SizingBasis};
