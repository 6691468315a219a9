//! Position Sizing Value Objects

mod asset_info;
mod trade_item;

pub use asset_info::AssetInfo;
pub use trade_item::TradeItem;
