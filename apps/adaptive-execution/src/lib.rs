// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Adaptive Execution - Rust Core Library
//!
//! Turns a desired (symbol, side, quantity) trade into a filled position with
//! a progressively repriced limit-order sequence, real-time fill detection and
//! a market-order fallback.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Pure business logic
//!   - `order_execution`: Order snapshots, execution results, error taxonomy
//!   - `execution_tactics`: Repricing planner, tick resolver, spread and timing analysis
//!   - `position_sizing`: Safe share quantities from dollar amounts
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `OrderGatewayPort`, `QuoteSourcePort`, `OrderUpdateStreamPort`, `BlobStorePort`
//!   - `services`: Completion monitors, idempotency store, share resolver
//!   - `use_cases`: `ExecuteTradeUseCase` (single trades and sell-then-buy batches)
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `broker`: Alpaca REST gateway and an in-memory broker
//!   - `price_feed`: Alpaca latest quote/trade source
//!   - `websocket`: Alpaca trade update stream
//!   - `persistence`: In-memory and file blob stores
//!   - `config`: Dependency injection container
//!
//! Cross-cutting: [`config`] (YAML loading) and [`observability`] (tracing
//! and Prometheus metrics).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Logging and metrics.
pub mod observability;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::execution_tactics::{
    MarketTimingConfig, RepricingPlanner, SpreadClassifier, SpreadThresholds, StrategyConfig,
    TickResolver,
};
pub use domain::order_execution::{
    ErrorKind, ExecutionError, ExecutionResult, Order, OrderSide, OrderSize, OrderStatus,
    OrderType, TimeInForce,
};
pub use domain::position_sizing::{QuantitySafeguard, SafeguardConfig, TradeItem};
pub use domain::shared::{CorrelationId, OrderId, PlanHash, Symbol};

// Application re-exports
pub use application::dto::{BatchExecutionReport, ExecutionRequest, IdempotentExecution};
pub use application::ports::{
    BlobStorePort, GatewayError, OrderGatewayPort, OrderUpdate, OrderUpdateStreamPort,
    PriceFeedError, Quote, QuoteSourcePort,
};
pub use application::services::{CompletionMonitor, ExecutionIdempotencyStore};
pub use application::use_cases::ExecuteTradeUseCase;

// Infrastructure re-exports
pub use infrastructure::broker::{AlpacaConfig, AlpacaEnvironment, AlpacaError, AlpacaGateway};
pub use infrastructure::config::{Container, ContainerError};
pub use infrastructure::persistence::{FileBlobStore, InMemoryBlobStore};
pub use infrastructure::price_feed::AlpacaQuoteSource;
pub use infrastructure::websocket::TradeUpdateStream;

pub use config::{Config, ConfigError, load_config};
