//! Dependency Injection Container
//!
//! Builds the Alpaca adapters, the completion monitor and the idempotency
//! store from a loaded [`Config`] and hands out wired use cases.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    BlobStorePort, OrderGatewayPort, OrderUpdateStreamPort, QuoteSourcePort,
};
use crate::application::services::{CompletionMonitor, ExecutionIdempotencyStore};
use crate::application::use_cases::ExecuteTradeUseCase;
use crate::config::{BlobStoreKind, Config, ConfigError, validate_config};
use crate::infrastructure::broker::{AlpacaError, AlpacaGateway};
use crate::infrastructure::persistence::{FileBlobStore, InMemoryBlobStore};
use crate::infrastructure::price_feed::AlpacaQuoteSource;
use crate::infrastructure::websocket::TradeUpdateStream;

/// Errors raised while wiring the container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Broker API credentials are not configured.
    #[error("broker credentials are required (set broker.api_key and broker.api_secret)")]
    MissingCredentials,

    /// An Alpaca client could not be built.
    #[error("failed to build broker client: {0}")]
    Broker(#[from] AlpacaError),
}

/// Build the blob store selected by `persistence.kind`.
///
/// Returns `None` when idempotency tracking is disabled.
#[must_use]
pub fn build_blob_store(config: &Config) -> Option<Arc<dyn BlobStorePort>> {
    match config.persistence.kind {
        BlobStoreKind::Memory => Some(Arc::new(InMemoryBlobStore::new())),
        BlobStoreKind::File => Some(Arc::new(FileBlobStore::new(&config.persistence.path))),
        BlobStoreKind::Disabled => None,
    }
}

/// Wire an [`ExecuteTradeUseCase`] from configuration and arbitrary ports.
///
/// The completion monitor streams when `stream` is given and polls otherwise.
pub fn build_use_case<G, Q>(
    config: &Config,
    gateway: Arc<G>,
    quotes: Arc<Q>,
    stream: Option<Arc<dyn OrderUpdateStreamPort>>,
    blob_store: Option<Arc<dyn BlobStorePort>>,
) -> ExecuteTradeUseCase<G, Q>
where
    G: OrderGatewayPort,
    Q: QuoteSourcePort,
{
    let monitor = Arc::new(CompletionMonitor::select(
        Arc::clone(&gateway),
        stream,
        config.monitor.poll_interval(),
        config.monitor.backstop_interval(),
    ));

    let use_case = ExecuteTradeUseCase::new(
        gateway,
        quotes,
        monitor,
        Arc::new(config.execution.to_strategy_config()),
    )
    .with_spread_thresholds(config.spread.clone())
    .with_timing_config(config.timing.clone())
    .with_safeguard_config(config.sizing.clone());

    match blob_store {
        Some(store) => use_case.with_idempotency_store(Arc::new(ExecutionIdempotencyStore::with_key(
            store,
            config.persistence.attempts_key.clone(),
        ))),
        None => use_case,
    }
}

/// Production wiring against Alpaca.
pub struct Container {
    config: Config,
    gateway: Arc<AlpacaGateway>,
    quotes: Arc<AlpacaQuoteSource>,
    stream: Option<Arc<TradeUpdateStream>>,
    blob_store: Option<Arc<dyn BlobStorePort>>,
    shutdown: CancellationToken,
}

impl Container {
    /// Validate `config` and build the adapters.
    ///
    /// The trade update stream is created but does not connect until the
    /// first completion wait subscribes to it.
    ///
    /// # Errors
    ///
    /// Returns an error when validation fails, credentials are missing, or an
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> Result<Self, ContainerError> {
        validate_config(config)?;
        if !config.broker.has_credentials() {
            return Err(ContainerError::MissingCredentials);
        }

        let alpaca = config.broker.to_alpaca_config();
        let gateway = Arc::new(AlpacaGateway::new(&alpaca)?);
        let quotes = Arc::new(AlpacaQuoteSource::new(&alpaca)?);
        let stream = config
            .broker
            .to_stream_config()
            .map(|stream_config| Arc::new(TradeUpdateStream::new(stream_config, shutdown.child_token())));

        tracing::info!(
            environment = %config.broker.environment,
            streaming = stream.is_some(),
            persistence = ?config.persistence.kind,
            "Execution container initialized"
        );

        Ok(Self {
            config: config.clone(),
            gateway,
            quotes,
            stream,
            blob_store: build_blob_store(config),
            shutdown,
        })
    }

    /// Configuration the container was built from.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Alpaca order gateway.
    #[must_use]
    pub fn gateway(&self) -> Arc<AlpacaGateway> {
        Arc::clone(&self.gateway)
    }

    /// Alpaca quote source.
    #[must_use]
    pub fn quotes(&self) -> Arc<AlpacaQuoteSource> {
        Arc::clone(&self.quotes)
    }

    /// Returns true if a trade update stream is configured.
    #[must_use]
    pub const fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Create an `ExecuteTradeUseCase`.
    pub fn execute_trade_use_case(&self) -> ExecuteTradeUseCase<AlpacaGateway, AlpacaQuoteSource> {
        let stream = self
            .stream
            .as_ref()
            .map(|s| Arc::clone(s) as Arc<dyn OrderUpdateStreamPort>);
        build_use_case(
            &self.config,
            Arc::clone(&self.gateway),
            Arc::clone(&self.quotes),
            stream,
            self.blob_store.clone(),
        )
    }

    /// Stop the trade update stream and cancel background work.
    pub async fn shutdown(&self) {
        if let Some(stream) = &self.stream {
            stream.stop().await;
        }
        self.shutdown.cancel();
        tracing::info!("Execution container shut down");
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("environment", &self.config.broker.environment)
            .field("streaming", &self.stream.is_some())
            .field("persistence", &self.config.persistence.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_string;
    use crate::infrastructure::broker::InMemoryGateway;
    use crate::infrastructure::price_feed::MockQuoteSource;
    use std::time::Duration;

    fn config_with_credentials() -> Config {
        let mut config = Config::default();
        config.broker.api_key = "key".to_string();
        config.broker.api_secret = "secret".to_string();
        config
    }

    #[test]
    fn from_config_requires_credentials() {
        let result = Container::from_config(&Config::default(), CancellationToken::new());
        assert!(matches!(result, Err(ContainerError::MissingCredentials)));
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let mut config = config_with_credentials();
        config.execution.max_attempts = 0;
        let result = Container::from_config(&config, CancellationToken::new());
        assert!(matches!(result, Err(ContainerError::Config(_))));
    }

    #[tokio::test]
    async fn from_config_builds_streaming_container() {
        let container = Container::from_config(&config_with_credentials(), CancellationToken::new())
            .unwrap();
        assert!(container.has_stream());

        let use_case = container.execute_trade_use_case();
        assert_eq!(use_case.config().max_attempts, container.config().execution.max_attempts);

        container.shutdown().await;
    }

    #[test]
    fn disabled_stream_falls_back_to_polling() {
        let mut config = config_with_credentials();
        config.broker.stream.enabled = false;
        let container = Container::from_config(&config, CancellationToken::new()).unwrap();
        assert!(!container.has_stream());
    }

    #[test]
    fn blob_store_follows_persistence_kind() {
        let mut config = Config::default();
        assert!(build_blob_store(&config).is_some());

        config.persistence.kind = BlobStoreKind::Disabled;
        assert!(build_blob_store(&config).is_none());
    }

    #[test]
    fn build_use_case_applies_execution_section() {
        let config = load_config_from_string(
            r"
execution:
  max_attempts: 5
  base_timeout_secs: 7
",
        )
        .unwrap();

        let use_case = build_use_case(
            &config,
            Arc::new(InMemoryGateway::new()),
            Arc::new(MockQuoteSource::new()),
            None,
            None,
        );

        assert_eq!(use_case.config().max_attempts, 5);
        assert_eq!(use_case.config().base_timeout, Duration::from_secs(7));
    }
}
