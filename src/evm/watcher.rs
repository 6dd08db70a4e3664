//! Valuation event watching
//!
//! Polling-based listeners for the three valuation events. Each subscription runs
//! as its own tokio task and lives until the receiving side is dropped.
//!
//! ## Usage
//!
//! ```ignore
//! let watcher = ValuationEventWatcher::new(provider, contract_address, config);
//! let mut rx = watcher.subscribe(ValuationKind::Average).await?;
//! while let Some(value) = rx.recv().await { ... }
//! ```

use alloy::{
    primitives::{Address, U256},
    providers::{Provider, RootProvider},
    rpc::types::{Filter, Log},
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::BridgeError;
use crate::evm::events::{event_topic, parse_valuation_log, ValuationUpdatedEvent};
use crate::provider::EventSubscription;
use crate::state::ValuationKind;

/// Buffered deliveries per subscription before the poller waits on the consumer
const SUBSCRIPTION_BUFFER: usize = 64;

/// Event watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Poll interval between checks
    pub poll_interval: Duration,
    /// Maximum block range per query (to avoid RPC limits)
    pub max_block_range: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_block_range: 10_000,
        }
    }
}

/// Node reads the watcher depends on
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn block_number(&self) -> eyre::Result<u64>;

    /// Logs for `kind` in the inclusive range `from_block..=to_block`
    async fn valuation_logs(
        &self,
        kind: ValuationKind,
        from_block: u64,
        to_block: u64,
    ) -> eyre::Result<Vec<Log>>;
}

/// `eth_blockNumber` / `eth_getLogs` over HTTP
pub struct RpcLogSource {
    provider: RootProvider<Http<Client>>,
    contract_address: Address,
}

impl RpcLogSource {
    pub fn new(provider: RootProvider<Http<Client>>, contract_address: Address) -> Self {
        Self {
            provider,
            contract_address,
        }
    }
}

#[async_trait]
impl LogSource for RpcLogSource {
    async fn block_number(&self) -> eyre::Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn valuation_logs(
        &self,
        kind: ValuationKind,
        from_block: u64,
        to_block: u64,
    ) -> eyre::Result<Vec<Log>> {
        let filter = Filter::new()
            .address(self.contract_address)
            .event_signature(event_topic(kind))
            .from_block(from_block)
            .to_block(to_block);

        Ok(self.provider.get_logs(&filter).await?)
    }
}

/// Split `from_block..=to_block` into inclusive ranges of at most `max_range` blocks
pub fn block_chunks(
    from_block: u64,
    to_block: u64,
    max_range: u64,
) -> impl Iterator<Item = (u64, u64)> {
    let span = max_range.max(1) - 1;
    let mut next = Some(from_block).filter(|&from| from <= to_block);

    std::iter::from_fn(move || {
        let start = next?;
        let end = start.saturating_add(span).min(to_block);
        next = if end < to_block { Some(end + 1) } else { None };
        Some((start, end))
    })
}

/// Watcher for valuation contract events
#[derive(Clone)]
pub struct ValuationEventWatcher {
    source: Arc<dyn LogSource>,
    contract_address: Address,
    config: WatcherConfig,
}

impl ValuationEventWatcher {
    pub fn new(
        provider: RootProvider<Http<Client>>,
        contract_address: Address,
        config: WatcherConfig,
    ) -> Self {
        Self::with_source(
            Arc::new(RpcLogSource::new(provider, contract_address)),
            contract_address,
            config,
        )
    }

    pub fn with_source(
        source: Arc<dyn LogSource>,
        contract_address: Address,
        config: WatcherConfig,
    ) -> Self {
        Self {
            source,
            contract_address,
            config,
        }
    }

    pub async fn get_current_block(&self) -> Result<u64, BridgeError> {
        self.source
            .block_number()
            .await
            .map_err(|e| BridgeError::QueryFailure(format!("Failed to get block number: {}", e)))
    }

    /// Poll for `kind` events in an inclusive block range, chunked by `max_block_range`
    pub async fn poll_value_events(
        &self,
        kind: ValuationKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<ValuationUpdatedEvent>, BridgeError> {
        let mut events = Vec::new();

        for (chunk_from, chunk_to) in block_chunks(from_block, to_block, self.config.max_block_range)
        {
            let logs = self
                .source
                .valuation_logs(kind, chunk_from, chunk_to)
                .await
                .map_err(|e| BridgeError::EventDelivery {
                    event: kind.event_name(),
                    message: format!(
                        "Failed to get logs from block {} to {}: {}",
                        chunk_from, chunk_to, e
                    ),
                })?;

            for log in &logs {
                match parse_valuation_log(kind, log) {
                    Some(event) => events.push(event),
                    None => warn!(
                        event = kind.event_name(),
                        block = ?log.block_number,
                        tx = ?log.transaction_hash,
                        "Failed to parse valuation event from log"
                    ),
                }
            }
        }

        if !events.is_empty() {
            debug!(
                event = kind.event_name(),
                count = events.len(),
                from = from_block,
                to = to_block,
                "Found valuation events"
            );
        }

        Ok(events)
    }

    /// Register a listener for `kind` starting after the current block.
    ///
    /// Fails only if the starting block cannot be read. Later RPC failures are
    /// delivered on the subscription as `EventDelivery` errors.
    pub async fn subscribe(&self, kind: ValuationKind) -> Result<EventSubscription, BridgeError> {
        let start_block = self
            .get_current_block()
            .await
            .map_err(|e| BridgeError::EventDelivery {
                event: kind.event_name(),
                message: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let watcher = self.clone();

        info!(
            event = kind.event_name(),
            contract = %self.contract_address,
            start_block = start_block,
            "Valuation listener registered"
        );

        tokio::spawn(async move {
            watcher.poll_loop(kind, start_block, tx).await;
        });

        Ok(rx)
    }

    async fn poll_loop(
        &self,
        kind: ValuationKind,
        start_block: u64,
        tx: mpsc::Sender<Result<U256, BridgeError>>,
    ) {
        let mut last_block = start_block;

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            match self.poll_step(kind, last_block, &tx).await {
                Some(block) => last_block = block,
                None => break,
            }
        }

        debug!(event = kind.event_name(), "Valuation listener stopped");
    }

    /// One poll past `last_block`.
    ///
    /// Returns the last fully processed block, which only moves forward when every
    /// log in the range was fetched. `None` means the receiver is gone.
    async fn poll_step(
        &self,
        kind: ValuationKind,
        last_block: u64,
        tx: &mpsc::Sender<Result<U256, BridgeError>>,
    ) -> Option<u64> {
        let current_block = match self.get_current_block().await {
            Ok(block) => block,
            Err(e) => {
                let delivery = BridgeError::EventDelivery {
                    event: kind.event_name(),
                    message: e.to_string(),
                };
                tx.send(Err(delivery)).await.ok()?;
                return Some(last_block);
            }
        };

        if current_block <= last_block {
            return Some(last_block);
        }

        match self
            .poll_value_events(kind, last_block + 1, current_block)
            .await
        {
            Ok(events) => {
                for event in events {
                    debug!(
                        event = kind.event_name(),
                        value = %event.value,
                        block = event.block_number,
                        tx_hash = %event.tx_hash,
                        "Valuation event received"
                    );
                    tx.send(Ok(event.value)).await.ok()?;
                }
                Some(current_block)
            }
            Err(e) => {
                tx.send(Err(e)).await.ok()?;
                Some(last_block)
            }
        }
    }
}
