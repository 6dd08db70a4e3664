//! Wallet provider seam
//!
//! The bridge talks to the chain only through these traits. `evm::LocalWalletProvider`
//! implements them over JSON-RPC; tests substitute an in-memory fake.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BridgeError;
use crate::state::ValuationKind;

/// Stream of decoded values for one contract event.
///
/// An `Err` item is a listener-level delivery error; the subscription stays open.
pub type EventSubscription = mpsc::Receiver<Result<U256, BridgeError>>;

/// Account authorization and contract binding
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for account access. The first account is the session account.
    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError>;

    /// Bind the valuation contract interface at `address`
    fn bind_contract(&self, address: Address) -> Arc<dyn ValuationContract>;
}

/// Entry points, queries and events of the valuation contract
#[async_trait]
pub trait ValuationContract: Send + Sync {
    fn address(&self) -> Address;

    /// `requestSmartZipValue(string)`; returns once the transaction is submitted
    async fn request_smart_zip_value(
        &self,
        from: Address,
        zip_code: &str,
    ) -> Result<TxHash, BridgeError>;

    /// `requestProspectNowValue(string)`; returns once the transaction is submitted
    async fn request_prospect_now_value(
        &self,
        from: Address,
        zip_code: &str,
    ) -> Result<TxHash, BridgeError>;

    /// `withdrawLink()`; returns once the transaction is submitted
    async fn withdraw_link(&self, from: Address) -> Result<TxHash, BridgeError>;

    async fn smart_zip_value(&self) -> Result<U256, BridgeError>;

    async fn prospect_now_value(&self) -> Result<U256, BridgeError>;

    async fn average_value(&self) -> Result<U256, BridgeError>;

    /// Register a persistent listener for the event carrying `kind`
    async fn subscribe(&self, kind: ValuationKind) -> Result<EventSubscription, BridgeError>;
}
