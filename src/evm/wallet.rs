//! Local wallet provider over JSON-RPC
//!
//! Plays the part of the injected wallet: account authorization comes from the
//! configured signing key, and state-mutating calls are signed locally and sent
//! to the RPC endpoint.
//!
//! # Transaction Building
//!
//! Uses Alloy's `ProviderBuilder::with_recommended_fillers()` to automatically
//! populate transaction fields (nonce, gas_limit, max_fee_per_gas, max_priority_fee_per_gas).
//! Submission returns as soon as the node accepts the transaction; settlement is
//! observed later through the valuation events.

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::BridgeError;
use crate::evm::contracts::RealEstateValuation;
use crate::evm::watcher::{ValuationEventWatcher, WatcherConfig};
use crate::provider::{EventSubscription, ValuationContract, WalletProvider};
use crate::state::ValuationKind;

/// Wallet provider backed by an RPC endpoint and an optional local signing key
pub struct LocalWalletProvider {
    rpc_url: Url,
    expected_chain_id: Option<u64>,
    signer: Option<PrivateKeySigner>,
    watcher_config: WatcherConfig,
}

impl LocalWalletProvider {
    /// Look up the provider capability in `config`.
    ///
    /// Returns `Ok(None)` when no RPC endpoint is configured, which the bridge
    /// reports as an absent provider.
    pub fn detect(config: &Config) -> Result<Option<Self>> {
        let Some(rpc_url) = config.rpc_url.as_deref() else {
            return Ok(None);
        };

        let rpc_url: Url = rpc_url.parse().wrap_err("Invalid EVM_RPC_URL")?;
        let signer = match config.private_key.as_deref() {
            Some(key) => Some(
                key.parse::<PrivateKeySigner>()
                    .wrap_err("Invalid WALLET_PRIVATE_KEY")?,
            ),
            None => None,
        };

        info!(
            rpc_url = %rpc_url,
            signer = ?signer.as_ref().map(|s| s.address()),
            "Wallet provider detected"
        );

        Ok(Some(Self {
            rpc_url,
            expected_chain_id: config.chain_id,
            signer,
            watcher_config: WatcherConfig {
                poll_interval: config.poll_interval(),
                max_block_range: config.max_block_range,
            },
        }))
    }

    fn read_provider(&self) -> RootProvider<Http<Client>> {
        ProviderBuilder::new().on_http(self.rpc_url.clone())
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        let Some(signer) = self.signer.as_ref() else {
            return Err(BridgeError::AuthorizationDenied(
                "no signing key configured".to_string(),
            ));
        };

        let chain_id = self
            .read_provider()
            .get_chain_id()
            .await
            .map_err(|e| {
                BridgeError::AuthorizationDenied(format!("wallet provider unreachable: {}", e))
            })?;

        if let Some(expected) = self.expected_chain_id {
            if expected != chain_id {
                return Err(BridgeError::AuthorizationDenied(format!(
                    "connected to chain {}, expected {}",
                    chain_id, expected
                )));
            }
        }

        debug!(chain_id = chain_id, account = %signer.address(), "Account access granted");
        Ok(vec![signer.address()])
    }

    fn bind_contract(&self, address: Address) -> Arc<dyn ValuationContract> {
        Arc::new(EvmValuationContract {
            rpc_url: self.rpc_url.clone(),
            address,
            wallet: self.signer.clone().map(EthereumWallet::from),
            watcher: ValuationEventWatcher::new(
                self.read_provider(),
                address,
                self.watcher_config.clone(),
            ),
        })
    }
}

/// Valuation contract bound over JSON-RPC
pub struct EvmValuationContract {
    rpc_url: Url,
    address: Address,
    wallet: Option<EthereumWallet>,
    watcher: ValuationEventWatcher,
}

impl EvmValuationContract {
    fn wallet(&self) -> Result<EthereumWallet, BridgeError> {
        self.wallet
            .clone()
            .ok_or_else(|| BridgeError::SubmissionFailure("no signing key configured".to_string()))
    }
}

#[async_trait]
impl ValuationContract for EvmValuationContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn request_smart_zip_value(
        &self,
        from: Address,
        zip_code: &str,
    ) -> Result<TxHash, BridgeError> {
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(self.wallet()?)
            .on_http(self.rpc_url.clone());
        let contract = RealEstateValuation::new(self.address, &provider);

        let pending_tx = contract
            .requestSmartZipValue(zip_code.to_string())
            .from(from)
            .send()
            .await
            .map_err(|e| BridgeError::SubmissionFailure(e.to_string()))?;

        let tx_hash = *pending_tx.tx_hash();
        info!(tx_hash = %tx_hash, zip_code = zip_code, "requestSmartZipValue sent");
        Ok(tx_hash)
    }

    async fn request_prospect_now_value(
        &self,
        from: Address,
        zip_code: &str,
    ) -> Result<TxHash, BridgeError> {
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(self.wallet()?)
            .on_http(self.rpc_url.clone());
        let contract = RealEstateValuation::new(self.address, &provider);

        let pending_tx = contract
            .requestProspectNowValue(zip_code.to_string())
            .from(from)
            .send()
            .await
            .map_err(|e| BridgeError::SubmissionFailure(e.to_string()))?;

        let tx_hash = *pending_tx.tx_hash();
        info!(tx_hash = %tx_hash, zip_code = zip_code, "requestProspectNowValue sent");
        Ok(tx_hash)
    }

    async fn withdraw_link(&self, from: Address) -> Result<TxHash, BridgeError> {
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(self.wallet()?)
            .on_http(self.rpc_url.clone());
        let contract = RealEstateValuation::new(self.address, &provider);

        let pending_tx = contract
            .withdrawLink()
            .from(from)
            .send()
            .await
            .map_err(|e| BridgeError::SubmissionFailure(e.to_string()))?;

        let tx_hash = *pending_tx.tx_hash();
        info!(tx_hash = %tx_hash, "withdrawLink sent");
        Ok(tx_hash)
    }

    async fn smart_zip_value(&self) -> Result<U256, BridgeError> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = RealEstateValuation::new(self.address, &provider);

        let value = contract
            .smartZipValue()
            .call()
            .await
            .map_err(|e| BridgeError::QueryFailure(format!("smartZipValue: {}", e)))?;
        Ok(value._0)
    }

    async fn prospect_now_value(&self) -> Result<U256, BridgeError> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = RealEstateValuation::new(self.address, &provider);

        let value = contract
            .prospectNowValue()
            .call()
            .await
            .map_err(|e| BridgeError::QueryFailure(format!("prospectNowValue: {}", e)))?;
        Ok(value._0)
    }

    async fn average_value(&self) -> Result<U256, BridgeError> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = RealEstateValuation::new(self.address, &provider);

        let value = contract
            .averageValue()
            .call()
            .await
            .map_err(|e| BridgeError::QueryFailure(format!("averageValue: {}", e)))?;
        Ok(value._0)
    }

    async fn subscribe(&self, kind: ValuationKind) -> Result<EventSubscription, BridgeError> {
        self.watcher.subscribe(kind).await
    }
}
