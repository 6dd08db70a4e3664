//! Bridge configuration

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Bridge configuration
#[derive(Clone)]
pub struct Config {
    /// Wallet provider JSON-RPC endpoint. Unset means no provider is available.
    pub rpc_url: Option<String>,
    /// Expected chain ID; authorization is denied on mismatch
    pub chain_id: Option<u64>,
    /// Deployed valuation contract
    pub contract_address: Address,
    /// Wallet signing key. Unset means account access cannot be granted.
    pub private_key: Option<String>,
    /// Event poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum block span per log query
    pub max_block_range: u64,
    /// Emit JSON log lines instead of the pretty formatter
    pub json_logs: bool,
}

/// Custom Debug that redacts private_key to prevent accidental log leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("contract_address", &self.contract_address)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_block_range", &self.max_block_range)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` and the environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        Self::from_env()
    }

    /// Load configuration from the environment only
    pub fn from_env() -> Result<Self> {
        let contract_address = env::var("VALUATION_CONTRACT_ADDRESS")
            .map_err(|_| eyre!("VALUATION_CONTRACT_ADDRESS required"))?;
        let contract_address = Address::from_str(contract_address.trim())
            .wrap_err("Invalid VALUATION_CONTRACT_ADDRESS")?;

        let chain_id = match non_empty_var("EVM_CHAIN_ID") {
            Some(v) => Some(v.parse().map_err(|_| eyre!("Invalid EVM_CHAIN_ID"))?),
            None => None,
        };

        let poll_interval_ms = match non_empty_var("POLL_INTERVAL_MS") {
            Some(v) => v.parse().map_err(|_| eyre!("Invalid POLL_INTERVAL_MS"))?,
            None => 2000,
        };
        if poll_interval_ms == 0 {
            return Err(eyre!("POLL_INTERVAL_MS must be greater than zero"));
        }

        let max_block_range = match non_empty_var("MAX_BLOCK_RANGE") {
            Some(v) => v.parse().map_err(|_| eyre!("Invalid MAX_BLOCK_RANGE"))?,
            None => 10_000,
        };
        if max_block_range == 0 {
            return Err(eyre!("MAX_BLOCK_RANGE must be greater than zero"));
        }

        let json_logs = non_empty_var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            rpc_url: non_empty_var("EVM_RPC_URL"),
            chain_id,
            contract_address,
            private_key: non_empty_var("WALLET_PRIVATE_KEY"),
            poll_interval_ms,
            max_block_range,
            json_logs,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
