//! EVM implementation of the wallet provider seam
//!
//! ## Submodules
//!
//! - `contracts` - Valuation contract bindings using alloy sol! macro
//! - `events` - Valuation event parsing
//! - `wallet` - JSON-RPC wallet provider and bound contract
//! - `watcher` - Polling event listeners

pub mod contracts;
pub mod events;
pub mod wallet;
pub mod watcher;

pub use contracts::RealEstateValuation;
pub use events::{event_topic, parse_valuation_log, ValuationUpdatedEvent};
pub use wallet::{EvmValuationContract, LocalWalletProvider};
pub use watcher::{block_chunks, LogSource, RpcLogSource, ValuationEventWatcher, WatcherConfig};
