//! Valuation Bridge - Library interface
//!
//! Connects a wallet to the real estate valuation contract, submits oracle
//! requests and mirrors the `*ValueUpdated` events into a console view.
//!
//! - **bridge** - Session lifecycle, user actions and event handling
//! - **provider** - Wallet provider / contract traits the bridge depends on
//! - **evm** - Alloy-backed provider, contract bindings and event watcher
//! - **view** - Console rendering of bridge updates and command input

pub mod bridge;
pub mod config;
pub mod error;
pub mod evm;
pub mod format;
pub mod provider;
pub mod state;
pub mod view;

pub use bridge::{BridgeCommand, BridgeUpdate, ValuationBridge, ValuationSnapshot};
pub use error::BridgeError;
pub use format::{format_amount, format_value};
pub use provider::{EventSubscription, ValuationContract, WalletProvider};
pub use state::{ConnectionState, Session, Severity, StatusEntry, ValuationKind};
