//! Wallet-Contract Bridge
//!
//! Connects to the wallet provider, binds the valuation contract, mirrors the three
//! valuation events into display slots and records progress in the status log.
//!
//! # Flow
//!
//! 1. `connect` requests account access and binds the contract (Disconnected -> Connected)
//! 2. `subscribe` arms one persistent listener per valuation event
//! 3. User actions submit transactions and only confirm submission
//! 4. Oracle results arrive later as events and fill the display slots
//!
//! The bridge never touches the terminal. Every visible change is published as a
//! [`BridgeUpdate`] for the view layer.

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::error::BridgeError;
use crate::format::{format_amount, format_value};
use crate::provider::{EventSubscription, ValuationContract, WalletProvider};
use crate::state::{
    ConnectionState, Session, Severity, StatusEntry, StatusLog, ValuationDisplay, ValuationKind,
};

/// Merged event queue depth across all listeners
const EVENT_QUEUE: usize = 256;

/// Broadcast buffer for view updates
const UPDATE_BUFFER: usize = 256;

/// Visible state changes published to the view layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeUpdate {
    /// Session established for `account`
    Connected { account: Address },
    /// A line was appended to the status log
    StatusAppended(StatusEntry),
    /// A valuation slot received a new formatted value
    SlotUpdated {
        kind: ValuationKind,
        formatted: String,
    },
    /// Blocking user prompt (precondition not met); not part of the status log
    Prompt(String),
}

/// User actions accepted by [`ValuationBridge::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    RequestSmartZipValue(String),
    GetAverageValue(String),
    WithdrawLink,
    QueryValuations,
}

/// Current on-chain values from the read-only queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValuationSnapshot {
    pub smart_zip: U256,
    pub prospect_now: U256,
    pub average: U256,
}

/// One event delivery tagged with its source listener
type Delivery = (ValuationKind, Result<U256, BridgeError>);

pub struct ValuationBridge {
    provider: Option<Arc<dyn WalletProvider>>,
    contract_address: Address,
    session: Option<Session>,
    armed: HashSet<ValuationKind>,
    display: ValuationDisplay,
    status: StatusLog,
    updates: broadcast::Sender<BridgeUpdate>,
    events_tx: mpsc::Sender<Delivery>,
    events_rx: mpsc::Receiver<Delivery>,
}

impl ValuationBridge {
    /// Create a disconnected bridge. `provider` is `None` when no wallet is available.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, contract_address: Address) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);

        Self {
            provider,
            contract_address,
            session: None,
            armed: HashSet::new(),
            display: ValuationDisplay::default(),
            status: StatusLog::default(),
            updates,
            events_tx,
            events_rx,
        }
    }

    /// Subscribe to visible state changes
    pub fn updates(&self) -> broadcast::Receiver<BridgeUpdate> {
        self.updates.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        if self.session.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn display(&self) -> &ValuationDisplay {
        &self.display
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Request account access, bind the contract and arm the event listeners.
    ///
    /// Failures leave the session unset and add exactly one error status line.
    pub async fn connect(&mut self) -> Result<Address, BridgeError> {
        let Some(provider) = self.provider.clone() else {
            error!("No wallet provider detected");
            self.push_status(
                "Error: Please configure a wallet provider to use this application",
                Severity::Error,
            );
            return Err(BridgeError::ProviderAbsent);
        };

        let accounts = match provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                error!(error_kind = e.kind(), error = %e, "Wallet account access denied");
                self.push_status(
                    format!("Error: Wallet account access denied ({})", e),
                    Severity::Error,
                );
                return Err(e);
            }
        };

        let Some(&account) = accounts.first() else {
            let e = BridgeError::AuthorizationDenied("no accounts authorized".to_string());
            error!(error_kind = e.kind(), error = %e, "Wallet returned no accounts");
            self.push_status(
                format!("Error: Wallet account access denied ({})", e),
                Severity::Error,
            );
            return Err(e);
        };

        info!(account = %account, contract = %self.contract_address, "Connected to account");

        let contract = provider.bind_contract(self.contract_address);
        self.session = Some(Session::new(account, contract));

        self.subscribe().await;

        self.push_status("Connected to Ethereum network", Severity::Info);
        self.publish(BridgeUpdate::Connected { account });

        Ok(account)
    }

    /// Arm one persistent listener per valuation event.
    ///
    /// Events that already have a listener are skipped, so repeated calls never
    /// duplicate deliveries. A registration failure is recorded in the status log,
    /// does not affect the other listeners or the session, and is retried on the
    /// next call. Returns the number of listeners armed by this call.
    pub async fn subscribe(&mut self) -> usize {
        let Some(contract) = self.session.as_ref().map(|s| s.contract().clone()) else {
            warn!("Subscribe called without a session");
            return 0;
        };

        let mut armed = 0;
        for kind in ValuationKind::ALL {
            if self.armed.contains(&kind) {
                continue;
            }
            match contract.subscribe(kind).await {
                Ok(subscription) => {
                    self.forward(kind, subscription);
                    self.armed.insert(kind);
                    armed += 1;
                }
                Err(e) => {
                    error!(
                        event = kind.event_name(),
                        error_kind = e.kind(),
                        error = %e,
                        "Listener registration failed"
                    );
                    self.push_status(format!("Error: {}", e), Severity::Error);
                }
            }
        }

        debug!(armed = armed, total = self.armed.len(), "Valuation listeners armed");
        armed
    }

    /// Events that currently have a listener
    pub fn armed_listeners(&self) -> usize {
        self.armed.len()
    }

    fn forward(&self, kind: ValuationKind, mut subscription: EventSubscription) {
        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(delivery) = subscription.recv().await {
                if events_tx.send((kind, delivery)).await.is_err() {
                    break;
                }
            }
        });
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Submit `requestSmartZipValue(zip_code)` from the session account
    pub async fn request_smart_zip_value(&mut self, zip_code: &str) -> Result<TxHash, BridgeError> {
        let zip_code = self.require_zip_code(zip_code)?;
        let (account, contract) = self.require_session()?;

        self.push_status(
            format!("Requesting SmartZip valuation for ZIP code {}...", zip_code),
            Severity::Info,
        );

        match contract.request_smart_zip_value(account, &zip_code).await {
            Ok(tx_hash) => {
                self.push_status(
                    format!("Request sent. Transaction hash: {}", tx_hash),
                    Severity::Info,
                );
                Ok(tx_hash)
            }
            Err(e) => {
                error!(
                    error_kind = e.kind(),
                    error = %e,
                    zip_code = %zip_code,
                    "Error requesting SmartZip value"
                );
                self.push_status(format!("Error: {}", e), Severity::Error);
                Err(e)
            }
        }
    }

    /// Submit `requestProspectNowValue(zip_code)` from the session account.
    ///
    /// The average itself is computed on-chain once both oracles answer and
    /// arrives later as `AverageValueUpdated`.
    pub async fn get_average_value(&mut self, zip_code: &str) -> Result<TxHash, BridgeError> {
        let zip_code = self.require_zip_code(zip_code)?;
        let (account, contract) = self.require_session()?;

        self.push_status(
            format!("Requesting ProspectNow valuation for ZIP code {}...", zip_code),
            Severity::Info,
        );

        match contract.request_prospect_now_value(account, &zip_code).await {
            Ok(tx_hash) => {
                self.push_status(
                    format!("Request sent. Transaction hash: {}", tx_hash),
                    Severity::Info,
                );
                self.push_status(
                    "Waiting for oracle responses to calculate average...",
                    Severity::Info,
                );
                Ok(tx_hash)
            }
            Err(e) => {
                error!(
                    error_kind = e.kind(),
                    error = %e,
                    zip_code = %zip_code,
                    "Error requesting ProspectNow value"
                );
                self.push_status(format!("Error: {}", e), Severity::Error);
                Err(e)
            }
        }
    }

    /// Submit `withdrawLink()` from the session account. No double-withdrawal guard.
    pub async fn withdraw_link(&mut self) -> Result<TxHash, BridgeError> {
        let (account, contract) = self.require_session()?;

        self.push_status("Withdrawing remaining LINK tokens...", Severity::Info);

        match contract.withdraw_link(account).await {
            Ok(tx_hash) => {
                self.push_status(
                    format!("Withdrawal complete. Transaction hash: {}", tx_hash),
                    Severity::Info,
                );
                Ok(tx_hash)
            }
            Err(e) => {
                error!(error_kind = e.kind(), error = %e, "Error withdrawing LINK");
                self.push_status(format!("Error: {}", e), Severity::Error);
                Err(e)
            }
        }
    }

    /// Read the three stored valuations. Display slots are left untouched.
    pub async fn query_valuations(&mut self) -> Result<ValuationSnapshot, BridgeError> {
        let (_, contract) = self.require_session()?;

        let snapshot = async {
            Ok::<_, BridgeError>(ValuationSnapshot {
                smart_zip: contract.smart_zip_value().await?,
                prospect_now: contract.prospect_now_value().await?,
                average: contract.average_value().await?,
            })
        }
        .await;

        match snapshot {
            Ok(snapshot) => {
                self.push_status(
                    format!(
                        "Stored valuations: SmartZip ${}, ProspectNow ${}, Average ${}",
                        format_value(snapshot.smart_zip),
                        format_value(snapshot.prospect_now),
                        format_value(snapshot.average)
                    ),
                    Severity::Info,
                );
                Ok(snapshot)
            }
            Err(e) => {
                error!(error_kind = e.kind(), error = %e, "Error querying valuations");
                self.push_status(format!("Error: {}", e), Severity::Error);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Apply one delivery from the listener for `kind`
    pub fn handle_event(&mut self, kind: ValuationKind, delivery: Result<U256, BridgeError>) {
        match delivery {
            Ok(value) => {
                let formatted = format_amount(&value.to_string());
                info!(event = kind.event_name(), value = %value, "Valuation received");

                self.display.set(kind, formatted.clone());
                self.publish(BridgeUpdate::SlotUpdated {
                    kind,
                    formatted: formatted.clone(),
                });
                self.push_status(kind.received_message(&formatted), Severity::Info);
            }
            Err(e) => {
                error!(
                    event = kind.event_name(),
                    error_kind = e.kind(),
                    error = %e,
                    "Listener error"
                );
                self.push_status(format!("Error: {}", e), Severity::Error);
            }
        }
    }

    /// Wait for the next delivery from any listener and apply it
    pub async fn process_next_event(&mut self) -> Option<ValuationKind> {
        let (kind, delivery) = self.events_rx.recv().await?;
        self.handle_event(kind, delivery);
        Some(kind)
    }

    /// Single-threaded loop interleaving user commands and event deliveries.
    ///
    /// Runs until `shutdown` fires or the command channel closes. Action failures
    /// are already rendered as status lines and do not stop the loop.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<BridgeCommand>,
        mut shutdown: mpsc::Receiver<()>,
    ) -> eyre::Result<()> {
        info!("Valuation bridge running");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed");
                        break;
                    };
                    self.execute(command).await;
                }
                Some((kind, delivery)) = self.events_rx.recv() => {
                    self.handle_event(kind, delivery);
                }
            }
        }

        Ok(())
    }

    /// Run a single command, discarding its result
    pub async fn execute(&mut self, command: BridgeCommand) {
        debug!(command = ?command, "Executing command");
        let _ = match command {
            BridgeCommand::RequestSmartZipValue(zip_code) => {
                self.request_smart_zip_value(&zip_code).await.map(|_| ())
            }
            BridgeCommand::GetAverageValue(zip_code) => {
                self.get_average_value(&zip_code).await.map(|_| ())
            }
            BridgeCommand::WithdrawLink => self.withdraw_link().await.map(|_| ()),
            BridgeCommand::QueryValuations => self.query_valuations().await.map(|_| ()),
        };
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_session(
        &self,
    ) -> Result<(Address, Arc<dyn ValuationContract>), BridgeError> {
        match self.session.as_ref() {
            Some(session) => Ok((session.account(), session.contract().clone())),
            None => {
                warn!("Action rejected: not connected");
                self.prompt("Please wait for blockchain connection to initialize");
                Err(BridgeError::NotConnected)
            }
        }
    }

    fn require_zip_code(&self, zip_code: &str) -> Result<String, BridgeError> {
        let zip_code = zip_code.trim();
        if zip_code.is_empty() {
            warn!("Action rejected: empty ZIP code");
            self.prompt("Please enter a ZIP code");
            return Err(BridgeError::InvalidInput("ZIP code is required".to_string()));
        }
        Ok(zip_code.to_string())
    }

    fn push_status(&mut self, message: impl Into<String>, severity: Severity) {
        let entry = self.status.append(message, severity).clone();
        self.publish(BridgeUpdate::StatusAppended(entry));
    }

    fn prompt(&self, message: &str) {
        self.publish(BridgeUpdate::Prompt(message.to_string()));
    }

    fn publish(&self, update: BridgeUpdate) {
        // No receivers is fine; the view may not be attached
        let _ = self.updates.send(update);
    }
}
