//! In-memory wallet provider for driving the bridge without a node

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, TxHash, B256, U256};
use async_trait::async_trait;
use tokio::sync::mpsc;

use valuation_bridge::{
    BridgeError, EventSubscription, ValuationContract, ValuationKind, WalletProvider,
};

/// A state-mutating call seen by the fake contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    SmartZip { from: Address, zip_code: String },
    ProspectNow { from: Address, zip_code: String },
    WithdrawLink { from: Address },
}

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn contract_address() -> Address {
    "0xF99De89c3c4d6D7629A62095EC7A1610AA5e08f0"
        .parse()
        .unwrap()
}

#[derive(Default)]
pub struct FakeContract {
    address: Address,
    submissions: Mutex<Vec<Submission>>,
    /// When set, every submission fails with this reason
    reject_with: Mutex<Option<String>>,
    failing_subscriptions: Mutex<HashSet<ValuationKind>>,
    listeners: Mutex<HashMap<ValuationKind, Vec<mpsc::Sender<Result<U256, BridgeError>>>>>,
    stored: Mutex<HashMap<ValuationKind, U256>>,
    tx_counter: Mutex<u8>,
}

impl FakeContract {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    pub fn reject_submissions(&self, reason: &str) {
        *self.reject_with.lock().unwrap() = Some(reason.to_string());
    }

    pub fn fail_subscription(&self, kind: ValuationKind) {
        self.failing_subscriptions.lock().unwrap().insert(kind);
    }

    pub fn allow_subscription(&self, kind: ValuationKind) {
        self.failing_subscriptions.lock().unwrap().remove(&kind);
    }

    pub fn store(&self, kind: ValuationKind, value: u64) {
        self.stored.lock().unwrap().insert(kind, U256::from(value));
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn listener_count(&self, kind: ValuationKind) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .get(&kind)
            .map(|l| l.len())
            .unwrap_or(0)
    }

    /// Deliver an event to every listener of `kind`
    pub async fn emit(&self, kind: ValuationKind, delivery: Result<U256, BridgeError>) {
        let senders = self
            .listeners
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        for sender in senders {
            sender.send(delivery.clone()).await.unwrap();
        }
    }

    fn submit(&self, submission: Submission) -> Result<TxHash, BridgeError> {
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(BridgeError::SubmissionFailure(reason));
        }
        self.submissions.lock().unwrap().push(submission);

        let mut counter = self.tx_counter.lock().unwrap();
        *counter += 1;
        Ok(B256::repeat_byte(*counter))
    }

    fn read(&self, kind: ValuationKind) -> Result<U256, BridgeError> {
        Ok(self
            .stored
            .lock()
            .unwrap()
            .get(&kind)
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ValuationContract for FakeContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn request_smart_zip_value(
        &self,
        from: Address,
        zip_code: &str,
    ) -> Result<TxHash, BridgeError> {
        self.submit(Submission::SmartZip {
            from,
            zip_code: zip_code.to_string(),
        })
    }

    async fn request_prospect_now_value(
        &self,
        from: Address,
        zip_code: &str,
    ) -> Result<TxHash, BridgeError> {
        self.submit(Submission::ProspectNow {
            from,
            zip_code: zip_code.to_string(),
        })
    }

    async fn withdraw_link(&self, from: Address) -> Result<TxHash, BridgeError> {
        self.submit(Submission::WithdrawLink { from })
    }

    async fn smart_zip_value(&self) -> Result<U256, BridgeError> {
        self.read(ValuationKind::SmartZip)
    }

    async fn prospect_now_value(&self) -> Result<U256, BridgeError> {
        self.read(ValuationKind::ProspectNow)
    }

    async fn average_value(&self) -> Result<U256, BridgeError> {
        self.read(ValuationKind::Average)
    }

    async fn subscribe(&self, kind: ValuationKind) -> Result<EventSubscription, BridgeError> {
        if self.failing_subscriptions.lock().unwrap().contains(&kind) {
            return Err(BridgeError::EventDelivery {
                event: kind.event_name(),
                message: "filter not supported".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(16);
        self.listeners
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(tx);
        Ok(rx)
    }
}

pub struct FakeWallet {
    accounts: Result<Vec<Address>, BridgeError>,
    pub contract: Arc<FakeContract>,
}

impl FakeWallet {
    pub fn authorized(accounts: Vec<Address>) -> Self {
        Self {
            accounts: Ok(accounts),
            contract: Arc::new(FakeContract::new(contract_address())),
        }
    }

    pub fn denied(reason: &str) -> Self {
        Self {
            accounts: Err(BridgeError::AuthorizationDenied(reason.to_string())),
            contract: Arc::new(FakeContract::new(contract_address())),
        }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        self.accounts.clone()
    }

    fn bind_contract(&self, _address: Address) -> Arc<dyn ValuationContract> {
        self.contract.clone()
    }
}
