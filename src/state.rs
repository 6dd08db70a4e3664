//! In-memory bridge state: session, valuation slots and the status log

use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::provider::ValuationContract;

/// The three valuations mirrored from contract events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValuationKind {
    SmartZip,
    ProspectNow,
    Average,
}

impl ValuationKind {
    pub const ALL: [ValuationKind; 3] = [
        ValuationKind::SmartZip,
        ValuationKind::ProspectNow,
        ValuationKind::Average,
    ];

    /// Contract event carrying this valuation
    pub fn event_name(&self) -> &'static str {
        match self {
            ValuationKind::SmartZip => "SmartZipValueUpdated",
            ValuationKind::ProspectNow => "ProspectNowValueUpdated",
            ValuationKind::Average => "AverageValueUpdated",
        }
    }

    /// Identifier of the display element showing this valuation
    pub fn element_id(&self) -> &'static str {
        match self {
            ValuationKind::SmartZip => "smartzip-value",
            ValuationKind::ProspectNow => "prospectnow-value",
            ValuationKind::Average => "average-value",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValuationKind::SmartZip => "SmartZip",
            ValuationKind::ProspectNow => "ProspectNow",
            ValuationKind::Average => "Average",
        }
    }

    /// Status line announcing a received valuation
    pub fn received_message(&self, formatted: &str) -> String {
        match self {
            ValuationKind::Average => format!("Average valuation calculated: ${}", formatted),
            _ => format!("{} valuation received: ${}", self.label(), formatted),
        }
    }
}

impl fmt::Display for ValuationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Durable connection state of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Active wallet account plus the bound contract handle
#[derive(Clone)]
pub struct Session {
    account: Address,
    contract: Arc<dyn ValuationContract>,
}

impl Session {
    pub fn new(account: Address, contract: Arc<dyn ValuationContract>) -> Self {
        Self { account, contract }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn contract(&self) -> &Arc<dyn ValuationContract> {
        &self.contract
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("contract", &self.contract.address())
            .finish()
    }
}

/// Formatted valuation slots, each unset until its event arrives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValuationDisplay {
    smart_zip: Option<String>,
    prospect_now: Option<String>,
    average: Option<String>,
}

impl ValuationDisplay {
    pub fn get(&self, kind: ValuationKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    pub fn set(&mut self, kind: ValuationKind, formatted: String) {
        *self.slot_mut(kind) = Some(formatted);
    }

    fn slot(&self, kind: ValuationKind) -> &Option<String> {
        match kind {
            ValuationKind::SmartZip => &self.smart_zip,
            ValuationKind::ProspectNow => &self.prospect_now,
            ValuationKind::Average => &self.average,
        }
    }

    fn slot_mut(&mut self, kind: ValuationKind) -> &mut Option<String> {
        match kind {
            ValuationKind::SmartZip => &mut self.smart_zip,
            ValuationKind::ProspectNow => &mut self.prospect_now,
            ValuationKind::Average => &mut self.average,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }
}

/// One line of the status log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub message: String,
    pub severity: Severity,
    pub at: DateTime<Utc>,
}

/// Append-only status log, rendered oldest first
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    entries: Vec<StatusEntry>,
}

impl StatusLog {
    pub fn append(&mut self, message: impl Into<String>, severity: Severity) -> &StatusEntry {
        self.entries.push(StatusEntry {
            message: message.into(),
            severity,
            at: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Newest entry; the view keeps this one in sight
    pub fn newest(&self) -> Option<&StatusEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }
}
