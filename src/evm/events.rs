//! Valuation event parsing
//!
//! All three valuation events share one layout: a single non-indexed `uint256 value`.

use alloy::primitives::{keccak256, B256, U256};
use tracing::warn;

use crate::state::ValuationKind;

/// Topic0 for the event carrying `kind`
pub fn event_topic(kind: ValuationKind) -> B256 {
    match kind {
        ValuationKind::SmartZip => keccak256(b"SmartZipValueUpdated(uint256)"),
        ValuationKind::ProspectNow => keccak256(b"ProspectNowValueUpdated(uint256)"),
        ValuationKind::Average => keccak256(b"AverageValueUpdated(uint256)"),
    }
}

/// Decoded valuation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuationUpdatedEvent {
    pub kind: ValuationKind,
    /// Valuation in minor currency units
    pub value: U256,
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
}

/// Parse a valuation event of `kind` from a raw log
///
/// Event: <Kind>ValueUpdated(uint256 value)
///
/// Data layout:
///   [0..32]    value (uint256)
pub fn parse_valuation_log(
    kind: ValuationKind,
    log: &alloy::rpc::types::Log,
) -> Option<ValuationUpdatedEvent> {
    if log.topic0() != Some(&event_topic(kind)) {
        return None;
    }

    let block_number = log.block_number?;
    let tx_hash = log.transaction_hash?;
    let log_index = log.log_index?;

    let data = log.data().data.as_ref();
    if data.len() < 32 {
        warn!(
            event = kind.event_name(),
            block = block_number,
            data_len = data.len(),
            "Valuation log too short"
        );
        return None;
    }

    Some(ValuationUpdatedEvent {
        kind,
        value: U256::from_be_slice(&data[0..32]),
        block_number,
        tx_hash,
        log_index,
    })
}
