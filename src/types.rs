//! Common types and data structures for the TRON Payroll SDK

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Network selector (Mainnet, Shasta or Nile testnet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Shasta,
    Nile,
}

impl Network {
    /// Default full node HTTP API host for this network.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.trongrid.io",
            Network::Shasta => "https://api.shasta.trongrid.io",
            Network::Nile => "https://nile.trongrid.io",
        }
    }

    /// Chain id the connected wallet is expected to report.
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 0x2b6653dc,
            Network::Shasta => 0x94a9059e,
            Network::Nile => 0xcd8690dc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Shasta => "shasta",
            Network::Nile => "nile",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "shasta" => Ok(Network::Shasta),
            "nile" => Ok(Network::Nile),
            other => Err(Error::Config(format!("unknown network: {}", other))),
        }
    }
}

/// Whether an intent pays one recipient or a group in one batch call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Single,
    Batch,
}

/// A confirmed payment form, immutable once submitted.
///
/// `reference` identifies the payee record in the CRUD layer: the employee id
/// for a single transfer, the group id for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    kind: TransferKind,
    reference: u64,
    recipients: Vec<String>,
    amounts: Vec<u128>,
}

impl TransactionIntent {
    /// Intent to pay a single recipient `units` token units.
    pub fn single(reference: u64, recipient: impl Into<String>, units: u128) -> Self {
        Self {
            kind: TransferKind::Single,
            reference,
            recipients: vec![recipient.into()],
            amounts: vec![units],
        }
    }

    /// Intent to pay a group in one batch transfer.
    ///
    /// `recipients` and `amounts` are parallel arrays; matching lengths are
    /// assembled by the caller.
    pub fn batch(reference: u64, recipients: Vec<String>, amounts: Vec<u128>) -> Self {
        Self {
            kind: TransferKind::Batch,
            reference,
            recipients,
            amounts,
        }
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn reference(&self) -> u64 {
        self.reference
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn amounts(&self) -> &[u128] {
        &self.amounts
    }

    /// Sum of all amounts in token units.
    pub fn total_units(&self) -> Result<u128> {
        crate::amount::sum_units(&self.amounts)
    }
}

/// A submitted transaction, identified by its chain hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle {
    pub id: String,
    pub submitted_at: SystemTime,
}

impl TransactionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            submitted_at: SystemTime::now(),
        }
    }
}

/// Classification of a submitted transaction.
///
/// Only `Pending` moves onward; the other variants are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransactionOutcome {
    Pending,
    Success,
    Reverted { reason: String },
    Error { message: String },
}

impl TransactionOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        TransactionOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionOutcome::Pending)
    }
}

/// One invocation of the status source during polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAttempt {
    /// 1-based attempt number
    pub index: u32,
    pub outcome: TransactionOutcome,
}

/// Utility functions for token amounts
pub mod utils {
    use rust_decimal::Decimal;

    /// Format a token amount with its symbol (e.g., "530.31 USDT")
    pub fn format_token(amount: Decimal, symbol: &str) -> String {
        format!("{} {}", amount.normalize(), symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_terminal() {
        assert!(!TransactionOutcome::Pending.is_terminal());
        assert!(TransactionOutcome::Success.is_terminal());
        assert!(TransactionOutcome::Reverted {
            reason: "nope".into()
        }
        .is_terminal());
        assert!(TransactionOutcome::error("boom").is_terminal());
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("Nile".parse::<Network>().unwrap(), Network::Nile);
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("ropsten".parse::<Network>().is_err());
        assert_eq!(Network::Mainnet.chain_id(), 728126428);
    }

    #[test]
    fn test_batch_total() {
        let intent = TransactionIntent::batch(
            7,
            vec!["TA".into(), "TB".into()],
            vec![2_310_000, 530_310_000],
        );
        assert_eq!(intent.kind(), TransferKind::Batch);
        assert_eq!(intent.total_units().unwrap(), 532_620_000);
    }
}
