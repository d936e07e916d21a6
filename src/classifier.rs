//! Transaction outcome classification
//!
//! Turns a transaction id into a [`TransactionOutcome`] using two node
//! lookups:
//!
//! ```text
//! gettransactionbyid ── empty ───────────────────────────> Pending
//!        │
//!        ├─ no contract address ─────────────────────────> Error
//!        ├─ SUCCESS ─────────────────────────────────────> Success
//!        ├─ REVERT / OUT_OF_ENERGY / OUT_OF_TIME
//!        │        └── gettransactioninfobyid ── empty ──> Pending
//!        │                                   └── decoded ─> Reverted
//!        └─ anything else ───────────────────────────────> Error
//! ```

use crate::client::ChainQuery;
use crate::error::Result;
use crate::poller::StatusSource;
use crate::rpc::RawReceipt;
use crate::types::TransactionOutcome;
use async_trait::async_trait;

/// Number of trailing hex characters kept when decoding a revert payload
const REVERT_TAIL_HEX: usize = 64;

/// Result codes whose reason must be read from the receipt
const REVERT_CODES: [&str; 3] = ["REVERT", "OUT_OF_ENERGY", "OUT_OF_TIME"];

/// Classifies transactions by querying a node
pub struct OutcomeClassifier<Q> {
    query: Q,
}

impl<Q: ChainQuery> OutcomeClassifier<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    /// Determine the current outcome of transaction `id`.
    ///
    /// Never fails: transport errors become [`TransactionOutcome::Error`].
    pub async fn classify(&self, id: &str) -> TransactionOutcome {
        match self.try_classify(id).await {
            Ok(outcome) => outcome,
            Err(e) => TransactionOutcome::error(e.to_string()),
        }
    }

    async fn try_classify(&self, id: &str) -> Result<TransactionOutcome> {
        let tx = match self.query.get_transaction_by_hash(id).await? {
            Some(tx) => tx,
            None => return Ok(TransactionOutcome::Pending),
        };

        if tx.contract_address().is_none() {
            return Ok(TransactionOutcome::error(
                "no contract found for this transaction hash",
            ));
        }

        let code = tx.contract_ret().unwrap_or("<none>");
        if code == "SUCCESS" {
            return Ok(TransactionOutcome::Success);
        }

        if REVERT_CODES.contains(&code) {
            return match self.query.get_transaction_receipt(id).await? {
                None => Ok(TransactionOutcome::Pending),
                Some(receipt) => Ok(TransactionOutcome::Reverted {
                    reason: revert_reason(&receipt),
                }),
            };
        }

        Ok(TransactionOutcome::error(format!("unknown status: {}", code)))
    }
}

#[async_trait]
impl<Q: ChainQuery> StatusSource for OutcomeClassifier<Q> {
    async fn status(&self, id: &str) -> TransactionOutcome {
        self.classify(id).await
    }
}

/// Revert reason carried by a receipt.
pub fn revert_reason(receipt: &RawReceipt) -> String {
    decode_revert_reason(receipt.revert_payload())
}

/// Decode a revert reason from hex return data.
///
/// Keeps only the last 32 bytes of the payload, decodes them as UTF-8 and
/// strips NUL padding. This is not ABI decoding: for a standard
/// `Error(string)` payload it recovers reasons of up to 32 bytes, while
/// longer reasons lose their head and custom error payloads decode to noise.
/// Nodes do not reliably return a well-formed `Error(string)` body, so the
/// tail heuristic is kept as-is.
pub fn decode_revert_reason(payload: &str) -> String {
    let payload = payload.trim_start_matches("0x");
    if !payload.is_ascii() {
        return payload.to_string();
    }
    let tail = if payload.len() > REVERT_TAIL_HEX {
        &payload[payload.len() - REVERT_TAIL_HEX..]
    } else {
        payload
    };

    match hex::decode(tail) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .trim_matches('\0')
            .to_string(),
        Err(_) => tail.to_string(),
    }
}
