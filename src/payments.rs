//! Handoff of confirmed payments to the payroll API
//!
//! Nothing is recorded before a transaction is confirmed on-chain. Once it
//! is, the orchestrator hands exactly one [`PaymentRecord`] to a
//! [`PaymentRecorder`].

use crate::error::{Error, Result};
use crate::poller::StatusSource;
use crate::rpc::{TxStatus, TxStatusResponse};
use crate::types::TransactionOutcome;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A confirmed payment ready to be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentRecord {
    Single {
        employee_id: u64,
        transaction_hash: String,
        amount: Decimal,
    },
    Batch {
        group_id: u64,
        transaction_hash: String,
        recipients_count: usize,
        total_amount: Decimal,
    },
}

impl PaymentRecord {
    pub fn transaction_hash(&self) -> &str {
        match self {
            PaymentRecord::Single {
                transaction_hash, ..
            }
            | PaymentRecord::Batch {
                transaction_hash, ..
            } => transaction_hash,
        }
    }
}

/// Stores confirmed payments
#[async_trait]
pub trait PaymentRecorder: Send + Sync {
    async fn record(&self, record: &PaymentRecord) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SinglePaymentBody<'a> {
    transaction_hash: &'a str,
    amount: Decimal,
}

#[derive(Debug, Serialize)]
struct BatchPaymentBody<'a> {
    transaction_hash: &'a str,
    recipients_count: usize,
    total_amount: Decimal,
}

/// HTTP client for the payroll backend.
///
/// Records payments and exposes the backend's server-side transaction
/// classifier (`POST /tx?id=<hash>`) as a [`StatusSource`].
pub struct PayrollApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl PayrollApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rpc(format!(
                "POST {} failed with status: {}",
                path,
                response.status()
            )));
        }
        Ok(())
    }

    /// Ask the backend to classify transaction `id`.
    pub async fn tx_status(&self, id: &str) -> Result<TxStatusResponse> {
        let response = self
            .http
            .post(format!("{}/tx", self.base_url))
            .query(&[("id", id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rpc(format!(
                "POST /tx failed with status: {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentRecorder for PayrollApiClient {
    async fn record(&self, record: &PaymentRecord) -> Result<()> {
        match record {
            PaymentRecord::Single {
                employee_id,
                transaction_hash,
                amount,
            } => {
                self.post(
                    &format!("/employees/{}/payment", employee_id),
                    &SinglePaymentBody {
                        transaction_hash,
                        amount: *amount,
                    },
                )
                .await
            }
            PaymentRecord::Batch {
                group_id,
                transaction_hash,
                recipients_count,
                total_amount,
            } => {
                self.post(
                    &format!("/groups/{}/batch_payment", group_id),
                    &BatchPaymentBody {
                        transaction_hash,
                        recipients_count: *recipients_count,
                        total_amount: *total_amount,
                    },
                )
                .await
            }
        }
    }
}

#[async_trait]
impl StatusSource for PayrollApiClient {
    async fn status(&self, id: &str) -> TransactionOutcome {
        match self.tx_status(id).await {
            Ok(response) => outcome_from_response(response),
            Err(e) => TransactionOutcome::error(e.to_string()),
        }
    }
}

/// Map the backend's status body onto a [`TransactionOutcome`].
pub fn outcome_from_response(response: TxStatusResponse) -> TransactionOutcome {
    match response.status {
        TxStatus::Retry => TransactionOutcome::Pending,
        TxStatus::Success => TransactionOutcome::Success,
        TxStatus::Reverted => TransactionOutcome::Reverted {
            reason: response
                .error_message
                .unwrap_or_else(|| "transaction reverted".to_string()),
        },
        TxStatus::Error => TransactionOutcome::error(
            response
                .error_message
                .unwrap_or_else(|| "unknown error".to_string()),
        ),
    }
}
