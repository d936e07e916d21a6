//! Wallet capability used to sign payroll transactions
//!
//! The SDK never holds key material. A [`Wallet`] is whatever can produce a
//! signature for an unsigned transaction: a browser wallet bridge, a hardware
//! signer, or a test double.

use crate::address::redact_middle;
use crate::error::{Error, Result};
use crate::rpc::RawTransaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A connected signing wallet
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Address of the connected account, `None` when disconnected
    fn address(&self) -> Option<String>;

    /// Chain id the wallet is connected to, when it reports one
    fn chain_id(&self) -> Option<u64> {
        None
    }

    /// Ask the user to sign `tx`. Suspends until they approve or reject.
    async fn sign(&self, tx: RawTransaction) -> Result<RawTransaction>;
}

/// Returns the connected address, or `None` when the wallet is missing,
/// disconnected, or reports an empty address.
pub fn connected_address(wallet: Option<&dyn Wallet>) -> Option<String> {
    wallet
        .and_then(|w| w.address())
        .filter(|address| !address.trim().is_empty())
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    address: &'a str,
    transaction: &'a RawTransaction,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(default)]
    transaction: Option<RawTransaction>,
    #[serde(default)]
    error: Option<String>,
}

/// Wallet that forwards signing requests to an external signer over HTTP.
///
/// The signer receives `{address, transaction}` and answers with
/// `{transaction}` carrying the signature, or `{error}` when the user
/// declined.
pub struct RemoteSigner {
    url: String,
    http: reqwest::Client,
    address: String,
    chain_id: Option<u64>,
}

impl RemoteSigner {
    pub fn new(url: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            address: address.into(),
            chain_id: None,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

#[async_trait]
impl Wallet for RemoteSigner {
    fn address(&self) -> Option<String> {
        Some(self.address.clone())
    }

    fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    async fn sign(&self, tx: RawTransaction) -> Result<RawTransaction> {
        tracing::debug!(
            "Requesting signature for {} from {}",
            redact_middle(&tx.tx_id, 8, 8),
            redact_middle(&self.address, 6, 6)
        );

        let response = self
            .http
            .post(&self.url)
            .json(&SignRequest {
                address: &self.address,
                transaction: &tx,
            })
            .send()
            .await?;

        let status = response.status();
        let body: SignResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(Error::Wallet(format!("Signer answered with status {}", status)))
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(error) = body.error {
            return Err(Error::Wallet(error));
        }
        if !status.is_success() {
            return Err(Error::Wallet(format!("Signer answered with status {}", status)));
        }

        let signed = body
            .transaction
            .ok_or_else(|| Error::Wallet("Signer returned no transaction".to_string()))?;

        if signed.tx_id != tx.tx_id {
            return Err(Error::Wallet(format!(
                "Signer returned transaction {} instead of {}",
                signed.tx_id, tx.tx_id
            )));
        }
        if !signed.is_signed() {
            return Err(Error::Wallet("Signer returned an unsigned transaction".to_string()));
        }

        Ok(signed)
    }
}
