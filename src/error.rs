use thiserror::Error;

/// Error types for the TRON Payroll SDK
#[derive(Error, Debug)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Address parsing error: {0}")]
    Address(String),

    #[error("Amount error: {0}")]
    Amount(String),

    #[error("ABI encoding error: {0}")]
    Abi(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Submission error: {0}")]
    Submission(String),

    /// The contract call executed and was rejected on-chain.
    #[error("{reason}")]
    Reverted { tx_id: String, reason: String },

    /// The poll budget was consumed without a terminal outcome.
    #[error("transaction not found")]
    Exhausted { tx_id: String, attempts: u32 },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Another transaction is already in flight")]
    Busy,

    /// The payment is confirmed on-chain but recording it failed.
    #[error("Transaction {tx_id} confirmed but payment was not recorded: {message}")]
    Persistence { tx_id: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl Error {
    /// Transport failures the caller may retry. The SDK itself never retries them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Rpc(_))
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;
