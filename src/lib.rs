//! # TRON Payroll SDK
//!
//! Transaction orchestration for paying employees and groups in TRC-20
//! tokens on TRON.
//!
//! This SDK provides:
//! - Exact conversion between decimal amounts and token units
//! - A node client for transaction lookups, contract calls and broadcast
//! - Classification of submitted transactions (pending, success, revert, error)
//! - Bounded polling until a transaction reaches a terminal outcome
//! - Single-recipient and two-phase (approve + batch) transfer flows
//! - Handoff of confirmed payments to the payroll backend
//!
//! ## Example
//!
//! ```no_run
//! use rust_decimal::Decimal;
//! use tron_payroll_sdk::amount::to_token_units;
//! use tron_payroll_sdk::classifier::OutcomeClassifier;
//! use tron_payroll_sdk::client::RpcClient;
//! use tron_payroll_sdk::config::Config;
//! use tron_payroll_sdk::payments::PayrollApiClient;
//! use tron_payroll_sdk::poller::PollingDriver;
//! use tron_payroll_sdk::transaction::{ChainContext, SingleTransfer, TransferSettings};
//! use tron_payroll_sdk::types::TransactionIntent;
//! use tron_payroll_sdk::wallet::RemoteSigner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let node = RpcClient::new(config.rpc_url());
//! let api = PayrollApiClient::new("http://localhost:3000/api");
//! let wallet = RemoteSigner::new("http://localhost:9000/sign", "TXYZ...");
//!
//! let flow = SingleTransfer::new(
//!     TransferSettings::from_config(&config)?,
//!     PollingDriver::new(OutcomeClassifier::new(RpcClient::new(config.rpc_url()))),
//! );
//!
//! let units = to_token_units(Decimal::new(42, 0), config.token_decimals)?;
//! let intent = TransactionIntent::single(1, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", units);
//!
//! let ctx = ChainContext {
//!     wallet: Some(&wallet),
//!     submitter: &node,
//!     recorder: &api,
//! };
//! let tx_id = flow.execute(&ctx, &intent).await?;
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod address;
pub mod amount;
pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod payments;
pub mod poller;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use error::{Error, Result};

/// Re-export commonly used types
pub use types::*;

/// Re-export utility functions
pub use types::utils;

/// Re-export amount conversion functions
pub use amount::{from_token_units, to_token_units, TokenAmount};
