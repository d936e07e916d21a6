//! Read-only configuration for the payroll transaction flows

use crate::address::{parse_address, Address};
use crate::error::{Error, Result};
use crate::poller::PollConfig;
use crate::types::Network;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_decimals() -> u32 {
    6
}

fn default_symbol() -> String {
    "USDT".to_string()
}

/// Contract addresses, network selection and polling budget.
///
/// Loaded from JSON:
///
/// ```json
/// {
///   "network": "nile",
///   "token_contract": "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf",
///   "token_decimals": 6,
///   "batch_contract": "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE",
///   "api_url": "http://localhost:3000/api",
///   "poll": { "max_attempts": 10, "delay_ms": 5000 }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    /// Overrides the network's default node host
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub token_contract: String,
    #[serde(default = "default_decimals")]
    pub token_decimals: u32,
    #[serde(default = "default_symbol")]
    pub token_symbol: String,
    pub batch_contract: String,
    /// Payroll backend root, e.g. `http://localhost:3000/api`
    #[serde(default)]
    pub api_url: Option<String>,
    /// External signer endpoint used by [`crate::wallet::RemoteSigner`]
    #[serde(default)]
    pub signer_url: Option<String>,
    #[serde(default)]
    pub poll: PollConfig,
}

impl Config {
    /// Standard config location (`<config dir>/tron-payroll-sdk/config.json`)
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?
            .join("tron-payroll-sdk")
            .join("config.json"))
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the standard location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_file(Self::default_path()?),
        }
    }

    fn validate(&self) -> Result<()> {
        self.token_address()?;
        self.batch_address()?;
        if self.token_decimals > 28 {
            return Err(Error::Config(format!(
                "token_decimals {} exceeds maximum of 28",
                self.token_decimals
            )));
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::Config("poll.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Node host: the explicit override or the network default
    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.network.chain_id()
    }

    pub fn token_address(&self) -> Result<Address> {
        parse_address(&self.token_contract)
            .map_err(|e| Error::Config(format!("token_contract: {}", e)))
    }

    pub fn batch_address(&self) -> Result<Address> {
        parse_address(&self.batch_contract)
            .map_err(|e| Error::Config(format!("batch_contract: {}", e)))
    }
}
