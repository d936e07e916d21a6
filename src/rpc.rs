//! Wire types for the TRON full node HTTP API and the payroll status endpoint

use serde::{Deserialize, Serialize};

/// Fixed energy fee ceiling for every payroll contract call, in sun
pub const FEE_LIMIT: u64 = 1_000_000_000;

/// Payroll calls never send TRX along with the token call
pub const CALL_VALUE: u64 = 0;

/// Execution result entry of a transaction (`ret[]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContractRet {
    #[serde(rename = "contractRet", default, skip_serializing_if = "Option::is_none")]
    pub contract_ret: Option<String>,
}

/// Transaction as returned by `gettransactionbyid` and `triggersmartcontract`.
///
/// `raw_data` is kept as JSON so a wallet can sign and the node can accept
/// the exact structure it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub raw_data: serde_json::Value,
    #[serde(default)]
    pub raw_data_hex: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ret: Vec<ContractRet>,
    #[serde(default)]
    pub visible: bool,
}

impl RawTransaction {
    /// Result code of the embedded contract call (`SUCCESS`, `REVERT`, ...)
    pub fn contract_ret(&self) -> Option<&str> {
        self.ret.first().and_then(|r| r.contract_ret.as_deref())
    }

    /// Address of the contract the transaction called, if any
    pub fn contract_address(&self) -> Option<&str> {
        self.raw_data
            .get("contract")?
            .get(0)?
            .get("parameter")?
            .get("value")?
            .get("contract_address")?
            .as_str()
            .filter(|a| !a.is_empty())
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

/// Execution receipt as returned by `gettransactioninfobyid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReceipt {
    pub id: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(rename = "contractResult", default)]
    pub contract_result: Vec<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(rename = "resMessage", default)]
    pub res_message: Option<String>,
}

impl RawReceipt {
    /// ABI-encoded return data, falling back to the node's result message
    pub fn revert_payload(&self) -> &str {
        match self.contract_result.first().map(String::as_str) {
            Some(payload) if !payload.is_empty() => payload,
            _ => self.res_message.as_deref().unwrap_or(""),
        }
    }
}

/// Request body for `triggersmartcontract` / `triggerconstantcontract`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TriggerSmartContractRequest {
    pub owner_address: String,
    pub contract_address: String,
    pub function_selector: String,
    pub parameter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_limit: Option<u64>,
    pub call_value: u64,
    pub visible: bool,
}

/// Node-side result flag attached to trigger responses
#[derive(Debug, Clone, Deserialize, Default)]
pub(crate) struct ReturnResult {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub code: Option<String>,
    /// Hex-encoded message text
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `triggersmartcontract`
#[derive(Debug, Deserialize)]
pub(crate) struct TriggerSmartContractResponse {
    #[serde(default)]
    pub result: ReturnResult,
    pub transaction: Option<RawTransaction>,
}

/// Response of `triggerconstantcontract`
#[derive(Debug, Deserialize)]
pub(crate) struct TriggerConstantResponse {
    #[serde(default)]
    pub result: ReturnResult,
    #[serde(default)]
    pub constant_result: Vec<String>,
}

/// Response of `broadcasttransaction`
#[derive(Debug, Deserialize)]
pub(crate) struct BroadcastResponse {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Status reported by the payroll API's `/tx` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Retry,
    Success,
    Reverted,
    Error,
}

/// Body of `POST /api/tx?id=<hash>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatusResponse {
    pub status: TxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Decode a hex-encoded node message, falling back to the raw text.
pub(crate) fn decode_node_message(message: &str) -> String {
    hex::decode(message)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}
