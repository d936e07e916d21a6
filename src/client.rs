//! Client implementations for connecting to TRON infrastructure
use crate::abi::{self, ContractCall};
use crate::address::{redact_middle, Address};
use crate::error::{Error, Result};
use crate::rpc::{
    decode_node_message, BroadcastResponse, RawReceipt, RawTransaction,
    TriggerConstantResponse, TriggerSmartContractRequest, TriggerSmartContractResponse,
    CALL_VALUE, FEE_LIMIT,
};
use crate::types::TransactionHandle;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Read-only transaction lookups.
///
/// `None` means the node has not indexed the transaction (or its receipt)
/// yet. Transport failures are returned as errors and never retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainQuery: Send + Sync {
    async fn get_transaction_by_hash(&self, id: &str) -> Result<Option<RawTransaction>>;

    async fn get_transaction_receipt(&self, id: &str) -> Result<Option<RawReceipt>>;
}

/// Node calls that build and submit contract transactions
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Build an unsigned transaction invoking `call` on `contract` from `owner`.
    async fn build_contract_call(
        &self,
        owner: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<RawTransaction>;

    /// Submit a signed transaction.
    async fn broadcast(&self, signed: &RawTransaction) -> Result<TransactionHandle>;
}

/// HTTP client for the TRON full node API (`/wallet/*`).
///
/// Works against TronGrid or a self-hosted java-tron node. TronGrid rate
/// limits anonymous callers, so an API key can be attached.
pub struct RpcClient {
    endpoint: String,
    http: reqwest::Client,
    api_key: Option<SecretString>,
}

impl RpcClient {
    /// Create a new client without an API key.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            api_key: None,
        }
    }

    /// Create a new client sending `TRON-PRO-API-KEY` with every request.
    pub fn with_api_key(endpoint: impl Into<String>, api_key: SecretString) -> Self {
        let mut client = Self::new(endpoint);
        client.api_key = Some(api_key);
        client
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST a JSON body to a node API path and return the raw JSON reply.
    ///
    /// The node answers malformed requests with HTTP 200 and an `Error` field,
    /// which is mapped to [`Error::Rpc`].
    pub async fn call<B>(&self, path: &str, body: &B) -> Result<serde_json::Value>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.endpoint, path);
        let mut req = self
            .http
            .post(&url)
            .json(body)
            .header("Content-Type", "application/json");

        if let Some(ref key) = self.api_key {
            req = req.header("TRON-PRO-API-KEY", key.expose_secret().as_str());
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            return Err(Error::Rpc(format!(
                "{} failed with status: {}",
                path,
                response.status()
            )));
        }

        let value: serde_json::Value = response.json().await?;

        if let Some(error) = value.get("Error").and_then(|e| e.as_str()) {
            return Err(Error::Rpc(format!("{}: {}", path, error)));
        }

        Ok(value)
    }

    /// Call a node API path and deserialize into the requested type.
    pub async fn call_typed<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.call(path, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Call a path that answers `{}` when the object does not exist (yet).
    async fn call_optional<T>(&self, path: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = self
            .call(path, &serde_json::json!({ "value": id }))
            .await?;

        let is_empty = value.as_object().map_or(true, |obj| obj.is_empty());
        if is_empty {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    // ============================================================================
    // Transaction Queries
    // ============================================================================

    /// Get a transaction by its id (`/wallet/gettransactionbyid`).
    pub async fn get_transaction_by_id(&self, id: &str) -> Result<Option<RawTransaction>> {
        self.call_optional("/wallet/gettransactionbyid", id).await
    }

    /// Get the execution receipt of a transaction (`/wallet/gettransactioninfobyid`).
    pub async fn get_transaction_info_by_id(&self, id: &str) -> Result<Option<RawReceipt>> {
        self.call_optional("/wallet/gettransactioninfobyid", id)
            .await
    }

    // ============================================================================
    // Smart Contract Calls
    // ============================================================================

    /// Build an unsigned contract call (`/wallet/triggersmartcontract`).
    ///
    /// Uses the fixed payroll fee ceiling and zero call value.
    pub async fn trigger_smart_contract(
        &self,
        owner: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<RawTransaction> {
        let request = TriggerSmartContractRequest {
            owner_address: owner.to_hex(),
            contract_address: contract.to_hex(),
            function_selector: call.function_selector.to_string(),
            parameter: call.parameter.clone(),
            fee_limit: Some(FEE_LIMIT),
            call_value: CALL_VALUE,
            visible: false,
        };

        let response: TriggerSmartContractResponse = self
            .call_typed("/wallet/triggersmartcontract", &request)
            .await?;

        if !response.result.result {
            let message = response
                .result
                .message
                .as_deref()
                .map(decode_node_message)
                .or(response.result.code)
                .unwrap_or_else(|| "unknown node error".to_string());
            return Err(Error::Submission(format!(
                "Failed to build {}: {}",
                call.function_selector, message
            )));
        }

        response.transaction.ok_or_else(|| {
            Error::Submission("Node returned no transaction to sign".to_string())
        })
    }

    /// Execute a read-only contract call (`/wallet/triggerconstantcontract`)
    /// and return the first hex-encoded result word block.
    pub async fn trigger_constant_contract(
        &self,
        owner: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<String> {
        let request = TriggerSmartContractRequest {
            owner_address: owner.to_hex(),
            contract_address: contract.to_hex(),
            function_selector: call.function_selector.to_string(),
            parameter: call.parameter.clone(),
            fee_limit: None,
            call_value: CALL_VALUE,
            visible: false,
        };

        let response: TriggerConstantResponse = self
            .call_typed("/wallet/triggerconstantcontract", &request)
            .await?;

        if !response.result.result {
            let message = response
                .result
                .message
                .as_deref()
                .map(decode_node_message)
                .unwrap_or_else(|| "constant call failed".to_string());
            return Err(Error::Rpc(message));
        }

        response
            .constant_result
            .into_iter()
            .next()
            .ok_or_else(|| Error::Rpc("Constant call returned no result".to_string()))
    }

    /// Token balance of `owner` in token units (`balanceOf(address)`).
    pub async fn balance_of(&self, token: &Address, owner: &Address) -> Result<u128> {
        let result = self
            .trigger_constant_contract(owner, token, &abi::balance_of_call(owner))
            .await?;
        abi::decode_uint(&result)
    }

    /// Submit a signed transaction (`/wallet/broadcasttransaction`).
    pub async fn broadcast_transaction(&self, signed: &RawTransaction) -> Result<TransactionHandle> {
        if !signed.is_signed() {
            return Err(Error::Submission(
                "Refusing to broadcast an unsigned transaction".to_string(),
            ));
        }

        let response: BroadcastResponse = self
            .call_typed("/wallet/broadcasttransaction", signed)
            .await?;

        if !response.result {
            let message = response
                .message
                .as_deref()
                .map(decode_node_message)
                .unwrap_or_default();
            return Err(Error::Submission(format!(
                "Broadcast rejected ({}): {}",
                response.code.as_deref().unwrap_or("UNKNOWN"),
                message
            )));
        }

        let id = response.txid.unwrap_or_else(|| signed.tx_id.clone());
        tracing::info!("Broadcast transaction {}", redact_middle(&id, 8, 8));
        Ok(TransactionHandle::new(id))
    }
}

#[async_trait]
impl ChainQuery for RpcClient {
    async fn get_transaction_by_hash(&self, id: &str) -> Result<Option<RawTransaction>> {
        self.get_transaction_by_id(id).await
    }

    async fn get_transaction_receipt(&self, id: &str) -> Result<Option<RawReceipt>> {
        self.get_transaction_info_by_id(id).await
    }
}

#[async_trait]
impl TransactionSubmitter for RpcClient {
    async fn build_contract_call(
        &self,
        owner: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<RawTransaction> {
        self.trigger_smart_contract(owner, contract, call).await
    }

    async fn broadcast(&self, signed: &RawTransaction) -> Result<TransactionHandle> {
        self.broadcast_transaction(signed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = RpcClient::new("https://nile.trongrid.io/");
        assert_eq!(client.endpoint(), "https://nile.trongrid.io");
    }

    #[tokio::test]
    async fn test_broadcast_requires_signature() {
        let client = RpcClient::new("http://127.0.0.1:1");
        let unsigned = RawTransaction {
            tx_id: "abc".into(),
            raw_data: serde_json::json!({}),
            raw_data_hex: String::new(),
            signature: vec![],
            ret: vec![],
            visible: false,
        };
        let err = client.broadcast_transaction(&unsigned).await.unwrap_err();
        assert!(matches!(err, Error::Submission(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_retryable() {
        // Nothing listens on port 1
        let client = RpcClient::new("http://127.0.0.1:1");
        let err = client.get_transaction_by_hash("abc").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
