#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tron_payroll_sdk::abi::ContractCall;
use tron_payroll_sdk::address::Address;
use tron_payroll_sdk::client::TransactionSubmitter;
use tron_payroll_sdk::payments::{PaymentRecord, PaymentRecorder};
use tron_payroll_sdk::poller::{PollConfig, PollingDriver, Sleeper, StatusSource};
use tron_payroll_sdk::rpc::RawTransaction;
use tron_payroll_sdk::transaction::TransferSettings;
use tron_payroll_sdk::types::{TransactionHandle, TransactionOutcome};
use tron_payroll_sdk::wallet::Wallet;
use tron_payroll_sdk::{Error, Result};

pub const OWNER: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

pub fn settings() -> TransferSettings {
    TransferSettings {
        token: "0x1111".parse().unwrap(),
        batch_contract: "0x2222".parse().unwrap(),
        decimals: 6,
        chain_id: None,
    }
}

/// Node double that hands out sequential transaction ids
#[derive(Default)]
pub struct FakeNode {
    pub builds: Mutex<Vec<(Address, ContractCall)>>,
    pub broadcasts: AtomicUsize,
    pub fail_build: bool,
}

impl FakeNode {
    pub fn build_count(&self) -> usize {
        self.builds.lock().unwrap().len()
    }

    pub fn selectors(&self) -> Vec<&'static str> {
        self.builds
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.function_selector)
            .collect()
    }
}

#[async_trait]
impl TransactionSubmitter for FakeNode {
    async fn build_contract_call(
        &self,
        _owner: &Address,
        contract: &Address,
        call: &ContractCall,
    ) -> Result<RawTransaction> {
        if self.fail_build {
            return Err(Error::Submission("node unavailable".into()));
        }
        let mut builds = self.builds.lock().unwrap();
        builds.push((*contract, call.clone()));
        Ok(RawTransaction {
            tx_id: format!("tx{}", builds.len()),
            raw_data: serde_json::json!({ "fee_limit": 1_000_000_000u64 }),
            raw_data_hex: String::new(),
            signature: vec![],
            ret: vec![],
            visible: false,
        })
    }

    async fn broadcast(&self, signed: &RawTransaction) -> Result<TransactionHandle> {
        assert!(signed.is_signed(), "broadcast of unsigned transaction");
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionHandle::new(signed.tx_id.clone()))
    }
}

/// Wallet double; optionally rejects, optionally waits for a gate before signing
pub struct FakeWallet {
    pub address: Option<String>,
    pub reject: bool,
    pub gate: Option<Notify>,
    pub chain_id: Option<u64>,
    pub signed: AtomicUsize,
}

impl FakeWallet {
    pub fn connected() -> Self {
        Self {
            address: Some(OWNER.to_string()),
            reject: false,
            gate: None,
            chain_id: None,
            signed: AtomicUsize::new(0),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            address: None,
            ..Self::connected()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::connected()
        }
    }

    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..Self::connected()
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::connected()
        }
    }
}

#[async_trait]
impl Wallet for FakeWallet {
    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    async fn sign(&self, mut tx: RawTransaction) -> Result<RawTransaction> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.reject {
            return Err(Error::Wallet("User rejected the request".into()));
        }
        self.signed.fetch_add(1, Ordering::SeqCst);
        tx.signature.push("5f".repeat(65));
        Ok(tx)
    }
}

/// Status double returning scripted outcomes per transaction id, then `Pending`
#[derive(Default)]
pub struct ScriptedStatus {
    scripts: Mutex<HashMap<String, VecDeque<TransactionOutcome>>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedStatus {
    pub fn with(self, id: &str, outcomes: Vec<TransactionOutcome>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), outcomes.into());
        self
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == id).count()
    }
}

#[async_trait]
impl StatusSource for ScriptedStatus {
    async fn status(&self, id: &str) -> TransactionOutcome {
        self.calls.lock().unwrap().push(id.to_string());
        self.scripts
            .lock()
            .unwrap()
            .get_mut(id)
            .and_then(|script| script.pop_front())
            .unwrap_or(TransactionOutcome::Pending)
    }
}

/// Sleeper that records requested delays without waiting
#[derive(Default)]
pub struct NoSleep {
    pub sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

pub fn driver(status: Arc<ScriptedStatus>) -> PollingDriver<Arc<ScriptedStatus>, NoSleep> {
    PollingDriver::with_sleeper(status, NoSleep::default(), PollConfig::default())
}

/// Recorder double keeping every record it receives
#[derive(Default)]
pub struct MemoryRecorder {
    pub records: Mutex<Vec<PaymentRecord>>,
    pub fail: bool,
}

impl MemoryRecorder {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentRecorder for MemoryRecorder {
    async fn record(&self, record: &PaymentRecord) -> Result<()> {
        if self.fail {
            return Err(Error::Rpc("POST failed with status: 500".into()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
