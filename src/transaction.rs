//! Client-signed token transfer flows
//!
//! Two orchestrators drive a [`TransactionIntent`] from a confirmed form to
//! an on-chain confirmed payment:
//!
//! ```text
//! SingleTransfer:  Idle ─> Loading ─> Signing ─> Polling ─> Idle
//!
//! BatchTransfer:   Idle ─> LoadingApproval ─> SigningApproval ─> PollingApproval
//!                    │                                                │
//!                    │                      approval not confirmed ───┴─> Idle
//!                    │
//!                    └─> LoadingBatch ─> SigningBatch ─> PollingBatch ─> Idle
//! ```
//!
//! Each flow runs as one async task. It suspends while the wallet waits for
//! the user, while requests are in flight, and between status checks. A
//! second intent is refused with [`Error::Busy`] until the first reaches a
//! terminal outcome, and every exit path returns the orchestrator to `Idle`.
//!
//! A payment is recorded only after its transaction is confirmed, exactly
//! once per transaction hash. Nothing is persisted earlier, so a crash
//! mid-flow leaves no partial record.

use crate::abi::{self, ContractCall};
use crate::address::{parse_address, redact_middle, Address};
use crate::amount::from_token_units;
use crate::client::TransactionSubmitter;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::payments::{PaymentRecord, PaymentRecorder};
use crate::poller::{PollingDriver, Sleeper, StatusSource, TokioSleeper};
use crate::types::{TransactionIntent, TransferKind};
use crate::wallet::{connected_address, Wallet};
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

/// Capabilities a flow needs, passed explicitly into every call
pub struct ChainContext<'a> {
    /// Connected wallet, `None` when the user has not connected one
    pub wallet: Option<&'a dyn Wallet>,
    pub submitter: &'a dyn TransactionSubmitter,
    pub recorder: &'a dyn PaymentRecorder,
}

/// Contract addresses and token parameters shared by both flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub token: Address,
    pub batch_contract: Address,
    pub decimals: u32,
    /// Reject wallets connected to another chain, when set
    pub chain_id: Option<u64>,
}

impl TransferSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            token: config.token_address()?,
            batch_contract: config.batch_address()?,
            decimals: config.token_decimals,
            chain_id: Some(config.expected_chain_id()),
        })
    }
}

/// States of a single-recipient transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingleState {
    #[default]
    Idle,
    Loading,
    Signing,
    Polling,
}

/// States of a two-phase batch transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    LoadingApproval,
    SigningApproval,
    PollingApproval,
    LoadingBatch,
    SigningBatch,
    PollingBatch,
}

/// Current flow state plus the busy guard built on it
struct StateCell<St> {
    state: Mutex<St>,
}

impl<St: Copy + PartialEq + Default + fmt::Debug> StateCell<St> {
    fn new() -> Self {
        Self {
            state: Mutex::new(St::default()),
        }
    }

    fn get(&self) -> St {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Leave `Idle` for `first`, or fail if a flow is already running.
    fn begin(&self, first: St) -> Result<FlowGuard<'_, St>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != St::default() {
            return Err(Error::Busy);
        }
        *state = first;
        tracing::debug!("Flow state -> {:?}", first);
        Ok(FlowGuard { cell: self })
    }
}

/// Holds a flow out of `Idle`; dropping it returns to `Idle`.
struct FlowGuard<'a, St: Copy + PartialEq + Default + fmt::Debug> {
    cell: &'a StateCell<St>,
}

impl<St: Copy + PartialEq + Default + fmt::Debug> FlowGuard<'_, St> {
    fn set(&self, next: St) {
        *self.cell.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
        tracing::debug!("Flow state -> {:?}", next);
    }
}

impl<St: Copy + PartialEq + Default + fmt::Debug> Drop for FlowGuard<'_, St> {
    fn drop(&mut self) {
        *self.cell.state.lock().unwrap_or_else(|e| e.into_inner()) = St::default();
    }
}

/// Build, sign, submit and poll one contract call.
///
/// `phases` are the loading, signing and polling states to pass through.
#[allow(clippy::too_many_arguments)]
async fn run_call<S, T, St>(
    driver: &PollingDriver<S, T>,
    guard: &FlowGuard<'_, St>,
    ctx: &ChainContext<'_>,
    wallet: &dyn Wallet,
    owner: &Address,
    contract: &Address,
    call: &ContractCall,
    phases: [St; 3],
) -> Result<String>
where
    S: StatusSource,
    T: Sleeper,
    St: Copy + PartialEq + Default + fmt::Debug,
{
    let [loading, signing, polling] = phases;

    guard.set(loading);
    let unsigned = ctx
        .submitter
        .build_contract_call(owner, contract, call)
        .await?;

    guard.set(signing);
    let signed = wallet.sign(unsigned).await?;

    let handle = ctx.submitter.broadcast(&signed).await?;
    tracing::info!(
        "Submitted {} as {}",
        call.function_selector,
        redact_middle(&handle.id, 8, 8)
    );

    guard.set(polling);
    driver.wait_for(&handle.id).await
}

/// Resolve the connected wallet and its owner address.
///
/// `Ok(None)` means there is no usable wallet and the flow is a no-op.
fn resolve_wallet<'a>(
    ctx: &ChainContext<'a>,
    settings: &TransferSettings,
) -> Result<Option<(&'a dyn Wallet, Address)>> {
    let wallet = match ctx.wallet {
        Some(wallet) => wallet,
        None => return Ok(None),
    };
    let address = match connected_address(Some(wallet)) {
        Some(address) => address,
        None => return Ok(None),
    };

    if let (Some(expected), Some(actual)) = (settings.chain_id, wallet.chain_id()) {
        if expected != actual {
            return Err(Error::Wallet(format!(
                "Wallet is connected to chain {:#x}, expected {:#x}",
                actual, expected
            )));
        }
    }

    Ok(Some((wallet, parse_address(&address)?)))
}

/// Remembers which hashes were already recorded.
///
/// Unbounded: one entry per recorded payment for the life of the
/// orchestrator.
#[derive(Default)]
struct RecordedHashes(Mutex<HashSet<String>>);

impl RecordedHashes {
    async fn record_once(
        &self,
        recorder: &dyn PaymentRecorder,
        record: PaymentRecord,
    ) -> Result<()> {
        let tx_id = record.transaction_hash().to_string();
        if self.0.lock().unwrap_or_else(|e| e.into_inner()).contains(&tx_id) {
            tracing::warn!("Payment for {} already recorded", redact_middle(&tx_id, 8, 8));
            return Ok(());
        }

        recorder
            .record(&record)
            .await
            .map_err(|e| Error::Persistence {
                tx_id: tx_id.clone(),
                message: e.to_string(),
            })?;

        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tx_id);
        Ok(())
    }
}

/// Drives a single-recipient `transfer(address,uint256)`
pub struct SingleTransfer<S, T = TokioSleeper> {
    settings: TransferSettings,
    driver: PollingDriver<S, T>,
    state: StateCell<SingleState>,
    recorded: RecordedHashes,
}

impl<S: StatusSource, T: Sleeper> SingleTransfer<S, T> {
    pub fn new(settings: TransferSettings, driver: PollingDriver<S, T>) -> Self {
        Self {
            settings,
            driver,
            state: StateCell::new(),
            recorded: RecordedHashes::default(),
        }
    }

    pub fn state(&self) -> SingleState {
        self.state.get()
    }

    pub fn is_busy(&self) -> bool {
        self.state() != SingleState::Idle
    }

    /// Pay the single recipient of `intent`.
    ///
    /// Returns `Ok(None)` without doing anything when no wallet is connected,
    /// `Ok(Some(tx id))` once the transfer is confirmed and recorded.
    pub async fn execute(
        &self,
        ctx: &ChainContext<'_>,
        intent: &TransactionIntent,
    ) -> Result<Option<String>> {
        if intent.kind() != TransferKind::Single {
            return Err(Error::InvalidParameter(
                "SingleTransfer requires a single-recipient intent".to_string(),
            ));
        }

        let (wallet, owner) = match resolve_wallet(ctx, &self.settings)? {
            Some(resolved) => resolved,
            None => {
                tracing::debug!("No wallet connected, ignoring transfer request");
                return Ok(None);
            }
        };

        let guard = self.state.begin(SingleState::Loading)?;

        let (recipient, units) = match (intent.recipients().first(), intent.amounts().first()) {
            (Some(recipient), Some(units)) => (parse_address(recipient)?, *units),
            _ => {
                return Err(Error::InvalidParameter(
                    "Transfer intent has no recipient".to_string(),
                ))
            }
        };

        // Converted up front so a confirmed transfer can always be recorded
        let amount = from_token_units(units, self.settings.decimals)?;

        tracing::info!(
            "Transferring {} units to {}",
            units,
            redact_middle(&recipient.to_base58(), 6, 6)
        );

        let tx_id = run_call(
            &self.driver,
            &guard,
            ctx,
            wallet,
            &owner,
            &self.settings.token,
            &abi::transfer_call(&recipient, units),
            [SingleState::Loading, SingleState::Signing, SingleState::Polling],
        )
        .await?;

        self.recorded
            .record_once(
                ctx.recorder,
                PaymentRecord::Single {
                    employee_id: intent.reference(),
                    transaction_hash: tx_id.clone(),
                    amount,
                },
            )
            .await?;

        Ok(Some(tx_id))
    }
}

/// Drives the two-phase approve + `batchTransfer(address[],uint256[])` flow
pub struct BatchTransfer<S, T = TokioSleeper> {
    settings: TransferSettings,
    driver: PollingDriver<S, T>,
    state: StateCell<BatchState>,
    recorded: RecordedHashes,
}

impl<S: StatusSource, T: Sleeper> BatchTransfer<S, T> {
    pub fn new(settings: TransferSettings, driver: PollingDriver<S, T>) -> Self {
        Self {
            settings,
            driver,
            state: StateCell::new(),
            recorded: RecordedHashes::default(),
        }
    }

    pub fn state(&self) -> BatchState {
        self.state.get()
    }

    pub fn is_busy(&self) -> bool {
        self.state() != BatchState::Idle
    }

    /// Pay every recipient of `intent` in one batch transaction.
    ///
    /// The batch contract is first approved to spend the batch total. The
    /// batch transfer is only built once that approval is confirmed; any
    /// other approval outcome aborts the flow.
    pub async fn execute(
        &self,
        ctx: &ChainContext<'_>,
        intent: &TransactionIntent,
    ) -> Result<Option<String>> {
        if intent.kind() != TransferKind::Batch {
            return Err(Error::InvalidParameter(
                "BatchTransfer requires a batch intent".to_string(),
            ));
        }

        let (wallet, owner) = match resolve_wallet(ctx, &self.settings)? {
            Some(resolved) => resolved,
            None => {
                tracing::debug!("No wallet connected, ignoring batch request");
                return Ok(None);
            }
        };

        let guard = self.state.begin(BatchState::LoadingApproval)?;

        let total = intent.total_units()?;
        let total_amount = from_token_units(total, self.settings.decimals)?;
        let recipients = intent
            .recipients()
            .iter()
            .map(|r| parse_address(r))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            "Approving {} units for batch of {} recipients",
            total,
            recipients.len()
        );

        let approval_id = run_call(
            &self.driver,
            &guard,
            ctx,
            wallet,
            &owner,
            &self.settings.token,
            &abi::approve_call(&self.settings.batch_contract, total),
            [
                BatchState::LoadingApproval,
                BatchState::SigningApproval,
                BatchState::PollingApproval,
            ],
        )
        .await
        .map_err(|e| {
            tracing::warn!("Approval failed, batch transfer not started: {}", e);
            e
        })?;

        tracing::info!(
            "Approval {} confirmed, sending batch transfer",
            redact_middle(&approval_id, 8, 8)
        );

        let batch_id = run_call(
            &self.driver,
            &guard,
            ctx,
            wallet,
            &owner,
            &self.settings.batch_contract,
            &abi::batch_transfer_call(&recipients, intent.amounts()),
            [
                BatchState::LoadingBatch,
                BatchState::SigningBatch,
                BatchState::PollingBatch,
            ],
        )
        .await?;

        self.recorded
            .record_once(
                ctx.recorder,
                PaymentRecord::Batch {
                    group_id: intent.reference(),
                    transaction_hash: batch_id.clone(),
                    recipients_count: recipients.len(),
                    total_amount,
                },
            )
            .await?;

        Ok(Some(batch_id))
    }
}
