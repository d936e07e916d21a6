//! Bounded polling of a submitted transaction until a terminal outcome
//!
//! The driver asks a [`StatusSource`] for the outcome of a transaction up to
//! `max_attempts` times, sleeping `delay` between attempts. A transaction
//! still pending after the last attempt is reported as
//! "transaction not found". There is no mid-poll cancellation, so a caller
//! waits at most `max_attempts × delay` plus request latency.

use crate::address::redact_middle;
use crate::error::{Error, Result};
use crate::types::{PollAttempt, TransactionOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Default number of status checks per transaction
pub const MAX_ATTEMPTS: u32 = 10;

/// Default delay between status checks
pub const DELAY: Duration = Duration::from_millis(5000);

/// Message reported when the attempt budget runs out
pub const NOT_FOUND: &str = "transaction not found";

/// Anything that can report the current outcome of a transaction.
///
/// Implementations fold transport failures into
/// [`TransactionOutcome::Error`].
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn status(&self, id: &str) -> TransactionOutcome;
}

#[async_trait]
impl<S: StatusSource + ?Sized> StatusSource for std::sync::Arc<S> {
    async fn status(&self, id: &str) -> TransactionOutcome {
        (**self).status(id).await
    }
}

/// Timer used between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    MAX_ATTEMPTS
}

fn default_delay_ms() -> u64 {
    DELAY.as_millis() as u64
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay_ms: default_delay_ms(),
        }
    }
}

impl PollConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Longest time a single poll can block, excluding request latency
    pub fn worst_case(&self) -> Duration {
        self.delay() * self.max_attempts
    }
}

/// Driver state, observable while a poll is running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling(u32),
    Done(TransactionOutcome),
}

/// Terminal result of one poll, with the attempt history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub tx_id: String,
    pub outcome: TransactionOutcome,
    pub attempts: Vec<PollAttempt>,
    /// The attempt budget ran out while the transaction was still pending
    pub exhausted: bool,
}

impl PollReport {
    /// Convert the terminal outcome into `Ok(tx id)` or the matching error.
    pub fn into_result(self) -> Result<String> {
        match self.outcome {
            TransactionOutcome::Success => Ok(self.tx_id),
            TransactionOutcome::Reverted { reason } => Err(Error::Reverted {
                tx_id: self.tx_id,
                reason,
            }),
            _ if self.exhausted => Err(Error::Exhausted {
                tx_id: self.tx_id,
                attempts: self.attempts.len() as u32,
            }),
            TransactionOutcome::Error { message } => Err(Error::Transaction(message)),
            TransactionOutcome::Pending => Err(Error::Transaction(format!(
                "poll of {} ended without a terminal outcome",
                self.tx_id
            ))),
        }
    }
}

/// Repeatedly checks a transaction until it reaches a terminal outcome
pub struct PollingDriver<S, T = TokioSleeper> {
    source: S,
    sleeper: T,
    config: PollConfig,
}

impl<S: StatusSource> PollingDriver<S, TokioSleeper> {
    /// Driver with the default budget (10 attempts, 5 s apart) and a real timer
    pub fn new(source: S) -> Self {
        Self::with_sleeper(source, TokioSleeper, PollConfig::default())
    }
}

impl<S: StatusSource, T: Sleeper> PollingDriver<S, T> {
    pub fn with_sleeper(source: S, sleeper: T, config: PollConfig) -> Self {
        Self {
            source,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `id` to a terminal outcome.
    ///
    /// `on_state` observes every state change, starting with
    /// `Polling(1)` and ending with `Done(..)`.
    pub async fn poll_with<F>(&self, id: &str, mut on_state: F) -> PollReport
    where
        F: FnMut(&PollState) + Send,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = Vec::new();
        let short_id = redact_middle(id, 8, 8);

        for index in 1..=max_attempts {
            on_state(&PollState::Polling(index));
            let outcome = self.source.status(id).await;
            tracing::debug!(
                "Poll attempt {}/{} for {}: {:?}",
                index,
                max_attempts,
                short_id,
                outcome
            );
            attempts.push(PollAttempt {
                index,
                outcome: outcome.clone(),
            });

            if outcome.is_terminal() {
                return self.finish(id, outcome, attempts, false, &mut on_state);
            }

            if index < max_attempts {
                self.sleeper.sleep(self.config.delay()).await;
            }
        }

        tracing::warn!(
            "Transaction {} still pending after {} attempts",
            short_id,
            max_attempts
        );
        self.finish(
            id,
            TransactionOutcome::error(NOT_FOUND),
            attempts,
            true,
            &mut on_state,
        )
    }

    /// Poll `id` to a terminal outcome without observing state changes.
    pub async fn poll(&self, id: &str) -> PollReport {
        self.poll_with(id, |_| {}).await
    }

    /// Poll `id` and return its id on success or the terminal error.
    pub async fn wait_for(&self, id: &str) -> Result<String> {
        self.poll(id).await.into_result()
    }

    fn finish<F>(
        &self,
        id: &str,
        outcome: TransactionOutcome,
        attempts: Vec<PollAttempt>,
        exhausted: bool,
        on_state: &mut F,
    ) -> PollReport
    where
        F: FnMut(&PollState),
    {
        match &outcome {
            TransactionOutcome::Success => {
                tracing::info!("Transaction {} confirmed", redact_middle(id, 8, 8))
            }
            other => tracing::warn!(
                "Transaction {} failed: {:?}",
                redact_middle(id, 8, 8),
                other
            ),
        }
        on_state(&PollState::Done(outcome.clone()));
        PollReport {
            tx_id: id.to_string(),
            outcome,
            attempts,
            exhausted,
        }
    }
}
