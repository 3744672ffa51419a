//! Batch tracking state machine.
//!
//! A submitted batch moves from `Submitted` through `Pending` to one of the
//! terminal states. Each poll is one transition; the caller's [`PollPolicy`]
//! bounds how many polls happen and how far apart they are.

use std::time::Duration;

use crate::client::LedgerClient;
use crate::error::{ClientError, Result};
use crate::messages::{BatchStatus, Handle, StatusRecord};
use crate::transport::Transport;

/// How often and how long to poll a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay after the first non-terminal poll.
    pub interval: Duration,
    /// Upper bound on the delay between polls.
    pub max_interval: Duration,
    /// Polls allowed before giving up.
    ///
    /// The first poll always runs, so `0` and `1` both mean a single check.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(8),
            max_attempts: 30,
        }
    }
}

impl PollPolicy {
    /// A policy polling at a constant interval.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_interval: interval,
            max_attempts,
        }
    }

    /// Delay to wait after poll number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        self.interval
            .saturating_mul(1u32 << doublings)
            .min(self.max_interval)
    }
}

/// Where a tracked batch stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    /// Accepted for submission, not polled yet.
    Submitted,
    /// Polled, not yet settled.
    Pending { attempts: u32 },
    Committed(StatusRecord),
    Invalid(StatusRecord),
    /// The poll budget ran out.
    TimedOut { attempts: u32 },
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Committed(_) | Self::Invalid(_) | Self::TimedOut { .. }
        )
    }
}

/// Drives one submitted batch to a terminal state.
pub struct BatchTracker<'a, T> {
    client: &'a LedgerClient<T>,
    handle: Handle,
    policy: PollPolicy,
    state: BatchState,
    attempts: u32,
}

impl<'a, T: Transport> BatchTracker<'a, T> {
    pub fn new(client: &'a LedgerClient<T>, handle: Handle, policy: PollPolicy) -> Self {
        Self {
            client,
            handle,
            policy,
            state: BatchState::Submitted,
            attempts: 0,
        }
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Polls made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Apply one polled status to the state.
    ///
    /// Terminal states never change. UNKNOWN counts as still pending.
    pub fn observe(&mut self, record: StatusRecord) -> &BatchState {
        if self.state.is_terminal() {
            return &self.state;
        }

        self.state = match record.status {
            BatchStatus::Committed => BatchState::Committed(record),
            BatchStatus::Invalid => BatchState::Invalid(record),
            BatchStatus::Pending | BatchStatus::Unknown => {
                if self.attempts >= self.policy.max_attempts {
                    BatchState::TimedOut {
                        attempts: self.attempts,
                    }
                } else {
                    BatchState::Pending {
                        attempts: self.attempts,
                    }
                }
            }
        };
        &self.state
    }

    /// Poll once and advance.
    ///
    /// A transport or decode failure leaves the state untouched.
    pub async fn step(&mut self) -> Result<&BatchState> {
        if self.state.is_terminal() {
            return Ok(&self.state);
        }

        let record = self.client.poll_status(&self.handle).await?;
        self.attempts += 1;
        Ok(self.observe(record))
    }

    /// Poll until the batch settles or the budget runs out.
    ///
    /// At least one poll is made whatever the policy's budget.
    pub async fn wait(mut self) -> Result<StatusRecord> {
        loop {
            match self.step().await? {
                BatchState::Committed(record) => return Ok(record.clone()),
                BatchState::Invalid(record) => {
                    tracing::warn!(
                        batch = ?record.id,
                        invalid = record.invalid_transactions.len(),
                        "batch is invalid"
                    );
                    return Err(ClientError::BatchInvalid {
                        batch_id: record.id,
                        invalid_transactions: record.invalid_transactions.clone(),
                    });
                }
                BatchState::TimedOut { attempts } => {
                    return Err(ClientError::TimedOut {
                        attempts: *attempts,
                    })
                }
                BatchState::Submitted | BatchState::Pending { .. } => {}
            }

            let delay = self.policy.delay_for(self.attempts);
            tracing::debug!(attempts = self.attempts, ?delay, "batch not settled, waiting");
            tokio::time::sleep(delay).await;
        }
    }
}
