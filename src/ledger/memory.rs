//! In-memory ledger and identity provider
//!
//! Used by the demo binary and tests. The ledger can simulate latency and
//! inject failures so settlement ordering and failure handling can be
//! exercised without a real backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{IdentityProvider, Ledger, UserProfile};
use crate::error::LedgerError;

/// Stored balances for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub balance: u64,
    pub total_winnings: u64,
    pub last_wheel_spin: DateTime<Utc>,
}

impl From<&UserProfile> for LedgerRecord {
    fn from(profile: &UserProfile) -> Self {
        Self {
            balance: profile.balance,
            total_winnings: profile.total_winnings,
            last_wheel_spin: profile.last_wheel_spin,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    records: Mutex<HashMap<String, LedgerRecord>>,
    latency: Duration,
    /// Number of upcoming calls that fail
    failures: AtomicU32,
    /// Number of upcoming calls refused by the ledger itself
    rejections: AtomicU32,
    writes: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before applying
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn insert(&self, profile: &UserProfile) {
        self.lock().insert(profile.id.clone(), LedgerRecord::from(profile));
    }

    pub fn record(&self, user_id: &str) -> Option<LedgerRecord> {
        self.lock().get(user_id).cloned()
    }

    /// Make the next `n` calls fail without applying
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` calls come back rejected without applying
    pub fn reject_next(&self, n: u32) {
        self.rejections.store(n, Ordering::SeqCst);
    }

    /// Successful writes applied so far
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LedgerRecord>> {
        // A poisoned map is still structurally valid
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn apply<F>(&self, user_id: &str, update: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut LedgerRecord) + Send,
    {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if take_one(&self.failures) {
            return Err(LedgerError::Unavailable("injected failure".to_string()));
        }
        if take_one(&self.rejections) {
            return Err(LedgerError::Rejected {
                user_id: user_id.to_string(),
            });
        }

        let mut records = self.lock();
        let record = records
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::UnknownUser(user_id.to_string()))?;
        update(record);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Decrement a pending-fault counter, returning true if one was pending
fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn update_balance(&self, user_id: &str, new_balance: u64) -> Result<(), LedgerError> {
        self.apply(user_id, |r| r.balance = new_balance).await
    }

    async fn update_balance_and_winnings(
        &self,
        user_id: &str,
        new_balance: u64,
        new_total_winnings: u64,
    ) -> Result<(), LedgerError> {
        self.apply(user_id, |r| {
            r.balance = new_balance;
            r.total_winnings = new_total_winnings;
        })
        .await
    }

    async fn update_balance_and_last_spin(
        &self,
        user_id: &str,
        new_balance: u64,
        new_spin: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.apply(user_id, |r| {
            r.balance = new_balance;
            r.last_wheel_spin = new_spin;
        })
        .await
    }
}

/// Identity provider holding at most one signed-in user
#[derive(Debug, Default)]
pub struct InMemoryIdentity {
    current: Mutex<Option<UserProfile>>,
}

impl InMemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            current: Mutex::new(Some(profile)),
        }
    }

    pub fn sign_in(&self, profile: UserProfile) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(profile);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn current_user(&self) -> Option<UserProfile> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn sign_out(&self) {
        if let Some(profile) = self.current.lock().unwrap_or_else(|e| e.into_inner()).take() {
            log::info!("Signed out {}", profile.email);
        }
    }
}
