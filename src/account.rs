//! Per-user settlement
//!
//! `Account` holds the last balances the ledger acknowledged. Every
//! balance-affecting operation locks it for the whole read → ledger call →
//! commit sequence, so settlements for one user run strictly one after
//! another and a slow ledger can never cause a lost update. The local view is
//! only changed after the ledger reports success.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{GameError, Result};
use crate::ledger::{IdentityProvider, Ledger, UserProfile};
use crate::wheel::can_spin;

/// Acknowledged balances for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub balance: u64,
    pub total_winnings: u64,
    pub last_wheel_spin: DateTime<Utc>,
}

pub struct Account {
    user_id: String,
    email: String,
    ledger: Arc<dyn Ledger>,
    state: Mutex<Balances>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn new(profile: &UserProfile, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            user_id: profile.id.clone(),
            email: profile.email.clone(),
            ledger,
            state: Mutex::new(Balances {
                balance: profile.balance,
                total_winnings: profile.total_winnings,
                last_wheel_spin: profile.last_wheel_spin,
            }),
        }
    }

    /// Open the account of the currently signed-in user
    pub async fn open(identity: &dyn IdentityProvider, ledger: Arc<dyn Ledger>) -> Result<Arc<Self>> {
        let profile = identity.current_user().await.ok_or(GameError::NotSignedIn)?;
        log::info!("Opened account for {} (balance {})", profile.email, profile.balance);
        Ok(Arc::new(Self::new(&profile, ledger)))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Last acknowledged balances. Waits for any settlement in flight.
    pub async fn snapshot(&self) -> Balances {
        self.state.lock().await.clone()
    }

    pub async fn balance(&self) -> u64 {
        self.state.lock().await.balance
    }

    /// Take `amount` from the balance before a ball is spawned
    pub async fn debit(&self, amount: u64) -> Result<Balances> {
        let mut state = self.state.lock().await;
        if amount > state.balance {
            return Err(GameError::InsufficientBalance {
                balance: state.balance,
                bet: amount,
            });
        }

        let new_balance = state.balance - amount;
        self.ledger
            .update_balance(&self.user_id, new_balance)
            .await
            .inspect_err(|e| log::warn!("Debit of {} for {} failed: {}", amount, self.user_id, e))?;

        state.balance = new_balance;
        log::debug!("Debited {} from {} (balance {})", amount, self.user_id, new_balance);
        Ok(state.clone())
    }

    /// Credit slot winnings to both the balance and the running total
    pub async fn credit_winnings(&self, amount: u64) -> Result<Balances> {
        let mut state = self.state.lock().await;
        let new_balance = state.balance.saturating_add(amount);
        let new_total = state.total_winnings.saturating_add(amount);

        self.ledger
            .update_balance_and_winnings(&self.user_id, new_balance, new_total)
            .await
            .inspect_err(|e| log::warn!("Winnings credit of {} for {} failed: {}", amount, self.user_id, e))?;

        state.balance = new_balance;
        state.total_winnings = new_total;
        log::debug!("Credited {} to {} (balance {})", amount, self.user_id, new_balance);
        Ok(state.clone())
    }

    /// Credit a wheel reward and stamp the spin time in one settlement.
    ///
    /// Eligibility is checked again under the lock against `now` (the
    /// player's local time): a second spin resolving on the same day is
    /// refused with `IneligibleSpin` and never reaches the ledger.
    pub async fn credit_wheel_reward(&self, amount: u64, now: DateTime<FixedOffset>) -> Result<Balances> {
        let mut state = self.state.lock().await;
        if !can_spin(state.last_wheel_spin, now) {
            log::warn!("Refused second wheel reward today for {}", self.user_id);
            return Err(GameError::IneligibleSpin);
        }

        let spun_at = now.with_timezone(&Utc);
        let new_balance = state.balance.saturating_add(amount);

        self.ledger
            .update_balance_and_last_spin(&self.user_id, new_balance, spun_at)
            .await
            .inspect_err(|e| log::warn!("Wheel credit of {} for {} failed: {}", amount, self.user_id, e))?;

        state.balance = new_balance;
        state.last_wheel_spin = spun_at;
        Ok(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::LedgerError;
    use crate::ledger::{InMemoryIdentity, InMemoryLedger};

    fn setup(balance: u64, ledger: InMemoryLedger) -> (Arc<InMemoryLedger>, Arc<Account>) {
        let mut profile = UserProfile::registered("u1", "demo@example.com");
        profile.balance = balance;
        let ledger = Arc::new(ledger);
        ledger.insert(&profile);
        let account = Arc::new(Account::new(&profile, ledger.clone()));
        (ledger, account)
    }

    #[tokio::test]
    async fn test_debit_insufficient_balance() {
        let (ledger, account) = setup(5, InMemoryLedger::new());

        let err = account.debit(10).await.unwrap_err();
        assert!(matches!(err, GameError::InsufficientBalance { balance: 5, bet: 10 }));
        assert_eq!(account.balance().await, 5);
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_ledger_leaves_state() {
        let (ledger, account) = setup(100, InMemoryLedger::new());
        ledger.fail_next(2);

        let err = account.debit(10).await.unwrap_err();
        assert!(matches!(err, GameError::LedgerUnavailable(LedgerError::Unavailable(_))));
        let err = account.credit_winnings(50).await.unwrap_err();
        assert!(matches!(err, GameError::LedgerUnavailable(_)));

        let snapshot = account.snapshot().await;
        assert_eq!(snapshot.balance, 100);
        assert_eq!(snapshot.total_winnings, 0);
        assert_eq!(ledger.record("u1").unwrap().balance, 100);

        // Retry succeeds
        account.debit(10).await.unwrap();
        assert_eq!(account.balance().await, 90);
    }

    #[tokio::test]
    async fn test_concurrent_settlements_do_not_lose_updates() {
        let (ledger, account) = setup(100, InMemoryLedger::with_latency(Duration::from_millis(20)));

        let mut handles = Vec::new();
        for amount in [10u64, 20, 30, 40] {
            let account = account.clone();
            handles.push(tokio::spawn(async move { account.credit_winnings(amount).await }));
        }
        let debit = {
            let account = account.clone();
            tokio::spawn(async move { account.debit(5).await })
        };
        let spun_at = local("2026-10-19T12:00:00+00:00");
        let wheel = {
            let account = account.clone();
            tokio::spawn(async move { account.credit_wheel_reward(75, spun_at).await })
        };

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        debit.await.unwrap().unwrap();
        wheel.await.unwrap().unwrap();

        let snapshot = account.snapshot().await;
        assert_eq!(snapshot.balance, 100 + 10 + 20 + 30 + 40 - 5 + 75);
        // Wheel rewards are not slot winnings
        assert_eq!(snapshot.total_winnings, 100);
        assert_eq!(snapshot.last_wheel_spin, spun_at.with_timezone(&Utc));

        let record = ledger.record("u1").unwrap();
        assert_eq!(record.balance, snapshot.balance);
        assert_eq!(record.total_winnings, snapshot.total_winnings);
        assert_eq!(record.last_wheel_spin, snapshot.last_wheel_spin);
        assert_eq!(ledger.write_count(), 6);
    }

    fn local(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[tokio::test]
    async fn test_wheel_credit_stamps_spin() {
        let (ledger, account) = setup(100, InMemoryLedger::new());
        let now = local("2026-10-19T12:00:00+02:00");

        let balances = account.credit_wheel_reward(100, now).await.unwrap();
        assert_eq!(balances.balance, 200);
        assert_eq!(balances.last_wheel_spin, now.with_timezone(&Utc));
        assert_eq!(ledger.record("u1").unwrap().last_wheel_spin, now.with_timezone(&Utc));
    }

    #[tokio::test]
    async fn test_second_wheel_credit_same_day_refused() {
        let (ledger, account) = setup(100, InMemoryLedger::new());
        account.credit_wheel_reward(50, local("2026-10-19T08:00:00+00:00")).await.unwrap();

        let err = account
            .credit_wheel_reward(250, local("2026-10-19T23:30:00+00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::IneligibleSpin));
        assert_eq!(account.balance().await, 150);
        assert_eq!(ledger.write_count(), 1);

        // Next local day is fine again
        account.credit_wheel_reward(10, local("2026-10-20T00:01:00+00:00")).await.unwrap();
        assert_eq!(account.balance().await, 160);
    }

    #[tokio::test]
    async fn test_open_requires_user() {
        let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new());
        let identity = InMemoryIdentity::new();
        let err = Account::open(&identity, ledger.clone()).await.unwrap_err();
        assert!(matches!(err, GameError::NotSignedIn));

        identity.sign_in(UserProfile::registered("u9", "x@example.com"));
        let account = Account::open(&identity, ledger).await.unwrap();
        assert_eq!(account.user_id(), "u9");
        assert_eq!(account.balance().await, 150);
    }
}
