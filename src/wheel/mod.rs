//! Daily reward wheel
//!
//! [`WheelEngine`] owns the animation and reward draw; [`WheelSession`]
//! drives it frame by frame, checks eligibility against a [`Clock`] and
//! settles the reward through the shared [`Account`].

pub mod eligibility;
pub mod engine;

pub use eligibility::{Clock, FixedClock, SystemClock, can_spin};
pub use engine::{SpinStep, WheelEngine, WheelOutcome, WheelPhase, final_rotation, index_for_rotation};

use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval};

use crate::account::Account;
use crate::config::WheelConfig;
use crate::error::Result;
use crate::render::{FrameSink, WheelFrame};
use crate::stop::StopSignal;

/// Wheel screen for one signed-in user
pub struct WheelSession {
    engine: WheelEngine,
    account: Arc<Account>,
    clock: Arc<dyn Clock>,
}

impl WheelSession {
    pub fn new(config: WheelConfig, account: Arc<Account>, clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self {
            engine: WheelEngine::new(config, seed),
            account,
            clock,
        }
    }

    pub fn engine(&self) -> &WheelEngine {
        &self.engine
    }

    /// Eligibility, recomputed from the acknowledged last spin on every call
    pub async fn can_spin(&self) -> bool {
        let last = self.account.snapshot().await.last_wheel_spin;
        can_spin(last, self.clock.now())
    }

    pub async fn phase(&self) -> WheelPhase {
        let eligible = self.can_spin().await;
        self.engine.phase(eligible)
    }

    pub async fn spin(&mut self) -> Result<()> {
        let eligible = self.can_spin().await;
        self.engine.spin(eligible)
    }

    /// Advance the animation by `dt_ms` and settle the reward on the frame
    /// it resolves.
    ///
    /// A failed settlement drops the spin: nothing is displayed and the
    /// wheel stays spinnable.
    pub async fn advance(&mut self, dt_ms: f32) -> Result<WheelFrame> {
        let step = self.engine.advance(dt_ms);

        if let Some(outcome) = step.outcome {
            if let Err(e) = self.account.credit_wheel_reward(outcome.reward, self.clock.now()).await {
                self.engine.abandon();
                return Err(e);
            }
            self.engine.confirm();
        }

        Ok(WheelFrame {
            phase: self.phase().await,
            rotation_degrees: step.rotation,
            clicks: step.clicks,
            reward: self.engine.resolved_reward(),
        })
    }

    /// Clear the displayed reward, returning the phase the wheel falls back to
    pub async fn dismiss(&mut self) -> WheelPhase {
        self.engine.dismiss();
        self.phase().await
    }

    /// Leave the wheel screen. An unresolved spin is dropped unsettled.
    pub fn cancel(&mut self) {
        self.engine.abandon();
    }

    /// Spin and animate until the reward is settled.
    ///
    /// Returns the credited reward, or `None` if `stop` fired first. Time
    /// advances by one logical frame per interval tick.
    pub async fn run(&mut self, sink: &mut dyn FrameSink, mut stop: StopSignal) -> Result<Option<u64>> {
        self.spin().await?;

        let frame_ms = 1000.0 / self.engine.config().frame_hz.max(1) as f32;
        let mut ticker = interval(self.engine.config().frame_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => {
                    log::info!("Wheel screen closed mid-spin");
                    self.cancel();
                    return Ok(None);
                }
                _ = ticker.tick() => {}
            }

            let frame = self.advance(frame_ms).await?;
            sink.present_wheel(&frame);
            if frame.phase != WheelPhase::Spinning {
                return Ok(frame.reward);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, FixedOffset, Utc};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use super::*;
    use crate::error::GameError;
    use crate::ledger::{InMemoryLedger, UserProfile, never_spun};
    use crate::render::RecordingSink;
    use crate::stop::stop_signal;

    const NOW: &str = "2026-10-19T12:00:00+00:00";

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(NOW).unwrap()
    }

    fn setup(seed: u64) -> (Arc<InMemoryLedger>, Arc<Account>, WheelSession) {
        let mut profile = UserProfile::registered("u1", "demo@example.com");
        profile.balance = 40;
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.insert(&profile);
        let account = Arc::new(Account::new(&profile, ledger.clone()));
        let clock = Arc::new(FixedClock::new(now()));
        let session = WheelSession::new(WheelConfig::default(), account.clone(), clock, seed);
        (ledger, account, session)
    }

    /// First seed whose first reward draw lands on `index`
    fn seed_for_index(index: usize) -> u64 {
        (0u64..)
            .find(|s| Pcg32::seed_from_u64(*s).random_range(0..8usize) == index)
            .unwrap()
    }

    async fn drive(session: &mut WheelSession) -> Result<WheelFrame> {
        loop {
            let frame = session.advance(1000.0 / 60.0).await?;
            if frame.phase != WheelPhase::Spinning {
                return Ok(frame);
            }
        }
    }

    #[tokio::test]
    async fn test_reward_index_five_scenario() {
        let (ledger, account, mut session) = setup(seed_for_index(5));
        assert_eq!(account.snapshot().await.last_wheel_spin, never_spun());
        assert!(session.can_spin().await);

        session.spin().await.unwrap();
        let frame = drive(&mut session).await.unwrap();

        assert_eq!(frame.phase, WheelPhase::Resolved);
        assert_eq!(frame.reward, Some(100));
        assert_eq!(index_for_rotation(session.engine().config(), frame.rotation_degrees), 5);

        let balances = account.snapshot().await;
        assert_eq!(balances.balance, 140);
        assert_eq!(balances.last_wheel_spin, now().with_timezone(&Utc));
        assert_eq!(ledger.record("u1").unwrap().balance, 140);

        assert!(!session.can_spin().await);
        assert_eq!(session.dismiss().await, WheelPhase::Locked);
        assert!(matches!(session.spin().await, Err(GameError::IneligibleSpin)));
    }

    #[tokio::test]
    async fn test_failed_settlement_keeps_wheel_ready() {
        let (ledger, account, mut session) = setup(11);
        session.spin().await.unwrap();
        ledger.fail_next(1);

        let err = drive(&mut session).await.unwrap_err();
        assert!(matches!(err, GameError::LedgerUnavailable(_)));

        assert_eq!(session.phase().await, WheelPhase::Ready);
        assert_eq!(session.engine().resolved_reward(), None);
        let balances = account.snapshot().await;
        assert_eq!(balances.balance, 40);
        assert_eq!(balances.last_wheel_spin, never_spun());
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_to_resolution() {
        let (_, account, mut session) = setup(3);
        let mut sink = RecordingSink::default();

        let reward = session.run(&mut sink, StopSignal::never()).await.unwrap();

        let reward = reward.unwrap();
        assert_eq!(account.balance().await, 40 + reward);
        let last = sink.wheels.last().unwrap();
        assert_eq!(last.phase, WheelPhase::Resolved);
        assert_eq!(last.reward, Some(reward));
        assert_eq!(sink.wheels.iter().map(|f| f.clicks).sum::<u32>(), 25);
        assert!(sink.wheels.iter().rev().skip(1).all(|f| f.reward.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_spin_settles_nothing() {
        let (ledger, account, mut session) = setup(3);
        let mut sink = RecordingSink::default();
        let (handle, signal) = stop_signal();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            handle.stop();
        });

        let reward = session.run(&mut sink, signal).await.unwrap();
        assert_eq!(reward, None);
        assert!(!sink.wheels.is_empty());
        assert!(sink.wheels.iter().all(|f| f.phase == WheelPhase::Spinning));

        assert_eq!(session.phase().await, WheelPhase::Ready);
        assert_eq!(account.balance().await, 40);
        assert_eq!(ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn test_two_screens_same_day_pay_once() {
        let (ledger, account, mut first) = setup(3);
        let clock = Arc::new(FixedClock::new(now()));
        let mut second = WheelSession::new(WheelConfig::default(), account.clone(), clock, 9);

        // Both start while the day is still unspun
        first.spin().await.unwrap();
        second.spin().await.unwrap();

        let paid = drive(&mut first).await.unwrap().reward.unwrap();
        let err = drive(&mut second).await.unwrap_err();
        assert!(matches!(err, GameError::IneligibleSpin));

        assert_eq!(account.balance().await, 40 + paid);
        assert_eq!(ledger.write_count(), 1);
        assert_eq!(second.engine().resolved_reward(), None);
        assert_eq!(second.phase().await, WheelPhase::Locked);
    }

    #[tokio::test]
    async fn test_locked_wheel_refuses_spin() {
        let (_, account, mut session) = setup(1);
        account.credit_wheel_reward(0, now()).await.unwrap();

        assert_eq!(session.phase().await, WheelPhase::Locked);
        let mut sink = RecordingSink::default();
        let err = session.run(&mut sink, StopSignal::never()).await.unwrap_err();
        assert!(matches!(err, GameError::IneligibleSpin));
        assert!(sink.wheels.is_empty());
    }
}
