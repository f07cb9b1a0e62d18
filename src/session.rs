//! Session controller
//!
//! Owns the board, the payout table and the session RNG for one player.
//! Every bet is debited through the [`Account`] before its ball exists, and
//! every landing is credited back through it, so the session never shows a
//! balance the ledger has not acknowledged.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{MissedTickBehavior, interval};

use crate::account::Account;
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::payout::{Payout, PayoutTable, slot_for_x};
use crate::render::{BoardFrame, FrameSink};
use crate::sim::{self, Board, SimEvent};
use crate::stop::StopSignal;

/// Upper bound on headless ticks when resolving balls without rendering
/// (one minute of simulated time)
const MAX_FAST_FORWARD_TICKS: u32 = 3600;

const DEFAULT_BET: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Running,
}

/// A landed ball and what it paid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Settlement {
    pub ball_id: u32,
    pub payout: Payout,
    /// False when the ledger refused the credit
    pub credited: bool,
}

#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    board: Board,
    table: PayoutTable,
    account: Arc<Account>,
    rng: Pcg32,
    seed: u64,
    phase: SessionPhase,
    /// Winnings credited since the last `start_game`
    score: u64,
    bet_amount: u64,
    /// Bet debited for each ball still on the board
    stakes: HashMap<u32, u64>,
}

impl GameSession {
    pub fn new(config: &GameConfig, account: Arc<Account>) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        log::info!("New session for {} (seed {})", account.email(), seed);

        Ok(Self {
            board: Board::new(&config.board),
            table: PayoutTable::new(&config.payout),
            config: config.clone(),
            account,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            phase: SessionPhase::Idle,
            score: 0,
            bet_amount: DEFAULT_BET.min(config.payout.max_bet),
            stakes: HashMap::new(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn bet_amount(&self) -> u64 {
        self.bet_amount
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn account(&self) -> &Arc<Account> {
        &self.account
    }

    /// Largest bet currently allowed: the configured cap or the balance
    pub async fn max_bet(&self) -> u64 {
        self.config.payout.max_bet.min(self.account.balance().await)
    }

    pub async fn set_bet_amount(&mut self, bet: u64) -> Result<()> {
        let max = self.max_bet().await;
        if bet == 0 || bet > max {
            return Err(GameError::InvalidBetAmount { bet, max });
        }
        self.bet_amount = bet;
        Ok(())
    }

    /// Debit the first bet, reset the score and drop the first ball.
    ///
    /// Nothing changes unless the debit is acknowledged.
    pub async fn start_game(&mut self) -> Result<u32> {
        let bet = self.place_bet().await?;
        self.score = 0;
        self.phase = SessionPhase::Running;
        log::info!("Game started for {} (bet {})", self.account.email(), bet);
        Ok(self.spawn_ball(bet))
    }

    /// Debit one bet and drop another ball
    pub async fn drop_ball(&mut self) -> Result<u32> {
        if self.phase == SessionPhase::Idle {
            return Err(GameError::SessionIdle);
        }
        let bet = self.place_bet().await?;
        Ok(self.spawn_ball(bet))
    }

    async fn place_bet(&mut self) -> Result<u64> {
        let bet = self.bet_amount;
        let cap = self.config.payout.max_bet;
        if bet == 0 || bet > cap {
            return Err(GameError::InvalidBetAmount { bet, max: cap });
        }
        self.account.debit(bet).await?;
        Ok(bet)
    }

    fn spawn_ball(&mut self, bet: u64) -> u32 {
        let cfg = &self.config.board;
        let spread = cfg.spawn_vx_spread;
        let vx = if spread > 0.0 {
            self.rng.random_range(-spread..spread)
        } else {
            0.0
        };

        let pos = Vec2::new(cfg.width / 2.0, cfg.spawn_y);
        let id = self.board.spawn_ball(pos, Vec2::new(vx, 0.0), cfg.ball_radius);
        self.stakes.insert(id, bet);
        log::debug!("Ball {} dropped (bet {}, vx {:.2})", id, bet, vx);
        id
    }

    /// Advance the board one tick and settle whatever landed
    pub async fn tick(&mut self) -> Vec<Settlement> {
        let events = sim::tick(&mut self.board, &self.config.board, self.table.slot_count());
        self.settle_events(events).await
    }

    async fn settle_events(&mut self, events: Vec<SimEvent>) -> Vec<Settlement> {
        let mut settled = Vec::new();
        for event in events {
            let SimEvent::BallLanded { ball_id, slot, .. } = event else {
                continue;
            };
            let Some(bet) = self.stakes.remove(&ball_id) else {
                continue;
            };

            let payout = self.table.resolve(slot, bet, &mut self.rng);
            let credited = match self.account.credit_winnings(payout.winnings).await {
                Ok(_) => {
                    self.score += payout.winnings;
                    true
                }
                Err(e) => {
                    log::warn!("Ball {} paid {} but was not credited: {}", ball_id, payout.winnings, e);
                    false
                }
            };
            log::debug!(
                "Ball {} landed in slot {} ({:.2}x{:+.2}) paying {}",
                ball_id,
                slot,
                payout.multiplier,
                payout.variance,
                payout.winnings
            );

            settled.push(Settlement {
                ball_id,
                payout,
                credited,
            });
        }
        settled
    }

    /// Stop taking drops and resolve every ball still in flight
    pub async fn finish_game(&mut self) -> Vec<Settlement> {
        self.phase = SessionPhase::Idle;
        let settled = self.settle_in_flight().await;
        log::info!("Game finished for {} (score {})", self.account.email(), self.score);
        settled
    }

    /// Fast-forward in-flight balls to the floor without rendering.
    ///
    /// A ball still trapped after the tick limit is landed where it is.
    pub async fn settle_in_flight(&mut self) -> Vec<Settlement> {
        let cfg = &self.config.board;
        let slot_count = self.table.slot_count();
        let mut events = sim::run_until_landed(&mut self.board, cfg, slot_count, MAX_FAST_FORWARD_TICKS);

        let floor = cfg.floor_y();
        for ball in self.board.balls.iter_mut().filter(|b| !b.landed()) {
            let slot = slot_for_x(ball.pos.x, cfg.width, slot_count);
            if ball.land(slot, floor) {
                log::warn!("Ball {} stuck at ({:.1}, {:.1}), landed in slot {}", ball.id, ball.pos.x, ball.pos.y, slot);
                events.push(SimEvent::BallLanded {
                    ball_id: ball.id,
                    x: ball.pos.x,
                    slot,
                });
            }
        }

        self.settle_events(events).await
    }

    pub fn reset_score(&mut self) {
        self.score = 0;
    }

    pub fn frame(&self) -> BoardFrame {
        BoardFrame::capture(&self.board, &self.config.board, &self.table, self.score)
    }
}

/// Tick a shared session at its configured rate until it goes idle or
/// `stop` fires.
///
/// The session lock is taken per tick, so drops can be issued from another
/// task between ticks. On cancellation the game is finished, which settles
/// every ball still in flight. Returns every settlement the loop made.
pub async fn run_session(
    session: Arc<Mutex<GameSession>>,
    sink: &mut dyn FrameSink,
    mut stop: StopSignal,
) -> Vec<Settlement> {
    let period = session.lock().await.config.board.tick_duration();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut settled = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = stop.stopped() => {
                let mut session = session.lock().await;
                settled.extend(session.finish_game().await);
                sink.present_board(&session.frame());
                break;
            }
            _ = ticker.tick() => {}
        }

        let mut session = session.lock().await;
        if session.phase() == SessionPhase::Idle {
            break;
        }
        settled.extend(session.tick().await);
        sink.present_board(&session.frame());
    }

    settled
}
