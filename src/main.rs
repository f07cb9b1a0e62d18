//! Peg Drop headless demo
//!
//! Signs in a demo user against the in-memory ledger, plays a short session,
//! spins the daily wheel and prints the resulting balances. Frames go to the
//! log at trace level (`RUST_LOG=peg_drop=trace`).
//!
//! Usage: `peg-drop [config.json]`

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use peg_drop::ledger::{IdentityProvider, InMemoryIdentity, InMemoryLedger, UserProfile};
use peg_drop::render::LogSink;
use peg_drop::session::run_session;
use peg_drop::stop::{StopSignal, stop_signal};
use peg_drop::wheel::SystemClock;
use peg_drop::{Account, GameConfig, GameError, GameSession, WheelSession};

/// Extra balls dropped while the loop runs
const EXTRA_DROPS: u32 = 4;
const DROP_INTERVAL: Duration = Duration::from_millis(400);
/// How long the board loop runs before it is cancelled
const PLAY_TIME: Duration = Duration::from_secs(4);

#[tokio::main]
async fn main() -> peg_drop::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Peg Drop (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let ledger = Arc::new(InMemoryLedger::new());
    let profile = UserProfile::registered("demo", "demo@example.com");
    ledger.insert(&profile);
    let identity = InMemoryIdentity::signed_in(profile);
    let account = Account::open(&identity, ledger.clone()).await?;

    // Board
    let mut session = GameSession::new(&config, account.clone())?;
    let seed = session.seed();
    session.start_game().await?;
    let session = Arc::new(Mutex::new(session));

    let (stop, signal) = stop_signal();
    let dropper = {
        let session = session.clone();
        tokio::spawn(async move {
            for _ in 0..EXTRA_DROPS {
                tokio::time::sleep(DROP_INTERVAL).await;
                if let Err(e) = session.lock().await.drop_ball().await {
                    log::warn!("Drop refused: {e}");
                    break;
                }
            }
            tokio::time::sleep(PLAY_TIME.saturating_sub(DROP_INTERVAL * EXTRA_DROPS)).await;
            stop.stop();
        })
    };

    let mut sink = LogSink;
    let settled = run_session(session.clone(), &mut sink, signal).await;
    dropper.abort();

    for s in &settled {
        log::info!(
            "Ball {} -> slot {} pays {}{}",
            s.ball_id,
            s.payout.slot,
            s.payout.winnings,
            if s.credited { "" } else { " (not credited)" }
        );
    }
    log::info!("Session score: {}", session.lock().await.score());

    // Wheel
    let mut wheel = WheelSession::new(config.wheel.clone(), account.clone(), Arc::new(SystemClock), seed.wrapping_add(1));
    match wheel.run(&mut sink, StopSignal::never()).await {
        Ok(Some(reward)) => log::info!("Wheel paid {reward}"),
        Ok(None) => {}
        Err(GameError::IneligibleSpin) => log::info!("Wheel already spun today"),
        Err(e) => log::warn!("Wheel spin failed: {e}"),
    }
    wheel.dismiss().await;

    let balances = account.snapshot().await;
    log::info!(
        "Final balance {} (total winnings {}, last spin {})",
        balances.balance,
        balances.total_winnings,
        balances.last_wheel_spin.format("%Y-%m-%d")
    );

    identity.sign_out().await;
    Ok(())
}
