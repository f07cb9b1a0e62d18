//! Peg Drop - a peg-field payout game with a daily reward wheel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (peg field, ball physics, collisions)
//! - `payout`: Slot lookup and randomized multiplier payouts
//! - `session`: Session controller and cancellable tick loop
//! - `wheel`: Daily reward wheel (eligibility, spin animation, settlement)
//! - `account`: Per-user serialized settlement against the ledger
//! - `ledger`: External ledger and identity contracts
//! - `config`: Data-driven game tuning

pub mod account;
pub mod audio;
pub mod config;
pub mod error;
pub mod ledger;
pub mod payout;
pub mod render;
pub mod session;
pub mod sim;
pub mod stop;
pub mod wheel;

pub use account::{Account, Balances};
pub use config::{BoardConfig, GameConfig, PayoutConfig, WheelConfig};
pub use error::{ConfigError, GameError, LedgerError, Result};
pub use session::{GameSession, SessionPhase};
pub use wheel::{WheelEngine, WheelPhase, WheelSession};

use glam::Vec2;

/// Reference game constants (defaults for [`GameConfig`])
pub mod consts {
    /// Logical simulation rate (ticks per second)
    pub const TICK_HZ: u32 = 60;

    /// Play field dimensions
    pub const CANVAS_WIDTH: f32 = 400.0;
    pub const CANVAS_HEIGHT: f32 = 600.0;
    /// Height of the slot band along the bottom edge
    pub const SLOT_BAND_HEIGHT: f32 = 20.0;

    /// Peg lattice
    pub const PEG_ROWS: u32 = 10;
    pub const PEG_COLS: u32 = 8;
    /// Largest lattice a config may ask for, per axis
    pub const MAX_PEG_GRID: u32 = 1024;
    pub const PEG_RADIUS: f32 = 4.0;
    pub const PEG_TOP_MARGIN: f32 = 60.0;
    pub const PEG_ROW_SPACING: f32 = 50.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 5.0;
    pub const BALL_SPAWN_Y: f32 = 20.0;
    /// Spawn vx is drawn from [-SPREAD, SPREAD)
    pub const BALL_SPAWN_VX_SPREAD: f32 = 1.0;

    /// Per-tick physics (pixels/tick, pixels/tick²)
    pub const GRAVITY: f32 = 0.3;
    pub const FRICTION: f32 = 0.99;
    pub const BOUNCE: f32 = 0.8;
    /// Speed a ball leaves a peg with
    pub const PEG_KICK_SPEED: f32 = 4.0;

    /// Ticks a landed ball stays on screen before removal (half a second)
    pub const LANDED_GRACE_TICKS: u32 = 30;

    /// Payout table
    pub const SLOT_MULTIPLIERS: [f32; 9] = [0.0, 0.5, 0.8, 3.0, 0.2, 3.0, 0.8, 0.5, 10.0];
    pub const PAYOUT_VARIANCE: f32 = 0.2;
    pub const MAX_BET: u64 = 100;

    /// Reward wheel
    pub const WHEEL_REWARDS: [u64; 8] = [25, 50, 10, 75, 30, 100, 20, 250];
    pub const SPIN_DURATION_MS: u32 = 2000;
    pub const SPIN_ROTATIONS: u32 = 8;
    pub const POINTER_OFFSET_DEG: f32 = 10.0;
    pub const SPIN_CLICKS: u32 = 25;
    pub const FRAME_HZ: u32 = 60;

    /// Profile defaults for newly registered users
    pub const STARTING_BALANCE: u64 = 150;
}

/// Unit vector at `angle` scaled to `r`
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Cubic ease-out on [0, 1]: fast start, decelerating finish
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Wrap degrees into [0, 360)
#[inline]
pub fn normalize_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(2.0), 1.0);
        // Front-loaded: more than half the distance covered at half time
        assert!(ease_out_cubic(0.5) > 0.8);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-10.0), 350.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
    }

    #[test]
    fn test_polar_to_cartesian() {
        let v = polar_to_cartesian(2.0, std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 2.0).abs() < 1e-5);
    }
}
