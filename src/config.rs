//! Game configuration
//!
//! All tuning is data: the defaults reproduce the reference game, and any
//! field can be overridden from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// How a ball overlapping several pegs in one tick is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PegResolution {
    /// Pegs are applied in iteration order; the last overlap wins
    #[default]
    LastWins,
    /// Contact directions of all overlapping pegs are averaged
    Averaged,
}

impl PegResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            PegResolution::LastWins => "last_wins",
            PegResolution::Averaged => "averaged",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "last_wins" | "last" => Some(PegResolution::LastWins),
            "averaged" | "average" => Some(PegResolution::Averaged),
            _ => None,
        }
    }
}

/// Play field and physics tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: f32,
    pub height: f32,
    pub slot_band_height: f32,

    pub peg_rows: u32,
    pub peg_cols: u32,
    pub peg_radius: f32,
    pub peg_top_margin: f32,
    pub peg_row_spacing: f32,

    pub ball_radius: f32,
    pub spawn_y: f32,
    pub spawn_vx_spread: f32,

    // === Per-tick physics ===
    pub gravity: f32,
    pub friction: f32,
    pub bounce: f32,
    pub peg_kick_speed: f32,
    pub peg_resolution: PegResolution,

    pub landed_grace_ticks: u32,
    pub tick_hz: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
            slot_band_height: SLOT_BAND_HEIGHT,

            peg_rows: PEG_ROWS,
            peg_cols: PEG_COLS,
            peg_radius: PEG_RADIUS,
            peg_top_margin: PEG_TOP_MARGIN,
            peg_row_spacing: PEG_ROW_SPACING,

            ball_radius: BALL_RADIUS,
            spawn_y: BALL_SPAWN_Y,
            spawn_vx_spread: BALL_SPAWN_VX_SPREAD,

            gravity: GRAVITY,
            friction: FRICTION,
            bounce: BOUNCE,
            peg_kick_speed: PEG_KICK_SPEED,
            peg_resolution: PegResolution::LastWins,

            landed_grace_ticks: LANDED_GRACE_TICKS,
            tick_hz: TICK_HZ,
        }
    }
}

impl BoardConfig {
    /// Y coordinate a ball's lower edge lands on
    #[inline]
    pub fn floor_y(&self) -> f32 {
        self.height - self.slot_band_height
    }

    /// Wall-clock length of one tick
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}

/// Slot payout tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutConfig {
    /// One multiplier per slot, left to right
    pub multipliers: Vec<f32>,
    /// Variance is drawn uniformly from [-variance, variance)
    pub variance: f32,
    pub max_bet: u64,
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            multipliers: SLOT_MULTIPLIERS.to_vec(),
            variance: PAYOUT_VARIANCE,
            max_bet: MAX_BET,
        }
    }
}

impl PayoutConfig {
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.multipliers.len()
    }
}

/// Reward wheel tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// One reward per wheel segment, clockwise from the top
    pub rewards: Vec<u64>,
    pub spin_duration_ms: u32,
    /// Full turns covered by the eased animation
    pub rotations: u32,
    /// Angular nudge so the pointer sits inside a segment, not on a border
    pub pointer_offset_deg: f32,
    pub clicks: u32,
    pub frame_hz: u32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            rewards: WHEEL_REWARDS.to_vec(),
            spin_duration_ms: SPIN_DURATION_MS,
            rotations: SPIN_ROTATIONS,
            pointer_offset_deg: POINTER_OFFSET_DEG,
            clicks: SPIN_CLICKS,
            frame_hz: FRAME_HZ,
        }
    }
}

impl WheelConfig {
    /// Angular width of one segment in degrees
    #[inline]
    pub fn segment_degrees(&self) -> f32 {
        360.0 / self.rewards.len().max(1) as f32
    }

    /// Rotation reached by the eased animation at t = duration
    #[inline]
    pub fn base_rotation(&self) -> f32 {
        360.0 * self.rotations as f32
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_hz.max(1)))
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub payout: PayoutConfig,
    pub wheel: WheelConfig,
    /// Fixed RNG seed; `None` draws one per session
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the engines cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.board;
        if b.width <= 0.0 || b.height <= 0.0 {
            return Err(invalid("board dimensions must be positive"));
        }
        if b.slot_band_height < 0.0 || b.slot_band_height >= b.height {
            return Err(invalid("slot band must fit inside the board"));
        }
        if b.ball_radius <= 0.0 || b.peg_radius < 0.0 {
            return Err(invalid("radii must be positive"));
        }
        if b.ball_radius * 2.0 >= b.width {
            return Err(invalid("ball does not fit between the walls"));
        }
        if b.tick_hz == 0 {
            return Err(invalid("tick rate must be non-zero"));
        }
        if b.peg_rows > MAX_PEG_GRID || b.peg_cols > MAX_PEG_GRID {
            return Err(invalid("peg lattice is too large"));
        }
        if !(0.0..=1.0).contains(&b.friction) || !(0.0..=1.0).contains(&b.bounce) {
            return Err(invalid("friction and bounce must lie in [0, 1]"));
        }

        let p = &self.payout;
        if p.multipliers.is_empty() {
            return Err(invalid("multiplier table is empty"));
        }
        if p.multipliers.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(invalid("multipliers must be finite and non-negative"));
        }
        if !p.variance.is_finite() || p.variance < 0.0 {
            return Err(invalid("payout variance must be non-negative"));
        }
        if p.max_bet == 0 {
            return Err(invalid("max bet must be positive"));
        }

        let w = &self.wheel;
        if w.rewards.is_empty() {
            return Err(invalid("reward table is empty"));
        }
        if 360 % w.rewards.len() != 0 {
            return Err(invalid("reward count must divide the wheel evenly"));
        }
        if w.spin_duration_ms == 0 || w.frame_hz == 0 {
            return Err(invalid("spin duration and frame rate must be non-zero"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}
