//! Spin animation and reward resolution
//!
//! `WheelEngine` is a synchronous state machine driven by frame deltas. It
//! knows nothing about the ledger: the driver reports whether settlement of a
//! resolved spin succeeded via [`WheelEngine::confirm`] or
//! [`WheelEngine::abandon`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::ClickSchedule;
use crate::config::WheelConfig;
use crate::error::{GameError, Result};
use crate::{ease_out_cubic, normalize_degrees};

/// Wheel lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelPhase {
    /// Already spun today
    Locked,
    /// Spin available
    Ready,
    /// Animation running (or its reward awaiting settlement)
    Spinning,
    /// Reward credited and on display until dismissed
    Resolved,
}

/// Reward picked at the end of a spin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelOutcome {
    pub index: usize,
    pub reward: u64,
    pub final_rotation: f32,
}

/// Result of advancing the animation by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinStep {
    pub rotation: f32,
    pub clicks: u32,
    /// Set on the frame the animation ends
    pub outcome: Option<WheelOutcome>,
}

#[derive(Debug, Clone)]
struct ActiveSpin {
    elapsed_ms: f32,
    clicks: ClickSchedule,
}

/// Rotation that leaves the pointer inside segment `index`.
///
/// Equal (mod 360) to `-index * segment - pointer_offset` past the full
/// turns, but expressed as a positive offset so the wheel never turns back.
pub fn final_rotation(config: &WheelConfig, index: usize) -> f32 {
    let offset = -(index as f32) * config.segment_degrees() - config.pointer_offset_deg;
    config.base_rotation() + normalize_degrees(offset)
}

/// Segment under the pointer for a given rotation
pub fn index_for_rotation(config: &WheelConfig, rotation: f32) -> usize {
    let n = config.rewards.len().max(1);
    let angle = normalize_degrees(-rotation - config.pointer_offset_deg);
    (angle / config.segment_degrees()).round() as usize % n
}

#[derive(Debug, Clone)]
pub struct WheelEngine {
    config: WheelConfig,
    rng: Pcg32,
    rotation: f32,
    spin: Option<ActiveSpin>,
    /// Resolved by the animation, not yet settled
    pending: Option<WheelOutcome>,
    /// Settled reward on display
    resolved: Option<WheelOutcome>,
}

impl WheelEngine {
    pub fn new(config: WheelConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            rotation: 0.0,
            spin: None,
            pending: None,
            resolved: None,
        }
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// Current phase, given today's eligibility
    pub fn phase(&self, eligible: bool) -> WheelPhase {
        if self.spin.is_some() || self.pending.is_some() {
            WheelPhase::Spinning
        } else if self.resolved.is_some() {
            WheelPhase::Resolved
        } else if eligible {
            WheelPhase::Ready
        } else {
            WheelPhase::Locked
        }
    }

    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Reward on display (after settlement)
    pub fn resolved_reward(&self) -> Option<u64> {
        self.resolved.map(|o| o.reward)
    }

    pub fn resolved_outcome(&self) -> Option<WheelOutcome> {
        self.resolved
    }

    /// Start a spin. Only valid from `Ready`.
    pub fn spin(&mut self, eligible: bool) -> Result<()> {
        match self.phase(eligible) {
            WheelPhase::Ready => {}
            WheelPhase::Locked => return Err(GameError::IneligibleSpin),
            WheelPhase::Spinning | WheelPhase::Resolved => return Err(GameError::SpinInProgress),
        }

        self.rotation = 0.0;
        self.spin = Some(ActiveSpin {
            elapsed_ms: 0.0,
            clicks: ClickSchedule::new(self.config.clicks, self.config.spin_duration_ms as f32),
        });
        log::debug!("Wheel spin started");
        Ok(())
    }

    /// Advance the animation by `dt_ms`.
    ///
    /// The reward is drawn on the frame that reaches the full duration, and
    /// the final rotation is derived from the same index.
    pub fn advance(&mut self, dt_ms: f32) -> SpinStep {
        let duration = self.config.spin_duration_ms as f32;
        let Some(spin) = self.spin.as_mut() else {
            return SpinStep {
                rotation: self.rotation,
                clicks: 0,
                outcome: None,
            };
        };

        let from = spin.elapsed_ms;
        spin.elapsed_ms += dt_ms.max(0.0);
        let to = spin.elapsed_ms;
        let clicks = spin.clicks.due_between(from, to);

        if to < duration {
            let eased = ease_out_cubic(to / duration) * self.config.base_rotation();
            // Guard against float wobble; rotation never goes backwards mid-spin
            self.rotation = self.rotation.max(eased);
            return SpinStep {
                rotation: self.rotation,
                clicks,
                outcome: None,
            };
        }

        let index = self.rng.random_range(0..self.config.rewards.len());
        let outcome = WheelOutcome {
            index,
            reward: self.config.rewards[index],
            final_rotation: final_rotation(&self.config, index),
        };
        self.rotation = outcome.final_rotation;
        self.spin = None;
        self.pending = Some(outcome);

        SpinStep {
            rotation: self.rotation,
            clicks,
            outcome: Some(outcome),
        }
    }

    /// Settlement acknowledged: show the reward
    pub fn confirm(&mut self) -> Option<WheelOutcome> {
        let outcome = self.pending.take()?;
        self.resolved = Some(outcome);
        log::info!("Wheel resolved: segment {} pays {}", outcome.index, outcome.reward);
        Some(outcome)
    }

    /// Drop the current spin (cancelled, or settlement failed). Nothing is
    /// shown and the wheel goes back to its eligibility-derived phase.
    pub fn abandon(&mut self) {
        let dropped = self.spin.take().is_some() | self.pending.take().is_some();
        if dropped {
            log::debug!("Wheel spin abandoned");
        }
        self.rotation = 0.0;
    }

    /// Clear a displayed reward. Returns false outside `Resolved`.
    pub fn dismiss(&mut self) -> bool {
        self.resolved.take().is_some()
    }
}
