//! Slot payouts
//!
//! A landing x-coordinate maps to a slot, the slot to a base multiplier, and
//! the multiplier gets a symmetric random nudge before being applied to the
//! bet. The multiplier table is configuration; nothing here assumes a
//! particular return-to-player.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PayoutConfig;

/// Outcome of one ball landing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub slot: usize,
    /// Base multiplier from the table
    pub multiplier: f32,
    /// Random variance added to the multiplier
    pub variance: f32,
    pub bet: u64,
    pub winnings: u64,
}

/// Slot index for a landing x, clamped into `[0, slot_count)`
pub fn slot_for_x(x: f32, width: f32, slot_count: usize) -> usize {
    if slot_count == 0 || width <= 0.0 || !x.is_finite() {
        return 0;
    }
    let raw = (x / width * slot_count as f32).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(slot_count - 1)
    }
}

/// Winnings for `bet` at `multiplier + variance`, floored at zero and rounded
pub fn winnings_for(bet: u64, multiplier: f32, variance: f32) -> u64 {
    let effective = (multiplier + variance).max(0.0);
    (bet as f64 * f64::from(effective)).round() as u64
}

/// Maps slots to multipliers and rolls variance
#[derive(Debug, Clone)]
pub struct PayoutTable {
    multipliers: Vec<f32>,
    variance: f32,
}

impl PayoutTable {
    pub fn new(config: &PayoutConfig) -> Self {
        Self {
            multipliers: config.multipliers.clone(),
            variance: config.variance.max(0.0),
        }
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.multipliers.len()
    }

    /// Base multiplier for a slot (out-of-range slots clamp to the edge)
    pub fn multiplier(&self, slot: usize) -> f32 {
        let idx = slot.min(self.multipliers.len().saturating_sub(1));
        self.multipliers.get(idx).copied().unwrap_or(0.0)
    }

    pub fn multipliers(&self) -> &[f32] {
        &self.multipliers
    }

    /// Draw a variance from `[-variance, variance)`
    pub fn roll_variance<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.variance <= 0.0 {
            return 0.0;
        }
        rng.random_range(-self.variance..self.variance)
    }

    /// Resolve a payout with an explicit variance
    pub fn resolve_with_variance(&self, slot: usize, bet: u64, variance: f32) -> Payout {
        let multiplier = self.multiplier(slot);
        Payout {
            slot,
            multiplier,
            variance,
            bet,
            winnings: winnings_for(bet, multiplier, variance),
        }
    }

    /// Resolve a payout, rolling variance from `rng`
    pub fn resolve<R: Rng + ?Sized>(&self, slot: usize, bet: u64, rng: &mut R) -> Payout {
        let variance = self.roll_variance(rng);
        self.resolve_with_variance(slot, bet, variance)
    }
}
