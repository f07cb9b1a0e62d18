//! Spin click timing
//!
//! The wheel emits a burst of short clicks while it turns. Click intervals
//! shrink with the square of spin progress, so clicks bunch up toward the
//! moment the reward resolves. Timing is purely cosmetic; it never feeds back
//! into the reward.

/// Interval shrink at the end of the burst (last interval is 20% of the first)
const INTERVAL_SHRINK: f32 = 0.8;

/// Precomputed click times for one spin
#[derive(Debug, Clone, PartialEq)]
pub struct ClickSchedule {
    /// Click offsets from spin start, ascending (ms)
    offsets_ms: Vec<f32>,
}

impl ClickSchedule {
    /// Spread `clicks` across `duration_ms`; the final click lands on the
    /// last frame of the spin
    pub fn new(clicks: u32, duration_ms: f32) -> Self {
        if clicks == 0 || duration_ms <= 0.0 {
            return Self {
                offsets_ms: Vec::new(),
            };
        }

        let n = clicks as f32;
        let weights: Vec<f32> = (0..clicks)
            .map(|i| {
                let progress = i as f32 / n;
                1.0 - INTERVAL_SHRINK * progress * progress
            })
            .collect();
        let scale = duration_ms / weights.iter().sum::<f32>();

        let mut elapsed = 0.0;
        let mut offsets_ms: Vec<f32> = weights
            .iter()
            .map(|w| {
                elapsed += w * scale;
                elapsed
            })
            .collect();
        // Absorb float drift so the last click is exactly on time
        if let Some(last) = offsets_ms.last_mut() {
            *last = duration_ms;
        }

        Self { offsets_ms }
    }

    pub fn offsets(&self) -> &[f32] {
        &self.offsets_ms
    }

    pub fn len(&self) -> usize {
        self.offsets_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets_ms.is_empty()
    }

    /// Clicks due in the window `(from_ms, to_ms]`
    pub fn due_between(&self, from_ms: f32, to_ms: f32) -> u32 {
        self.offsets_ms
            .iter()
            .filter(|&&t| t > from_ms && t <= to_ms)
            .count() as u32
    }
}
