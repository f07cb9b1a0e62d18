//! Peg field generation
//!
//! The field is a staggered lattice: even rows hold `cols` pegs, odd rows hold
//! `cols + 1` pegs shifted by half the horizontal spacing. It is built once
//! per session and never mutated, so balls in flight never see pegs move.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::BoardConfig;

/// A single fixed peg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peg {
    pub pos: Vec2,
}

/// Immutable peg layout for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PegField {
    pegs: Vec<Peg>,
    radius: f32,
}

impl PegField {
    /// Build the staggered lattice for `rows` x `cols` across `width`
    pub fn generate(rows: u32, cols: u32, width: f32, top_margin: f32, row_spacing: f32) -> Vec<Peg> {
        let spacing = width / (cols as f32 + 1.0);
        let mut pegs = Vec::with_capacity((rows as usize).saturating_mul(cols as usize + 1));

        for row in 0..rows {
            let odd = row % 2 == 1;
            let count = cols + u32::from(odd);
            let offset = if odd { spacing / 2.0 } else { 0.0 };
            let y = top_margin + row as f32 * row_spacing;

            for col in 0..count {
                pegs.push(Peg {
                    pos: Vec2::new(offset + (col as f32 + 0.5) * spacing, y),
                });
            }
        }

        pegs
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            pegs: Self::generate(
                config.peg_rows,
                config.peg_cols,
                config.width,
                config.peg_top_margin,
                config.peg_row_spacing,
            ),
            radius: config.peg_radius,
        }
    }

    pub fn new(pegs: Vec<Peg>, radius: f32) -> Self {
        Self { pegs, radius }
    }

    /// Field with no pegs (free fall)
    pub fn empty(radius: f32) -> Self {
        Self {
            pegs: Vec::new(),
            radius,
        }
    }

    #[inline]
    pub fn pegs(&self) -> &[Peg] {
        &self.pegs
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn len(&self) -> usize {
        self.pegs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pegs.is_empty()
    }
}
