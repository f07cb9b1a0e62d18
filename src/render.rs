//! Frame snapshots for any 2D drawing surface
//!
//! The engines never draw. Once per tick (board) or animation frame (wheel)
//! they hand a plain snapshot to a [`FrameSink`], which can paint it, log it,
//! or record it.

use serde::Serialize;

use crate::config::BoardConfig;
use crate::payout::PayoutTable;
use crate::sim::Board;
use crate::wheel::WheelPhase;

/// A ball as drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallSprite {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub landed: bool,
    pub slot: Option<usize>,
}

/// Everything needed to draw one board frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardFrame {
    pub tick: u64,
    pub width: f32,
    pub height: f32,
    pub slot_band_height: f32,
    pub peg_radius: f32,
    pub ball_radius: f32,
    pub pegs: Vec<[f32; 2]>,
    pub balls: Vec<BallSprite>,
    /// One label per slot, left to right
    pub slot_labels: Vec<String>,
    pub score: u64,
}

impl BoardFrame {
    pub fn capture(board: &Board, config: &BoardConfig, table: &PayoutTable, score: u64) -> Self {
        Self {
            tick: board.time_ticks,
            width: config.width,
            height: config.height,
            slot_band_height: config.slot_band_height,
            peg_radius: board.pegs.radius(),
            ball_radius: config.ball_radius,
            pegs: board.pegs.pegs().iter().map(|p| [p.pos.x, p.pos.y]).collect(),
            balls: board
                .balls
                .iter()
                .map(|b| BallSprite {
                    id: b.id,
                    x: b.pos.x,
                    y: b.pos.y,
                    landed: b.landed(),
                    slot: b.slot(),
                })
                .collect(),
            slot_labels: table.multipliers().iter().map(|m| slot_label(*m)).collect(),
            score,
        }
    }
}

/// Multiplier label shown under a slot, e.g. `"3.0x"`
pub fn slot_label(multiplier: f32) -> String {
    format!("{multiplier:.1}x")
}

/// Everything needed to draw one wheel frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WheelFrame {
    pub phase: WheelPhase,
    pub rotation_degrees: f32,
    /// Clicks that fall inside this frame
    pub clicks: u32,
    /// Acknowledged reward, once resolved
    pub reward: Option<u64>,
}

/// Receives frames; both methods default to doing nothing
pub trait FrameSink: Send {
    fn present_board(&mut self, _frame: &BoardFrame) {}

    fn present_wheel(&mut self, _frame: &WheelFrame) {}
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {}

/// Keeps every frame (tests, replays)
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub boards: Vec<BoardFrame>,
    pub wheels: Vec<WheelFrame>,
}

impl FrameSink for RecordingSink {
    fn present_board(&mut self, frame: &BoardFrame) {
        self.boards.push(frame.clone());
    }

    fn present_wheel(&mut self, frame: &WheelFrame) {
        self.wheels.push(frame.clone());
    }
}

/// Writes frames as JSON at trace level
#[derive(Debug, Default)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn present_board(&mut self, frame: &BoardFrame) {
        if log::log_enabled!(log::Level::Trace) {
            match serde_json::to_string(frame) {
                Ok(json) => log::trace!("board {json}"),
                Err(e) => log::warn!("Failed to encode board frame: {e}"),
            }
        }
    }

    fn present_wheel(&mut self, frame: &WheelFrame) {
        if log::log_enabled!(log::Level::Trace) {
            match serde_json::to_string(frame) {
                Ok(json) => log::trace!("wheel {json}"),
                Err(e) => log::warn!("Failed to encode wheel frame: {e}"),
            }
        }
    }
}
