//! Board state and core simulation types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pegs::PegField;
use crate::config::BoardConfig;

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    landed: bool,
    slot: Option<usize>,
    /// Ticks spent resting on the floor (drives removal)
    #[serde(default)]
    pub rest_ticks: u32,
}

impl Ball {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            landed: false,
            slot: None,
            rest_ticks: 0,
        }
    }

    #[inline]
    pub fn landed(&self) -> bool {
        self.landed
    }

    /// Slot index; `Some` exactly when the ball has landed
    #[inline]
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Mark the ball landed in `slot`, resting on `floor_y`.
    ///
    /// Returns false (and changes nothing) if the ball had already landed.
    pub fn land(&mut self, slot: usize, floor_y: f32) -> bool {
        if self.landed {
            return false;
        }
        self.landed = true;
        self.slot = Some(slot);
        self.pos.y = floor_y;
        self.vel = Vec2::ZERO;
        true
    }
}

/// Events produced by a tick, consumed by the session controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Ball reached the slot band this tick (emitted once per ball)
    BallLanded { ball_id: u32, x: f32, slot: usize },
    /// Landed ball finished its grace period and left the board
    BallRemoved { ball_id: u32 },
}

/// Complete board state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Fixed pegs (generated once)
    pub pegs: PegField,
    /// Active balls (sorted by id for determinism)
    pub balls: Vec<Ball>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Next ball ID
    next_id: u32,
}

impl Board {
    pub fn new(config: &BoardConfig) -> Self {
        Self::with_pegs(PegField::from_config(config))
    }

    pub fn with_pegs(pegs: PegField) -> Self {
        Self {
            pegs,
            balls: Vec::new(),
            time_ticks: 0,
            next_id: 0,
        }
    }

    /// Allocate a new ball ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a ball at `pos` moving with `vel`, returning its id
    pub fn spawn_ball(&mut self, pos: Vec2, vel: Vec2, radius: f32) -> u32 {
        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, pos, vel, radius));
        id
    }

    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    /// Balls that have not landed yet
    pub fn in_flight(&self) -> usize {
        self.balls.iter().filter(|b| !b.landed()).count()
    }

    /// Ensure balls are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut board = Board::with_pegs(PegField::empty(4.0));
        let a = board.spawn_ball(Vec2::ZERO, Vec2::ZERO, 5.0);
        let b = board.spawn_ball(Vec2::ZERO, Vec2::ZERO, 5.0);
        board.balls.clear();
        let c = board.spawn_ball(Vec2::ZERO, Vec2::ZERO, 5.0);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_land_sets_slot_once() {
        let mut ball = Ball::new(1, Vec2::new(10.0, 500.0), Vec2::new(1.0, 3.0), 5.0);
        assert!(!ball.landed());
        assert_eq!(ball.slot(), None);

        assert!(ball.land(2, 580.0));
        assert!(ball.landed());
        assert_eq!(ball.slot(), Some(2));
        assert_eq!(ball.pos.y, 580.0);

        // Second landing is ignored
        assert!(!ball.land(7, 590.0));
        assert_eq!(ball.slot(), Some(2));
        assert_eq!(ball.pos.y, 580.0);
    }
}
