//! Deterministic simulation module
//!
//! All board physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - No randomness (spawn velocities are chosen by the caller)
//! - Stable iteration order (by ball ID)
//! - No rendering, ledger, or platform dependencies

pub mod collision;
pub mod pegs;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, ball_peg_collision, resolve_peg_collisions, resolve_wall_collision};
pub use pegs::{Peg, PegField};
pub use state::{Ball, Board, SimEvent};
pub use tick::{run_until_landed, step_ball, tick};
