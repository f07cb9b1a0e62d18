//! Collision detection and response for pegs and side walls
//!
//! Pegs do not reflect the ball physically: an overlapping ball is moved out to
//! the contact distance and kicked away from the peg centre at a fixed speed.

use glam::Vec2;

use super::pegs::PegField;
use crate::config::PegResolution;
use crate::polar_to_cartesian;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact direction (from the obstacle toward the ball centre)
    pub normal: Vec2,
    /// Contact angle in radians (`atan2` of the normal)
    pub angle: f32,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            angle: 0.0,
            penetration: 0.0,
        }
    }
}

/// Check overlap between a ball and a single peg
pub fn ball_peg_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    peg_pos: Vec2,
    peg_radius: f32,
) -> CollisionResult {
    let delta = ball_pos - peg_pos;
    let dist = delta.length();
    let min_dist = ball_radius + peg_radius;

    if dist >= min_dist {
        return CollisionResult::miss();
    }

    let angle = delta.y.atan2(delta.x);
    CollisionResult {
        hit: true,
        normal: polar_to_cartesian(1.0, angle),
        angle,
        penetration: min_dist - dist,
    }
}

/// Resolve all peg overlaps for one ball, returning the number of pegs hit
pub fn resolve_peg_collisions(
    pos: &mut Vec2,
    vel: &mut Vec2,
    ball_radius: f32,
    field: &PegField,
    kick_speed: f32,
    mode: PegResolution,
) -> u32 {
    match mode {
        PegResolution::LastWins => resolve_last_wins(pos, vel, ball_radius, field, kick_speed),
        PegResolution::Averaged => resolve_averaged(pos, vel, ball_radius, field, kick_speed),
    }
}

/// Sequential resolution in peg order. Each hit re-seats the ball, so later
/// pegs are tested against the corrected position and the last hit decides
/// the outgoing velocity.
fn resolve_last_wins(
    pos: &mut Vec2,
    vel: &mut Vec2,
    ball_radius: f32,
    field: &PegField,
    kick_speed: f32,
) -> u32 {
    let min_dist = ball_radius + field.radius();
    let mut hits = 0;

    for peg in field.pegs() {
        let result = ball_peg_collision(*pos, ball_radius, peg.pos, field.radius());
        if result.hit {
            *pos = peg.pos + result.normal * min_dist;
            *vel = result.normal * kick_speed;
            hits += 1;
        }
    }

    hits
}

/// Order-independent resolution: every overlapping peg is measured against
/// the same pre-step position, corrections are summed and the kick follows
/// the mean contact direction.
fn resolve_averaged(
    pos: &mut Vec2,
    vel: &mut Vec2,
    ball_radius: f32,
    field: &PegField,
    kick_speed: f32,
) -> u32 {
    let start = *pos;
    let mut correction = Vec2::ZERO;
    let mut direction = Vec2::ZERO;
    let mut hits = 0;

    for peg in field.pegs() {
        let result = ball_peg_collision(start, ball_radius, peg.pos, field.radius());
        if result.hit {
            correction += result.normal * result.penetration;
            direction += result.normal;
            hits += 1;
        }
    }

    if hits > 0 {
        // Opposing contacts cancel out; pop the ball straight up
        let dir = direction.normalize_or_zero();
        let dir = if dir == Vec2::ZERO { Vec2::NEG_Y } else { dir };
        *pos = start + correction;
        *vel = dir * kick_speed;
    }

    hits
}

/// Clamp the ball inside the side walls, reflecting `vx` away from the wall.
///
/// Returns true if a wall was touched.
pub fn resolve_wall_collision(
    pos: &mut Vec2,
    vel: &mut Vec2,
    ball_radius: f32,
    width: f32,
    bounce: f32,
) -> bool {
    if pos.x - ball_radius < 0.0 {
        pos.x = ball_radius;
        vel.x = vel.x.abs() * bounce;
        return true;
    }
    if pos.x + ball_radius > width {
        pos.x = width - ball_radius;
        vel.x = -vel.x.abs() * bounce;
        return true;
    }
    false
}
