//! Point damage from projectiles.

use glam::Vec2;
use tracing::trace;

use crate::ecs::components::{BodyKind, Hull, Motion, Transform2d, Wreckage};

use super::context::SimulationContext;
use super::damage::{BodyFrame, StrikeTarget};
use super::hex::CellCoord;
use super::lattice::HexLattice;
use super::ShatterConfig;

/// Shards whose centres lie within this many cell radii of the hit are struck.
pub const IMPACT_REACH_RATIO: f32 = 2.5;
/// Outline deformation range, in cell radii.
const DEFORM_RANGE_RATIO: f32 = 3.0;
/// Sparks emitted per impact that found structure.
const IMPACT_SPARKS: usize = 3;

/// Cells scanned around the estimated hit cell. Small on-screen scales and
/// wreckage quantise coarsely, so they search wider.
fn search_window(scale: f32, is_wreck: bool) -> i32 {
    if is_wreck || scale < 0.35 {
        3
    } else if scale < 0.7 {
        2
    } else {
        1
    }
}

/// Shards within `reach` of `local`, scanning `window` cells around the
/// closed-form estimate.
fn cell_window_matches(lattice: &HexLattice, local: Vec2, reach: f32, window: i32) -> Vec<CellCoord> {
    let center = lattice.cell_at(local);
    let mut matches = Vec::new();
    for dc in -window..=window {
        for dr in -window..=window {
            let coord = CellCoord::new(center.col + dc, center.row + dr);
            if let Some(shard) = lattice.get(coord) {
                if shard.position.distance(local) < reach {
                    matches.push(coord);
                }
            }
        }
    }
    matches
}

/// Apply a projectile hit at world point `point`.
///
/// Every shard within reach is deformed and damaged; shards reaching zero hit
/// points become debris carrying a fraction of `projectile_velocity`.
/// Returns whether any shard was found. Lightweight, destroyed or
/// lattice-less bodies are ignored.
pub fn apply_impact(
    config: &ShatterConfig,
    world: &mut hecs::World,
    ctx: &mut SimulationContext,
    body: hecs::Entity,
    point: Vec2,
    damage: f32,
    projectile_velocity: Vec2,
) -> bool {
    let Ok((kind, transform, motion, hull, lattice, wreck)) = world.query_one_mut::<(
        &BodyKind,
        &Transform2d,
        Option<&Motion>,
        &mut Hull,
        &mut HexLattice,
        Option<&Wreckage>,
    )>(body) else {
        trace!(?body, "impact on body without lattice");
        return false;
    };

    if *kind == BodyKind::Simple
        || !hull.is_alive()
        || lattice.is_empty()
        || !transform.is_invertible()
    {
        return false;
    }

    let local = transform.world_to_local(point);
    let radius = lattice.cell_radius();
    let reach = radius * IMPACT_REACH_RATIO;
    let window = search_window(transform.scale, wreck.is_some());

    let matches: Vec<CellCoord> = if window > 1 {
        lattice
            .query_radius(local, reach)
            .into_iter()
            .filter(|s| s.position.distance(local) < reach)
            .map(|s| s.coord)
            .collect()
    } else {
        cell_window_matches(lattice, local, reach, window)
    };
    if matches.is_empty() {
        return false;
    }

    let frame = BodyFrame::new(*transform, motion.copied().unwrap_or_default());
    let impulse = projectile_velocity * config.debris_impulse_fraction;
    let mut target = StrikeTarget {
        body,
        lattice,
        hull,
        frame,
    };
    for coord in matches {
        if let Some(shard) = target.lattice.get_mut(coord) {
            shard.deform(local, radius * DEFORM_RANGE_RATIO, radius);
        }
        target.strike(coord, damage, impulse, ctx);
    }

    ctx.sparks
        .emit(point, frame.motion.velocity, IMPACT_SPARKS, &mut ctx.rng);
    true
}
