//! Shard damage shared by the impact and collision resolvers.

use glam::Vec2;
use tracing::trace;

use crate::ecs::components::{Hull, Motion, Transform2d};

use super::context::SimulationContext;
use super::debris::DebrisShard;
use super::hex::CellCoord;
use super::lattice::HexLattice;
use super::shard::ShardHit;

/// Snapshot of a body's placement and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyFrame {
    pub transform: Transform2d,
    pub motion: Motion,
}

impl BodyFrame {
    pub fn new(transform: Transform2d, motion: Motion) -> Self {
        Self { transform, motion }
    }
}

/// Everything one shard hit needs from its owning body.
pub(crate) struct StrikeTarget<'a> {
    pub body: hecs::Entity,
    pub lattice: &'a mut HexLattice,
    pub hull: &'a mut Hull,
    pub frame: BodyFrame,
}

impl StrikeTarget<'_> {
    /// Damage one shard and couple the loss into the body's hit points.
    ///
    /// A shard that reaches zero is moved into the debris pool with
    /// `impulse` added to its inherited velocity, and the body is queued for
    /// a connectivity check. Otherwise its decal is repainted. Returns `None`
    /// when no shard lives at `coord`.
    pub fn strike(
        &mut self,
        coord: CellCoord,
        damage: f32,
        impulse: Vec2,
        ctx: &mut SimulationContext,
    ) -> Option<ShardHit> {
        let hit = self.lattice.get_mut(coord)?.apply_damage(damage);
        self.hull.take_damage(hit.hp_lost * self.lattice.hp_ratio());

        if hit.destroyed {
            if let Some(shard) = self.lattice.remove(coord) {
                trace!(?coord, core = shard.is_core, "shard destroyed");
                ctx.debris
                    .push(DebrisShard::detach(shard, &self.frame, impulse, &mut ctx.rng));
            }
            if self.lattice.is_empty() {
                self.hull.destroyed = true;
            }
            ctx.splits.push(self.body);
        } else {
            self.lattice.paint_damage(coord);
        }
        Some(hit)
    }
}
