//! Destructible hull simulation on hex lattices.
//!
//! # Architecture
//!
//! Each tick runs in a fixed order:
//!
//! 1. Host applies projectile impacts ([`ShatterWorld::apply_impact`])
//! 2. Debris and sparks advance
//! 3. Structural collisions between lattice bodies (throttled)
//! 4. Bodies queued by any damage are split into connected pieces
//! 5. The tick counter advances
//!
//! All mutable state outside the ECS world lives in a caller-owned
//! [`SimulationContext`].

pub mod broadphase;
pub mod collision;
pub mod contact;
pub mod context;
pub mod damage;
pub mod debris;
pub mod decompose;
pub mod hex;
pub mod impact;
pub mod lattice;
pub mod raster;
pub mod shard;
pub mod spatial;
pub mod splitter;

use glam::Vec2;
use tracing::debug;

use crate::ecs::components::{BodyKind, Hull};
use crate::error::ShatterError;

pub use self::broadphase::{BodyGrid, UniformBodyGrid};
pub use self::contact::{ContactManifold, PairContact, ShardContact};
pub use self::context::{SimulationContext, SplitQueue};
pub use self::damage::BodyFrame;
pub use self::debris::{DebrisPool, DebrisShard, Spark, SparkPool};
pub use self::decompose::{CoreSize, Decomposer, OpacityMask};
pub use self::hex::{CellCoord, HexGeometry};
pub use self::lattice::HexLattice;
pub use self::raster::{DamageRaster, Texel};
pub use self::shard::{Shard, ShardHit};
pub use self::spatial::SpatialIndex;
pub use self::splitter::{DebrisGroup, SplitOutcome, WreckSink};

/// Configuration for the shatter simulation.
#[derive(Debug, Clone)]
pub struct ShatterConfig {
    /// Hex cell circumradius in sprite pixels. Default: 6.0.
    pub cell_radius: f32,
    /// Hit points of a plain shard. Default: 10.0.
    pub base_shard_hp: f32,
    /// Hit-point and hardness multiplier of core shards. Default: 5.0.
    pub core_multiplier: f32,
    /// Mask alpha above which a probe counts as opaque. Default: 32.
    pub alpha_threshold: u8,
    /// Collisions run on ticks that are a multiple of this. Default: 2.
    pub collision_interval: u32,
    /// Use the body grid only with more bodies than this. Default: 8.
    pub broadphase_min_bodies: usize,
    /// Relative speed below which contacts only repel. Default: 1.5.
    pub soft_contact_speed: f32,
    /// Extra cells around the narrow-phase window. Default: 2.
    pub window_padding: i32,
    /// Damage every fast contact deals before mass and speed. Default: 1.0.
    pub base_contact_damage: f32,
    /// Soft repulsion gain per unit of overlap. Default: 0.5.
    pub soft_repulsion: f32,
    /// Extra hard-contact impulse per unit of overlap. Default: 2.0.
    pub hard_repulsion: f32,
    /// Per-tick debris velocity damping. Default: 0.985.
    pub debris_friction: f32,
    /// Fraction of projectile velocity carried by shards it destroys. Default: 0.05.
    pub debris_impulse_fraction: f32,
}

impl Default for ShatterConfig {
    fn default() -> Self {
        Self {
            cell_radius: 6.0,
            base_shard_hp: 10.0,
            core_multiplier: 5.0,
            alpha_threshold: 32,
            collision_interval: 2,
            broadphase_min_bodies: 8,
            soft_contact_speed: 1.5,
            window_padding: 2,
            base_contact_damage: 1.0,
            soft_repulsion: 0.5,
            hard_repulsion: 2.0,
            debris_friction: 0.985,
            debris_impulse_fraction: 0.05,
        }
    }
}

/// What one [`ShatterWorld::step`] did.
#[derive(Debug, Default)]
pub struct StepReport {
    pub manifolds: Vec<ContactManifold>,
    pub splits: Vec<(hecs::Entity, SplitOutcome)>,
}

/// Entry point tying the pipeline stages together.
#[derive(Debug, Clone, Default)]
pub struct ShatterWorld {
    config: ShatterConfig,
}

impl ShatterWorld {
    pub fn new(config: ShatterConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &ShatterConfig {
        &self.config
    }

    pub fn decomposer(&self) -> Result<Decomposer, ShatterError> {
        Decomposer::new(&self.config)
    }

    /// Attach `lattice` to a lattice-capable body.
    pub fn attach_lattice(
        &self,
        world: &mut hecs::World,
        entity: hecs::Entity,
        lattice: HexLattice,
    ) -> Result<(), ShatterError> {
        let kind = *world.get::<&BodyKind>(entity)?;
        if kind == BodyKind::Simple {
            return Err(ShatterError::LightweightBody);
        }
        world.insert_one(entity, lattice)?;
        Ok(())
    }

    /// Decompose `mask` against the body's max hit points and attach the
    /// result. Returns the shard count.
    pub fn decompose_body(
        &self,
        world: &mut hecs::World,
        entity: hecs::Entity,
        mask: &OpacityMask,
        core: CoreSize,
    ) -> Result<usize, ShatterError> {
        let max_hp = world.get::<&Hull>(entity)?.max_hp;
        let lattice = self.decomposer()?.decompose(mask, core, max_hp);
        let shards = lattice.len();
        self.attach_lattice(world, entity, lattice)?;
        debug!(?entity, shards, "lattice attached");
        Ok(shards)
    }

    /// Projectile hit at a world point. See [`impact::apply_impact`].
    pub fn apply_impact(
        &self,
        world: &mut hecs::World,
        ctx: &mut SimulationContext,
        body: hecs::Entity,
        point: Vec2,
        damage: f32,
        velocity: Vec2,
    ) -> bool {
        impact::apply_impact(&self.config, world, ctx, body, point, damage, velocity)
    }

    /// One structural collision pass. See [`collision::resolve_collisions`].
    pub fn resolve_collisions(
        &self,
        world: &mut hecs::World,
        ctx: &mut SimulationContext,
        grid: Option<&dyn BodyGrid>,
    ) -> Vec<ContactManifold> {
        collision::resolve_collisions(&self.config, world, ctx, grid)
    }

    /// Advance the simulation one tick. Impacts for this tick must already
    /// have been applied.
    pub fn step(
        &self,
        world: &mut hecs::World,
        ctx: &mut SimulationContext,
        grid: Option<&dyn BodyGrid>,
        wrecks: &mut dyn WreckSink,
    ) -> StepReport {
        ctx.debris.update(self.config.debris_friction);
        ctx.sparks.update();
        let manifolds = self.resolve_collisions(world, ctx, grid);
        let splits = splitter::drain_split_queue(world, ctx, wrecks);
        ctx.advance_tick();
        StepReport { manifolds, splits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Motion, Transform2d, Wreckage};
    use crate::shatter::lattice::tests::{block_lattice, CORE_2X2, RADIUS};

    /// The 10x6 hull with a 2x2 core, re-centred like a decomposed lattice.
    fn hull_lattice() -> HexLattice {
        let mut lattice = block_lattice(10, 6, &CORE_2X2, 1000.0);
        lattice.recenter();
        lattice
    }

    fn spawn_hull(world: &mut hecs::World, transform: Transform2d) -> hecs::Entity {
        world.spawn((
            BodyKind::Lattice,
            transform,
            Motion::default(),
            Hull::new(1000.0, 800.0),
            hull_lattice(),
        ))
    }

    /// Cell at `(col, row)` relative to the lattice's minimum corner.
    fn corner_cell(lattice: &HexLattice, col: i32, row: i32) -> CellCoord {
        let (min, _) = lattice.coord_bounds();
        CellCoord::new(min.col + col, min.row + row)
    }

    #[test]
    fn test_translation_only_ticks_conserve_shards() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let mut ctx = SimulationContext::new(1);
        let bodies: Vec<_> = (0..3)
            .map(|i| spawn_hull(&mut world, Transform2d::from_position(Vec2::new(i as f32 * 500.0, 0.0))))
            .collect();
        let snapshot = |world: &hecs::World| {
            bodies
                .iter()
                .map(|&b| {
                    let lattice = world.get::<&HexLattice>(b).unwrap();
                    let shards: Vec<_> = lattice.shards().iter().map(|s| (s.coord, s.hp, s.is_core)).collect();
                    (shards, lattice.hp_ratio())
                })
                .collect::<Vec<_>>()
        };
        let before = snapshot(&world);

        let mut wrecks: Vec<DebrisGroup> = Vec::new();
        for _ in 0..20 {
            for (_, transform) in world.query_mut::<&mut Transform2d>() {
                transform.position += Vec2::new(1.5, -0.5);
                transform.angle += 0.01;
            }
            shatter.step(&mut world, &mut ctx, None, &mut wrecks);
        }
        assert_eq!(snapshot(&world), before);
        assert!(wrecks.is_empty());
        assert_eq!(ctx.tick(), 20);
    }

    #[test]
    fn test_corner_shard_impact() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let mut ctx = SimulationContext::new(1);
        let t = Transform2d::from_position(Vec2::new(300.0, 120.0)).with_angle(0.3);
        let body = spawn_hull(&mut world, t);

        let (corner, corner_pos, ratio, count) = {
            let lattice = world.get::<&HexLattice>(body).unwrap();
            let corner = corner_cell(&lattice, 0, 0);
            let pos = lattice.get(corner).unwrap().position;
            (corner, pos, lattice.hp_ratio(), lattice.len())
        };

        // Just outside the corner, where only the corner shard is in reach.
        let point = t.local_to_world(corner_pos + Vec2::splat(-1.2 * RADIUS));
        assert!(shatter.apply_impact(&mut world, &mut ctx, body, point, 10.0, Vec2::new(-30.0, 0.0)));

        let mut wrecks: Vec<DebrisGroup> = Vec::new();
        let report = shatter.step(&mut world, &mut ctx, None, &mut wrecks);
        assert_eq!(report.splits, vec![(body, SplitOutcome::Intact)]);
        assert!(wrecks.is_empty());
        assert_eq!(ctx.debris.len(), 1);

        let hull = world.get::<&Hull>(body).unwrap();
        assert!((hull.hp - (1000.0 - 10.0 * ratio)).abs() < 1e-3);
        let lattice = world.get::<&HexLattice>(body).unwrap();
        assert_eq!(lattice.len(), count - 1);
        assert!(!lattice.contains(corner));
    }

    #[test]
    fn test_wing_tip_severed() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let mut ctx = SimulationContext::new(1);
        let t = Transform2d::from_position(Vec2::new(-50.0, 80.0)).with_angle(-0.8);
        let body = spawn_hull(&mut world, t);

        // Weaken the three shards holding the (0, 0)-(0, 1) tip on.
        let (cuts, tip, original_radius, count) = {
            let mut lattice = world.get::<&mut HexLattice>(body).unwrap();
            let cuts = [(1, 0), (1, 1), (0, 2)].map(|(c, r)| corner_cell(&lattice, c, r));
            let tip = [(0, 0), (0, 1)].map(|(c, r)| corner_cell(&lattice, c, r));
            for coord in cuts {
                lattice.get_mut(coord).unwrap().hp = 1.0;
            }
            (cuts, tip, lattice.raw_radius(), lattice.len())
        };

        for coord in cuts {
            let local = world.get::<&HexLattice>(body).unwrap().geometry().center(coord);
            assert!(shatter.apply_impact(&mut world, &mut ctx, body, t.local_to_world(local), 2.0, Vec2::ZERO));
        }

        let mut wrecks: Vec<DebrisGroup> = Vec::new();
        let report = shatter.step(&mut world, &mut ctx, None, &mut wrecks);
        assert_eq!(report.splits, vec![(body, SplitOutcome::Split { groups: 1 })]);

        assert_eq!(wrecks.len(), 1);
        let mut detached: Vec<CellCoord> = wrecks[0].shards.iter().map(|s| s.coord).collect();
        detached.sort();
        let mut expected = tip.to_vec();
        expected.sort();
        assert_eq!(detached, expected);

        let lattice = world.get::<&HexLattice>(body).unwrap();
        assert_eq!(lattice.len(), count - cuts.len() - 2);
        let mean = lattice.shards().iter().map(|s| s.position).sum::<Vec2>() / lattice.len() as f32;
        assert!(mean.length() < 1e-3, "survivor mean {mean:?}");
        assert!(lattice.raw_radius() < original_radius);
        assert!(world.get::<&Hull>(body).unwrap().is_alive());
    }

    #[test]
    fn test_shot_to_pieces_is_destroyed() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let mut ctx = SimulationContext::new(1);
        let body = world.spawn((
            BodyKind::Lattice,
            Transform2d::identity(),
            Motion::default(),
            Hull::new(1234.5, 300.0),
            block_lattice(7, 1, &[], 1234.5),
        ));

        for _ in 0..7 {
            let next = world.get::<&HexLattice>(body).unwrap().shards().first().map(|s| s.position);
            let Some(point) = next else { break };
            assert!(shatter.apply_impact(&mut world, &mut ctx, body, point, 100.0, Vec2::ZERO));
        }
        assert!(world.get::<&HexLattice>(body).unwrap().is_empty());
        assert!(world.get::<&Hull>(body).unwrap().destroyed);

        let mut wrecks: Vec<DebrisGroup> = Vec::new();
        let report = shatter.step(&mut world, &mut ctx, None, &mut wrecks);
        assert_eq!(report.splits, vec![(body, SplitOutcome::Destroyed { groups: 0 })]);
        assert!(wrecks.is_empty());
        assert_eq!(ctx.debris.len(), 7);
        assert!(!shatter.apply_impact(&mut world, &mut ctx, body, Vec2::ZERO, 100.0, Vec2::ZERO));
    }

    #[test]
    fn test_ramming_splits_through_step() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let mut ctx = SimulationContext::new(4);
        let a = world.spawn((
            BodyKind::Lattice,
            Transform2d::identity(),
            Motion::new(Vec2::new(12.0, 0.0), 0.0),
            Hull::new(1000.0, 4000.0),
            hull_lattice(),
        ));
        let b = world.spawn((
            BodyKind::Lattice,
            Transform2d::from_position(Vec2::new(70.0, 30.0)),
            Motion::new(Vec2::new(-12.0, 0.0), 0.0),
            Hull::new(1000.0, 4000.0),
            hull_lattice(),
        ));

        let mut wrecks: Vec<DebrisGroup> = Vec::new();
        let report = shatter.step(&mut world, &mut ctx, None, &mut wrecks);
        assert_eq!(report.manifolds.len(), 1);
        assert!(!ctx.debris.is_empty());
        assert!(world.get::<&Hull>(a).unwrap().hp < 1000.0);
        assert!(world.get::<&Hull>(b).unwrap().hp < 1000.0);
        // Every queued body was drained.
        assert!(ctx.splits.is_empty());
        assert!(!report.splits.is_empty());
    }

    #[test]
    fn test_wreckage_never_feeds_the_sink() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let mut ctx = SimulationContext::new(1);
        let body = spawn_hull(&mut world, Transform2d::identity());
        world.insert_one(body, Wreckage).unwrap();

        let cuts: Vec<CellCoord> = {
            let mut lattice = world.get::<&mut HexLattice>(body).unwrap();
            let cuts: Vec<_> = [(1, 0), (1, 1), (0, 2)].iter().map(|&(c, r)| corner_cell(&lattice, c, r)).collect();
            for &coord in &cuts {
                lattice.get_mut(coord).unwrap().hp = 1.0;
            }
            cuts
        };
        for coord in cuts {
            let local = world.get::<&HexLattice>(body).unwrap().geometry().center(coord);
            shatter.apply_impact(&mut world, &mut ctx, body, local, 2.0, Vec2::ZERO);
        }
        let debris_before = ctx.debris.len();

        let mut wrecks: Vec<DebrisGroup> = Vec::new();
        shatter.step(&mut world, &mut ctx, None, &mut wrecks);
        assert!(wrecks.is_empty());
        assert_eq!(ctx.debris.len(), debris_before + 2);
    }

    #[test]
    fn test_attach_lattice_validation() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let fighter = world.spawn((BodyKind::Simple, Hull::new(10.0, 5.0)));
        let err = shatter
            .attach_lattice(&mut world, fighter, hull_lattice())
            .unwrap_err();
        assert!(matches!(err, ShatterError::LightweightBody));

        let bare = world.spawn((Hull::new(10.0, 5.0),));
        assert!(matches!(
            shatter.attach_lattice(&mut world, bare, hull_lattice()),
            Err(ShatterError::Component(_))
        ));

        world.despawn(bare).unwrap();
        assert!(shatter.attach_lattice(&mut world, bare, hull_lattice()).is_err());
    }

    #[test]
    fn test_decompose_body_attaches() {
        let shatter = ShatterWorld::default();
        let mut world = hecs::World::new();
        let body = world.spawn((BodyKind::Lattice, Transform2d::identity(), Hull::new(600.0, 300.0)));
        let mask = OpacityMask::from_fn(64, 32, |_, _| true);

        let shards = shatter
            .decompose_body(&mut world, body, &mask, CoreSize::new(2, 2))
            .unwrap();
        assert!(shards > 0);
        let lattice = world.get::<&HexLattice>(body).unwrap();
        assert_eq!(lattice.len(), shards);
        assert!((lattice.total_hp() * lattice.hp_ratio() - 600.0).abs() < 0.05);
    }
}
