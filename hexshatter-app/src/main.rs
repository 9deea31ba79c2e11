use std::f32::consts::PI;

use glam::Vec2;
use hexshatter::ecs::prelude::*;
use hexshatter::{
    CoreSize, DebrisGroup, OpacityMask, ShatterConfig, ShatterWorld, SimulationContext,
    SplitOutcome, UniformBodyGrid, WreckSink,
};

const TICKS: u32 = 240;
const FIRE_EVERY: u32 = 12;

/// Collects split-off fragments and spawns them as wreckage bodies once the
/// tick is over.
#[derive(Default)]
struct WreckFactory {
    pending: Vec<DebrisGroup>,
    spawned: usize,
}

impl WreckSink for WreckFactory {
    fn spawn_wreck(&mut self, group: DebrisGroup) {
        self.pending.push(group);
    }
}

impl WreckFactory {
    fn spawn_pending(&mut self, world: &mut hecs::World) {
        for group in self.pending.drain(..) {
            let hp = group.total_hp();
            let mass = group.shards.len() as f32 * 10.0;
            let motion = group.motion;
            let source = group.source;
            let (lattice, transform) = group.into_lattice(hp);
            let shards = lattice.len();
            let wreck = world.spawn((
                BodyKind::Lattice,
                transform,
                motion,
                Hull::new(hp, mass),
                lattice,
                Wreckage,
            ));
            log::info!("wreck {wreck:?} broke off {source:?} with {shards} shards");
            self.spawned += 1;
        }
    }
}

/// A wedge-shaped hull silhouette, nose pointing +x.
fn wedge_mask(width: u32, height: u32) -> OpacityMask {
    let half = height as f32 * 0.5;
    OpacityMask::from_fn(width, height, |x, y| {
        let taper = half * (1.0 - x as f32 / width as f32 * 0.8);
        (y as f32 + 0.5 - half).abs() < taper
    })
}

fn spawn_ship(
    shatter: &ShatterWorld,
    world: &mut hecs::World,
    mask: &OpacityMask,
    transform: Transform2d,
    velocity: Vec2,
) -> anyhow::Result<hecs::Entity> {
    let ship = world.spawn((
        BodyKind::Lattice,
        transform,
        Motion::new(velocity, 0.0),
        Hull::new(1200.0, 2500.0),
    ));
    let shards = shatter.decompose_body(world, ship, mask, CoreSize::new(3, 2))?;
    log::info!("ship {ship:?} decomposed into {shards} shards");
    Ok(ship)
}

fn integrate(world: &mut hecs::World) {
    for (_, (transform, motion)) in world.query_mut::<(&mut Transform2d, &Motion)>() {
        transform.position += motion.velocity;
        transform.angle += motion.angular_velocity;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let shatter = ShatterWorld::new(ShatterConfig::default());
    let mut world = hecs::World::new();
    let mut ctx = SimulationContext::new(0x5eed);
    let mut grid = UniformBodyGrid::new(256.0);
    let mut factory = WreckFactory::default();

    let mask = wedge_mask(120, 60);
    let cruiser = spawn_ship(
        &shatter,
        &mut world,
        &mask,
        Transform2d::from_position(Vec2::new(-150.0, 0.0)),
        Vec2::new(2.5, 0.0),
    )?;
    let frigate = spawn_ship(
        &shatter,
        &mut world,
        &mask,
        Transform2d::from_position(Vec2::new(150.0, 18.0))
            .with_angle(PI)
            .with_scale(0.8),
        Vec2::new(-2.5, 0.0),
    )?;

    for tick in 0..TICKS {
        integrate(&mut world);

        if tick % FIRE_EVERY == 0 {
            // A turret on the frigate rakes the cruiser's flank.
            let aim = world.get::<&Transform2d>(cruiser).map(|t| *t);
            if let Ok(target) = aim {
                let sweep = (tick as f32 * 0.13).sin() * 25.0;
                let point = target.local_to_world(Vec2::new(sweep, 20.0));
                let hit = shatter.apply_impact(
                    &mut world,
                    &mut ctx,
                    cruiser,
                    point,
                    18.0,
                    Vec2::new(0.0, -40.0),
                );
                log::debug!("tick {tick}: shot at {point} hit={hit}");
            }
        }

        grid.rebuild(&world);
        let report = shatter.step(&mut world, &mut ctx, Some(&grid), &mut factory);
        for manifold in &report.manifolds {
            log::debug!(
                "tick {tick}: {} contacts at speed {:.1}",
                manifold.contacts.len(),
                manifold.pair.relative_speed
            );
        }
        for (body, outcome) in &report.splits {
            match outcome {
                SplitOutcome::Split { groups } => {
                    log::info!("tick {tick}: {body:?} shed {groups} fragment(s)")
                }
                SplitOutcome::Destroyed { groups } => {
                    log::info!("tick {tick}: {body:?} destroyed into {groups} fragment(s)")
                }
                SplitOutcome::Intact | SplitOutcome::Skipped => {}
            }
        }
        factory.spawn_pending(&mut world);
    }

    for ship in [cruiser, frigate] {
        let hull = world.get::<&Hull>(ship)?;
        let shards = world.get::<&HexLattice>(ship)?.len();
        log::info!(
            "{ship:?}: hp {:.0}/{:.0}, {shards} shards, destroyed={}",
            hull.hp,
            hull.max_hp,
            hull.destroyed
        );
    }
    log::info!(
        "{} wrecks spawned, {} debris shards and {} sparks in flight",
        factory.spawned,
        ctx.debris.len(),
        ctx.sparks.len()
    );
    Ok(())
}
