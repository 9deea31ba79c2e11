//! Scene builders shared by the benchmarks.

use glam::Vec2;
use hexshatter::ecs::prelude::*;
use hexshatter::{CoreSize, OpacityMask, ShatterConfig, ShatterWorld, SimulationContext};

/// Rounded-rectangle hull silhouette.
pub fn hull_mask(width: u32, height: u32) -> OpacityMask {
    let inset = height as f32 * 0.2;
    OpacityMask::from_fn(width, height, |x, y| {
        let (x, y) = (x as f32, y as f32);
        let dx = (inset - x).max(x - (width as f32 - inset)).max(0.0);
        let dy = (inset - y).max(y - (height as f32 - inset)).max(0.0);
        dx * dx + dy * dy <= inset * inset
    })
}

/// A decomposed lattice for a `width x height` sprite.
pub fn decomposed_lattice(width: u32, height: u32) -> anyhow::Result<HexLattice> {
    let decomposer = ShatterWorld::new(ShatterConfig::default()).decomposer()?;
    Ok(decomposer.decompose(&hull_mask(width, height), CoreSize::new(3, 2), 1000.0))
}

/// `n` hulls in a row, each overlapping its neighbour and closing on it fast.
pub fn setup_ramming_scene(
    n: usize,
) -> anyhow::Result<(hecs::World, ShatterWorld, SimulationContext)> {
    let shatter = ShatterWorld::new(ShatterConfig::default());
    let mut world = hecs::World::new();
    let mask = hull_mask(96, 48);
    for i in 0..n {
        let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
        let body = world.spawn((
            BodyKind::Lattice,
            Transform2d::from_position(Vec2::new(i as f32 * 80.0, (i % 3) as f32 * 6.0)),
            Motion::new(Vec2::new(6.0 * direction, 0.0), 0.0),
            Hull::new(1000.0, 1500.0),
        ));
        shatter.decompose_body(&mut world, body, &mask, CoreSize::new(3, 2))?;
    }
    Ok((world, shatter, SimulationContext::new(7)))
}

/// `n` hulls spread far apart, so only the broad phase does work.
pub fn setup_sparse_scene(
    n: usize,
) -> anyhow::Result<(hecs::World, ShatterWorld, SimulationContext)> {
    let shatter = ShatterWorld::new(ShatterConfig::default());
    let mut world = hecs::World::new();
    let mask = hull_mask(64, 32);
    let side = (n as f32).sqrt().ceil() as usize;
    for i in 0..n {
        let position = Vec2::new((i % side) as f32 * 400.0, (i / side) as f32 * 400.0);
        let body = world.spawn((
            BodyKind::Lattice,
            Transform2d::from_position(position),
            Motion::default(),
            Hull::new(500.0, 800.0),
        ));
        shatter.decompose_body(&mut world, body, &mask, CoreSize::new(2, 2))?;
    }
    Ok((world, shatter, SimulationContext::new(11)))
}
