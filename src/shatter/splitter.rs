//! Connectivity splitting: detaching fragments that lost contact with the core.

use std::collections::HashSet;

use glam::Vec2;
use tracing::debug;

use crate::ecs::components::{Hull, Motion, Transform2d, Wreckage};

use super::context::SimulationContext;
use super::damage::BodyFrame;
use super::debris::DebrisShard;
use super::hex::{CellCoord, HexGeometry};
use super::lattice::HexLattice;
use super::shard::Shard;

/// A fragment cut off from its body, handed to the host's wreck factory.
///
/// Shards keep their lattice-local positions, outlines, hit points,
/// hardness and core flags; `transform` and `motion` are the parent's at the
/// moment of the split.
#[derive(Debug, Clone)]
pub struct DebrisGroup {
    pub source: hecs::Entity,
    pub shards: Vec<Shard>,
    pub transform: Transform2d,
    pub motion: Motion,
    pub cell_radius: f32,
}

impl DebrisGroup {
    /// World position of the group's centroid.
    pub fn world_center(&self) -> Vec2 {
        if self.shards.is_empty() {
            return self.transform.position;
        }
        let mean = self.shards.iter().map(|s| s.position).sum::<Vec2>() / self.shards.len() as f32;
        self.transform.local_to_world(mean)
    }

    /// Summed hit points of the group's shards.
    pub fn total_hp(&self) -> f32 {
        self.shards.iter().map(|s| s.hp.max(0.0)).sum()
    }

    /// Rebuild the group as a stand-alone lattice, re-centred on its own
    /// shards, plus the transform that keeps it where it broke off.
    pub fn into_lattice(self, body_max_hp: f32) -> (HexLattice, Transform2d) {
        let mut geometry = HexGeometry::new(self.cell_radius);
        if let Some(first) = self.shards.first() {
            geometry.origin = first.position - geometry.cell_offset(first.coord);
        }
        let mut transform = self.transform;
        let mut lattice = HexLattice::from_shards(geometry, self.shards, body_max_hp);
        let offset = lattice.recenter();
        transform.position += transform.local_vector_to_world(offset);
        (lattice, transform)
    }
}

/// Receives debris groups that should become new wreck bodies.
pub trait WreckSink {
    fn spawn_wreck(&mut self, group: DebrisGroup);
}

impl WreckSink for Vec<DebrisGroup> {
    fn spawn_wreck(&mut self, group: DebrisGroup) {
        self.push(group);
    }
}

/// What a split check did to one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Missing components.
    Skipped,
    /// Still one connected piece.
    Intact,
    /// A core-bearing survivor kept the body; `groups` fragments came off.
    Split { groups: usize },
    /// No component held a core, or no shards were left; every component
    /// came off.
    Destroyed { groups: usize },
}

/// Split every body queued this tick. Runs after all damage is applied.
pub fn drain_split_queue(
    world: &mut hecs::World,
    ctx: &mut SimulationContext,
    wrecks: &mut dyn WreckSink,
) -> Vec<(hecs::Entity, SplitOutcome)> {
    let queued = ctx.splits.take();
    let mut outcomes = Vec::with_capacity(queued.len());
    for body in queued {
        outcomes.push((body, split_body(world, ctx, body, wrecks)));
    }
    outcomes
}

/// Edge-connected components of a lattice, each listed in flood-fill order.
pub fn connected_components(lattice: &HexLattice) -> Vec<Vec<CellCoord>> {
    let mut seen: HashSet<CellCoord> = HashSet::with_capacity(lattice.len());
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for shard in lattice.shards() {
        if !seen.insert(shard.coord) {
            continue;
        }
        let mut component = Vec::new();
        stack.push(shard.coord);
        while let Some(coord) = stack.pop() {
            component.push(coord);
            for next in coord.neighbors() {
                if lattice.contains(next) && seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        components.push(component);
    }
    components
}

/// Largest component holding a core shard; the first one wins ties.
fn pick_survivor(lattice: &HexLattice, components: &[Vec<CellCoord>]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, component) in components.iter().enumerate() {
        let has_core = component
            .iter()
            .any(|c| lattice.get(*c).is_some_and(|s| s.is_core));
        if !has_core {
            continue;
        }
        if best.map_or(true, |b| component.len() > components[b].len()) {
            best = Some(i);
        }
    }
    best
}

/// Check one body and detach every fragment that lost the core.
pub fn split_body(
    world: &mut hecs::World,
    ctx: &mut SimulationContext,
    body: hecs::Entity,
    wrecks: &mut dyn WreckSink,
) -> SplitOutcome {
    let Ok((transform, motion, hull, lattice, wreck)) = world.query_one_mut::<(
        &mut Transform2d,
        Option<&Motion>,
        &mut Hull,
        &mut HexLattice,
        Option<&Wreckage>,
    )>(body) else {
        return SplitOutcome::Skipped;
    };
    if lattice.is_empty() {
        hull.destroyed = true;
        return SplitOutcome::Destroyed { groups: 0 };
    }

    let components = connected_components(lattice);
    if components.len() <= 1 {
        return SplitOutcome::Intact;
    }

    let survivor = pick_survivor(lattice, &components);
    let frame = BodyFrame::new(*transform, motion.copied().unwrap_or_default());
    let ratio = lattice.hp_ratio();
    let cell_radius = lattice.cell_radius();

    let mut groups = Vec::with_capacity(components.len());
    for (i, component) in components.iter().enumerate() {
        if Some(i) == survivor {
            continue;
        }
        let shards: Vec<Shard> = component.iter().filter_map(|c| lattice.remove(*c)).collect();
        let lost: f32 = shards.iter().filter(|s| s.hp > 0.0).map(|s| s.hp).sum();
        hull.take_damage(lost * ratio);
        groups.push(DebrisGroup {
            source: body,
            shards,
            transform: frame.transform,
            motion: frame.motion,
            cell_radius,
        });
    }

    let offset = lattice.settle();
    transform.position += transform.local_vector_to_world(offset);

    let outcome = match survivor {
        Some(_) => SplitOutcome::Split {
            groups: groups.len(),
        },
        None => {
            hull.destroyed = true;
            SplitOutcome::Destroyed {
                groups: groups.len(),
            }
        }
    };
    debug!(
        ?body,
        ?outcome,
        survivor_shards = lattice.len(),
        hp = hull.hp,
        "body split"
    );

    if wreck.is_some() {
        for group in groups {
            for shard in group.shards {
                ctx.debris
                    .push(DebrisShard::detach(shard, &frame, Vec2::ZERO, &mut ctx.rng));
            }
        }
    } else {
        for group in groups {
            wrecks.spawn_wreck(group);
        }
    }
    outcome
}
