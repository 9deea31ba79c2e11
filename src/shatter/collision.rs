//! Pairwise structural collisions between lattice bodies.
//!
//! Pipeline per pair:
//!
//! 1. Bounding-circle check on the scaled raw radii
//! 2. Slow contacts: soft symmetric repulsion, no damage
//! 3. Fast contacts: repulsion impulse, then a windowed shard narrow phase
//! 4. Damage both shards of every confirmed contact

use glam::Vec2;
use tracing::trace;

use crate::ecs::components::{BodyKind, Hull, Motion, Transform2d};

use super::broadphase::{find_pairs, BodyGrid, BodyProxy};
use super::contact::{ContactManifold, PairContact, ShardContact};
use super::context::SimulationContext;
use super::damage::{BodyFrame, StrikeTarget};
use super::hex::CellCoord;
use super::lattice::HexLattice;
use super::shard::Shard;
use super::ShatterConfig;

/// A holder shard touches the iterator shard whose centre lies within this
/// many iterator cell radii.
pub const CONTACT_REACH_RATIO: f32 = 2.2;
/// Mass at which the other body's mass contributes one unit of damage.
const MASS_DAMAGE_SCALE: f32 = 500.0;
const SPEED_DAMAGE_SCALE: f32 = 0.15;
const RESTITUTION: f32 = 0.3;
/// Fraction of the impact speed kicked into debris, away from the other body.
const CONTACT_DEBRIS_KICK: f32 = 0.1;
const MAX_CONTACT_SPARKS: usize = 6;

/// Run one collision pass over every lattice body in `world`.
///
/// Skipped on ticks that are not a multiple of `collision_interval`.
/// Returns the manifolds of the fast contacts that touched structure.
pub fn resolve_collisions(
    config: &ShatterConfig,
    world: &mut hecs::World,
    ctx: &mut SimulationContext,
    grid: Option<&dyn BodyGrid>,
) -> Vec<ContactManifold> {
    let interval = u64::from(config.collision_interval.max(1));
    if ctx.tick() % interval != 0 {
        return Vec::new();
    }

    let proxies = gather_proxies(world);
    let pairs = find_pairs(&proxies, grid, config.broadphase_min_bodies);

    let mut manifolds = Vec::new();
    for (i, j) in pairs {
        let (a, b) = (&proxies[i], &proxies[j]);
        let Some(pair) = pair_contact(a, b) else {
            continue;
        };

        if pair.relative_speed < config.soft_contact_speed {
            let push = pair.normal * config.soft_repulsion * pair.overlap;
            nudge(world, a.entity, -push * a.inv_mass);
            nudge(world, b.entity, push * b.inv_mass);
            continue;
        }

        let (ia, ib) = (a.inv_mass, b.inv_mass);
        if ia + ib > 0.0 {
            let closing = pair.closing_speed.max(0.0);
            let impulse =
                (1.0 + RESTITUTION) * closing / (ia + ib) + config.hard_repulsion * pair.overlap;
            nudge(world, a.entity, -pair.normal * impulse * ia);
            nudge(world, b.entity, pair.normal * impulse * ib);
        }

        // The body with fewer shards is probed by lookup; the other is scanned.
        let (iterator, holder, toward_holder) = if a.shard_count <= b.shard_count {
            (a, b, pair.normal)
        } else {
            (b, a, -pair.normal)
        };

        let contacts = {
            let (Ok(holder_lattice), Ok(iter_lattice)) = (
                world.get::<&HexLattice>(holder.entity),
                world.get::<&HexLattice>(iterator.entity),
            ) else {
                continue;
            };
            find_shard_contacts(
                &holder_lattice,
                &holder.frame.transform,
                &iter_lattice,
                &iterator.frame.transform,
                config.window_padding,
            )
        };
        if contacts.is_empty() {
            continue;
        }
        trace!(
            holder = ?holder.entity,
            iterator = ?iterator.entity,
            contacts = contacts.len(),
            speed = pair.relative_speed,
            "structural contact"
        );

        let speed_factor = (pair.relative_speed * SPEED_DAMAGE_SCALE).max(1.0);
        let damage_to_holder =
            config.base_contact_damage + iterator.mass / MASS_DAMAGE_SCALE * speed_factor;
        let damage_to_iterator =
            config.base_contact_damage + holder.mass / MASS_DAMAGE_SCALE * speed_factor;
        let kick = pair.relative_speed * CONTACT_DEBRIS_KICK;

        damage_side(
            world,
            ctx,
            holder,
            contacts.iter().map(|c| c.holder),
            damage_to_holder,
            toward_holder * kick,
        );
        damage_side(
            world,
            ctx,
            iterator,
            contacts.iter().map(|c| c.iterator),
            damage_to_iterator,
            -toward_holder * kick,
        );

        let drift = (a.frame.motion.velocity + b.frame.motion.velocity) * 0.5;
        for contact in contacts.iter().take(MAX_CONTACT_SPARKS) {
            ctx.sparks.emit(contact.point, drift, 1, &mut ctx.rng);
        }

        manifolds.push(ContactManifold {
            holder: holder.entity,
            iterator: iterator.entity,
            pair,
            contacts,
        });
    }
    manifolds
}

fn gather_proxies(world: &hecs::World) -> Vec<BodyProxy> {
    let mut proxies = Vec::new();
    for (entity, (kind, transform, motion, hull, lattice)) in world
        .query::<(&BodyKind, &Transform2d, Option<&Motion>, &Hull, &HexLattice)>()
        .iter()
    {
        if *kind != BodyKind::Lattice {
            continue;
        }
        if !hull.is_alive() || lattice.is_empty() || !transform.is_invertible() {
            trace!(?entity, "body skipped by collision pass");
            continue;
        }
        proxies.push(BodyProxy {
            entity,
            frame: BodyFrame::new(*transform, motion.copied().unwrap_or_default()),
            mass: hull.mass,
            inv_mass: hull.inv_mass(),
            radius: lattice.raw_radius() * transform.scale,
            shard_count: lattice.len(),
        });
    }
    proxies
}

fn pair_contact(a: &BodyProxy, b: &BodyProxy) -> Option<PairContact> {
    let delta = b.frame.transform.position - a.frame.transform.position;
    let distance = delta.length();
    let reach = a.radius + b.radius;
    if distance > reach {
        return None;
    }
    let normal = if distance > f32::EPSILON {
        delta / distance
    } else {
        Vec2::X
    };
    let relative = a.frame.motion.velocity - b.frame.motion.velocity;
    Some(PairContact {
        normal,
        overlap: reach - distance,
        relative_speed: relative.length(),
        closing_speed: relative.dot(normal),
    })
}

/// Add `dv` to a body's velocity. Bodies without [`Motion`] are immovable.
fn nudge(world: &mut hecs::World, entity: hecs::Entity, dv: Vec2) {
    if let Ok(mut motion) = world.get::<&mut Motion>(entity) {
        motion.velocity += dv;
    }
}

fn damage_side(
    world: &mut hecs::World,
    ctx: &mut SimulationContext,
    proxy: &BodyProxy,
    coords: impl Iterator<Item = CellCoord>,
    damage: f32,
    impulse: Vec2,
) {
    let Ok((hull, lattice)) = world.query_one_mut::<(&mut Hull, &mut HexLattice)>(proxy.entity)
    else {
        return;
    };
    if !hull.is_alive() {
        trace!(entity = ?proxy.entity, "contact on destroyed body ignored");
        return;
    }
    let mut target = StrikeTarget {
        body: proxy.entity,
        lattice,
        hull,
        frame: proxy.frame,
    };
    for coord in coords {
        target.strike(coord, damage, impulse, ctx);
    }
}

/// Inclusive holder cell window `(min, max)` that can touch the iterator,
/// or `None` when it falls outside the holder entirely.
fn holder_window(
    holder: &HexLattice,
    holder_t: &Transform2d,
    iter: &HexLattice,
    iter_t: &Transform2d,
    padding: i32,
) -> Option<(CellCoord, CellCoord)> {
    let r = iter.raw_radius();
    let mut lo = Vec2::splat(f32::MAX);
    let mut hi = Vec2::splat(f32::MIN);
    for corner in [
        Vec2::new(-r, -r),
        Vec2::new(r, -r),
        Vec2::new(r, r),
        Vec2::new(-r, r),
    ] {
        let local = holder_t.world_to_local(iter_t.local_to_world(corner));
        lo = lo.min(local);
        hi = hi.max(local);
    }

    let geometry = holder.geometry();
    let flo = geometry.fractional_cell(lo);
    let fhi = geometry.fractional_cell(hi);
    let (bound_min, bound_max) = holder.coord_bounds();
    let min = CellCoord::new(
        (flo.x.floor() as i32 - padding).max(bound_min.col),
        (flo.y.floor() as i32 - padding).max(bound_min.row),
    );
    let max = CellCoord::new(
        (fhi.x.ceil() as i32 + padding).min(bound_max.col),
        (fhi.y.ceil() as i32 + padding).min(bound_max.row),
    );
    (min.col <= max.col && min.row <= max.row).then_some((min, max))
}

/// Confirm a touch between one holder shard and whatever iterator shard
/// contains its centre.
fn probe(
    shard: &Shard,
    holder_t: &Transform2d,
    iter: &HexLattice,
    iter_t: &Transform2d,
) -> Option<ShardContact> {
    let point = holder_t.local_to_world(shard.position);
    let local = iter_t.world_to_local(point);
    let coord = iter.cell_at(local);
    let other = iter.get(coord)?;
    (other.position.distance(local) < iter.cell_radius() * CONTACT_REACH_RATIO).then_some(
        ShardContact {
            holder: shard.coord,
            iterator: coord,
            point,
        },
    )
}

/// Shard contacts between two overlapping lattices.
///
/// Only holder cells inside the window spanned by the iterator's bounds are
/// visited, through the holder's spatial index when it has one.
pub fn find_shard_contacts(
    holder: &HexLattice,
    holder_t: &Transform2d,
    iter: &HexLattice,
    iter_t: &Transform2d,
    padding: i32,
) -> Vec<ShardContact> {
    if holder.is_empty() || iter.is_empty() {
        return Vec::new();
    }
    let Some((min, max)) = holder_window(holder, holder_t, iter, iter_t, padding) else {
        return Vec::new();
    };
    let in_window = |c: CellCoord| {
        c.col >= min.col && c.col <= max.col && c.row >= min.row && c.row <= max.row
    };

    if holder.has_index() {
        let geometry = holder.geometry();
        // Slack so rounding at the window edge cannot drop a shard; the
        // coordinate filter keeps the set exact.
        let slack = Vec2::splat(geometry.radius * 0.5);
        let box_min = geometry.origin - slack
            + Vec2::new(
                min.col as f32 * geometry.col_spacing(),
                min.row as f32 * geometry.row_spacing(),
            );
        let box_max = geometry.origin
            + slack
            + Vec2::new(
                max.col as f32 * geometry.col_spacing(),
                (max.row as f32 + 0.5) * geometry.row_spacing(),
            );
        holder
            .query_bounds(box_min, box_max)
            .into_iter()
            .filter(|s| in_window(s.coord))
            .filter_map(|s| probe(s, holder_t, iter, iter_t))
            .collect()
    } else {
        let mut contacts = Vec::new();
        for col in min.col..=max.col {
            for row in min.row..=max.row {
                if let Some(shard) = holder.get(CellCoord::new(col, row)) {
                    contacts.extend(probe(shard, holder_t, iter, iter_t));
                }
            }
        }
        contacts
    }
}
