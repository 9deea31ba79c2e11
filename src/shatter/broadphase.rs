//! Body-level broadphase: which pairs of lattice bodies might touch.

use std::collections::{HashMap, HashSet};

use glam::Vec2;

use crate::ecs::components::{BodyKind, Transform2d};

use super::damage::BodyFrame;

/// Host-provided spatial structure over bodies.
///
/// Implementations return every body whose bounding circle may overlap a
/// body centred at `position`; false positives are fine, misses are not.
pub trait BodyGrid {
    fn potential_targets(&self, position: Vec2) -> Vec<hecs::Entity>;
}

/// Uniform grid over body centres.
///
/// With a cell size at least as large as the biggest bounding diameter, the
/// 3x3 neighbourhood around a body holds every body it can overlap.
#[derive(Debug, Clone)]
pub struct UniformBodyGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<hecs::Entity>>,
}

impl UniformBodyGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn cell(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, body: hecs::Entity, position: Vec2) {
        let key = self.cell(position);
        self.cells.entry(key).or_default().push(body);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Re-bin every lattice body in `world`.
    pub fn rebuild(&mut self, world: &hecs::World) {
        self.clear();
        for (entity, (kind, transform)) in world.query::<(&BodyKind, &Transform2d)>().iter() {
            if *kind == BodyKind::Lattice {
                self.insert(entity, transform.position);
            }
        }
    }
}

impl BodyGrid for UniformBodyGrid {
    fn potential_targets(&self, position: Vec2) -> Vec<hecs::Entity> {
        let (cx, cy) = self.cell(position);
        let mut out = Vec::new();
        for x in cx - 1..=cx + 1 {
            for y in cy - 1..=cy + 1 {
                if let Some(bodies) = self.cells.get(&(x, y)) {
                    out.extend_from_slice(bodies);
                }
            }
        }
        out
    }
}

/// What the collision resolver needs to know about one body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BodyProxy {
    pub entity: hecs::Entity,
    pub frame: BodyFrame,
    pub mass: f32,
    pub inv_mass: f32,
    /// World-space bounding radius.
    pub radius: f32,
    pub shard_count: usize,
}

/// Candidate pairs as index pairs into `proxies`, lower index first.
///
/// Uses the grid when one is supplied and there are more than `min_bodies`
/// proxies; otherwise tests all pairs. Each unordered pair is reported once.
pub(crate) fn find_pairs(
    proxies: &[BodyProxy],
    grid: Option<&dyn BodyGrid>,
    min_bodies: usize,
) -> Vec<(usize, usize)> {
    match grid {
        Some(grid) if proxies.len() > min_bodies => grid_pairs(proxies, grid),
        _ => {
            let mut pairs = Vec::new();
            for i in 0..proxies.len() {
                for j in (i + 1)..proxies.len() {
                    pairs.push((i, j));
                }
            }
            pairs
        }
    }
}

fn grid_pairs(proxies: &[BodyProxy], grid: &dyn BodyGrid) -> Vec<(usize, usize)> {
    let slots: HashMap<hecs::Entity, usize> = proxies
        .iter()
        .enumerate()
        .map(|(i, p)| (p.entity, i))
        .collect();

    let mut visited: HashSet<(u64, u64)> = HashSet::new();
    let mut pairs = Vec::new();
    for (i, proxy) in proxies.iter().enumerate() {
        for other in grid.potential_targets(proxy.frame.transform.position) {
            let Some(&j) = slots.get(&other) else {
                continue;
            };
            if i == j {
                continue;
            }
            let (a, b) = (proxy.entity.to_bits().get(), other.to_bits().get());
            let key = if a < b { (a, b) } else { (b, a) };
            if visited.insert(key) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs
}
