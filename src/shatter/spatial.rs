//! Uniform bucket grid over a lattice's resident shards, in local space.

use std::collections::HashMap;

use glam::Vec2;

use super::hex::CellCoord;

/// Bucket edge length as a multiple of the cell radius.
pub const BUCKET_RADIUS_FACTOR: f32 = 3.0;

/// Bucket map from `(floor(x/b), floor(y/b))` to the shards centred inside.
///
/// Buckets hold cell coordinates rather than dense indices, so swap-removal
/// in the lattice's shard list never invalidates them.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    bucket_size: f32,
    buckets: HashMap<(i32, i32), Vec<CellCoord>>,
    len: usize,
}

impl SpatialIndex {
    pub fn new(bucket_size: f32) -> Self {
        Self {
            bucket_size: bucket_size.max(f32::EPSILON),
            buckets: HashMap::new(),
            len: 0,
        }
    }

    /// Index sized for cells of the given radius.
    pub fn for_radius(cell_radius: f32) -> Self {
        Self::new(cell_radius * BUCKET_RADIUS_FACTOR)
    }

    /// Build from `(coord, position)` pairs.
    pub fn build(cell_radius: f32, entries: impl IntoIterator<Item = (CellCoord, Vec2)>) -> Self {
        let mut index = Self::for_radius(cell_radius);
        for (coord, position) in entries {
            index.insert(coord, position);
        }
        index
    }

    #[inline]
    pub fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    #[inline]
    fn bucket_key(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.bucket_size).floor() as i32,
            (position.y / self.bucket_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, coord: CellCoord, position: Vec2) {
        let key = self.bucket_key(position);
        self.buckets.entry(key).or_default().push(coord);
        self.len += 1;
    }

    /// Remove `coord` from the bucket containing `position`. Swap-removes
    /// within that single bucket; returns whether the entry was present.
    pub fn remove(&mut self, coord: CellCoord, position: Vec2) -> bool {
        let key = self.bucket_key(position);
        let Some(bucket) = self.buckets.get_mut(&key) else {
            return false;
        };
        let Some(slot) = bucket.iter().position(|c| *c == coord) else {
            return false;
        };
        bucket.swap_remove(slot);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        self.len -= 1;
        true
    }

    /// Candidates from every bucket overlapping the box `[min, max]`. Callers
    /// filter by exact position.
    pub fn query_bounds_into(&self, min: Vec2, max: Vec2, out: &mut Vec<CellCoord>) {
        out.clear();
        let (x0, y0) = self.bucket_key(min);
        let (x1, y1) = self.bucket_key(max);
        for bx in x0..=x1 {
            for by in y0..=y1 {
                if let Some(bucket) = self.buckets.get(&(bx, by)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    pub fn query_bounds(&self, min: Vec2, max: Vec2) -> Vec<CellCoord> {
        let mut out = Vec::new();
        self.query_bounds_into(min, max, &mut out);
        out
    }

    /// Candidates from every bucket overlapping the circle's bounding box.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<CellCoord> {
        let reach = Vec2::splat(radius.max(0.0));
        self.query_bounds(center - reach, center + reach)
    }
}
