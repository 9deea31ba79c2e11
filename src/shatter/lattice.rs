//! The hex lattice owned by one destructible body.

use std::collections::HashMap;

use glam::Vec2;
use tracing::debug;

use super::hex::{CellCoord, HexGeometry};
use super::raster::DamageRaster;
use super::shard::Shard;
use super::spatial::SpatialIndex;

/// Re-centring offsets shorter than this are treated as zero.
const RECENTER_EPSILON: f32 = 1e-4;

/// Shards of one body: a dense list for iteration, a coordinate map for
/// lookup and a spatial index for proximity queries.
///
/// All three are kept in sync by [`HexLattice::remove`] and
/// [`HexLattice::recenter`]; nothing else mutates membership.
#[derive(Debug, Clone)]
pub struct HexLattice {
    geometry: HexGeometry,
    shards: Vec<Shard>,
    lookup: HashMap<CellCoord, usize>,
    index: Option<SpatialIndex>,
    hp_ratio: f32,
    local_offset: Vec2,
    content_size: Vec2,
    raw_radius: f32,
    coord_min: CellCoord,
    coord_max: CellCoord,
    raster: DamageRaster,
    raster_dirty: bool,
}

impl HexLattice {
    /// A lattice with no shards (pure visual body, no hp coupling).
    pub fn empty(geometry: HexGeometry) -> Self {
        Self {
            geometry,
            shards: Vec::new(),
            lookup: HashMap::new(),
            index: None,
            hp_ratio: 1.0,
            local_offset: Vec2::ZERO,
            content_size: Vec2::ZERO,
            raw_radius: 0.0,
            coord_min: CellCoord::default(),
            coord_max: CellCoord::default(),
            raster: DamageRaster::default(),
            raster_dirty: true,
        }
    }

    /// Assemble a lattice from shards and calibrate `hp_ratio` so that the
    /// summed shard hit points map onto `body_max_hp`.
    ///
    /// Later shards replace earlier ones at the same coordinate.
    pub fn from_shards(
        geometry: HexGeometry,
        shards: impl IntoIterator<Item = Shard>,
        body_max_hp: f32,
    ) -> Self {
        let mut lattice = Self::empty(geometry);
        for shard in shards {
            match lattice.lookup.get(&shard.coord) {
                Some(&slot) => lattice.shards[slot] = shard,
                None => {
                    lattice.lookup.insert(shard.coord, lattice.shards.len());
                    lattice.shards.push(shard);
                }
            }
        }

        let total: f32 = lattice.shards.iter().map(|s| s.hp).sum();
        lattice.hp_ratio = if total > 0.0 { body_max_hp / total } else { 1.0 };
        lattice.refresh_metrics();
        lattice.rebuild_index();
        debug!(
            shards = lattice.shards.len(),
            hp_ratio = lattice.hp_ratio,
            raw_radius = lattice.raw_radius,
            "lattice assembled"
        );
        lattice
    }

    #[inline]
    pub fn geometry(&self) -> &HexGeometry {
        &self.geometry
    }

    #[inline]
    pub fn cell_radius(&self) -> f32 {
        self.geometry.radius
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    #[inline]
    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    #[inline]
    pub fn get(&self, coord: CellCoord) -> Option<&Shard> {
        self.lookup.get(&coord).map(|&slot| &self.shards[slot])
    }

    #[inline]
    pub fn get_mut(&mut self, coord: CellCoord) -> Option<&mut Shard> {
        self.lookup.get(&coord).map(|&slot| &mut self.shards[slot])
    }

    #[inline]
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.lookup.contains_key(&coord)
    }

    /// Conversion factor from shard hit points to the body's hit-point pool.
    #[inline]
    pub fn hp_ratio(&self) -> f32 {
        self.hp_ratio
    }

    /// Farthest shard centre from the local origin, plus one cell radius.
    #[inline]
    pub fn raw_radius(&self) -> f32 {
        self.raw_radius
    }

    /// Top-left corner of the content box in local units.
    #[inline]
    pub fn local_offset(&self) -> Vec2 {
        self.local_offset
    }

    #[inline]
    pub fn content_width(&self) -> f32 {
        self.content_size.x
    }

    #[inline]
    pub fn content_height(&self) -> f32 {
        self.content_size.y
    }

    /// Inclusive coordinate bounds of resident shards.
    #[inline]
    pub fn coord_bounds(&self) -> (CellCoord, CellCoord) {
        (self.coord_min, self.coord_max)
    }

    pub fn total_hp(&self) -> f32 {
        self.shards.iter().map(|s| s.hp.max(0.0)).sum()
    }

    pub fn core_count(&self) -> usize {
        self.shards.iter().filter(|s| s.is_core).count()
    }

    /// Closed-form estimate of the cell containing a local point.
    #[inline]
    pub fn cell_at(&self, local: Vec2) -> CellCoord {
        self.geometry.cell_at(local)
    }

    #[inline]
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Drop the spatial index. Queries fall back to linear scans until
    /// [`HexLattice::rebuild_index`] runs again.
    pub fn clear_index(&mut self) {
        self.index = None;
    }

    pub fn rebuild_index(&mut self) {
        self.index = Some(SpatialIndex::build(
            self.geometry.radius,
            self.shards.iter().map(|s| (s.coord, s.position)),
        ));
    }

    /// Shards whose centres lie inside `[min, max]`.
    pub fn query_bounds(&self, min: Vec2, max: Vec2) -> Vec<&Shard> {
        let inside = |p: Vec2| p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y;
        match &self.index {
            Some(index) => index
                .query_bounds(min, max)
                .into_iter()
                .filter_map(|coord| self.get(coord))
                .filter(|s| inside(s.position))
                .collect(),
            None => self.shards.iter().filter(|s| inside(s.position)).collect(),
        }
    }

    /// Shards whose centres lie within `radius` of `center`.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<&Shard> {
        let r2 = radius * radius;
        match &self.index {
            Some(index) => index
                .query_radius(center, radius)
                .into_iter()
                .filter_map(|coord| self.get(coord))
                .filter(|s| s.position.distance_squared(center) <= r2)
                .collect(),
            None => self
                .shards
                .iter()
                .filter(|s| s.position.distance_squared(center) <= r2)
                .collect(),
        }
    }

    /// Remove a shard from the lattice, the coordinate map and the spatial
    /// index together, cutting its hole in the raster cache.
    pub fn remove(&mut self, coord: CellCoord) -> Option<Shard> {
        let slot = self.lookup.remove(&coord)?;
        let shard = self.shards.swap_remove(slot);
        if let Some(moved) = self.shards.get(slot) {
            self.lookup.insert(moved.coord, slot);
        }
        if let Some(index) = &mut self.index {
            index.remove(coord, shard.position);
        }
        if !self.raster_dirty {
            self.raster.cut_hole(shard.position, self.geometry.radius);
        }
        Some(shard)
    }

    /// Shift the local origin to the mean shard position.
    ///
    /// Coordinates move by the rounded mean coordinate (columns by an even
    /// count, preserving parity adjacency) and the grid origin absorbs the
    /// remainder, so `cell_at` stays exact. Metrics and the spatial index are
    /// rebuilt and the raster is marked for a full redraw. Returns the local
    /// offset that was removed; the owner adds it (rotated and scaled) to its
    /// world position.
    pub fn recenter(&mut self) -> Vec2 {
        if self.shards.is_empty() {
            return Vec2::ZERO;
        }
        let n = self.shards.len() as f32;
        let mean = self.shards.iter().map(|s| s.position).sum::<Vec2>() / n;
        if mean.length() < RECENTER_EPSILON {
            return Vec2::ZERO;
        }

        let mean_col = self.shards.iter().map(|s| s.coord.col as f32).sum::<f32>() / n;
        let mean_row = self.shards.iter().map(|s| s.coord.row as f32).sum::<f32>() / n;
        let shift = CellCoord::new(
            (mean_col * 0.5).round() as i32 * 2,
            mean_row.round() as i32,
        );
        let back = CellCoord::new(-shift.col, -shift.row);

        self.geometry.origin += self.geometry.cell_offset(shift) - mean;
        for shard in &mut self.shards {
            shard.relocate(back, mean);
        }
        self.lookup = self
            .shards
            .iter()
            .enumerate()
            .map(|(slot, s)| (s.coord, slot))
            .collect();

        self.refresh_metrics();
        self.rebuild_index();
        self.raster_dirty = true;
        mean
    }

    /// Restore every derived structure after shards were removed in bulk.
    ///
    /// Re-centres when the mean drifted; otherwise metrics and the index are
    /// rebuilt in place. The raster is always marked for a full redraw.
    pub(crate) fn settle(&mut self) -> Vec2 {
        let offset = self.recenter();
        if offset == Vec2::ZERO {
            self.refresh_metrics();
            self.rebuild_index();
            self.raster_dirty = true;
        }
        offset
    }

    /// Recompute bounding metrics from the resident shards.
    pub fn refresh_metrics(&mut self) {
        let r = self.geometry.radius;
        if self.shards.is_empty() {
            self.local_offset = Vec2::ZERO;
            self.content_size = Vec2::ZERO;
            self.raw_radius = 0.0;
            self.coord_min = CellCoord::default();
            self.coord_max = CellCoord::default();
            return;
        }

        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        let mut cmin = CellCoord::new(i32::MAX, i32::MAX);
        let mut cmax = CellCoord::new(i32::MIN, i32::MIN);
        let mut farthest = 0.0f32;
        for shard in &self.shards {
            min = min.min(shard.position);
            max = max.max(shard.position);
            cmin.col = cmin.col.min(shard.coord.col);
            cmin.row = cmin.row.min(shard.coord.row);
            cmax.col = cmax.col.max(shard.coord.col);
            cmax.row = cmax.row.max(shard.coord.row);
            farthest = farthest.max(shard.position.length());
        }

        self.local_offset = min - Vec2::splat(r);
        self.content_size = max - min + Vec2::splat(2.0 * r);
        self.raw_radius = farthest + r;
        self.coord_min = cmin;
        self.coord_max = cmax;
    }

    /// Whether the raster must be redrawn from scratch before use.
    #[inline]
    pub fn raster_dirty(&self) -> bool {
        self.raster_dirty
    }

    /// The cached raster. May be stale while [`HexLattice::raster_dirty`]
    /// is set; call [`HexLattice::refresh_raster`] first.
    #[inline]
    pub fn raster(&self) -> &DamageRaster {
        &self.raster
    }

    /// Redraw the raster if it is dirty.
    pub fn refresh_raster(&mut self) -> &DamageRaster {
        if self.raster_dirty {
            self.raster.redraw(
                self.local_offset,
                self.content_size,
                self.geometry.radius,
                self.shards.iter(),
            );
            self.raster_dirty = false;
        }
        &self.raster
    }

    /// Repaint the decal of a damaged shard.
    pub(crate) fn paint_damage(&mut self, coord: CellCoord) {
        if self.raster_dirty {
            return;
        }
        if let Some(&slot) = self.lookup.get(&coord) {
            let shard = &self.shards[slot];
            self.raster.paint_decal(
                shard.position,
                self.geometry.radius,
                shard.is_core,
                shard.severity(),
            );
        }
    }
}
