//! Decomposition of a sprite opacity mask into a hex lattice.

use glam::Vec2;
use tracing::{debug, warn};

use crate::error::ShatterError;

use super::hex::{CellCoord, HexGeometry};
use super::lattice::HexLattice;
use super::shard::Shard;
use super::ShatterConfig;

/// Alpha channel of a source sprite, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl OpacityMask {
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Result<Self, ShatterError> {
        if alpha.len() != width as usize * height as usize {
            return Err(ShatterError::MaskSizeMismatch {
                width,
                height,
                actual: alpha.len(),
            });
        }
        Ok(Self {
            width,
            height,
            alpha,
        })
    }

    /// Extract the alpha channel from tightly packed RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, ShatterError> {
        let pixels: &[[u8; 4]] =
            bytemuck::try_cast_slice(rgba).map_err(|_| ShatterError::NotRgba(rgba.len()))?;
        Self::new(width, height, pixels.iter().map(|p| p[3]).collect())
    }

    /// Mask with every pixel for which `opaque(x, y)` holds at full alpha.
    pub fn from_fn(width: u32, height: u32, mut opaque: impl FnMut(u32, u32) -> bool) -> Self {
        let mut alpha = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                alpha.push(if opaque(x, y) { 255 } else { 0 });
            }
        }
        Self {
            width,
            height,
            alpha,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha of the pixel containing `(x, y)`; zero outside the mask.
    pub fn alpha_at(&self, x: f32, y: f32) -> u8 {
        if x < 0.0 || y < 0.0 {
            return 0;
        }
        let (px, py) = (x as u32, y as u32);
        if px >= self.width || py >= self.height {
            return 0;
        }
        self.alpha[(py * self.width + px) as usize]
    }
}

/// Size of the reinforced core block, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoreSize {
    pub cols: u32,
    pub rows: u32,
}

impl CoreSize {
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }
}

/// One-shot builder turning opacity masks into lattices.
#[derive(Debug, Clone)]
pub struct Decomposer {
    geometry: HexGeometry,
    alpha_threshold: u8,
    base_hp: f32,
    core_multiplier: f32,
}

impl Decomposer {
    pub fn new(config: &ShatterConfig) -> Result<Self, ShatterError> {
        let radius = config.cell_radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ShatterError::InvalidCellRadius(radius));
        }
        Ok(Self {
            geometry: HexGeometry::new(radius),
            alpha_threshold: config.alpha_threshold,
            base_hp: config.base_shard_hp,
            core_multiplier: config.core_multiplier,
        })
    }

    /// Tile `mask` with hexagons and build a lattice whose shard hit points
    /// map onto `body_max_hp`.
    ///
    /// A mask with no opaque pixels yields an empty lattice: the body stays
    /// collidable through its own radius but is not destructible here.
    pub fn decompose(&self, mask: &OpacityMask, core: CoreSize, body_max_hp: f32) -> HexLattice {
        let hits = self.sample_cells(mask);
        if hits.is_empty() {
            warn!(
                width = mask.width(),
                height = mask.height(),
                "opacity mask has no opaque cells, lattice left empty"
            );
            return HexLattice::empty(self.geometry);
        }

        // Centre horizontally on the occupied cells, vertically on the mask.
        let (min_x, max_x) = hits
            .iter()
            .map(|c| self.geometry.cell_offset(*c).x)
            .fold((f32::MAX, f32::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
        let pivot = Vec2::new((min_x + max_x) * 0.5, mask.height() as f32 * 0.5);

        let (min_col, max_col) = min_max(hits.iter().map(|c| c.col));
        let (min_row, max_row) = min_max(hits.iter().map(|c| c.row));
        let shift = CellCoord::new(
            (((min_col + max_col) as f32 * 0.25).round() as i32) * 2,
            ((min_row + max_row) as f32 * 0.5).round() as i32,
        );
        let geometry = self
            .geometry
            .with_origin(self.geometry.cell_offset(shift) - pivot);

        let core_cols = core_window(min_col - shift.col, max_col - shift.col, core.cols);
        let core_rows = core_window(min_row - shift.row, max_row - shift.row, core.rows);

        let shards: Vec<Shard> = hits
            .into_iter()
            .map(|coord| {
                let coord = CellCoord::new(coord.col - shift.col, coord.row - shift.row);
                let is_core = core_cols.is_some_and(|(lo, hi)| (lo..=hi).contains(&coord.col))
                    && core_rows.is_some_and(|(lo, hi)| (lo..=hi).contains(&coord.row));
                Shard::structural(coord, &geometry, self.base_hp, self.core_multiplier, is_core)
            })
            .collect();

        let lattice = HexLattice::from_shards(geometry, shards, body_max_hp);
        debug!(
            shards = lattice.len(),
            cores = lattice.core_count(),
            "decomposed opacity mask"
        );
        lattice
    }

    /// Cells (in mask-pixel space, origin at the top-left pixel) with at
    /// least one opaque probe.
    fn sample_cells(&self, mask: &OpacityMask) -> Vec<CellCoord> {
        let r = self.geometry.radius;
        let cols = (mask.width() as f32 / self.geometry.col_spacing()).ceil() as i32 + 1;
        let rows = (mask.height() as f32 / self.geometry.row_spacing()).ceil() as i32 + 1;
        let probes = [
            Vec2::ZERO,
            Vec2::new(r * 0.5, 0.0),
            Vec2::new(-r * 0.5, 0.0),
            Vec2::new(0.0, r * 0.5),
            Vec2::new(0.0, -r * 0.5),
        ];

        let mut hits = Vec::new();
        for col in 0..cols {
            for row in 0..rows {
                let coord = CellCoord::new(col, row);
                let center = self.geometry.cell_offset(coord);
                let opaque = probes.iter().any(|p| {
                    let s = center + *p;
                    mask.alpha_at(s.x, s.y) > self.alpha_threshold
                });
                if opaque {
                    hits.push(coord);
                }
            }
        }
        hits
    }
}

fn min_max(values: impl Iterator<Item = i32>) -> (i32, i32) {
    values.fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Inclusive range of `size` cells centred on `lo..=hi`, clamped to it.
/// A zero size means no core.
fn core_window(lo: i32, hi: i32, size: u32) -> Option<(i32, i32)> {
    if size == 0 {
        return None;
    }
    let size = size as i32;
    let center = (lo + hi) as f32 * 0.5;
    let start = (center - (size - 1) as f32 * 0.5).floor() as i32;
    let start = start.min(hi - size + 1).max(lo);
    Some((start, (start + size - 1).min(hi)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ship_mask() -> OpacityMask {
        // A wedge hull: wide at the back, tapering to the nose.
        OpacityMask::from_fn(96, 48, |x, y| {
            let half = 24.0 - (x as f32) * 0.2;
            (y as f32 - 24.0).abs() < half
        })
    }

    fn decomposer() -> Decomposer {
        Decomposer::new(&ShatterConfig::default()).unwrap()
    }

    #[test]
    fn test_mask_size_checked() {
        assert!(matches!(
            OpacityMask::new(4, 4, vec![0; 15]),
            Err(ShatterError::MaskSizeMismatch { actual: 15, .. })
        ));
        assert!(OpacityMask::new(4, 4, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_from_rgba() {
        let rgba = [10, 20, 30, 255, 0, 0, 0, 0];
        let mask = OpacityMask::from_rgba(2, 1, &rgba).unwrap();
        assert_eq!(mask.alpha_at(0.5, 0.5), 255);
        assert_eq!(mask.alpha_at(1.5, 0.5), 0);
        assert!(matches!(
            OpacityMask::from_rgba(1, 1, &[1, 2, 3]),
            Err(ShatterError::NotRgba(3))
        ));
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let config = ShatterConfig {
            cell_radius: 0.0,
            ..ShatterConfig::default()
        };
        assert!(matches!(
            Decomposer::new(&config),
            Err(ShatterError::InvalidCellRadius(_))
        ));
    }

    #[test]
    fn test_empty_mask_gives_empty_lattice() {
        let mask = OpacityMask::from_fn(32, 32, |_, _| false);
        let lattice = decomposer().decompose(&mask, CoreSize::new(2, 2), 500.0);
        assert!(lattice.is_empty());
        assert_eq!(lattice.hp_ratio(), 1.0);
        assert_eq!(lattice.raw_radius(), 0.0);
    }

    #[test]
    fn test_decomposition_deterministic() {
        let mask = ship_mask();
        let a = decomposer().decompose(&mask, CoreSize::new(3, 2), 800.0);
        let b = decomposer().decompose(&mask, CoreSize::new(3, 2), 800.0);
        let key = |l: &HexLattice| {
            let mut v: Vec<(CellCoord, bool)> = l.shards().iter().map(|s| (s.coord, s.is_core)).collect();
            v.sort();
            v
        };
        assert!(!a.is_empty());
        assert_eq!(key(&a), key(&b));
        assert_eq!(a.hp_ratio(), b.hp_ratio());
    }

    #[test]
    fn test_hp_coupling_after_decomposition() {
        let lattice = decomposer().decompose(&ship_mask(), CoreSize::new(2, 2), 1200.0);
        let coupled: f32 = lattice.shards().iter().map(|s| s.hp).sum::<f32>() * lattice.hp_ratio();
        assert!((coupled - 1200.0).abs() < 0.05, "coupled hp {coupled}");
    }

    #[test]
    fn test_horizontally_centred() {
        let lattice = decomposer().decompose(&ship_mask(), CoreSize::new(2, 2), 100.0);
        let (lo, hi) = lattice
            .shards()
            .iter()
            .map(|s| s.position.x)
            .fold((f32::MAX, f32::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
        assert!((lo + hi).abs() < 1e-3, "x span {lo}..{hi}");
    }

    #[test]
    fn test_core_block_assigned() {
        let config = ShatterConfig::default();
        let lattice = decomposer().decompose(&ship_mask(), CoreSize::new(2, 2), 100.0);
        let cores: Vec<&Shard> = lattice.shards().iter().filter(|s| s.is_core).collect();
        assert_eq!(cores.len(), 4);
        for core in cores {
            assert_eq!(core.hp, config.base_shard_hp * config.core_multiplier);
            assert_eq!(core.hardness, config.core_multiplier);
        }
    }

    #[test]
    fn test_core_block_exact_on_odd_and_even_spans() {
        let mut spans = (false, false);
        for width in 40..76 {
            let mask = OpacityMask::from_fn(width, 40, |_, _| true);
            for n in 1..=4u32 {
                let lattice = decomposer().decompose(&mask, CoreSize::new(n, n), 100.0);
                let (lo, hi) = min_max(lattice.shards().iter().map(|s| s.coord.col));
                let span = hi - lo + 1;
                if span % 2 == 0 {
                    spans.1 = true;
                } else {
                    spans.0 = true;
                }

                let cores: Vec<CellCoord> =
                    lattice.shards().iter().filter(|s| s.is_core).map(|s| s.coord).collect();
                assert_eq!(cores.len() as u32, n * n, "width {width} span {span} core {n}x{n}");
                let (core_lo, core_hi) = min_max(cores.iter().map(|c| c.col));
                assert_eq!(core_hi - core_lo + 1, n as i32);
                let (row_lo, row_hi) = min_max(cores.iter().map(|c| c.row));
                assert_eq!(row_hi - row_lo + 1, n as i32);
                // Centred: the gaps on either side differ by at most one column.
                assert!(((core_lo - lo) - (hi - core_hi)).abs() <= 1);
            }
        }
        assert!(spans.0 && spans.1, "both span parities covered");
    }

    #[test]
    fn test_core_window_clamped() {
        assert_eq!(core_window(0, 4, 2), Some((1, 2)));
        assert_eq!(core_window(0, 5, 1), Some((2, 2)));
        assert_eq!(core_window(-3, 3, 4), Some((-2, 1)));
        assert_eq!(core_window(0, 1, 5), Some((0, 1)));
        assert_eq!(core_window(0, 4, 0), None);
    }

    #[test]
    fn test_zero_core_size() {
        let lattice = decomposer().decompose(&ship_mask(), CoreSize::default(), 100.0);
        assert_eq!(lattice.core_count(), 0);
    }

    #[test]
    fn test_positions_match_geometry() {
        let lattice = decomposer().decompose(&ship_mask(), CoreSize::new(2, 2), 100.0);
        for shard in lattice.shards() {
            assert_eq!(lattice.cell_at(shard.position), shard.coord);
        }
    }
}
