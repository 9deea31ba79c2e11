//! Flat-topped hex grid geometry in odd-q offset coordinates.
//!
//! Columns advance by `1.5 r` along x. Rows advance by `sqrt(3) r` along y,
//! and odd columns sit half a row lower than even ones, so neighbour offsets
//! depend on column parity.

use glam::Vec2;

const SQRT_3: f32 = 1.732_050_8;

/// Address of one cell in a lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CellCoord {
    pub col: i32,
    pub row: i32,
}

/// Neighbour offsets `(dcol, drow)` for even columns.
const EVEN_NEIGHBORS: [(i32, i32); 6] = [(1, -1), (1, 0), (0, -1), (0, 1), (-1, -1), (-1, 0)];
/// Neighbour offsets `(dcol, drow)` for odd columns.
const ODD_NEIGHBORS: [(i32, i32); 6] = [(1, 0), (1, 1), (0, -1), (0, 1), (-1, 0), (-1, 1)];

impl CellCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    #[inline]
    pub fn is_odd_col(&self) -> bool {
        self.col & 1 == 1
    }

    /// The six edge-adjacent cells.
    pub fn neighbors(&self) -> [CellCoord; 6] {
        let offsets = if self.is_odd_col() {
            &ODD_NEIGHBORS
        } else {
            &EVEN_NEIGHBORS
        };
        offsets.map(|(dc, dr)| CellCoord::new(self.col + dc, self.row + dr))
    }

    /// Translate by a whole-cell shift. Only parity-preserving shifts (even
    /// `col`) keep positions and adjacency consistent.
    #[inline]
    pub fn offset_by(&self, shift: CellCoord) -> CellCoord {
        CellCoord::new(self.col + shift.col, self.row + shift.row)
    }
}

/// Cell radius plus the local position of cell `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexGeometry {
    pub radius: f32,
    pub origin: Vec2,
}

impl HexGeometry {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            origin: Vec2::ZERO,
        }
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    #[inline]
    pub fn col_spacing(&self) -> f32 {
        1.5 * self.radius
    }

    #[inline]
    pub fn row_spacing(&self) -> f32 {
        SQRT_3 * self.radius
    }

    /// Offset of a cell centre from cell `(0, 0)`. Additive for even column
    /// shifts: `offset(a) + offset(b) == offset(a + b)` when `b.col` is even.
    #[inline]
    pub fn cell_offset(&self, coord: CellCoord) -> Vec2 {
        let parity = if coord.is_odd_col() { 0.5 } else { 0.0 };
        Vec2::new(
            coord.col as f32 * self.col_spacing(),
            (coord.row as f32 + parity) * self.row_spacing(),
        )
    }

    /// Local position of a cell centre.
    #[inline]
    pub fn center(&self, coord: CellCoord) -> Vec2 {
        self.origin + self.cell_offset(coord)
    }

    /// Closed-form inverse: the cell whose hexagon contains `point`.
    pub fn cell_at(&self, point: Vec2) -> CellCoord {
        let p = (point - self.origin) / self.radius;
        // Fractional axial coordinates, then cube rounding.
        let q = p.x * (2.0 / 3.0);
        let r = -p.x / 3.0 + p.y * (SQRT_3 / 3.0);
        let s = -q - r;

        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();
        let dq = (rq - q).abs();
        let dr = (rr - r).abs();
        let ds = (rs - s).abs();
        if dq > dr && dq > ds {
            rq = -rr - rs;
        } else if dr > ds {
            rr = -rq - rs;
        }

        let col = rq as i32;
        let row = rr as i32 + (col - (col & 1)) / 2;
        CellCoord::new(col, row)
    }

    /// Fractional column/row of a point, used to derive cell windows.
    #[inline]
    pub fn fractional_cell(&self, point: Vec2) -> Vec2 {
        let p = point - self.origin;
        Vec2::new(p.x / self.col_spacing(), p.y / self.row_spacing())
    }

    /// The six rest-shape vertices of a flat-topped hexagon, relative to its
    /// centre.
    pub fn hexagon(&self) -> [Vec2; 6] {
        std::array::from_fn(|i| Vec2::from_angle(i as f32 * std::f32::consts::FRAC_PI_3) * self.radius)
    }

    /// Whether `offset` (relative to a cell centre) lies inside a flat-topped
    /// hexagon of circumradius `radius`.
    #[inline]
    pub fn hexagon_contains(offset: Vec2, radius: f32) -> bool {
        let x = offset.x.abs();
        let y = offset.y.abs();
        let half_height = radius * SQRT_3 * 0.5;
        x <= radius && y <= half_height && SQRT_3 * x + y <= SQRT_3 * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_at_inverts_center() {
        let geometry = HexGeometry::new(6.0).with_origin(Vec2::new(-13.0, 4.5));
        for col in -5..6 {
            for row in -5..6 {
                let coord = CellCoord::new(col, row);
                assert_eq!(geometry.cell_at(geometry.center(coord)), coord);
            }
        }
    }

    #[test]
    fn test_cell_at_near_edges() {
        let geometry = HexGeometry::new(10.0);
        let coord = CellCoord::new(3, 2);
        let center = geometry.center(coord);
        // Points well inside the hexagon map back to it.
        for v in geometry.hexagon() {
            assert_eq!(geometry.cell_at(center + v * 0.8), coord);
        }
    }

    #[test]
    fn test_neighbors_are_adjacent() {
        let geometry = HexGeometry::new(1.0);
        for coord in [CellCoord::new(0, 0), CellCoord::new(1, 0), CellCoord::new(-3, 2)] {
            for n in coord.neighbors() {
                let d = geometry.center(coord).distance(geometry.center(n));
                assert!(
                    (d - geometry.row_spacing()).abs() < 1e-4,
                    "{coord:?} -> {n:?} distance {d}"
                );
            }
        }
    }

    #[test]
    fn test_neighbor_relation_symmetric() {
        for coord in [CellCoord::new(0, 0), CellCoord::new(7, -2), CellCoord::new(-1, 4)] {
            for n in coord.neighbors() {
                assert!(n.neighbors().contains(&coord), "{n:?} should list {coord:?}");
            }
        }
    }

    #[test]
    fn test_even_shift_is_additive() {
        let geometry = HexGeometry::new(4.0);
        let shift = CellCoord::new(-4, 3);
        for coord in [CellCoord::new(1, 1), CellCoord::new(2, -3), CellCoord::new(5, 0)] {
            let moved = coord.offset_by(shift);
            let sum = geometry.cell_offset(coord) + geometry.cell_offset(shift);
            assert!((geometry.cell_offset(moved) - sum).length() < 1e-4);
        }
    }

    #[test]
    fn test_hexagon_contains() {
        assert!(HexGeometry::hexagon_contains(Vec2::ZERO, 1.0));
        assert!(HexGeometry::hexagon_contains(Vec2::new(0.99, 0.0), 1.0));
        assert!(!HexGeometry::hexagon_contains(Vec2::new(0.0, 0.9), 1.0));
        assert!(!HexGeometry::hexagon_contains(Vec2::new(0.8, 0.6), 1.0));
    }
}
