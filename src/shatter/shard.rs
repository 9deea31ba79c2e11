//! A single hexagonal structural cell.

use glam::Vec2;

use super::hex::{CellCoord, HexGeometry};

/// Displacement of an outline vertex from its rest position never exceeds
/// this fraction of the cell radius.
pub const MAX_DEFORM_RATIO: f32 = 0.4;
/// Push applied to a vertex at zero distance from the hit, as a fraction of
/// the cell radius.
const DEFORM_PUSH_RATIO: f32 = 0.3;

/// Outcome of subtracting hit points from one shard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShardHit {
    /// Hit points actually removed (clamped to what the shard had left).
    pub hp_lost: f32,
    /// The shard's hit points reached zero.
    pub destroyed: bool,
}

/// One hexagonal cell resident in a lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Shard {
    pub coord: CellCoord,
    /// Centre in the body's local frame.
    pub position: Vec2,
    outline: [Vec2; 6],
    rest_outline: [Vec2; 6],
    pub hp: f32,
    pub max_hp: f32,
    pub hardness: f32,
    pub is_core: bool,
}

impl Shard {
    pub fn new(coord: CellCoord, position: Vec2, radius: f32, hp: f32, hardness: f32) -> Self {
        let rest = HexGeometry::new(radius).hexagon();
        Self {
            coord,
            position,
            outline: rest,
            rest_outline: rest,
            hp,
            max_hp: hp,
            hardness,
            is_core: false,
        }
    }

    /// Build a shard at its lattice position. Core shards get `core_multiplier`
    /// times the hit points and hardness.
    pub fn structural(
        coord: CellCoord,
        geometry: &HexGeometry,
        base_hp: f32,
        core_multiplier: f32,
        is_core: bool,
    ) -> Self {
        let factor = if is_core { core_multiplier } else { 1.0 };
        let mut shard = Self::new(
            coord,
            geometry.center(coord),
            geometry.radius,
            base_hp * factor,
            factor,
        );
        shard.is_core = is_core;
        shard
    }

    /// Deformed outline, relative to [`Shard::position`].
    #[inline]
    pub fn outline(&self) -> &[Vec2; 6] {
        &self.outline
    }

    #[inline]
    pub fn rest_outline(&self) -> &[Vec2; 6] {
        &self.rest_outline
    }

    /// Damage severity in `[0, 1]`, zero when untouched.
    #[inline]
    pub fn severity(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 1.0;
        }
        (1.0 - self.hp / self.max_hp).clamp(0.0, 1.0)
    }

    /// Subtract `damage / hardness` hit points.
    pub fn apply_damage(&mut self, damage: f32) -> ShardHit {
        let hardness = if self.hardness > 0.0 { self.hardness } else { 1.0 };
        let amount = (damage / hardness).max(0.0);
        let hp_lost = amount.min(self.hp.max(0.0));
        self.hp -= amount;
        ShardHit {
            hp_lost,
            destroyed: self.hp <= 0.0,
        }
    }

    /// Push outline vertices away from `hit` (local frame). Vertices within
    /// `range` move by `(1 - d/range)^2` of the push, and never drift further
    /// than `MAX_DEFORM_RATIO * radius` from their rest position.
    pub fn deform(&mut self, hit: Vec2, range: f32, radius: f32) {
        if range <= 0.0 {
            return;
        }
        let push = radius * DEFORM_PUSH_RATIO;
        let max_offset = radius * MAX_DEFORM_RATIO;

        for (vertex, rest) in self.outline.iter_mut().zip(self.rest_outline.iter()) {
            let away = self.position + *vertex - hit;
            let dist = away.length();
            if dist >= range {
                continue;
            }
            let falloff = 1.0 - dist / range;
            let influence = falloff * falloff;
            let dir = away.normalize_or_zero();
            let moved = *vertex + dir * push * influence;
            *vertex = *rest + (moved - *rest).clamp_length_max(max_offset);
        }
    }

    /// Move the shard by whole cells (re-centring), shifting its position by
    /// `delta`.
    pub(crate) fn relocate(&mut self, shift: CellCoord, delta: Vec2) {
        self.coord = self.coord.offset_by(shift);
        self.position -= delta;
    }
}
