//! Contact data produced by the structural collision resolver.

use glam::Vec2;

use super::hex::CellCoord;

/// Bounding-circle overlap between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContact {
    /// Unit normal from body A to body B.
    pub normal: Vec2,
    /// Sum of the bounding radii minus the centre distance.
    pub overlap: f32,
    /// Magnitude of the relative velocity.
    pub relative_speed: f32,
    /// Relative velocity along the normal; positive while approaching.
    pub closing_speed: f32,
}

/// A confirmed shard-to-shard touch between two lattices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShardContact {
    /// Shard of the body whose cells were scanned.
    pub holder: CellCoord,
    /// Shard of the body whose lattice was probed by lookup.
    pub iterator: CellCoord,
    /// Contact point in world space (the holder shard's centre).
    pub point: Vec2,
}

/// All shard contacts found between one pair of bodies.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub holder: hecs::Entity,
    pub iterator: hecs::Entity,
    pub pair: PairContact,
    pub contacts: Vec<ShardContact>,
}

impl ContactManifold {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
