//! Planar transform component for hull entities.

use glam::Vec2;

/// World placement of a body: position, orientation (radians) and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2d {
    pub position: Vec2,
    pub angle: f32,
    pub scale: f32,
}

impl Transform2d {
    /// Create an identity transform.
    pub fn identity() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            scale: 1.0,
        }
    }

    /// Create a transform from a position.
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Whether the transform can be inverted (finite, positive scale).
    #[inline]
    pub fn is_invertible(&self) -> bool {
        self.scale.is_finite() && self.scale > f32::EPSILON && self.position.is_finite()
    }

    /// Map a point from the body's local frame into world space
    /// (scale, then rotate, then translate).
    #[inline]
    pub fn local_to_world(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.angle).rotate(local * self.scale)
    }

    /// Map a local-frame offset (no translation) into world space.
    #[inline]
    pub fn local_vector_to_world(&self, local: Vec2) -> Vec2 {
        Vec2::from_angle(self.angle).rotate(local * self.scale)
    }

    /// Inverse of [`Transform2d::local_to_world`]. Callers must check
    /// [`Transform2d::is_invertible`] first.
    #[inline]
    pub fn world_to_local(&self, world: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle).rotate(world - self.position) / self.scale
    }
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::identity()
    }
}
