//! Body components read and written by the shatter pipeline.

use glam::Vec2;

/// Capability flag decided once when a body is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Carries a destructible hex lattice.
    Lattice,
    /// Lightweight craft (fighters, drones). Never carries a lattice and is
    /// ignored by every resolver.
    Simple,
}

/// Linear and angular velocity, in world units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub velocity: Vec2,
    pub angular_velocity: f32,
}

impl Motion {
    pub fn new(velocity: Vec2, angular_velocity: f32) -> Self {
        Self {
            velocity,
            angular_velocity,
        }
    }

    /// Velocity of a point rigidly attached to the body at world offset `r`
    /// from its centre.
    #[inline]
    pub fn point_velocity(&self, r: Vec2) -> Vec2 {
        self.velocity + r.perp() * self.angular_velocity
    }
}

/// Hit-point pool and mass of a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Hull {
    pub hp: f32,
    pub max_hp: f32,
    pub mass: f32,
    /// Set once the body has been destroyed (hp exhausted or no core left).
    pub destroyed: bool,
}

impl Hull {
    /// Create a hull at full health.
    pub fn new(max_hp: f32, mass: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            mass,
            destroyed: false,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.destroyed && self.hp > 0.0
    }

    /// Inverse mass, zero for massless bodies.
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Subtract hit points, marking the hull destroyed when the pool runs out.
    pub fn take_damage(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.destroyed = true;
        }
    }
}

/// Marks a body that is itself wreckage. Its fragments are released as loose
/// debris instead of being handed to the wreck factory again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Wreckage;
