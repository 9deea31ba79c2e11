//! Loose debris shards and visual sparks.
//!
//! Debris is ballistic and purely visual once detached: it holds a copy of
//! what it needs to draw and never re-enters a lattice.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;

use crate::ecs::components::Motion;

use super::damage::BodyFrame;
use super::shard::Shard;

/// Fade value at detachment. Values above 1 are the brief "hot" period before
/// the visible fade starts.
pub const INITIAL_FADE: f32 = 1.5;
/// Fade lost per tick.
const FADE_STEP: f32 = 0.012;
/// Fraction of the parent's tangential spin velocity carried by debris.
const ANGULAR_CARRY: f32 = 0.5;
/// Maximum random velocity jitter per axis.
const VELOCITY_JITTER: f32 = 0.4;
/// Maximum random spin.
const SPIN_JITTER: f32 = 0.08;

/// Default number of live debris shards kept before the oldest are evicted.
pub const DEFAULT_DEBRIS_CAPACITY: usize = 2048;
/// Default number of live sparks.
pub const DEFAULT_SPARK_CAPACITY: usize = 512;
/// Ticks a spark lives.
const SPARK_TICKS: f32 = 24.0;
const SPARK_DRAG: f32 = 0.9;
const SPARK_SPEED: f32 = 2.5;

/// A shard detached from its lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct DebrisShard {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    /// Drops by a fixed step each tick; removed at zero.
    pub fade: f32,
    pub scale: f32,
    /// Deformed outline relative to `position`, in unscaled local units.
    pub outline: [Vec2; 6],
    pub is_core: bool,
}

impl DebrisShard {
    /// Move `shard` out of its lattice into world space.
    ///
    /// Velocity is the parent's velocity, plus part of the parent's spin at
    /// the shard's offset, plus `impulse`, plus a little jitter.
    pub fn detach(shard: Shard, frame: &BodyFrame, impulse: Vec2, rng: &mut impl Rng) -> Self {
        let position = frame.transform.local_to_world(shard.position);
        let carried = Motion {
            angular_velocity: frame.motion.angular_velocity * ANGULAR_CARRY,
            ..frame.motion
        };
        let jitter = Vec2::new(
            rng.gen_range(-VELOCITY_JITTER..=VELOCITY_JITTER),
            rng.gen_range(-VELOCITY_JITTER..=VELOCITY_JITTER),
        );
        Self {
            position,
            velocity: carried.point_velocity(position - frame.transform.position) + impulse + jitter,
            angle: frame.transform.angle,
            angular_velocity: rng.gen_range(-SPIN_JITTER..=SPIN_JITTER),
            fade: INITIAL_FADE,
            scale: frame.transform.scale,
            outline: *shard.outline(),
            is_core: shard.is_core,
        }
    }

    /// Advance one tick. Returns false once fully faded.
    fn advance(&mut self, friction: f32) -> bool {
        self.position += self.velocity;
        self.angle += self.angular_velocity;
        self.velocity *= friction;
        self.fade -= FADE_STEP;
        self.fade > 0.0
    }
}

/// Pool of loose debris shards.
#[derive(Debug, Clone)]
pub struct DebrisPool {
    shards: VecDeque<DebrisShard>,
    capacity: usize,
}

impl Default for DebrisPool {
    fn default() -> Self {
        Self::new(DEFAULT_DEBRIS_CAPACITY)
    }
}

impl DebrisPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            shards: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Add debris, evicting the oldest when full.
    pub fn push(&mut self, debris: DebrisShard) {
        if self.shards.len() >= self.capacity {
            self.shards.pop_front();
        }
        self.shards.push_back(debris);
    }

    /// Integrate every shard one tick with velocity damping `friction`
    /// (< 1) and drop the ones that faded out.
    pub fn update(&mut self, friction: f32) {
        self.shards.retain_mut(|d| d.advance(friction));
    }

    pub fn iter(&self) -> impl Iterator<Item = &DebrisShard> {
        self.shards.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn clear(&mut self) {
        self.shards.clear();
    }
}

/// A short-lived visual spark. Has no gameplay effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spark {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Remaining life in `(0, 1]`.
    pub life: f32,
}

/// Pool of sparks emitted by impacts and grinding contacts.
#[derive(Debug, Clone)]
pub struct SparkPool {
    sparks: VecDeque<Spark>,
    capacity: usize,
}

impl Default for SparkPool {
    fn default() -> Self {
        Self::new(DEFAULT_SPARK_CAPACITY)
    }
}

impl SparkPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            sparks: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Emit `count` sparks at `point` drifting with `base_velocity`.
    pub fn emit(&mut self, point: Vec2, base_velocity: Vec2, count: usize, rng: &mut impl Rng) {
        for _ in 0..count {
            if self.sparks.len() >= self.capacity {
                self.sparks.pop_front();
            }
            let dir = Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU));
            let speed = rng.gen_range(0.3..=1.0) * SPARK_SPEED;
            self.sparks.push_back(Spark {
                position: point,
                velocity: base_velocity + dir * speed,
                life: 1.0,
            });
        }
    }

    pub fn update(&mut self) {
        self.sparks.retain_mut(|s| {
            s.position += s.velocity;
            s.velocity *= SPARK_DRAG;
            s.life -= 1.0 / SPARK_TICKS;
            s.life > 0.0
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spark> {
        self.sparks.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sparks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sparks.is_empty()
    }

    pub fn clear(&mut self) {
        self.sparks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Motion, Transform2d};
    use crate::shatter::hex::{CellCoord, HexGeometry};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn frame() -> BodyFrame {
        BodyFrame {
            transform: Transform2d::from_position(Vec2::new(100.0, 0.0)).with_scale(2.0),
            motion: Motion::new(Vec2::new(3.0, 0.0), 0.0),
        }
    }

    fn shard_at(col: i32) -> Shard {
        Shard::structural(CellCoord::new(col, 0), &HexGeometry::new(6.0), 10.0, 5.0, false)
    }

    #[test]
    fn test_detach_world_position_and_velocity() {
        let mut rng = SmallRng::seed_from_u64(7);
        let debris = DebrisShard::detach(shard_at(2), &frame(), Vec2::new(0.0, 1.0), &mut rng);
        // Column 2 sits at x = 18 locally, doubled by scale.
        assert!((debris.position - Vec2::new(136.0, 0.0)).length() < 1e-4);
        assert!((debris.velocity - Vec2::new(3.0, 1.0)).length() <= VELOCITY_JITTER * 1.5);
        assert_eq!(debris.fade, INITIAL_FADE);
        assert!(debris.fade > 1.0);
    }

    #[test]
    fn test_spin_adds_tangential_velocity() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut spinning = frame();
        spinning.motion = Motion::new(Vec2::ZERO, 0.1);
        let debris = DebrisShard::detach(shard_at(2), &spinning, Vec2::ZERO, &mut rng);
        // Offset (36, 0) spinning at 0.1 rad/tick, half carried: (0, 1.8).
        assert!(debris.velocity.y > 1.8 - VELOCITY_JITTER - 1e-4);
    }

    #[test]
    fn test_pool_damps_and_expires() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut pool = DebrisPool::default();
        pool.push(DebrisShard::detach(shard_at(0), &frame(), Vec2::new(5.0, 0.0), &mut rng));
        let start_speed = pool.iter().next().unwrap().velocity.length();

        pool.update(0.9);
        let after = pool.iter().next().unwrap();
        assert!(after.velocity.length() < start_speed);

        for _ in 0..((INITIAL_FADE / FADE_STEP) as usize + 2) {
            pool.update(0.9);
        }
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_capacity_evicts_oldest() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut pool = DebrisPool::new(2);
        for col in 0..3 {
            pool.push(DebrisShard::detach(shard_at(col * 2), &frame(), Vec2::ZERO, &mut rng));
        }
        assert_eq!(pool.len(), 2);
        // Column 0 (x = 100) was evicted.
        assert!(pool.iter().all(|d| d.position.x > 110.0));
    }

    #[test]
    fn test_sparks_expire() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut sparks = SparkPool::new(4);
        sparks.emit(Vec2::ZERO, Vec2::ZERO, 6, &mut rng);
        assert_eq!(sparks.len(), 4);
        for _ in 0..(SPARK_TICKS as usize + 1) {
            sparks.update();
        }
        assert!(sparks.is_empty());
    }
}
