//! Per-simulation state threaded through every tick.

use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::debris::{DebrisPool, SparkPool};

/// De-duplicated queue of bodies that may have fragmented this tick.
///
/// Both the impact and collision resolvers push into it; the connectivity
/// splitter drains it once all damage for the tick has been applied.
#[derive(Debug, Clone, Default)]
pub struct SplitQueue {
    order: Vec<hecs::Entity>,
    queued: HashSet<hecs::Entity>,
}

impl SplitQueue {
    /// Queue a body. Duplicates are ignored.
    pub fn push(&mut self, body: hecs::Entity) {
        if self.queued.insert(body) {
            self.order.push(body);
        }
    }

    pub fn contains(&self, body: hecs::Entity) -> bool {
        self.queued.contains(&body)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Take every queued body in insertion order.
    pub fn take(&mut self) -> Vec<hecs::Entity> {
        self.queued.clear();
        std::mem::take(&mut self.order)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.queued.clear();
    }
}

/// Mutable simulation state owned by the caller: debris, sparks, the split
/// queue, the jitter RNG and the tick counter.
///
/// Separate instances never share state, so independent games (or tests)
/// can run side by side.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub debris: DebrisPool,
    pub sparks: SparkPool,
    pub splits: SplitQueue,
    pub(crate) rng: SmallRng,
    seed: u64,
    tick: u64,
}

impl SimulationContext {
    /// Fresh context; the same seed reproduces the same debris jitter.
    pub fn new(seed: u64) -> Self {
        Self {
            debris: DebrisPool::default(),
            sparks: SparkPool::default(),
            splits: SplitQueue::default(),
            rng: SmallRng::seed_from_u64(seed),
            seed,
            tick: 0,
        }
    }

    pub fn with_debris_capacity(mut self, capacity: usize) -> Self {
        self.debris = DebrisPool::new(capacity);
        self
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Clear all per-scene state and reseed.
    pub fn reset(&mut self) {
        self.debris.clear();
        self.sparks.clear();
        self.splits.clear();
        self.rng = SmallRng::seed_from_u64(self.seed);
        self.tick = 0;
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new(0)
    }
}
