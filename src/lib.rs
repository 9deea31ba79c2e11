//! hexshatter
//!
//! Destructible spaceship hulls built from hexagonal shards, driven through a
//! hecs ECS world.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - Components the owning bodies carry (transform, motion, hull)
//! 2. **shatter::hex / shard / spatial** - Hex geometry, single shards, bucket index
//! 3. **shatter::lattice / raster** - Per-body shard container and damage raster
//! 4. **shatter::decompose** - Opacity mask to lattice
//! 5. **shatter::impact / collision** - Projectile and structural damage
//! 6. **shatter::splitter / debris** - Fragmentation, wreck hand-off, loose debris
//!
//! [`ShatterWorld`] runs the per-tick pipeline; all state that outlives a call
//! sits in the hecs `World` or a caller-owned [`SimulationContext`].

pub mod ecs;
pub mod error;
pub mod shatter;

// Re-export commonly used types
pub use error::ShatterError;

pub use shatter::{
    BodyGrid, CellCoord, CoreSize, DebrisGroup, DebrisPool, DebrisShard, Decomposer, HexLattice,
    OpacityMask, ShatterConfig, ShatterWorld, SimulationContext, SplitOutcome, StepReport,
    UniformBodyGrid, WreckSink,
};
