//! hecs integration: the components owning entities expose to the pipeline.

pub mod components;

pub mod prelude {
    pub use super::components::{BodyKind, Hull, Motion, Transform2d, Wreckage};
    pub use crate::shatter::lattice::HexLattice;
}
