//! ECS components (transform, body).

pub mod body;
pub mod transform;

pub use body::*;
pub use transform::*;
