//! Error type for lattice construction and attachment.

use thiserror::Error;

/// Errors reported while building or attaching a hex lattice.
///
/// Nothing inside a simulation tick returns these: resolvers skip bodies they
/// cannot validate instead of failing.
#[derive(Debug, Error)]
pub enum ShatterError {
    #[error("opacity mask is {width}x{height} but {actual} alpha values were supplied")]
    MaskSizeMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },

    #[error("RGBA buffer length {0} is not a multiple of 4")]
    NotRgba(usize),

    #[error("cell radius must be finite and positive, got {0}")]
    InvalidCellRadius(f32),

    #[error("lightweight bodies never carry a lattice")]
    LightweightBody,

    #[error("body is missing required component: {0}")]
    Component(#[from] hecs::ComponentError),

    #[error("body does not exist")]
    NoSuchEntity(#[from] hecs::NoSuchEntity),
}
