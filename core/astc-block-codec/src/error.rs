//! Error types for block codec operations.

use thiserror::Error;

use crate::Profile;

/// Errors that can occur while building descriptors, packing encoder output
/// or driving the block codecs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// The block footprint is not one of the sizes the format permits.
    #[error("invalid block footprint {x}x{y}x{z}")]
    InvalidBlockSize {
        /// Footprint width.
        x: u32,
        /// Footprint height.
        y: u32,
        /// Footprint depth.
        z: u32,
    },

    /// The color profile does not support the requested operation.
    #[error("operation not supported for profile {0:?}")]
    UnsupportedProfile(Profile),

    /// The payload is not a constant-color block.
    #[error("not a constant-color block")]
    NotConstantColor,

    /// The encoder produced a partition count outside 1..=4.
    #[error("unsupported partition count {0}")]
    UnsupportedPartitionCount(u8),

    /// The endpoint integers do not fit even the lowest color quantization.
    #[error("no color quantization mode fits the endpoint stream")]
    InvalidColorQuant,

    /// Dual-plane blocks are limited to at most three partitions.
    #[error("dual-plane blocks cannot use 4 partitions")]
    DualPlaneWithFourPartitions,

    /// The dual-plane component index is outside 0..=3.
    #[error("invalid dual-plane component {0}")]
    InvalidPlane2Component(i8),

    /// A packed block failed its decode sanity check.
    #[error("encoder produced an invalid block")]
    PackedBlockInvalid,
}
