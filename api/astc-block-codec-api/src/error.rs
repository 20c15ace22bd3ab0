//! Error types for the codec API.

use thiserror::Error;

/// Errors produced by configuration validation, context management and the
/// whole-image drivers.
///
/// Malformed block payloads are never an error; per the format they decode
/// to the error color instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AstcError {
    /// The requested block footprint is not one the format permits.
    #[error("invalid block footprint {x}x{y}x{z}")]
    BadBlockSize {
        /// Requested X dimension.
        x: u32,
        /// Requested Y dimension.
        y: u32,
        /// Requested Z dimension.
        z: u32,
    },

    /// The color profile value is not recognized.
    #[error("invalid color profile")]
    BadProfile,

    /// The search quality is outside 0.0..=100.0.
    #[error("search quality must be in 0.0..=100.0")]
    BadQuality,

    /// Unknown flag bits, or a conflicting flag combination.
    #[error("invalid flags")]
    BadFlags,

    /// `USE_DECODE_UNORM8` requested for an HDR profile.
    #[error("decode-as-UNORM8 is invalid for HDR profiles")]
    BadDecodeMode,

    /// A swizzle selector is not valid for the requested operation.
    #[error("invalid swizzle")]
    BadSwizzle,

    /// All four channel error weights are zero or negative.
    #[error("invalid component error weights")]
    BadChannelWeights,

    /// An image dimension is zero.
    #[error("invalid image dimensions")]
    BadImageDims,

    /// The image data buffer does not match its stated dimensions.
    #[error("image buffer holds {actual} values, dimensions require {needed}")]
    BadImageBuffer {
        /// Required buffer length in values.
        needed: usize,
        /// Actual buffer length in values.
        actual: usize,
    },

    /// The compressed output buffer cannot hold every block.
    #[error("output buffer too small: need {needed} bytes, got {actual}")]
    OutputBufferTooSmall {
        /// Required length in bytes.
        needed: usize,
        /// Provided length in bytes.
        actual: usize,
    },

    /// The compressed input buffer does not cover the image.
    #[error("compressed data too small: need {needed} bytes, got {actual}")]
    InputBufferTooSmall {
        /// Required length in bytes.
        needed: usize,
        /// Provided length in bytes.
        actual: usize,
    },

    /// Compression was requested on a decompress-only context.
    #[error("context is configured decompress-only")]
    DecompressOnly,

    /// Another operation currently owns the context.
    #[error("context busy with another operation")]
    ContextBusy,

    /// The operation was cancelled before all blocks were issued.
    ///
    /// Blocks written before the cancellation point hold valid payloads.
    #[error("operation cancelled")]
    Cancelled,

    /// The block encoder rejected its input.
    #[error(transparent)]
    Codec(#[from] astc_block_codec::BlockError),
}
