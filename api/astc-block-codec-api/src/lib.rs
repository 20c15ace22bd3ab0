#![doc = include_str!("../README.MD")]
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # Examples
//!
//! ## Compress and decompress an 8-bit image
//!
//! ```
//! use astc_block_codec_api::{
//!     Config, Context, Flags, Image, ImageData, ImageDataMut, ImageMut, Profile, Swizzle,
//!     BLOCK_BYTES, QUALITY_FAST,
//! };
//!
//! # fn main() -> Result<(), astc_block_codec_api::AstcError> {
//! let cfg = Config::new(Profile::Ldr, 6, 6, 1, QUALITY_FAST, Flags::NONE)?;
//! let ctx = Context::new(&cfg)?;
//!
//! let texels = vec![128u8; 12 * 12 * 4];
//! let image = Image {
//!     dim_x: 12,
//!     dim_y: 12,
//!     dim_z: 1,
//!     data: ImageData::Unorm8(&texels),
//! };
//!
//! // 12x12 texels with 6x6 blocks is a 2x2 block grid.
//! let mut blocks = vec![0u8; 4 * BLOCK_BYTES];
//! ctx.compress_image(&image, Swizzle::RGBA, &mut blocks)?;
//!
//! let mut decoded = vec![0u8; texels.len()];
//! let mut out = ImageMut {
//!     dim_x: 12,
//!     dim_y: 12,
//!     dim_z: 1,
//!     data: ImageDataMut::Unorm8(&mut decoded),
//! };
//! ctx.decompress_image(&blocks, &mut out, Swizzle::RGBA)?;
//! # Ok(())
//! # }
//! ```

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub(crate) mod alpha;
pub mod block_info;
pub mod config;
pub mod context;
pub mod error;
pub mod image;
pub mod progress;

pub use astc_block_codec::{Profile, BLOCK_BYTES};

pub use block_info::BlockInfo;
pub use config::{
    Config, Flags, QUALITY_EXHAUSTIVE, QUALITY_FAST, QUALITY_FASTEST, QUALITY_MEDIUM,
    QUALITY_THOROUGH, QUALITY_VERY_THOROUGH,
};
pub use context::Context;
pub use error::AstcError;
pub use image::{Image, ImageData, ImageDataMut, ImageMut, Swizzle, Swz};
pub use progress::ProgressSink;
