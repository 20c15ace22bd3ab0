#![doc = include_str!("../README.MD")]
#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;
extern crate alloc;

pub mod bitio;
pub mod block_mode;
pub mod color_unquant;
pub mod const_block;
pub mod decimation;
pub mod decode;
pub mod decode_f32;
pub mod descriptor;
pub mod encode;
pub mod endpoints;
pub mod error;
pub mod fp;
pub mod ise;
pub mod partition;
pub mod quant;
pub mod symbolic;
pub mod weights;

#[cfg(test)]
pub mod test_prelude;

pub use descriptor::BlockSizeDescriptor;
pub use error::BlockError;

/// Size in bytes of a single ASTC block payload.
pub const BLOCK_BYTES: usize = 16;

/// Maximum number of stored weights per block, both planes included.
pub const BLOCK_MAX_WEIGHTS: usize = 64;

/// Minimum number of bits a weight stream may occupy.
pub const BLOCK_MIN_WEIGHT_BITS: usize = 24;

/// Maximum number of bits a weight stream may occupy.
pub const BLOCK_MAX_WEIGHT_BITS: usize = 96;

/// Number of bits used to store a partition index.
pub const PARTITION_INDEX_BITS: usize = 10;

/// Offset of the plane 2 weights in the unquantized weight array.
pub const WEIGHTS_PLANE2_OFFSET: usize = 32;

/// Maximum number of partitions per block.
pub const BLOCK_MAX_PARTITIONS: usize = 4;

/// Maximum number of texels per block (12x12 2D, 6x6x6 3D).
pub const BLOCK_MAX_TEXELS: usize = 216;

/// Maximum number of endpoint color values per partition.
pub const BLOCK_MAX_COLOR_VALUES: usize = 8;

/// Maximum number of endpoint integers per block.
pub const BLOCK_MAX_COLOR_INTS: usize = 18;

/// Scratch buffer size for decoding endpoint integer sequences.
pub const BLOCK_MAX_COLOR_INTS_BUF: usize = 32;

/// Color profile controlling how block endpoints decode.
///
/// ASTC payloads do not store a profile; it is a usage convention that the
/// caller must supply, matching the reference codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Linear LDR decode rules.
    #[default]
    Ldr,
    /// sRGB LDR decode rules.
    LdrSrgb,
    /// HDR RGB with LDR alpha decode rules.
    HdrRgbLdrAlpha,
    /// Full HDR RGBA decode rules.
    Hdr,
}

impl Profile {
    /// Returns true for the two LDR-only profiles.
    #[inline]
    pub fn is_ldr(self) -> bool {
        matches!(self, Profile::Ldr | Profile::LdrSrgb)
    }

    /// Returns true for the two profiles with HDR RGB endpoints.
    #[inline]
    pub fn is_hdr(self) -> bool {
        matches!(self, Profile::Hdr | Profile::HdrRgbLdrAlpha)
    }
}

/// Checks a block footprint against the set the ASTC format permits.
///
/// 2D footprints range from 4x4 to 12x12, 3D footprints from 3x3x3 to 6x6x6,
/// each restricted to the fixed list of legal aspect ratios.
pub fn is_valid_block_size(block_x: u32, block_y: u32, block_z: u32) -> bool {
    if block_x == 0 || block_y == 0 || block_z == 0 {
        return false;
    }
    if block_x > 255 || block_y > 255 || block_z > 255 {
        return false;
    }
    if block_x * block_y * block_z > BLOCK_MAX_TEXELS as u32 {
        return false;
    }

    if block_z == 1 {
        matches!(
            (block_x << 8) | block_y,
            0x0404 | 0x0504 | 0x0505 | 0x0605 | 0x0606 | 0x0805 | 0x0806 | 0x0808 | 0x0A05
                | 0x0A06
                | 0x0A08
                | 0x0A0A
                | 0x0C0A
                | 0x0C0C
        )
    } else {
        matches!(
            (block_x << 16) | (block_y << 8) | block_z,
            0x030303 | 0x040303 | 0x040403 | 0x040404 | 0x050404 | 0x050504 | 0x050505
                | 0x060505
                | 0x060605
                | 0x060606
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(4, 4, 1, true)]
    #[case(5, 4, 1, true)]
    #[case(6, 6, 1, true)]
    #[case(8, 5, 1, true)]
    #[case(10, 8, 1, true)]
    #[case(12, 12, 1, true)]
    #[case(4, 5, 1, false)] // transposed footprints are not legal
    #[case(7, 7, 1, false)]
    #[case(13, 13, 1, false)]
    #[case(0, 4, 1, false)]
    #[case(3, 3, 3, true)]
    #[case(4, 4, 4, true)]
    #[case(6, 6, 6, true)]
    #[case(3, 4, 3, false)]
    #[case(6, 6, 5, true)]
    #[case(7, 7, 7, false)]
    fn block_size_validation(
        #[case] x: u32,
        #[case] y: u32,
        #[case] z: u32,
        #[case] expected: bool,
    ) {
        assert_eq!(is_valid_block_size(x, y, z), expected);
    }
}
