//! Constant-color (void-extent) block encode and decode.
//!
//! Constant blocks store one RGBA color for the whole footprint, either as
//! UNORM16 or as FP16, with the void-extent coordinate fields set to all
//! ones.

use crate::error::BlockError;
use crate::fp::{float01_to_unorm8, half_to_f32, unorm16_to_unorm8};
use crate::BLOCK_BYTES;

const U16_PREFIX: [u8; 8] = [0xFC, 0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
const F16_PREFIX: [u8; 8] = [0xFC, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// Encodes a constant-color block storing UNORM16 RGBA values.
pub fn encode_const_block_unorm16(r: u16, g: u16, b: u16, a: u16) -> [u8; BLOCK_BYTES] {
    let mut out = [0u8; BLOCK_BYTES];
    out[..8].copy_from_slice(&U16_PREFIX);
    write_color(&mut out, [r, g, b, a]);
    out
}

/// Encodes a constant-color block for an RGBA8 pixel, replicated to
/// UNORM16.
pub fn encode_const_block_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; BLOCK_BYTES] {
    encode_const_block_unorm16(
        u16::from(r) * 257,
        u16::from(g) * 257,
        u16::from(b) * 257,
        u16::from(a) * 257,
    )
}

/// Encodes a constant-color block storing FP16 RGBA values. Only valid in
/// HDR profiles.
pub fn encode_const_block_f16(r: u16, g: u16, b: u16, a: u16) -> [u8; BLOCK_BYTES] {
    let mut out = [0u8; BLOCK_BYTES];
    out[..8].copy_from_slice(&F16_PREFIX);
    write_color(&mut out, [r, g, b, a]);
    out
}

/// Decodes a constant-color block into an RGBA8 value. FP16 blocks are
/// clamped into the unit range.
pub fn decode_const_block_rgba8(block: &[u8; BLOCK_BYTES]) -> Result<[u8; 4], BlockError> {
    let c = read_color(block);

    if block[..8] == U16_PREFIX {
        return Ok([
            unorm16_to_unorm8(c[0]),
            unorm16_to_unorm8(c[1]),
            unorm16_to_unorm8(c[2]),
            unorm16_to_unorm8(c[3]),
        ]);
    }

    if block[..8] == F16_PREFIX {
        return Ok([
            float01_to_unorm8(half_to_f32(c[0])),
            float01_to_unorm8(half_to_f32(c[1])),
            float01_to_unorm8(half_to_f32(c[2])),
            float01_to_unorm8(half_to_f32(c[3])),
        ]);
    }

    Err(BlockError::NotConstantColor)
}

/// Returns true if the payload is a UNORM16 constant-color block.
#[inline]
pub fn is_u16_const_block(block: &[u8; BLOCK_BYTES]) -> bool {
    block[..8] == U16_PREFIX
}

/// Returns true if the payload is an FP16 constant-color block.
#[inline]
pub fn is_f16_const_block(block: &[u8; BLOCK_BYTES]) -> bool {
    block[..8] == F16_PREFIX
}

fn write_color(out: &mut [u8; BLOCK_BYTES], c: [u16; 4]) {
    for (i, v) in c.iter().enumerate() {
        out[8 + 2 * i..10 + 2 * i].copy_from_slice(&v.to_le_bytes());
    }
}

fn read_color(block: &[u8; BLOCK_BYTES]) -> [u16; 4] {
    let mut c = [0u16; 4];
    for (i, v) in c.iter_mut().enumerate() {
        *v = u16::from_le_bytes([block[8 + 2 * i], block[9 + 2 * i]]);
    }
    c
}
