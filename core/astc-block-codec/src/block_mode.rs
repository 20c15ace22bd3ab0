//! Block mode field decode.
//!
//! The low 11 bits of every non-constant block select the weight grid
//! dimensions, the weight quantization mode and the dual-plane flag. Many of
//! the 2048 encodings are reserved and decode to `None`.

use crate::quant::{ise_sequence_bit_count, QuantMethod};
use crate::{BLOCK_MAX_WEIGHTS, BLOCK_MAX_WEIGHT_BITS, BLOCK_MIN_WEIGHT_BITS};

/// Decoded block mode properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockMode {
    /// Weight grid width.
    pub x_weights: u8,
    /// Weight grid height.
    pub y_weights: u8,
    /// Weight grid depth, 1 for 2D modes.
    pub z_weights: u8,
    /// Two weight planes are stored.
    pub dual_plane: bool,
    /// Weight quantization mode.
    pub quant_mode: QuantMethod,
    /// Exact bit length of the weight stream.
    pub weight_bits: u8,
}

fn finish(
    x_weights: u32,
    y_weights: u32,
    z_weights: u32,
    d: u32,
    base_quant: i32,
    h: u32,
) -> Option<BlockMode> {
    let weight_count = (x_weights * y_weights * z_weights * (d + 1)) as usize;
    let qm = (base_quant - 2) + 6 * h as i32;
    if qm < 0 || qm > QuantMethod::Quant32 as i32 {
        return None;
    }
    let quant_mode = QuantMethod::from_index(qm as usize)?;

    let weight_bits = ise_sequence_bit_count(weight_count, quant_mode);
    if weight_count > BLOCK_MAX_WEIGHTS
        || weight_bits < BLOCK_MIN_WEIGHT_BITS
        || weight_bits > BLOCK_MAX_WEIGHT_BITS
    {
        return None;
    }

    Some(BlockMode {
        x_weights: x_weights as u8,
        y_weights: y_weights as u8,
        z_weights: z_weights as u8,
        dual_plane: d != 0,
        quant_mode,
        weight_bits: weight_bits as u8,
    })
}

/// Decodes an 11-bit 2D block mode, or `None` for reserved encodings.
pub fn decode_block_mode_2d(block_mode: u32) -> Option<BlockMode> {
    let mut base_quant = ((block_mode >> 4) & 1) as i32;
    let mut h = (block_mode >> 9) & 1;
    let mut d = (block_mode >> 10) & 1;
    let a = (block_mode >> 5) & 0x3;

    let x_weights;
    let y_weights;

    if block_mode & 3 != 0 {
        base_quant |= ((block_mode & 3) << 1) as i32;
        let mut b = (block_mode >> 7) & 3;
        match (block_mode >> 2) & 3 {
            0 => {
                x_weights = b + 4;
                y_weights = a + 2;
            }
            1 => {
                x_weights = b + 8;
                y_weights = a + 2;
            }
            2 => {
                x_weights = a + 2;
                y_weights = b + 8;
            }
            _ => {
                b &= 1;
                if block_mode & 0x100 != 0 {
                    x_weights = b + 2;
                    y_weights = a + 2;
                } else {
                    x_weights = a + 2;
                    y_weights = b + 6;
                }
            }
        }
    } else {
        base_quant |= (((block_mode >> 2) & 3) << 1) as i32;
        if (block_mode >> 2) & 3 == 0 {
            return None;
        }

        let b = (block_mode >> 9) & 3;
        match (block_mode >> 7) & 3 {
            0 => {
                x_weights = 12;
                y_weights = a + 2;
            }
            1 => {
                x_weights = a + 2;
                y_weights = 12;
            }
            2 => {
                x_weights = a + 6;
                y_weights = b + 6;
                d = 0;
                h = 0;
            }
            _ => match (block_mode >> 5) & 3 {
                0 => {
                    x_weights = 6;
                    y_weights = 10;
                }
                1 => {
                    x_weights = 10;
                    y_weights = 6;
                }
                _ => return None,
            },
        }
    }

    finish(x_weights, y_weights, 1, d, base_quant, h)
}

/// Decodes an 11-bit 3D block mode, or `None` for reserved encodings.
pub fn decode_block_mode_3d(block_mode: u32) -> Option<BlockMode> {
    let mut base_quant = ((block_mode >> 4) & 1) as i32;
    let mut h = (block_mode >> 9) & 1;
    let mut d = (block_mode >> 10) & 1;
    let a = (block_mode >> 5) & 0x3;

    let x_weights;
    let y_weights;
    let z_weights;

    if block_mode & 3 != 0 {
        base_quant |= ((block_mode & 3) << 1) as i32;
        let b = (block_mode >> 7) & 3;
        let c = (block_mode >> 2) & 0x3;
        x_weights = a + 2;
        y_weights = b + 2;
        z_weights = c + 2;
    } else {
        base_quant |= (((block_mode >> 2) & 3) << 1) as i32;
        if (block_mode >> 2) & 3 == 0 {
            return None;
        }

        let b = (block_mode >> 9) & 3;
        if (block_mode >> 7) & 3 != 3 {
            d = 0;
            h = 0;
        }
        match (block_mode >> 7) & 3 {
            0 => {
                x_weights = 6;
                y_weights = b + 2;
                z_weights = a + 2;
            }
            1 => {
                x_weights = a + 2;
                y_weights = 6;
                z_weights = b + 2;
            }
            2 => {
                x_weights = a + 2;
                y_weights = b + 2;
                z_weights = 6;
            }
            _ => match (block_mode >> 5) & 3 {
                0 => {
                    x_weights = 6;
                    y_weights = 2;
                    z_weights = 2;
                }
                1 => {
                    x_weights = 2;
                    y_weights = 6;
                    z_weights = 2;
                }
                2 => {
                    x_weights = 2;
                    y_weights = 2;
                    z_weights = 6;
                }
                _ => return None,
            },
        }
    }

    finish(x_weights, y_weights, z_weights, d, base_quant, h)
}
