//! Physical to symbolic block decode.
//!
//! A symbolic block is the fully expanded form of a 128-bit payload: block
//! mode, partitioning, unpacked endpoint integers and unquantized weights.
//! Invalid payloads decode to the error block type rather than failing; the
//! per-texel decoders then emit the error color.

use crate::bitio::read_bits;
use crate::color_unquant::color_unquant_table;
use crate::descriptor::BlockSizeDescriptor;
use crate::ise::decode_ise_raw;
use crate::quant::{quant_level_for_ise, QuantMethod};
use crate::weights::WEIGHT_UNSCRAMBLE_AND_UNQUANT_MAP;
use crate::{
    BLOCK_BYTES, BLOCK_MAX_COLOR_INTS, BLOCK_MAX_COLOR_INTS_BUF, BLOCK_MAX_COLOR_VALUES,
    BLOCK_MAX_PARTITIONS, BLOCK_MAX_WEIGHTS, PARTITION_INDEX_BITS, WEIGHTS_PLANE2_OFFSET,
};

/// Classification of a decoded block payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SymbolicBlockType {
    /// Regular weighted block.
    #[default]
    NonConst,
    /// Constant-color block with UNORM16 values.
    ConstU16,
    /// Constant-color block with FP16 values.
    ConstF16,
    /// Invalid payload; decodes to the error color.
    Error,
}

/// Fully expanded form of one block payload.
#[derive(Clone, Copy, Debug)]
pub struct SymbolicBlock {
    /// Payload classification.
    pub block_type: SymbolicBlockType,
    /// The 11-bit block mode.
    pub block_mode: u16,
    /// Partition count, 0 for constant blocks.
    pub partition_count: u8,
    /// The 10-bit partition index, 0 for single-partition blocks.
    pub partition_index: u16,
    /// Endpoint format per partition.
    pub color_formats: [u8; BLOCK_MAX_PARTITIONS],
    /// Unquantized endpoint integers per partition.
    pub color_values: [[u8; BLOCK_MAX_COLOR_VALUES]; BLOCK_MAX_PARTITIONS],
    /// Color endpoint quantization mode.
    pub quant_mode: QuantMethod,
    /// Dual-plane component, -1 for single-plane blocks.
    pub plane2_component: i8,
    /// Unquantized weights (0..=64), plane 2 at offset 32.
    pub weights: [u8; BLOCK_MAX_WEIGHTS],
    /// Constant color payload for constant blocks.
    pub constant_color: [u16; 4],
    /// All partitions share one endpoint format.
    pub formats_matched: bool,
}

impl Default for SymbolicBlock {
    fn default() -> Self {
        SymbolicBlock {
            block_type: SymbolicBlockType::NonConst,
            block_mode: 0,
            partition_count: 0,
            partition_index: 0,
            color_formats: [0; BLOCK_MAX_PARTITIONS],
            color_values: [[0; BLOCK_MAX_COLOR_VALUES]; BLOCK_MAX_PARTITIONS],
            quant_mode: QuantMethod::Quant2,
            plane2_component: -1,
            weights: [0; BLOCK_MAX_WEIGHTS],
            constant_color: [0; 4],
            formats_matched: false,
        }
    }
}

impl SymbolicBlock {
    fn error() -> Self {
        SymbolicBlock {
            block_type: SymbolicBlockType::Error,
            ..SymbolicBlock::default()
        }
    }
}

/// Expands a physical block payload into symbolic form.
pub fn physical_to_symbolic(block: &[u8; BLOCK_BYTES], bsd: &BlockSizeDescriptor) -> SymbolicBlock {
    let mut scb = SymbolicBlock::default();

    let block_mode = read_bits(block, 11, 0);
    if block_mode & 0x1FF == 0x1FC {
        return decode_const_block(block, block_mode, bsd.block_z() == 1);
    }

    let Some(bmi) = bsd.block_mode(block_mode as u16) else {
        return SymbolicBlock::error();
    };

    let is_dual_plane = bmi.dual_plane;
    let weight_quant = bmi.weight_quant;
    let weight_bits = bmi.weight_bits as usize;
    let weight_count = bmi.weight_count as usize;
    let real_weight_count = bmi.real_weight_count as usize;

    let partition_count = (read_bits(block, 2, 11) + 1) as usize;

    scb.block_mode = block_mode as u16;
    scb.partition_count = partition_count as u8;

    let lo_block = u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);
    let hi_block = u64::from_le_bytes([
        block[8], block[9], block[10], block[11], block[12], block[13], block[14], block[15],
    ]);

    let mut below_weights_pos = 128 - weight_bits as i32;

    // The weight stream is stored mirrored from bit 127 downwards.
    let mut indices = [0u8; BLOCK_MAX_WEIGHTS];
    let lo_w = hi_block.reverse_bits();
    let hi_w = lo_block.reverse_bits();
    decode_ise_raw(weight_quant, real_weight_count, lo_w, hi_w, 0, &mut indices);

    let uq_map = &WEIGHT_UNSCRAMBLE_AND_UNQUANT_MAP[weight_quant.index()];
    if is_dual_plane {
        for i in 0..weight_count {
            scb.weights[i] = uq_map[indices[2 * i] as usize];
            scb.weights[i + WEIGHTS_PLANE2_OFFSET] = uq_map[indices[2 * i + 1] as usize];
        }
    } else {
        for i in 0..weight_count {
            scb.weights[i] = uq_map[indices[i] as usize];
        }
    }

    if is_dual_plane && partition_count == 4 {
        return SymbolicBlock::error();
    }

    let mut color_formats = [0usize; BLOCK_MAX_PARTITIONS];
    let mut encoded_type_high_size = 0i32;
    if partition_count == 1 {
        color_formats[0] = read_bits(block, 4, 13) as usize;
        scb.partition_index = 0;
    } else {
        encoded_type_high_size = (3 * partition_count as i32) - 4;
        below_weights_pos -= encoded_type_high_size;
        let encoded_type = read_bits(block, 6, 13 + PARTITION_INDEX_BITS) as usize
            | ((read_bits(block, encoded_type_high_size as usize, below_weights_pos as usize)
                as usize)
                << 6);
        let baseclass = encoded_type & 0x3;
        if baseclass == 0 {
            for f in color_formats.iter_mut().take(partition_count) {
                *f = (encoded_type >> 2) & 0xF;
            }
            below_weights_pos += encoded_type_high_size;
            scb.formats_matched = true;
            encoded_type_high_size = 0;
        } else {
            let mut bitpos = 2;
            let baseclass = baseclass - 1;
            for f in color_formats.iter_mut().take(partition_count) {
                *f = (((encoded_type >> bitpos) & 1) + baseclass) << 2;
                bitpos += 1;
            }
            for f in color_formats.iter_mut().take(partition_count) {
                *f |= (encoded_type >> bitpos) & 3;
                bitpos += 2;
            }
        }

        scb.partition_index = read_bits(block, PARTITION_INDEX_BITS, 13) as u16;
    }

    for i in 0..partition_count {
        scb.color_formats[i] = color_formats[i] as u8;
    }

    let mut color_int_count = 0usize;
    for &f in color_formats.iter().take(partition_count) {
        let endpoint_class = f >> 2;
        color_int_count += (endpoint_class + 1) * 2;
    }
    if color_int_count > BLOCK_MAX_COLOR_INTS {
        return SymbolicBlock::error();
    }

    const COLOR_BITS: [i32; 5] = [
        -1,
        115 - 4,
        113 - 4 - PARTITION_INDEX_BITS as i32,
        113 - 4 - PARTITION_INDEX_BITS as i32,
        113 - 4 - PARTITION_INDEX_BITS as i32,
    ];
    let mut color_bits = COLOR_BITS[partition_count] - weight_bits as i32 - encoded_type_high_size;
    if is_dual_plane {
        color_bits -= 2;
    }
    let color_bits = color_bits.max(0) as usize;

    let Some(quant_mode) = quant_level_for_ise(color_int_count, color_bits) else {
        return SymbolicBlock::error();
    };
    if quant_mode < QuantMethod::Quant6 {
        return SymbolicBlock::error();
    }
    scb.quant_mode = quant_mode;

    let mut values_to_decode = [0u8; BLOCK_MAX_COLOR_INTS_BUF];
    let start_bit = if partition_count == 1 {
        17
    } else {
        19 + PARTITION_INDEX_BITS
    };
    decode_ise_raw(
        quant_mode,
        color_int_count,
        lo_block,
        hi_block,
        start_bit,
        &mut values_to_decode,
    );

    // quant_mode is at least quant6 here, so the table exists.
    let Some(unpack_table) = color_unquant_table(quant_mode) else {
        return SymbolicBlock::error();
    };
    let mut value_off = 0;
    for i in 0..partition_count {
        let vals = 2 * (color_formats[i] >> 2) + 2;
        for j in 0..vals {
            scb.color_values[i][j] = unpack_table[values_to_decode[value_off + j] as usize];
        }
        value_off += vals;
    }

    scb.plane2_component = -1;
    if is_dual_plane {
        scb.plane2_component = read_bits(block, 2, (below_weights_pos - 2) as usize) as i8;
    }

    scb
}

fn decode_const_block(
    block: &[u8; BLOCK_BYTES],
    block_mode: u32,
    is_2d: bool,
) -> SymbolicBlock {
    let mut scb = SymbolicBlock {
        block_type: if block_mode & 0x200 != 0 {
            SymbolicBlockType::ConstF16
        } else {
            SymbolicBlockType::ConstU16
        },
        ..SymbolicBlock::default()
    };

    for i in 0..4 {
        scb.constant_color[i] = u16::from_le_bytes([block[8 + 2 * i], block[9 + 2 * i]]);
    }

    // Void-extent coordinate validation.
    if is_2d {
        if read_bits(block, 2, 10) != 3 {
            return SymbolicBlock::error();
        }

        let vx_low_s = read_bits(block, 8, 12) | (read_bits(block, 5, 20) << 8);
        let vx_high_s = read_bits(block, 13, 25);
        let vx_low_t = read_bits(block, 8, 38) | (read_bits(block, 5, 46) << 8);
        let vx_high_t = read_bits(block, 13, 51);

        let all_ones = vx_low_s == 0x1FFF
            && vx_high_s == 0x1FFF
            && vx_low_t == 0x1FFF
            && vx_high_t == 0x1FFF;
        if (vx_low_s >= vx_high_s || vx_low_t >= vx_high_t) && !all_ones {
            scb.block_type = SymbolicBlockType::Error;
        }
    } else {
        let vx_low_s = read_bits(block, 9, 10);
        let vx_high_s = read_bits(block, 9, 19);
        let vx_low_t = read_bits(block, 9, 28);
        let vx_high_t = read_bits(block, 9, 37);
        let vx_low_r = read_bits(block, 9, 46);
        let vx_high_r = read_bits(block, 9, 55);

        let all_ones = vx_low_s == 0x1FF
            && vx_high_s == 0x1FF
            && vx_low_t == 0x1FF
            && vx_high_t == 0x1FF
            && vx_low_r == 0x1FF
            && vx_high_r == 0x1FF;
        if (vx_low_s >= vx_high_s || vx_low_t >= vx_high_t || vx_low_r >= vx_high_r) && !all_ones {
            scb.block_type = SymbolicBlockType::Error;
        }
    }

    scb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::const_block::{encode_const_block_f16, encode_const_block_rgba8};

    #[test]
    fn const_blocks_classify_by_mode_bit() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();

        let u16_block = encode_const_block_rgba8(1, 2, 3, 4);
        let scb = physical_to_symbolic(&u16_block, &bsd);
        assert_eq!(scb.block_type, SymbolicBlockType::ConstU16);
        assert_eq!(scb.constant_color, [257, 514, 771, 1028]);
        assert_eq!(scb.partition_count, 0);

        let f16_block = encode_const_block_f16(0x3C00, 0, 0, 0x3C00);
        let scb = physical_to_symbolic(&f16_block, &bsd);
        assert_eq!(scb.block_type, SymbolicBlockType::ConstF16);
        assert_eq!(scb.constant_color, [0x3C00, 0, 0, 0x3C00]);
    }

    #[test]
    fn bad_void_extent_ranges_are_errors() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();

        let mut block = encode_const_block_rgba8(0, 0, 0, 0);
        // Clear the extent fields so low >= high without being all ones.
        for b in block[1..8].iter_mut() {
            *b = 0;
        }
        block[1] = 0x0D; // keep the const-color mode bits and rsv=3
        let scb = physical_to_symbolic(&block, &bsd);
        assert_eq!(scb.block_type, SymbolicBlockType::Error);
    }

    #[test]
    fn reserved_modes_decode_to_error() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let block = [0u8; BLOCK_BYTES];
        let scb = physical_to_symbolic(&block, &bsd);
        assert_eq!(scb.block_type, SymbolicBlockType::Error);
    }

    #[test]
    fn dual_plane_with_four_partitions_is_an_error() {
        let bsd = BlockSizeDescriptor::new(6, 6, 1).unwrap();
        // Pick any valid dual-plane mode for this footprint.
        let mode = (0..2048u16)
            .find(|&m| bsd.block_mode(m).is_some_and(|i| i.dual_plane))
            .unwrap();

        let mut block = [0u8; BLOCK_BYTES];
        crate::bitio::write_bits(&mut block, 11, 0, mode as u32);
        crate::bitio::write_bits(&mut block, 2, 11, 3); // partition count 4
        let scb = physical_to_symbolic(&block, &bsd);
        assert_eq!(scb.block_type, SymbolicBlockType::Error);
    }
}
