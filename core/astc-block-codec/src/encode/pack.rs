//! Candidate assembly into the 16-byte physical layout.

use crate::bitio::{bit_at, set_bit, write_bits};
use crate::descriptor::{BlockModeInfo, BlockSizeDescriptor};
use crate::error::BlockError;
use crate::ise::encode_ise;
use crate::quant::QuantMethod;
use crate::symbolic::{physical_to_symbolic, SymbolicBlockType};
use crate::{BLOCK_BYTES, PARTITION_INDEX_BITS};

/// Packs a fully quantized candidate into a physical block.
///
/// All partitions share `endpoint_format` (the matched-formats encoding is
/// used for multi-partition blocks). The result is re-parsed before being
/// returned, so a bad candidate surfaces as an error instead of a corrupt
/// block.
pub(crate) fn build_physical_block(
    bsd: &BlockSizeDescriptor,
    bmi: &BlockModeInfo,
    partition_count: usize,
    partition_index: usize,
    plane2_component: i8,
    endpoint_format: u8,
    color_quant: QuantMethod,
    endpoint_pquant: &[u8],
    weight_pquant: &[u8],
) -> Result<[u8; BLOCK_BYTES], BlockError> {
    let mut block = [0u8; BLOCK_BYTES];

    if !(1..=4).contains(&partition_count) {
        return Err(BlockError::UnsupportedPartitionCount(partition_count as u8));
    }
    if color_quant < QuantMethod::Quant6 {
        return Err(BlockError::InvalidColorQuant);
    }

    write_bits(&mut block, 11, 0, u32::from(bmi.mode));
    write_bits(&mut block, 2, 11, partition_count as u32 - 1);

    let below_weights_pos = 128 - bmi.weight_bits as usize;
    if bmi.dual_plane {
        if partition_count == 4 {
            return Err(BlockError::DualPlaneWithFourPartitions);
        }
        if !(0..=3).contains(&plane2_component) {
            return Err(BlockError::InvalidPlane2Component(plane2_component));
        }
        write_bits(
            &mut block,
            2,
            below_weights_pos - 2,
            plane2_component as u32,
        );
    }

    let start_bit = if partition_count == 1 {
        write_bits(&mut block, 4, 13, u32::from(endpoint_format));
        17
    } else {
        write_bits(&mut block, PARTITION_INDEX_BITS, 13, partition_index as u32);
        // Matched formats: baseclass 0 plus the shared format.
        write_bits(
            &mut block,
            6,
            13 + PARTITION_INDEX_BITS,
            u32::from(endpoint_format) << 2,
        );
        19 + PARTITION_INDEX_BITS
    };

    encode_ise(
        color_quant,
        endpoint_pquant.len(),
        endpoint_pquant,
        &mut block,
        start_bit,
    );

    // Weights go into a temporary stream and then into the bit-reversed
    // region at the top of the block.
    let mut weight_stream = [0u8; BLOCK_BYTES];
    encode_ise(
        bmi.weight_quant,
        weight_pquant.len(),
        weight_pquant,
        &mut weight_stream,
        0,
    );
    for k in 0..bmi.weight_bits as usize {
        if bit_at(&weight_stream, k) != 0 {
            set_bit(&mut block, 127 - k);
        }
    }

    let scb = physical_to_symbolic(&block, bsd);
    if scb.block_type == SymbolicBlockType::Error {
        return Err(BlockError::PackedBlockInvalid);
    }
    Ok(block)
}
