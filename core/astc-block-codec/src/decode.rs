//! Block decode to RGBA8.
//!
//! Only LDR and sRGB profiles can decode to 8-bit output; FP16 constant
//! blocks and HDR endpoints in an LDR profile produce the magenta error
//! color, never a failure.

use likely_stable::unlikely;

use crate::decimation::DecimationEntry;
use crate::descriptor::{BlockModeInfo, BlockSizeDescriptor};
use crate::endpoints::unpack_color_endpoints;
use crate::symbolic::{physical_to_symbolic, SymbolicBlock, SymbolicBlockType};
use crate::{Profile, BLOCK_BYTES, BLOCK_MAX_PARTITIONS, WEIGHTS_PLANE2_OFFSET};

/// Interpolates both weight planes for one texel.
///
/// Plane 2 slots are only populated for dual-plane modes; a single-plane
/// grid may use all 64 weight slots, so plane 2 must not be touched then.
#[inline]
pub(crate) fn infill_weights(weights: &[u8], e: &DecimationEntry, dual_plane: bool) -> (i32, i32) {
    let mut sum1 = 8u32;
    let mut sum2 = 8u32;
    for i in 0..4 {
        let idx = e.idx[i] as usize;
        let w = u32::from(e.w[i]);
        sum1 += u32::from(weights[idx]) * w;
        if dual_plane {
            sum2 += u32::from(weights[idx + WEIGHTS_PLANE2_OFFSET]) * w;
        }
    }
    ((sum1 >> 4) as i32, (sum2 >> 4) as i32)
}

/// Decodes one block into tightly packed RGBA8 texels.
///
/// `out` must hold `4 * texel_count` bytes. Texels are emitted in z, y, x
/// raster order.
pub fn decode_block_rgba8(
    profile: Profile,
    bsd: &BlockSizeDescriptor,
    block: &[u8; BLOCK_BYTES],
    out: &mut [u8],
) {
    let texel_count = bsd.texel_count();
    let dst = &mut out[..texel_count * 4];

    let scb = physical_to_symbolic(block, bsd);
    if unlikely(scb.block_type != SymbolicBlockType::NonConst) {
        match scb.block_type {
            SymbolicBlockType::ConstU16 => {
                fill_const_rgba8(
                    dst,
                    [
                        (scb.constant_color[0] >> 8) as u8,
                        (scb.constant_color[1] >> 8) as u8,
                        (scb.constant_color[2] >> 8) as u8,
                        (scb.constant_color[3] >> 8) as u8,
                    ],
                );
            }
            // FP16 constant blocks are only valid in HDR profiles.
            _ => fill_error_rgba8(dst),
        }
        return;
    }

    let Some(bmi) = bsd.block_mode(scb.block_mode) else {
        fill_error_rgba8(dst);
        return;
    };

    let Some(eps) = unpack_partition_endpoints(profile, &scb) else {
        fill_error_rgba8(dst);
        return;
    };

    decode_texels(bsd, bmi, &scb, &eps, |tix, _part, c16| {
        let off = tix * 4;
        for c in 0..4 {
            dst[off + c] = (c16[c] >> 8) as u8;
        }
    });
}

/// Endpoints for every partition in base and delta form, with the LNS
/// encoding flags needed by float output.
pub(crate) struct PartitionEndpoints {
    pub ep0: [[i32; 4]; BLOCK_MAX_PARTITIONS],
    pub epd: [[i32; 4]; BLOCK_MAX_PARTITIONS],
    pub rgb_lns: [bool; BLOCK_MAX_PARTITIONS],
    pub alpha_lns: [bool; BLOCK_MAX_PARTITIONS],
}

pub(crate) fn unpack_partition_endpoints(
    profile: Profile,
    scb: &SymbolicBlock,
) -> Option<PartitionEndpoints> {
    let partition_count = scb.partition_count as usize;
    if partition_count == 0 || partition_count > BLOCK_MAX_PARTITIONS {
        return None;
    }

    let mut eps = PartitionEndpoints {
        ep0: [[0; 4]; BLOCK_MAX_PARTITIONS],
        epd: [[0; 4]; BLOCK_MAX_PARTITIONS],
        rgb_lns: [false; BLOCK_MAX_PARTITIONS],
        alpha_lns: [false; BLOCK_MAX_PARTITIONS],
    };
    for p in 0..partition_count {
        let e = unpack_color_endpoints(profile, scb.color_formats[p], &scb.color_values[p]);
        eps.rgb_lns[p] = e.rgb_hdr;
        eps.alpha_lns[p] = e.alpha_hdr;
        for c in 0..4 {
            eps.ep0[p][c] = e.endpoint0[c];
            eps.epd[p][c] = e.endpoint1[c] - e.endpoint0[c];
        }
    }
    Some(eps)
}

/// Runs per-texel weight interpolation and emits 16-bit channel values.
pub(crate) fn decode_texels(
    bsd: &BlockSizeDescriptor,
    bmi: &BlockModeInfo,
    scb: &SymbolicBlock,
    eps: &PartitionEndpoints,
    mut emit: impl FnMut(usize, usize, [i32; 4]),
) {
    let texel_count = bsd.texel_count();
    let partition_count = scb.partition_count as usize;
    let plane2 = if bmi.dual_plane {
        scb.plane2_component
    } else {
        -1
    };

    let part_by_texel = if partition_count > 1 {
        bsd.partition_table(partition_count)
            .map(|t| t.partitions_for_index(scb.partition_index as usize))
    } else {
        None
    };

    let grid = bsd.weight_grid(bmi);
    for tix in 0..texel_count {
        let (w1, w2) = if bmi.no_decimation {
            let w1 = i32::from(scb.weights[tix]);
            let w2 = if bmi.dual_plane {
                i32::from(scb.weights[tix + WEIGHTS_PLANE2_OFFSET])
            } else {
                0
            };
            (w1, w2)
        } else {
            infill_weights(&scb.weights, &grid.infill[tix], bmi.dual_plane)
        };

        let part = part_by_texel.map_or(0, |p| p[tix] as usize);
        let e0 = &eps.ep0[part];
        let ed = &eps.epd[part];

        let mut c16 = [0i32; 4];
        for (c, out) in c16.iter_mut().enumerate() {
            let w = if c as i8 == plane2 { w2 } else { w1 };
            *out = e0[c] + ((ed[c] * w + 32) >> 6);
        }
        emit(tix, part, c16);
    }
}

pub(crate) fn fill_const_rgba8(dst: &mut [u8], rgba: [u8; 4]) {
    for texel in dst.chunks_exact_mut(4) {
        texel.copy_from_slice(&rgba);
    }
}

pub(crate) fn fill_error_rgba8(dst: &mut [u8]) {
    fill_const_rgba8(dst, [0xFF, 0x00, 0xFF, 0xFF]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitio::{bit_at, set_bit, write_bits};
    use crate::const_block::{encode_const_block_f16, encode_const_block_rgba8};
    use crate::ise::encode_ise;
    use crate::quant::QuantMethod;

    fn decode(bsd: &BlockSizeDescriptor, block: &[u8; BLOCK_BYTES]) -> alloc::vec::Vec<u8> {
        let mut out = alloc::vec![0u8; bsd.texel_count() * 4];
        decode_block_rgba8(Profile::Ldr, bsd, block, &mut out);
        out
    }

    #[test]
    fn const_block_fills_the_footprint() {
        let bsd = BlockSizeDescriptor::new(5, 5, 1).unwrap();
        let block = encode_const_block_rgba8(9, 18, 27, 36);
        let out = decode(&bsd, &block);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [9, 18, 27, 36]);
        }
    }

    #[test]
    fn f16_const_block_is_an_error_in_ldr() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let block = encode_const_block_f16(0x3C00, 0x3C00, 0x3C00, 0x3C00);
        let out = decode(&bsd, &block);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [0xFF, 0x00, 0xFF, 0xFF]);
        }
    }

    #[test]
    fn invalid_payload_fills_magenta() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let out = decode(&bsd, &[0u8; BLOCK_BYTES]);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [0xFF, 0x00, 0xFF, 0xFF]);
        }
    }

    #[test]
    fn handcrafted_luminance_block_decodes_white() {
        // Mode 81: 4x4 weight grid, quant3 weights, single plane. One
        // partition, luminance endpoints 0 and 255, all weights at maximum.
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let bmi = bsd.block_mode(81).unwrap();
        assert_eq!((bmi.x_weights, bmi.y_weights), (4, 4));
        assert_eq!(bmi.weight_quant, QuantMethod::Quant3);
        assert!(!bmi.dual_plane);

        let mut block = [0u8; BLOCK_BYTES];
        write_bits(&mut block, 11, 0, 81);
        write_bits(&mut block, 2, 11, 0); // one partition
        write_bits(&mut block, 4, 13, 0); // luminance format
        // Endpoint integers at quant256: lum0 = 0, lum1 = 255.
        encode_ise(QuantMethod::Quant256, 2, &[0, 255], &mut block, 17);

        // Weight stream, mirrored from bit 127 downwards.
        let mut wbuf = [0u8; BLOCK_BYTES];
        encode_ise(QuantMethod::Quant3, 16, &[2u8; 16], &mut wbuf, 0);
        for k in 0..bmi.weight_bits as usize {
            if bit_at(&wbuf, k) != 0 {
                set_bit(&mut block, 127 - k);
            }
        }

        let out = decode(&bsd, &block);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [255, 255, 255, 255]);
        }
    }
}
