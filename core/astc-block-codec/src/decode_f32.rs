//! Block decode to RGBA float32.
//!
//! HDR endpoints carry LNS-encoded 16-bit values and LDR endpoints carry
//! UNORM16, so each channel picks its conversion per partition.

use likely_stable::unlikely;

use crate::decode::{decode_texels, unpack_partition_endpoints};
use crate::descriptor::BlockSizeDescriptor;
use crate::fp::{half_to_f32, lns_to_sf16, unorm16_to_sf16};
use crate::symbolic::{physical_to_symbolic, SymbolicBlockType};
use crate::{Profile, BLOCK_BYTES};

#[inline]
fn unorm16_f32(v: u16) -> f32 {
    half_to_f32(unorm16_to_sf16(v))
}

#[inline]
fn lns_f32(v: u16) -> f32 {
    half_to_f32(lns_to_sf16(v))
}

/// Decodes one block into tightly packed RGBA float32 texels.
///
/// `out` must hold `4 * texel_count` values. Texels are emitted in z, y, x
/// raster order.
pub fn decode_block_rgba_f32(
    profile: Profile,
    bsd: &BlockSizeDescriptor,
    block: &[u8; BLOCK_BYTES],
    out: &mut [f32],
) {
    let texel_count = bsd.texel_count();
    let dst = &mut out[..texel_count * 4];

    let scb = physical_to_symbolic(block, bsd);
    if unlikely(scb.block_type != SymbolicBlockType::NonConst) {
        match scb.block_type {
            SymbolicBlockType::ConstU16 => {
                let mut rgba = [0.0f32; 4];
                for (v, c) in rgba.iter_mut().zip(scb.constant_color) {
                    *v = unorm16_f32(c);
                }
                fill_const_rgba_f32(dst, rgba);
            }
            // FP16 constant blocks are only valid in HDR profiles.
            SymbolicBlockType::ConstF16 if !profile.is_ldr() => {
                let mut rgba = [0.0f32; 4];
                for (v, c) in rgba.iter_mut().zip(scb.constant_color) {
                    *v = half_to_f32(c);
                }
                fill_const_rgba_f32(dst, rgba);
            }
            _ => fill_error_rgba_f32(dst),
        }
        return;
    }

    let Some(bmi) = bsd.block_mode(scb.block_mode) else {
        fill_error_rgba_f32(dst);
        return;
    };

    let Some(eps) = unpack_partition_endpoints(profile, &scb) else {
        fill_error_rgba_f32(dst);
        return;
    };

    decode_texels(bsd, bmi, &scb, &eps, |tix, part, c16| {
        let off = tix * 4;
        let rgb_lns = eps.rgb_lns[part];
        let alpha_lns = eps.alpha_lns[part];
        for c in 0..4 {
            let v = c16[c].clamp(0, 0xFFFF) as u16;
            let lns = if c == 3 { alpha_lns } else { rgb_lns };
            dst[off + c] = if lns { lns_f32(v) } else { unorm16_f32(v) };
        }
    });
}

fn fill_const_rgba_f32(dst: &mut [f32], rgba: [f32; 4]) {
    for texel in dst.chunks_exact_mut(4) {
        texel.copy_from_slice(&rgba);
    }
}

fn fill_error_rgba_f32(dst: &mut [f32]) {
    fill_const_rgba_f32(dst, [1.0, 0.0, 1.0, 1.0]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::const_block::{encode_const_block_f16, encode_const_block_rgba8};
    use crate::fp::f32_to_half;

    fn decode(
        profile: Profile,
        bsd: &BlockSizeDescriptor,
        block: &[u8; BLOCK_BYTES],
    ) -> alloc::vec::Vec<f32> {
        let mut out = alloc::vec![0.0f32; bsd.texel_count() * 4];
        decode_block_rgba_f32(profile, bsd, block, &mut out);
        out
    }

    #[test]
    fn const_u16_block_maps_to_unit_range() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let block = encode_const_block_rgba8(255, 0, 128, 255);
        let out = decode(Profile::Ldr, &bsd, &block);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel[0], 1.0);
            assert_eq!(texel[1], 0.0);
            assert!((texel[2] - 128.0 / 255.0).abs() < 1e-3);
            assert_eq!(texel[3], 1.0);
        }
    }

    #[test]
    fn f16_const_block_decodes_in_hdr() {
        let bsd = BlockSizeDescriptor::new(6, 6, 1).unwrap();
        let block = encode_const_block_f16(
            f32_to_half(4.0),
            f32_to_half(0.25),
            f32_to_half(1.0),
            f32_to_half(1.0),
        );
        let out = decode(Profile::Hdr, &bsd, &block);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [4.0, 0.25, 1.0, 1.0]);
        }
    }

    #[test]
    fn f16_const_block_errors_in_ldr() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let block = encode_const_block_f16(0, 0, 0, 0);
        let out = decode(Profile::LdrSrgb, &bsd, &block);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [1.0, 0.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn invalid_payload_fills_magenta() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let out = decode(Profile::Hdr, &bsd, &[0u8; BLOCK_BYTES]);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [1.0, 0.0, 1.0, 1.0]);
        }
    }
}
