//! HDR RGBA float block encoder.
//!
//! HDR encoding works in 16-bit code space: RGB is converted to the
//! logarithmic encoding the HDR endpoint formats decode to, alpha either
//! joins it (full HDR) or stays UNORM16 (HDR RGB + LDR alpha). The search
//! mirrors the LDR encoder, with two differences: several endpoint formats
//! compete per candidate, and any component may carry the second weight
//! plane.

use libm::sqrt;

use super::candidates::select_partition_candidates_u16;
use super::hdr_quantize::{
    quantize_hdr_luminance_large_range, quantize_hdr_rgb, quantize_hdr_rgb_ldr_alpha,
    quantize_hdr_rgb_scale, quantize_hdr_rgba, try_quantize_hdr_luminance_small_range,
};
use super::pack::build_physical_block;
use super::tuning::tuning_for;
use super::{color_quantize, mode_limit_for, EncodeOptions, EncodeQuality};
use crate::const_block::encode_const_block_f16;
use crate::decimation::DecimationEntry;
use crate::descriptor::BlockSizeDescriptor;
use crate::endpoints::{format, unpack_color_endpoints};
use crate::error::BlockError;
use crate::fp::{f32_to_half, float_to_lns};
use crate::quant::{quant_level_for_ise, QuantMethod};
use crate::weights::WEIGHT_UNSCRAMBLE_AND_UNQUANT_MAP;
use crate::{
    Profile, BLOCK_BYTES, BLOCK_MAX_COLOR_INTS_BUF, BLOCK_MAX_PARTITIONS, BLOCK_MAX_TEXELS,
    BLOCK_MAX_WEIGHTS, PARTITION_INDEX_BITS, WEIGHTS_PLANE2_OFFSET,
};

#[inline]
fn endpoint_int_count(fmt: u8) -> usize {
    ((fmt >> 2) as usize + 1) * 2
}

fn const_block_color_f16(texels: &[f32]) -> Option<[u16; 4]> {
    let first = texels.get(..4)?;
    let c = [
        f32_to_half(first[0]),
        f32_to_half(first[1]),
        f32_to_half(first[2]),
        f32_to_half(first[3]),
    ];
    for texel in texels.chunks_exact(4).skip(1) {
        for i in 0..4 {
            if f32_to_half(texel[i]) != c[i] {
                return None;
            }
        }
    }
    Some(c)
}

fn average_block_f16(texels: &[f32]) -> [u8; BLOCK_BYTES] {
    let count = (texels.len() / 4).max(1) as f64;
    let mut sum = [0.0f64; 4];
    for texel in texels.chunks_exact(4) {
        for c in 0..4 {
            sum[c] += f64::from(texel[c]);
        }
    }
    encode_const_block_f16(
        f32_to_half((sum[0] / count) as f32),
        f32_to_half((sum[1] / count) as f32),
        f32_to_half((sum[2] / count) as f32),
        f32_to_half((sum[3] / count) as f32),
    )
}

/// `|corr|` between one component and the sum of the rest, over code-space
/// texels. Components with no variance report full correlation.
fn component_rest_abs_correlation(codes: &[[u16; 4]], component: usize) -> f64 {
    let n = codes.len();
    if n <= 1 || component > 3 {
        return 1.0;
    }

    let mut sum_x = 0i64;
    let mut sum_y = 0i64;
    let mut sum_xx = 0i64;
    let mut sum_yy = 0i64;
    let mut sum_xy = 0i64;

    for code in codes {
        let x = i64::from(code[component]);
        let y = i64::from(code[0]) + i64::from(code[1]) + i64::from(code[2]) + i64::from(code[3])
            - x;
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_yy += y * y;
        sum_xy += x * y;
    }

    let nn = n as i64;
    let var_x = sum_xx * nn - sum_x * sum_x;
    let var_y = sum_yy * nn - sum_y * sum_y;
    if var_x <= 0 || var_y <= 0 {
        return 1.0;
    }

    let cov = sum_xy * nn - sum_x * sum_y;
    let corr = cov as f64 / sqrt(var_x as f64 * var_y as f64);
    corr.abs().min(1.0)
}

/// Quantizes one partition's endpoints for an HDR format. Returns the
/// unquantized color integers, or `None` when the format cannot represent
/// the pair.
fn quantize_format_endpoints(
    fmt: u8,
    q: QuantMethod,
    e0: [u16; 4],
    e1: [u16; 4],
) -> Option<[u8; 8]> {
    let c0 = [
        f32::from(e0[0]),
        f32::from(e0[1]),
        f32::from(e0[2]),
        f32::from(e0[3]),
    ];
    let c1 = [
        f32::from(e1[0]),
        f32::from(e1[1]),
        f32::from(e1[2]),
        f32::from(e1[3]),
    ];

    match fmt {
        format::HDR_RGBA => Some(quantize_hdr_rgba(c0, c1, q)),
        format::HDR_RGB_LDR_ALPHA => Some(quantize_hdr_rgb_ldr_alpha(c0, c1, q)),
        format::HDR_RGB => {
            let v = quantize_hdr_rgb(c0, c1, q);
            Some([v[0], v[1], v[2], v[3], v[4], v[5], 0, 0])
        }
        format::HDR_RGB_SCALE => {
            // Per-channel ordered low and high, with the mean extent as the
            // shared scale.
            let mut lo = [0.0f32; 3];
            let mut hi = [0.0f32; 3];
            for c in 0..3 {
                lo[c] = c0[c].min(c1[c]);
                hi[c] = c0[c].max(c1[c]);
            }
            let scale = ((hi[0] - lo[0]) + (hi[1] - lo[1]) + (hi[2] - lo[2])) * (1.0 / 3.0);
            let v = quantize_hdr_rgb_scale([lo[0], lo[1], lo[2], scale], q);
            Some([v[0], v[1], v[2], v[3], 0, 0, 0, 0])
        }
        format::HDR_LUMINANCE_SMALL_RANGE => {
            let v = try_quantize_hdr_luminance_small_range(c0, c1, q)?;
            Some([v[0], v[1], 0, 0, 0, 0, 0, 0])
        }
        format::HDR_LUMINANCE_LARGE_RANGE => {
            let v = quantize_hdr_luminance_large_range(c0, c1, q);
            Some([v[0], v[1], 0, 0, 0, 0, 0, 0])
        }
        _ => None,
    }
}

/// Single-plane weight projection in code space.
fn project_weights_codes(
    codes: &[[u16; 4]],
    assign: Option<&[u8]>,
    ep0: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    epd: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    out: &mut [i32],
) {
    for (t, code) in codes.iter().enumerate() {
        let part = assign.map_or(0, |a| a[t] as usize);
        let mut num = 0i64;
        let mut den = 0i64;
        for c in 0..4 {
            let d = i64::from(epd[part][c]);
            num += (i64::from(code[c]) - i64::from(ep0[part][c])) * d;
            den += d * d;
        }
        out[t] = if den == 0 || num <= 0 {
            0
        } else if num >= den {
            64
        } else {
            ((num * 64 + den / 2) / den) as i32
        };
    }
}

/// Dual-plane projection: plane 1 carries the three components other than
/// `plane2`, plane 2 carries `plane2` alone.
fn project_weights_codes_dual(
    codes: &[[u16; 4]],
    assign: Option<&[u8]>,
    ep0: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    epd: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    plane2: usize,
    out1: &mut [i32],
    out2: &mut [i32],
) {
    for (t, code) in codes.iter().enumerate() {
        let part = assign.map_or(0, |a| a[t] as usize);

        let mut num = 0i64;
        let mut den = 0i64;
        for c in 0..4 {
            if c == plane2 {
                continue;
            }
            let d = i64::from(epd[part][c]);
            num += (i64::from(code[c]) - i64::from(ep0[part][c])) * d;
            den += d * d;
        }
        out1[t] = if den == 0 || num <= 0 {
            0
        } else if num >= den {
            64
        } else {
            ((num * 64 + den / 2) / den) as i32
        };

        let d = i64::from(epd[part][plane2]);
        let (den2, sign) = if d < 0 { (-d, -1) } else { (d, 1) };
        let num2 = (i64::from(code[plane2]) - i64::from(ep0[part][plane2])) * sign;
        out2[t] = if den2 == 0 || num2 <= 0 {
            0
        } else if num2 >= den2 {
            64
        } else {
            ((num2 * 64 + den2 / 2) / den2) as i32
        };
    }
}

/// Weighted SSE of a quantized candidate against the code-space texels,
/// with the early-out used everywhere in the search.
#[allow(clippy::too_many_arguments)]
fn candidate_error_codes(
    codes: &[[u16; 4]],
    weights_uq: &[u8; BLOCK_MAX_WEIGHTS],
    infill: &[DecimationEntry],
    no_decimation: bool,
    plane2: i8,
    assign: Option<&[u8]>,
    ep0: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    epd: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    channel_weight: &[f64; 4],
    best_err: f64,
) -> f64 {
    let dual_plane = plane2 >= 0;
    let mut err = 0.0f64;

    for (t, code) in codes.iter().enumerate() {
        let (w1, w2) = if no_decimation {
            let w1 = i32::from(weights_uq[t]);
            let w2 = if dual_plane {
                i32::from(weights_uq[t + WEIGHTS_PLANE2_OFFSET])
            } else {
                0
            };
            (w1, w2)
        } else {
            let e = &infill[t];
            let mut sum1 = 8u32;
            let mut sum2 = 8u32;
            for i in 0..4 {
                let idx = e.idx[i] as usize;
                let ew = u32::from(e.w[i]);
                sum1 += u32::from(weights_uq[idx]) * ew;
                if dual_plane {
                    sum2 += u32::from(weights_uq[idx + WEIGHTS_PLANE2_OFFSET]) * ew;
                }
            }
            ((sum1 >> 4) as i32, (sum2 >> 4) as i32)
        };

        let part = assign.map_or(0, |a| a[t] as usize);
        for c in 0..4 {
            let w = if c as i8 == plane2 { w2 } else { w1 };
            let v = (ep0[part][c] + ((epd[part][c] * w + 32) >> 6)).clamp(0, 0xFFFF);
            let d = f64::from(i32::from(code[c]) - v);
            err += channel_weight[c] * d * d;
        }
        if err >= best_err {
            break;
        }
    }
    err
}

/// Encodes one block of RGBA f32 texels. Only HDR profiles are supported;
/// `texels` holds `4 * texel_count` linear floats in z, y, x raster order.
pub fn encode_block_rgba_f32(
    profile: Profile,
    bsd: &BlockSizeDescriptor,
    texels: &[f32],
    opts: &EncodeOptions,
) -> Result<[u8; BLOCK_BYTES], BlockError> {
    if !profile.is_hdr() {
        return Err(BlockError::UnsupportedProfile(profile));
    }

    let texel_count = bsd.texel_count();
    let texels = &texels[..texel_count * 4];

    if let Some([r, g, b, a]) = const_block_color_f16(texels) {
        return Ok(encode_const_block_f16(r, g, b, a));
    }

    let mut tune = tuning_for(opts.quality, texel_count);
    if let Some(over) = opts.tuning_override {
        tune = over;
    }

    let modes = bsd.encode_mode_order();
    let mode_limit = mode_limit_for(bsd, tune.mode_limit);
    let modes = &modes[..mode_limit];

    // Convert into code space and gather per-channel extents.
    let mut codes = [[0u16; 4]; BLOCK_MAX_TEXELS];
    let mut texel_luma = [0.0f32; BLOCK_MAX_TEXELS];
    let mut texel_alpha = [0.0f32; BLOCK_MAX_TEXELS];
    let mut code_min = [0xFFFFu16; 4];
    let mut code_max = [0u16; 4];
    for (t, texel) in texels.chunks_exact(4).enumerate() {
        texel_luma[t] = texel[0] + texel[1] + texel[2];
        texel_alpha[t] = texel[3];

        codes[t][0] = float_to_lns(texel[0]);
        codes[t][1] = float_to_lns(texel[1]);
        codes[t][2] = float_to_lns(texel[2]);
        codes[t][3] = if profile == Profile::Hdr {
            float_to_lns(texel[3])
        } else {
            let a = texel[3].clamp(0.0, 1.0);
            let a = if a.is_nan() { 0.0 } else { a };
            (a * 65535.0 + 0.5) as u16
        };

        for c in 0..4 {
            code_min[c] = code_min[c].min(codes[t][c]);
            code_max[c] = code_max[c].max(codes[t][c]);
        }
    }
    let codes = &codes[..texel_count];

    let alpha_min = code_min[3];
    let alpha_vary = code_min[3] != code_max[3];

    // Components eligible for the second weight plane.
    let mut dp_components = [0usize; 4];
    let mut dp_count = 0usize;
    if opts.quality >= EncodeQuality::Thorough {
        let thresh = tune.dual_plane_correlation_threshold;
        for c in 0..4 {
            if code_min[c] == code_max[c] {
                continue;
            }
            if thresh > 0.0 && component_rest_abs_correlation(codes, c) >= f64::from(thresh) {
                continue;
            }
            dp_components[dp_count] = c;
            dp_count += 1;
        }
    } else if alpha_vary {
        dp_components[0] = 3;
        dp_count = 1;
    }
    let allow_dual_plane = dp_count != 0;

    let channel_weight = [
        f64::from(opts.channel_weight[0]),
        f64::from(opts.channel_weight[1]),
        f64::from(opts.channel_weight[2]),
        f64::from(opts.channel_weight[3]),
    ];

    // Ranked partition seeds.
    let mut seed_storage = [[0usize; 128]; BLOCK_MAX_PARTITIONS + 1];
    let mut seed_counts = [0usize; BLOCK_MAX_PARTITIONS + 1];
    let mut index_limits = [0usize; BLOCK_MAX_PARTITIONS + 1];
    for pc in 2..=tune.max_partition_count.min(BLOCK_MAX_PARTITIONS) {
        let Some(pt) = bsd.partition_table(pc) else {
            continue;
        };
        let index_limit = tune.partition_index_limit[pc].min(1 << PARTITION_INDEX_BITS);
        index_limits[pc] = index_limit;
        let want = tune.partition_candidate_limit[pc].min(index_limit).min(128);
        if want > 0 {
            seed_counts[pc] = select_partition_candidates_u16(
                &mut seed_storage[pc][..want],
                codes,
                pt,
                pc,
                index_limit,
                alpha_vary,
            );
        }
    }

    // Endpoint formats worth trying. The RGB-only formats need constant
    // alpha at its profile's "fully opaque" code.
    let mut formats = [0u8; 5];
    let mut format_count = 0usize;
    let (base_format, opaque_code) = if profile == Profile::Hdr {
        (format::HDR_RGBA, 0x7800u16)
    } else {
        (format::HDR_RGB_LDR_ALPHA, 0xFFFFu16)
    };
    formats[format_count] = base_format;
    format_count += 1;
    if !alpha_vary && alpha_min == opaque_code {
        for fmt in [
            format::HDR_RGB,
            format::HDR_RGB_SCALE,
            format::HDR_LUMINANCE_SMALL_RANGE,
            format::HDR_LUMINANCE_LARGE_RANGE,
        ] {
            formats[format_count] = fmt;
            format_count += 1;
        }
    }
    let formats = &formats[..format_count];

    struct Best {
        mode: u16,
        partition_count: usize,
        partition_index: usize,
        plane2_component: i8,
        endpoint_format: u8,
        color_quant: QuantMethod,
        endpoint_pquant: [u8; BLOCK_MAX_COLOR_INTS_BUF],
        endpoint_len: usize,
        weight_pquant: [u8; BLOCK_MAX_WEIGHTS],
        weight_len: usize,
    }
    let mut best: Option<Best> = None;
    let mut best_err = f64::INFINITY;

    let mut texel_weights = [0i32; BLOCK_MAX_TEXELS];
    let mut texel_weights2 = [0i32; BLOCK_MAX_TEXELS];
    let mut weights_uq = [0u8; BLOCK_MAX_WEIGHTS];
    let mut endpoint_pquant = [0u8; BLOCK_MAX_COLOR_INTS_BUF];
    let mut weight_pquant = [0u8; BLOCK_MAX_WEIGHTS];
    let mut eval_ep0 = [[0i32; 4]; BLOCK_MAX_PARTITIONS];
    let mut eval_epd = [[0i32; 4]; BLOCK_MAX_PARTITIONS];

    'modes: for &mode in modes {
        let Some(bmi) = bsd.block_mode(mode) else {
            continue;
        };
        if bmi.dual_plane && !allow_dual_plane {
            continue;
        }

        let grid = bsd.weight_grid(bmi);
        let weight_count_per_plane = grid.sample_texels.len();
        let real_weight_count = bmi.real_weight_count as usize;
        let no_decimation = bmi.no_decimation;
        let wrow = super::weight_quantize_row(bmi.weight_quant);
        let uq_map = &WEIGHT_UNSCRAMBLE_AND_UNQUANT_MAP[bmi.weight_quant.index()];
        let below_weights_pos = 128usize - bmi.weight_bits as usize;

        for partition_count in 1..=tune.max_partition_count.min(BLOCK_MAX_PARTITIONS) {
            if bmi.dual_plane && partition_count == 4 {
                continue;
            }

            let start_bit = if partition_count == 1 {
                17
            } else {
                19 + PARTITION_INDEX_BITS
            };
            let mut bits_available = below_weights_pos as i32 - start_bit as i32;
            if bmi.dual_plane {
                bits_available -= 2;
            }
            if bits_available <= 0 {
                continue;
            }

            let pt = if partition_count == 1 {
                None
            } else {
                match bsd.partition_table(partition_count) {
                    Some(pt) => Some(pt),
                    None => continue,
                }
            };

            let ranked = partition_count > 1 && seed_counts[partition_count] > 0;
            let iter_count = if partition_count == 1 {
                1
            } else if ranked {
                seed_counts[partition_count]
            } else {
                index_limits[partition_count]
            };

            for i in 0..iter_count {
                let partition_index = if ranked {
                    seed_storage[partition_count][i]
                } else {
                    i
                };
                let assign = pt.map(|pt| pt.partitions_for_index(partition_index));

                // Min and max luma texels per partition, alpha as tiebreak.
                let mut count = [0u32; BLOCK_MAX_PARTITIONS];
                let mut min_idx = [0usize; BLOCK_MAX_PARTITIONS];
                let mut max_idx = [0usize; BLOCK_MAX_PARTITIONS];
                let mut min_l = [f32::INFINITY; BLOCK_MAX_PARTITIONS];
                let mut max_l = [f32::NEG_INFINITY; BLOCK_MAX_PARTITIONS];
                let mut min_a = [f32::INFINITY; BLOCK_MAX_PARTITIONS];
                let mut max_a = [f32::NEG_INFINITY; BLOCK_MAX_PARTITIONS];
                for t in 0..texel_count {
                    let part = assign.map_or(0, |a| a[t] as usize);
                    count[part] += 1;
                    let l = texel_luma[t];
                    let a = texel_alpha[t];
                    if l < min_l[part] || (l == min_l[part] && a < min_a[part]) {
                        min_l[part] = l;
                        min_a[part] = a;
                        min_idx[part] = t;
                    }
                    if l > max_l[part] || (l == max_l[part] && a > max_a[part]) {
                        max_l[part] = l;
                        max_a[part] = a;
                        max_idx[part] = t;
                    }
                }
                if assign.is_some() && count[..partition_count].iter().any(|&c| c == 0) {
                    continue;
                }

                for &endpoint_format in formats {
                    let endpoint_stride = endpoint_int_count(endpoint_format);
                    let color_int_count = partition_count * endpoint_stride;
                    let Some(color_quant) =
                        quant_level_for_ise(color_int_count, bits_available as usize)
                    else {
                        continue;
                    };
                    if color_quant < QuantMethod::Quant6 {
                        continue;
                    }

                    let mut format_ok = true;
                    for p in 0..partition_count {
                        let Some(uq) = quantize_format_endpoints(
                            endpoint_format,
                            color_quant,
                            codes[min_idx[p]],
                            codes[max_idx[p]],
                        ) else {
                            format_ok = false;
                            break;
                        };

                        let base = p * endpoint_stride;
                        for j in 0..endpoint_stride {
                            endpoint_pquant[base + j] = color_quantize(color_quant, uq[j]).0;
                        }

                        let e = unpack_color_endpoints(
                            profile,
                            endpoint_format,
                            &uq[..endpoint_stride],
                        );
                        for c in 0..4 {
                            eval_ep0[p][c] = e.endpoint0[c];
                            eval_epd[p][c] = e.endpoint1[c] - e.endpoint0[c];
                        }
                    }
                    if !format_ok {
                        continue;
                    }

                    let dual_iter = if bmi.dual_plane { dp_count } else { 1 };
                    for di in 0..dual_iter {
                        let plane2_component: i8 = if bmi.dual_plane {
                            dp_components[di] as i8
                        } else {
                            -1
                        };

                        if bmi.dual_plane {
                            project_weights_codes_dual(
                                codes,
                                assign,
                                &eval_ep0,
                                &eval_epd,
                                plane2_component as usize,
                                &mut texel_weights[..texel_count],
                                &mut texel_weights2[..texel_count],
                            );
                            for wi in 0..weight_count_per_plane {
                                let tix = grid.sample_texels[wi] as usize;
                                let p1 = wrow[texel_weights[tix] as usize];
                                let p2 = wrow[texel_weights2[tix] as usize];
                                weight_pquant[2 * wi] = p1;
                                weight_pquant[2 * wi + 1] = p2;
                                weights_uq[wi] = uq_map[p1 as usize];
                                weights_uq[wi + WEIGHTS_PLANE2_OFFSET] = uq_map[p2 as usize];
                            }
                        } else {
                            project_weights_codes(
                                codes,
                                assign,
                                &eval_ep0,
                                &eval_epd,
                                &mut texel_weights[..texel_count],
                            );
                            for wi in 0..weight_count_per_plane {
                                let p =
                                    wrow[texel_weights[grid.sample_texels[wi] as usize] as usize];
                                weight_pquant[wi] = p;
                                weights_uq[wi] = uq_map[p as usize];
                            }
                        }

                        let err = candidate_error_codes(
                            codes,
                            &weights_uq,
                            &grid.infill,
                            no_decimation,
                            plane2_component,
                            assign,
                            &eval_ep0,
                            &eval_epd,
                            &channel_weight,
                            best_err,
                        );

                        if err < best_err {
                            best_err = err;
                            best = Some(Best {
                                mode,
                                partition_count,
                                partition_index,
                                plane2_component,
                                endpoint_format,
                                color_quant,
                                endpoint_pquant,
                                endpoint_len: color_int_count,
                                weight_pquant,
                                weight_len: real_weight_count,
                            });
                            if err == 0.0 {
                                break 'modes;
                            }
                        }
                    }
                }
            }
        }
    }

    if let Some(best) = best {
        if let Some(bmi) = bsd.block_mode(best.mode) {
            if let Ok(block) = build_physical_block(
                bsd,
                bmi,
                best.partition_count,
                best.partition_index,
                best.plane2_component,
                best.endpoint_format,
                best.color_quant,
                &best.endpoint_pquant[..best.endpoint_len],
                &best.weight_pquant[..best.weight_len],
            ) {
                return Ok(block);
            }
        }
    }

    Ok(average_block_f16(texels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_f32::decode_block_rgba_f32;
    use crate::test_prelude::*;

    fn round_trip(
        profile: Profile,
        bsd: &BlockSizeDescriptor,
        texels: &[f32],
        opts: &EncodeOptions,
    ) -> Vec<f32> {
        let block = encode_block_rgba_f32(profile, bsd, texels, opts).unwrap();
        let mut out = vec![0.0f32; bsd.texel_count() * 4];
        decode_block_rgba_f32(profile, bsd, &block, &mut out);
        out
    }

    #[test]
    fn ldr_profiles_are_rejected() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let texels = vec![0.5f32; 64];
        assert_eq!(
            encode_block_rgba_f32(Profile::Ldr, &bsd, &texels, &EncodeOptions::default()),
            Err(BlockError::UnsupportedProfile(Profile::Ldr))
        );
    }

    #[test]
    fn const_input_becomes_an_f16_const_block() {
        let bsd = BlockSizeDescriptor::new(5, 5, 1).unwrap();
        let mut texels = Vec::new();
        for _ in 0..25 {
            texels.extend_from_slice(&[2.5f32, 0.125, 1.0, 1.0]);
        }
        let block =
            encode_block_rgba_f32(Profile::Hdr, &bsd, &texels, &EncodeOptions::default()).unwrap();
        assert!(crate::const_block::is_f16_const_block(&block));

        let mut out = vec![0.0f32; 25 * 4];
        decode_block_rgba_f32(Profile::Hdr, &bsd, &block, &mut out);
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [2.5, 0.125, 1.0, 1.0]);
        }
    }

    #[test]
    fn luminance_ramps_reproduce_closely() {
        let bsd = BlockSizeDescriptor::new(6, 6, 1).unwrap();
        let mut texels = Vec::new();
        for t in 0..36 {
            let v = 0.5 + (t as f32) * 0.1;
            texels.extend_from_slice(&[v, v, v, 1.0]);
        }
        let out = round_trip(Profile::Hdr, &bsd, &texels, &EncodeOptions::default());
        for (src, dec) in texels.chunks_exact(4).zip(out.chunks_exact(4)) {
            for c in 0..3 {
                let err = (src[c] - dec[c]).abs();
                assert!(err <= src[c] * 0.25 + 0.05, "{} vs {}", src[c], dec[c]);
            }
        }
    }

    #[test]
    fn ldr_alpha_profile_keeps_alpha_accurate() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let mut texels = Vec::new();
        for t in 0..16 {
            let a = 0.25 + (t as f32) * 0.04;
            texels.extend_from_slice(&[4.0, 4.0, 4.0, a]);
        }
        let out = round_trip(
            Profile::HdrRgbLdrAlpha,
            &bsd,
            &texels,
            &EncodeOptions::default(),
        );
        for (src, dec) in texels.chunks_exact(4).zip(out.chunks_exact(4)) {
            assert!((src[3] - dec[3]).abs() <= 0.1, "{} vs {}", src[3], dec[3]);
        }
    }

    #[test]
    fn encoded_hdr_blocks_always_parse() {
        let bsd = BlockSizeDescriptor::new(5, 5, 1).unwrap();
        let mut rng = TestRng::new(99);
        for _ in 0..4 {
            let texels: Vec<f32> = (0..25 * 4)
                .map(|_| (rng.next_u8() as f32) / 16.0)
                .collect();
            let block =
                encode_block_rgba_f32(Profile::Hdr, &bsd, &texels, &EncodeOptions::default())
                    .unwrap();
            let scb = crate::symbolic::physical_to_symbolic(&block, &bsd);
            assert_ne!(scb.block_type, crate::symbolic::SymbolicBlockType::Error);
        }
    }
}
