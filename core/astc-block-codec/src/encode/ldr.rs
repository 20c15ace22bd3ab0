//! LDR RGBA8 block encoder.
//!
//! The search walks block modes best-quality first, and within each mode
//! tries partition counts and ranked partition seeds. Endpoints come from a
//! min/max luma pick per partition, weights from projecting each texel onto
//! the endpoint line, and candidates are scored by decoding them exactly as
//! the format specifies.

use libm::{atan2, cos, fabs, sin, sqrtf};

use super::candidates::select_partition_candidates;
use super::correlation::alpha_luma_abs_correlation;
use super::pack::build_physical_block;
use super::tuning::{tuning_for, widen_for_normal_maps};
use super::{
    average_rgba8, color_quantize, const_block_color_rgba8, expand_endpoint_ldr,
    expand_endpoint_srgb, u16_to_u8_replicated, u8_to_u16_replicated, weight_quantize_row,
    EncodeOptions, EncodeQuality,
};
use crate::const_block::encode_const_block_rgba8;
use crate::decimation::DecimationEntry;
use crate::descriptor::BlockSizeDescriptor;
use crate::endpoints::format;
use crate::error::BlockError;
use crate::quant::{quant_level_for_ise, QuantMethod};
use crate::weights::WEIGHT_UNSCRAMBLE_AND_UNQUANT_MAP;
use crate::{
    Profile, BLOCK_BYTES, BLOCK_MAX_COLOR_INTS_BUF, BLOCK_MAX_PARTITIONS, BLOCK_MAX_TEXELS,
    BLOCK_MAX_WEIGHTS, PARTITION_INDEX_BITS, WEIGHTS_PLANE2_OFFSET,
};

/// Quantized endpoints for one partition.
///
/// `e0`/`e1` hold the values the decoder will reconstruct, ordered so the
/// blue-contraction swap in the decoder never triggers. `pquant` holds the
/// scrambled stored symbols in wire order r0,r1,g0,g1,b0,b1,a0,a1.
#[derive(Clone, Copy, Default)]
struct PartitionEndpointsRgba {
    e0: [u8; 4],
    e1: [u8; 4],
    pquant: [u8; 8],
}

#[inline]
fn luma(texel: &[u8]) -> i32 {
    i32::from(texel[0]) + i32::from(texel[1]) + i32::from(texel[2])
}

fn quantize_endpoints_rgba(q: QuantMethod, e0: [u8; 4], e1: [u8; 4]) -> PartitionEndpointsRgba {
    let mut out = PartitionEndpointsRgba::default();
    let mut p = [[0u8; 2]; 4];
    for c in 0..4 {
        let (p0, u0) = color_quantize(q, e0[c]);
        let (p1, u1) = color_quantize(q, e1[c]);
        p[c] = [p0, p1];
        out.e0[c] = u0;
        out.e1[c] = u1;
    }

    let swap = luma(&out.e0) > luma(&out.e1);
    if swap {
        core::mem::swap(&mut out.e0, &mut out.e1);
    }
    for c in 0..4 {
        let [p0, p1] = p[c];
        if swap {
            out.pquant[2 * c] = p1;
            out.pquant[2 * c + 1] = p0;
        } else {
            out.pquant[2 * c] = p0;
            out.pquant[2 * c + 1] = p1;
        }
    }
    out
}

/// Error metric for candidate scoring.
enum Metric {
    /// Channel-weighted SSE over replicated 16-bit values.
    Sse { w: [f64; 4] },
    /// Angular error of the reconstructed normal, from R and A.
    NormalMap,
    /// Weighted error of the RGBM product.
    Rgbm { w: [f64; 3], scale: f64 },
}

#[inline]
fn normal_vec(r: u8, a: u8) -> [f32; 3] {
    let x = f32::from(r) * (2.0 / 255.0) - 1.0;
    let y = f32::from(a) * (2.0 / 255.0) - 1.0;
    let z = sqrtf((1.0 - x * x - y * y).max(0.0));
    let n2 = x * x + y * y + z * z;
    if n2 > 0.0 {
        let inv = 1.0 / sqrtf(n2);
        [x * inv, y * inv, z * inv]
    } else {
        [0.0; 3]
    }
}

#[inline]
fn normal_angular_error(orig_r: u8, orig_a: u8, dec_r: u8, dec_a: u8) -> f64 {
    let r = normal_vec(orig_r, orig_a);
    let d = normal_vec(dec_r, dec_a);
    let dot = f64::from(r[0] * d[0] + r[1] * d[1] + r[2] * d[2]);
    1.0 - dot.clamp(-1.0, 1.0)
}

/// Scores a quantized candidate by simulating the decode. Stops early once
/// the accumulated error reaches `best_err`.
#[allow(clippy::too_many_arguments)]
fn candidate_error(
    texels: &[u8],
    weights_uq: &[u8; BLOCK_MAX_WEIGHTS],
    infill: &[DecimationEntry],
    no_decimation: bool,
    dual_plane: bool,
    assign: Option<&[u8]>,
    ep0: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    epd: &[[i32; 4]; BLOCK_MAX_PARTITIONS],
    use_u8: bool,
    metric: &Metric,
    best_err: f64,
) -> f64 {
    let texel_count = texels.len() / 4;
    let mut err = 0.0f64;

    for t in 0..texel_count {
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
        let e0 = &ep0[part];
        let d = &epd[part];
        let wa = if dual_plane { w2 } else { w1 };

        let mut r16 = e0[0] + ((d[0] * w1 + 32) >> 6);
        let mut g16 = e0[1] + ((d[1] * w1 + 32) >> 6);
        let mut b16 = e0[2] + ((d[2] * w1 + 32) >> 6);
        let mut a16 = e0[3] + ((d[3] * wa + 32) >> 6);
        if use_u8 {
            r16 = u16_to_u8_replicated(r16);
            g16 = u16_to_u8_replicated(g16);
            b16 = u16_to_u8_replicated(b16);
            a16 = u16_to_u8_replicated(a16);
        }

        let off = t * 4;
        match metric {
            Metric::NormalMap => {
                err += normal_angular_error(
                    texels[off],
                    texels[off + 3],
                    (r16 >> 8) as u8,
                    (a16 >> 8) as u8,
                );
            }
            Metric::Rgbm { w, scale } => {
                if a16 == 0 {
                    return f64::INFINITY;
                }
                let src_a = f64::from(u8_to_u16_replicated(texels[off + 3]));
                let dec_a = f64::from(a16);
                let mut err_tex = 0.0;
                for (c, wc) in w.iter().enumerate() {
                    let src = f64::from(u8_to_u16_replicated(texels[off + c])) * src_a * scale;
                    let dec = f64::from([r16, g16, b16][c]) * dec_a * scale;
                    let e = fabs(src - dec).min(1e15);
                    err_tex += wc * e * e;
                }
                err += err_tex.min(1e30);
            }
            Metric::Sse { w } => {
                let dr = f64::from(u8_to_u16_replicated(texels[off]) - r16);
                let dg = f64::from(u8_to_u16_replicated(texels[off + 1]) - g16);
                let db = f64::from(u8_to_u16_replicated(texels[off + 2]) - b16);
                let da = f64::from(u8_to_u16_replicated(texels[off + 3]) - a16);
                err += w[0] * dr * dr + w[1] * dg * dg + w[2] * db * db + w[3] * da * da;
            }
        }

        if err >= best_err {
            break;
        }
    }
    err
}

/// Per-partition min/max pick used for endpoint selection.
#[derive(Clone, Copy)]
struct Extremes {
    count: u32,
    min_idx: usize,
    max_idx: usize,
}

fn select_extremes(
    texel_luma: &[i32],
    texel_alpha: &[i32],
    assign: Option<&[u8]>,
) -> [Extremes; BLOCK_MAX_PARTITIONS] {
    let mut out = [Extremes {
        count: 0,
        min_idx: 0,
        max_idx: 0,
    }; BLOCK_MAX_PARTITIONS];
    let mut min_l = [i32::MAX; BLOCK_MAX_PARTITIONS];
    let mut max_l = [i32::MIN; BLOCK_MAX_PARTITIONS];
    let mut min_a = [i32::MAX; BLOCK_MAX_PARTITIONS];
    let mut max_a = [i32::MIN; BLOCK_MAX_PARTITIONS];

    for t in 0..texel_luma.len() {
        let part = assign.map_or(0, |a| a[t] as usize);
        out[part].count += 1;
        let l = texel_luma[t];
        let ai = texel_alpha[t];
        if l < min_l[part] || (l == min_l[part] && ai < min_a[part]) {
            min_l[part] = l;
            min_a[part] = ai;
            out[part].min_idx = t;
        }
        if l > max_l[part] || (l == max_l[part] && ai > max_a[part]) {
            max_l[part] = l;
            max_a[part] = ai;
            out[part].max_idx = t;
        }
    }
    out
}

/// Re-picks endpoint texels for normal maps with a 2D PCA on (R, A).
fn refine_extremes_normal_map(
    texels: &[u8],
    assign: Option<&[u8]>,
    partition_count: usize,
    extremes: &mut [Extremes; BLOCK_MAX_PARTITIONS],
) {
    let texel_count = texels.len() / 4;
    let mut sum = [[0.0f64; 5]; BLOCK_MAX_PARTITIONS]; // x, y, xx, yy, xy

    for t in 0..texel_count {
        let part = assign.map_or(0, |a| a[t] as usize);
        let x = f64::from(texels[t * 4]);
        let y = f64::from(texels[t * 4 + 3]);
        sum[part][0] += x;
        sum[part][1] += y;
        sum[part][2] += x * x;
        sum[part][3] += y * y;
        sum[part][4] += x * y;
    }

    let mut mean = [[0.0f64; 2]; BLOCK_MAX_PARTITIONS];
    let mut dir = [[1.0f64, 0.0]; BLOCK_MAX_PARTITIONS];
    for p in 0..partition_count {
        let n = f64::from(extremes[p].count);
        if n <= 0.0 {
            continue;
        }
        let mx = sum[p][0] / n;
        let my = sum[p][1] / n;
        mean[p] = [mx, my];

        let cov00 = sum[p][2] / n - mx * mx;
        let cov11 = sum[p][3] / n - my * my;
        let cov01 = sum[p][4] / n - mx * my;
        if cov01 != 0.0 || cov00 != cov11 {
            let theta = 0.5 * atan2(2.0 * cov01, cov00 - cov11);
            dir[p] = [cos(theta), sin(theta)];
        } else if cov11 > cov00 {
            dir[p] = [0.0, 1.0];
        }
    }

    let mut min_proj = [f64::INFINITY; BLOCK_MAX_PARTITIONS];
    let mut max_proj = [f64::NEG_INFINITY; BLOCK_MAX_PARTITIONS];
    for t in 0..texel_count {
        let part = assign.map_or(0, |a| a[t] as usize);
        let x = f64::from(texels[t * 4]) - mean[part][0];
        let y = f64::from(texels[t * 4 + 3]) - mean[part][1];
        let proj = x * dir[part][0] + y * dir[part][1];
        if proj < min_proj[part] {
            min_proj[part] = proj;
            extremes[part].min_idx = t;
        }
        if proj > max_proj[part] {
            max_proj[part] = proj;
            extremes[part].max_idx = t;
        }
    }
}

/// Projects each texel onto its partition's endpoint line, producing
/// unquantized weights 0..=64. Integer arithmetic, used for the fast
/// presets with unit channel weights.
fn project_weights_int(
    texels: &[u8],
    assign: Option<&[u8]>,
    endpoints: &[PartitionEndpointsRgba],
    out: &mut [i32],
) {
    let mut e0 = [[0i64; 4]; BLOCK_MAX_PARTITIONS];
    let mut d = [[0i64; 4]; BLOCK_MAX_PARTITIONS];
    let mut den = [0i64; BLOCK_MAX_PARTITIONS];
    for (p, ep) in endpoints.iter().enumerate() {
        for c in 0..4 {
            e0[p][c] = i64::from(ep.e0[c]);
            d[p][c] = i64::from(ep.e1[c]) - i64::from(ep.e0[c]);
        }
        den[p] = d[p].iter().map(|v| v * v).sum();
    }

    for (t, texel) in texels.chunks_exact(4).enumerate() {
        let part = assign.map_or(0, |a| a[t] as usize);
        if den[part] == 0 {
            out[t] = 0;
            continue;
        }
        let mut num = 0i64;
        for c in 0..4 {
            num += (i64::from(texel[c]) - e0[part][c]) * d[part][c];
        }
        out[t] = if num <= 0 {
            0
        } else if num >= den[part] {
            64
        } else {
            ((num * 64 + den[part] / 2) / den[part]) as i32
        };
    }
}

/// Float projection variant, used with channel weights or at the thorough
/// presets.
fn project_weights_float(
    texels: &[u8],
    assign: Option<&[u8]>,
    endpoints: &[PartitionEndpointsRgba],
    channel_weight: [f32; 4],
    out: &mut [i32],
) {
    let mut e0 = [[0.0f32; 4]; BLOCK_MAX_PARTITIONS];
    let mut d = [[0.0f32; 4]; BLOCK_MAX_PARTITIONS];
    let mut inv_den = [0.0f32; BLOCK_MAX_PARTITIONS];
    for (p, ep) in endpoints.iter().enumerate() {
        let mut den = 0.0f32;
        for c in 0..4 {
            e0[p][c] = f32::from(ep.e0[c]);
            d[p][c] = f32::from(ep.e1[c]) - f32::from(ep.e0[c]);
            den += d[p][c] * d[p][c] * channel_weight[c];
        }
        inv_den[p] = if den > 0.0 { 64.0 / den } else { 0.0 };
    }

    for (t, texel) in texels.chunks_exact(4).enumerate() {
        let part = assign.map_or(0, |a| a[t] as usize);
        if inv_den[part] == 0.0 {
            out[t] = 0;
            continue;
        }
        let mut num = 0.0f32;
        for c in 0..4 {
            num += (f32::from(texel[c]) - e0[part][c]) * d[part][c] * channel_weight[c];
        }
        let w = num * inv_den[part];
        out[t] = if w <= 0.0 {
            0
        } else if w >= 64.0 {
            64
        } else {
            (w + 0.5) as i32
        };
    }
}

/// Dual-plane projection: plane 1 carries RGB, plane 2 carries alpha.
fn project_weights_dual(
    texels: &[u8],
    assign: Option<&[u8]>,
    endpoints: &[PartitionEndpointsRgba],
    out1: &mut [i32],
    out2: &mut [i32],
) {
    let mut e0 = [[0i64; 3]; BLOCK_MAX_PARTITIONS];
    let mut d = [[0i64; 3]; BLOCK_MAX_PARTITIONS];
    let mut den_rgb = [0i64; BLOCK_MAX_PARTITIONS];
    let mut a0 = [0i64; BLOCK_MAX_PARTITIONS];
    let mut den_a = [0i64; BLOCK_MAX_PARTITIONS];
    let mut sign_a = [1i64; BLOCK_MAX_PARTITIONS];
    for (p, ep) in endpoints.iter().enumerate() {
        for c in 0..3 {
            e0[p][c] = i64::from(ep.e0[c]);
            d[p][c] = i64::from(ep.e1[c]) - i64::from(ep.e0[c]);
        }
        den_rgb[p] = d[p].iter().map(|v| v * v).sum();
        a0[p] = i64::from(ep.e0[3]);
        let da = i64::from(ep.e1[3]) - a0[p];
        if da < 0 {
            den_a[p] = -da;
            sign_a[p] = -1;
        } else {
            den_a[p] = da;
        }
    }

    for (t, texel) in texels.chunks_exact(4).enumerate() {
        let part = assign.map_or(0, |a| a[t] as usize);

        out1[t] = if den_rgb[part] == 0 {
            0
        } else {
            let mut num = 0i64;
            for c in 0..3 {
                num += (i64::from(texel[c]) - e0[part][c]) * d[part][c];
            }
            if num <= 0 {
                0
            } else if num >= den_rgb[part] {
                64
            } else {
                ((num * 64 + den_rgb[part] / 2) / den_rgb[part]) as i32
            }
        };

        out2[t] = if den_a[part] == 0 {
            0
        } else {
            let num = (i64::from(texel[3]) - a0[part]) * sign_a[part];
            if num <= 0 {
                0
            } else if num >= den_a[part] {
                64
            } else {
                ((num * 64 + den_a[part] / 2) / den_a[part]) as i32
            }
        };
    }
}

/// Encodes one RGBA8 block. `texels` holds `4 * texel_count` bytes in z, y,
/// x raster order.
pub fn encode_block_rgba8(
    profile: Profile,
    bsd: &BlockSizeDescriptor,
    texels: &[u8],
    opts: &EncodeOptions,
) -> Result<[u8; BLOCK_BYTES], BlockError> {
    let texel_count = bsd.texel_count();
    let texels = &texels[..texel_count * 4];

    if let Some([r, g, b, a]) = const_block_color_rgba8(texels) {
        return Ok(encode_const_block_rgba8(r, g, b, a));
    }

    let normal_map = opts.normal_map;
    let rgbm_map = opts.rgbm_map;
    let use_u8 = opts.force_unorm8 || profile == Profile::LdrSrgb;
    let rgbm_scale = if rgbm_map && opts.rgbm_scale < 1.0 {
        1.0
    } else {
        opts.rgbm_scale
    };
    let (endpoint_format, endpoint_stride) = if normal_map {
        (format::LUMINANCE_ALPHA, 4usize)
    } else {
        (format::RGBA, 8usize)
    };

    let mut tune = opts
        .tuning_override
        .unwrap_or_else(|| tuning_for(opts.quality, texel_count));
    if opts.tuning_override.is_none() && normal_map {
        widen_for_normal_maps(&mut tune, opts.quality);
    }

    let modes = bsd.encode_mode_order();
    let mode_limit = super::mode_limit_for(bsd, tune.mode_limit);
    let modes = &modes[..mode_limit];

    let use_float_weights = opts.quality >= EncodeQuality::Thorough;
    let weighted = opts.channel_weight != [1.0; 4];
    let expand: fn(u8) -> i32 = if profile == Profile::LdrSrgb {
        expand_endpoint_srgb
    } else {
        expand_endpoint_ldr
    };

    // Per-texel luma and alpha keys for endpoint selection.
    let mut texel_luma = [0i32; BLOCK_MAX_TEXELS];
    let mut texel_alpha = [0i32; BLOCK_MAX_TEXELS];
    let mut alpha_min = 255u8;
    let mut alpha_max = 0u8;
    for (t, texel) in texels.chunks_exact(4).enumerate() {
        let mut l = luma(texel);
        if rgbm_map {
            l *= i32::from(texel[3]);
        }
        texel_luma[t] = l;
        texel_alpha[t] = i32::from(texel[3]);
        alpha_min = alpha_min.min(texel[3]);
        alpha_max = alpha_max.max(texel[3]);
    }
    let alpha_vary = alpha_min != alpha_max;

    let mut allow_dual_plane = alpha_vary;
    if allow_dual_plane && opts.quality >= EncodeQuality::Thorough {
        let mut thresh = tune.dual_plane_correlation_threshold;
        if normal_map {
            thresh = thresh.max(0.99);
        }
        if thresh > 0.0 && alpha_luma_abs_correlation(texels) >= f64::from(thresh) {
            allow_dual_plane = false;
        }
    }

    // Ranked partition seeds, shared across all modes.
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
            seed_counts[pc] = select_partition_candidates(
                &mut seed_storage[pc][..want],
                texels,
                pt,
                pc,
                index_limit,
                alpha_vary,
            );
        }
    }

    let metric = if normal_map {
        Metric::NormalMap
    } else if rgbm_map {
        Metric::Rgbm {
            w: [
                f64::from(opts.channel_weight[0]),
                f64::from(opts.channel_weight[1]),
                f64::from(opts.channel_weight[2]),
            ],
            scale: f64::from(rgbm_scale),
        }
    } else {
        Metric::Sse {
            w: [
                f64::from(opts.channel_weight[0]),
                f64::from(opts.channel_weight[1]),
                f64::from(opts.channel_weight[2]),
                f64::from(opts.channel_weight[3]),
            ],
        }
    };

    struct Best {
        err: f64,
        mode: u16,
        partition_count: usize,
        partition_index: usize,
        plane2_component: i8,
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
    let mut endpoints = [PartitionEndpointsRgba::default(); BLOCK_MAX_PARTITIONS];
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
        let wrow = weight_quantize_row(bmi.weight_quant);
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

            let color_int_count = partition_count * endpoint_stride;
            let Some(color_quant) = quant_level_for_ise(color_int_count, bits_available as usize)
            else {
                continue;
            };
            if color_quant < QuantMethod::Quant6 {
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

            // Seed iteration: ranked candidates when available, otherwise a
            // linear scan up to the preset's index limit.
            let ranked =
                partition_count > 1 && seed_counts[partition_count] > 0 && !normal_map;
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

                let mut extremes = select_extremes(
                    &texel_luma[..texel_count],
                    &texel_alpha[..texel_count],
                    assign,
                );
                if assign.is_some() && extremes[..partition_count].iter().any(|e| e.count == 0) {
                    continue;
                }
                if normal_map {
                    refine_extremes_normal_map(texels, assign, partition_count, &mut extremes);
                }

                for (p, ex) in extremes[..partition_count].iter().enumerate() {
                    let t0 = &texels[ex.min_idx * 4..ex.min_idx * 4 + 4];
                    let t1 = &texels[ex.max_idx * 4..ex.max_idx * 4 + 4];
                    let ep = if normal_map {
                        quantize_endpoints_rgba(
                            color_quant,
                            [t0[0], t0[0], t0[0], t0[3]],
                            [t1[0], t1[0], t1[0], t1[3]],
                        )
                    } else {
                        quantize_endpoints_rgba(
                            color_quant,
                            [t0[0], t0[1], t0[2], t0[3]],
                            [t1[0], t1[1], t1[2], t1[3]],
                        )
                    };
                    endpoints[p] = ep;
                    let base = p * endpoint_stride;
                    if normal_map {
                        endpoint_pquant[base] = ep.pquant[0];
                        endpoint_pquant[base + 1] = ep.pquant[1];
                        endpoint_pquant[base + 2] = ep.pquant[6];
                        endpoint_pquant[base + 3] = ep.pquant[7];
                    } else {
                        endpoint_pquant[base..base + 8].copy_from_slice(&ep.pquant);
                    }
                }

                let plane2_component: i8 = if bmi.dual_plane { 3 } else { -1 };
                if bmi.dual_plane {
                    project_weights_dual(
                        texels,
                        assign,
                        &endpoints[..partition_count],
                        &mut texel_weights[..texel_count],
                        &mut texel_weights2[..texel_count],
                    );
                    for i in 0..weight_count_per_plane {
                        let tix = grid.sample_texels[i] as usize;
                        let p1 = wrow[texel_weights[tix] as usize];
                        let p2 = wrow[texel_weights2[tix] as usize];
                        weight_pquant[2 * i] = p1;
                        weight_pquant[2 * i + 1] = p2;
                        weights_uq[i] = uq_map[p1 as usize];
                        weights_uq[i + WEIGHTS_PLANE2_OFFSET] = uq_map[p2 as usize];
                    }
                } else {
                    if use_float_weights || weighted {
                        let cw = if weighted {
                            opts.channel_weight
                        } else {
                            [1.0; 4]
                        };
                        project_weights_float(
                            texels,
                            assign,
                            &endpoints[..partition_count],
                            cw,
                            &mut texel_weights[..texel_count],
                        );
                    } else {
                        project_weights_int(
                            texels,
                            assign,
                            &endpoints[..partition_count],
                            &mut texel_weights[..texel_count],
                        );
                    }
                    for i in 0..weight_count_per_plane {
                        let p = wrow[texel_weights[grid.sample_texels[i] as usize] as usize];
                        weight_pquant[i] = p;
                        weights_uq[i] = uq_map[p as usize];
                    }
                }

                for (p, ep) in endpoints[..partition_count].iter().enumerate() {
                    for c in 0..4 {
                        let e0 = expand(ep.e0[c]);
                        eval_ep0[p][c] = e0;
                        eval_epd[p][c] = expand(ep.e1[c]) - e0;
                    }
                }

                let err = candidate_error(
                    texels,
                    &weights_uq,
                    &grid.infill,
                    no_decimation,
                    bmi.dual_plane,
                    assign,
                    &eval_ep0,
                    &eval_epd,
                    use_u8,
                    &metric,
                    best_err,
                );

                if err < best_err {
                    best_err = err;
                    best = Some(Best {
                        err,
                        mode,
                        partition_count,
                        partition_index,
                        plane2_component,
                        color_quant,
                        endpoint_pquant,
                        endpoint_len: partition_count * endpoint_stride,
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

    let Some(best) = best.filter(|b| b.err.is_finite()) else {
        let [r, g, b, a] = average_rgba8(texels);
        return Ok(encode_const_block_rgba8(r, g, b, a));
    };

    let Some(bmi) = bsd.block_mode(best.mode) else {
        let [r, g, b, a] = average_rgba8(texels);
        return Ok(encode_const_block_rgba8(r, g, b, a));
    };
    match build_physical_block(
        bsd,
        bmi,
        best.partition_count,
        best.partition_index,
        best.plane2_component,
        endpoint_format,
        best.color_quant,
        &best.endpoint_pquant[..best.endpoint_len],
        &best.weight_pquant[..best.weight_len],
    ) {
        Ok(block) => Ok(block),
        Err(_) => {
            let [r, g, b, a] = average_rgba8(texels);
            Ok(encode_const_block_rgba8(r, g, b, a))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_block_rgba8;
    use crate::test_prelude::*;

    fn round_trip(
        bsd: &BlockSizeDescriptor,
        texels: &[u8],
        opts: &EncodeOptions,
    ) -> Vec<u8> {
        let block = encode_block_rgba8(Profile::Ldr, bsd, texels, opts).unwrap();
        let mut out = vec![0u8; bsd.texel_count() * 4];
        decode_block_rgba8(Profile::Ldr, bsd, &block, &mut out);
        out
    }

    #[test]
    fn const_input_becomes_a_const_block() {
        let bsd = BlockSizeDescriptor::new(6, 6, 1).unwrap();
        let texels = vec![30u8, 60, 90, 255].repeat(36);
        let block = encode_block_rgba8(Profile::Ldr, &bsd, &texels, &EncodeOptions::default())
            .unwrap();
        assert!(crate::const_block::is_u16_const_block(&block));
        let out = {
            let mut out = vec![0u8; 36 * 4];
            decode_block_rgba8(Profile::Ldr, &bsd, &block, &mut out);
            out
        };
        for texel in out.chunks_exact(4) {
            assert_eq!(texel, [30, 60, 90, 255]);
        }
    }

    #[rstest]
    #[case(4, 4)]
    #[case(6, 6)]
    #[case(8, 8)]
    fn gradients_reproduce_closely(#[case] bx: usize, #[case] by: usize) {
        let bsd = BlockSizeDescriptor::new(bx as u32, by as u32, 1).unwrap();
        let texels = gradient_rgba8(bx, by, 1);
        let out = round_trip(&bsd, &texels, &EncodeOptions::default());
        assert!(max_channel_error(&texels, &out) <= 48);
    }

    #[test]
    fn two_tone_blocks_encode_exactly_at_medium() {
        // Black/white vertical split is representable with two partitions
        // or a fine weight grid.
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let mut texels = Vec::new();
        for _y in 0..4 {
            for x in 0..4 {
                let v = if x < 2 { 0u8 } else { 255 };
                texels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let out = round_trip(&bsd, &texels, &EncodeOptions::default());
        assert_eq!(texels, out);
    }

    #[test]
    fn medium_searches_a_superset_of_fastest() {
        // Both presets use the same metric and projection, and Medium's
        // mode list is a prefix extension of Fastest's, so its best
        // candidate can never be worse.
        let bsd = BlockSizeDescriptor::new(6, 6, 1).unwrap();
        let texels = noise_rgba8(36, 1234);

        let sse = |quality: EncodeQuality| -> u64 {
            let opts = EncodeOptions {
                quality,
                ..Default::default()
            };
            let out = round_trip(&bsd, &texels, &opts);
            texels
                .iter()
                .zip(&out)
                .map(|(a, b)| {
                    let d = i64::from(*a) - i64::from(*b);
                    (d * d) as u64
                })
                .sum()
        };
        assert!(sse(EncodeQuality::Medium) <= sse(EncodeQuality::Fastest));
    }

    #[test]
    fn encoded_blocks_always_parse() {
        let bsd = BlockSizeDescriptor::new(5, 5, 1).unwrap();
        for seed in 0..8u32 {
            let texels = noise_rgba8(25, seed * 97 + 1);
            let block =
                encode_block_rgba8(Profile::Ldr, &bsd, &texels, &EncodeOptions::default())
                    .unwrap();
            let scb = crate::symbolic::physical_to_symbolic(&block, &bsd);
            assert_ne!(scb.block_type, crate::symbolic::SymbolicBlockType::Error);
        }
    }

    #[test]
    fn volume_blocks_encode() {
        let bsd = BlockSizeDescriptor::new(3, 3, 3).unwrap();
        let texels = gradient_rgba8(3, 3, 3);
        let out = round_trip(&bsd, &texels, &EncodeOptions::default());
        assert!(max_channel_error(&texels, &out) <= 64);
    }

    #[test]
    fn normal_map_mode_uses_luminance_alpha() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        // Slowly varying X in R, Y in A, as a two-component normal map.
        let mut texels = Vec::new();
        for y in 0..4u32 {
            for x in 0..4u32 {
                texels.extend_from_slice(&[
                    (100 + x * 10) as u8,
                    0,
                    0,
                    (120 + y * 10) as u8,
                ]);
            }
        }
        let opts = EncodeOptions {
            normal_map: true,
            ..Default::default()
        };
        let block = encode_block_rgba8(Profile::Ldr, &bsd, &texels, &opts).unwrap();
        let scb = crate::symbolic::physical_to_symbolic(&block, &bsd);
        assert_eq!(
            scb.color_formats[0],
            crate::endpoints::format::LUMINANCE_ALPHA
        );
    }

    #[test]
    fn srgb_profile_rounds_through_unorm8() {
        let bsd = BlockSizeDescriptor::new(4, 4, 1).unwrap();
        let texels = gradient_rgba8(4, 4, 1);
        let block = encode_block_rgba8(
            Profile::LdrSrgb,
            &bsd,
            &texels,
            &EncodeOptions::default(),
        )
        .unwrap();
        let scb = crate::symbolic::physical_to_symbolic(&block, &bsd);
        assert_ne!(scb.block_type, crate::symbolic::SymbolicBlockType::Error);
    }
}
