//! Rate-distortion block encoders.
//!
//! The encoder searches the block mode list of a [`BlockSizeDescriptor`] in
//! descending quality order, trying partition counts and seeds within the
//! limits of a tuning preset, and keeps the candidate with the lowest
//! perceptual error.

use crate::color_unquant::{unquant_color, COLOR_QUANT_COUNT, COLOR_QUANT_MIN};
use crate::descriptor::BlockSizeDescriptor;
use crate::quant::QuantMethod;
use crate::weights::{WEIGHT_QUANT_COUNT, WEIGHT_QUANT_TO_UNQUANT, WEIGHT_SCRAMBLE_MAP};

pub mod candidates;
pub mod correlation;
pub mod hdr;
pub mod hdr_quantize;
pub mod ldr;
pub mod pack;
pub mod tuning;

pub use hdr::encode_block_rgba_f32;
pub use ldr::encode_block_rgba8;
pub use tuning::EncoderTuning;

/// Encoder search effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[allow(missing_docs)]
pub enum EncodeQuality {
    Fastest,
    Fast,
    #[default]
    Medium,
    Thorough,
    VeryThorough,
    Exhaustive,
}

/// Per-block encoder options shared by the LDR and HDR entry points.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Search effort preset.
    pub quality: EncodeQuality,
    /// Per-channel error weights applied to the RGBA error metric.
    pub channel_weight: [f32; 4],
    /// Treat input as a two-component normal map stored in R and A.
    pub normal_map: bool,
    /// Treat input as RGBM-packed HDR data.
    pub rgbm_map: bool,
    /// Multiplier baked into the RGBM encoding, at least 1.
    pub rgbm_scale: f32,
    /// Evaluate error after rounding decoded values to 8 bits.
    pub force_unorm8: bool,
    /// Explicit tuning, overriding the quality preset.
    pub tuning_override: Option<EncoderTuning>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: EncodeQuality::Medium,
            channel_weight: [1.0; 4],
            normal_map: false,
            rgbm_map: false,
            rgbm_scale: 1.0,
            force_unorm8: false,
            tuning_override: None,
        }
    }
}

/// Nearest scrambled endpoint symbol for each 8-bit input, per color quant
/// mode. Ties keep the lowest symbol.
static COLOR_QUANTIZE_PQUANT: [[u8; 256]; COLOR_QUANT_COUNT] = {
    let mut t = [[0u8; 256]; COLOR_QUANT_COUNT];
    let mut qi = 0;
    while qi < COLOR_QUANT_COUNT {
        let q = COLOR_QUANT_MIN as usize + qi;
        let levels = QuantMethod::ALL[q].levels();
        let mut u = 0;
        while u < 256 {
            let mut best = 0usize;
            let mut best_diff = i32::MAX;
            let mut i = 0;
            while i < levels {
                let d = (unquant_color(q, i as u32) as i32 - u as i32).abs();
                if d < best_diff {
                    best_diff = d;
                    best = i;
                    if d == 0 {
                        break;
                    }
                }
                i += 1;
            }
            t[qi][u] = best as u8;
            u += 1;
        }
        qi += 1;
    }
    t
};

static COLOR_QUANTIZE_UQUANT: [[u8; 256]; COLOR_QUANT_COUNT] = {
    let mut t = [[0u8; 256]; COLOR_QUANT_COUNT];
    let mut qi = 0;
    while qi < COLOR_QUANT_COUNT {
        let q = COLOR_QUANT_MIN as usize + qi;
        let mut u = 0;
        while u < 256 {
            t[qi][u] = unquant_color(q, COLOR_QUANTIZE_PQUANT[qi][u] as u32);
            u += 1;
        }
        qi += 1;
    }
    t
};

/// Nearest scrambled weight symbol for each unquantized weight 0..=64, per
/// weight quant mode.
static WEIGHT_QUANTIZE_SCRAMBLED: [[u8; 65]; WEIGHT_QUANT_COUNT] = {
    let mut t = [[0u8; 65]; WEIGHT_QUANT_COUNT];
    let mut q = 0;
    while q < WEIGHT_QUANT_COUNT {
        let levels = QuantMethod::ALL[q].levels();
        let mut u = 0;
        while u <= 64 {
            let mut best = 0usize;
            let mut best_diff = i32::MAX;
            let mut i = 0;
            while i < levels {
                let d = (WEIGHT_QUANT_TO_UNQUANT[q][i] as i32 - u as i32).abs();
                if d < best_diff {
                    best_diff = d;
                    best = i;
                    if d == 0 {
                        break;
                    }
                }
                i += 1;
            }
            t[q][u] = WEIGHT_SCRAMBLE_MAP[q][best];
            u += 1;
        }
        q += 1;
    }
    t
};

/// Quantizes an 8-bit endpoint component. Returns the scrambled stored
/// symbol and the value the decoder will reconstruct.
#[inline]
pub(crate) fn color_quantize(q: QuantMethod, u: u8) -> (u8, u8) {
    if q < COLOR_QUANT_MIN {
        return (0, 0);
    }
    let qi = q.index() - COLOR_QUANT_MIN.index();
    (
        COLOR_QUANTIZE_PQUANT[qi][u as usize],
        COLOR_QUANTIZE_UQUANT[qi][u as usize],
    )
}

/// Row of scrambled weight symbols for one weight quant mode, indexed by
/// unquantized weight 0..=64.
#[inline]
pub(crate) fn weight_quantize_row(q: QuantMethod) -> &'static [u8; 65] {
    &WEIGHT_QUANTIZE_SCRAMBLED[q.index()]
}

#[inline]
pub(crate) fn expand_endpoint_ldr(u: u8) -> i32 {
    i32::from(u) * 257
}

#[inline]
pub(crate) fn expand_endpoint_srgb(u: u8) -> i32 {
    (i32::from(u) << 8) | 0x80
}

/// Returns the block color if every texel is identical.
pub(crate) fn const_block_color_rgba8(texels: &[u8]) -> Option<[u8; 4]> {
    let first: [u8; 4] = texels.get(..4)?.try_into().ok()?;
    for texel in texels.chunks_exact(4).skip(1) {
        if texel != first {
            return None;
        }
    }
    Some(first)
}

/// Rounded per-channel average over a texel slice.
pub(crate) fn average_rgba8(texels: &[u8]) -> [u8; 4] {
    let count = (texels.len() / 4) as u32;
    if count == 0 {
        return [0; 4];
    }
    let mut sum = [0u32; 4];
    for texel in texels.chunks_exact(4) {
        for c in 0..4 {
            sum[c] += u32::from(texel[c]);
        }
    }
    let half = count / 2;
    [
        ((sum[0] + half) / count) as u8,
        ((sum[1] + half) / count) as u8,
        ((sum[2] + half) / count) as u8,
        ((sum[3] + half) / count) as u8,
    ]
}

#[inline]
pub(crate) fn u8_to_u16_replicated(v: u8) -> i32 {
    i32::from(v) * 257
}

#[inline]
pub(crate) fn u16_to_u8_replicated(v: i32) -> i32 {
    (v.clamp(0, 0xFFFF) >> 8) * 257
}

/// Number of block modes the encoder evaluates for a quality preset.
pub(crate) fn mode_limit_for(bsd: &BlockSizeDescriptor, limit: usize) -> usize {
    let total = bsd.encode_mode_order().len();
    if limit == 0 || limit > total {
        total
    } else {
        limit
    }
}
