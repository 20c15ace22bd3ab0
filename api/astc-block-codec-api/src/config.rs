//! Validated codec configuration.
//!
//! A [`Config`] is built from a profile, a block footprint, a search quality
//! in 0.0..=100.0 and a set of [`Flags`]. The quality maps onto search tuning
//! parameters through three preset tables banded by block texel count, with
//! linear interpolation between the table nodes.

use astc_block_codec::encode::{EncodeOptions, EncodeQuality, EncoderTuning};
use astc_block_codec::{is_valid_block_size, Profile};

use crate::error::AstcError;

/// Search quality preset for the fastest encode.
pub const QUALITY_FASTEST: f32 = 0.0;
/// Search quality preset for a fast encode.
pub const QUALITY_FAST: f32 = 10.0;
/// Search quality preset balancing speed and quality.
pub const QUALITY_MEDIUM: f32 = 60.0;
/// Search quality preset for a thorough encode.
pub const QUALITY_THOROUGH: f32 = 98.0;
/// Search quality preset for a very thorough encode.
pub const QUALITY_VERY_THOROUGH: f32 = 99.0;
/// Search quality preset trying every option the tuning exposes.
pub const QUALITY_EXHAUSTIVE: f32 = 100.0;

/// Bitset of encoder and decoder behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u32);

impl Flags {
    /// No flags set.
    pub const NONE: Flags = Flags(0);
    /// Input is a two-component normal map; encode X in luminance and Y in
    /// alpha with matching error weights and widened search limits.
    pub const MAP_NORMAL: Flags = Flags(1 << 0);
    /// Round LDR float output through the 8-bit domain.
    pub const USE_DECODE_UNORM8: Flags = Flags(1 << 1);
    /// Scale RGB error weights by the block's maximum alpha.
    pub const USE_ALPHA_WEIGHT: Flags = Flags(1 << 2);
    /// Weight channel errors perceptually for RGB color data.
    pub const USE_PERCEPTUAL: Flags = Flags(1 << 3);
    /// The context will only ever decompress.
    pub const DECOMPRESS_ONLY: Flags = Flags(1 << 4);
    /// The context only decompresses images it compressed itself, allowing
    /// decompression table setup to be skipped.
    pub const SELF_DECOMPRESS_ONLY: Flags = Flags(1 << 5);
    /// Input is RGBM-packed HDR data.
    pub const MAP_RGBM: Flags = Flags(1 << 6);

    const ALL: Flags = Flags((1 << 7) - 1);

    /// Returns true when every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    /// The raw bit pattern.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl core::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

/// A validated codec configuration.
///
/// Build one with [`Config::new`], then adjust fields before passing it to
/// `Context::new`, which clamps the tuning fields into their legal ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Color profile blocks are encoded and decoded under.
    pub profile: Profile,
    /// Behavior flags.
    pub flags: Flags,

    /// Block footprint X dimension.
    pub block_x: u32,
    /// Block footprint Y dimension.
    pub block_y: u32,
    /// Block footprint Z dimension, 1 for 2D.
    pub block_z: u32,

    /// Red channel error weight.
    pub cw_r_weight: f32,
    /// Green channel error weight.
    pub cw_g_weight: f32,
    /// Blue channel error weight.
    pub cw_b_weight: f32,
    /// Alpha channel error weight.
    pub cw_a_weight: f32,

    /// Radius of the alpha-average footprint enabling all-transparent block
    /// short circuits; zero disables the pass.
    pub a_scale_radius: u32,
    /// Multiplier baked into RGBM-packed data.
    pub rgbm_m_scale: f32,

    /// Highest partition count the search tries, 1..=4.
    pub tune_partition_count_limit: u32,
    /// Partition seeds scanned for two partitions.
    pub tune_2_partition_index_limit: u32,
    /// Partition seeds scanned for three partitions.
    pub tune_3_partition_index_limit: u32,
    /// Partition seeds scanned for four partitions.
    pub tune_4_partition_index_limit: u32,
    /// Number of block modes tried, best-quality first.
    pub tune_block_mode_limit: u32,
    /// Refinement iterations per trial candidate, 1..=8.
    pub tune_refinement_limit: u32,
    /// Trial candidates kept per block mode, 1..=8.
    pub tune_candidate_limit: u32,
    /// Ranked two-partition seeds actually evaluated.
    pub tune_2_partitioning_candidate_limit: u32,
    /// Ranked three-partition seeds actually evaluated.
    pub tune_3_partitioning_candidate_limit: u32,
    /// Ranked four-partition seeds actually evaluated.
    pub tune_4_partitioning_candidate_limit: u32,

    /// PSNR threshold in dB below which the search stops early. HDR
    /// profiles disable the early exit.
    pub tune_db_limit: f32,
    /// Maximum factor by which a trial may overshoot the dB limit and still
    /// exit early.
    pub tune_mse_overshoot: f32,
    /// Error multiplier gating escalation to two partitions.
    pub tune_2_partition_early_out_limit_factor: f32,
    /// Error multiplier gating escalation to three partitions.
    pub tune_3_partition_early_out_limit_factor: f32,
    /// Correlation above which dual-plane modes are skipped.
    pub tune_2_plane_early_out_limit_correlation: f32,
}

struct PresetNode {
    quality: f32,

    partition_count_limit: u32,
    partition_index_limit_2: u32,
    partition_index_limit_3: u32,
    partition_index_limit_4: u32,
    block_mode_limit: u32,
    refinement_limit: u32,
    candidate_limit: u32,
    partitioning_candidate_limit_2: u32,
    partitioning_candidate_limit_3: u32,
    partitioning_candidate_limit_4: u32,
    db_limit_a_base: f32,
    db_limit_b_base: f32,
    mse_overshoot: f32,
    partition_early_out_factor_2: f32,
    partition_early_out_factor_3: f32,
    plane_early_out_correlation: f32,
}

macro_rules! preset {
    ($q:expr, $pc:expr, $i2:expr, $i3:expr, $i4:expr, $bm:expr, $rf:expr, $ca:expr,
     $c2:expr, $c3:expr, $c4:expr, $dba:expr, $dbb:expr, $mse:expr, $p2:expr, $p3:expr,
     $corr:expr) => {
        PresetNode {
            quality: $q,
            partition_count_limit: $pc,
            partition_index_limit_2: $i2,
            partition_index_limit_3: $i3,
            partition_index_limit_4: $i4,
            block_mode_limit: $bm,
            refinement_limit: $rf,
            candidate_limit: $ca,
            partitioning_candidate_limit_2: $c2,
            partitioning_candidate_limit_3: $c3,
            partitioning_candidate_limit_4: $c4,
            db_limit_a_base: $dba,
            db_limit_b_base: $dbb,
            mse_overshoot: $mse,
            partition_early_out_factor_2: $p2,
            partition_early_out_factor_3: $p3,
            plane_early_out_correlation: $corr,
        }
    };
}

// Presets for blocks under 25 texels.
#[rustfmt::skip]
static PRESETS_HIGH_BANDWIDTH: [PresetNode; 6] = [
    preset!(0.0,   2,  10,   6,   4,  43, 2, 2, 2, 2, 2,  85.2,  63.2,  3.5, 1.0,  1.0,  0.85),
    preset!(10.0,  3,  18,  10,   8,  55, 3, 3, 2, 2, 2,  85.2,  63.2,  3.5, 1.0,  1.0,  0.90),
    preset!(60.0,  4,  34,  28,  16,  77, 3, 3, 2, 2, 2,  95.0,  70.0,  2.5, 1.1,  1.05, 0.95),
    preset!(98.0,  4,  82,  60,  30,  94, 4, 4, 3, 2, 2, 105.0,  77.0, 10.0, 1.35, 1.15, 0.97),
    preset!(99.0,  4, 256, 128,  64,  98, 4, 6, 8, 6, 4, 200.0, 200.0, 10.0, 1.6,  1.4,  0.98),
    preset!(100.0, 4, 512, 512, 512, 100, 4, 8, 8, 8, 8, 200.0, 200.0, 10.0, 2.0,  2.0,  0.99),
];

// Presets for blocks of 25..64 texels.
#[rustfmt::skip]
static PRESETS_MID_BANDWIDTH: [PresetNode; 6] = [
    preset!(0.0,   2,  10,   6,   4,  43, 2, 2, 2, 2, 2,  85.2,  63.2,  3.5, 1.0, 1.0,  0.80),
    preset!(10.0,  3,  18,  12,  10,  55, 3, 3, 2, 2, 2,  85.2,  63.2,  3.5, 1.0, 1.0,  0.85),
    preset!(60.0,  3,  34,  28,  16,  77, 3, 3, 2, 2, 2,  95.0,  70.0,  3.0, 1.1, 1.05, 0.90),
    preset!(98.0,  4,  82,  60,  30,  94, 4, 4, 3, 2, 2, 105.0,  77.0, 10.0, 1.4, 1.2,  0.95),
    preset!(99.0,  4, 256, 128,  64,  98, 4, 6, 8, 6, 3, 200.0, 200.0, 10.0, 1.6, 1.4,  0.98),
    preset!(100.0, 4, 256, 256, 256, 100, 4, 8, 8, 8, 8, 200.0, 200.0, 10.0, 2.0, 2.0,  0.99),
];

// Presets for blocks of 64 texels and above.
#[rustfmt::skip]
static PRESETS_LOW_BANDWIDTH: [PresetNode; 6] = [
    preset!(0.0,   2,  10,   6,   4,  40, 2, 2, 2, 2, 2,  85.0,  63.0,  3.5, 1.0, 1.0,  0.80),
    preset!(10.0,  2,  18,  12,  10,  55, 3, 3, 2, 2, 2,  85.0,  63.0,  3.5, 1.0, 1.0,  0.85),
    preset!(60.0,  3,  34,  28,  16,  77, 3, 3, 2, 2, 2,  95.0,  70.0,  3.5, 1.1, 1.05, 0.90),
    preset!(98.0,  4,  82,  60,  30,  93, 4, 4, 3, 2, 2, 105.0,  77.0, 10.0, 1.3, 1.2,  0.97),
    preset!(99.0,  4, 256, 128,  64,  98, 4, 6, 8, 5, 2, 200.0, 200.0, 10.0, 1.6, 1.4,  0.98),
    preset!(100.0, 4, 256, 256, 256, 100, 4, 8, 8, 8, 8, 200.0, 200.0, 10.0, 2.0, 2.0,  0.99),
];

impl Config {
    /// Builds a configuration from a profile, block footprint, search
    /// quality in 0.0..=100.0 and flags.
    ///
    /// `block_z` of zero is accepted as shorthand for a 2D footprint.
    pub fn new(
        profile: Profile,
        block_x: u32,
        block_y: u32,
        block_z: u32,
        quality: f32,
        flags: Flags,
    ) -> Result<Config, AstcError> {
        let block_z = if block_z == 0 { 1 } else { block_z };

        if !(quality >= 0.0 && quality <= 100.0) {
            return Err(AstcError::BadQuality);
        }
        if !is_valid_block_size(block_x, block_y, block_z) {
            return Err(AstcError::BadBlockSize {
                x: block_x,
                y: block_y,
                z: block_z,
            });
        }
        validate_flags(profile, flags)?;

        let texels = (block_x * block_y * block_z) as f64;
        let ltexels = libm::log10(texels);

        let presets: &[PresetNode; 6] = if texels < 25.0 {
            &PRESETS_HIGH_BANDWIDTH
        } else if texels < 64.0 {
            &PRESETS_MID_BANDWIDTH
        } else {
            &PRESETS_LOW_BANDWIDTH
        };

        let mut end = 0usize;
        while end < presets.len() && presets[end].quality < quality {
            end += 1;
        }
        let (start, end) = if end >= presets.len() {
            (presets.len() - 1, presets.len() - 1)
        } else if end > 0 {
            (end - 1, end)
        } else {
            (0, 0)
        };

        let a = &presets[start];
        let b = &presets[end];
        let (wt_a, wt_b) = if start == end {
            (1.0f32, 0.0f32)
        } else {
            let range = b.quality - a.quality;
            ((b.quality - quality) / range, (quality - a.quality) / range)
        };

        let lerp = |av: f32, bv: f32| av * wt_a + bv * wt_b;
        let lerpi = |av: u32, bv: u32| (av as f32 * wt_a + bv as f32 * wt_b + 0.5) as u32;

        let db_limit = f64::max(
            f64::from(lerp(a.db_limit_a_base, b.db_limit_a_base)) - 35.0 * ltexels,
            f64::from(lerp(a.db_limit_b_base, b.db_limit_b_base)) - 19.0 * ltexels,
        ) as f32;

        let mut cfg = Config {
            profile,
            flags,
            block_x,
            block_y,
            block_z,
            cw_r_weight: 1.0,
            cw_g_weight: 1.0,
            cw_b_weight: 1.0,
            cw_a_weight: 1.0,
            a_scale_radius: 0,
            rgbm_m_scale: 0.0,
            tune_partition_count_limit: lerpi(a.partition_count_limit, b.partition_count_limit),
            tune_2_partition_index_limit: lerpi(
                a.partition_index_limit_2,
                b.partition_index_limit_2,
            ),
            tune_3_partition_index_limit: lerpi(
                a.partition_index_limit_3,
                b.partition_index_limit_3,
            ),
            tune_4_partition_index_limit: lerpi(
                a.partition_index_limit_4,
                b.partition_index_limit_4,
            ),
            tune_block_mode_limit: lerpi(a.block_mode_limit, b.block_mode_limit),
            tune_refinement_limit: lerpi(a.refinement_limit, b.refinement_limit),
            tune_candidate_limit: lerpi(a.candidate_limit, b.candidate_limit),
            tune_2_partitioning_candidate_limit: lerpi(
                a.partitioning_candidate_limit_2,
                b.partitioning_candidate_limit_2,
            ),
            tune_3_partitioning_candidate_limit: lerpi(
                a.partitioning_candidate_limit_3,
                b.partitioning_candidate_limit_3,
            ),
            tune_4_partitioning_candidate_limit: lerpi(
                a.partitioning_candidate_limit_4,
                b.partitioning_candidate_limit_4,
            ),
            tune_db_limit: db_limit,
            tune_mse_overshoot: lerp(a.mse_overshoot, b.mse_overshoot),
            tune_2_partition_early_out_limit_factor: lerp(
                a.partition_early_out_factor_2,
                b.partition_early_out_factor_2,
            ),
            tune_3_partition_early_out_limit_factor: lerp(
                a.partition_early_out_factor_3,
                b.partition_early_out_factor_3,
            ),
            tune_2_plane_early_out_limit_correlation: lerp(
                a.plane_early_out_correlation,
                b.plane_early_out_correlation,
            ),
        };

        // HDR error is measured in code space, so the dB early exit does
        // not apply.
        if profile.is_hdr() {
            cfg.tune_db_limit = 999.0;
        }

        if flags.contains(Flags::MAP_NORMAL) {
            // Luminance+alpha blocks leave room for one more partition.
            if cfg.tune_partition_count_limit < 4 {
                cfg.tune_partition_count_limit += 1;
            }
            cfg.cw_g_weight = 0.0;
            cfg.cw_b_weight = 0.0;
            cfg.tune_2_partition_early_out_limit_factor *= 1.5;
            cfg.tune_3_partition_early_out_limit_factor *= 1.5;
            cfg.tune_2_plane_early_out_limit_correlation = 0.99;
            // Normals show blocking artifacts on smooth curves, so try harder.
            cfg.tune_db_limit *= 1.03;
        } else if flags.contains(Flags::MAP_RGBM) {
            cfg.rgbm_m_scale = 5.0;
            cfg.cw_a_weight = 2.0 * cfg.rgbm_m_scale;
        } else if flags.contains(Flags::USE_PERCEPTUAL) {
            cfg.cw_r_weight = 0.30 * 2.25;
            cfg.cw_g_weight = 0.59 * 2.25;
            cfg.cw_b_weight = 0.11 * 2.25;
        }

        Ok(cfg)
    }

    /// Validates the configuration and clamps the tuning fields into their
    /// legal ranges.
    pub(crate) fn validate_and_clamp(&mut self) -> Result<(), AstcError> {
        validate_flags(self.profile, self.flags)?;
        if !is_valid_block_size(self.block_x, self.block_y, self.block_z) {
            return Err(AstcError::BadBlockSize {
                x: self.block_x,
                y: self.block_y,
                z: self.block_z,
            });
        }

        if self.rgbm_m_scale < 1.0 {
            self.rgbm_m_scale = 1.0;
        }

        self.tune_partition_count_limit = self.tune_partition_count_limit.clamp(1, 4);
        self.tune_2_partition_index_limit = self.tune_2_partition_index_limit.clamp(1, 1024);
        self.tune_3_partition_index_limit = self.tune_3_partition_index_limit.clamp(1, 1024);
        self.tune_4_partition_index_limit = self.tune_4_partition_index_limit.clamp(1, 1024);
        self.tune_block_mode_limit = self.tune_block_mode_limit.clamp(1, 100);
        self.tune_refinement_limit = self.tune_refinement_limit.max(1);
        self.tune_candidate_limit = self.tune_candidate_limit.clamp(1, 8);
        self.tune_2_partitioning_candidate_limit =
            self.tune_2_partitioning_candidate_limit.clamp(1, 8);
        self.tune_3_partitioning_candidate_limit =
            self.tune_3_partitioning_candidate_limit.clamp(1, 8);
        self.tune_4_partitioning_candidate_limit =
            self.tune_4_partitioning_candidate_limit.clamp(1, 8);

        self.tune_db_limit = self.tune_db_limit.max(0.0);
        self.tune_mse_overshoot = self.tune_mse_overshoot.max(1.0);
        self.tune_2_partition_early_out_limit_factor =
            self.tune_2_partition_early_out_limit_factor.max(0.0);
        self.tune_3_partition_early_out_limit_factor =
            self.tune_3_partition_early_out_limit_factor.max(0.0);
        self.tune_2_plane_early_out_limit_correlation =
            self.tune_2_plane_early_out_limit_correlation.max(0.0);

        let max_weight = self
            .cw_r_weight
            .max(self.cw_g_weight)
            .max(self.cw_b_weight)
            .max(self.cw_a_weight);
        if !(max_weight > 0.0) {
            return Err(AstcError::BadChannelWeights);
        }
        let min_weight = max_weight / 1000.0;
        self.cw_r_weight = self.cw_r_weight.max(min_weight);
        self.cw_g_weight = self.cw_g_weight.max(min_weight);
        self.cw_b_weight = self.cw_b_weight.max(min_weight);
        self.cw_a_weight = self.cw_a_weight.max(min_weight);

        Ok(())
    }

    /// Quality preset band implied by the block mode limit.
    pub(crate) fn encode_quality(&self) -> EncodeQuality {
        match self.tune_block_mode_limit {
            0..=43 => EncodeQuality::Fastest,
            44..=55 => EncodeQuality::Fast,
            56..=77 => EncodeQuality::Medium,
            78..=94 => EncodeQuality::Thorough,
            95..=98 => EncodeQuality::VeryThorough,
            _ => EncodeQuality::Exhaustive,
        }
    }

    pub(crate) fn encoder_tuning(&self) -> EncoderTuning {
        let mut t = EncoderTuning {
            mode_limit: self.tune_block_mode_limit as usize,
            max_partition_count: self.tune_partition_count_limit as usize,
            dual_plane_correlation_threshold: self.tune_2_plane_early_out_limit_correlation,
            ..Default::default()
        };
        t.partition_index_limit[2] = self.tune_2_partition_index_limit as usize;
        t.partition_index_limit[3] = self.tune_3_partition_index_limit as usize;
        t.partition_index_limit[4] = self.tune_4_partition_index_limit as usize;
        t.partition_candidate_limit[2] = self.tune_2_partitioning_candidate_limit as usize;
        t.partition_candidate_limit[3] = self.tune_3_partitioning_candidate_limit as usize;
        t.partition_candidate_limit[4] = self.tune_4_partitioning_candidate_limit as usize;
        t
    }

    pub(crate) fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            quality: self.encode_quality(),
            channel_weight: [
                self.cw_r_weight,
                self.cw_g_weight,
                self.cw_b_weight,
                self.cw_a_weight,
            ],
            normal_map: self.flags.contains(Flags::MAP_NORMAL),
            rgbm_map: self.flags.contains(Flags::MAP_RGBM),
            rgbm_scale: self.rgbm_m_scale,
            force_unorm8: self.flags.contains(Flags::USE_DECODE_UNORM8),
            tuning_override: Some(self.encoder_tuning()),
        }
    }
}

fn validate_flags(profile: Profile, flags: Flags) -> Result<(), AstcError> {
    if flags.bits() & !Flags::ALL.bits() != 0 {
        return Err(AstcError::BadFlags);
    }
    if flags.contains(Flags::MAP_NORMAL) && flags.contains(Flags::MAP_RGBM) {
        return Err(AstcError::BadFlags);
    }
    if flags.contains(Flags::USE_DECODE_UNORM8) && profile.is_hdr() {
        return Err(AstcError::BadDecodeMode);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn quality_out_of_range_is_rejected() {
        for q in [-0.1f32, 100.1, f32::NAN] {
            assert_eq!(
                Config::new(Profile::Ldr, 6, 6, 1, q, Flags::NONE),
                Err(AstcError::BadQuality)
            );
        }
    }

    #[test]
    fn illegal_footprints_are_rejected() {
        assert!(matches!(
            Config::new(Profile::Ldr, 7, 7, 1, QUALITY_MEDIUM, Flags::NONE),
            Err(AstcError::BadBlockSize { .. })
        ));
    }

    #[test]
    fn zero_block_z_means_2d() {
        let cfg = Config::new(Profile::Ldr, 8, 8, 0, QUALITY_MEDIUM, Flags::NONE).unwrap();
        assert_eq!(cfg.block_z, 1);
    }

    #[test]
    fn decode_unorm8_is_invalid_for_hdr() {
        assert_eq!(
            Config::new(Profile::Hdr, 4, 4, 1, QUALITY_FAST, Flags::USE_DECODE_UNORM8),
            Err(AstcError::BadDecodeMode)
        );
    }

    #[test]
    fn conflicting_map_flags_are_rejected() {
        assert_eq!(
            Config::new(
                Profile::Ldr,
                4,
                4,
                1,
                QUALITY_FAST,
                Flags::MAP_NORMAL | Flags::MAP_RGBM
            ),
            Err(AstcError::BadFlags)
        );
    }

    #[rstest]
    #[case(QUALITY_FASTEST)]
    #[case(QUALITY_FAST)]
    #[case(QUALITY_MEDIUM)]
    #[case(QUALITY_THOROUGH)]
    #[case(QUALITY_VERY_THOROUGH)]
    #[case(QUALITY_EXHAUSTIVE)]
    fn preset_nodes_map_exactly(#[case] q: f32) {
        let cfg = Config::new(Profile::Ldr, 6, 6, 1, q, Flags::NONE).unwrap();
        assert!(cfg.tune_block_mode_limit >= 1 && cfg.tune_block_mode_limit <= 100);
        assert!(cfg.tune_partition_count_limit >= 2);
    }

    #[test]
    fn tuning_grows_monotonically_with_quality() {
        let mut prev = 0u32;
        for q in [0.0f32, 10.0, 35.0, 60.0, 80.0, 98.0, 99.0, 100.0] {
            let cfg = Config::new(Profile::Ldr, 6, 6, 1, q, Flags::NONE).unwrap();
            assert!(cfg.tune_block_mode_limit >= prev, "regressed at {q}");
            prev = cfg.tune_block_mode_limit;
        }
    }

    #[test]
    fn interpolated_quality_lands_between_nodes() {
        let lo = Config::new(Profile::Ldr, 6, 6, 1, 10.0, Flags::NONE).unwrap();
        let hi = Config::new(Profile::Ldr, 6, 6, 1, 60.0, Flags::NONE).unwrap();
        let mid = Config::new(Profile::Ldr, 6, 6, 1, 35.0, Flags::NONE).unwrap();
        assert!(mid.tune_block_mode_limit > lo.tune_block_mode_limit);
        assert!(mid.tune_block_mode_limit < hi.tune_block_mode_limit);
    }

    #[test]
    fn hdr_profiles_disable_the_db_early_exit() {
        let cfg = Config::new(Profile::Hdr, 6, 6, 1, QUALITY_MEDIUM, Flags::NONE).unwrap();
        assert_eq!(cfg.tune_db_limit, 999.0);
    }

    #[test]
    fn normal_map_flag_adjusts_weights_and_limits() {
        let base = Config::new(Profile::Ldr, 6, 6, 1, QUALITY_FAST, Flags::NONE).unwrap();
        let nm = Config::new(Profile::Ldr, 6, 6, 1, QUALITY_FAST, Flags::MAP_NORMAL).unwrap();
        assert_eq!(nm.cw_g_weight, 0.0);
        assert_eq!(nm.cw_b_weight, 0.0);
        assert_eq!(
            nm.tune_partition_count_limit,
            base.tune_partition_count_limit + 1
        );
        assert_eq!(nm.tune_2_plane_early_out_limit_correlation, 0.99);
    }

    #[test]
    fn rgbm_flag_sets_scale_and_alpha_weight() {
        let cfg = Config::new(Profile::Ldr, 6, 6, 1, QUALITY_FAST, Flags::MAP_RGBM).unwrap();
        assert_eq!(cfg.rgbm_m_scale, 5.0);
        assert_eq!(cfg.cw_a_weight, 10.0);
    }

    #[test]
    fn clamping_bounds_every_tuning_field() {
        let mut cfg = Config::new(Profile::Ldr, 4, 4, 1, QUALITY_FAST, Flags::NONE).unwrap();
        cfg.tune_partition_count_limit = 99;
        cfg.tune_2_partition_index_limit = 100_000;
        cfg.tune_candidate_limit = 0;
        cfg.tune_mse_overshoot = 0.0;
        cfg.validate_and_clamp().unwrap();
        assert_eq!(cfg.tune_partition_count_limit, 4);
        assert_eq!(cfg.tune_2_partition_index_limit, 1024);
        assert_eq!(cfg.tune_candidate_limit, 1);
        assert_eq!(cfg.tune_mse_overshoot, 1.0);
    }

    #[test]
    fn zero_channel_weights_are_rejected() {
        let mut cfg = Config::new(Profile::Ldr, 4, 4, 1, QUALITY_FAST, Flags::NONE).unwrap();
        cfg.cw_r_weight = 0.0;
        cfg.cw_g_weight = 0.0;
        cfg.cw_b_weight = 0.0;
        cfg.cw_a_weight = 0.0;
        assert_eq!(cfg.validate_and_clamp(), Err(AstcError::BadChannelWeights));
    }
}
