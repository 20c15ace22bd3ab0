//! Search-effort presets.

use super::EncodeQuality;
use crate::BLOCK_MAX_PARTITIONS;

/// Limits that bound the encoder search space.
///
/// Index 0 and 1 of the per-partition arrays are unused; entries 2..=4 apply
/// to the matching partition count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncoderTuning {
    /// Number of block modes tried, best-quality first. Zero means all.
    pub mode_limit: usize,
    /// Highest partition count searched.
    pub max_partition_count: usize,
    /// Partition seeds scanned when ranking candidates.
    pub partition_index_limit: [usize; BLOCK_MAX_PARTITIONS + 1],
    /// Ranked seeds actually evaluated per partition count.
    pub partition_candidate_limit: [usize; BLOCK_MAX_PARTITIONS + 1],
    /// Alpha/luma correlation above which dual-plane modes are skipped.
    /// Zero disables the early-out.
    pub dual_plane_correlation_threshold: f32,
}

/// Preset limits for a quality level.
///
/// Higher presets scale some limits with the block footprint, mirroring how
/// search cost per texel falls as blocks grow.
pub fn tuning_for(quality: EncodeQuality, texel_count: usize) -> EncoderTuning {
    match quality {
        EncodeQuality::Fastest => EncoderTuning {
            mode_limit: 1,
            max_partition_count: 1,
            ..Default::default()
        },
        EncodeQuality::Fast => EncoderTuning {
            mode_limit: 8,
            max_partition_count: 1,
            ..Default::default()
        },
        EncodeQuality::Medium => {
            let mut t = EncoderTuning {
                mode_limit: 24,
                max_partition_count: 2,
                ..Default::default()
            };
            t.partition_index_limit[2] = 64;
            t.partition_candidate_limit[2] = 2;
            t
        }
        EncodeQuality::Thorough => {
            let mut t = EncoderTuning {
                mode_limit: 64,
                max_partition_count: 4,
                ..Default::default()
            };
            t.partition_index_limit[2] = 82;
            t.partition_candidate_limit[2] = 3;
            t.partition_index_limit[3] = 60;
            t.partition_candidate_limit[3] = 2;
            t.partition_index_limit[4] = 30;
            t.partition_candidate_limit[4] = 2;
            t.dual_plane_correlation_threshold = if (25..64).contains(&texel_count) {
                0.95
            } else {
                0.97
            };
            t
        }
        EncodeQuality::VeryThorough => {
            let mut t = EncoderTuning {
                mode_limit: 98,
                max_partition_count: 4,
                ..Default::default()
            };
            t.partition_index_limit[2] = 256;
            t.partition_candidate_limit[2] = 8;
            t.partition_index_limit[3] = 128;
            t.partition_index_limit[4] = 64;
            if texel_count >= 64 {
                t.partition_candidate_limit[3] = 5;
                t.partition_candidate_limit[4] = 2;
            } else if texel_count >= 25 {
                t.partition_candidate_limit[3] = 6;
                t.partition_candidate_limit[4] = 3;
            } else {
                t.partition_candidate_limit[3] = 6;
                t.partition_candidate_limit[4] = 4;
            }
            t.dual_plane_correlation_threshold = 0.98;
            t
        }
        EncodeQuality::Exhaustive => {
            let mut t = EncoderTuning {
                mode_limit: 100,
                max_partition_count: 4,
                ..Default::default()
            };
            let index_limit = if texel_count < 25 { 512 } else { 256 };
            t.partition_index_limit[2] = index_limit;
            t.partition_index_limit[3] = index_limit;
            t.partition_index_limit[4] = index_limit;
            t.partition_candidate_limit[2] = 8;
            t.partition_candidate_limit[3] = 8;
            t.partition_candidate_limit[4] = 8;
            t.dual_plane_correlation_threshold = 0.99;
            t
        }
    }
}

/// Widens a preset for normal-map inputs. Luminance+alpha endpoints leave
/// more bits for weights, so deeper partitioning pays off.
pub(crate) fn widen_for_normal_maps(t: &mut EncoderTuning, quality: EncodeQuality) {
    if quality >= EncodeQuality::Medium {
        t.mode_limit = t.mode_limit.max(94);
        t.max_partition_count = t.max_partition_count.max(4);
        t.partition_index_limit[2] = t.partition_index_limit[2].max(82);
        t.partition_index_limit[3] = t.partition_index_limit[3].max(60);
        t.partition_index_limit[4] = t.partition_index_limit[4].max(30);
        t.partition_candidate_limit[2] = t.partition_candidate_limit[2].max(3);
        t.partition_candidate_limit[3] = t.partition_candidate_limit[3].max(2);
        t.partition_candidate_limit[4] = t.partition_candidate_limit[4].max(2);
    } else if t.max_partition_count < 4 {
        t.max_partition_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_grow_with_quality() {
        let mut prev = 0;
        for q in [
            EncodeQuality::Fastest,
            EncodeQuality::Fast,
            EncodeQuality::Medium,
            EncodeQuality::Thorough,
            EncodeQuality::VeryThorough,
            EncodeQuality::Exhaustive,
        ] {
            let t = tuning_for(q, 36);
            assert!(t.mode_limit >= prev);
            prev = t.mode_limit;
        }
    }

    #[test]
    fn fast_presets_stay_single_partition() {
        assert_eq!(tuning_for(EncodeQuality::Fastest, 16).max_partition_count, 1);
        assert_eq!(tuning_for(EncodeQuality::Fast, 16).max_partition_count, 1);
    }

    #[test]
    fn normal_map_widening_is_monotonic() {
        let mut t = tuning_for(EncodeQuality::Medium, 16);
        let before = t;
        widen_for_normal_maps(&mut t, EncodeQuality::Medium);
        assert!(t.mode_limit >= before.mode_limit);
        assert!(t.max_partition_count >= before.max_partition_count);
    }
}
