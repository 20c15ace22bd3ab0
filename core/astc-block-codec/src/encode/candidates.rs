//! Partition seed pre-selection.

use crate::partition::PartitionTable;
use crate::{BLOCK_MAX_PARTITIONS, PARTITION_INDEX_BITS};

/// Ranks partition seeds by total within-partition variance and writes the
/// best ones to `dst`, sorted ascending by seed for deterministic
/// evaluation order. Returns the number of entries written.
///
/// Seeds that leave a partition empty are skipped. Ties prefer the lower
/// seed.
pub(crate) fn select_partition_candidates(
    dst: &mut [usize],
    texels: &[u8],
    pt: &PartitionTable,
    partition_count: usize,
    search_limit: usize,
    include_alpha: bool,
) -> usize {
    if texels.len() < pt.texel_count() * 4 {
        return 0;
    }
    select_candidates_impl(
        dst,
        |t, c| u64::from(texels[t * 4 + c]),
        pt,
        partition_count,
        search_limit,
        include_alpha,
    )
}

/// Variant over 16-bit code-space texels, used by the HDR encoder.
pub(crate) fn select_partition_candidates_u16(
    dst: &mut [usize],
    codes: &[[u16; 4]],
    pt: &PartitionTable,
    partition_count: usize,
    search_limit: usize,
    include_alpha: bool,
) -> usize {
    if codes.len() < pt.texel_count() {
        return 0;
    }
    select_candidates_impl(
        dst,
        |t, c| u64::from(codes[t][c]),
        pt,
        partition_count,
        search_limit,
        include_alpha,
    )
}

fn select_candidates_impl(
    dst: &mut [usize],
    channel: impl Fn(usize, usize) -> u64,
    pt: &PartitionTable,
    partition_count: usize,
    search_limit: usize,
    include_alpha: bool,
) -> usize {
    if dst.is_empty()
        || search_limit == 0
        || !(2..=BLOCK_MAX_PARTITIONS).contains(&partition_count)
    {
        return 0;
    }
    let texel_count = pt.texel_count();
    if texel_count == 0 {
        return 0;
    }

    let limit = search_limit.min(1 << PARTITION_INDEX_BITS);
    let mut scores = [0u64; 128];
    let dst_len = dst.len().min(scores.len());
    let dst = &mut dst[..dst_len];

    let mut best_count = 0usize;
    'seed: for pidx in 0..limit {
        let assign = pt.partitions_for_index(pidx);

        // Accumulate sum and sum-of-squares per partition and channel.
        let mut count = [0u64; BLOCK_MAX_PARTITIONS];
        let mut sum = [[0u64; 4]; BLOCK_MAX_PARTITIONS];
        let mut sq = [[0u64; 4]; BLOCK_MAX_PARTITIONS];
        for (t, &part) in assign.iter().enumerate().take(texel_count) {
            let part = part as usize;
            count[part] += 1;
            for c in 0..4 {
                let v = channel(t, c);
                sum[part][c] += v;
                sq[part][c] += v * v;
            }
        }

        let channels = if include_alpha { 4 } else { 3 };
        let mut score = 0u64;
        for p in 0..partition_count {
            if count[p] == 0 {
                continue 'seed;
            }
            for c in 0..channels {
                score += sq[p][c] - (sum[p][c] * sum[p][c]) / count[p];
            }
        }

        if best_count < dst.len() {
            dst[best_count] = pidx;
            scores[best_count] = score;
            best_count += 1;
            continue;
        }

        // Replace the current worst candidate if this seed is better.
        let mut worst = 0;
        for i in 1..best_count {
            if scores[i] > scores[worst] || (scores[i] == scores[worst] && dst[i] > dst[worst]) {
                worst = i;
            }
        }
        if score < scores[worst] || (score == scores[worst] && pidx < dst[worst]) {
            dst[worst] = pidx;
            scores[worst] = score;
        }
    }

    dst[..best_count].sort_unstable();
    best_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[test]
    fn returns_sorted_unique_seeds() {
        let pt = crate::partition::PartitionTable::new(6, 6, 1, 2).unwrap();
        let texels = noise_rgba8(36, 3);
        let mut dst = [0usize; 4];
        let n = select_partition_candidates(&mut dst, &texels, &pt, 2, 200, true);
        assert!(n > 0);
        for w in dst[..n].windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn finds_the_obvious_split() {
        // Left half black, right half white. The best seeds must score zero
        // residual variance somewhere in the search range.
        let pt = crate::partition::PartitionTable::new(8, 8, 1, 2).unwrap();
        let mut texels = Vec::new();
        for _y in 0..8 {
            for x in 0..8 {
                let v = if x < 4 { 0u8 } else { 255 };
                texels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let mut dst = [0usize; 8];
        let n = select_partition_candidates(&mut dst, &texels, &pt, 2, 1024, false);
        assert!(n > 0);

        // The returned set must contain a seed matching the global best
        // within-partition SSE over the whole search range.
        let score = |pidx: usize| -> Option<u64> {
            let assign = pt.partitions_for_index(pidx);
            let mut count = [0u64; 2];
            let mut sum = [0u64; 2];
            let mut sq = [0u64; 2];
            for (texel, &part) in texels.chunks_exact(4).zip(assign) {
                let v = u64::from(texel[0]);
                count[part as usize] += 1;
                sum[part as usize] += v;
                sq[part as usize] += v * v;
            }
            if count[0] == 0 || count[1] == 0 {
                return None;
            }
            // Grey channels are identical, so score one channel times three.
            Some((0..2).map(|p| sq[p] - (sum[p] * sum[p]) / count[p]).sum::<u64>() * 3)
        };
        let overall_best = (0..1024).filter_map(score).min().unwrap();
        let best_returned = dst[..n].iter().filter_map(|&p| score(p)).min().unwrap();
        assert_eq!(best_returned, overall_best);
    }

    #[test]
    fn zero_limits_produce_no_candidates() {
        let pt = crate::partition::PartitionTable::new(4, 4, 1, 3).unwrap();
        let texels = noise_rgba8(16, 5);
        let mut dst = [0usize; 4];
        assert_eq!(select_partition_candidates(&mut dst, &texels, &pt, 3, 0, true), 0);
        assert_eq!(select_partition_candidates(&mut [], &texels, &pt, 3, 10, true), 0);
    }
}
