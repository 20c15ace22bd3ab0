//! Procedural partition assignment.
//!
//! ASTC does not store partition shapes; each of the 1024 partition indices
//! seeds a fixed hash that assigns every texel coordinate to a partition.

use alloc::vec::Vec;

use crate::PARTITION_INDEX_BITS;

/// Texel count below which coordinates are scaled up before hashing.
const SMALL_BLOCK_TEXELS: usize = 32;

fn hash52(mut inp: u32) -> u32 {
    inp ^= inp >> 15;
    inp = inp.wrapping_mul(0xEEDE_0891);
    inp ^= inp >> 5;
    inp = inp.wrapping_add(inp << 16);
    inp ^= inp >> 7;
    inp ^= inp >> 3;
    inp ^= inp << 6;
    inp ^= inp >> 17;
    inp
}

/// Computes the partition of one texel for a given seed.
pub fn select_partition(
    seed: u32,
    x: u32,
    y: u32,
    z: u32,
    partition_count: u32,
    small_block: bool,
) -> u8 {
    let (x, y, z) = if small_block {
        (x << 1, y << 1, z << 1)
    } else {
        (x, y, z)
    };

    let seed = seed + (partition_count - 1) * 1024;
    let rnum = hash52(seed);

    let mut s = [
        rnum & 0xF,
        (rnum >> 4) & 0xF,
        (rnum >> 8) & 0xF,
        (rnum >> 12) & 0xF,
        (rnum >> 16) & 0xF,
        (rnum >> 20) & 0xF,
        (rnum >> 24) & 0xF,
        (rnum >> 28) & 0xF,
        (rnum >> 18) & 0xF,
        (rnum >> 22) & 0xF,
        (rnum >> 26) & 0xF,
        ((rnum >> 30) | (rnum << 2)) & 0xF,
    ];
    for v in s.iter_mut() {
        *v *= *v;
    }

    let (sh1, sh2) = if seed & 1 != 0 {
        (
            if seed & 2 != 0 { 4 } else { 5 },
            if partition_count == 3 { 6 } else { 5 },
        )
    } else {
        (
            if partition_count == 3 { 6 } else { 5 },
            if seed & 2 != 0 { 4 } else { 5 },
        )
    };
    let sh3 = if seed & 0x10 != 0 { sh1 } else { sh2 };

    for (i, v) in s.iter_mut().enumerate() {
        let sh = match i {
            0 | 2 | 4 | 6 => sh1,
            1 | 3 | 5 | 7 => sh2,
            _ => sh3,
        };
        *v >>= sh;
    }

    let mut a = s[0] * x + s[1] * y + s[10] * z + (rnum >> 14);
    let mut b = s[2] * x + s[3] * y + s[11] * z + (rnum >> 10);
    let mut c = s[4] * x + s[5] * y + s[8] * z + (rnum >> 6);
    let mut d = s[6] * x + s[7] * y + s[9] * z + (rnum >> 2);

    a &= 0x3F;
    b &= 0x3F;
    c &= 0x3F;
    d &= 0x3F;

    if partition_count <= 3 {
        d = 0;
    }
    if partition_count <= 2 {
        c = 0;
    }
    if partition_count <= 1 {
        b = 0;
    }

    if a >= b && a >= c && a >= d {
        0
    } else if b >= c && b >= d {
        1
    } else if c >= d {
        2
    } else {
        3
    }
}

/// Partition assignments of every texel for all 1024 partition indices of one
/// footprint and partition count.
#[derive(Debug)]
pub struct PartitionTable {
    texel_count: usize,
    // Indexed as [partition_index][texel], texels in z, y, x raster order.
    data: Vec<u8>,
}

impl PartitionTable {
    /// Builds the table for a footprint. Returns `None` for a single
    /// partition, which has no table.
    pub fn new(block_x: u32, block_y: u32, block_z: u32, partition_count: u32) -> Option<Self> {
        if partition_count <= 1 {
            return None;
        }

        let texel_count = (block_x * block_y * block_z) as usize;
        let small_block = texel_count < SMALL_BLOCK_TEXELS;
        let mut data = Vec::with_capacity((1 << PARTITION_INDEX_BITS) * texel_count);

        for pidx in 0..(1u32 << PARTITION_INDEX_BITS) {
            for z in 0..block_z {
                for y in 0..block_y {
                    for x in 0..block_x {
                        data.push(select_partition(pidx, x, y, z, partition_count, small_block));
                    }
                }
            }
        }

        Some(PartitionTable { texel_count, data })
    }

    /// Number of texels in the block footprint.
    #[inline]
    pub fn texel_count(&self) -> usize {
        self.texel_count
    }

    /// Per-texel partition assignments for one partition index.
    #[inline]
    pub fn partitions_for_index(&self, partition_index: usize) -> &[u8] {
        let idx = partition_index & ((1 << PARTITION_INDEX_BITS) - 1);
        let base = idx * self.texel_count;
        &self.data[base..base + self.texel_count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn assignments_stay_in_range(#[case] pc: u32) {
        let table = PartitionTable::new(6, 6, 1, pc).unwrap();
        for pidx in 0..1024 {
            for &p in table.partitions_for_index(pidx) {
                assert!((p as u32) < pc);
            }
        }
    }

    #[test]
    fn single_partition_has_no_table() {
        assert!(PartitionTable::new(4, 4, 1, 1).is_none());
    }

    #[test]
    fn partition_index_wraps_at_ten_bits() {
        let table = PartitionTable::new(4, 4, 1, 2).unwrap();
        assert_eq!(
            table.partitions_for_index(3),
            table.partitions_for_index(1024 + 3)
        );
    }

    #[test]
    fn some_seed_uses_every_partition() {
        let table = PartitionTable::new(8, 8, 1, 4).unwrap();
        let mut found = false;
        for pidx in 0..1024 {
            let mut seen = [false; 4];
            for &p in table.partitions_for_index(pidx) {
                seen[p as usize] = true;
            }
            if seen.iter().all(|&s| s) {
                found = true;
                break;
            }
        }
        assert!(found);
    }

    #[test]
    fn small_blocks_scale_coordinates() {
        // A 4x4 footprint hashes doubled coordinates, so at least one seed
        // must assign differently than the unscaled variant.
        let differs = (0..1024u32).any(|pidx| {
            (0..4).any(|y| {
                (0..4).any(|x| {
                    select_partition(pidx, x, y, 0, 2, true)
                        != select_partition(pidx, x, y, 0, 2, false)
                })
            })
        });
        assert!(differs);
    }
}
