//! Per-footprint lookup tables.
//!
//! A [`BlockSizeDescriptor`] precomputes everything the codecs need for one
//! block footprint: the 2048 decoded block modes, the infill tables of every
//! weight grid those modes reference, the procedural partition tables, and
//! the mode ordering the encoder searches in.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::block_mode::{decode_block_mode_2d, decode_block_mode_3d};
use crate::decimation::{decimation_table, DecimationEntry};
use crate::error::BlockError;
use crate::partition::PartitionTable;
use crate::quant::QuantMethod;
use crate::{is_valid_block_size, BLOCK_MAX_PARTITIONS};

/// Number of encodable block modes.
pub const BLOCK_MODE_COUNT: usize = 1 << 11;

/// One valid block mode of a footprint.
#[derive(Clone, Copy, Debug)]
pub struct BlockModeInfo {
    /// The 11-bit mode value.
    pub mode: u16,
    /// Weight grid width.
    pub x_weights: u8,
    /// Weight grid height.
    pub y_weights: u8,
    /// Weight grid depth.
    pub z_weights: u8,
    /// Two weight planes are stored.
    pub dual_plane: bool,
    /// Weight quantization mode.
    pub weight_quant: QuantMethod,
    /// Exact bit length of the weight stream.
    pub weight_bits: u8,
    /// Number of weights per plane.
    pub weight_count: u8,
    /// Total ISE symbol count, doubled for dual-plane modes.
    pub real_weight_count: u8,
    /// The weight grid matches the footprint, so no infill is needed.
    pub no_decimation: bool,
    grid: u16,
}

/// Infill table and encoder sample map for one weight grid shape.
#[derive(Debug)]
pub struct WeightGrid {
    /// Per-texel infill taps, in z, y, x raster order.
    pub infill: Vec<DecimationEntry>,
    /// Representative texel index for each weight grid point.
    pub sample_texels: Vec<u16>,
}

/// Precomputed tables for one block footprint.
#[derive(Debug)]
pub struct BlockSizeDescriptor {
    block_x: u8,
    block_y: u8,
    block_z: u8,
    texel_count: u16,
    modes: Vec<Option<BlockModeInfo>>,
    grids: Vec<WeightGrid>,
    partition_tables: [Option<PartitionTable>; BLOCK_MAX_PARTITIONS + 1],
    encode_order: Vec<u16>,
}

impl BlockSizeDescriptor {
    /// Builds the descriptor for a footprint.
    pub fn new(block_x: u32, block_y: u32, block_z: u32) -> Result<Self, BlockError> {
        if !is_valid_block_size(block_x, block_y, block_z) {
            return Err(BlockError::InvalidBlockSize {
                x: block_x,
                y: block_y,
                z: block_z,
            });
        }

        let (bx, by, bz) = (block_x as usize, block_y as usize, block_z as usize);
        let mut modes: Vec<Option<BlockModeInfo>> = Vec::with_capacity(BLOCK_MODE_COUNT);
        let mut grids: Vec<WeightGrid> = Vec::new();
        let mut grid_index: BTreeMap<u32, u16> = BTreeMap::new();

        for mode in 0..BLOCK_MODE_COUNT as u32 {
            let decoded = if block_z == 1 {
                decode_block_mode_2d(mode)
            } else {
                decode_block_mode_3d(mode)
            };
            let Some(m) = decoded else {
                modes.push(None);
                continue;
            };
            let (wx, wy, wz) = (
                m.x_weights as usize,
                m.y_weights as usize,
                m.z_weights as usize,
            );
            if wx > bx || wy > by || wz > bz {
                modes.push(None);
                continue;
            }

            let key = (wx as u32) | ((wy as u32) << 8) | ((wz as u32) << 16);
            let grid = *grid_index.entry(key).or_insert_with(|| {
                grids.push(WeightGrid {
                    infill: decimation_table(bx, by, bz, wx, wy, wz),
                    sample_texels: weight_grid_sample_map(bx, by, bz, wx, wy, wz),
                });
                (grids.len() - 1) as u16
            });

            let weight_count = wx * wy * wz;
            let real_weight_count = if m.dual_plane {
                weight_count * 2
            } else {
                weight_count
            };

            modes.push(Some(BlockModeInfo {
                mode: mode as u16,
                x_weights: m.x_weights,
                y_weights: m.y_weights,
                z_weights: m.z_weights,
                dual_plane: m.dual_plane,
                weight_quant: m.quant_mode,
                weight_bits: m.weight_bits,
                weight_count: weight_count as u8,
                real_weight_count: real_weight_count as u8,
                no_decimation: wx == bx && wy == by && wz == bz,
                grid,
            }));
        }

        let mut partition_tables: [Option<PartitionTable>; BLOCK_MAX_PARTITIONS + 1] =
            Default::default();
        for (pc, slot) in partition_tables.iter_mut().enumerate().skip(2) {
            *slot = PartitionTable::new(block_x, block_y, block_z, pc as u32);
        }

        let mut encode_order: Vec<u16> = modes
            .iter()
            .flatten()
            .map(|m| m.mode)
            .collect();
        encode_order.sort_by(|&a, &b| {
            let ma = modes[a as usize].as_ref().unwrap();
            let mb = modes[b as usize].as_ref().unwrap();
            let area_a = ma.x_weights as u32 * ma.y_weights as u32 * ma.z_weights as u32;
            let area_b = mb.x_weights as u32 * mb.y_weights as u32 * mb.z_weights as u32;
            area_b
                .cmp(&area_a)
                .then(mb.weight_quant.cmp(&ma.weight_quant))
                .then(ma.weight_bits.cmp(&mb.weight_bits))
                .then(a.cmp(&b))
        });

        Ok(BlockSizeDescriptor {
            block_x: block_x as u8,
            block_y: block_y as u8,
            block_z: block_z as u8,
            texel_count: (bx * by * bz) as u16,
            modes,
            grids,
            partition_tables,
            encode_order,
        })
    }

    /// Footprint width.
    #[inline]
    pub fn block_x(&self) -> usize {
        self.block_x as usize
    }

    /// Footprint height.
    #[inline]
    pub fn block_y(&self) -> usize {
        self.block_y as usize
    }

    /// Footprint depth, 1 for 2D footprints.
    #[inline]
    pub fn block_z(&self) -> usize {
        self.block_z as usize
    }

    /// Number of texels in the footprint.
    #[inline]
    pub fn texel_count(&self) -> usize {
        self.texel_count as usize
    }

    /// True for volumetric footprints.
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.block_z > 1
    }

    /// Looks up a decoded block mode, or `None` for modes this footprint
    /// cannot use.
    #[inline]
    pub fn block_mode(&self, mode: u16) -> Option<&BlockModeInfo> {
        self.modes.get(mode as usize)?.as_ref()
    }

    /// The weight grid tables a mode references.
    #[inline]
    pub fn weight_grid(&self, info: &BlockModeInfo) -> &WeightGrid {
        &self.grids[info.grid as usize]
    }

    /// Partition table for a partition count, `None` for a single partition.
    #[inline]
    pub fn partition_table(&self, partition_count: usize) -> Option<&PartitionTable> {
        self.partition_tables.get(partition_count)?.as_ref()
    }

    /// All valid modes ordered best-first for the encoder search: larger
    /// weight grids, then finer quantization, then fewer weight bits.
    #[inline]
    pub fn encode_mode_order(&self) -> &[u16] {
        &self.encode_order
    }
}

fn weight_grid_sample_map(
    block_x: usize,
    block_y: usize,
    block_z: usize,
    x_weights: usize,
    y_weights: usize,
    z_weights: usize,
) -> Vec<u16> {
    let weights_per_plane = x_weights * y_weights * z_weights;
    let mut out = Vec::with_capacity(weights_per_plane);

    let axis = |w: usize, weights: usize, block: usize| -> usize {
        let den = weights - 1;
        if den == 0 {
            0
        } else {
            (w * (block - 1) + den / 2) / den
        }
    };

    let xy = block_x * block_y;
    for wz in 0..z_weights {
        let z = axis(wz, z_weights, block_z);
        for wy in 0..y_weights {
            let y = axis(wy, y_weights, block_y);
            for wx in 0..x_weights {
                let x = axis(wx, x_weights, block_x);
                out.push((z * xy + y * block_x + x) as u16);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn rejects_illegal_footprints() {
        assert!(matches!(
            BlockSizeDescriptor::new(7, 7, 1),
            Err(BlockError::InvalidBlockSize { x: 7, y: 7, z: 1 })
        ));
    }

    #[rstest]
    #[case(4, 4, 1)]
    #[case(6, 6, 1)]
    #[case(8, 8, 1)]
    #[case(12, 12, 1)]
    #[case(3, 3, 3)]
    #[case(6, 6, 6)]
    fn modes_fit_the_footprint(#[case] x: u32, #[case] y: u32, #[case] z: u32) {
        let bsd = BlockSizeDescriptor::new(x, y, z).unwrap();
        assert_eq!(bsd.texel_count(), (x * y * z) as usize);

        let mut valid = 0;
        for mode in 0..BLOCK_MODE_COUNT as u16 {
            let Some(m) = bsd.block_mode(mode) else {
                continue;
            };
            valid += 1;
            assert!(m.x_weights as u32 <= x);
            assert!(m.y_weights as u32 <= y);
            assert!(m.z_weights as u32 <= z);
            assert_eq!(
                m.weight_count as usize,
                m.x_weights as usize * m.y_weights as usize * m.z_weights as usize
            );

            let grid = bsd.weight_grid(m);
            assert_eq!(grid.infill.len(), bsd.texel_count());
            assert_eq!(grid.sample_texels.len(), m.weight_count as usize);
            for &t in &grid.sample_texels {
                assert!((t as usize) < bsd.texel_count());
            }
        }
        assert!(valid > 0);
        assert_eq!(bsd.encode_mode_order().len(), valid);
    }

    #[test]
    fn partition_tables_exist_for_multi_partition_counts() {
        let bsd = BlockSizeDescriptor::new(6, 6, 1).unwrap();
        assert!(bsd.partition_table(1).is_none());
        for pc in 2..=BLOCK_MAX_PARTITIONS {
            assert!(bsd.partition_table(pc).is_some());
        }
    }

    #[test]
    fn encode_order_prefers_larger_grids() {
        let bsd = BlockSizeDescriptor::new(6, 6, 1).unwrap();
        let order = bsd.encode_mode_order();
        let area = |mode: u16| {
            let m = bsd.block_mode(mode).unwrap();
            m.x_weights as u32 * m.y_weights as u32 * m.z_weights as u32
        };
        for pair in order.windows(2) {
            assert!(area(pair[0]) >= area(pair[1]));
        }
        assert_eq!(area(order[0]), 36);
    }
}
