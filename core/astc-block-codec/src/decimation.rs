//! Weight grid infill tables.
//!
//! When the stored weight grid is smaller than the block footprint, each
//! texel samples up to four grid weights with 4-bit fractional lerp factors.
//! 2D footprints use bilinear taps, 3D footprints use the tetrahedral
//! interpolation mandated by the format.

use alloc::vec;
use alloc::vec::Vec;

/// Up to four weight grid taps for one texel. Unused taps have zero weight
/// and index zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecimationEntry {
    /// Weight grid indices of the taps.
    pub idx: [u8; 4],
    /// Lerp factors of the taps, summing to 16 over the used taps.
    pub w: [u8; 4],
}

/// Builds the per-texel infill table for one footprint and weight grid.
///
/// Texels are in z, y, x raster order. Degenerate shapes (any footprint axis
/// of length 1 in the interpolated dimensions) produce an all-zero table;
/// such grids never pass block mode validation.
pub fn decimation_table(
    block_x: usize,
    block_y: usize,
    block_z: usize,
    x_weights: usize,
    y_weights: usize,
    z_weights: usize,
) -> Vec<DecimationEntry> {
    let texel_count = block_x * block_y * block_z;
    let weights_per_plane = x_weights * y_weights * z_weights;

    let mut table = vec![DecimationEntry::default(); texel_count];
    if texel_count == 0 || weights_per_plane == 0 {
        return table;
    }

    if block_z == 1 {
        if block_x <= 1 || block_y <= 1 {
            return table;
        }
        let x_scale = (1024 + block_x / 2) / (block_x - 1);
        let y_scale = (1024 + block_y / 2) / (block_y - 1);

        for y in 0..block_y {
            for x in 0..block_x {
                let x_weight = (x_scale * x * (x_weights - 1) + 32) >> 6;
                let y_weight = (y_scale * y * (y_weights - 1) + 32) >> 6;

                let x_frac = (x_weight & 0xF) as i32;
                let y_frac = (y_weight & 0xF) as i32;
                let x_int = x_weight >> 4;
                let y_int = y_weight >> 4;

                let q0 = (x_int + y_int * x_weights) as i32;
                let q1 = q0 + 1;
                let q2 = q0 + x_weights as i32;
                let q3 = q2 + 1;

                let w3 = (x_frac * y_frac + 8) >> 4;
                let w1 = x_frac - w3;
                let w2 = y_frac - w3;
                let w0 = 16 - x_frac - y_frac + w3;

                table[y * block_x + x] =
                    make_entry([q0, q1, q2, q3], [w0, w1, w2, w3], weights_per_plane);
            }
        }
    } else {
        if block_x <= 1 || block_y <= 1 || block_z <= 1 {
            return table;
        }
        let x_scale = (1024 + block_x / 2) / (block_x - 1);
        let y_scale = (1024 + block_y / 2) / (block_y - 1);
        let z_scale = (1024 + block_z / 2) / (block_z - 1);

        let n = x_weights as i32;
        let nm = (x_weights * y_weights) as i32;

        let mut tix = 0;
        for z in 0..block_z {
            for y in 0..block_y {
                for x in 0..block_x {
                    let x_weight = (x_scale * x * (x_weights - 1) + 32) >> 6;
                    let y_weight = (y_scale * y * (y_weights - 1) + 32) >> 6;
                    let z_weight = (z_scale * z * (z_weights - 1) + 32) >> 6;

                    let fs = (x_weight & 0xF) as i32;
                    let ft = (y_weight & 0xF) as i32;
                    let fp = (z_weight & 0xF) as i32;
                    let x_int = x_weight >> 4;
                    let y_int = y_weight >> 4;
                    let z_int = z_weight >> 4;

                    let q0 = ((z_int * y_weights + y_int) * x_weights + x_int) as i32;
                    let q3 =
                        (((z_int + 1) * y_weights + (y_int + 1)) * x_weights + x_int + 1) as i32;

                    let mut case = 0;
                    if fs > ft {
                        case |= 4;
                    }
                    if ft > fp {
                        case |= 2;
                    }
                    if fs > fp {
                        case |= 1;
                    }

                    let (s1, s2, w) = match case {
                        7 => (1, n, [16 - fs, fs - ft, ft - fp, fp]),
                        3 => (n, 1, [16 - ft, ft - fs, fs - fp, fp]),
                        5 => (1, nm, [16 - fs, fs - fp, fp - ft, ft]),
                        4 => (nm, 1, [16 - fp, fp - fs, fs - ft, ft]),
                        2 => (n, nm, [16 - ft, ft - fp, fp - fs, fs]),
                        _ => (nm, n, [16 - fp, fp - ft, ft - fs, fs]),
                    };

                    let q1 = q0 + s1;
                    let q2 = q1 + s2;

                    table[tix] = make_entry([q0, q1, q2, q3], w, weights_per_plane);
                    tix += 1;
                }
            }
        }
    }

    table
}

fn make_entry(idx: [i32; 4], w: [i32; 4], weights_per_plane: usize) -> DecimationEntry {
    let mut e = DecimationEntry::default();
    for i in 0..4 {
        if w[i] == 0 || idx[i] < 0 || idx[i] >= weights_per_plane as i32 {
            continue;
        }
        e.idx[i] = idx[i] as u8;
        e.w[i] = w[i] as u8;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_grid_is_identity() {
        let table = decimation_table(6, 6, 1, 6, 6, 1);
        for (tix, e) in table.iter().enumerate() {
            assert_eq!(e.idx[0] as usize, tix);
            assert_eq!(e.w[0], 16);
            assert_eq!(e.w[1] + e.w[2] + e.w[3], 0);
        }
    }

    #[test]
    fn tap_weights_sum_to_sixteen() {
        for (grid_x, grid_y) in [(2, 2), (3, 5), (5, 3), (4, 6)] {
            let table = decimation_table(8, 8, 1, grid_x, grid_y, 1);
            for e in &table {
                let sum: u32 = e.w.iter().map(|&w| w as u32).sum();
                assert_eq!(sum, 16);
            }
        }
    }

    #[test]
    fn corner_texels_sample_corner_weights() {
        let table = decimation_table(8, 8, 1, 4, 4, 1);
        // Top-left texel lands exactly on grid weight 0.
        assert_eq!(table[0].idx[0], 0);
        assert_eq!(table[0].w[0], 16);
        // Bottom-right texel lands exactly on the last grid weight.
        let last = table[63];
        let total: u32 = last
            .idx
            .iter()
            .zip(&last.w)
            .map(|(&i, &w)| i as u32 * w as u32)
            .sum();
        assert_eq!(total, 15 * 16);
    }

    #[test]
    fn volume_taps_stay_in_grid() {
        let table = decimation_table(6, 6, 6, 3, 3, 3);
        assert_eq!(table.len(), 216);
        for e in &table {
            let sum: u32 = e.w.iter().map(|&w| w as u32).sum();
            assert_eq!(sum, 16);
            for (&i, &w) in e.idx.iter().zip(&e.w) {
                if w != 0 {
                    assert!((i as usize) < 27);
                }
            }
        }
    }
}
