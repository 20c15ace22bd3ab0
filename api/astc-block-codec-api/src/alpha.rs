//! Alpha-average precomputation for the transparent-block short circuit.
//!
//! With a nonzero alpha-scale radius, 2D compression skips the full search
//! for blocks whose filtered alpha footprint is entirely transparent and
//! emits an all-zero constant block instead. The filter is a separable box
//! of radius `r` per axis with edge replication.

use alloc::vec;
use alloc::vec::Vec;

use astc_block_codec::fp::half_to_f32;

use crate::image::{Image, ImageData, Swz};

fn alpha_channel(img: &Image<'_>, alpha_swz: Swz, out: &mut [f32]) {
    let pick = |t: [f32; 4]| -> f32 {
        match alpha_swz {
            Swz::R => t[0],
            Swz::G => t[1],
            Swz::B => t[2],
            Swz::A => t[3],
            Swz::One => 1.0,
            Swz::Zero | Swz::Z => 0.0,
        }
    };
    match img.data {
        ImageData::Unorm8(d) => {
            for (o, t) in out.iter_mut().zip(d.chunks_exact(4)) {
                *o = pick([
                    f32::from(t[0]) / 255.0,
                    f32::from(t[1]) / 255.0,
                    f32::from(t[2]) / 255.0,
                    f32::from(t[3]) / 255.0,
                ]);
            }
        }
        ImageData::F16(d) => {
            for (o, t) in out.iter_mut().zip(d.chunks_exact(4)) {
                *o = pick([
                    half_to_f32(t[0]),
                    half_to_f32(t[1]),
                    half_to_f32(t[2]),
                    half_to_f32(t[3]),
                ]);
            }
        }
        ImageData::F32(d) => {
            for (o, t) in out.iter_mut().zip(d.chunks_exact(4)) {
                *o = pick([t[0], t[1], t[2], t[3]]);
            }
        }
    }
}

/// Per-texel alpha averaged over a `(2r+1)` box per axis, edge replicated.
pub(crate) fn input_alpha_averages(img: &Image<'_>, alpha_swz: Swz, radius: u32) -> Vec<f32> {
    let (width, height, depth) = (img.dim_x, img.dim_y, img.dim_z);
    let texel_count = width * height * depth;
    let mut alpha = vec![0.0f32; texel_count];
    alpha_channel(img, alpha_swz, &mut alpha);

    let rad = radius as i32;
    let kdim = 2 * rad + 1;
    if kdim <= 1 {
        return alpha;
    }

    // Depth 1 is filtered as 2D even for 3D block footprints.
    let have_z = depth > 1;
    let plane = width * height;
    let mut tmp = vec![0.0f32; texel_count];

    let clampi = |v: i32, hi: usize| (v.clamp(0, hi as i32 - 1)) as usize;

    // X pass, sliding window.
    for z in 0..depth {
        for y in 0..height {
            let row = z * plane + y * width;
            let mut sum = 0.0f32;
            for dx in -rad..=rad {
                sum += alpha[row + clampi(dx, width)];
            }
            tmp[row] = sum;
            for x in 1..width {
                sum += alpha[row + clampi(x as i32 + rad, width)];
                sum -= alpha[row + clampi(x as i32 - rad - 1, width)];
                tmp[row + x] = sum;
            }
        }
    }

    // Y pass, back into alpha.
    for z in 0..depth {
        let zb = z * plane;
        for x in 0..width {
            let mut sum = 0.0f32;
            for dy in -rad..=rad {
                sum += tmp[zb + clampi(dy, height) * width + x];
            }
            alpha[zb + x] = sum;
            for y in 1..height {
                sum += tmp[zb + clampi(y as i32 + rad, height) * width + x];
                sum -= tmp[zb + clampi(y as i32 - rad - 1, height) * width + x];
                alpha[zb + y * width + x] = sum;
            }
        }
    }

    if have_z {
        // Z pass, back into tmp.
        for y in 0..height {
            for x in 0..width {
                let col = y * width + x;
                let mut sum = 0.0f32;
                for dz in -rad..=rad {
                    sum += alpha[clampi(dz, depth) * plane + col];
                }
                tmp[col] = sum;
                for z in 1..depth {
                    sum += alpha[clampi(z as i32 + rad, depth) * plane + col];
                    sum -= alpha[clampi(z as i32 - rad - 1, depth) * plane + col];
                    tmp[z * plane + col] = sum;
                }
            }
        }
        let inv = 1.0 / (kdim * kdim * kdim) as f32;
        for v in &mut tmp {
            *v *= inv;
        }
        return tmp;
    }

    let inv = 1.0 / (kdim * kdim) as f32;
    for v in &mut alpha {
        *v *= inv;
    }
    alpha
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u8_image(dim_x: usize, dim_y: usize, data: &[u8]) -> Image<'_> {
        Image {
            dim_x,
            dim_y,
            dim_z: 1,
            data: ImageData::Unorm8(data),
        }
    }

    #[test]
    fn flat_alpha_averages_to_itself() {
        let data: Vec<u8> = [10u8, 20, 30, 128].repeat(8 * 8);
        let img = u8_image(8, 8, &data);
        let avg = input_alpha_averages(&img, Swz::A, 2);
        for &v in &avg {
            assert!((v - 128.0 / 255.0).abs() < 1e-5);
        }
    }

    #[test]
    fn single_opaque_texel_spreads_over_its_radius() {
        let mut data = vec![0u8; 8 * 8 * 4];
        // Opaque texel at (4, 4).
        data[(4 * 8 + 4) * 4 + 3] = 255;
        let img = u8_image(8, 8, &data);
        let avg = input_alpha_averages(&img, Swz::A, 1);

        let kernel = 1.0 / 9.0;
        assert!((avg[3 * 8 + 3] - kernel).abs() < 1e-6);
        assert!((avg[5 * 8 + 5] - kernel).abs() < 1e-6);
        assert_eq!(avg[0], 0.0);
        assert_eq!(avg[4 * 8 + 7], 0.0);
    }

    #[test]
    fn edges_replicate_rather_than_shrink() {
        // Left column opaque; x = -1 replicates the column so the corner
        // window counts it twice.
        let mut data = vec![0u8; 4 * 4 * 4];
        for y in 0..4 {
            data[(y * 4) * 4 + 3] = 255;
        }
        let img = u8_image(4, 4, &data);
        let avg = input_alpha_averages(&img, Swz::A, 1);
        assert!((avg[0] - 6.0 / 9.0).abs() < 1e-6);
        assert!((avg[1] - 3.0 / 9.0).abs() < 1e-6);
        assert_eq!(avg[3], 0.0);
    }

    #[test]
    fn swizzle_selects_the_alpha_source() {
        let data = [200u8, 0, 0, 0].repeat(16);
        let img = u8_image(4, 4, &data);
        let from_r = input_alpha_averages(&img, Swz::R, 1);
        assert!((from_r[5] - 200.0 / 255.0).abs() < 1e-5);
        let from_a = input_alpha_averages(&img, Swz::A, 1);
        assert_eq!(from_a[5], 0.0);
    }
}
