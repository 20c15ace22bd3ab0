//! Image model, swizzles and block gather/scatter helpers.
//!
//! Images are tightly packed RGBA with one of three sample types. Blocks at
//! the right or bottom edge of an image gather texels with edge replication,
//! and scatter back only the texels inside the image.

use astc_block_codec::fp::{f32_to_half, half_to_f32};

use crate::error::AstcError;

/// Component selector for a [`Swizzle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Swz {
    /// Red.
    #[default]
    R,
    /// Green.
    G,
    /// Blue.
    B,
    /// Alpha.
    A,
    /// Constant zero.
    Zero,
    /// Constant one.
    One,
    /// Reconstructed normal Z from R and A; only valid on decompression.
    Z,
}

/// Per-channel component mapping applied at the image boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swizzle {
    /// Source for the output red channel.
    pub r: Swz,
    /// Source for the output green channel.
    pub g: Swz,
    /// Source for the output blue channel.
    pub b: Swz,
    /// Source for the output alpha channel.
    pub a: Swz,
}

impl Swizzle {
    /// The identity mapping.
    pub const RGBA: Swizzle = Swizzle {
        r: Swz::R,
        g: Swz::G,
        b: Swz::B,
        a: Swz::A,
    };

    pub(crate) fn validate_compression(self) -> Result<(), AstcError> {
        // Z reconstruction only exists on the decode side.
        for s in [self.r, self.g, self.b, self.a] {
            if s == Swz::Z {
                return Err(AstcError::BadSwizzle);
            }
        }
        Ok(())
    }

    pub(crate) fn validate_decompression(self) -> Result<(), AstcError> {
        Ok(())
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Swizzle::RGBA
    }
}

/// Borrowed source texels for compression.
#[derive(Debug, Clone, Copy)]
pub enum ImageData<'a> {
    /// 8-bit UNORM RGBA.
    Unorm8(&'a [u8]),
    /// FP16 RGBA as raw bit patterns.
    F16(&'a [u16]),
    /// Float32 RGBA.
    F32(&'a [f32]),
}

/// Borrowed destination texels for decompression.
#[derive(Debug)]
pub enum ImageDataMut<'a> {
    /// 8-bit UNORM RGBA.
    Unorm8(&'a mut [u8]),
    /// FP16 RGBA as raw bit patterns.
    F16(&'a mut [u16]),
    /// Float32 RGBA.
    F32(&'a mut [f32]),
}

/// A tightly packed RGBA image used as compression input.
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    /// Width in texels.
    pub dim_x: usize,
    /// Height in texels.
    pub dim_y: usize,
    /// Depth in texels, 1 for 2D.
    pub dim_z: usize,
    /// The texel data, `4 * dim_x * dim_y * dim_z` values in z, y, x raster
    /// order.
    pub data: ImageData<'a>,
}

/// A tightly packed RGBA image used as decompression output.
#[derive(Debug)]
pub struct ImageMut<'a> {
    /// Width in texels.
    pub dim_x: usize,
    /// Height in texels.
    pub dim_y: usize,
    /// Depth in texels, 1 for 2D.
    pub dim_z: usize,
    /// The texel data, `4 * dim_x * dim_y * dim_z` values in z, y, x raster
    /// order.
    pub data: ImageDataMut<'a>,
}

fn check_dims(dim_x: usize, dim_y: usize, dim_z: usize, len: usize) -> Result<(), AstcError> {
    if dim_x == 0 || dim_y == 0 || dim_z == 0 {
        return Err(AstcError::BadImageDims);
    }
    let needed = dim_x * dim_y * dim_z * 4;
    if len != needed {
        return Err(AstcError::BadImageBuffer {
            needed,
            actual: len,
        });
    }
    Ok(())
}

impl Image<'_> {
    pub(crate) fn validate(&self) -> Result<(), AstcError> {
        let len = match self.data {
            ImageData::Unorm8(d) => d.len(),
            ImageData::F16(d) => d.len(),
            ImageData::F32(d) => d.len(),
        };
        check_dims(self.dim_x, self.dim_y, self.dim_z, len)
    }
}

impl ImageMut<'_> {
    pub(crate) fn validate(&self) -> Result<(), AstcError> {
        let len = match &self.data {
            ImageDataMut::Unorm8(d) => d.len(),
            ImageDataMut::F16(d) => d.len(),
            ImageDataMut::F32(d) => d.len(),
        };
        check_dims(self.dim_x, self.dim_y, self.dim_z, len)
    }
}

/// Gathers one block footprint from an image, replicating edge texels for
/// blocks that overhang the right, bottom or back edge.
#[allow(clippy::too_many_arguments)]
pub(crate) fn extract_block<T: Copy>(
    src: &[T],
    dim_x: usize,
    dim_y: usize,
    dim_z: usize,
    x0: usize,
    y0: usize,
    z0: usize,
    block_x: usize,
    block_y: usize,
    block_z: usize,
    dst: &mut [T],
) {
    for zz in 0..block_z {
        let z = (z0 + zz).min(dim_z - 1);
        for yy in 0..block_y {
            let y = (y0 + yy).min(dim_y - 1);
            for xx in 0..block_x {
                let x = (x0 + xx).min(dim_x - 1);
                let src_off = ((z * dim_y + y) * dim_x + x) * 4;
                let dst_off = ((zz * block_y + yy) * block_x + xx) * 4;
                dst[dst_off..dst_off + 4].copy_from_slice(&src[src_off..src_off + 4]);
            }
        }
    }
}

pub(crate) fn f16_texels_to_f32(src: &[u16], dst: &mut [f32]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = half_to_f32(s);
    }
}

pub(crate) fn f32_texels_to_f16(src: &[f32], dst: &mut [u16]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = f32_to_half(s);
    }
}

/// Scatters a decoded block into an output band.
///
/// The band is `slices` slices of `rows_per_slice` rows of `width` texels;
/// texels of the block that fall outside it are dropped.
#[allow(clippy::too_many_arguments)]
pub(crate) fn store_block<T: Copy>(
    band: &mut [T],
    width: usize,
    rows_per_slice: usize,
    slices: usize,
    x0: usize,
    y0: usize,
    block_x: usize,
    block_y: usize,
    block_z: usize,
    block: &[T],
) {
    let cols = block_x.min(width.saturating_sub(x0));
    for zz in 0..block_z.min(slices) {
        for yy in 0..block_y {
            let y = y0 + yy;
            if y >= rows_per_slice {
                break;
            }
            let dst_off = ((zz * rows_per_slice + y) * width + x0) * 4;
            let src_off = (zz * block_y + yy) * block_x * 4;
            band[dst_off..dst_off + cols * 4].copy_from_slice(&block[src_off..src_off + cols * 4]);
        }
    }
}

#[inline]
fn swz_u8(s: Swz, r: u8, g: u8, b: u8, a: u8) -> u8 {
    match s {
        Swz::R => r,
        Swz::G => g,
        Swz::B => b,
        Swz::A => a,
        Swz::Zero => 0,
        Swz::One => 255,
        Swz::Z => {
            let xn = f32::from(r) * (2.0 / 255.0) - 1.0;
            let yn = f32::from(a) * (2.0 / 255.0) - 1.0;
            let zn = (1.0 - xn * xn - yn * yn).max(0.0);
            let z = (libm::sqrtf(zn) * 0.5 + 0.5).min(1.0);
            (z * 255.0 + 0.5) as u8
        }
    }
}

#[inline]
fn swz_f32(s: Swz, r: f32, g: f32, b: f32, a: f32) -> f32 {
    match s {
        Swz::R => r,
        Swz::G => g,
        Swz::B => b,
        Swz::A => a,
        Swz::Zero => 0.0,
        Swz::One => 1.0,
        Swz::Z => {
            let xn = r * 2.0 - 1.0;
            let yn = a * 2.0 - 1.0;
            let zn = (1.0 - xn * xn - yn * yn).max(0.0);
            (libm::sqrtf(zn) * 0.5 + 0.5).min(1.0)
        }
    }
}

pub(crate) fn apply_swizzle_rgba8(texels: &mut [u8], swz: Swizzle) {
    if swz == Swizzle::RGBA {
        return;
    }
    for texel in texels.chunks_exact_mut(4) {
        let [r, g, b, a] = [texel[0], texel[1], texel[2], texel[3]];
        texel[0] = swz_u8(swz.r, r, g, b, a);
        texel[1] = swz_u8(swz.g, r, g, b, a);
        texel[2] = swz_u8(swz.b, r, g, b, a);
        texel[3] = swz_u8(swz.a, r, g, b, a);
    }
}

pub(crate) fn apply_swizzle_rgba_f32(texels: &mut [f32], swz: Swizzle) {
    if swz == Swizzle::RGBA {
        return;
    }
    for texel in texels.chunks_exact_mut(4) {
        let [r, g, b, a] = [texel[0], texel[1], texel[2], texel[3]];
        texel[0] = swz_f32(swz.r, r, g, b, a);
        texel[1] = swz_f32(swz.g, r, g, b, a);
        texel[2] = swz_f32(swz.b, r, g, b, a);
        texel[3] = swz_f32(swz.a, r, g, b, a);
    }
}
