//! Whole-image compression and decompression.
//!
//! A [`Context`] owns a validated configuration and the block footprint
//! tables, and drives the block codecs over every block of an image. One
//! operation may run at a time per context; compression can be cancelled
//! from another thread.

use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use astc_block_codec::const_block::{encode_const_block_f16, encode_const_block_rgba8};
use astc_block_codec::encode::EncodeOptions;
use astc_block_codec::fp::float01_to_unorm8;
use astc_block_codec::{decode, decode_f32, encode, fp};
use astc_block_codec::{BlockSizeDescriptor, Profile, BLOCK_BYTES};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::alpha::input_alpha_averages;
use crate::block_info::{self, BlockInfo};
use crate::config::{Config, Flags};
use crate::error::AstcError;
use crate::image::{self, Image, ImageData, ImageDataMut, ImageMut, Swz, Swizzle};
use crate::progress::{ProgressMeter, ProgressSink};

const STATE_IDLE: u32 = 0;
const STATE_COMPRESS: u32 = 1;
const STATE_DECOMPRESS: u32 = 2;

/// A codec context bound to one configuration and block footprint.
///
/// Contexts are cheap to share by reference across threads; the image
/// drivers split the work internally when the `parallel` feature is on.
pub struct Context {
    cfg: Config,
    bsd: BlockSizeDescriptor,
    state: AtomicU32,
    cancel: AtomicBool,
}

/// Releases the context state on scope exit.
struct StateGuard<'a>(&'a AtomicU32);

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(STATE_IDLE, Ordering::Release);
    }
}

/// Block grid covering an image for one footprint.
#[derive(Clone, Copy)]
struct BlockGrid {
    blocks_x: usize,
    blocks_y: usize,
    blocks_z: usize,
}

impl BlockGrid {
    fn new(dim_x: usize, dim_y: usize, dim_z: usize, bsd: &BlockSizeDescriptor) -> BlockGrid {
        BlockGrid {
            blocks_x: (dim_x + bsd.block_x() - 1) / bsd.block_x(),
            blocks_y: (dim_y + bsd.block_y() - 1) / bsd.block_y(),
            blocks_z: (dim_z + bsd.block_z() - 1) / bsd.block_z(),
        }
    }

    fn plane(&self) -> usize {
        self.blocks_x * self.blocks_y
    }

    fn total(&self) -> usize {
        self.plane() * self.blocks_z
    }
}

struct CompressJob<'a> {
    img: &'a Image<'a>,
    swizzle: Swizzle,
    grid: BlockGrid,
    alpha_averages: Option<Vec<f32>>,
    opts: EncodeOptions,
    meter: Option<ProgressMeter<'a>>,
    done: AtomicUsize,
}

struct CompressScratch {
    u8_texels: Vec<u8>,
    f16_texels: Vec<u16>,
    f32_texels: Vec<f32>,
}

impl CompressScratch {
    fn new(texel_count: usize) -> CompressScratch {
        CompressScratch {
            u8_texels: vec![0; texel_count * 4],
            f16_texels: vec![0; texel_count * 4],
            f32_texels: vec![0.0; texel_count * 4],
        }
    }
}

struct DecodeScratch<T> {
    f32_texels: Vec<f32>,
    texels: Vec<T>,
}

impl<T: Copy + Default> DecodeScratch<T> {
    fn new(texel_count: usize) -> DecodeScratch<T> {
        DecodeScratch {
            f32_texels: vec![0.0; texel_count * 4],
            texels: vec![T::default(); texel_count * 4],
        }
    }
}

/// A disjoint span of output rows, decoded independently of other bands.
struct Band<'t, T> {
    out: &'t mut [T],
    block_base: usize,
    rows_per_slice: usize,
    slices: usize,
    blocks_in_y: usize,
}

impl Context {
    /// Builds a context, clamping the configuration's tuning fields into
    /// their legal ranges.
    pub fn new(cfg: &Config) -> Result<Context, AstcError> {
        let mut cfg = *cfg;
        cfg.validate_and_clamp()?;
        let bsd = BlockSizeDescriptor::new(cfg.block_x, cfg.block_y, cfg.block_z)?;
        Ok(Context {
            cfg,
            bsd,
            state: AtomicU32::new(STATE_IDLE),
            cancel: AtomicBool::new(false),
        })
    }

    /// The validated configuration the context runs under.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn acquire(&self, new_state: u32) -> Result<StateGuard<'_>, AstcError> {
        self.state
            .compare_exchange(STATE_IDLE, new_state, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| AstcError::ContextBusy)?;
        Ok(StateGuard(&self.state))
    }

    /// Compresses an image into tightly packed 16-byte blocks.
    pub fn compress_image(
        &self,
        img: &Image<'_>,
        swizzle: Swizzle,
        out: &mut [u8],
    ) -> Result<(), AstcError> {
        self.compress_image_with_progress(img, swizzle, out, None)
    }

    /// Compresses an image, reporting progress to `progress` as blocks
    /// complete.
    pub fn compress_image_with_progress<'a>(
        &'a self,
        img: &'a Image<'a>,
        swizzle: Swizzle,
        out: &mut [u8],
        progress: Option<&'a dyn ProgressSink>,
    ) -> Result<(), AstcError> {
        if self.cfg.flags.contains(Flags::DECOMPRESS_ONLY) {
            return Err(AstcError::DecompressOnly);
        }
        swizzle.validate_compression()?;
        img.validate()?;

        let grid = BlockGrid::new(img.dim_x, img.dim_y, img.dim_z, &self.bsd);
        let total = grid.total();
        let needed = total * BLOCK_BYTES;
        if out.len() < needed {
            return Err(AstcError::OutputBufferTooSmall {
                needed,
                actual: out.len(),
            });
        }

        let _guard = self.acquire(STATE_COMPRESS)?;
        self.cancel.store(false, Ordering::Relaxed);

        let alpha_averages = if self.cfg.a_scale_radius != 0
            && self.cfg.block_z == 1
            && !matches!(swizzle.a, Swz::Zero | Swz::One)
        {
            Some(input_alpha_averages(img, swizzle.a, self.cfg.a_scale_radius))
        } else {
            None
        };

        let job = CompressJob {
            img,
            swizzle,
            grid,
            alpha_averages,
            opts: self.cfg.encode_options(),
            meter: progress.map(|sink| ProgressMeter::new(sink, total)),
            done: AtomicUsize::new(0),
        };

        let texel_count = self.bsd.texel_count();
        let out = &mut out[..needed];

        #[cfg(feature = "parallel")]
        out.par_chunks_exact_mut(BLOCK_BYTES)
            .enumerate()
            .try_for_each_init(
                || CompressScratch::new(texel_count),
                |scratch, (i, dst)| self.compress_block(&job, i, dst, scratch),
            )?;

        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = CompressScratch::new(texel_count);
            for (i, dst) in out.chunks_exact_mut(BLOCK_BYTES).enumerate() {
                self.compress_block(&job, i, dst, &mut scratch)?;
            }
        }

        if let Some(meter) = &job.meter {
            meter.finish();
        }
        Ok(())
    }

    /// Requests cancellation of an in-flight [`Context::compress_image`]
    /// call. The compressing call returns [`AstcError::Cancelled`]; blocks
    /// issued before the cancellation hold valid payloads.
    pub fn cancel_compress(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn compress_block(
        &self,
        job: &CompressJob<'_>,
        i: usize,
        dst: &mut [u8],
        scratch: &mut CompressScratch,
    ) -> Result<(), AstcError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(AstcError::Cancelled);
        }

        let bz = i / job.grid.plane();
        let rem = i % job.grid.plane();
        let by = rem / job.grid.blocks_x;
        let bx = rem % job.grid.blocks_x;

        let (block_x, block_y, block_z) =
            (self.bsd.block_x(), self.bsd.block_y(), self.bsd.block_z());
        let (x0, y0, z0) = (bx * block_x, by * block_y, bz * block_z);

        let img = job.img;
        let n = self.bsd.texel_count() * 4;

        let blk = if !self.footprint_has_alpha(job, x0, y0, z0) {
            if self.cfg.profile.is_ldr() {
                encode_const_block_rgba8(0, 0, 0, 0)
            } else {
                encode_const_block_f16(0, 0, 0, 0)
            }
        } else {
            match img.data {
                ImageData::Unorm8(data) => {
                    let texels = &mut scratch.u8_texels[..n];
                    image::extract_block(
                        data, img.dim_x, img.dim_y, img.dim_z, x0, y0, z0, block_x, block_y,
                        block_z, texels,
                    );
                    image::apply_swizzle_rgba8(texels, job.swizzle);

                    let mut opts = job.opts;
                    if self.cfg.flags.contains(Flags::USE_ALPHA_WEIGHT) {
                        let mut max_a = 0u8;
                        for texel in texels.chunks_exact(4) {
                            max_a = max_a.max(texel[3]);
                        }
                        let scale = f32::from(max_a) / 255.0;
                        opts.channel_weight[0] *= scale;
                        opts.channel_weight[1] *= scale;
                        opts.channel_weight[2] *= scale;
                    }
                    encode::encode_block_rgba8(self.cfg.profile, &self.bsd, texels, &opts)?
                }
                ImageData::F16(data) => {
                    let CompressScratch {
                        f16_texels,
                        f32_texels,
                        ..
                    } = scratch;
                    let raw = &mut f16_texels[..n];
                    image::extract_block(
                        data, img.dim_x, img.dim_y, img.dim_z, x0, y0, z0, block_x, block_y,
                        block_z, raw,
                    );
                    image::f16_texels_to_f32(raw, &mut f32_texels[..n]);
                    self.encode_float_block(job, scratch)?
                }
                ImageData::F32(data) => {
                    image::extract_block(
                        data,
                        img.dim_x,
                        img.dim_y,
                        img.dim_z,
                        x0,
                        y0,
                        z0,
                        block_x,
                        block_y,
                        block_z,
                        &mut scratch.f32_texels[..n],
                    );
                    self.encode_float_block(job, scratch)?
                }
            }
        };
        dst.copy_from_slice(&blk);

        let done = job.done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(meter) = &job.meter {
            meter.completed(done);
        }
        Ok(())
    }

    /// Encodes the float texels staged in `scratch.f32_texels`.
    fn encode_float_block(
        &self,
        job: &CompressJob<'_>,
        scratch: &mut CompressScratch,
    ) -> Result<[u8; BLOCK_BYTES], AstcError> {
        let n = self.bsd.texel_count() * 4;
        let CompressScratch {
            u8_texels,
            f32_texels,
            ..
        } = scratch;
        let texels = &mut f32_texels[..n];
        image::apply_swizzle_rgba_f32(texels, job.swizzle);

        let mut opts = job.opts;
        if self.cfg.flags.contains(Flags::USE_ALPHA_WEIGHT) {
            let scale = if self.cfg.profile == Profile::Hdr {
                let mut max_code = 0u16;
                for texel in texels.chunks_exact(4) {
                    max_code = max_code.max(fp::float_to_lns(texel[3]));
                }
                f32::from(max_code) / 65535.0
            } else {
                let mut max_a = 0.0f32;
                for texel in texels.chunks_exact(4) {
                    if texel[3] > max_a {
                        max_a = texel[3];
                    }
                }
                max_a
            };
            opts.channel_weight[0] *= scale;
            opts.channel_weight[1] *= scale;
            opts.channel_weight[2] *= scale;
        }

        if self.cfg.profile.is_hdr() {
            Ok(encode::encode_block_rgba_f32(
                self.cfg.profile,
                &self.bsd,
                texels,
                &opts,
            )?)
        } else {
            let quantized = &mut u8_texels[..n];
            for (d, &s) in quantized.iter_mut().zip(texels.iter()) {
                *d = float01_to_unorm8(s);
            }
            Ok(encode::encode_block_rgba8(
                self.cfg.profile,
                &self.bsd,
                quantized,
                &opts,
            )?)
        }
    }

    /// Whether the alpha-average footprint of a block has any coverage.
    /// Returns true when the short circuit does not apply.
    fn footprint_has_alpha(&self, job: &CompressJob<'_>, x0: usize, y0: usize, z0: usize) -> bool {
        if self.cfg.a_scale_radius == 0 || self.bsd.block_z() != 1 {
            return true;
        }
        match job.swizzle.a {
            Swz::One => true,
            Swz::Zero => false,
            _ => {
                let Some(averages) = &job.alpha_averages else {
                    return true;
                };
                let img = job.img;
                let end_x = (x0 + self.bsd.block_x()).min(img.dim_x);
                let end_y = (y0 + self.bsd.block_y()).min(img.dim_y);

                let ext = (self.cfg.a_scale_radius as usize).saturating_sub(1);
                let footprint =
                    ((self.bsd.block_x() + 2 * ext) * (self.bsd.block_y() + 2 * ext)) as f32;
                let threshold = 0.9 / (255.0 * footprint);

                let z_base = z0 * img.dim_y * img.dim_x;
                for y in y0..end_y {
                    let row = z_base + y * img.dim_x;
                    for x in x0..end_x {
                        if averages[row + x] > threshold {
                            return true;
                        }
                    }
                }
                false
            }
        }
    }

    /// Decompresses tightly packed blocks into an image.
    pub fn decompress_image(
        &self,
        data: &[u8],
        img: &mut ImageMut<'_>,
        swizzle: Swizzle,
    ) -> Result<(), AstcError> {
        swizzle.validate_decompression()?;
        img.validate()?;

        let grid = BlockGrid::new(img.dim_x, img.dim_y, img.dim_z, &self.bsd);
        let needed = grid.total() * BLOCK_BYTES;
        if data.len() < needed {
            return Err(AstcError::InputBufferTooSmall {
                needed,
                actual: data.len(),
            });
        }

        let _guard = self.acquire(STATE_DECOMPRESS)?;

        let dims = (img.dim_x, img.dim_y, img.dim_z);
        let profile = self.cfg.profile;
        match &mut img.data {
            ImageDataMut::Unorm8(out) => {
                self.decompress_bands(data, out, dims, grid, |blk, scratch| {
                    let DecodeScratch { f32_texels, texels } = scratch;
                    if profile.is_ldr() {
                        decode::decode_block_rgba8(profile, &self.bsd, blk, texels);
                    } else {
                        decode_f32::decode_block_rgba_f32(profile, &self.bsd, blk, f32_texels);
                        for (d, &s) in texels.iter_mut().zip(f32_texels.iter()) {
                            *d = float01_to_unorm8(s);
                        }
                    }
                    image::apply_swizzle_rgba8(texels, swizzle);
                });
            }
            ImageDataMut::F32(out) => {
                self.decompress_bands(data, out, dims, grid, |blk, scratch| {
                    decode_f32::decode_block_rgba_f32(profile, &self.bsd, blk, &mut scratch.texels);
                    image::apply_swizzle_rgba_f32(&mut scratch.texels, swizzle);
                });
            }
            ImageDataMut::F16(out) => {
                self.decompress_bands(data, out, dims, grid, |blk, scratch| {
                    let DecodeScratch { f32_texels, texels } = scratch;
                    decode_f32::decode_block_rgba_f32(profile, &self.bsd, blk, f32_texels);
                    image::apply_swizzle_rgba_f32(f32_texels, swizzle);
                    image::f32_texels_to_f16(f32_texels, texels);
                });
            }
        }
        Ok(())
    }

    /// Splits the output into memory-disjoint bands and decodes each band's
    /// blocks, in parallel when the `parallel` feature is on.
    fn decompress_bands<T, F>(
        &self,
        data: &[u8],
        out: &mut [T],
        dims: (usize, usize, usize),
        grid: BlockGrid,
        decode_one: F,
    ) where
        T: Copy + Default + Send,
        F: Fn(&[u8; BLOCK_BYTES], &mut DecodeScratch<T>) + Sync,
    {
        let (dim_x, dim_y, dim_z) = dims;
        let (block_x, block_y, block_z) =
            (self.bsd.block_x(), self.bsd.block_y(), self.bsd.block_z());
        let texel_count = self.bsd.texel_count();

        let mut bands = Vec::new();
        let mut rest = out;
        if block_z == 1 {
            // One band per footprint row of each slice.
            for z in 0..dim_z {
                for by in 0..grid.blocks_y {
                    let rows = block_y.min(dim_y - by * block_y);
                    let (band, tail) = rest.split_at_mut(rows * dim_x * 4);
                    rest = tail;
                    bands.push(Band {
                        out: band,
                        block_base: (z * grid.blocks_y + by) * grid.blocks_x,
                        rows_per_slice: rows,
                        slices: 1,
                        blocks_in_y: 1,
                    });
                }
            }
        } else {
            // One band per footprint slab of slices.
            for bz in 0..grid.blocks_z {
                let slices = block_z.min(dim_z - bz * block_z);
                let (band, tail) = rest.split_at_mut(slices * dim_y * dim_x * 4);
                rest = tail;
                bands.push(Band {
                    out: band,
                    block_base: bz * grid.plane(),
                    rows_per_slice: dim_y,
                    slices,
                    blocks_in_y: grid.blocks_y,
                });
            }
        }

        let process = |scratch: &mut DecodeScratch<T>, band: Band<'_, T>| {
            for by in 0..band.blocks_in_y {
                for bx in 0..grid.blocks_x {
                    let idx = band.block_base + by * grid.blocks_x + bx;
                    let mut blk = [0u8; BLOCK_BYTES];
                    blk.copy_from_slice(&data[idx * BLOCK_BYTES..(idx + 1) * BLOCK_BYTES]);
                    decode_one(&blk, scratch);
                    image::store_block(
                        band.out,
                        dim_x,
                        band.rows_per_slice,
                        band.slices,
                        bx * block_x,
                        by * block_y,
                        block_x,
                        block_y,
                        block_z,
                        &scratch.texels,
                    );
                }
            }
        };

        #[cfg(feature = "parallel")]
        bands.into_par_iter().for_each_init(
            || DecodeScratch::new(texel_count),
            |scratch, band| process(scratch, band),
        );

        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = DecodeScratch::new(texel_count);
            for band in bands {
                process(&mut scratch, band);
            }
        }
    }

    /// Expands one block payload into an inspection report.
    pub fn block_info(&self, block: &[u8; BLOCK_BYTES]) -> BlockInfo {
        block_info::block_info_for(self.cfg.profile, &self.bsd, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QUALITY_FAST, QUALITY_FASTEST};

    fn gradient_rgba8(dim_x: usize, dim_y: usize) -> Vec<u8> {
        let mut data = vec![0u8; dim_x * dim_y * 4];
        for y in 0..dim_y {
            for x in 0..dim_x {
                let off = (y * dim_x + x) * 4;
                data[off] = (x * 255 / (dim_x - 1).max(1)) as u8;
                data[off + 1] = (y * 255 / (dim_y - 1).max(1)) as u8;
                data[off + 2] = 128;
                data[off + 3] = 255;
            }
        }
        data
    }

    fn ldr_context(block: u32, quality: f32, flags: Flags) -> Context {
        let cfg = Config::new(Profile::Ldr, block, block, 1, quality, flags).unwrap();
        Context::new(&cfg).unwrap()
    }

    #[test]
    fn u8_image_round_trips_within_tolerance() {
        let ctx = ldr_context(4, QUALITY_FAST, Flags::NONE);
        let src = gradient_rgba8(8, 8);
        let img = Image {
            dim_x: 8,
            dim_y: 8,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; 4 * BLOCK_BYTES];
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();

        let mut decoded = vec![0u8; src.len()];
        let mut out = ImageMut {
            dim_x: 8,
            dim_y: 8,
            dim_z: 1,
            data: ImageDataMut::Unorm8(&mut decoded),
        };
        ctx.decompress_image(&blocks, &mut out, Swizzle::RGBA).unwrap();

        for (d, s) in decoded.iter().zip(src.iter()) {
            assert!(d.abs_diff(*s) <= 24, "decoded {d} vs source {s}");
        }
    }

    #[test]
    fn constant_color_survives_exactly() {
        let ctx = ldr_context(6, QUALITY_FASTEST, Flags::NONE);
        let src = [17u8, 34, 51, 204].repeat(12 * 12);
        let img = Image {
            dim_x: 12,
            dim_y: 12,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; 4 * BLOCK_BYTES];
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();

        let mut decoded = vec![0u8; src.len()];
        let mut out = ImageMut {
            dim_x: 12,
            dim_y: 12,
            dim_z: 1,
            data: ImageDataMut::Unorm8(&mut decoded),
        };
        ctx.decompress_image(&blocks, &mut out, Swizzle::RGBA).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn small_output_buffer_is_rejected() {
        let ctx = ldr_context(4, QUALITY_FASTEST, Flags::NONE);
        let src = gradient_rgba8(8, 8);
        let img = Image {
            dim_x: 8,
            dim_y: 8,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; 3 * BLOCK_BYTES];
        assert_eq!(
            ctx.compress_image(&img, Swizzle::RGBA, &mut blocks),
            Err(AstcError::OutputBufferTooSmall {
                needed: 64,
                actual: 48
            })
        );
    }

    #[test]
    fn decompress_only_contexts_refuse_to_compress() {
        let ctx = ldr_context(4, QUALITY_FASTEST, Flags::DECOMPRESS_ONLY);
        let src = gradient_rgba8(4, 4);
        let img = Image {
            dim_x: 4,
            dim_y: 4,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; BLOCK_BYTES];
        assert_eq!(
            ctx.compress_image(&img, Swizzle::RGBA, &mut blocks),
            Err(AstcError::DecompressOnly)
        );
    }

    #[test]
    fn transparent_blocks_collapse_to_zero_constants() {
        let cfg = Config::new(Profile::Ldr, 4, 4, 1, QUALITY_FASTEST, Flags::NONE).unwrap();
        let mut cfg = cfg;
        cfg.a_scale_radius = 1;
        let ctx = Context::new(&cfg).unwrap();

        // Colorful but fully transparent.
        let mut src = gradient_rgba8(8, 8);
        for texel in src.chunks_exact_mut(4) {
            texel[3] = 0;
        }
        let img = Image {
            dim_x: 8,
            dim_y: 8,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; 4 * BLOCK_BYTES];
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();

        let zero = encode_const_block_rgba8(0, 0, 0, 0);
        for blk in blocks.chunks_exact(BLOCK_BYTES) {
            assert_eq!(blk, zero);
        }
    }

    #[test]
    fn cancelling_from_the_progress_sink_aborts() {
        let ctx = ldr_context(4, QUALITY_FASTEST, Flags::NONE);
        let src = gradient_rgba8(16, 16);
        let img = Image {
            dim_x: 16,
            dim_y: 16,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; 16 * BLOCK_BYTES];
        let sink = |_p: f32| ctx.cancel_compress();
        assert_eq!(
            ctx.compress_image_with_progress(&img, Swizzle::RGBA, &mut blocks, Some(&sink)),
            Err(AstcError::Cancelled)
        );
    }

    #[test]
    fn a_running_compression_makes_the_context_busy() {
        use core::sync::atomic::AtomicBool;

        let ctx = ldr_context(4, QUALITY_FASTEST, Flags::NONE);
        let src = gradient_rgba8(8, 8);
        let img = Image {
            dim_x: 8,
            dim_y: 8,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };

        let saw_busy = AtomicBool::new(false);
        let sink = |_p: f32| {
            let inner = gradient_rgba8(4, 4);
            let inner_img = Image {
                dim_x: 4,
                dim_y: 4,
                dim_z: 1,
                data: ImageData::Unorm8(&inner),
            };
            let mut inner_out = vec![0u8; BLOCK_BYTES];
            if ctx.compress_image(&inner_img, Swizzle::RGBA, &mut inner_out)
                == Err(AstcError::ContextBusy)
            {
                saw_busy.store(true, Ordering::Relaxed);
            }
        };

        let mut blocks = vec![0u8; 4 * BLOCK_BYTES];
        ctx.compress_image_with_progress(&img, Swizzle::RGBA, &mut blocks, Some(&sink))
            .unwrap();
        assert!(saw_busy.load(Ordering::Relaxed));

        // The guard released the context, so a fresh operation succeeds.
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();
    }

    #[test]
    fn f32_input_round_trips_through_the_ldr_path() {
        let ctx = ldr_context(4, QUALITY_FAST, Flags::NONE);
        let mut src = vec![0.0f32; 4 * 4 * 4];
        for (i, texel) in src.chunks_exact_mut(4).enumerate() {
            let t = i as f32 / 15.0;
            texel[0] = 0.25 + 0.5 * t;
            texel[1] = 0.5;
            texel[2] = 0.75 - 0.5 * t;
            texel[3] = 1.0;
        }
        let img = Image {
            dim_x: 4,
            dim_y: 4,
            dim_z: 1,
            data: ImageData::F32(&src),
        };
        let mut blocks = vec![0u8; BLOCK_BYTES];
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();

        let mut decoded = vec![0.0f32; src.len()];
        let mut out = ImageMut {
            dim_x: 4,
            dim_y: 4,
            dim_z: 1,
            data: ImageDataMut::F32(&mut decoded),
        };
        ctx.decompress_image(&blocks, &mut out, Swizzle::RGBA).unwrap();
        for (d, s) in decoded.iter().zip(src.iter()) {
            assert!((d - s).abs() <= 0.1, "decoded {d} vs source {s}");
        }
    }

    #[test]
    fn hdr_images_round_trip_in_float() {
        let cfg = Config::new(Profile::Hdr, 4, 4, 1, QUALITY_FAST, Flags::NONE).unwrap();
        let ctx = Context::new(&cfg).unwrap();
        let src = [2.0f32, 0.5, 1.0, 1.0].repeat(16);
        let img = Image {
            dim_x: 4,
            dim_y: 4,
            dim_z: 1,
            data: ImageData::F32(&src),
        };
        let mut blocks = vec![0u8; BLOCK_BYTES];
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();

        let mut decoded = vec![0.0f32; src.len()];
        let mut out = ImageMut {
            dim_x: 4,
            dim_y: 4,
            dim_z: 1,
            data: ImageDataMut::F32(&mut decoded),
        };
        ctx.decompress_image(&blocks, &mut out, Swizzle::RGBA).unwrap();
        for (d, s) in decoded.iter().zip(src.iter()) {
            assert!((d - s).abs() <= s * 0.01 + 0.01, "decoded {d} vs source {s}");
        }
    }

    #[test]
    fn volume_images_use_the_3d_band_path() {
        let cfg = Config::new(Profile::Ldr, 3, 3, 3, QUALITY_FASTEST, Flags::NONE).unwrap();
        let ctx = Context::new(&cfg).unwrap();
        let src = [40u8, 80, 120, 255].repeat(5 * 5 * 5);
        let img = Image {
            dim_x: 5,
            dim_y: 5,
            dim_z: 5,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; 8 * BLOCK_BYTES];
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();

        let mut decoded = vec![0u8; src.len()];
        let mut out = ImageMut {
            dim_x: 5,
            dim_y: 5,
            dim_z: 5,
            data: ImageDataMut::Unorm8(&mut decoded),
        };
        ctx.decompress_image(&blocks, &mut out, Swizzle::RGBA).unwrap();
        assert_eq!(decoded, src);
    }

    #[test]
    fn decompression_applies_the_swizzle() {
        let ctx = ldr_context(4, QUALITY_FASTEST, Flags::NONE);
        let src = [200u8, 100, 50, 255].repeat(16);
        let img = Image {
            dim_x: 4,
            dim_y: 4,
            dim_z: 1,
            data: ImageData::Unorm8(&src),
        };
        let mut blocks = vec![0u8; BLOCK_BYTES];
        ctx.compress_image(&img, Swizzle::RGBA, &mut blocks).unwrap();

        let mut decoded = vec![0u8; src.len()];
        let mut out = ImageMut {
            dim_x: 4,
            dim_y: 4,
            dim_z: 1,
            data: ImageDataMut::Unorm8(&mut decoded),
        };
        let bgr = Swizzle {
            r: Swz::B,
            g: Swz::G,
            b: Swz::R,
            a: Swz::One,
        };
        ctx.decompress_image(&blocks, &mut out, bgr).unwrap();
        assert_eq!(&decoded[..4], &[50, 100, 200, 255]);
    }
}
