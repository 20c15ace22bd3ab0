//! Common test imports and utilities for block codec tests
//!
//! This module provides a common prelude for test modules to avoid
//! duplicate imports across the codebase.

// External crates commonly used in tests
pub use rstest::rstest;

// Core functionality from this crate
pub use crate::descriptor::BlockSizeDescriptor;
pub use crate::quant::QuantMethod;
pub use crate::{Profile, BLOCK_BYTES};

pub use alloc::vec;
pub use alloc::vec::Vec;

// Re-export super for convenience in test modules
pub use super::*;

/// Deterministic xorshift generator for reproducible pixel data.
pub(crate) struct TestRng(u32);

impl TestRng {
    pub(crate) fn new(seed: u32) -> Self {
        Self(seed | 1)
    }

    pub(crate) fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    pub(crate) fn next_u8(&mut self) -> u8 {
        (self.next_u32() >> 24) as u8
    }
}

/// Generates a smooth RGBA8 gradient over a block footprint. Encoders
/// reproduce gradients well, so these make good round-trip inputs.
pub(crate) fn gradient_rgba8(bx: usize, by: usize, bz: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(bx * by * bz * 4);
    for z in 0..bz {
        for y in 0..by {
            for x in 0..bx {
                let r = (x * 255) / (bx - 1).max(1);
                let g = (y * 255) / (by - 1).max(1);
                let b = (z * 255) / (bz - 1).max(1);
                out.push(r as u8);
                out.push(g as u8);
                out.push(b as u8);
                out.push(255);
            }
        }
    }
    out
}

/// Generates uncorrelated RGBA8 noise from a fixed seed.
pub(crate) fn noise_rgba8(texel_count: usize, seed: u32) -> Vec<u8> {
    let mut rng = TestRng::new(seed);
    let mut out = Vec::with_capacity(texel_count * 4);
    for _ in 0..texel_count * 4 {
        out.push(rng.next_u8());
    }
    out
}

/// Peak absolute per-channel error between two RGBA8 buffers.
pub(crate) fn max_channel_error(a: &[u8], b: &[u8]) -> u8 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}
