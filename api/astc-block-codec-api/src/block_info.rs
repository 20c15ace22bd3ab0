//! Block payload inspection.

use astc_block_codec::endpoints::unpack_color_endpoints;
use astc_block_codec::fp::{half_to_f32, lns_to_sf16};
use astc_block_codec::symbolic::{physical_to_symbolic, SymbolicBlockType};
use astc_block_codec::{
    BlockSizeDescriptor, Profile, BLOCK_BYTES, BLOCK_MAX_PARTITIONS, BLOCK_MAX_TEXELS,
    WEIGHTS_PLANE2_OFFSET,
};

/// Expanded form of one block payload, for tooling and debugging.
///
/// Error and constant-color payloads report their classification flags only;
/// the partitioning, endpoint and weight fields stay zeroed.
#[derive(Debug, Clone)]
pub struct BlockInfo {
    /// Profile the payload was interpreted under.
    pub profile: Profile,
    /// Block footprint X dimension.
    pub block_x: u32,
    /// Block footprint Y dimension.
    pub block_y: u32,
    /// Block footprint Z dimension.
    pub block_z: u32,
    /// Texels per block.
    pub texel_count: u32,

    /// The payload is invalid and decodes to the error color.
    pub is_error_block: bool,
    /// The payload is a constant-color block.
    pub is_constant_block: bool,
    /// At least one endpoint pair decodes as HDR.
    pub is_hdr_block: bool,
    /// The payload stores two weight planes.
    pub is_dual_plane_block: bool,

    /// Partition count, 1..=4.
    pub partition_count: u32,
    /// Partition seed, 0..=1023.
    pub partition_index: u32,
    /// Component the second weight plane applies to, -1 when single plane.
    pub dual_plane_component: i8,

    /// Endpoint format per partition.
    pub color_endpoint_formats: [u8; BLOCK_MAX_PARTITIONS],
    /// Levels in the endpoint quantization.
    pub color_level_count: u32,
    /// Levels in the weight quantization.
    pub weight_level_count: u32,

    /// Weight grid width.
    pub weight_x: u32,
    /// Weight grid height.
    pub weight_y: u32,
    /// Weight grid depth.
    pub weight_z: u32,

    /// Decoded endpoint colors per partition, low then high.
    pub color_endpoints: [[[f32; 4]; 2]; BLOCK_MAX_PARTITIONS],
    /// Per-texel plane 1 weights, unquantized to [0, 1].
    pub weight_values_plane1: [f32; BLOCK_MAX_TEXELS],
    /// Per-texel plane 2 weights, valid for dual-plane blocks.
    pub weight_values_plane2: [f32; BLOCK_MAX_TEXELS],
    /// Per-texel partition assignment.
    pub partition_assignment: [u8; BLOCK_MAX_TEXELS],
}

fn endpoint_to_f32(value: i32, hdr: bool) -> f32 {
    let u = value as u16;
    if hdr {
        half_to_f32(lns_to_sf16(u))
    } else {
        f32::from(u) / 65535.0
    }
}

pub(crate) fn block_info_for(
    profile: Profile,
    bsd: &BlockSizeDescriptor,
    block: &[u8; BLOCK_BYTES],
) -> BlockInfo {
    let mut info = BlockInfo {
        profile,
        block_x: bsd.block_x() as u32,
        block_y: bsd.block_y() as u32,
        block_z: bsd.block_z() as u32,
        texel_count: bsd.texel_count() as u32,
        is_error_block: false,
        is_constant_block: false,
        is_hdr_block: false,
        is_dual_plane_block: false,
        partition_count: 0,
        partition_index: 0,
        dual_plane_component: -1,
        color_endpoint_formats: [0; BLOCK_MAX_PARTITIONS],
        color_level_count: 0,
        weight_level_count: 0,
        weight_x: 0,
        weight_y: 0,
        weight_z: 0,
        color_endpoints: [[[0.0; 4]; 2]; BLOCK_MAX_PARTITIONS],
        weight_values_plane1: [0.0; BLOCK_MAX_TEXELS],
        weight_values_plane2: [0.0; BLOCK_MAX_TEXELS],
        partition_assignment: [0; BLOCK_MAX_TEXELS],
    };

    let scb = physical_to_symbolic(block, bsd);
    info.is_error_block = scb.block_type == SymbolicBlockType::Error;
    if info.is_error_block {
        return info;
    }

    info.is_constant_block = matches!(
        scb.block_type,
        SymbolicBlockType::ConstU16 | SymbolicBlockType::ConstF16
    );
    if info.is_constant_block {
        return info;
    }

    let Some(bmi) = bsd.block_mode(scb.block_mode) else {
        info.is_error_block = true;
        return info;
    };

    info.is_dual_plane_block = bmi.dual_plane;
    info.partition_count = u32::from(scb.partition_count);
    info.partition_index = u32::from(scb.partition_index);
    info.dual_plane_component = scb.plane2_component;

    info.weight_x = u32::from(bmi.x_weights);
    info.weight_y = u32::from(bmi.y_weights);
    info.weight_z = u32::from(bmi.z_weights);

    info.color_level_count = scb.quant_mode.levels() as u32;
    info.weight_level_count = bmi.weight_quant.levels() as u32;

    for p in 0..scb.partition_count as usize {
        let format = scb.color_formats[p];
        info.color_endpoint_formats[p] = format;

        let unpacked = unpack_color_endpoints(profile, format, &scb.color_values[p]);
        info.is_hdr_block |= unpacked.rgb_hdr || unpacked.alpha_hdr;

        for (j, endpoint) in [unpacked.endpoint0, unpacked.endpoint1].into_iter().enumerate() {
            for c in 0..4 {
                let hdr = if c < 3 {
                    unpacked.rgb_hdr
                } else {
                    unpacked.alpha_hdr
                };
                info.color_endpoints[p][j][c] = endpoint_to_f32(endpoint[c], hdr);
            }
        }
    }

    let texel_count = bsd.texel_count();
    if bmi.no_decimation {
        for t in 0..texel_count {
            info.weight_values_plane1[t] = f32::from(scb.weights[t]) / 64.0;
            if info.is_dual_plane_block {
                info.weight_values_plane2[t] =
                    f32::from(scb.weights[WEIGHTS_PLANE2_OFFSET + t]) / 64.0;
            }
        }
    } else {
        let grid = bsd.weight_grid(bmi);
        for (t, entry) in grid.infill.iter().take(texel_count).enumerate() {
            let mut sum1 = 8u32;
            let mut sum2 = 8u32;
            for k in 0..4 {
                let idx = entry.idx[k] as usize;
                let tap = u32::from(entry.w[k]);
                sum1 += u32::from(scb.weights[idx]) * tap;
                if info.is_dual_plane_block {
                    sum2 += u32::from(scb.weights[idx + WEIGHTS_PLANE2_OFFSET]) * tap;
                }
            }
            info.weight_values_plane1[t] = (sum1 >> 4) as f32 / 64.0;
            if info.is_dual_plane_block {
                info.weight_values_plane2[t] = (sum2 >> 4) as f32 / 64.0;
            }
        }
    }

    let pc = scb.partition_count as usize;
    if (2..=BLOCK_MAX_PARTITIONS).contains(&pc) {
        if let Some(table) = bsd.partition_table(pc) {
            let assign = table.partitions_for_index(scb.partition_index as usize);
            info.partition_assignment[..texel_count].copy_from_slice(&assign[..texel_count]);
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use astc_block_codec::const_block::encode_const_block_rgba8;
    use astc_block_codec::encode::{encode_block_rgba8, EncodeOptions};

    fn bsd_4x4() -> BlockSizeDescriptor {
        BlockSizeDescriptor::new(4, 4, 1).unwrap()
    }

    #[test]
    fn constant_blocks_report_only_their_class() {
        let bsd = bsd_4x4();
        let blk = encode_const_block_rgba8(10, 20, 30, 40);
        let info = block_info_for(Profile::Ldr, &bsd, &blk);
        assert!(info.is_constant_block);
        assert!(!info.is_error_block);
        assert_eq!(info.partition_count, 0);
    }

    #[test]
    fn garbage_payloads_report_as_error_blocks() {
        let bsd = bsd_4x4();
        // Void-extent prefix with reserved bits poked.
        let blk = [0xFFu8; BLOCK_BYTES];
        let info = block_info_for(Profile::Ldr, &bsd, &blk);
        assert!(info.is_error_block || info.is_constant_block);
    }

    #[test]
    fn encoded_blocks_expose_their_structure() {
        let bsd = bsd_4x4();
        let mut texels = [0u8; 4 * 4 * 4];
        for (i, texel) in texels.chunks_exact_mut(4).enumerate() {
            let v = (i * 255 / 15) as u8;
            texel[0] = v;
            texel[1] = 255 - v;
            texel[2] = 128;
            texel[3] = 255;
        }
        let blk =
            encode_block_rgba8(Profile::Ldr, &bsd, &texels, &EncodeOptions::default()).unwrap();
        let info = block_info_for(Profile::Ldr, &bsd, &blk);

        assert!(!info.is_error_block);
        assert!(!info.is_constant_block);
        assert!(!info.is_hdr_block);
        assert!(info.partition_count >= 1);
        assert!(info.weight_x >= 2 && info.weight_y >= 2);
        assert!(info.color_level_count >= 4);

        let texel_count = info.texel_count as usize;
        for &w in &info.weight_values_plane1[..texel_count] {
            assert!((0.0..=1.0).contains(&w));
        }
        for p in 0..info.partition_count as usize {
            for endpoint in &info.color_endpoints[p] {
                for &v in endpoint {
                    assert!((0.0..=1.0).contains(&v));
                }
            }
        }
    }
}
