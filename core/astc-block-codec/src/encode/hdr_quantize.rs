//! HDR endpoint quantizers.
//!
//! HDR endpoint formats pack a multi-mode encoding into the endpoint
//! integers, where some bits select a submode and the rest carry scaled
//! component values. Each quantizer mirrors the reconstruction its endpoint
//! format performs, trying submodes from the most precise downwards and
//! falling back to a coarse direct encoding when none fits.
//!
//! All functions return unquantized color values, already snapped to the
//! quantization grid, so mapping them through the nearest-symbol table is
//! lossless.

use super::color_quantize;
use crate::quant::QuantMethod;

#[inline]
fn rtn(v: f32) -> i32 {
    (v + 0.5) as i32
}

#[inline]
fn uquant(q: QuantMethod, v: u8) -> u8 {
    color_quantize(q, v).1
}

/// Walks down from `value` until quantization preserves the top two bits.
/// Those bits carry submode selectors that must survive quantization.
fn quantize_retain_top_two_bits(q: QuantMethod, value: u8) -> u8 {
    let mut v = value;
    for _ in 0..256 {
        let quantval = uquant(q, v);
        if v & 0xC0 == quantval & 0xC0 {
            return quantval;
        }
        v = v.wrapping_sub(1);
    }
    uquant(q, value)
}

fn quantize_retain_top_four_bits(q: QuantMethod, value: u8) -> u8 {
    let mut v = value;
    for _ in 0..256 {
        let quantval = uquant(q, v);
        if v & 0xF0 == quantval & 0xF0 {
            return quantval;
        }
        v = v.wrapping_sub(1);
    }
    uquant(q, value)
}

/// Quantizes a pair of HDR alpha endpoints into two endpoint integers.
pub(crate) fn quantize_hdr_alpha(alpha0: f32, alpha1: f32, q: QuantMethod) -> [u8; 2] {
    let alpha0 = alpha0.clamp(0.0, 65280.0);
    let alpha1 = alpha1.clamp(0.0, 65280.0);

    let ialpha0 = rtn(alpha0);
    let ialpha1 = rtn(alpha1);

    // Delta submodes, in decreasing-precision order.
    for i in (0..=2i32).rev() {
        let val0 = (ialpha0 + (128 >> i)) >> (8 - i);
        let val1 = (ialpha1 + (128 >> i)) >> (8 - i);

        let v6 = (val0 & 0x7F) | ((i & 1) << 7);
        let v6e = uquant(q, v6 as u8);
        let v6d = i32::from(v6e);
        if (v6 ^ v6d) & 0x80 != 0 {
            continue;
        }

        let val0 = (val0 & !0x7F) | (v6d & 0x7F);
        let diffval = val1 - val0;

        let cutoff = 32 >> i;
        let mask = 2 * cutoff - 1;
        if diffval < -cutoff || diffval >= cutoff {
            continue;
        }

        let v7 = ((i & 2) << 6) | ((val0 >> 7) << (6 - i)) | (diffval & mask);
        let v7e = uquant(q, v7 as u8);
        let v7d = i32::from(v7e);

        let testbits = [0xE0, 0xF0, 0xF8];
        if (v7 ^ v7d) & testbits[i as usize] != 0 {
            continue;
        }

        return [v6e, v7e];
    }

    // No delta mode fits; encode flat values.
    let val0 = (ialpha0 + 256) >> 9;
    let val1 = (ialpha1 + 256) >> 9;
    [
        uquant(q, (val0 | 0x80) as u8),
        uquant(q, (val1 | 0x80) as u8),
    ]
}

/// Quantizes two HDR RGB endpoints into the six integers of the HDR RGB
/// format.
pub(crate) fn quantize_hdr_rgb(
    mut color0: [f32; 4],
    mut color1: [f32; 4],
    q: QuantMethod,
) -> [u8; 6] {
    for i in 0..3 {
        color0[i] = color0[i].clamp(0.0, 65535.0);
        color1[i] = color1[i].clamp(0.0, 65535.0);
    }

    let color0_bak = color0;
    let color1_bak = color1;

    let majcomp = if color1[0] > color1[1] && color1[0] > color1[2] {
        0
    } else if color1[1] > color1[2] {
        1
    } else {
        2
    };

    // Move the major component into lane 0.
    match majcomp {
        1 => {
            color0.swap(0, 1);
            color1.swap(0, 1);
        }
        2 => {
            color0.swap(0, 2);
            color1.swap(0, 2);
        }
        _ => {}
    }

    let a_base = color1[0].clamp(0.0, 65535.0);
    let b0_base = a_base - color1[1];
    let b1_base = a_base - color1[2];
    let c_base = a_base - color0[0];
    let d0_base = a_base - b0_base - c_base - color0[1];
    let d1_base = a_base - b1_base - c_base - color0[2];

    const MODE_BITS: [[i32; 4]; 8] = [
        [9, 7, 6, 7],
        [9, 8, 6, 6],
        [10, 6, 7, 7],
        [10, 7, 7, 6],
        [11, 8, 6, 5],
        [11, 6, 8, 6],
        [12, 7, 7, 5],
        [12, 6, 7, 6],
    ];
    const MODE_CUTOFFS: [[f32; 4]; 8] = [
        [16384.0, 8192.0, 8192.0, 8.0],
        [32768.0, 8192.0, 4096.0, 8.0],
        [4096.0, 8192.0, 4096.0, 4.0],
        [8192.0, 8192.0, 2048.0, 4.0],
        [8192.0, 2048.0, 512.0, 2.0],
        [2048.0, 8192.0, 1024.0, 2.0],
        [2048.0, 2048.0, 256.0, 1.0],
        [1024.0, 2048.0, 512.0, 1.0],
    ];
    const MODE_SCALES: [f32; 8] = [
        1.0 / 128.0,
        1.0 / 128.0,
        1.0 / 64.0,
        1.0 / 64.0,
        1.0 / 32.0,
        1.0 / 32.0,
        1.0 / 16.0,
        1.0 / 16.0,
    ];
    const MODE_RSCALES: [f32; 8] = [128.0, 128.0, 64.0, 64.0, 32.0, 32.0, 16.0, 16.0];

    for mode in (0..8usize).rev() {
        let b_cutoff = MODE_CUTOFFS[mode][0];
        let c_cutoff = MODE_CUTOFFS[mode][1];
        let d_cutoff = MODE_CUTOFFS[mode][2];
        if b0_base > b_cutoff
            || b1_base > b_cutoff
            || c_base > c_cutoff
            || d0_base.abs() > d_cutoff
            || d1_base.abs() > d_cutoff
        {
            continue;
        }

        let mode_scale = MODE_SCALES[mode];
        let mode_rscale = MODE_RSCALES[mode];

        let b_int_cutoff = 1i32 << MODE_BITS[mode][1];
        let c_int_cutoff = 1i32 << MODE_BITS[mode][2];
        let d_int_cutoff = 1i32 << (MODE_BITS[mode][3] - 1);

        let mut a_int = rtn(a_base * mode_scale);
        let a_low = a_int & 0xFF;
        let a_quant = i32::from(uquant(q, a_low as u8));
        a_int = (a_int & !0xFF) | a_quant;
        let a_f = a_int as f32 * mode_rscale;

        let c_f = (a_f - color0[0]).clamp(0.0, 65535.0);
        let mut c_int = rtn(c_f * mode_scale);
        if c_int >= c_int_cutoff {
            continue;
        }

        let mut c_low = c_int & 0x3F;
        c_low |= ((mode as i32) & 1) << 7;
        c_low |= (a_int & 0x100) >> 2;

        let c_quant = quantize_retain_top_two_bits(q, c_low as u8);
        c_int = (c_int & !0x3F) | i32::from(c_quant & 0x3F);
        let c_f = c_int as f32 * mode_rscale;

        let b0_f = (a_f - color1[1]).clamp(0.0, 65535.0);
        let b1_f = (a_f - color1[2]).clamp(0.0, 65535.0);
        let mut b0_int = rtn(b0_f * mode_scale);
        let mut b1_int = rtn(b1_f * mode_scale);
        if b0_int >= b_int_cutoff || b1_int >= b_int_cutoff {
            continue;
        }

        let mut b0_low = b0_int & 0x3F;
        let mut b1_low = b1_int & 0x3F;

        let bit0 = match mode {
            0 | 1 | 3 | 4 | 6 => (b0_int >> 6) & 1,
            _ => (a_int >> 9) & 1,
        };
        let bit1 = match mode {
            0 | 1 | 3 | 4 | 6 => (b1_int >> 6) & 1,
            2 => (c_int >> 6) & 1,
            _ => (a_int >> 10) & 1,
        };

        b0_low |= bit0 << 6;
        b1_low |= bit1 << 6;
        b0_low |= (((mode as i32) >> 1) & 1) << 7;
        b1_low |= (((mode as i32) >> 2) & 1) << 7;

        let b0_quant = quantize_retain_top_two_bits(q, b0_low as u8);
        let b1_quant = quantize_retain_top_two_bits(q, b1_low as u8);

        b0_int = (b0_int & !0x3F) | i32::from(b0_quant & 0x3F);
        b1_int = (b1_int & !0x3F) | i32::from(b1_quant & 0x3F);
        let b0_f = b0_int as f32 * mode_rscale;
        let b1_f = b1_int as f32 * mode_rscale;

        let d0_f = (a_f - b0_f - c_f - color0[1]).clamp(-65535.0, 65535.0);
        let d1_f = (a_f - b1_f - c_f - color0[2]).clamp(-65535.0, 65535.0);

        let d0_int = rtn(d0_f * mode_scale);
        let d1_int = rtn(d1_f * mode_scale);
        if d0_int.abs() >= d_int_cutoff || d1_int.abs() >= d_int_cutoff {
            continue;
        }

        let mut d0_low = d0_int & 0x1F;
        let mut d1_low = d1_int & 0x1F;

        let bit2 = match mode {
            0 | 2 => (d0_int >> 6) & 1,
            1 | 4 => (b0_int >> 7) & 1,
            3 => (a_int >> 9) & 1,
            5 => (c_int >> 7) & 1,
            _ => (a_int >> 11) & 1,
        };
        let bit3 = match mode {
            0 | 2 => (d1_int >> 6) & 1,
            1 | 4 => (b1_int >> 7) & 1,
            _ => (c_int >> 6) & 1,
        };
        let (bit4, bit5) = match mode {
            4 | 6 => ((a_int >> 9) & 1, (a_int >> 10) & 1),
            _ => ((d0_int >> 5) & 1, (d1_int >> 5) & 1),
        };

        d0_low |= bit2 << 6;
        d1_low |= bit3 << 6;
        d0_low |= bit4 << 5;
        d1_low |= bit5 << 5;

        d0_low |= ((majcomp as i32) & 1) << 7;
        d1_low |= (((majcomp as i32) >> 1) & 1) << 7;

        let d0_quant = quantize_retain_top_four_bits(q, d0_low as u8);
        let d1_quant = quantize_retain_top_four_bits(q, d1_low as u8);

        return [
            a_quant as u8,
            c_quant,
            b0_quant,
            b1_quant,
            d0_quant,
            d1_quant,
        ];
    }

    // No submode fits; encode the raw values at 512-step precision.
    let mut vals = [
        color0_bak[0],
        color1_bak[0],
        color0_bak[1],
        color1_bak[1],
        color0_bak[2],
        color1_bak[2],
    ];
    for v in vals.iter_mut() {
        *v = v.clamp(0.0, 65020.0);
    }

    let mut out = [0u8; 6];
    for i in 0..4 {
        out[i] = uquant(q, rtn(vals[i] / 256.0) as u8);
    }
    for i in 4..6 {
        out[i] = quantize_retain_top_two_bits(q, (rtn(vals[i] / 512.0) + 128) as u8);
    }
    out
}

/// Quantizes two full HDR RGBA endpoints.
pub(crate) fn quantize_hdr_rgba(color0: [f32; 4], color1: [f32; 4], q: QuantMethod) -> [u8; 8] {
    let rgb = quantize_hdr_rgb(color0, color1, q);
    let alpha = quantize_hdr_alpha(color0[3], color1[3], q);
    [rgb[0], rgb[1], rgb[2], rgb[3], rgb[4], rgb[5], alpha[0], alpha[1]]
}

/// Quantizes HDR RGB endpoints with UNORM16 alpha, used by the HDR RGB +
/// LDR alpha profile.
pub(crate) fn quantize_hdr_rgb_ldr_alpha(
    color0: [f32; 4],
    color1: [f32; 4],
    q: QuantMethod,
) -> [u8; 8] {
    let a0 = (color0[3] / 257.0).clamp(0.0, 255.0);
    let a1 = (color1[3] / 257.0).clamp(0.0, 255.0);
    let rgb = quantize_hdr_rgb(color0, color1, q);
    [
        rgb[0],
        rgb[1],
        rgb[2],
        rgb[3],
        rgb[4],
        rgb[5],
        uquant(q, rtn(a0).clamp(0, 255) as u8),
        uquant(q, rtn(a1).clamp(0, 255) as u8),
    ]
}

/// Quantizes the HDR RGB + scale format. The input is the low endpoint RGB
/// plus the offset to the high endpoint.
pub(crate) fn quantize_hdr_rgb_scale(mut rgbs: [f32; 4], q: QuantMethod) -> [u8; 4] {
    rgbs[0] += rgbs[3];
    rgbs[1] += rgbs[3];
    rgbs[2] += rgbs[3];

    for v in rgbs.iter_mut() {
        *v = v.clamp(0.0, 65535.0);
    }

    let rgbs_bak = rgbs;

    let majcomp = if rgbs[0] > rgbs[1] && rgbs[0] > rgbs[2] {
        0
    } else if rgbs[1] > rgbs[2] {
        1
    } else {
        2
    };
    match majcomp {
        1 => rgbs.swap(0, 1),
        2 => rgbs.swap(0, 2),
        _ => {}
    }

    const MODE_BITS: [[i32; 3]; 5] = [
        [11, 5, 7],
        [11, 6, 5],
        [10, 5, 8],
        [9, 6, 7],
        [8, 7, 6],
    ];
    const MODE_CUTOFFS: [[f32; 2]; 5] = [
        [1024.0, 4096.0],
        [2048.0, 1024.0],
        [2048.0, 16384.0],
        [8192.0, 16384.0],
        [32768.0, 16384.0],
    ];
    const MODE_RSCALES: [f32; 5] = [32.0, 32.0, 64.0, 128.0, 256.0];
    const MODE_SCALES: [f32; 5] = [
        1.0 / 32.0,
        1.0 / 32.0,
        1.0 / 64.0,
        1.0 / 128.0,
        1.0 / 256.0,
    ];

    let r_base = rgbs[0];
    let g_base = rgbs[0] - rgbs[1];
    let b_base = rgbs[0] - rgbs[2];
    let s_base = rgbs[3];

    for mode in 0..5usize {
        if g_base > MODE_CUTOFFS[mode][0]
            || b_base > MODE_CUTOFFS[mode][0]
            || s_base > MODE_CUTOFFS[mode][1]
        {
            continue;
        }

        let mode_enc: i32 = if mode < 4 {
            (mode as i32) | ((majcomp as i32) << 2)
        } else {
            (majcomp as i32) | 0xC
        };

        let mode_scale = MODE_SCALES[mode];
        let mode_rscale = MODE_RSCALES[mode];

        let gb_int_cutoff = 1i32 << MODE_BITS[mode][1];
        let s_int_cutoff = 1i32 << MODE_BITS[mode][2];

        let mut r_int = rtn(r_base * mode_scale);
        let mut r_low = r_int & 0x3F;
        r_low |= (mode_enc & 3) << 6;

        let r_quant = quantize_retain_top_two_bits(q, r_low as u8);
        r_int = (r_int & !0x3F) | i32::from(r_quant & 0x3F);
        let r_f = r_int as f32 * mode_rscale;

        let g_f = (r_f - rgbs[1]).clamp(0.0, 65535.0);
        let b_f = (r_f - rgbs[2]).clamp(0.0, 65535.0);
        let mut g_int = rtn(g_f * mode_scale);
        let mut b_int = rtn(b_f * mode_scale);
        if g_int >= gb_int_cutoff || b_int >= gb_int_cutoff {
            continue;
        }

        let mut g_low = g_int & 0x1F;
        let mut b_low = b_int & 0x1F;

        let bit0 = match mode {
            0 | 2 => (r_int >> 9) & 1,
            1 | 3 => (r_int >> 8) & 1,
            _ => (g_int >> 6) & 1,
        };
        let bit2 = match mode {
            4 => (b_int >> 6) & 1,
            _ => (r_int >> 7) & 1,
        };
        let bit1 = match mode {
            0 | 2 => (r_int >> 8) & 1,
            _ => (g_int >> 5) & 1,
        };
        let bit3 = match mode {
            0 => (r_int >> 10) & 1,
            2 => (r_int >> 6) & 1,
            _ => (b_int >> 5) & 1,
        };

        g_low |= (mode_enc & 0x4) << 5;
        b_low |= (mode_enc & 0x8) << 4;
        g_low |= bit0 << 6;
        g_low |= bit1 << 5;
        b_low |= bit2 << 6;
        b_low |= bit3 << 5;

        let g_quant = quantize_retain_top_four_bits(q, g_low as u8);
        let b_quant = quantize_retain_top_four_bits(q, b_low as u8);
        g_int = (g_int & !0x1F) | i32::from(g_quant & 0x1F);
        b_int = (b_int & !0x1F) | i32::from(b_quant & 0x1F);

        let g_f = g_int as f32 * mode_rscale;
        let b_f = b_int as f32 * mode_rscale;

        // Fold the RGB rounding error into the scale.
        let rgb_err_sum = (r_f - rgbs[0]) + (r_f - g_f - rgbs[1]) + (r_f - b_f - rgbs[2]);
        let s_f = (s_base + rgb_err_sum * (1.0 / 3.0)).clamp(0.0, 1e9);

        let s_int = rtn(s_f * mode_scale);
        if s_int >= s_int_cutoff {
            continue;
        }

        let mut s_low = s_int & 0x1F;
        let bit6 = if mode == 1 {
            (r_int >> 9) & 1
        } else {
            (s_int >> 5) & 1
        };
        let bit5 = if mode == 4 {
            (r_int >> 7) & 1
        } else if mode == 1 {
            (r_int >> 10) & 1
        } else {
            (s_int >> 6) & 1
        };
        let bit4 = if mode == 2 {
            (s_int >> 7) & 1
        } else {
            (r_int >> 6) & 1
        };

        s_low |= bit6 << 5;
        s_low |= bit5 << 6;
        s_low |= bit4 << 7;

        let s_quant = quantize_retain_top_four_bits(q, s_low as u8);

        return [r_quant, g_quant, b_quant, s_quant];
    }

    // No submode fits; encode the raw values at 512-step precision.
    let mut vals = rgbs_bak;
    let mut ivals = [0i32; 4];
    let mut cvals = [0.0f32; 3];
    for i in 0..3 {
        vals[i] = vals[i].clamp(0.0, 65020.0);
        ivals[i] = rtn(vals[i] * (1.0 / 512.0));
        cvals[i] = ivals[i] as f32 * 512.0;
    }

    let rgb_err_sum = (cvals[0] - vals[0]) + (cvals[1] - vals[1]) + (cvals[2] - vals[2]);
    vals[3] = (vals[3] + rgb_err_sum * (1.0 / 3.0)).clamp(0.0, 65020.0);
    ivals[3] = rtn(vals[3] * (1.0 / 512.0));

    let encvals = [
        (ivals[0] & 0x3F) | 0xC0,
        (ivals[1] & 0x7F) | 0x80,
        (ivals[2] & 0x7F) | 0x80,
        (ivals[3] & 0x7F) | ((ivals[0] & 0x40) << 1),
    ];

    let mut out = [0u8; 4];
    for (o, &e) in out.iter_mut().zip(&encvals) {
        *o = quantize_retain_top_four_bits(q, e as u8);
    }
    out
}

/// Quantizes HDR luminance endpoints with the large-range format.
pub(crate) fn quantize_hdr_luminance_large_range(
    color0: [f32; 4],
    color1: [f32; 4],
    q: QuantMethod,
) -> [u8; 2] {
    let mut lum0 = (color0[0] + color0[1] + color0[2]) * (1.0 / 3.0);
    let mut lum1 = (color1[0] + color1[1] + color1[2]) * (1.0 / 3.0);
    if lum1 < lum0 {
        let avg = (lum0 + lum1) * 0.5;
        lum0 = avg;
        lum1 = avg;
    }

    let ilum0 = rtn(lum0);
    let ilum1 = rtn(lum1);

    // Upper submode: direct 8-bit values. Lower submode: offset pair with
    // a half-step bias in each direction.
    let upper_v0 = ((ilum0 + 128) >> 8).clamp(0, 255);
    let upper_v1 = ((ilum1 + 128) >> 8).clamp(0, 255);
    let lower_v0 = ((ilum1 + 256) >> 8).clamp(0, 255);
    let lower_v1 = (ilum0 >> 8).clamp(0, 255);

    let upper0_diff = (upper_v0 << 8) - ilum0;
    let upper1_diff = (upper_v1 << 8) - ilum1;
    let lower0_diff = (lower_v1 << 8) + 128 - ilum0;
    let lower1_diff = (lower_v0 << 8) - 128 - ilum1;

    let upper_err = upper0_diff * upper0_diff + upper1_diff * upper1_diff;
    let lower_err = lower0_diff * lower0_diff + lower1_diff * lower1_diff;

    let (v0, v1) = if lower_err <= upper_err {
        (lower_v0, lower_v1)
    } else {
        (upper_v0, upper_v1)
    };

    [uquant(q, v0 as u8), uquant(q, v1 as u8)]
}

/// Tries the small-range HDR luminance format. Fails when the endpoints are
/// more than a factor of two apart or the delta does not survive
/// quantization.
pub(crate) fn try_quantize_hdr_luminance_small_range(
    color0: [f32; 4],
    color1: [f32; 4],
    q: QuantMethod,
) -> Option<[u8; 2]> {
    let mut lum0 = (color0[0] + color0[1] + color0[2]) * (1.0 / 3.0);
    let mut lum1 = (color1[0] + color1[1] + color1[2]) * (1.0 / 3.0);
    if lum1 < lum0 {
        let avg = (lum0 + lum1) * 0.5;
        lum0 = avg;
        lum1 = avg;
    }

    let ilum0 = rtn(lum0);
    let ilum1 = rtn(lum1);

    if ilum1 - ilum0 > 2048 {
        return None;
    }

    // High-precision submode.
    let mut lowval = ((ilum0 + 16) >> 5).clamp(0, 2047);
    let mut highval = ((ilum1 + 16) >> 5).clamp(0, 2047);

    let v0 = lowval & 0x7F;
    let v0e = uquant(q, v0 as u8);
    let v0d = i32::from(v0e);
    if v0d < 0x80 {
        lowval = (lowval & !0x7F) | v0d;
        let diffval = highval - lowval;
        if (0..=15).contains(&diffval) {
            let v1 = ((lowval >> 3) & 0xF0) | diffval;
            let v1e = uquant(q, v1 as u8);
            if i32::from(v1e) & 0xF0 == v1 & 0xF0 {
                return Some([v0e, v1e]);
            }
        }
    }

    // Low-precision submode.
    lowval = ((ilum0 + 32) >> 6).clamp(0, 1023);
    highval = ((ilum1 + 32) >> 6).clamp(0, 1023);

    let v0 = (lowval & 0x7F) | 0x80;
    let v0e = uquant(q, v0 as u8);
    let v0d = i32::from(v0e);
    if v0d & 0x80 == 0 {
        return None;
    }

    lowval = (lowval & !0x7F) | (v0d & 0x7F);
    let diffval = highval - lowval;
    if !(0..=31).contains(&diffval) {
        return None;
    }

    let v1 = ((lowval >> 2) & 0xE0) | diffval;
    let v1e = uquant(q, v1 as u8);
    if i32::from(v1e) & 0xE0 != v1 & 0xE0 {
        return None;
    }

    Some([v0e, v1e])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::{format, unpack_color_endpoints};
    use crate::test_prelude::*;

    #[test]
    fn retain_top_bits_is_identity_at_full_precision() {
        for v in 0..=255u8 {
            assert_eq!(quantize_retain_top_two_bits(QuantMethod::Quant256, v), v);
            assert_eq!(quantize_retain_top_four_bits(QuantMethod::Quant256, v), v);
        }
    }

    #[test]
    fn retain_top_bits_holds_at_coarse_levels() {
        for q in [QuantMethod::Quant6, QuantMethod::Quant12, QuantMethod::Quant48] {
            for v in 0..=255u8 {
                let r = quantize_retain_top_two_bits(q, v);
                assert!(r <= v || r & 0xC0 == v & 0xC0);
            }
        }
    }

    #[test]
    fn flat_luminance_large_range_is_exact() {
        let c = [8192.0f32, 8192.0, 8192.0, 0.0];
        let out = quantize_hdr_luminance_large_range(c, c, QuantMethod::Quant256);
        assert_eq!(out, [32, 32]);

        let e = unpack_color_endpoints(
            Profile::Hdr,
            format::HDR_LUMINANCE_LARGE_RANGE,
            &[out[0], out[1]],
        );
        assert_eq!(e.endpoint0[0], 8192);
        assert_eq!(e.endpoint1[0], 8192);
        assert!(e.rgb_hdr);
    }

    #[test]
    fn small_range_luminance_accepts_close_endpoints() {
        let c0 = [1024.0f32, 1024.0, 1024.0, 0.0];
        let c1 = [1056.0f32, 1056.0, 1056.0, 0.0];
        let out = try_quantize_hdr_luminance_small_range(c0, c1, QuantMethod::Quant256);
        assert!(out.is_some());
    }

    #[test]
    fn small_range_luminance_rejects_wide_ranges() {
        let c0 = [0.0f32; 4];
        let c1 = [9000.0f32, 9000.0, 9000.0, 0.0];
        assert!(try_quantize_hdr_luminance_small_range(c0, c1, QuantMethod::Quant256).is_none());
    }

    #[rstest]
    #[case([4096.0, 4096.0, 4096.0])]
    #[case([20000.0, 10000.0, 5000.0])]
    #[case([300.0, 60000.0, 12000.0])]
    fn hdr_rgb_reconstructs_close_endpoints(#[case] hi: [f32; 3]) {
        // Low endpoint at half the high endpoint keeps every submode's
        // deltas in range, so reconstruction error stays within the
        // coarsest submode step.
        let c1 = [hi[0], hi[1], hi[2], 0.0f32];
        let c0 = [hi[0] * 0.5, hi[1] * 0.5, hi[2] * 0.5, 0.0f32];
        let out = quantize_hdr_rgb(c0, c1, QuantMethod::Quant256);
        let e = unpack_color_endpoints(Profile::Hdr, format::HDR_RGB, &out);
        for c in 0..3 {
            assert!(
                (e.endpoint1[c] - hi[c] as i32).abs() <= 512,
                "hi channel {c}: {} vs {}",
                e.endpoint1[c],
                hi[c]
            );
            assert!(
                (e.endpoint0[c] - (hi[c] * 0.5) as i32).abs() <= 512,
                "lo channel {c}: {} vs {}",
                e.endpoint0[c],
                hi[c] * 0.5
            );
        }
    }

    #[test]
    fn hdr_alpha_flat_pair_reconstructs() {
        let out = quantize_hdr_alpha(4096.0, 4096.0, QuantMethod::Quant256);
        // Feed through the full RGBA unpack to exercise the alpha decode.
        let rgb = quantize_hdr_rgb(
            [4096.0, 4096.0, 4096.0, 0.0],
            [4096.0, 4096.0, 4096.0, 0.0],
            QuantMethod::Quant256,
        );
        let vals = [rgb[0], rgb[1], rgb[2], rgb[3], rgb[4], rgb[5], out[0], out[1]];
        let e = unpack_color_endpoints(Profile::Hdr, format::HDR_RGBA, &vals);
        assert!((e.endpoint0[3] - 4096).abs() <= 64);
        assert!((e.endpoint1[3] - 4096).abs() <= 64);
        assert!(e.alpha_hdr);
    }
}
