//! Endpoint format unpacking.
//!
//! Each partition stores its two endpoint colors in one of 16 formats, from
//! two luminance values up to full HDR RGBA. Unpacking yields 16-bit
//! per-channel endpoints ready for weight interpolation.

use crate::Profile;

/// Endpoint formats. Values are specified by the format and must not be
/// reordered.
#[allow(missing_docs)]
pub mod format {
    pub const LUMINANCE: u8 = 0;
    pub const LUMINANCE_DELTA: u8 = 1;
    pub const HDR_LUMINANCE_LARGE_RANGE: u8 = 2;
    pub const HDR_LUMINANCE_SMALL_RANGE: u8 = 3;
    pub const LUMINANCE_ALPHA: u8 = 4;
    pub const LUMINANCE_ALPHA_DELTA: u8 = 5;
    pub const RGB_SCALE: u8 = 6;
    pub const HDR_RGB_SCALE: u8 = 7;
    pub const RGB: u8 = 8;
    pub const RGB_DELTA: u8 = 9;
    pub const RGB_SCALE_ALPHA: u8 = 10;
    pub const HDR_RGB: u8 = 11;
    pub const RGBA: u8 = 12;
    pub const RGBA_DELTA: u8 = 13;
    pub const HDR_RGB_LDR_ALPHA: u8 = 14;
    pub const HDR_RGBA: u8 = 15;
}

type Int4 = [i32; 4];

/// Unpacked endpoint pair with per-channel HDR flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnpackedEndpoints {
    /// RGB channels hold HDR (12-bit log-space, shifted) values.
    pub rgb_hdr: bool,
    /// Alpha channel holds an HDR value.
    pub alpha_hdr: bool,
    /// Low endpoint, expanded to 16 bits per channel.
    pub endpoint0: Int4,
    /// High endpoint, expanded to 16 bits per channel.
    pub endpoint1: Int4,
}

const ERROR_COLOR: Int4 = [0xFF, 0x00, 0xFF, 0xFF];

fn hadd_rgb(v: Int4) -> i32 {
    v[0] + v[1] + v[2]
}

fn uncontract_color(mut input: Int4) -> Int4 {
    let blue = input[2];
    input[0] = (input[0] + blue) >> 1;
    input[1] = (input[1] + blue) >> 1;
    input
}

fn bit_transfer_signed(mut input0: Int4, mut input1: Int4) -> (Int4, Int4) {
    for i in 0..4 {
        input1[i] = (input1[i] >> 1) | (input0[i] & 0x80);
        input0[i] = (input0[i] >> 1) & 0x3F;
        if input0[i] & 0x20 != 0 {
            input0[i] -= 0x40;
        }
    }
    (input0, input1)
}

fn rgba_delta_unpack(input0: Int4, input1: Int4) -> (Int4, Int4) {
    let (mut input1, mut input0) = bit_transfer_signed(input1, input0);

    let rgb_sum = hadd_rgb(input1);
    for i in 0..4 {
        input1[i] += input0[i];
    }

    if rgb_sum < 0 {
        input0 = uncontract_color(input0);
        input1 = uncontract_color(input1);
        core::mem::swap(&mut input0, &mut input1);
    }

    let mut output0 = [0; 4];
    let mut output1 = [0; 4];
    for i in 0..4 {
        output0[i] = input0[i].clamp(0, 255);
        output1[i] = input1[i].clamp(0, 255);
    }
    (output0, output1)
}

fn rgb_delta_unpack(input0: Int4, input1: Int4) -> (Int4, Int4) {
    let (mut output0, mut output1) = rgba_delta_unpack(input0, input1);
    output0[3] = 255;
    output1[3] = 255;
    (output0, output1)
}

fn rgba_unpack(mut input0: Int4, mut input1: Int4) -> (Int4, Int4) {
    if hadd_rgb(input0) > hadd_rgb(input1) {
        input0 = uncontract_color(input0);
        input1 = uncontract_color(input1);
        core::mem::swap(&mut input0, &mut input1);
    }
    (input0, input1)
}

fn rgb_unpack(input0: Int4, input1: Int4) -> (Int4, Int4) {
    let (mut output0, mut output1) = rgba_unpack(input0, input1);
    output0[3] = 255;
    output1[3] = 255;
    (output0, output1)
}

fn rgb_scale_alpha_unpack(input0: Int4, alpha1: u8, scale: u8) -> (Int4, Int4) {
    let mut output1 = input0;
    output1[3] = i32::from(alpha1);

    let mut output0 = [0; 4];
    for i in 0..4 {
        output0[i] = (input0[i] * i32::from(scale)) >> 8;
    }
    output0[3] = input0[3];
    (output0, output1)
}

fn rgb_scale_unpack(input0: Int4, scale: i32) -> (Int4, Int4) {
    let mut output1 = input0;
    output1[3] = 255;

    let mut output0 = [0; 4];
    for i in 0..4 {
        output0[i] = (input0[i] * scale) >> 8;
    }
    output0[3] = 255;
    (output0, output1)
}

fn luminance_unpack(input: &[u8]) -> (Int4, Int4) {
    let lum0 = i32::from(input[0]);
    let lum1 = i32::from(input[1]);
    ([lum0, lum0, lum0, 255], [lum1, lum1, lum1, 255])
}

fn luminance_delta_unpack(input: &[u8]) -> (Int4, Int4) {
    let v0 = i32::from(input[0]);
    let v1 = i32::from(input[1]);
    let l0 = (v0 >> 2) | (v1 & 0xC0);
    let l1 = (l0 + (v1 & 0x3F)).min(255);
    ([l0, l0, l0, 255], [l1, l1, l1, 255])
}

fn luminance_alpha_unpack(input: &[u8]) -> (Int4, Int4) {
    let lum0 = i32::from(input[0]);
    let lum1 = i32::from(input[1]);
    let alpha0 = i32::from(input[2]);
    let alpha1 = i32::from(input[3]);
    ([lum0, lum0, lum0, alpha0], [lum1, lum1, lum1, alpha1])
}

fn luminance_alpha_delta_unpack(input: &[u8]) -> (Int4, Int4) {
    let mut lum0 = i32::from(input[0]);
    let mut lum1 = i32::from(input[1]);
    let mut alpha0 = i32::from(input[2]);
    let mut alpha1 = i32::from(input[3]);

    lum0 |= (lum1 & 0x80) << 1;
    alpha0 |= (alpha1 & 0x80) << 1;
    lum1 &= 0x7F;
    alpha1 &= 0x7F;

    if lum1 & 0x40 != 0 {
        lum1 -= 0x80;
    }
    if alpha1 & 0x40 != 0 {
        alpha1 -= 0x80;
    }

    lum0 >>= 1;
    lum1 >>= 1;
    alpha0 >>= 1;
    alpha1 >>= 1;

    lum1 = (lum1 + lum0).clamp(0, 255);
    alpha1 = (alpha1 + alpha0).clamp(0, 255);

    ([lum0, lum0, lum0, alpha0], [lum1, lum1, lum1, alpha1])
}

#[inline]
fn lsh(val: i32, shift: i32) -> i32 {
    ((val as u32) << shift) as i32
}

fn hdr_rgbo_unpack(input: &[u8]) -> (Int4, Int4) {
    let v0 = i32::from(input[0]);
    let v1 = i32::from(input[1]);
    let v2 = i32::from(input[2]);
    let v3 = i32::from(input[3]);

    let modeval = ((v0 & 0xC0) >> 6) | (((v1 & 0x80) >> 7) << 2) | (((v2 & 0x80) >> 7) << 3);

    let (majcomp, mode) = if modeval & 0xC != 0xC {
        (modeval >> 2, modeval & 3)
    } else if modeval != 0xF {
        (modeval & 3, 4)
    } else {
        (0, 5)
    };

    let mut red = v0 & 0x3F;
    let mut green = v1 & 0x1F;
    let mut blue = v2 & 0x1F;
    let mut scale = v3 & 0x1F;

    let bit0 = (v1 >> 6) & 1;
    let bit1 = (v1 >> 5) & 1;
    let bit2 = (v2 >> 6) & 1;
    let bit3 = (v2 >> 5) & 1;
    let bit4 = (v3 >> 7) & 1;
    let bit5 = (v3 >> 6) & 1;
    let bit6 = (v3 >> 5) & 1;

    let ohcomp = 1 << mode;

    if ohcomp & 0x30 != 0 {
        green |= bit0 << 6;
    }
    if ohcomp & 0x3A != 0 {
        green |= bit1 << 5;
    }
    if ohcomp & 0x30 != 0 {
        blue |= bit2 << 6;
    }
    if ohcomp & 0x3A != 0 {
        blue |= bit3 << 5;
    }
    if ohcomp & 0x3D != 0 {
        scale |= bit6 << 5;
    }
    if ohcomp & 0x2D != 0 {
        scale |= bit5 << 6;
    }
    if ohcomp & 0x04 != 0 {
        scale |= bit4 << 7;
    }
    if ohcomp & 0x3B != 0 {
        red |= bit4 << 6;
    }
    if ohcomp & 0x04 != 0 {
        red |= bit3 << 6;
    }
    if ohcomp & 0x10 != 0 {
        red |= bit5 << 7;
    }
    if ohcomp & 0x0F != 0 {
        red |= bit2 << 7;
    }
    if ohcomp & 0x05 != 0 {
        red |= bit1 << 8;
    }
    if ohcomp & 0x0A != 0 {
        red |= bit0 << 8;
    }
    if ohcomp & 0x05 != 0 {
        red |= bit0 << 9;
    }
    if ohcomp & 0x02 != 0 {
        red |= bit6 << 9;
    }
    if ohcomp & 0x01 != 0 {
        red |= bit3 << 10;
    }
    if ohcomp & 0x02 != 0 {
        red |= bit5 << 10;
    }

    // Expand to 12 bits.
    const SHAMTS: [i32; 6] = [1, 1, 2, 3, 4, 5];
    let shamt = SHAMTS[mode as usize];
    red <<= shamt;
    green <<= shamt;
    blue <<= shamt;
    scale <<= shamt;

    // Modes 0 to 4 store green and blue as differentials from red.
    if mode != 5 {
        green = red - green;
        blue = red - blue;
    }

    match majcomp {
        1 => core::mem::swap(&mut red, &mut green),
        2 => core::mem::swap(&mut red, &mut blue),
        _ => {}
    }

    let red0 = (red - scale).max(0);
    let green0 = (green - scale).max(0);
    let blue0 = (blue - scale).max(0);

    let red = red.max(0);
    let green = green.max(0);
    let blue = blue.max(0);

    (
        [red0 << 4, green0 << 4, blue0 << 4, 0x7800],
        [red << 4, green << 4, blue << 4, 0x7800],
    )
}

fn hdr_rgb_unpack(input: &[u8]) -> (Int4, Int4) {
    let v0 = i32::from(input[0]);
    let v1 = i32::from(input[1]);
    let v2 = i32::from(input[2]);
    let v3 = i32::from(input[3]);
    let v4 = i32::from(input[4]);
    let v5 = i32::from(input[5]);

    let modeval = ((v1 & 0x80) >> 7) | (((v2 & 0x80) >> 7) << 1) | (((v3 & 0x80) >> 7) << 2);
    let majcomp = ((v4 & 0x80) >> 7) | (((v5 & 0x80) >> 7) << 1);

    if majcomp == 3 {
        return (
            [v0 << 8, v2 << 8, (v4 & 0x7F) << 9, 0x7800],
            [v1 << 8, v3 << 8, (v5 & 0x7F) << 9, 0x7800],
        );
    }

    let mut a = v0 | ((v1 & 0x40) << 2);
    let mut b0 = v2 & 0x3F;
    let mut b1 = v3 & 0x3F;
    let mut c = v1 & 0x3F;
    let mut d0 = v4 & 0x7F;
    let mut d1 = v5 & 0x7F;

    const DBITS: [i32; 8] = [7, 6, 7, 6, 5, 6, 5, 6];
    let dbits = DBITS[modeval as usize];

    let bit0 = (v2 >> 6) & 1;
    let bit1 = (v3 >> 6) & 1;
    let bit2 = (v4 >> 6) & 1;
    let bit3 = (v5 >> 6) & 1;
    let bit4 = (v4 >> 5) & 1;
    let bit5 = (v5 >> 5) & 1;

    let ohmod = 1 << modeval;
    if ohmod & 0xA4 != 0 {
        a |= bit0 << 9;
    }
    if ohmod & 0x8 != 0 {
        a |= bit2 << 9;
    }
    if ohmod & 0x50 != 0 {
        a |= bit4 << 9;
    }
    if ohmod & 0x50 != 0 {
        a |= bit5 << 10;
    }
    if ohmod & 0xA0 != 0 {
        a |= bit1 << 10;
    }
    if ohmod & 0xC0 != 0 {
        a |= bit2 << 11;
    }
    if ohmod & 0x4 != 0 {
        c |= bit1 << 6;
    }
    if ohmod & 0xE8 != 0 {
        c |= bit3 << 6;
    }
    if ohmod & 0x20 != 0 {
        c |= bit2 << 7;
    }
    if ohmod & 0x5B != 0 {
        b0 |= bit0 << 6;
        b1 |= bit1 << 6;
    }
    if ohmod & 0x12 != 0 {
        b0 |= bit2 << 7;
        b1 |= bit3 << 7;
    }
    if ohmod & 0xAF != 0 {
        d0 |= bit4 << 5;
        d1 |= bit5 << 5;
    }
    if ohmod & 0x5 != 0 {
        d0 |= bit2 << 6;
        d1 |= bit3 << 6;
    }

    let sx_shamt = 32 - dbits;
    d0 = lsh(d0, sx_shamt) >> sx_shamt;
    d1 = lsh(d1, sx_shamt) >> sx_shamt;

    let val_shamt = (modeval >> 1) ^ 3;
    a = lsh(a, val_shamt);
    b0 = lsh(b0, val_shamt);
    b1 = lsh(b1, val_shamt);
    c = lsh(c, val_shamt);
    d0 = lsh(d0, val_shamt);
    d1 = lsh(d1, val_shamt);

    let mut red1 = a.clamp(0, 4095);
    let mut green1 = (a - b0).clamp(0, 4095);
    let mut blue1 = (a - b1).clamp(0, 4095);
    let mut red0 = (a - c).clamp(0, 4095);
    let mut green0 = (a - b0 - c - d0).clamp(0, 4095);
    let mut blue0 = (a - b1 - c - d1).clamp(0, 4095);

    match majcomp {
        1 => {
            core::mem::swap(&mut red0, &mut green0);
            core::mem::swap(&mut red1, &mut green1);
        }
        2 => {
            core::mem::swap(&mut red0, &mut blue0);
            core::mem::swap(&mut red1, &mut blue1);
        }
        _ => {}
    }

    (
        [red0 << 4, green0 << 4, blue0 << 4, 0x7800],
        [red1 << 4, green1 << 4, blue1 << 4, 0x7800],
    )
}

fn hdr_luminance_small_range_unpack(input: &[u8]) -> (Int4, Int4) {
    let v0 = i32::from(input[0]);
    let v1 = i32::from(input[1]);

    let (y0, y1) = if v0 & 0x80 != 0 {
        (
            ((v1 & 0xE0) << 4) | ((v0 & 0x7F) << 2),
            (v1 & 0x1F) << 2,
        )
    } else {
        (
            ((v1 & 0xF0) << 4) | ((v0 & 0x7F) << 1),
            (v1 & 0xF) << 1,
        )
    };

    let y1 = (y1 + y0).min(0xFFF);

    ([y0 << 4, y0 << 4, y0 << 4, 0x7800], [y1 << 4, y1 << 4, y1 << 4, 0x7800])
}

fn hdr_luminance_large_range_unpack(input: &[u8]) -> (Int4, Int4) {
    let v0 = i32::from(input[0]);
    let v1 = i32::from(input[1]);

    let (y0, y1) = if v1 >= v0 {
        (v0 << 4, v1 << 4)
    } else {
        ((v1 << 4) + 8, (v0 << 4) - 8)
    };

    ([y0 << 4, y0 << 4, y0 << 4, 0x7800], [y1 << 4, y1 << 4, y1 << 4, 0x7800])
}

fn hdr_alpha_unpack(input: &[u8]) -> (i32, i32) {
    let mut v6 = i32::from(input[0]);
    let mut v7 = i32::from(input[1]);

    let selector = ((v6 >> 7) & 1) | ((v7 >> 6) & 2);
    v6 &= 0x7F;
    v7 &= 0x7F;

    let (output0, output1) = if selector == 3 {
        (v6 << 5, v7 << 5)
    } else {
        v6 |= (v7 << (selector + 1)) & 0x780;
        v7 &= 0x3F >> selector;
        v7 ^= 32 >> selector;
        v7 -= 32 >> selector;
        v6 <<= 4 - selector;
        v7 <<= 4 - selector;
        v7 += v6;
        v7 = v7.clamp(0, 0xFFF);
        (v6, v7)
    };

    (output0 << 4, output1 << 4)
}

/// Unpacks a partition's endpoint pair and expands it for the decode
/// profile. Invalid format and profile combinations yield the magenta error
/// color.
pub fn unpack_color_endpoints(profile: Profile, fmt: u8, input: &[u8]) -> UnpackedEndpoints {
    let mut rgb_hdr = false;
    let mut alpha_hdr = false;
    let mut alpha_hdr_default = false;

    let (mut output0, mut output1) = match fmt {
        format::LUMINANCE => luminance_unpack(&input[..2]),
        format::LUMINANCE_DELTA => luminance_delta_unpack(&input[..2]),
        format::HDR_LUMINANCE_SMALL_RANGE => {
            rgb_hdr = true;
            alpha_hdr_default = true;
            hdr_luminance_small_range_unpack(&input[..2])
        }
        format::HDR_LUMINANCE_LARGE_RANGE => {
            rgb_hdr = true;
            alpha_hdr_default = true;
            hdr_luminance_large_range_unpack(&input[..2])
        }
        format::LUMINANCE_ALPHA => luminance_alpha_unpack(&input[..4]),
        format::LUMINANCE_ALPHA_DELTA => luminance_alpha_delta_unpack(&input[..4]),
        format::RGB_SCALE => {
            let input0 = [
                i32::from(input[0]),
                i32::from(input[1]),
                i32::from(input[2]),
                0,
            ];
            rgb_scale_unpack(input0, i32::from(input[3]))
        }
        format::RGB_SCALE_ALPHA => {
            let input0 = [
                i32::from(input[0]),
                i32::from(input[1]),
                i32::from(input[2]),
                i32::from(input[4]),
            ];
            rgb_scale_alpha_unpack(input0, input[5], input[3])
        }
        format::HDR_RGB_SCALE => {
            rgb_hdr = true;
            alpha_hdr_default = true;
            hdr_rgbo_unpack(&input[..4])
        }
        format::RGB => {
            let input0 = [
                i32::from(input[0]),
                i32::from(input[2]),
                i32::from(input[4]),
                0,
            ];
            let input1 = [
                i32::from(input[1]),
                i32::from(input[3]),
                i32::from(input[5]),
                0,
            ];
            rgb_unpack(input0, input1)
        }
        format::RGB_DELTA => {
            let input0 = [
                i32::from(input[0]),
                i32::from(input[2]),
                i32::from(input[4]),
                0,
            ];
            let input1 = [
                i32::from(input[1]),
                i32::from(input[3]),
                i32::from(input[5]),
                0,
            ];
            rgb_delta_unpack(input0, input1)
        }
        format::HDR_RGB => {
            rgb_hdr = true;
            alpha_hdr_default = true;
            hdr_rgb_unpack(&input[..6])
        }
        format::RGBA => {
            let input0 = [
                i32::from(input[0]),
                i32::from(input[2]),
                i32::from(input[4]),
                i32::from(input[6]),
            ];
            let input1 = [
                i32::from(input[1]),
                i32::from(input[3]),
                i32::from(input[5]),
                i32::from(input[7]),
            ];
            rgba_unpack(input0, input1)
        }
        format::RGBA_DELTA => {
            let input0 = [
                i32::from(input[0]),
                i32::from(input[2]),
                i32::from(input[4]),
                i32::from(input[6]),
            ];
            let input1 = [
                i32::from(input[1]),
                i32::from(input[3]),
                i32::from(input[5]),
                i32::from(input[7]),
            ];
            rgba_delta_unpack(input0, input1)
        }
        format::HDR_RGB_LDR_ALPHA => {
            rgb_hdr = true;
            let (mut o0, mut o1) = hdr_rgb_unpack(&input[..6]);
            o0[3] = i32::from(input[6]);
            o1[3] = i32::from(input[7]);
            (o0, o1)
        }
        format::HDR_RGBA => {
            rgb_hdr = true;
            alpha_hdr = true;
            let (mut o0, mut o1) = hdr_rgb_unpack(&input[..6]);
            let (a0, a1) = hdr_alpha_unpack(&input[6..8]);
            o0[3] = a0;
            o1[3] = a1;
            (o0, o1)
        }
        _ => {
            return UnpackedEndpoints {
                rgb_hdr: false,
                alpha_hdr: false,
                endpoint0: ERROR_COLOR,
                endpoint1: ERROR_COLOR,
            };
        }
    };

    if alpha_hdr_default {
        if profile == Profile::Hdr {
            output0[3] = 0x7800;
            output1[3] = 0x7800;
            alpha_hdr = true;
        } else {
            output0[3] = 0x00FF;
            output1[3] = 0x00FF;
            alpha_hdr = false;
        }
    }

    match profile {
        Profile::Ldr => {
            if rgb_hdr || alpha_hdr {
                output0 = ERROR_COLOR;
                output1 = ERROR_COLOR;
                rgb_hdr = false;
                alpha_hdr = false;
            }
            for i in 0..4 {
                output0[i] *= 257;
                output1[i] *= 257;
            }
        }
        Profile::LdrSrgb => {
            if rgb_hdr || alpha_hdr {
                output0 = ERROR_COLOR;
                output1 = ERROR_COLOR;
                rgb_hdr = false;
                alpha_hdr = false;
            }
            for i in 0..4 {
                output0[i] = (output0[i] << 8) | 0x80;
                output1[i] = (output1[i] << 8) | 0x80;
            }
        }
        Profile::HdrRgbLdrAlpha | Profile::Hdr => {
            // HDR decode profile, but individual channels may still be LDR.
            for i in 0..4 {
                let hdr = if i < 3 { rgb_hdr } else { alpha_hdr };
                if !hdr {
                    output0[i] *= 257;
                    output1[i] *= 257;
                }
            }
        }
    }

    UnpackedEndpoints {
        rgb_hdr,
        alpha_hdr,
        endpoint0: output0,
        endpoint1: output1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn luminance_expands_to_grayscale() {
        let e = unpack_color_endpoints(Profile::Ldr, format::LUMINANCE, &[10, 200]);
        assert_eq!(e.endpoint0, [10 * 257, 10 * 257, 10 * 257, 255 * 257]);
        assert_eq!(e.endpoint1, [200 * 257, 200 * 257, 200 * 257, 255 * 257]);
        assert!(!e.rgb_hdr && !e.alpha_hdr);
    }

    #[test]
    fn rgba_swaps_endpoints_when_first_is_brighter() {
        // Sum of endpoint 0 RGB exceeds endpoint 1, triggering the
        // blue-contraction swap.
        let e = unpack_color_endpoints(
            Profile::Ldr,
            format::RGBA,
            &[200, 10, 200, 10, 100, 10, 255, 255],
        );
        // input0 = (200,200,100,255), input1 = (10,10,10,255); swap applies
        // uncontraction first: in0 -> (150,150,100), in1 -> (10,10,10).
        assert_eq!(e.endpoint0, [10 * 257, 10 * 257, 10 * 257, 255 * 257]);
        assert_eq!(e.endpoint1, [150 * 257, 150 * 257, 100 * 257, 255 * 257]);
    }

    #[test]
    fn rgb_scale_derives_low_endpoint() {
        let e = unpack_color_endpoints(Profile::Ldr, format::RGB_SCALE, &[200, 100, 40, 128]);
        assert_eq!(e.endpoint1, [200 * 257, 100 * 257, 40 * 257, 255 * 257]);
        assert_eq!(e.endpoint0, [100 * 257, 50 * 257, 20 * 257, 255 * 257]);
    }

    #[test]
    fn luminance_delta_caps_at_white() {
        let e = unpack_color_endpoints(Profile::Ldr, format::LUMINANCE_DELTA, &[0xFF, 0xFF]);
        // l0 = 0xFF, delta 0x3F clamps l1 to 255.
        assert_eq!(e.endpoint0[0], 255 * 257);
        assert_eq!(e.endpoint1[0], 255 * 257);
    }

    #[rstest]
    #[case(format::HDR_RGB)]
    #[case(format::HDR_RGB_SCALE)]
    #[case(format::HDR_LUMINANCE_SMALL_RANGE)]
    #[case(format::HDR_RGBA)]
    fn hdr_formats_error_in_ldr_profile(#[case] fmt: u8) {
        let e = unpack_color_endpoints(Profile::Ldr, fmt, &[0; 8]);
        assert_eq!(e.endpoint0, [0xFF * 257, 0, 0xFF * 257, 0xFF * 257]);
        assert_eq!(e.endpoint1, e.endpoint0);
    }

    #[test]
    fn srgb_expansion_sets_low_bits() {
        let e = unpack_color_endpoints(Profile::LdrSrgb, format::LUMINANCE, &[1, 2]);
        assert_eq!(e.endpoint0[0], (1 << 8) | 0x80);
        assert_eq!(e.endpoint1[0], (2 << 8) | 0x80);
    }

    #[test]
    fn hdr_profile_marks_alpha_hdr_by_format() {
        let e = unpack_color_endpoints(Profile::Hdr, format::HDR_RGB, &[0; 8]);
        assert!(e.rgb_hdr);
        assert!(e.alpha_hdr);
        assert_eq!(e.endpoint0[3], 0x7800);

        let e = unpack_color_endpoints(Profile::HdrRgbLdrAlpha, format::HDR_RGB, &[0; 8]);
        assert!(e.rgb_hdr);
        assert!(!e.alpha_hdr);
        assert_eq!(e.endpoint0[3], 0x00FF * 257);
    }

    #[test]
    fn unknown_format_is_an_error_color() {
        let e = unpack_color_endpoints(Profile::Hdr, 16, &[0; 8]);
        assert_eq!(e.endpoint0, [0xFF, 0x00, 0xFF, 0xFF]);
    }
}
