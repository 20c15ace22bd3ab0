//! Scalar value conversions between the storage formats the codec touches.

use half::f16;

/// Converts a UNORM16 endpoint value to an FP16 bit pattern mapping
/// `0xFFFF` exactly to 1.0.
pub fn unorm16_to_sf16(p: u16) -> u16 {
    if p == 0xFFFF {
        return 0x3C00; // FP16 1.0
    }
    if p < 4 {
        // Small values are exact as FP16 subnormals after this shift.
        return p << 8;
    }

    let lz = (u32::from(p).leading_zeros() as i32 - 16).clamp(0, 32);

    let mut p32 = u32::from(p) << (lz + 1);
    p32 &= 0xFFFF;
    p32 >>= 6;

    let exp = (14 - lz) as u32;
    (p32 | (exp << 10)) as u16
}

/// Converts a linear float into the 16-bit logarithmic code space used by
/// HDR endpoints. Negative values, NaN and underflow map to 0; values at or
/// above 65536 saturate.
pub fn float_to_lns(v: f32) -> u16 {
    if !(v > 1.0 / 67108864.0) {
        return 0;
    }
    if v >= 65536.0 {
        return 0xFFFF;
    }

    let (mant, exp) = libm::frexpf(v);
    let (mut a, exp) = if exp < -13 {
        (v * 33554432.0, 0)
    } else {
        ((mant - 0.5) * 4096.0, exp + 14)
    };

    if a < 384.0 {
        a *= 4.0 / 3.0;
    } else if a <= 1408.0 {
        a += 128.0;
    } else {
        a = (a + 512.0) * (4.0 / 5.0);
    }

    a = a + (exp as f32) * 2048.0 + 1.0;
    if a <= 0.0 {
        0
    } else if a >= 65535.0 {
        0xFFFF
    } else {
        (a + 0.5) as u16
    }
}

/// Converts a 16-bit logarithmic-encoded HDR value to an FP16 bit pattern.
pub fn lns_to_sf16(p: u16) -> u16 {
    let mc = (p & 0x7FF) as i32;
    let ec = (p >> 11) as i32;

    let mt = if mc < 512 {
        mc * 3
    } else if mc < 1536 {
        mc * 4 - 512
    } else {
        mc * 5 - 2048
    };

    let res = (ec << 10) | (mt >> 3);
    res.min(0x7BFF) as u16
}

/// Rounds a UNORM16 value to UNORM8. Values written with 8-to-16 bit
/// replication map back to the original byte.
#[inline]
pub fn unorm16_to_unorm8(v: u16) -> u8 {
    ((u32::from(v) + 128) / 257) as u8
}

/// Clamps a float into [0, 1] and rounds to UNORM8; NaN maps to zero.
pub fn float01_to_unorm8(v: f32) -> u8 {
    if !(v > 0.0) {
        return 0;
    }
    if v >= 1.0 {
        return 255;
    }
    (v * 255.0 + 0.5) as u8
}

/// Converts an FP16 bit pattern to f32.
#[inline]
pub fn half_to_f32(h: u16) -> f32 {
    f16::from_bits(h).to_f32()
}

/// Converts an f32 to an FP16 bit pattern with round-to-nearest-even.
#[inline]
pub fn f32_to_half(f: f32) -> u16 {
    f16::from_f32(f).to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x0000, 0x0000)]
    #[case(0xFFFF, 0x3C00)] // exactly 1.0
    #[case(0x0001, 0x0100)]
    #[case(0x8000, 0x3800)] // 0.5
    fn unorm16_to_fp16_fixed_points(#[case] input: u16, #[case] expected: u16) {
        assert_eq!(unorm16_to_sf16(input), expected);
    }

    #[test]
    fn unorm16_to_fp16_is_monotonic() {
        let mut prev = half_to_f32(unorm16_to_sf16(0));
        for v in (1..=0xFFFFu32).step_by(19) {
            let cur = half_to_f32(unorm16_to_sf16(v as u16));
            assert!(cur >= prev, "decreased at {v}");
            prev = cur;
        }
    }

    #[test]
    fn lns_round_trip_stays_close() {
        // Encode then decode through FP16; the result must track the input
        // within LNS precision across the HDR range.
        for &v in &[0.001f32, 0.06, 0.25, 1.0, 4.0, 77.5, 1024.0, 60000.0] {
            let code = float_to_lns(v);
            let back = half_to_f32(lns_to_sf16(code));
            assert!((back - v).abs() <= v * 0.01, "{v} -> {back}");
        }
        assert_eq!(float_to_lns(-2.0), 0);
        assert_eq!(float_to_lns(f32::NAN), 0);
        assert_eq!(float_to_lns(1e9), 0xFFFF);
    }

    #[test]
    fn lns_codes_are_monotonic() {
        let mut prev = 0u16;
        for i in 0..=1000 {
            let v = (i as f32) * 60.0;
            let code = float_to_lns(v);
            assert!(code >= prev);
            prev = code;
        }
    }

    #[test]
    fn lns_output_is_clamped_below_infinity() {
        for p in (0..=0xFFFFu32).step_by(7) {
            let sf = lns_to_sf16(p as u16);
            assert!(sf <= 0x7BFF);
        }
        assert_eq!(lns_to_sf16(0xFFFF), 0x7BFF);
    }

    #[test]
    fn replicated_bytes_round_trip() {
        for v in 0..=255u16 {
            assert_eq!(unorm16_to_unorm8(v * 257), v as u8);
        }
    }

    #[rstest]
    #[case(f32::NAN, 0)]
    #[case(-0.5, 0)]
    #[case(0.0, 0)]
    #[case(1.0, 255)]
    #[case(2.0, 255)]
    #[case(0.5, 128)]
    fn float01_clamps(#[case] v: f32, #[case] expected: u8) {
        assert_eq!(float01_to_unorm8(v), expected);
    }
}
