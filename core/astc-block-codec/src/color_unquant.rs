//! Endpoint color unquantization tables.
//!
//! Color endpoints use quant6 through quant256. Each table maps a scrambled
//! ISE symbol straight to its unquantized 8-bit value, folding the symbol
//! unscramble and the quantization transfer function into one lookup.

use crate::quant::{QuantMethod, BTQ_COUNTS};

/// Lowest quantization mode usable for color endpoints.
pub const COLOR_QUANT_MIN: QuantMethod = QuantMethod::Quant6;

/// Number of quantization modes usable for color endpoints.
pub const COLOR_QUANT_COUNT: usize =
    QuantMethod::Quant256 as usize - QuantMethod::Quant6 as usize + 1;

const fn bit_replicate(s: u32, bits: u32) -> u32 {
    let mut v = s << (8 - bits);
    let mut shift = bits;
    while shift < 8 {
        v |= v >> shift;
        shift += bits;
    }
    v & 0xFF
}

pub(crate) const fn unquant_color(q: usize, symbol: u32) -> u8 {
    let btq = BTQ_COUNTS[q];
    let bits = btq.bits as u32;

    if !btq.trits && !btq.quints {
        return bit_replicate(symbol, bits) as u8;
    }

    let digit = symbol >> bits;
    let m = symbol & ((1 << bits) - 1);

    let a = if m & 1 != 0 { 0x1FF } else { 0 };
    let b1 = (m >> 1) & 1;
    let b2 = (m >> 2) & 1;
    let b3 = (m >> 3) & 1;
    let b4 = (m >> 4) & 1;

    let (c, b) = if btq.trits {
        match bits {
            1 => (204, 0),
            2 => (93, b1 * 0x116),
            3 => (44, b2 * 0x10A + b1 * 0x85),
            4 => (22, b3 * 0x104 + b2 * 0x82 + b1 * 0x41),
            _ => (11, b4 * 0x102 + b3 * 0x81 + b2 * 0x40 + b1 * 0x20),
        }
    } else {
        match bits {
            1 => (113, 0),
            2 => (54, b1 * 0x10C),
            3 => (26, b2 * 0x105 + b1 * 0x82),
            _ => (13, b3 * 0x102 + b2 * 0x81 + b1 * 0x40),
        }
    };

    let t = (digit * c + b) ^ a;
    ((a & 0x80) | (t >> 2)) as u8
}

static COLOR_UNQUANT: [[u8; 256]; COLOR_QUANT_COUNT] = {
    let mut tables = [[0u8; 256]; COLOR_QUANT_COUNT];
    let mut qi = 0;
    while qi < COLOR_QUANT_COUNT {
        let q = QuantMethod::Quant6 as usize + qi;
        let levels = QuantMethod::ALL[q].levels();
        let mut s = 0;
        while s < levels {
            tables[qi][s] = unquant_color(q, s as u32);
            s += 1;
        }
        qi += 1;
    }
    tables
};

/// Unquantization table for a color quantization mode, indexed by scrambled
/// ISE symbol. Returns `None` below quant6.
#[inline]
pub fn color_unquant_table(q: QuantMethod) -> Option<&'static [u8]> {
    if q < COLOR_QUANT_MIN {
        return None;
    }
    let qi = q.index() - COLOR_QUANT_MIN.index();
    Some(&COLOR_UNQUANT[qi][..q.levels()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn quant6_table() {
        let t = color_unquant_table(QuantMethod::Quant6).unwrap();
        assert_eq!(t, &[0, 255, 51, 204, 102, 153]);
    }

    #[test]
    fn quant12_value_set() {
        let mut v: Vec<u8> = color_unquant_table(QuantMethod::Quant12).unwrap().to_vec();
        v.sort_unstable();
        assert_eq!(
            v,
            &[0, 23, 46, 69, 92, 116, 139, 163, 186, 209, 232, 255]
        );
    }

    #[test]
    fn bits_only_modes_replicate_bits() {
        let t16 = color_unquant_table(QuantMethod::Quant16).unwrap();
        for (s, &v) in t16.iter().enumerate() {
            assert_eq!(v as usize, s * 17);
        }
        let t256 = color_unquant_table(QuantMethod::Quant256).unwrap();
        for (s, &v) in t256.iter().enumerate() {
            assert_eq!(v as usize, s);
        }
    }

    #[test]
    fn every_table_is_symmetric_around_midpoint() {
        for q in QuantMethod::ALL {
            let Some(t) = color_unquant_table(q) else {
                continue;
            };
            let mut v: Vec<u8> = t.to_vec();
            v.sort_unstable();
            assert_eq!(v[0], 0);
            assert_eq!(*v.last().unwrap(), 255);
            for i in 0..v.len() {
                assert_eq!(v[i], 255 - v[v.len() - 1 - i]);
            }
        }
    }

    #[test]
    fn modes_below_quant6_have_no_table() {
        assert!(color_unquant_table(QuantMethod::Quant5).is_none());
        assert!(color_unquant_table(QuantMethod::Quant2).is_none());
    }
}
