//! Weight quantization transfer tables.
//!
//! Weight streams only use quant2 through quant32. Each table row is indexed
//! by [`QuantMethod::index`]; rows beyond quant32 do not exist.

use crate::quant::QuantMethod;

/// Number of quantization modes usable for weights (quant2..quant32).
pub const WEIGHT_QUANT_COUNT: usize = 12;

/// Highest quantization mode a weight stream may use.
pub const WEIGHT_QUANT_MAX: QuantMethod = QuantMethod::Quant32;

/// Unquantized weight (0..=64) for each quantization level, in level order.
pub static WEIGHT_QUANT_TO_UNQUANT: [[u8; 32]; WEIGHT_QUANT_COUNT] = {
    let mut t = [[0u8; 32]; WEIGHT_QUANT_COUNT];
    t[0] = pad(&[0, 64]);
    t[1] = pad(&[0, 32, 64]);
    t[2] = pad(&[0, 21, 43, 64]);
    t[3] = pad(&[0, 16, 32, 48, 64]);
    t[4] = pad(&[0, 12, 25, 39, 52, 64]);
    t[5] = pad(&[0, 9, 18, 27, 37, 46, 55, 64]);
    t[6] = pad(&[0, 7, 14, 21, 28, 36, 43, 50, 57, 64]);
    t[7] = pad(&[0, 5, 11, 17, 23, 28, 36, 41, 47, 53, 59, 64]);
    t[8] = pad(&[0, 4, 8, 12, 17, 21, 25, 29, 35, 39, 43, 47, 52, 56, 60, 64]);
    t[9] = pad(&[
        0, 3, 6, 9, 13, 16, 19, 23, 26, 29, 35, 38, 41, 45, 48, 51, 55, 58, 61, 64,
    ]);
    t[10] = pad(&[
        0, 2, 5, 8, 11, 13, 16, 19, 22, 24, 27, 30, 34, 37, 40, 42, 45, 48, 51, 53, 56, 59, 62, 64,
    ]);
    t[11] = [
        0, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 26, 28, 30, 34, 36, 38, 40, 42, 44, 46, 48,
        50, 52, 54, 56, 58, 60, 62, 64,
    ];
    t
};

/// Scrambled ISE symbol stored for each quantization level, in level order.
pub static WEIGHT_SCRAMBLE_MAP: [[u8; 32]; WEIGHT_QUANT_COUNT] = {
    let mut t = [[0u8; 32]; WEIGHT_QUANT_COUNT];
    t[0] = pad(&[0, 1]);
    t[1] = pad(&[0, 1, 2]);
    t[2] = pad(&[0, 1, 2, 3]);
    t[3] = pad(&[0, 1, 2, 3, 4]);
    t[4] = pad(&[0, 2, 4, 5, 3, 1]);
    t[5] = pad(&[0, 1, 2, 3, 4, 5, 6, 7]);
    t[6] = pad(&[0, 2, 4, 6, 8, 9, 7, 5, 3, 1]);
    t[7] = pad(&[0, 4, 8, 2, 6, 10, 11, 7, 3, 9, 5, 1]);
    t[8] = pad(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    t[9] = pad(&[
        0, 4, 8, 12, 16, 2, 6, 10, 14, 18, 19, 15, 11, 7, 3, 17, 13, 9, 5, 1,
    ]);
    t[10] = pad(&[
        0, 8, 16, 2, 10, 18, 4, 12, 20, 6, 14, 22, 23, 15, 7, 21, 13, 5, 19, 11, 3, 17, 9, 1,
    ]);
    t[11] = [
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31,
    ];
    t
};

/// Unquantized weight (0..=64) indexed by scrambled ISE symbol.
pub static WEIGHT_UNSCRAMBLE_AND_UNQUANT_MAP: [[u8; 32]; WEIGHT_QUANT_COUNT] = {
    let mut t = [[0u8; 32]; WEIGHT_QUANT_COUNT];
    let mut q = 0;
    while q < WEIGHT_QUANT_COUNT {
        let levels = QuantMethod::ALL[q].levels();
        let mut i = 0;
        while i < levels {
            let scr = WEIGHT_SCRAMBLE_MAP[q][i] as usize;
            t[q][scr] = WEIGHT_QUANT_TO_UNQUANT[q][i];
            i += 1;
        }
        q += 1;
    }
    t
};

const fn pad(src: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < src.len() {
        out[i] = src[i];
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(QuantMethod::Quant2)]
    #[case(QuantMethod::Quant6)]
    #[case(QuantMethod::Quant12)]
    #[case(QuantMethod::Quant32)]
    fn scramble_map_is_a_permutation(#[case] q: QuantMethod) {
        let levels = q.levels();
        let mut seen = [false; 32];
        for i in 0..levels {
            let scr = WEIGHT_SCRAMBLE_MAP[q.index()][i] as usize;
            assert!(scr < levels);
            assert!(!seen[scr]);
            seen[scr] = true;
        }
    }

    #[test]
    fn unscramble_map_inverts_the_scramble() {
        for q in 0..WEIGHT_QUANT_COUNT {
            let levels = QuantMethod::ALL[q].levels();
            for i in 0..levels {
                let scr = WEIGHT_SCRAMBLE_MAP[q][i] as usize;
                assert_eq!(
                    WEIGHT_UNSCRAMBLE_AND_UNQUANT_MAP[q][scr],
                    WEIGHT_QUANT_TO_UNQUANT[q][i]
                );
            }
        }
    }

    #[test]
    fn unquant_rows_span_zero_to_sixtyfour() {
        for q in 0..WEIGHT_QUANT_COUNT {
            let levels = QuantMethod::ALL[q].levels();
            let row = &WEIGHT_QUANT_TO_UNQUANT[q];
            assert_eq!(row[0], 0);
            assert_eq!(row[levels - 1], 64);
            for i in 1..levels {
                assert!(row[i] > row[i - 1]);
            }
        }
    }
}
