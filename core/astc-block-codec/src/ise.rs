//! Bounded integer sequence encoding.
//!
//! Sequences of small integers are packed as plain bits plus optional base-3
//! (trit) or base-5 (quint) digits. Trits travel in groups of five sharing an
//! 8-bit packed value, quints in groups of three sharing a 7-bit packed value,
//! interleaved with the low bits of each element so that truncated streams
//! stay decodable.

use crate::bitio::{read_bits128, write_bits};
use crate::quant::{QuantMethod, BTQ_COUNTS};
use crate::BLOCK_BYTES;

const fn trits_of(t: usize) -> [u8; 5] {
    let c;
    let t4;
    let t3;
    if (t >> 2) & 0x7 == 0x7 {
        c = (((t >> 5) & 0x7) << 2) | (t & 0x3);
        t4 = 2;
        t3 = 2;
    } else {
        c = t & 0x1F;
        if (t >> 5) & 0x3 == 0x3 {
            t4 = 2;
            t3 = (t >> 7) & 1;
        } else {
            t4 = (t >> 7) & 1;
            t3 = (t >> 5) & 0x3;
        }
    }

    let t2;
    let t1;
    let t0;
    if c & 0x3 == 0x3 {
        t2 = 2;
        t1 = (c >> 4) & 1;
        let b3 = (c >> 3) & 1;
        let b2 = (c >> 2) & 1;
        t0 = (b3 << 1) | (b2 & (1 - b3));
    } else if (c >> 2) & 0x3 == 0x3 {
        t2 = 2;
        t1 = 2;
        t0 = c & 0x3;
    } else {
        t2 = (c >> 4) & 1;
        t1 = (c >> 2) & 0x3;
        let b1 = (c >> 1) & 1;
        let b0 = c & 1;
        t0 = (b1 << 1) | (b0 & (1 - b1));
    }

    [t0 as u8, t1 as u8, t2 as u8, t3 as u8, t4 as u8]
}

const fn quints_of(q: usize) -> [u8; 3] {
    let q2;
    let q1;
    let q0;
    if (q >> 1) & 0x3 == 0x3 && (q >> 5) & 0x3 == 0 {
        let b0 = q & 1;
        let b4 = (q >> 4) & 1;
        let b3 = (q >> 3) & 1;
        q2 = (b0 << 2) | ((b4 & (1 - b0)) << 1) | (b3 & (1 - b0));
        q1 = 4;
        q0 = 4;
    } else {
        let c;
        if (q >> 1) & 0x3 == 0x3 {
            q2 = 4;
            c = (((q >> 3) & 0x3) << 3) | ((!(q >> 5) & 0x3) << 1) | (q & 1);
        } else {
            q2 = (q >> 5) & 0x3;
            c = q & 0x1F;
        }
        if c & 0x7 == 0x5 {
            q1 = 4;
            q0 = (c >> 3) & 0x3;
        } else {
            q1 = (c >> 3) & 0x3;
            q0 = c & 0x7;
        }
    }
    [q0 as u8, q1 as u8, q2 as u8]
}

/// Five trit digits unpacked from each 8-bit packed value.
pub static TRITS_OF_INTEGER: [[u8; 5]; 256] = {
    let mut t = [[0u8; 5]; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = trits_of(i);
        i += 1;
    }
    t
};

/// Three quint digits unpacked from each 7-bit packed value.
pub static QUINTS_OF_INTEGER: [[u8; 3]; 128] = {
    let mut q = [[0u8; 3]; 128];
    let mut i = 0;
    while i < 128 {
        q[i] = quints_of(i);
        i += 1;
    }
    q
};

// Inverse tables for the encoder. Several packed values unpack to the same
// digit tuple; keeping the last scan hit gives a stable choice that decodes
// back to the same digits.
static INTEGER_OF_TRITS: [[[[[u8; 3]; 3]; 3]; 3]; 3] = {
    let mut inv = [[[[[0u8; 3]; 3]; 3]; 3]; 3];
    let mut packed = 0;
    while packed < 256 {
        let t = TRITS_OF_INTEGER[packed];
        inv[t[4] as usize][t[3] as usize][t[2] as usize][t[1] as usize][t[0] as usize] =
            packed as u8;
        packed += 1;
    }
    inv
};

static INTEGER_OF_QUINTS: [[[u8; 5]; 5]; 5] = {
    let mut inv = [[[0u8; 5]; 5]; 5];
    let mut packed = 0;
    while packed < 128 {
        let q = QUINTS_OF_INTEGER[packed];
        inv[q[2] as usize][q[1] as usize][q[0] as usize] = packed as u8;
        packed += 1;
    }
    inv
};

/// Decodes `count` sequence elements starting at `bit_offset` of a block.
///
/// Each output element is the scrambled value `(digit << bits) | low_bits`;
/// unscrambling and unquantization are the caller's concern.
pub fn decode_ise(
    q: QuantMethod,
    count: usize,
    block: &[u8; BLOCK_BYTES],
    bit_offset: usize,
    output: &mut [u8],
) {
    let lo = u64::from_le_bytes([
        block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7],
    ]);
    let hi = u64::from_le_bytes([
        block[8], block[9], block[10], block[11], block[12], block[13], block[14], block[15],
    ]);
    decode_ise_raw(q, count, lo, hi, bit_offset, output);
}

/// Decodes `count` sequence elements from a 128-bit payload given as two
/// little-endian 64-bit halves.
///
/// The weight stream decoder needs this form: weights are stored mirrored
/// from the top of the block, so it feeds in the bit-reversed halves.
pub fn decode_ise_raw(
    q: QuantMethod,
    count: usize,
    lo: u64,
    hi: u64,
    bit_offset: usize,
    output: &mut [u8],
) {
    debug_assert!(count > 0 && output.len() >= count);

    let btq = BTQ_COUNTS[q.index()];
    let bits = btq.bits as usize;

    if btq.trits {
        decode_trits(bits, count, lo, hi, bit_offset, output);
    } else if btq.quints {
        decode_quints(bits, count, lo, hi, bit_offset, output);
    } else {
        let mut bit = bit_offset;
        for out in output.iter_mut().take(count) {
            *out = read_bits128(bits, &mut bit, lo, hi) as u8;
        }
    }
}

fn decode_trits(bits: usize, count: usize, lo: u64, hi: u64, bit_offset: usize, output: &mut [u8]) {
    let mut bit = bit_offset;
    let shift = bits as u32;

    // Per-element trit chunk widths and packed-value shifts within a group.
    const T_BITS: [usize; 5] = [2, 2, 1, 2, 1];
    const T_SHIFT: [u32; 5] = [0, 2, 4, 5, 7];

    let mut i = 0;
    while i + 5 <= count {
        let mut base = [0u8; 5];
        let mut packed = 0usize;
        for j in 0..5 {
            if bits > 0 {
                base[j] = read_bits128(bits, &mut bit, lo, hi) as u8;
            }
            packed |= (read_bits128(T_BITS[j], &mut bit, lo, hi) as usize) << T_SHIFT[j];
        }
        let tv = TRITS_OF_INTEGER[packed];
        for j in 0..5 {
            output[i + j] = base[j] | (tv[j] << shift);
        }
        i += 5;
    }

    if i < count {
        let rem = count - i;
        let mut base = [0u8; 5];
        let mut packed = 0usize;
        for j in 0..rem {
            if bits > 0 {
                base[j] = read_bits128(bits, &mut bit, lo, hi) as u8;
            }
            packed |= (read_bits128(T_BITS[j], &mut bit, lo, hi) as usize) << T_SHIFT[j];
        }
        let tv = TRITS_OF_INTEGER[packed];
        for j in 0..rem {
            output[i + j] = base[j] | (tv[j] << shift);
        }
    }
}

fn decode_quints(bits: usize, count: usize, lo: u64, hi: u64, bit_offset: usize, output: &mut [u8]) {
    let mut bit = bit_offset;
    let shift = bits as u32;

    const Q_BITS: [usize; 3] = [3, 2, 2];
    const Q_SHIFT: [u32; 3] = [0, 3, 5];

    let mut i = 0;
    while i + 3 <= count {
        let mut base = [0u8; 3];
        let mut packed = 0usize;
        for j in 0..3 {
            if bits > 0 {
                base[j] = read_bits128(bits, &mut bit, lo, hi) as u8;
            }
            packed |= (read_bits128(Q_BITS[j], &mut bit, lo, hi) as usize) << Q_SHIFT[j];
        }
        let qv = QUINTS_OF_INTEGER[packed];
        for j in 0..3 {
            output[i + j] = base[j] | (qv[j] << shift);
        }
        i += 3;
    }

    if i < count {
        let rem = count - i;
        let mut base = [0u8; 3];
        let mut packed = 0usize;
        for j in 0..rem {
            if bits > 0 {
                base[j] = read_bits128(bits, &mut bit, lo, hi) as u8;
            }
            packed |= (read_bits128(Q_BITS[j], &mut bit, lo, hi) as usize) << Q_SHIFT[j];
        }
        let qv = QUINTS_OF_INTEGER[packed];
        for j in 0..rem {
            output[i + j] = base[j] | (qv[j] << shift);
        }
    }
}

/// Encodes `count` scrambled sequence elements into `output` at `bit_offset`.
///
/// Each input element must already be in scrambled form: low `bits` plain
/// bits with the trit or quint digit above them.
pub fn encode_ise(
    q: QuantMethod,
    count: usize,
    input: &[u8],
    output: &mut [u8],
    mut bit_offset: usize,
) {
    debug_assert!(count > 0 && input.len() >= count);

    let btq = BTQ_COUNTS[q.index()];
    let bits = btq.bits as usize;
    let mask = if bits == 0 { 0u8 } else { ((1u16 << bits) - 1) as u8 };

    if btq.trits {
        const T_BITS: [usize; 5] = [2, 2, 1, 2, 1];
        const T_SHIFT: [u32; 5] = [0, 2, 4, 5, 7];

        let mut i = 0;
        while i + 5 <= count {
            let packed = INTEGER_OF_TRITS[(input[i + 4] >> bits) as usize]
                [(input[i + 3] >> bits) as usize][(input[i + 2] >> bits) as usize]
                [(input[i + 1] >> bits) as usize][(input[i] >> bits) as usize];
            for j in 0..5 {
                let chunk = (packed >> T_SHIFT[j]) & ((1 << T_BITS[j]) - 1);
                let pack = (input[i + j] & mask) | (chunk << bits);
                write_bits(output, bits + T_BITS[j], bit_offset, pack as u32);
                bit_offset += bits + T_BITS[j];
            }
            i += 5;
        }

        if i < count {
            let mut digits = [0u8; 5];
            for j in 0..(count - i) {
                digits[j] = input[i + j] >> bits;
            }
            let packed = INTEGER_OF_TRITS[digits[4] as usize][digits[3] as usize]
                [digits[2] as usize][digits[1] as usize][digits[0] as usize];
            for j in 0..(count - i) {
                let chunk = (packed >> T_SHIFT[j]) & ((1 << T_BITS[j]) - 1);
                let pack = (input[i + j] & mask) | (chunk << bits);
                write_bits(output, bits + T_BITS[j], bit_offset, pack as u32);
                bit_offset += bits + T_BITS[j];
            }
        }
        return;
    }

    if btq.quints {
        const Q_BITS: [usize; 3] = [3, 2, 2];
        const Q_SHIFT: [u32; 3] = [0, 3, 5];

        let mut i = 0;
        while i + 3 <= count {
            let packed = INTEGER_OF_QUINTS[(input[i + 2] >> bits) as usize]
                [(input[i + 1] >> bits) as usize][(input[i] >> bits) as usize];
            for j in 0..3 {
                let chunk = (packed >> Q_SHIFT[j]) & ((1 << Q_BITS[j]) - 1);
                let pack = (input[i + j] & mask) | (chunk << bits);
                write_bits(output, bits + Q_BITS[j], bit_offset, pack as u32);
                bit_offset += bits + Q_BITS[j];
            }
            i += 3;
        }

        if i < count {
            let mut digits = [0u8; 3];
            for j in 0..(count - i) {
                digits[j] = input[i + j] >> bits;
            }
            let packed =
                INTEGER_OF_QUINTS[digits[2] as usize][digits[1] as usize][digits[0] as usize];
            for j in 0..(count - i) {
                let chunk = (packed >> Q_SHIFT[j]) & ((1 << Q_BITS[j]) - 1);
                let pack = (input[i + j] & mask) | (chunk << bits);
                write_bits(output, bits + Q_BITS[j], bit_offset, pack as u32);
                bit_offset += bits + Q_BITS[j];
            }
        }
        return;
    }

    for &v in input.iter().take(count) {
        write_bits(output, bits, bit_offset, v as u32);
        bit_offset += bits;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn trit_table_covers_every_tuple() {
        let mut seen = [false; 243];
        for t in TRITS_OF_INTEGER {
            let mut key = 0usize;
            for d in t {
                assert!(d < 3);
                key = key * 3 + d as usize;
            }
            seen[key] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn quint_table_covers_every_tuple() {
        let mut seen = [false; 125];
        for q in QUINTS_OF_INTEGER {
            let mut key = 0usize;
            for d in q {
                assert!(d < 5);
                key = key * 5 + d as usize;
            }
            seen[key] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    fn round_trip(q: QuantMethod, values: &[u8]) {
        let mut block = [0u8; BLOCK_BYTES];
        encode_ise(q, values.len(), values, &mut block, 0);

        let mut decoded = [0u8; 32];
        decode_ise(q, values.len(), &block, 0, &mut decoded);
        assert_eq!(&decoded[..values.len()], values, "mode {q:?}");
    }

    #[rstest]
    #[case(QuantMethod::Quant2, &[1, 0, 1, 1, 0, 0, 1][..])]
    #[case(QuantMethod::Quant16, &[15, 0, 7, 8, 3][..])]
    #[case(QuantMethod::Quant256, &[0, 255, 128, 1][..])]
    fn bits_only_round_trip(#[case] q: QuantMethod, #[case] values: &[u8]) {
        round_trip(q, values);
    }

    #[rstest]
    #[case(&[0, 1, 2, 2, 0][..])] // one full group
    #[case(&[2, 2, 2, 2, 2, 1, 0][..])] // full group plus tail
    #[case(&[1, 2][..])] // tail only
    fn trit_round_trip(#[case] values: &[u8]) {
        round_trip(QuantMethod::Quant3, values);
    }

    #[test]
    fn trit_with_bits_round_trip() {
        // quant48 packs four plain bits under each trit.
        round_trip(QuantMethod::Quant48, &[47, 0, 33, 16, 8, 25]);
    }

    #[rstest]
    #[case(&[4, 0, 3][..])]
    #[case(&[4, 4, 4, 2, 1][..])]
    #[case(&[3][..])]
    fn quint_round_trip(#[case] values: &[u8]) {
        round_trip(QuantMethod::Quant5, values);
    }

    #[test]
    fn quint_with_bits_round_trip() {
        // quant80 packs four plain bits under each quint.
        round_trip(QuantMethod::Quant80, &[79, 0, 40, 17]);
    }

    #[test]
    fn sequences_at_nonzero_offsets_do_not_disturb_neighbors() {
        let values = [2u8, 0, 1, 1, 2, 0];
        let mut block = [0u8; BLOCK_BYTES];
        block[0] = 0xAB;
        encode_ise(QuantMethod::Quant3, values.len(), &values, &mut block, 17);

        let mut decoded = [0u8; 8];
        decode_ise(QuantMethod::Quant3, values.len(), &block, 17, &mut decoded);
        assert_eq!(&decoded[..6], &values);
        assert_eq!(block[0], 0xAB);
    }
}
