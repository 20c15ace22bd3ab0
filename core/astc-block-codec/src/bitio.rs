//! Little-endian bit field access for 16 byte block payloads.
//!
//! All fields are LSB-first: bit 0 is the least significant bit of byte 0.

/// Reads `count` bits (at most 16) starting at `bit_offset`.
#[inline]
pub fn read_bits(data: &[u8], count: usize, bit_offset: usize) -> u32 {
    debug_assert!(count <= 16);
    if count == 0 {
        return 0;
    }
    let mask = (1u32 << count) - 1;
    let byte = bit_offset >> 3;
    let shift = bit_offset & 7;

    let mut v = 0u32;
    let mut i = 0;
    while i < 3 && byte + i < data.len() {
        v |= (data[byte + i] as u32) << (8 * i);
        i += 1;
    }
    (v >> shift) & mask
}

/// Reads `count` bits (at most 16) from a 128-bit value held as two
/// little-endian 64-bit halves, advancing `bit`.
#[inline]
pub fn read_bits128(count: usize, bit: &mut usize, lo: u64, hi: u64) -> u64 {
    debug_assert!(count <= 16);
    let mask = (1u64 << count) - 1;
    let b = *bit;
    let v = if b < 64 {
        // The shift into hi is safe because b < 64 here; b == 0 would
        // overshift hi but its bits are then masked away via lo.
        (lo >> b) | if b == 0 { 0 } else { hi << (64 - b) }
    } else {
        hi >> (b - 64)
    };
    *bit = b + count;
    v & mask
}

/// Writes the low `count` bits (at most 16) of `value` at `bit_offset`.
///
/// Bits outside the field are preserved.
#[inline]
pub fn write_bits(data: &mut [u8], count: usize, bit_offset: usize, value: u32) {
    debug_assert!(count <= 16);
    if count == 0 {
        return;
    }
    let mut mask = (1u32 << count) - 1;
    let mut value = value & mask;

    let byte = bit_offset >> 3;
    let shift = bit_offset & 7;
    value <<= shift;
    mask <<= shift;

    let mut i = 0;
    while i < 3 && byte + i < data.len() {
        let m = (mask >> (8 * i)) as u8;
        if m != 0 {
            data[byte + i] = (data[byte + i] & !m) | (value >> (8 * i)) as u8;
        }
        i += 1;
    }
}

/// Reads the single bit at `bit_index`.
#[inline]
pub fn bit_at(data: &[u8], bit_index: usize) -> u8 {
    (data[bit_index >> 3] >> (bit_index & 7)) & 1
}

/// Sets the single bit at `bit_index`.
#[inline]
pub fn set_bit(data: &mut [u8], bit_index: usize) {
    data[bit_index >> 3] |= 1 << (bit_index & 7);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn read_write_round_trip() {
        let mut block = [0u8; 16];
        write_bits(&mut block, 11, 0, 0x5A3);
        write_bits(&mut block, 2, 11, 0b10);
        write_bits(&mut block, 10, 13, 0x2BC);
        assert_eq!(read_bits(&block, 11, 0), 0x5A3);
        assert_eq!(read_bits(&block, 2, 11), 0b10);
        assert_eq!(read_bits(&block, 10, 13), 0x2BC);
    }

    #[test]
    fn write_preserves_neighbors() {
        let mut block = [0xFFu8; 16];
        write_bits(&mut block, 5, 6, 0);
        assert_eq!(read_bits(&block, 6, 0), 0x3F);
        assert_eq!(read_bits(&block, 5, 6), 0);
        assert_eq!(read_bits(&block, 8, 11), 0xFF);
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(60)]
    #[case(64)]
    #[case(100)]
    fn bits128_matches_byte_reads(#[case] offset: usize) {
        let mut block = [0u8; 16];
        for (i, b) in block.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(0x3B).wrapping_add(0x17);
        }
        let lo = u64::from_le_bytes(block[0..8].try_into().unwrap());
        let hi = u64::from_le_bytes(block[8..16].try_into().unwrap());

        let mut bit = offset;
        let got = read_bits128(13, &mut bit, lo, hi);
        assert_eq!(bit, offset + 13);
        assert_eq!(got as u32, read_bits(&block, 13, offset));
    }

    #[test]
    fn single_bit_access() {
        let mut block = [0u8; 16];
        set_bit(&mut block, 127);
        set_bit(&mut block, 0);
        assert_eq!(bit_at(&block, 127), 1);
        assert_eq!(bit_at(&block, 0), 1);
        assert_eq!(bit_at(&block, 64), 0);
        assert_eq!(block[15], 0x80);
    }
}
