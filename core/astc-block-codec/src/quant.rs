//! Integer sequence quantization modes.

/// An ASTC integer sequence quantization mode.
///
/// The numeric values are specified by the ASTC format and must not be
/// reordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum QuantMethod {
    #[default]
    Quant2 = 0,
    Quant3 = 1,
    Quant4 = 2,
    Quant5 = 3,
    Quant6 = 4,
    Quant8 = 5,
    Quant10 = 6,
    Quant12 = 7,
    Quant16 = 8,
    Quant20 = 9,
    Quant24 = 10,
    Quant32 = 11,
    Quant40 = 12,
    Quant48 = 13,
    Quant64 = 14,
    Quant80 = 15,
    Quant96 = 16,
    Quant128 = 17,
    Quant160 = 18,
    Quant192 = 19,
    Quant256 = 20,
}

/// Number of defined quantization modes.
pub const QUANT_METHOD_COUNT: usize = 21;

impl QuantMethod {
    /// All modes in numeric order.
    pub const ALL: [QuantMethod; QUANT_METHOD_COUNT] = [
        QuantMethod::Quant2,
        QuantMethod::Quant3,
        QuantMethod::Quant4,
        QuantMethod::Quant5,
        QuantMethod::Quant6,
        QuantMethod::Quant8,
        QuantMethod::Quant10,
        QuantMethod::Quant12,
        QuantMethod::Quant16,
        QuantMethod::Quant20,
        QuantMethod::Quant24,
        QuantMethod::Quant32,
        QuantMethod::Quant40,
        QuantMethod::Quant48,
        QuantMethod::Quant64,
        QuantMethod::Quant80,
        QuantMethod::Quant96,
        QuantMethod::Quant128,
        QuantMethod::Quant160,
        QuantMethod::Quant192,
        QuantMethod::Quant256,
    ];

    /// The mode's numeric value as a table index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks a mode up by its numeric value.
    #[inline]
    pub const fn from_index(index: usize) -> Option<QuantMethod> {
        if index < QUANT_METHOD_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Number of representable levels for this mode.
    #[inline]
    pub const fn levels(self) -> usize {
        [
            2, 3, 4, 5, 6, 8, 10, 12, 16, 20, 24, 32, 40, 48, 64, 80, 96, 128, 160, 192, 256,
        ][self as usize]
    }
}

/// Element packing for one quantization mode: low bit count plus whether a
/// trit or quint rides on top.
#[derive(Clone, Copy, Debug)]
pub struct BtqCount {
    /// Number of plain low bits per element.
    pub bits: u8,
    /// Element carries a base-3 digit.
    pub trits: bool,
    /// Element carries a base-5 digit.
    pub quints: bool,
}

const fn bits_only(bits: u8) -> BtqCount {
    BtqCount { bits, trits: false, quints: false }
}

const fn with_trit(bits: u8) -> BtqCount {
    BtqCount { bits, trits: true, quints: false }
}

const fn with_quint(bits: u8) -> BtqCount {
    BtqCount { bits, trits: false, quints: true }
}

/// Per-mode element packing, indexed by [`QuantMethod::index`].
pub const BTQ_COUNTS: [BtqCount; QUANT_METHOD_COUNT] = [
    bits_only(1),  // quant2
    with_trit(0),  // quant3
    bits_only(2),  // quant4
    with_quint(0), // quant5
    with_trit(1),  // quant6
    bits_only(3),  // quant8
    with_quint(1), // quant10
    with_trit(2),  // quant12
    bits_only(4),  // quant16
    with_quint(2), // quant20
    with_trit(3),  // quant24
    bits_only(5),  // quant32
    with_quint(3), // quant40
    with_trit(4),  // quant48
    bits_only(6),  // quant64
    with_quint(4), // quant80
    with_trit(5),  // quant96
    bits_only(7),  // quant128
    with_quint(5), // quant160
    with_trit(6),  // quant192
    bits_only(8),  // quant256
];

// Sequence bit cost per mode as (scale, encoded divisor). The real divisor is
// (enc << 1) + 1, so trit modes cost scale/5 bits per element rounded up over
// the sequence, quint modes scale/3.
const ISE_SIZES: [(u8, u8); QUANT_METHOD_COUNT] = [
    (1, 0),  // quant2
    (8, 2),  // quant3
    (2, 0),  // quant4
    (7, 1),  // quant5
    (13, 2), // quant6
    (3, 0),  // quant8
    (10, 1), // quant10
    (18, 2), // quant12
    (4, 0),  // quant16
    (13, 1), // quant20
    (23, 2), // quant24
    (5, 0),  // quant32
    (16, 1), // quant40
    (28, 2), // quant48
    (6, 0),  // quant64
    (19, 1), // quant80
    (33, 2), // quant96
    (7, 0),  // quant128
    (22, 1), // quant160
    (38, 2), // quant192
    (8, 0),  // quant256
];

/// Exact number of bits an ISE sequence of `count` elements occupies.
#[inline]
pub const fn ise_sequence_bit_count(count: usize, q: QuantMethod) -> usize {
    let (scale, div_enc) = ISE_SIZES[q.index()];
    let divisor = ((div_enc as usize) << 1) + 1;
    (scale as usize * count + divisor - 1) / divisor
}

const ISE_QUANT_LUT_MAX_CHARS: usize = crate::BLOCK_MAX_COLOR_INTS_BUF;
const ISE_QUANT_LUT_MAX_BITS: usize = 128;

// (count, bits) -> numeric quant mode + 1, or 0 if nothing fits. Stored
// offset by one so the zero-initialized entries mean "none".
static QUANT_FOR_ISE_LUT: [[u8; ISE_QUANT_LUT_MAX_BITS + 1]; ISE_QUANT_LUT_MAX_CHARS + 1] = {
    let mut lut = [[0u8; ISE_QUANT_LUT_MAX_BITS + 1]; ISE_QUANT_LUT_MAX_CHARS + 1];
    let mut count = 1;
    while count <= ISE_QUANT_LUT_MAX_CHARS {
        let mut bits = 0;
        while bits <= ISE_QUANT_LUT_MAX_BITS {
            let mut q = QUANT_METHOD_COUNT;
            while q > 0 {
                q -= 1;
                if ise_sequence_bit_count(count, QuantMethod::ALL[q]) <= bits {
                    lut[count][bits] = (q + 1) as u8;
                    break;
                }
            }
            bits += 1;
        }
        count += 1;
    }
    lut
};

/// Highest-precision quantization mode whose ISE encoding of `count` elements
/// fits into `bits_available` bits, or `None` if not even quant2 fits.
#[inline]
pub fn quant_level_for_ise(count: usize, bits_available: usize) -> Option<QuantMethod> {
    if count == 0 || count > ISE_QUANT_LUT_MAX_CHARS {
        return None;
    }
    let bits = bits_available.min(ISE_QUANT_LUT_MAX_BITS);
    match QUANT_FOR_ISE_LUT[count][bits] {
        0 => None,
        q => QuantMethod::from_index((q - 1) as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(QuantMethod::Quant2, 10, 10)]
    #[case(QuantMethod::Quant3, 5, 8)]
    #[case(QuantMethod::Quant3, 10, 16)]
    #[case(QuantMethod::Quant5, 3, 7)]
    #[case(QuantMethod::Quant6, 5, 13)]
    #[case(QuantMethod::Quant256, 8, 64)]
    fn sequence_bit_counts(#[case] q: QuantMethod, #[case] count: usize, #[case] bits: usize) {
        assert_eq!(ise_sequence_bit_count(count, q), bits);
    }

    #[test]
    fn quant_selection_picks_highest_fitting_mode() {
        // 8 endpoint integers in 64 bits is exactly quant256.
        assert_eq!(quant_level_for_ise(8, 64), Some(QuantMethod::Quant256));
        // One bit short drops a level.
        assert_eq!(quant_level_for_ise(8, 63), Some(QuantMethod::Quant192));
        // Too few bits for anything.
        assert_eq!(quant_level_for_ise(18, 10), None);
        assert_eq!(quant_level_for_ise(0, 64), None);
    }

    #[test]
    fn levels_match_mode_names() {
        assert_eq!(QuantMethod::Quant2.levels(), 2);
        assert_eq!(QuantMethod::Quant12.levels(), 12);
        assert_eq!(QuantMethod::Quant256.levels(), 256);
    }
}
