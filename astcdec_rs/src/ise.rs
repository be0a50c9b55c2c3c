//! Integer sequence encoding.
//!
//! Values in a range that is not a power of two are stored as plain low bits
//! plus a shared base 3 (trit) or base 5 (quint) digit packed across a group of
//! 5 or 3 values.
use crate::bits::BitReader;

/// The extra digit shared by values in a packed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Bits,
    Trit,
    Quint,
}

/// A quantization range with values in `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantization {
    pub max: u8,
    pub encoding: Encoding,
    /// The number of plain bits stored per value.
    pub bits: u8,
}

impl Quantization {
    const fn new(max: u8, encoding: Encoding, bits: u8) -> Self {
        Self {
            max,
            encoding,
            bits,
        }
    }

    /// The number of bits used to store `count` values with this quantization.
    pub fn packed_bits(&self, count: u32) -> u32 {
        let bits = count * self.bits as u32;
        match self.encoding {
            Encoding::Bits => bits,
            Encoding::Trit => bits + (count * 8 + 4) / 5,
            Encoding::Quint => bits + (count * 7 + 2) / 3,
        }
    }
}

/// Quantization ranges for color endpoint values in ascending order.
pub const ENDPOINT_RANGES: [Quantization; 17] = [
    Quantization::new(5, Encoding::Trit, 1),
    Quantization::new(7, Encoding::Bits, 3),
    Quantization::new(9, Encoding::Quint, 1),
    Quantization::new(11, Encoding::Trit, 2),
    Quantization::new(15, Encoding::Bits, 4),
    Quantization::new(19, Encoding::Quint, 2),
    Quantization::new(23, Encoding::Trit, 3),
    Quantization::new(31, Encoding::Bits, 5),
    Quantization::new(39, Encoding::Quint, 3),
    Quantization::new(47, Encoding::Trit, 4),
    Quantization::new(63, Encoding::Bits, 6),
    Quantization::new(79, Encoding::Quint, 4),
    Quantization::new(95, Encoding::Trit, 5),
    Quantization::new(127, Encoding::Bits, 7),
    Quantization::new(159, Encoding::Quint, 5),
    Quantization::new(191, Encoding::Trit, 6),
    Quantization::new(255, Encoding::Bits, 8),
];

/// Quantization ranges for weights indexed by the precision bit and then the range code minus 2.
pub const WEIGHT_RANGES: [[Quantization; 6]; 2] = [
    [
        Quantization::new(1, Encoding::Bits, 1),
        Quantization::new(2, Encoding::Trit, 0),
        Quantization::new(3, Encoding::Bits, 2),
        Quantization::new(4, Encoding::Quint, 0),
        Quantization::new(5, Encoding::Trit, 1),
        Quantization::new(7, Encoding::Bits, 3),
    ],
    [
        Quantization::new(9, Encoding::Quint, 1),
        Quantization::new(11, Encoding::Trit, 2),
        Quantization::new(15, Encoding::Bits, 4),
        Quantization::new(19, Encoding::Quint, 2),
        Quantization::new(23, Encoding::Trit, 3),
        Quantization::new(31, Encoding::Bits, 5),
    ],
];

/// Decode 5 values from a trit group of `5 * n + 8` bits.
///
/// Each output is `(trit << n) | mantissa`.
pub fn unpack_trit_block(n: u32, raw: u64) -> [u8; 5] {
    debug_assert!(n <= 6);
    let bit = |offset: u32| ((raw >> offset) & 1) as u8;
    let mantissa = |offset: u32| ((raw >> offset) & ((1 << n) - 1)) as u8;

    let t0 = bit(n);
    let t1 = bit(n + 1);
    let t2 = bit(2 * n + 2);
    let t3 = bit(2 * n + 3);
    let t4 = bit(3 * n + 4);
    let t5 = bit(4 * n + 5);
    let t6 = bit(4 * n + 6);
    let t7 = bit(5 * n + 7);

    let m = [
        mantissa(0),
        mantissa(n + 2),
        mantissa(2 * n + 4),
        mantissa(3 * n + 5),
        mantissa(4 * n + 7),
    ];

    let mut trits = [0u8; 5];
    let c;
    if (t4, t3, t2) == (1, 1, 1) {
        c = (t7 << 4) | (t6 << 3) | (t5 << 2) | (t1 << 1) | t0;
        trits[4] = 2;
        trits[3] = 2;
    } else {
        c = (t4 << 4) | (t3 << 3) | (t2 << 2) | (t1 << 1) | t0;
        if (t6, t5) == (1, 1) {
            trits[4] = 2;
            trits[3] = t7;
        } else {
            trits[4] = t7;
            trits[3] = (t6 << 1) | t5;
        }
    }

    if c & 0x3 == 0x3 {
        let (c3, c2) = ((c >> 3) & 1, (c >> 2) & 1);
        trits[2] = 2;
        trits[1] = (c >> 4) & 1;
        trits[0] = (c3 << 1) | (c2 & !c3 & 1);
    } else if (c >> 2) & 0x3 == 0x3 {
        trits[2] = 2;
        trits[1] = 2;
        trits[0] = c & 0x3;
    } else {
        let (c1, c0) = ((c >> 1) & 1, c & 1);
        trits[2] = (c >> 4) & 1;
        trits[1] = (c >> 2) & 0x3;
        trits[0] = (c1 << 1) | (c0 & !c1 & 1);
    }

    let mut values = [0u8; 5];
    for (value, (t, m)) in values.iter_mut().zip(trits.into_iter().zip(m)) {
        *value = (t << n) | m;
    }
    values
}

/// Decode 3 values from a quint group of `3 * n + 7` bits.
///
/// Each output is `(quint << n) | mantissa`.
pub fn unpack_quint_block(n: u32, raw: u32) -> [u8; 3] {
    debug_assert!(n <= 5);
    let bit = |offset: u32| ((raw >> offset) & 1) as u8;
    let mantissa = |offset: u32| ((raw >> offset) & ((1 << n) - 1)) as u8;

    let q0 = bit(n);
    let q1 = bit(n + 1);
    let q2 = bit(n + 2);
    let q3 = bit(2 * n + 3);
    let q4 = bit(2 * n + 4);
    let q5 = bit(3 * n + 5);
    let q6 = bit(3 * n + 6);

    let m = [mantissa(0), mantissa(n + 3), mantissa(2 * n + 5)];

    let mut quints = [0u8; 3];
    if (q6, q5, q2, q1) == (0, 0, 1, 1) {
        let not_q0 = !q0 & 1;
        quints[2] = (q0 << 2) | ((q4 & not_q0) << 1) | (q3 & not_q0);
        quints[1] = 4;
        quints[0] = 4;
    } else {
        let c;
        if (q2, q1) == (1, 1) {
            quints[2] = 4;
            c = (q4 << 4) | (q3 << 3) | ((!q6 & 1) << 2) | ((!q5 & 1) << 1) | q0;
        } else {
            quints[2] = (q6 << 1) | q5;
            c = (q4 << 4) | (q3 << 3) | (q2 << 2) | (q1 << 1) | q0;
        }

        if c & 0x7 == 0x5 {
            quints[1] = 4;
            quints[0] = (c >> 3) & 0x3;
        } else {
            quints[1] = (c >> 3) & 0x3;
            quints[0] = c & 0x7;
        }
    }

    let mut values = [0u8; 3];
    for (value, (q, m)) in values.iter_mut().zip(quints.into_iter().zip(m)) {
        *value = (q << n) | m;
    }
    values
}

/// The direction of an integer sequence in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Color endpoints are read upwards from a starting bit.
    Forward,
    /// Weights are read downwards from the top of the block with reversed bits.
    Reversed,
}

/// Unpack `count` quantized values starting at bit `start`.
///
/// The output must have room for `count` rounded up to the group size.
pub fn unpack_sequence(
    bits: &BitReader,
    start: u32,
    direction: Direction,
    quantization: Quantization,
    count: usize,
    output: &mut [u8],
) {
    let n = quantization.bits as u32;
    let mut bits_left = quantization.packed_bits(count as u32);
    let mut offset = start;

    // The final group may be truncated to the bits that remain.
    let mut read_group = |group_bits: u32| {
        let len = bits_left.min(group_bits);
        let raw = match direction {
            Direction::Forward => {
                let raw = bits.read64(offset, len);
                offset += len;
                raw
            }
            Direction::Reversed => {
                let raw = bits.read_reversed(offset, len) as u64;
                offset -= len;
                raw
            }
        };
        bits_left -= len;
        raw
    };

    match quantization.encoding {
        Encoding::Trit => {
            let groups = count.div_ceil(5);
            for group in output[..groups * 5].chunks_exact_mut(5) {
                let raw = read_group(5 * n + 8);
                group.copy_from_slice(&unpack_trit_block(n, raw));
            }
        }
        Encoding::Quint => {
            let groups = count.div_ceil(3);
            for group in output[..groups * 3].chunks_exact_mut(3) {
                let raw = read_group(3 * n + 7);
                group.copy_from_slice(&unpack_quint_block(n, raw as u32));
            }
        }
        Encoding::Bits => {
            for value in &mut output[..count] {
                *value = read_group(n) as u8;
            }
        }
    }

    debug_assert!(output[..count].iter().all(|v| *v <= quantization.max));
}

/// Map a quantized color endpoint value to the range `0..=255`.
pub fn unquantize_endpoint(quantization: Quantization, value: u8) -> u8 {
    let n = quantization.bits as u32;
    let v = value as u32;
    match quantization.encoding {
        Encoding::Bits => match n {
            1 => (v * 0xFF) as u8,
            2 => (v * 0x55) as u8,
            3 => ((v << 5) | (v << 2) | (v >> 1)) as u8,
            4 => (v * 0x11) as u8,
            5 => ((v << 3) | (v >> 2)) as u8,
            6 => ((v << 2) | (v >> 4)) as u8,
            7 => ((v << 1) | (v >> 6)) as u8,
            _ => value,
        },
        Encoding::Trit => {
            let (d, m) = split(v, n);
            let x = m >> 1;
            let (c, b) = match n {
                1 => (204, 0),
                // b000b0bb0
                2 => (93, (x << 8) | (x << 4) | (x << 2) | (x << 1)),
                // cb000cbcb
                3 => (44, (x << 7) | (x << 2) | x),
                // dcb000dcb
                4 => (22, (x << 6) | x),
                // edcb000ed
                5 => (11, (x << 5) | (x >> 2)),
                // fedcb000f
                _ => (5, (x << 4) | (x >> 4)),
            };
            unquantize_endpoint_digit(m, b, c, d)
        }
        Encoding::Quint => {
            let (d, m) = split(v, n);
            let x = m >> 1;
            let (c, b) = match n {
                1 => (113, 0),
                // b0000bb00
                2 => (54, (x << 8) | (x << 3) | (x << 2)),
                // cb0000cbc
                3 => (26, (x << 7) | (x << 1) | (x >> 1)),
                // dcb0000dc
                4 => (13, (x << 6) | (x >> 1)),
                // edcb0000e
                _ => (6, (x << 5) | (x >> 3)),
            };
            unquantize_endpoint_digit(m, b, c, d)
        }
    }
}

/// Map a quantized weight to the range `0..=64`.
pub fn unquantize_weight(quantization: Quantization, value: u8) -> u8 {
    let n = quantization.bits as u32;
    let v = value as u32;
    let weight = match quantization.encoding {
        Encoding::Bits => match n {
            1 => v * 63,
            2 => (v << 4) | (v << 2) | v,
            3 => (v << 3) | v,
            4 => (v << 2) | (v >> 2),
            _ => (v << 1) | (v >> 4),
        },
        Encoding::Trit => {
            let (d, m) = split(v, n);
            let x = m >> 1;
            match n {
                0 => [0, 32, 63][d as usize],
                1 => unquantize_weight_digit(m, 0, 50, d),
                2 => unquantize_weight_digit(m, (x << 6) | (x << 2) | x, 23, d),
                _ => unquantize_weight_digit(m, (x << 5) | x, 11, d),
            }
        }
        Encoding::Quint => {
            let (d, m) = split(v, n);
            let x = m >> 1;
            match n {
                0 => [0, 16, 32, 47, 63][d as usize],
                1 => unquantize_weight_digit(m, 0, 28, d),
                _ => unquantize_weight_digit(m, (x << 6) | (x << 1), 13, d),
            }
        }
    };

    // Stretch 0..=63 to 0..=64 so a weight of 64 selects the second endpoint exactly.
    if weight > 32 {
        (weight + 1) as u8
    } else {
        weight as u8
    }
}

fn split(value: u32, n: u32) -> (u32, u32) {
    (value >> n, value & ((1 << n) - 1))
}

fn unquantize_endpoint_digit(m: u32, b: u32, c: u32, d: u32) -> u8 {
    let a = if m & 1 != 0 { 0x1FF } else { 0 };
    let t = (d * c + b) ^ a;
    ((a & 0x80) | (t >> 2)) as u8
}

fn unquantize_weight_digit(m: u32, b: u32, c: u32, d: u32) -> u32 {
    let a = if m & 1 != 0 { 0x7F } else { 0 };
    let t = (d * c + b) ^ a;
    (a & 0x20) | (t >> 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn all_values(quantization: Quantization) -> impl Iterator<Item = u8> {
        // Enumerate every digit and mantissa combination in this range.
        let digits = match quantization.encoding {
            Encoding::Bits => 1,
            Encoding::Trit => 3,
            Encoding::Quint => 5,
        };
        let n = quantization.bits as u32;
        (0..digits).flat_map(move |d| (0..1u32 << n).map(move |m| ((d << n) | m) as u8))
    }

    #[test]
    fn trit_block_all_zeros() {
        assert_eq!([0; 5], unpack_trit_block(0, 0));
        assert_eq!([0; 5], unpack_trit_block(6, 0));
    }

    #[test]
    fn trit_block_high_trits() {
        // T[4:2] == 111 sets the last two trits to 2.
        assert_eq!([0, 0, 0, 2, 2], unpack_trit_block(0, 0b0001_1100));
        assert_eq!([2, 1, 2, 2, 2], unpack_trit_block(0, 0b1111_1111));
    }

    #[test]
    fn trit_block_mantissas() {
        // Mantissa bits are interleaved with the trit bits.
        let raw = 0b1 | (0b10 << 4) | (0b11 << 8) | (0b00 << 11) | (0b01 << 15);
        assert_eq!([1, 2, 3, 0, 1], unpack_trit_block(2, raw));
    }

    #[test]
    fn trit_block_covers_all_combinations() {
        let mut seen = BTreeSet::new();
        for raw in 0..256u64 {
            let trits = unpack_trit_block(0, raw);
            assert!(trits.iter().all(|t| *t < 3));
            seen.insert(trits);
        }
        assert_eq!(243, seen.len());
    }

    #[test]
    fn quint_block_all_zeros() {
        assert_eq!([0; 3], unpack_quint_block(0, 0));
        assert_eq!([0; 3], unpack_quint_block(5, 0));
    }

    #[test]
    fn quint_block_high_quints() {
        assert_eq!([4, 4, 0], unpack_quint_block(0, 0b000_0110));
    }

    #[test]
    fn quint_block_mantissas() {
        let raw = 0b101 | (0b011 << 6) | (0b110 << 11);
        assert_eq!([5, 3, 6], unpack_quint_block(3, raw));
    }

    #[test]
    fn quint_block_covers_all_combinations() {
        let mut seen = BTreeSet::new();
        for raw in 0..128u32 {
            let quints = unpack_quint_block(0, raw);
            assert!(quints.iter().all(|q| *q < 5));
            seen.insert(quints);
        }
        assert_eq!(125, seen.len());
    }

    #[test]
    fn endpoint_ranges_ascending() {
        for pair in ENDPOINT_RANGES.windows(2) {
            assert!(pair[0].max < pair[1].max);
            assert!(pair[0].packed_bits(18) <= pair[1].packed_bits(18));
        }
    }

    #[test]
    fn packed_bits_rounds_up() {
        let trit = Quantization::new(5, Encoding::Trit, 1);
        assert_eq!(2 + 4, trit.packed_bits(2));
        assert_eq!(5 + 8, trit.packed_bits(5));
        let quint = Quantization::new(9, Encoding::Quint, 1);
        assert_eq!(1 + 3, quint.packed_bits(1));
        assert_eq!(3 + 7, quint.packed_bits(3));
    }

    #[test]
    fn unquantize_endpoint_trit_1bit() {
        let values: Vec<_> = all_values(ENDPOINT_RANGES[0])
            .map(|v| unquantize_endpoint(ENDPOINT_RANGES[0], v))
            .collect();
        assert_eq!(vec![0, 255, 51, 204, 102, 153], values);
    }

    #[test]
    fn unquantize_endpoint_ranges_span_unorm8() {
        for quantization in ENDPOINT_RANGES {
            let values: BTreeSet<_> = all_values(quantization)
                .map(|v| unquantize_endpoint(quantization, v))
                .collect();
            assert_eq!(quantization.max as usize + 1, values.len(), "{quantization:?}");
            assert_eq!(Some(&0), values.first());
            assert_eq!(Some(&255), values.last());
        }
    }

    #[test]
    fn unquantize_weight_ranges_span_0_to_64() {
        for quantization in WEIGHT_RANGES.iter().flatten().copied() {
            let values: BTreeSet<_> = all_values(quantization)
                .map(|v| unquantize_weight(quantization, v))
                .collect();
            assert_eq!(quantization.max as usize + 1, values.len(), "{quantization:?}");
            assert_eq!(Some(&0), values.first());
            assert_eq!(Some(&64), values.last());
        }
    }

    #[test]
    fn unquantize_weight_quint_0bit() {
        let quantization = WEIGHT_RANGES[0][3];
        let values: Vec<_> = (0..5)
            .map(|v| unquantize_weight(quantization, v))
            .collect();
        assert_eq!(vec![0, 16, 32, 48, 64], values);
    }

    #[test]
    fn unpack_sequence_plain_forward() {
        let value: u128 = 0b11_10_01 << 17;
        let bits = BitReader::new(&value.to_le_bytes());
        let mut output = [0u8; 4];
        unpack_sequence(
            &bits,
            17,
            Direction::Forward,
            Quantization::new(3, Encoding::Bits, 2),
            3,
            &mut output,
        );
        assert_eq!([1, 2, 3, 0], output);
    }

    #[test]
    fn unpack_sequence_plain_reversed() {
        // The first weight occupies the top bits with its lowest bit at bit 127.
        let value: u128 = (0b1 << 127) | (0b1 << 124);
        let bits = BitReader::new(&value.to_le_bytes());
        let mut output = [0u8; 2];
        unpack_sequence(
            &bits,
            128,
            Direction::Reversed,
            Quantization::new(7, Encoding::Bits, 3),
            2,
            &mut output,
        );
        assert_eq!([1, 1], output);
    }

    #[test]
    fn unpack_sequence_truncated_trit_group() {
        // 2 values with 1 bit each use 2 + 4 bits instead of a full 13 bit group.
        let value: u128 = 0b1 << 17;
        let bits = BitReader::new(&value.to_le_bytes());
        let mut output = [0xFFu8; 5];
        unpack_sequence(&bits, 17, Direction::Forward, ENDPOINT_RANGES[0], 2, &mut output);
        assert_eq!([1, 0, 0, 0, 0], output);
    }
}
