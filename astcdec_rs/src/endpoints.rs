use crate::{
    bits::BitReader,
    error::DecodeError,
    ise::{Quantization, ENDPOINT_RANGES},
};

/// The number of endpoint values for all partitions is limited by the available bits.
pub const MAX_ENDPOINT_VALUES: usize = 18;

const MAGENTA: [u8; 4] = [255, 0, 255, 255];

/// The format and encoding of a partition's pair of endpoint colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorEndpointMode {
    LdrLuminanceDirect = 0,
    LdrLuminanceBaseOffset = 1,
    HdrLuminanceLargeRange = 2,
    HdrLuminanceSmallRange = 3,
    LdrLuminanceAlphaDirect = 4,
    LdrLuminanceAlphaBaseOffset = 5,
    LdrRgbBaseScale = 6,
    HdrRgbBaseScale = 7,
    LdrRgbDirect = 8,
    LdrRgbBaseOffset = 9,
    LdrRgbBaseScaleTwoAlpha = 10,
    HdrRgbDirect = 11,
    LdrRgbaDirect = 12,
    LdrRgbaBaseOffset = 13,
    HdrRgbDirectLdrAlpha = 14,
    HdrRgbDirectHdrAlpha = 15,
}

impl ColorEndpointMode {
    /// Convert the low 4 bits of `value` to a mode.
    pub fn from_bits(value: u32) -> Self {
        match value & 0xF {
            0 => Self::LdrLuminanceDirect,
            1 => Self::LdrLuminanceBaseOffset,
            2 => Self::HdrLuminanceLargeRange,
            3 => Self::HdrLuminanceSmallRange,
            4 => Self::LdrLuminanceAlphaDirect,
            5 => Self::LdrLuminanceAlphaBaseOffset,
            6 => Self::LdrRgbBaseScale,
            7 => Self::HdrRgbBaseScale,
            8 => Self::LdrRgbDirect,
            9 => Self::LdrRgbBaseOffset,
            10 => Self::LdrRgbBaseScaleTwoAlpha,
            11 => Self::HdrRgbDirect,
            12 => Self::LdrRgbaDirect,
            13 => Self::LdrRgbaBaseOffset,
            14 => Self::HdrRgbDirectLdrAlpha,
            _ => Self::HdrRgbDirectHdrAlpha,
        }
    }

    /// The number of integers used to encode both endpoints.
    pub fn value_count(self) -> usize {
        ((self as usize >> 2) + 1) * 2
    }

    pub fn is_hdr(self) -> bool {
        matches!(
            self,
            Self::HdrLuminanceLargeRange
                | Self::HdrLuminanceSmallRange
                | Self::HdrRgbBaseScale
                | Self::HdrRgbDirect
                | Self::HdrRgbDirectLdrAlpha
                | Self::HdrRgbDirectHdrAlpha
        )
    }
}

/// The color endpoint modes for each partition in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CemAssignment {
    pub partitions: usize,
    pub modes: [ColorEndpointMode; 4],
    /// Mode bits stored directly below the weights.
    pub extra_bits: u32,
    /// Bits used by the fixed header fields and the mode data excluding the dual plane selector.
    pub config_bits: u32,
}

impl CemAssignment {
    /// The first bit of the color endpoint data.
    pub fn endpoints_start(&self) -> u32 {
        if self.partitions == 1 {
            17
        } else {
            29
        }
    }

    pub fn value_count(&self) -> usize {
        self.modes[..self.partitions]
            .iter()
            .map(|m| m.value_count())
            .sum()
    }
}

/// Decode the color endpoint modes for `partitions` in `1..=4`.
pub fn decode_cems(bits: &BitReader, partitions: usize, weight_bits: u32) -> CemAssignment {
    if partitions == 1 {
        let mode = ColorEndpointMode::from_bits(bits.read(13, 4));
        return CemAssignment {
            partitions,
            modes: [mode; 4],
            extra_bits: 0,
            config_bits: 17,
        };
    }

    let field = bits.read(23, 6);
    if field & 0b11 == 0 {
        // All partitions share the same mode.
        let mode = ColorEndpointMode::from_bits(field >> 2);
        return CemAssignment {
            partitions,
            modes: [mode; 4],
            extra_bits: 0,
            config_bits: 29,
        };
    }

    // Each partition has a class offset bit and 2 mode bits.
    let n = partitions as u32;
    let extra_bits = 3 * n - 4;
    let extra = bits.read(128 - weight_bits - extra_bits, extra_bits);
    let packed = (field >> 2) | (extra << 4);
    let base_class = (field & 0b11) - 1;

    let mut modes = [ColorEndpointMode::LdrLuminanceDirect; 4];
    for (i, mode) in modes[..partitions].iter_mut().enumerate() {
        let i = i as u32;
        let class = base_class + ((packed >> i) & 1);
        let m = (packed >> (n + 2 * i)) & 0b11;
        *mode = ColorEndpointMode::from_bits((class << 2) | m);
    }

    CemAssignment {
        partitions,
        modes,
        extra_bits,
        config_bits: 25 + 3 * n,
    }
}

/// Find the highest precision range that fits `count` values in the bits not used by other fields.
pub fn endpoint_quantization(
    count: usize,
    config_bits: u32,
    weight_bits: u32,
) -> Result<Quantization, DecodeError> {
    if count > MAX_ENDPOINT_VALUES {
        return Err(DecodeError::InvalidColourEndpointsCount { count: count as u8 });
    }

    let available = 128 - config_bits as i32 - weight_bits as i32;
    let count = count as u32;
    if available < ((13 * count + 4) / 5) as i32 {
        return Err(DecodeError::InvalidColourEndpointsSize {
            count: count as u8,
            available,
        });
    }

    ENDPOINT_RANGES
        .iter()
        .rev()
        .find(|q| q.packed_bits(count) as i32 <= available)
        .copied()
        .ok_or(DecodeError::InvalidColourEndpointsSize {
            count: count as u8,
            available,
        })
}

/// Decode the pair of RGBA endpoint colors from unquantized values in `0..=255`.
pub fn decode_endpoint_pair(mode: ColorEndpointMode, values: &[u8]) -> [[u8; 4]; 2] {
    let mut v = [0i32; 8];
    for (v, value) in v.iter_mut().zip(values) {
        *v = *value as i32;
    }

    match mode {
        ColorEndpointMode::LdrLuminanceDirect => [
            rgba(v[0], v[0], v[0], 255),
            rgba(v[1], v[1], v[1], 255),
        ],
        ColorEndpointMode::LdrLuminanceBaseOffset => {
            let l0 = (v[0] >> 2) | (v[1] & 0xC0);
            let l1 = (l0 + (v[1] & 0x3F)).min(255);
            [rgba(l0, l0, l0, 255), rgba(l1, l1, l1, 255)]
        }
        ColorEndpointMode::LdrLuminanceAlphaDirect => [
            rgba(v[0], v[0], v[0], v[2]),
            rgba(v[1], v[1], v[1], v[3]),
        ],
        ColorEndpointMode::LdrLuminanceAlphaBaseOffset => {
            bit_transfer_signed(&mut v, 1, 0);
            bit_transfer_signed(&mut v, 3, 2);
            let l1 = v[0] + v[1];
            [
                rgba(v[0], v[0], v[0], v[2]),
                rgba(l1, l1, l1, v[2] + v[3]),
            ]
        }
        ColorEndpointMode::LdrRgbBaseScale => [
            rgba(
                (v[0] * v[3]) >> 8,
                (v[1] * v[3]) >> 8,
                (v[2] * v[3]) >> 8,
                255,
            ),
            rgba(v[0], v[1], v[2], 255),
        ],
        ColorEndpointMode::LdrRgbDirect => {
            rgb_direct([v[0], v[2], v[4], 255], [v[1], v[3], v[5], 255])
        }
        ColorEndpointMode::LdrRgbBaseOffset => {
            for i in [1, 3, 5] {
                bit_transfer_signed(&mut v, i, i - 1);
            }
            rgb_base_offset([v[0], v[2], v[4], 255], [v[1], v[3], v[5], 0])
        }
        ColorEndpointMode::LdrRgbBaseScaleTwoAlpha => [
            rgba(
                (v[0] * v[3]) >> 8,
                (v[1] * v[3]) >> 8,
                (v[2] * v[3]) >> 8,
                v[4],
            ),
            rgba(v[0], v[1], v[2], v[5]),
        ],
        ColorEndpointMode::LdrRgbaDirect => {
            rgb_direct([v[0], v[2], v[4], v[6]], [v[1], v[3], v[5], v[7]])
        }
        ColorEndpointMode::LdrRgbaBaseOffset => {
            for i in [1, 3, 5, 7] {
                bit_transfer_signed(&mut v, i, i - 1);
            }
            rgb_base_offset([v[0], v[2], v[4], v[6]], [v[1], v[3], v[5], v[7]])
        }
        ColorEndpointMode::HdrLuminanceLargeRange
        | ColorEndpointMode::HdrLuminanceSmallRange
        | ColorEndpointMode::HdrRgbBaseScale
        | ColorEndpointMode::HdrRgbDirect
        | ColorEndpointMode::HdrRgbDirectLdrAlpha
        | ColorEndpointMode::HdrRgbDirectHdrAlpha => [MAGENTA, MAGENTA],
    }
}

fn rgb_direct(e0: [i32; 4], e1: [i32; 4]) -> [[u8; 4]; 2] {
    let s0 = e0[0] + e0[1] + e0[2];
    let s1 = e1[0] + e1[1] + e1[2];
    if s1 >= s0 {
        [rgba(e0[0], e0[1], e0[2], e0[3]), rgba(e1[0], e1[1], e1[2], e1[3])]
    } else {
        // Swapped endpoints indicate the blue channel was contracted.
        [blue_contract(e1), blue_contract(e0)]
    }
}

fn rgb_base_offset(base: [i32; 4], offset: [i32; 4]) -> [[u8; 4]; 2] {
    let sum = [
        base[0] + offset[0],
        base[1] + offset[1],
        base[2] + offset[2],
        base[3] + offset[3],
    ];
    if offset[0] + offset[1] + offset[2] >= 0 {
        [rgba(base[0], base[1], base[2], base[3]), rgba(sum[0], sum[1], sum[2], sum[3])]
    } else {
        [blue_contract(sum), blue_contract(base)]
    }
}

/// Move the top bit of `v[a]` into `v[b]` and sign extend the remaining 6 bits of `v[a]`.
fn bit_transfer_signed(v: &mut [i32; 8], a: usize, b: usize) {
    v[b] = (v[b] >> 1) | (v[a] & 0x80);
    v[a] = (v[a] >> 1) & 0x3F;
    if v[a] & 0x20 != 0 {
        v[a] -= 0x40;
    }
}

fn blue_contract([r, g, b, a]: [i32; 4]) -> [u8; 4] {
    rgba((r + b) >> 1, (g + b) >> 1, b, a)
}

fn rgba(r: i32, g: i32, b: i32, a: i32) -> [u8; 4] {
    [r, g, b, a].map(|c| c.clamp(0, 255) as u8)
}
