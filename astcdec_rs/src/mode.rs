use crate::{bits::BitReader, error::DecodeError};

/// The layout of a block described by the 11 bit block mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Weights(WeightGridMode),
    /// A single constant color for the whole block.
    VoidExtent(VoidExtent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightGridMode {
    pub width: u8,
    pub height: u8,
    /// The 3 bit weight range code in `2..=7`.
    pub range: u8,
    pub high_precision: bool,
    pub dual_plane: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoidExtent {
    /// Texture coordinates `[min_s, max_s, min_t, max_t]` or `None` if unused.
    pub extents: Option<[u16; 4]>,
    /// RGBA color as unorm16.
    pub color: [u16; 4],
}

const VOID_EXTENT_MODE: u32 = 0b1_1111_1100;
const NO_EXTENT: u16 = 0x1FFF;

pub fn decode_block_mode(bits: &BitReader) -> Result<BlockMode, DecodeError> {
    let dual_plane = bits.read(10, 1) != 0;
    let high_precision = bits.read(9, 1) != 0;

    if bits.read(0, 2) != 0 {
        let range = (bits.read(0, 2) << 1) | bits.read(4, 1);
        let a = bits.read(5, 2);
        let b = bits.read(7, 2);
        let (width, height) = match bits.read(2, 2) {
            0 => (b + 4, a + 2),
            1 => (b + 8, a + 2),
            2 => (a + 2, b + 8),
            _ => {
                if b & 0b10 == 0 {
                    (a + 2, (b & 1) + 6)
                } else {
                    ((b & 1) + 2, a + 2)
                }
            }
        };
        return Ok(BlockMode::Weights(WeightGridMode {
            width: width as u8,
            height: height as u8,
            range: range as u8,
            high_precision,
            dual_plane,
        }));
    }

    if bits.read(6, 3) == 0b111 {
        if bits.read(0, 9) == VOID_EXTENT_MODE {
            return decode_void_extent(bits).map(BlockMode::VoidExtent);
        }
        return Err(DecodeError::ReservedBlockMode1);
    }

    if bits.read(0, 4) == 0 {
        return Err(DecodeError::ReservedBlockMode2);
    }

    let range = (bits.read(2, 2) << 1) | bits.read(4, 1);
    let a = bits.read(5, 2);
    let mode = match bits.read(7, 2) {
        0 => WeightGridMode {
            width: 12,
            height: a as u8 + 2,
            range: range as u8,
            high_precision,
            dual_plane,
        },
        1 => WeightGridMode {
            width: a as u8 + 2,
            height: 12,
            range: range as u8,
            high_precision,
            dual_plane,
        },
        2 => WeightGridMode {
            width: a as u8 + 6,
            height: bits.read(9, 2) as u8 + 6,
            range: range as u8,
            // Bits 9 and 10 store the grid height instead.
            high_precision: false,
            dual_plane: false,
        },
        _ => {
            let (width, height) = if bits.read(5, 1) == 0 { (6, 10) } else { (10, 6) };
            WeightGridMode {
                width,
                height,
                range: range as u8,
                high_precision,
                dual_plane,
            }
        }
    };
    Ok(BlockMode::Weights(mode))
}

fn decode_void_extent(bits: &BitReader) -> Result<VoidExtent, DecodeError> {
    if bits.read(9, 1) != 0 {
        return Err(DecodeError::UnsupportedHdrVoidExtent);
    }

    let [min_s, max_s, min_t, max_t] = [12, 25, 38, 51].map(|offset| bits.read(offset, 13) as u16);
    let extents = if [min_s, max_s, min_t, max_t] == [NO_EXTENT; 4] {
        None
    } else if min_s >= max_s || min_t >= max_t {
        return Err(DecodeError::InvalidRangeInVoidExtent);
    } else {
        Some([min_s, max_s, min_t, max_t])
    };

    let color = [64, 80, 96, 112].map(|offset| bits.read(offset, 16) as u16);
    Ok(VoidExtent { extents, color })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(value: u128) -> Result<BlockMode, DecodeError> {
        decode_block_mode(&BitReader::new(&value.to_le_bytes()))
    }

    fn grid(value: u128) -> WeightGridMode {
        match mode(value) {
            Ok(BlockMode::Weights(grid)) => grid,
            other => panic!("unexpected block mode {other:?}"),
        }
    }

    #[test]
    fn mode_4x4_2bit_weights() {
        assert_eq!(
            WeightGridMode {
                width: 4,
                height: 4,
                range: 4,
                high_precision: false,
                dual_plane: false
            },
            grid(66)
        );
    }

    #[test]
    fn mode_2x2_dual_plane() {
        assert_eq!(
            WeightGridMode {
                width: 2,
                height: 2,
                range: 7,
                high_precision: false,
                dual_plane: true
            },
            grid(1311)
        );
    }

    #[test]
    fn mode_layout1_all_subcases() {
        // bits[2..4) selects the layout with a = 1 and b = 2.
        let base = 0b01 | (1 << 5) | (2 << 7);
        assert_eq!((6, 3), dimensions(grid(base)));
        assert_eq!((10, 3), dimensions(grid(base | (1 << 2))));
        assert_eq!((3, 10), dimensions(grid(base | (2 << 2))));
        // b with the high bit set swaps to a narrow grid.
        assert_eq!((2, 3), dimensions(grid(base | (3 << 2))));
        assert_eq!((3, 7), dimensions(grid(0b01 | (3 << 2) | (1 << 5) | (1 << 7))));
    }

    #[test]
    fn mode_layout2_all_subcases() {
        // range code 2 with a = 1.
        let base = 0b0100 | (1 << 5);
        assert_eq!((12, 3), dimensions(grid(base)));
        assert_eq!((3, 12), dimensions(grid(base | (1 << 7))));
        assert_eq!((10, 6), dimensions(grid(base | (3 << 7))));
        assert_eq!((6, 10), dimensions(grid(0b0100 | (3 << 7))));
    }

    #[test]
    fn mode_layout2_forces_single_plane() {
        let value = 0b0100 | (1 << 5) | (2 << 7) | (3 << 9);
        let grid = grid(value);
        assert_eq!((7, 9), dimensions(grid));
        assert!(!grid.dual_plane);
        assert!(!grid.high_precision);
    }

    #[test]
    fn mode_high_precision_range() {
        let grid = grid(66 | (1 << 9));
        assert!(grid.high_precision);
        assert_eq!(4, grid.range);
    }

    #[test]
    fn reserved_mode2_all_zeros() {
        assert_eq!(Err(DecodeError::ReservedBlockMode2), mode(0));
    }

    #[test]
    fn reserved_mode1() {
        assert_eq!(Err(DecodeError::ReservedBlockMode1), mode(0x1C0));
    }

    fn void_extent_block(extents: [u128; 4], color: [u128; 4]) -> u128 {
        let mut value = 0xDFC;
        for (extent, offset) in extents.iter().zip([12, 25, 38, 51]) {
            value |= extent << offset;
        }
        for (channel, offset) in color.iter().zip([64, 80, 96, 112]) {
            value |= channel << offset;
        }
        value
    }

    #[test]
    fn void_extent_no_extents() {
        let value = void_extent_block([0x1FFF; 4], [0xFFFF, 0x8000, 0, 0x1234]);
        assert_eq!(
            Ok(BlockMode::VoidExtent(VoidExtent {
                extents: None,
                color: [0xFFFF, 0x8000, 0, 0x1234]
            })),
            mode(value)
        );
    }

    #[test]
    fn void_extent_with_extents() {
        let value = void_extent_block([0, 10, 5, 6], [1, 2, 3, 4]);
        assert_eq!(
            Ok(BlockMode::VoidExtent(VoidExtent {
                extents: Some([0, 10, 5, 6]),
                color: [1, 2, 3, 4]
            })),
            mode(value)
        );
    }

    #[test]
    fn void_extent_invalid_range() {
        let value = void_extent_block([10, 10, 0, 1], [0; 4]);
        assert_eq!(Err(DecodeError::InvalidRangeInVoidExtent), mode(value));
        let value = void_extent_block([0, 1, 7, 3], [0; 4]);
        assert_eq!(Err(DecodeError::InvalidRangeInVoidExtent), mode(value));
    }

    #[test]
    fn void_extent_hdr() {
        let value = void_extent_block([0x1FFF; 4], [0; 4]) | (1 << 9);
        assert_eq!(Err(DecodeError::UnsupportedHdrVoidExtent), mode(value));
    }

    fn dimensions(grid: WeightGridMode) -> (u8, u8) {
        (grid.width, grid.height)
    }
}
