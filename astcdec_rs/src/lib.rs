#![cfg_attr(not(test), no_std)]
//! A safe, no_std, pure Rust decoder for 2D LDR [ASTC](https://registry.khronos.org/DataFormat/specs/1.3/dataformat.1.3.html#ASTC) blocks.
//!
//! Each 16 byte block decodes to a fixed footprint of RGBA texels.
//! Blocks that fail to decode produce opaque magenta and an error
//! so that corrupted data remains visible in the final image.
//!
//! ```rust
//! use astcdec_rs::Footprint;
//!
//! // A void extent block with a constant opaque red color.
//! let block = [
//!     0xFC, 0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
//!     0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF,
//! ];
//!
//! let footprint = Footprint::new(4, 4).unwrap();
//! let mut rgba = [0u8; 4 * 4 * 4];
//! astcdec_rs::rgba8(&block, footprint, false, &mut rgba).unwrap();
//! assert_eq!([255u8, 0, 0, 255], rgba[..4]);
//! ```
//!
//! HDR color endpoint modes, HDR void extents, and 3D blocks are not supported.
mod bits;
mod block;
mod endpoints;
mod error;
mod ise;
mod mode;
mod partition;
mod trace;
mod weights;

use half::f16;

pub use block::Texel;
pub use endpoints::ColorEndpointMode;
pub use error::DecodeError;
pub use mode::{BlockMode, VoidExtent, WeightGridMode};
pub use partition::select_partition;
pub use trace::{NoTrace, Trace};

use bits::BitReader;
use block::Block;

/// The size in bytes of a compressed block for all footprints.
pub const BLOCK_SIZE_IN_BYTES: usize = 16;

/// The dimensions in texels of a single 2D block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Footprint {
    width: u8,
    height: u8,
}

impl Footprint {
    pub const F4X4: Self = Self::new_unchecked(4, 4);
    pub const F5X4: Self = Self::new_unchecked(5, 4);
    pub const F5X5: Self = Self::new_unchecked(5, 5);
    pub const F6X5: Self = Self::new_unchecked(6, 5);
    pub const F6X6: Self = Self::new_unchecked(6, 6);
    pub const F8X5: Self = Self::new_unchecked(8, 5);
    pub const F8X6: Self = Self::new_unchecked(8, 6);
    pub const F8X8: Self = Self::new_unchecked(8, 8);
    pub const F10X5: Self = Self::new_unchecked(10, 5);
    pub const F10X6: Self = Self::new_unchecked(10, 6);
    pub const F10X8: Self = Self::new_unchecked(10, 8);
    pub const F10X10: Self = Self::new_unchecked(10, 10);
    pub const F12X10: Self = Self::new_unchecked(12, 10);
    pub const F12X12: Self = Self::new_unchecked(12, 12);

    const ALL: [Self; 14] = [
        Self::F4X4,
        Self::F5X4,
        Self::F5X5,
        Self::F6X5,
        Self::F6X6,
        Self::F8X5,
        Self::F8X6,
        Self::F8X8,
        Self::F10X5,
        Self::F10X6,
        Self::F10X8,
        Self::F10X10,
        Self::F12X10,
        Self::F12X12,
    ];

    const fn new_unchecked(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    /// Returns `None` if `width` x `height` is not one of the standard 2D footprints.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.width as u32 == width && f.height as u32 == height)
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    /// The number of texels in a decoded block.
    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Decodes blocks with a fixed footprint and color space.
///
/// ```rust
/// use astcdec_rs::{Decoder, Footprint};
///
/// let decoder = Decoder::new(Footprint::new(6, 6).unwrap(), true);
/// let mut rgba = [0u8; 6 * 6 * 4];
/// let result = decoder.decode_rgba8(&[0u8; 16], &mut rgba);
///
/// // A block of all zeros uses a reserved block mode.
/// assert!(result.is_err());
/// assert_eq!([255u8, 0, 255, 255], rgba[..4]);
/// ```
#[derive(Clone, Copy)]
pub struct Decoder<'a> {
    footprint: Footprint,
    srgb: bool,
    trace: &'a dyn Trace,
}

impl core::fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Decoder")
            .field("footprint", &self.footprint)
            .field("srgb", &self.srgb)
            .finish_non_exhaustive()
    }
}

impl Decoder<'static> {
    /// Create a decoder for `footprint`.
    ///
    /// Blocks for sRGB formats should set `srgb` to use the sRGB endpoint expansion.
    /// The output is not converted to linear.
    pub fn new(footprint: Footprint, srgb: bool) -> Self {
        Self {
            footprint,
            srgb,
            trace: &NoTrace,
        }
    }
}

impl<'a> Decoder<'a> {
    /// Report the decoding steps for each block to `trace`.
    pub fn with_trace<'b>(self, trace: &'b dyn Trace) -> Decoder<'b> {
        Decoder {
            footprint: self.footprint,
            srgb: self.srgb,
            trace,
        }
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Decode a block to RGBA texels in row-major order.
    ///
    /// # Panics
    /// Panics if `output` has fewer than `width * height * 4` elements.
    pub fn decode<T: Texel>(
        &self,
        block: &[u8; BLOCK_SIZE_IN_BYTES],
        output: &mut [T],
    ) -> Result<(), DecodeError> {
        let mut state = Block::new(
            self.footprint.width as usize,
            self.footprint.height as usize,
        );
        state.decode(&BitReader::new(block), self.srgb, self.trace, output)
    }

    /// Decode a block to RGBA8 texels in row-major order.
    ///
    /// # Panics
    /// Panics if `output` has fewer than `width * height * 4` elements.
    pub fn decode_rgba8(
        &self,
        block: &[u8; BLOCK_SIZE_IN_BYTES],
        output: &mut [u8],
    ) -> Result<(), DecodeError> {
        self.decode(block, output)
    }

    /// Decode a block to RGBA half float texels in row-major order.
    ///
    /// # Panics
    /// Panics if `output` has fewer than `width * height * 4` elements.
    pub fn decode_rgbaf16(
        &self,
        block: &[u8; BLOCK_SIZE_IN_BYTES],
        output: &mut [f16],
    ) -> Result<(), DecodeError> {
        self.decode(block, output)
    }
}

/// Decode the block mode field without decoding any texels.
///
/// This is useful for inspecting the weight grid layout of compressed data.
pub fn block_mode(block: &[u8; BLOCK_SIZE_IN_BYTES]) -> Result<BlockMode, DecodeError> {
    mode::decode_block_mode(&BitReader::new(block))
}

/// Decode a block to RGBA8 texels in row-major order.
pub fn rgba8(
    block: &[u8; BLOCK_SIZE_IN_BYTES],
    footprint: Footprint,
    srgb: bool,
    output: &mut [u8],
) -> Result<(), DecodeError> {
    Decoder::new(footprint, srgb).decode_rgba8(block, output)
}

/// Decode a block to RGBA half float texels in row-major order.
pub fn rgbaf16(
    block: &[u8; BLOCK_SIZE_IN_BYTES],
    footprint: Footprint,
    srgb: bool,
    output: &mut [f16],
) -> Result<(), DecodeError> {
    Decoder::new(footprint, srgb).decode_rgbaf16(block, output)
}
