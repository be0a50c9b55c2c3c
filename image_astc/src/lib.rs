//! Decode 2D LDR ASTC compressed surfaces to RGBA8 or floating point RGBA.
//!
//! Surfaces are decoded block by block using [astcdec_rs].
//! Blocks with invalid data decode to opaque magenta instead of failing the entire surface,
//! and the errors are collected into a [DecodeReport].
//!
//! ```rust
//! use image_astc::{ImageFormat, Surface};
//!
//! // A single void extent block with a constant opaque white color.
//! let surface = Surface {
//!     width: 4,
//!     height: 4,
//!     image_format: ImageFormat::Astc4x4Unorm,
//!     data: vec![0xFC, 0xFD, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
//! };
//! let rgba8 = surface.decode_rgba8().unwrap();
//! assert_eq!(vec![255u8; 4 * 4 * 4], rgba8.data);
//! ```
//!
//! Enable the `rayon` feature to decode rows of blocks in parallel.
use astcdec_rs::Footprint;

mod decode;
mod error;
mod surface;
mod trace;

pub use decode::{unpack_astc_2d_ldr, unpack_astc_2d_ldr_rgbaf16, BlockError, DecodeReport};
pub use error::*;
pub use surface::{Surface, SurfaceRgba16Float, SurfaceRgba32Float, SurfaceRgba8};
pub use trace::TracingTrace;

/// Supported ASTC formats for every standard 2D footprint.
///
/// The sRGB variants only differ in how endpoints are expanded.
/// Decoded sRGB texels are not converted to linear.
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "strum",
    derive(strum::EnumString, strum::Display, strum::FromRepr, strum::EnumIter)
)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ImageFormat {
    Astc4x4Unorm,
    Astc4x4Srgb,
    Astc5x4Unorm,
    Astc5x4Srgb,
    Astc5x5Unorm,
    Astc5x5Srgb,
    Astc6x5Unorm,
    Astc6x5Srgb,
    Astc6x6Unorm,
    Astc6x6Srgb,
    Astc8x5Unorm,
    Astc8x5Srgb,
    Astc8x6Unorm,
    Astc8x6Srgb,
    Astc8x8Unorm,
    Astc8x8Srgb,
    Astc10x5Unorm,
    Astc10x5Srgb,
    Astc10x6Unorm,
    Astc10x6Srgb,
    Astc10x8Unorm,
    Astc10x8Srgb,
    Astc10x10Unorm,
    Astc10x10Srgb,
    Astc12x10Unorm,
    Astc12x10Srgb,
    Astc12x12Unorm,
    Astc12x12Srgb,
}

impl ImageFormat {
    /// The block footprint in texels.
    pub fn footprint(&self) -> Footprint {
        match self {
            ImageFormat::Astc4x4Unorm | ImageFormat::Astc4x4Srgb => Footprint::F4X4,
            ImageFormat::Astc5x4Unorm | ImageFormat::Astc5x4Srgb => Footprint::F5X4,
            ImageFormat::Astc5x5Unorm | ImageFormat::Astc5x5Srgb => Footprint::F5X5,
            ImageFormat::Astc6x5Unorm | ImageFormat::Astc6x5Srgb => Footprint::F6X5,
            ImageFormat::Astc6x6Unorm | ImageFormat::Astc6x6Srgb => Footprint::F6X6,
            ImageFormat::Astc8x5Unorm | ImageFormat::Astc8x5Srgb => Footprint::F8X5,
            ImageFormat::Astc8x6Unorm | ImageFormat::Astc8x6Srgb => Footprint::F8X6,
            ImageFormat::Astc8x8Unorm | ImageFormat::Astc8x8Srgb => Footprint::F8X8,
            ImageFormat::Astc10x5Unorm | ImageFormat::Astc10x5Srgb => Footprint::F10X5,
            ImageFormat::Astc10x6Unorm | ImageFormat::Astc10x6Srgb => Footprint::F10X6,
            ImageFormat::Astc10x8Unorm | ImageFormat::Astc10x8Srgb => Footprint::F10X8,
            ImageFormat::Astc10x10Unorm | ImageFormat::Astc10x10Srgb => Footprint::F10X10,
            ImageFormat::Astc12x10Unorm | ImageFormat::Astc12x10Srgb => Footprint::F12X10,
            ImageFormat::Astc12x12Unorm | ImageFormat::Astc12x12Srgb => Footprint::F12X12,
        }
    }

    /// The width, height, and depth of a block in texels.
    pub fn block_dimensions(&self) -> (u32, u32, u32) {
        let footprint = self.footprint();
        (footprint.width(), footprint.height(), 1)
    }

    pub fn is_srgb(&self) -> bool {
        matches!(
            self,
            ImageFormat::Astc4x4Srgb
                | ImageFormat::Astc5x4Srgb
                | ImageFormat::Astc5x5Srgb
                | ImageFormat::Astc6x5Srgb
                | ImageFormat::Astc6x6Srgb
                | ImageFormat::Astc8x5Srgb
                | ImageFormat::Astc8x6Srgb
                | ImageFormat::Astc8x8Srgb
                | ImageFormat::Astc10x5Srgb
                | ImageFormat::Astc10x6Srgb
                | ImageFormat::Astc10x8Srgb
                | ImageFormat::Astc10x10Srgb
                | ImageFormat::Astc12x10Srgb
                | ImageFormat::Astc12x12Srgb
        )
    }

    /// The size of a compressed block, which is the same for all footprints.
    pub fn block_size_in_bytes(&self) -> usize {
        astcdec_rs::BLOCK_SIZE_IN_BYTES
    }

    /// The size in bytes of a tightly packed surface of `width` x `height` pixels.
    ///
    /// Returns [None] if the size would overflow.
    pub fn surface_size(&self, width: u32, height: u32) -> Option<usize> {
        let (block_width, block_height, _) = self.block_dimensions();
        div_round_up(width as usize, block_width as usize)
            .checked_mul(div_round_up(height as usize, block_height as usize))?
            .checked_mul(self.block_size_in_bytes())
    }
}

fn div_round_up(x: usize, d: usize) -> usize {
    (x + d - 1) / d
}

/// Decodes a tightly packed surface of dimensions `width` x `height` with the given `format` to RGBA8.
///
/// Blocks that fail to decode are filled with magenta.
/// Use [unpack_astc_2d_ldr] to check which blocks failed.
pub fn decode_surface_rgba8(
    width: u32,
    height: u32,
    data: &[u8],
    format: ImageFormat,
) -> Result<Vec<u8>, SurfaceError> {
    Surface {
        width,
        height,
        image_format: format,
        data,
    }
    .decode_rgba8()
    .map(|surface| surface.data)
}
