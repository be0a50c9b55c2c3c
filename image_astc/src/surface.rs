use half::f16;

use crate::{unpack_astc_2d_ldr, unpack_astc_2d_ldr_rgbaf16, ImageFormat, SurfaceError};

#[cfg(feature = "image")]
use crate::CreateImageError;

/// A compressed 2D surface with an image format known at runtime.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Surface<T> {
    /// The width of the surface in pixels.
    pub width: u32,
    /// The height of the surface in pixels.
    pub height: u32,
    /// The format of the bytes in [data](#structfield.data).
    pub image_format: ImageFormat,
    /// The compressed blocks in row-major order without additional padding.
    pub data: T,
}

/// An uncompressed RGBA8 surface with 4 bytes per pixel.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceRgba8<T> {
    /// The width of the surface in pixels.
    pub width: u32,
    /// The height of the surface in pixels.
    pub height: u32,
    /// The pixels in row-major order without additional padding.
    pub data: T,
}

/// An uncompressed RGBA half float surface with 4 elements per pixel.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceRgba16Float<T> {
    /// The width of the surface in pixels.
    pub width: u32,
    /// The height of the surface in pixels.
    pub height: u32,
    /// The pixels in row-major order without additional padding.
    pub data: T,
}

/// An uncompressed RGBA float surface with 4 elements per pixel.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceRgba32Float<T> {
    /// The width of the surface in pixels.
    pub width: u32,
    /// The height of the surface in pixels.
    pub height: u32,
    /// The pixels in row-major order without additional padding.
    pub data: T,
}

impl<T: AsRef<[u8]>> Surface<T> {
    /// Decode all blocks to RGBA8.
    ///
    /// Invalid blocks are filled with magenta.
    pub fn decode_rgba8(&self) -> Result<SurfaceRgba8<Vec<u8>>, SurfaceError> {
        let len = self.validate()?;
        let stride = self.width as usize * 4;

        let mut data = vec![0u8; len];
        unpack_astc_2d_ldr(
            &mut data,
            stride,
            self.data.as_ref(),
            self.block_row_size(),
            self.width,
            self.height,
            self.image_format,
        )?;

        Ok(SurfaceRgba8 {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// Decode all blocks to RGBA half float.
    ///
    /// Invalid blocks are filled with magenta.
    pub fn decode_rgbaf16(&self) -> Result<SurfaceRgba16Float<Vec<f16>>, SurfaceError> {
        let len = self.validate()?;
        let stride = self.width as usize * 4;

        let mut data = vec![f16::ZERO; len];
        unpack_astc_2d_ldr_rgbaf16(
            &mut data,
            stride,
            self.data.as_ref(),
            self.block_row_size(),
            self.width,
            self.height,
            self.image_format,
        )?;

        Ok(SurfaceRgba16Float {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// Decode all blocks to RGBA float.
    ///
    /// Values are converted from half float, so no precision is lost.
    pub fn decode_rgbaf32(&self) -> Result<SurfaceRgba32Float<Vec<f32>>, SurfaceError> {
        let surface = self.decode_rgbaf16()?;
        Ok(SurfaceRgba32Float {
            width: surface.width,
            height: surface.height,
            data: surface.data.iter().map(|v| v.to_f32()).collect(),
        })
    }

    /// Decode all blocks to an RGBA8 image.
    #[cfg(feature = "image")]
    pub fn decode_image(&self) -> Result<image::RgbaImage, CreateImageError> {
        self.decode_rgba8()?.to_image()
    }

    /// Decode all blocks to an RGBA float image.
    #[cfg(feature = "image")]
    pub fn decode_image_f32(&self) -> Result<image::Rgba32FImage, CreateImageError> {
        self.decode_rgbaf32()?.to_image()
    }

    fn block_row_size(&self) -> usize {
        let (block_width, _, _) = self.image_format.block_dimensions();
        crate::div_round_up(self.width as usize, block_width as usize)
            * self.image_format.block_size_in_bytes()
    }

    // Returns the number of elements in the decoded RGBA data.
    fn validate(&self) -> Result<usize, SurfaceError> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSizedSurface { width, height });
        }

        let overflow = || SurfaceError::PixelCountWouldOverflow { width, height };

        let expected = self
            .image_format
            .surface_size(width, height)
            .ok_or_else(overflow)?;
        let actual = self.data.as_ref().len();
        if actual < expected {
            return Err(SurfaceError::NotEnoughData { expected, actual });
        }

        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(overflow)
    }
}

#[cfg(feature = "image")]
impl SurfaceRgba8<Vec<u8>> {
    /// Convert the pixels to an image with the same dimensions.
    pub fn to_image(self) -> Result<image::RgbaImage, CreateImageError> {
        let data_length = self.data.len();
        image::RgbaImage::from_raw(self.width, self.height, self.data).ok_or(
            CreateImageError::InvalidSurfaceDimensions {
                width: self.width,
                height: self.height,
                data_length,
            },
        )
    }
}

#[cfg(feature = "image")]
impl SurfaceRgba32Float<Vec<f32>> {
    /// Convert the pixels to an image with the same dimensions.
    pub fn to_image(self) -> Result<image::Rgba32FImage, CreateImageError> {
        let data_length = self.data.len();
        image::Rgba32FImage::from_raw(self.width, self.height, self.data).ok_or(
            CreateImageError::InvalidSurfaceDimensions {
                width: self.width,
                height: self.height,
                data_length,
            },
        )
    }
}
