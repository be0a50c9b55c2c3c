use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("surface dimensions {width} x {height} contain no pixels")]
    ZeroSizedSurface { width: u32, height: u32 },

    #[error("surface pixel count {width} x {height} would overflow")]
    PixelCountWouldOverflow { width: u32, height: u32 },

    #[error("expected surface to have at least {expected} bytes but found {actual}")]
    NotEnoughData { expected: usize, actual: usize },

    #[error("expected output to have at least {expected} elements but found {actual}")]
    OutputTooSmall { expected: usize, actual: usize },

    #[error("source stride {stride} is smaller than the {min_stride} bytes in a row of blocks")]
    SourceStrideTooSmall { stride: usize, min_stride: usize },

    #[error("output stride {stride} is smaller than the {min_stride} elements in a row of pixels")]
    OutputStrideTooSmall { stride: usize, min_stride: usize },
}

#[cfg(feature = "image")]
#[derive(Debug, Error)]
pub enum CreateImageError {
    #[error("data length {data_length} is not valid for a {width}x{height} image")]
    InvalidSurfaceDimensions {
        width: u32,
        height: u32,
        data_length: usize,
    },

    #[error("error decoding surface: {0}")]
    DecodeSurface(#[from] SurfaceError),
}
