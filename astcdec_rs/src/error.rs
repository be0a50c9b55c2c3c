use thiserror::Error;

/// The reason a single block could not be decoded.
///
/// The output footprint for a failed block is filled with opaque magenta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("void extent blocks with HDR colors are not supported")]
    UnsupportedHdrVoidExtent,

    #[error("reserved block mode with bits 6 to 8 set")]
    ReservedBlockMode1,

    #[error("reserved block mode with bits 0 to 3 unset")]
    ReservedBlockMode2,

    #[error("dual plane blocks can not use 4 partitions")]
    DualPlaneAndTooManyPartitions,

    #[error("void extent has an empty texture coordinate range")]
    InvalidRangeInVoidExtent,

    #[error("weight grid {weight_width}x{weight_height} exceeds the block footprint {block_width}x{block_height}")]
    WeightGridExceedsBlockSize {
        weight_width: u8,
        weight_height: u8,
        block_width: u8,
        block_height: u8,
    },

    #[error("{available} bits are not enough to store {count} color endpoint values")]
    InvalidColourEndpointsSize { count: u8, available: i32 },

    #[error("{count} color endpoint values exceeds the maximum of 18")]
    InvalidColourEndpointsCount { count: u8 },

    #[error("{bits} weight bits is outside the valid range 24 to 96")]
    InvalidWeightBits { bits: u32 },

    #[error("{count} weights exceeds the maximum of 64")]
    InvalidNumWeights { count: u32 },
}
