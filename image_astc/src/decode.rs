use astcdec_rs::{DecodeError, Decoder, Texel, BLOCK_SIZE_IN_BYTES};
use bytemuck::Pod;
use half::f16;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{div_round_up, trace::TracingTrace, ImageFormat, SurfaceError};

const CHANNELS: usize = 4;

// The largest footprint is 12x12.
const MAX_BLOCK_TEXELS: usize = 144;

/// The outcome of decoding every block in a surface.
///
/// Blocks that fail to decode are filled with opaque magenta
/// and do not prevent decoding the remaining blocks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    /// The total number of blocks including failed blocks.
    pub blocks: usize,
    pub failed_blocks: usize,
    /// The first failed block in row-major order.
    pub first_error: Option<BlockError>,
}

/// The error for a block at column `x` and row `y` of the block grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockError {
    pub x: u32,
    pub y: u32,
    pub error: DecodeError,
}

impl DecodeReport {
    /// Returns `true` if every block decoded successfully.
    pub fn is_ok(&self) -> bool {
        self.failed_blocks == 0
    }

    // Reports must be merged in row-major order to preserve the first error.
    fn merge(self, other: Self) -> Self {
        Self {
            blocks: self.blocks + other.blocks,
            failed_blocks: self.failed_blocks + other.failed_blocks,
            first_error: self.first_error.or(other.first_error),
        }
    }
}

/// Decode a `width` x `height` ASTC surface in `src` to RGBA8 texels in `dst`.
///
/// Each row of blocks starts `src_stride` bytes after the previous row.
/// Each row of texels starts `dst_stride` bytes after the previous row.
/// Only texels within `width` x `height` are written,
/// so partial blocks on the right and bottom edges are cropped.
///
/// Returns an error only if the buffers or strides are not large enough.
/// Blocks with invalid data are reported in the returned [DecodeReport].
pub fn unpack_astc_2d_ldr(
    dst: &mut [u8],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<DecodeReport, SurfaceError> {
    unpack_blocks(dst, dst_stride, src, src_stride, width, height, format)
}

/// Decode a `width` x `height` ASTC surface in `src` to RGBA half float texels in `dst`.
///
/// This works like [unpack_astc_2d_ldr] except that `dst_stride` is in elements instead of bytes.
pub fn unpack_astc_2d_ldr_rgbaf16(
    dst: &mut [f16],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<DecodeReport, SurfaceError> {
    unpack_blocks(dst, dst_stride, src, src_stride, width, height, format)
}

struct Layout {
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
    blocks_wide: usize,
    blocks_high: usize,
}

fn validate(
    dst_len: usize,
    dst_stride: usize,
    src_len: usize,
    src_stride: usize,
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<Layout, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::ZeroSizedSurface { width, height });
    }

    let (block_width, block_height, _) = format.block_dimensions();
    let layout = Layout {
        width: width as usize,
        height: height as usize,
        block_width: block_width as usize,
        block_height: block_height as usize,
        blocks_wide: div_round_up(width as usize, block_width as usize),
        blocks_high: div_round_up(height as usize, block_height as usize),
    };
    let overflow = SurfaceError::PixelCountWouldOverflow { width, height };

    let min_src_stride = layout.blocks_wide * BLOCK_SIZE_IN_BYTES;
    if src_stride < min_src_stride {
        return Err(SurfaceError::SourceStrideTooSmall {
            stride: src_stride,
            min_stride: min_src_stride,
        });
    }

    let min_dst_stride = layout.width.checked_mul(CHANNELS).ok_or(overflow.clone())?;
    if dst_stride < min_dst_stride {
        return Err(SurfaceError::OutputStrideTooSmall {
            stride: dst_stride,
            min_stride: min_dst_stride,
        });
    }

    // The last row does not need to include the padding from the stride.
    let expected_src = (layout.blocks_high - 1)
        .checked_mul(src_stride)
        .and_then(|n| n.checked_add(min_src_stride))
        .ok_or(overflow.clone())?;
    if src_len < expected_src {
        return Err(SurfaceError::NotEnoughData {
            expected: expected_src,
            actual: src_len,
        });
    }

    let expected_dst = (layout.height - 1)
        .checked_mul(dst_stride)
        .and_then(|n| n.checked_add(min_dst_stride))
        .ok_or(overflow)?;
    if dst_len < expected_dst {
        return Err(SurfaceError::OutputTooSmall {
            expected: expected_dst,
            actual: dst_len,
        });
    }

    Ok(layout)
}

fn unpack_blocks<T>(
    dst: &mut [T],
    dst_stride: usize,
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    format: ImageFormat,
) -> Result<DecodeReport, SurfaceError>
where
    T: Texel + Pod + Send,
{
    let layout = validate(dst.len(), dst_stride, src.len(), src_stride, width, height, format)?;

    let trace = TracingTrace;
    let decoder = Decoder::new(format.footprint(), format.is_srgb()).with_trace(&trace);

    // Each row of blocks writes to a separate band of output rows.
    let decode_band = |(by, band): (usize, &mut [T])| {
        let mut report = DecodeReport::default();
        let mut texels = [[T::zeroed(); CHANNELS]; MAX_BLOCK_TEXELS];

        let rows = layout.block_height.min(layout.height - by * layout.block_height);
        for bx in 0..layout.blocks_wide {
            let offset = by * src_stride + bx * BLOCK_SIZE_IN_BYTES;
            let mut block = [0u8; BLOCK_SIZE_IN_BYTES];
            block.copy_from_slice(&src[offset..offset + BLOCK_SIZE_IN_BYTES]);

            report.blocks += 1;
            let output = bytemuck::cast_slice_mut::<[T; CHANNELS], T>(&mut texels);
            if let Err(error) = decoder.decode(&block, output) {
                tracing::debug!(x = bx, y = by, %error, "failed to decode block");
                report.failed_blocks += 1;
                report.first_error.get_or_insert(BlockError {
                    x: bx as u32,
                    y: by as u32,
                    error,
                });
            }

            let x = bx * layout.block_width;
            let columns = layout.block_width.min(layout.width - x);
            put_rgba_block(band, dst_stride, &texels, layout.block_width, x, rows, columns);
        }
        report
    };

    let band_len = dst_stride * layout.block_height;

    #[cfg(feature = "rayon")]
    let report = dst
        .par_chunks_mut(band_len)
        .take(layout.blocks_high)
        .enumerate()
        .map(decode_band)
        .reduce(DecodeReport::default, DecodeReport::merge);

    #[cfg(not(feature = "rayon"))]
    let report = dst
        .chunks_mut(band_len)
        .take(layout.blocks_high)
        .enumerate()
        .map(decode_band)
        .fold(DecodeReport::default(), DecodeReport::merge);

    if !report.is_ok() {
        tracing::warn!(
            failed_blocks = report.failed_blocks,
            blocks = report.blocks,
            ?format,
            "surface contains blocks that failed to decode"
        );
    }

    Ok(report)
}

fn put_rgba_block<T: Pod>(
    band: &mut [T],
    stride: usize,
    texels: &[[T; CHANNELS]],
    block_width: usize,
    x: usize,
    rows: usize,
    columns: usize,
) {
    // Blocks on the right and bottom edges may only be partially used.
    let elements_per_row = columns * CHANNELS;
    for (row, row_texels) in texels.chunks_exact(block_width).take(rows).enumerate() {
        let start = row * stride + x * CHANNELS;
        band[start..start + elements_per_row]
            .copy_from_slice(&bytemuck::cast_slice(row_texels)[..elements_per_row]);
    }
}
