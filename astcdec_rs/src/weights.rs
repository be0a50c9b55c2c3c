use crate::{
    error::DecodeError,
    ise::{Quantization, WEIGHT_RANGES},
    mode::WeightGridMode,
};

/// The maximum number of weights stored in a block including both planes.
pub const MAX_WEIGHTS: usize = 64;

/// The maximum number of texels in a 2D footprint.
pub const MAX_TEXELS: usize = 144;

/// The decimated grid of weights for one or two planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightGrid {
    pub width: usize,
    pub height: usize,
    pub planes: usize,
    pub quantization: Quantization,
}

impl WeightGrid {
    pub fn new(mode: &WeightGridMode) -> Self {
        Self {
            width: mode.width as usize,
            height: mode.height as usize,
            planes: if mode.dual_plane { 2 } else { 1 },
            quantization: WEIGHT_RANGES[mode.high_precision as usize][mode.range as usize - 2],
        }
    }

    /// The number of weights for all planes.
    pub fn count(&self) -> usize {
        self.width * self.height * self.planes
    }

    /// The number of bits at the top of the block used to store the weights.
    pub fn packed_bits(&self) -> u32 {
        self.quantization.packed_bits(self.count() as u32)
    }

    /// Check the grid against the block footprint and the limits on stored weights.
    pub fn validate(&self, block_width: usize, block_height: usize) -> Result<(), DecodeError> {
        if self.width > block_width || self.height > block_height {
            return Err(DecodeError::WeightGridExceedsBlockSize {
                weight_width: self.width as u8,
                weight_height: self.height as u8,
                block_width: block_width as u8,
                block_height: block_height as u8,
            });
        }

        let count = self.count();
        if count > MAX_WEIGHTS {
            return Err(DecodeError::InvalidNumWeights {
                count: count as u32,
            });
        }

        let bits = self.packed_bits();
        if !(24..=96).contains(&bits) {
            return Err(DecodeError::InvalidWeightBits { bits });
        }

        Ok(())
    }
}

/// Bilinearly upsample each plane of unquantized `weights` to the full block footprint.
///
/// Weights are stored interleaved by plane.
pub fn infill(
    weights: &[u8],
    grid: &WeightGrid,
    block_width: usize,
    block_height: usize,
    output: &mut [[u8; MAX_TEXELS]; 2],
) {
    let ds = (1024 + block_width / 2) / (block_width - 1);
    let dt = (1024 + block_height / 2) / (block_height - 1);
    let count = grid.count();

    for plane in 0..grid.planes {
        for t in 0..block_height {
            for s in 0..block_width {
                let gs = (ds * s * (grid.width - 1) + 32) >> 6;
                let gt = (dt * t * (grid.height - 1) + 32) >> 6;
                let (js, fs) = (gs >> 4, (gs & 0xF) as i32);
                let (jt, ft) = (gt >> 4, (gt & 0xF) as i32);

                // Samples past the edge of the grid always have a weight of zero.
                let sample = |offset: usize| {
                    let index = (js + jt * grid.width + offset) * grid.planes + plane;
                    weights.get(index).filter(|_| index < count).copied().unwrap_or(0) as i32
                };

                let w11 = (fs * ft + 8) >> 4;
                let w10 = ft - w11;
                let w01 = fs - w11;
                let w00 = 16 - fs - ft + w11;

                let sum = sample(0) * w00
                    + sample(1) * w01
                    + sample(grid.width) * w10
                    + sample(grid.width + 1) * w11;
                output[plane][t * block_width + s] = ((sum + 8) >> 4) as u8;
            }
        }
    }
}
