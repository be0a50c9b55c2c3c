use half::f16;

use crate::{
    bits::BitReader,
    endpoints::{decode_cems, decode_endpoint_pair, endpoint_quantization, MAX_ENDPOINT_VALUES},
    error::DecodeError,
    ise::{unpack_sequence, unquantize_endpoint, unquantize_weight, Direction},
    mode::{decode_block_mode, BlockMode},
    partition::select_partition,
    trace::{block_trace, Trace},
    weights::{infill, WeightGrid, MAX_TEXELS, MAX_WEIGHTS},
};

/// A decoded channel type.
pub trait Texel: Copy + private::Sealed {
    /// Opaque magenta for blocks that fail to decode.
    const ERROR: [Self; 4];

    /// Convert a value in `0..=0xFFFF` representing `0.0..=1.0`.
    fn from_unorm16(value: u16) -> Self;
}

mod private {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for half::f16 {}
}

impl Texel for u8 {
    const ERROR: [Self; 4] = [255, 0, 255, 255];

    fn from_unorm16(value: u16) -> Self {
        (value >> 8) as u8
    }
}

impl Texel for f16 {
    const ERROR: [Self; 4] = [f16::ONE, f16::ZERO, f16::ONE, f16::ONE];

    fn from_unorm16(value: u16) -> Self {
        // Divide by 65536 and truncate the mantissa.
        // The largest value is 1.0 instead of the next lowest float.
        if value == 0xFFFF {
            return f16::ONE;
        }
        if value < 4 {
            return f16::from_bits(value << 8);
        }

        let value = value as u32;
        let n = value.leading_zeros() - 16;
        let mantissa = ((value << (n + 1)) & 0xFFFF) >> 6;
        let exponent = 14 - n;
        f16::from_bits(((exponent << 10) | mantissa) as u16)
    }
}

/// The intermediate state for decoding a single block.
pub(crate) struct Block {
    width: usize,
    height: usize,
    weights_quantized: [u8; MAX_WEIGHTS + 4],
    endpoints_quantized: [u8; MAX_ENDPOINT_VALUES + 4],
    endpoints: [[[u8; 4]; 2]; 4],
    infill: [[u8; MAX_TEXELS]; 2],
}

/// The fields needed to compute each texel after decoding the block header.
struct TexelParams {
    partitions: u32,
    seed: u32,
    color_component_selector: Option<usize>,
}

enum Decoded {
    Texels(TexelParams),
    Constant([u16; 4]),
}

impl Block {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            weights_quantized: [0; MAX_WEIGHTS + 4],
            endpoints_quantized: [0; MAX_ENDPOINT_VALUES + 4],
            endpoints: [[[0; 4]; 2]; 4],
            infill: [[0; MAX_TEXELS]; 2],
        }
    }

    /// Decode `bits` into the first `width * height * 4` elements of `output`.
    ///
    /// The footprint is filled with [Texel::ERROR] if decoding fails.
    pub fn decode<T: Texel>(
        &mut self,
        bits: &BitReader,
        srgb: bool,
        trace: &dyn Trace,
        output: &mut [T],
    ) -> Result<(), DecodeError> {
        let output = &mut output[..self.width * self.height * 4];
        match self.decode_header(bits, trace) {
            Ok(Decoded::Texels(params)) => {
                self.write_texels(&params, srgb, output);
                Ok(())
            }
            Ok(Decoded::Constant(color)) => {
                let color = color.map(T::from_unorm16);
                for texel in output.chunks_exact_mut(4) {
                    texel.copy_from_slice(&color);
                }
                Ok(())
            }
            Err(e) => {
                block_trace!(trace, "error: {e}");
                for texel in output.chunks_exact_mut(4) {
                    texel.copy_from_slice(&T::ERROR);
                }
                Err(e)
            }
        }
    }

    fn decode_header(&mut self, bits: &BitReader, trace: &dyn Trace) -> Result<Decoded, DecodeError> {
        let mode = decode_block_mode(bits)?;
        block_trace!(trace, "block mode: {mode:?}");

        let mode = match mode {
            BlockMode::Weights(mode) => mode,
            BlockMode::VoidExtent(void_extent) => return Ok(Decoded::Constant(void_extent.color)),
        };

        let grid = WeightGrid::new(&mode);
        grid.validate(self.width, self.height)?;
        let weight_bits = grid.packed_bits();
        block_trace!(
            trace,
            "weight grid: {}x{}x{}, range: {:?}, bits: {weight_bits}",
            grid.width,
            grid.height,
            grid.planes,
            grid.quantization
        );

        let partitions = bits.read(11, 2) as usize + 1;
        if mode.dual_plane && partitions == 4 {
            return Err(DecodeError::DualPlaneAndTooManyPartitions);
        }
        let seed = bits.read(13, 10);

        let cems = decode_cems(bits, partitions, weight_bits);
        let config_bits = cems.config_bits + if mode.dual_plane { 2 } else { 0 };
        let count = cems.value_count();
        let quantization = endpoint_quantization(count, config_bits, weight_bits)?;
        block_trace!(
            trace,
            "partitions: {partitions}, seed: {seed}, modes: {:?}, endpoint values: {count}, range: {quantization:?}",
            &cems.modes[..partitions]
        );

        let color_component_selector = mode
            .dual_plane
            .then(|| bits.read(128 - weight_bits - cems.extra_bits - 2, 2) as usize);

        unpack_sequence(
            bits,
            cems.endpoints_start(),
            Direction::Forward,
            quantization,
            count,
            &mut self.endpoints_quantized,
        );
        let mut values = [0u8; MAX_ENDPOINT_VALUES];
        for (value, quantized) in values[..count].iter_mut().zip(&self.endpoints_quantized) {
            *value = unquantize_endpoint(quantization, *quantized);
        }

        let mut offset = 0;
        for (endpoints, cem) in self.endpoints.iter_mut().zip(&cems.modes[..partitions]) {
            let end = offset + cem.value_count();
            *endpoints = decode_endpoint_pair(*cem, &values[offset..end]);
            offset = end;

            if cem.is_hdr() {
                block_trace!(trace, "unsupported HDR endpoint mode {cem:?}");
            }
        }
        block_trace!(trace, "endpoints: {:?}", &self.endpoints[..partitions]);

        let weight_count = grid.count();
        unpack_sequence(
            bits,
            128,
            Direction::Reversed,
            grid.quantization,
            weight_count,
            &mut self.weights_quantized,
        );
        let mut weights = [0u8; MAX_WEIGHTS];
        for (weight, quantized) in weights[..weight_count].iter_mut().zip(&self.weights_quantized) {
            *weight = unquantize_weight(grid.quantization, *quantized);
        }

        infill(
            &weights[..weight_count],
            &grid,
            self.width,
            self.height,
            &mut self.infill,
        );

        Ok(Decoded::Texels(TexelParams {
            partitions: partitions as u32,
            seed,
            color_component_selector,
        }))
    }

    fn write_texels<T: Texel>(&self, params: &TexelParams, srgb: bool, output: &mut [T]) {
        let small_block = self.width * self.height < 31;

        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                let partition = select_partition(
                    params.seed,
                    x as u32,
                    y as u32,
                    0,
                    params.partitions,
                    small_block,
                );
                let [e0, e1] = self.endpoints[partition];

                for c in 0..4 {
                    let plane = if params.color_component_selector == Some(c) { 1 } else { 0 };
                    let w = self.infill[plane][i] as u32;

                    let c0 = expand_unorm8(e0[c], srgb);
                    let c1 = expand_unorm8(e1[c], srgb);
                    let value = (c0 * (64 - w) + c1 * w + 32) >> 6;
                    output[i * 4 + c] = T::from_unorm16(value as u16);
                }
            }
        }
    }
}

fn expand_unorm8(value: u8, srgb: bool) -> u32 {
    let value = value as u32;
    if srgb {
        (value << 8) | 0x80
    } else {
        (value << 8) | value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NoTrace;
    use std::sync::Mutex;

    /// Pack fields into a block for testing.
    #[derive(Default)]
    struct BlockWriter(u128);

    impl BlockWriter {
        fn bits(mut self, offset: u32, count: u32, value: u128) -> Self {
            assert!(value < 1 << count);
            self.0 |= value << offset;
            self
        }

        /// Write a weight of `count` bits with its low bit at the top of the block.
        fn weight(mut self, index: u32, count: u32, value: u32) -> Self {
            for i in 0..count {
                if value & (1 << i) != 0 {
                    self.0 |= 1 << (127 - count * index - i);
                }
            }
            self
        }

        fn reader(&self) -> BitReader {
            BitReader::new(&self.0.to_le_bytes())
        }
    }

    #[derive(Default)]
    struct RecordTrace(Mutex<Vec<String>>);

    impl Trace for RecordTrace {
        fn trace(&self, args: std::fmt::Arguments<'_>) {
            self.0.lock().unwrap().push(args.to_string());
        }
    }

    fn decode_rgba8(
        block: &BlockWriter,
        width: usize,
        height: usize,
    ) -> (Result<(), DecodeError>, Vec<u8>) {
        let mut output = vec![0u8; width * height * 4];
        let result = Block::new(width, height).decode(&block.reader(), false, &NoTrace, &mut output);
        (result, output)
    }

    fn solid_gray(gray: u128) -> BlockWriter {
        // 4x4 weights with 2 bits each and 1 partition using luminance.
        BlockWriter::default()
            .bits(0, 11, 66)
            .bits(17, 8, gray)
            .bits(25, 8, gray)
    }

    fn dual_plane_rgb() -> BlockWriter {
        // 2x2 weights for each plane with 3 bits each using RGB direct.
        let mut block = BlockWriter::default()
            .bits(0, 11, 1311)
            .bits(13, 4, 8)
            .bits(17, 8, 10)
            .bits(25, 8, 200)
            .bits(33, 8, 20)
            .bits(41, 8, 210)
            .bits(49, 8, 30)
            .bits(57, 8, 220)
            .bits(102, 2, 2);
        // The second plane selects the second endpoint.
        for i in 0..4 {
            block = block.weight(2 * i + 1, 3, 7);
        }
        block
    }

    fn void_extent(color: [u128; 4]) -> BlockWriter {
        BlockWriter::default()
            .bits(0, 12, 0xDFC)
            .bits(12, 52, (1 << 52) - 1)
            .bits(64, 16, color[0])
            .bits(80, 16, color[1])
            .bits(96, 16, color[2])
            .bits(112, 16, color[3])
    }

    fn assert_magenta(output: &[u8]) {
        for texel in output.chunks_exact(4) {
            assert_eq!([255u8, 0, 255, 255], texel);
        }
    }

    #[test]
    fn solid_luminance_4x4() {
        let (result, output) = decode_rgba8(&solid_gray(100), 4, 4);
        assert_eq!(Ok(()), result);
        assert_eq!([100u8, 100, 100, 255].repeat(16), output);
    }

    #[test]
    fn solid_luminance_ignores_weights() {
        // Equal endpoints produce the same color for every weight.
        let block = (0..16).fold(solid_gray(100), |block, i| block.weight(i, 2, i % 4));
        let (result, output) = decode_rgba8(&block, 4, 4);
        assert_eq!(Ok(()), result);
        assert_eq!([100u8, 100, 100, 255].repeat(16), output);
    }

    #[test]
    fn dual_plane_selector_below_extra_cem_bits() {
        // 2x2 weights for each plane with 3 bits each and 2 partitions.
        // Partition 0 uses luminance direct and partition 1 uses luminance base+offset.
        // The second mode is stored in the 2 extra bits at 102 below the 24 weight bits,
        // so the component selector moves down to bit 100.
        let seed = 77;
        let mut block = BlockWriter::default()
            .bits(0, 11, 1311)
            .bits(11, 2, 1)
            .bits(13, 10, seed)
            .bits(23, 6, 1)
            .bits(29, 8, 0)
            .bits(37, 8, 255)
            .bits(45, 8, 0)
            .bits(53, 8, 0x3F)
            .bits(100, 2, 2)
            .bits(102, 2, 1);
        // The second plane selects the second endpoint for blue.
        for i in 0..4 {
            block = block.weight(2 * i + 1, 3, 7);
        }

        let trace = RecordTrace::default();
        let mut output = [0u8; 4 * 4 * 4];
        let result = Block::new(4, 4).decode(&block.reader(), false, &trace, &mut output);
        assert_eq!(Ok(()), result);

        for (i, texel) in output.chunks_exact(4).enumerate() {
            let (x, y) = (i as u32 % 4, i as u32 / 4);
            let expected = match select_partition(seed as u32, x, y, 0, 2, true) {
                0 => [0u8, 0, 255, 255],
                _ => [0, 0, 63, 255],
            };
            assert_eq!(expected, texel);
        }

        let messages = trace.0.lock().unwrap();
        assert!(messages
            .iter()
            .any(|m| m.contains("[LdrLuminanceDirect, LdrLuminanceBaseOffset]")));
    }

    #[test]
    fn trit_weights() {
        // 4x4 weights in the trit range 0..=2 use 26 bits.
        // Each group of 5 trits with no mantissa bits is a single 8 bit value.
        // 0xB5 decodes to all ones, and the truncated last group keeps only 2 bits.
        let mut block = BlockWriter::default()
            .bits(0, 11, 81)
            .bits(17, 8, 0)
            .bits(25, 8, 255);
        for group in 0..3 {
            block = block.weight(group, 8, 0xB5);
        }
        block = block.weight(24, 1, 1);

        // A weight of 1 unquantizes to 32 for an even blend.
        let (result, output) = decode_rgba8(&block, 4, 4);
        assert_eq!(Ok(()), result);
        assert_eq!([128u8, 128, 128, 255].repeat(16), output);
    }

    #[test]
    fn quint_weights() {
        // 4x4 weights in the quint range 0..=4 use 38 bits.
        // Each group of 3 quints with no mantissa bits is a single 7 bit value.
        // 82 decodes to all twos, and the truncated last group keeps only 3 bits.
        let mut block = BlockWriter::default()
            .bits(0, 11, 82)
            .bits(17, 8, 0)
            .bits(25, 8, 255);
        for group in 0..5 {
            block = block.weight(group, 7, 82);
        }
        block = block.weight(36, 1, 1);

        // A weight of 2 unquantizes to 32 for an even blend.
        let (result, output) = decode_rgba8(&block, 4, 4);
        assert_eq!(Ok(()), result);
        assert_eq!([128u8, 128, 128, 255].repeat(16), output);
    }

    #[test]
    fn solid_luminance_f16_white() {
        let mut output = [f16::ZERO; 4 * 4 * 4];
        Block::new(4, 4)
            .decode(&solid_gray(255).reader(), false, &NoTrace, &mut output)
            .unwrap();
        assert!(output.iter().all(|c| *c == f16::ONE));
    }

    #[test]
    fn solid_luminance_srgb() {
        let mut linear = [f16::ZERO; 4 * 4 * 4];
        Block::new(4, 4)
            .decode(&solid_gray(100).reader(), false, &NoTrace, &mut linear)
            .unwrap();
        let mut srgb = [f16::ZERO; 4 * 4 * 4];
        Block::new(4, 4)
            .decode(&solid_gray(100).reader(), true, &NoTrace, &mut srgb)
            .unwrap();

        assert_eq!(0x3646, linear[0].to_bits());
        assert_eq!(0x3648, srgb[0].to_bits());
    }

    #[test]
    fn dual_plane_overrides_blue() {
        let (result, output) = decode_rgba8(&dual_plane_rgb(), 4, 4);
        assert_eq!(Ok(()), result);
        assert_eq!([10u8, 20, 220, 255].repeat(16), output);
    }

    #[test]
    fn void_extent_fills_footprint() {
        let block = void_extent([0xFFFF, 0x8000, 0x00FF, 0x1234]);
        let (result, output) = decode_rgba8(&block, 6, 5);
        assert_eq!(Ok(()), result);
        assert_eq!([255u8, 128, 0, 18].repeat(30), output);
    }

    #[test]
    fn void_extent_f16() {
        let mut output = [f16::ZERO; 4 * 4 * 4];
        Block::new(4, 4)
            .decode(
                &void_extent([0xFFFF, 0x8000, 0, 0xFFFF]).reader(),
                false,
                &NoTrace,
                &mut output,
            )
            .unwrap();
        for texel in output.chunks_exact(4) {
            assert_eq!([f16::ONE, f16::from_f32(0.5), f16::ZERO, f16::ONE], texel);
        }
    }

    #[test]
    fn reserved_block_mode_magenta() {
        let (result, output) = decode_rgba8(&BlockWriter::default(), 4, 4);
        assert_eq!(Err(DecodeError::ReservedBlockMode2), result);
        assert_magenta(&output);

        let (result, output) = decode_rgba8(&BlockWriter::default().bits(0, 11, 0x1C0), 8, 8);
        assert_eq!(Err(DecodeError::ReservedBlockMode1), result);
        assert_magenta(&output);
    }

    #[test]
    fn error_fills_f16_magenta() {
        let mut output = [f16::ZERO; 5 * 5 * 4];
        let result = Block::new(5, 5).decode(&BitReader::new(&[0; 16]), false, &NoTrace, &mut output);
        assert_eq!(Err(DecodeError::ReservedBlockMode2), result);
        for texel in output.chunks_exact(4) {
            assert_eq!([f16::ONE, f16::ZERO, f16::ONE, f16::ONE], texel);
        }
    }

    #[test]
    fn too_many_endpoint_values() {
        // 4 partitions that all use RGBA direct.
        let block = BlockWriter::default()
            .bits(0, 11, 66)
            .bits(11, 2, 3)
            .bits(23, 6, 48);
        let (result, output) = decode_rgba8(&block, 4, 4);
        assert_eq!(
            Err(DecodeError::InvalidColourEndpointsCount { count: 32 }),
            result
        );
        assert_magenta(&output);
    }

    #[test]
    fn weight_grid_exceeds_footprint() {
        // 12x2 weights with 1 bit each.
        let block = BlockWriter::default().bits(0, 11, 4);
        let (result, output) = decode_rgba8(&block, 4, 4);
        assert!(matches!(
            result,
            Err(DecodeError::WeightGridExceedsBlockSize { .. })
        ));
        assert_magenta(&output);

        let (result, output) = decode_rgba8(&block, 12, 12);
        assert_eq!(Ok(()), result);
        assert_eq!([0u8, 0, 0, 255].repeat(144), output);
    }

    #[test]
    fn invalid_weight_bits() {
        let (result, _) = decode_rgba8(&BlockWriter::default().bits(0, 11, 1), 4, 4);
        assert_eq!(Err(DecodeError::InvalidWeightBits { bits: 8 }), result);
    }

    #[test]
    fn invalid_num_weights() {
        let (result, _) = decode_rgba8(&BlockWriter::default().bits(0, 11, 1124), 12, 12);
        assert_eq!(Err(DecodeError::InvalidNumWeights { count: 120 }), result);
    }

    #[test]
    fn dual_plane_four_partitions() {
        let block = BlockWriter::default().bits(0, 11, 1311).bits(11, 2, 3);
        let (result, _) = decode_rgba8(&block, 4, 4);
        assert_eq!(Err(DecodeError::DualPlaneAndTooManyPartitions), result);
    }

    #[test]
    fn not_enough_endpoint_bits() {
        // 6x4 weights with 4 bits each leaves 15 bits for RGBA endpoints.
        let block = BlockWriter::default().bits(0, 11, 834).bits(13, 4, 12);
        let (result, _) = decode_rgba8(&block, 6, 6);
        assert_eq!(
            Err(DecodeError::InvalidColourEndpointsSize {
                count: 8,
                available: 15
            }),
            result
        );
    }

    #[test]
    fn two_partitions_luminance() {
        let seed = 77;
        let block = BlockWriter::default()
            .bits(0, 11, 66)
            .bits(11, 2, 1)
            .bits(13, 10, seed)
            .bits(29, 8, 40)
            .bits(37, 8, 40)
            .bits(45, 8, 220)
            .bits(53, 8, 220);
        let (result, output) = decode_rgba8(&block, 4, 4);
        assert_eq!(Ok(()), result);

        for (i, texel) in output.chunks_exact(4).enumerate() {
            let (x, y) = (i as u32 % 4, i as u32 / 4);
            let expected = match select_partition(seed as u32, x, y, 0, 2, true) {
                0 => [40u8, 40, 40, 255],
                _ => [220, 220, 220, 255],
            };
            assert_eq!(expected, texel);
        }
    }

    #[test]
    fn decode_is_deterministic() {
        let block = dual_plane_rgb();
        let (_, first) = decode_rgba8(&block, 4, 4);
        let (_, second) = decode_rgba8(&block, 4, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn block_state_reused() {
        // Decoding a valid block after an error produces the same result.
        let mut block = Block::new(4, 4);
        let mut output = [0u8; 64];
        block
            .decode(&BitReader::new(&[0; 16]), false, &NoTrace, &mut output)
            .unwrap_err();
        block
            .decode(&solid_gray(7).reader(), false, &NoTrace, &mut output)
            .unwrap();
        assert_eq!([7u8, 7, 7, 255].repeat(16), output);
    }

    #[test]
    fn trace_reports_stages() {
        let trace = RecordTrace::default();
        let mut output = [0u8; 64];
        Block::new(4, 4)
            .decode(&dual_plane_rgb().reader(), false, &trace, &mut output)
            .unwrap();

        let messages = trace.0.lock().unwrap();
        assert!(messages[0].starts_with("block mode: Weights"));
        assert!(messages.iter().any(|m| m.starts_with("endpoints: ")));
    }

    #[test]
    fn trace_reports_errors() {
        let trace = RecordTrace::default();
        let mut output = [0u8; 64];
        Block::new(4, 4)
            .decode(&BitReader::new(&[0; 16]), false, &trace, &mut output)
            .unwrap_err();
        assert_eq!(
            vec![format!("error: {}", DecodeError::ReservedBlockMode2)],
            *trace.0.lock().unwrap()
        );
    }

    #[test]
    fn f16_from_unorm16() {
        assert_eq!(f16::ZERO, f16::from_unorm16(0));
        assert_eq!(f16::ONE, f16::from_unorm16(0xFFFF));
        assert_eq!(f16::from_f32(0.5), f16::from_unorm16(0x8000));
        assert_eq!(f16::from_f32(0.25), f16::from_unorm16(0x4000));
        assert_eq!(0x0100, f16::from_unorm16(1).to_bits());
        assert_eq!(0x0400, f16::from_unorm16(4).to_bits());
        assert_eq!(0x3BFF, f16::from_unorm16(0xFFFE).to_bits());
    }

    #[test]
    fn u8_from_unorm16() {
        assert_eq!(0, u8::from_unorm16(0x00FF));
        assert_eq!(1, u8::from_unorm16(0x0100));
        assert_eq!(255, u8::from_unorm16(0xFFFF));
    }
}
