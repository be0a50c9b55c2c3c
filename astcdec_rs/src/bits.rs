/// A single 128-bit compressed block viewed as a little-endian bit stream.
///
/// Bit 0 is the least significant bit of the first byte.
/// Reads past the end of the block return zeros for the missing bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitReader(u128);

impl BitReader {
    pub fn new(block: &[u8; 16]) -> Self {
        Self(u128::from_le_bytes(*block))
    }

    /// Read `count` bits starting at bit `offset` with `count < 32`.
    pub fn read(&self, offset: u32, count: u32) -> u32 {
        debug_assert!(count < 32);
        self.read64(offset, count) as u32
    }

    /// Read `count` bits starting at bit `offset` with `count < 64`.
    pub fn read64(&self, offset: u32, count: u32) -> u64 {
        debug_assert!(count < 64);
        if offset >= 128 {
            return 0;
        }
        (self.0 >> offset) as u64 & ((1u64 << count) - 1)
    }

    /// Read the `count` bits directly below bit `offset` in reverse order.
    ///
    /// Weights are stored starting from the most significant bit of the block,
    /// so the highest bit of the range becomes bit 0 of the result.
    pub fn read_reversed(&self, offset: u32, count: u32) -> u32 {
        debug_assert!(count <= offset);
        if count == 0 {
            return 0;
        }
        self.read(offset - count, count).reverse_bits() >> (32 - count)
    }
}
