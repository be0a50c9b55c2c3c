//! Procedural partition assignment from a 10 bit seed.

fn hash52(input: u32) -> u32 {
    let mut p = input;
    p ^= p >> 15;
    p = p.wrapping_sub(p << 17);
    p = p.wrapping_add(p << 7);
    p = p.wrapping_add(p << 4);
    p ^= p >> 5;
    p = p.wrapping_add(p << 16);
    p ^= p >> 7;
    p ^= p >> 3;
    p ^= p << 6;
    p ^= p >> 17;
    p
}

/// Find the partition index in `0..partition_count` for the texel at `x`, `y`, `z`.
///
/// `small_block` should be set for footprints with fewer than 31 texels.
pub fn select_partition(
    seed: u32,
    x: u32,
    y: u32,
    z: u32,
    partition_count: u32,
    small_block: bool,
) -> usize {
    if partition_count <= 1 {
        return 0;
    }

    let (x, y, z) = if small_block {
        (x << 1, y << 1, z << 1)
    } else {
        (x, y, z)
    };

    let seed = seed + (partition_count - 1) * 1024;
    let rnum = hash52(seed);

    let mut seeds = [
        rnum,
        rnum >> 4,
        rnum >> 8,
        rnum >> 12,
        rnum >> 16,
        rnum >> 20,
        rnum >> 24,
        rnum >> 28,
        rnum >> 18,
        rnum >> 22,
        rnum >> 26,
        (rnum >> 30) | (rnum << 2),
    ];
    for s in &mut seeds {
        *s &= 0xF;
        *s *= *s;
    }

    let (sh1, sh2) = if seed & 1 != 0 {
        (
            if seed & 2 != 0 { 4 } else { 5 },
            if partition_count == 3 { 6 } else { 5 },
        )
    } else {
        (
            if partition_count == 3 { 6 } else { 5 },
            if seed & 2 != 0 { 4 } else { 5 },
        )
    };
    let sh3 = if seed & 0x10 != 0 { sh1 } else { sh2 };

    for (i, s) in seeds.iter_mut().enumerate() {
        let shift = match i {
            0..=7 if i % 2 == 0 => sh1,
            0..=7 => sh2,
            _ => sh3,
        };
        *s >>= shift;
    }

    let score = |sx: u32, sy: u32, sz: u32, offset: u32| {
        (sx.wrapping_mul(x))
            .wrapping_add(sy.wrapping_mul(y))
            .wrapping_add(sz.wrapping_mul(z))
            .wrapping_add(rnum >> offset)
            & 0x3F
    };

    let a = score(seeds[0], seeds[1], seeds[10], 14);
    let b = score(seeds[2], seeds[3], seeds[11], 10);
    let c = if partition_count >= 3 {
        score(seeds[4], seeds[5], seeds[8], 6)
    } else {
        0
    };
    let d = if partition_count >= 4 {
        score(seeds[6], seeds[7], seeds[9], 2)
    } else {
        0
    };

    // Ties go to the lowest partition index.
    if a >= b && a >= c && a >= d {
        0
    } else if b >= c && b >= d {
        1
    } else if c >= d {
        2
    } else {
        3
    }
}
