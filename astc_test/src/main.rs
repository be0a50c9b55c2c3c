use image_astc::{ImageFormat, Surface};
use tracing_subscriber::EnvFilter;

// Decode synthesized blocks that cover each endpoint value
// and save the results for comparing against other decoders.
// Set RUST_LOG=image_astc=trace to print the decoding steps for each block.
fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    save_png(luminance(), "luminance.png");
    save_png(luminance_srgb(), "luminance_srgb.png");
    save_png(void_extent(), "void_extent.png");
    save_png(dual_plane(), "dual_plane.png");
    save_png(reserved(), "reserved.png");
}

fn save_png(surface: Surface<Vec<u8>>, path: &str) {
    // Check for failed blocks before converting to an image.
    let (block_width, _, _) = surface.image_format.block_dimensions();
    let mut rgba = vec![0u8; surface.width as usize * surface.height as usize * 4];
    let report = image_astc::unpack_astc_2d_ldr(
        &mut rgba,
        surface.width as usize * 4,
        &surface.data,
        (surface.width / block_width) as usize * 16,
        surface.width,
        surface.height,
        surface.image_format,
    )
    .unwrap();
    tracing::info!(
        path,
        blocks = report.blocks,
        failed_blocks = report.failed_blocks,
        "decoded surface"
    );

    surface.decode_image().unwrap().save(path).unwrap();
}

fn luminance() -> Surface<Vec<u8>> {
    // 8-bit luminance end points with 2-bit weights.
    astc(16, ImageFormat::Astc4x4Unorm, |i, j| {
        luminance_block(i * 17, j * 17).to_le_bytes()
    })
}

fn luminance_srgb() -> Surface<Vec<u8>> {
    astc(16, ImageFormat::Astc4x4Srgb, |i, j| {
        luminance_block(i * 17, j * 17).to_le_bytes()
    })
}

fn luminance_block(l0: u128, l1: u128) -> u128 {
    // 4x4 weights with 2 bits each and 1 partition using luminance.
    let block = 66 | (l0 << 17) | (l1 << 25);

    // Use each unique 2-bit weight in every row.
    (0..16).fold(block, |block, i| weight(block, i, 2, i % 4))
}

fn void_extent() -> Surface<Vec<u8>> {
    // 16-bit color channels are truncated to 8 bits.
    astc(16, ImageFormat::Astc8x8Unorm, |i, j| {
        let color = [i * 0x1111, j * 0x1111, (i ^ j) * 0x1111, 0xFFFF];
        void_extent_block(color).to_le_bytes()
    })
}

fn void_extent_block(color: [u128; 4]) -> u128 {
    0xDFC
        | (((1 << 52) - 1) << 12)
        | (color[0] << 64)
        | (color[1] << 80)
        | (color[2] << 96)
        | (color[3] << 112)
}

fn dual_plane() -> Surface<Vec<u8>> {
    // RGBA direct end points with a separate plane for alpha.
    astc(16, ImageFormat::Astc6x6Unorm, |i, j| {
        dual_plane_block(i * 17, j * 17).to_le_bytes()
    })
}

fn dual_plane_block(a0: u128, a1: u128) -> u128 {
    // 2x2 weights for each plane with 3 bits each using RGBA direct.
    let rgba = [(255, 0), (0, 255), (128, 128), (a0, a1)];
    let mut block = 1311 | (12 << 13) | (3 << 102);
    for (c, (v0, v1)) in rgba.into_iter().enumerate() {
        block |= v0 << (17 + 16 * c) | v1 << (25 + 16 * c);
    }

    // Blend RGB horizontally and alpha vertically.
    let rgb = [0, 7, 0, 7];
    let alpha = [0, 0, 7, 7];
    (0..4).fold(block, |block, i| {
        let block = weight(block, 2 * i, 3, rgb[i as usize]);
        weight(block, 2 * i + 1, 3, alpha[i as usize])
    })
}

fn reserved() -> Surface<Vec<u8>> {
    // Reserved block modes decode to magenta.
    astc(4, ImageFormat::Astc12x12Srgb, |i, j| {
        if (i + j) % 2 == 0 {
            void_extent_block([0, 0, 0, 0xFFFF]).to_le_bytes()
        } else {
            0u128.to_le_bytes()
        }
    })
}

/// Write a weight of `count` bits with its low bit at the top of the block.
fn weight(mut block: u128, index: u32, count: u32, value: u32) -> u128 {
    for i in 0..count {
        if value & (1 << i) != 0 {
            block |= 1 << (127 - count * index - i);
        }
    }
    block
}

fn astc(
    blocks: u128,
    image_format: ImageFormat,
    f: impl Fn(u128, u128) -> [u8; 16],
) -> Surface<Vec<u8>> {
    // Each block is in a separate row and column.
    let mut data = Vec::new();
    for j in 0..blocks {
        for i in 0..blocks {
            data.extend_from_slice(&f(i, j));
        }
    }

    let (block_width, block_height, _) = image_format.block_dimensions();
    Surface {
        width: block_width * blocks as u32,
        height: block_height * blocks as u32,
        image_format,
        data,
    }
}
