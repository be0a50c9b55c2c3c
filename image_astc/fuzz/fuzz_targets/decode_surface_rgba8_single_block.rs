#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (image_astc::ImageFormat, [u8; 16])| {
    let (image_format, block) = input;

    // Every ASTC block is 16 bytes regardless of the footprint.
    let (width, height, _) = image_format.block_dimensions();
    let surface = image_astc::Surface {
        width,
        height,
        image_format,
        data: &block[..],
    };

    // Decoding never fails for a complete block.
    let rgba = surface.decode_rgba8().unwrap();
    assert_eq!((width * height * 4) as usize, rgba.data.len());
});
