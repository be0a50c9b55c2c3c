#![no_main]

use astcdec_rs::Footprint;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    block: [u8; 16],
    footprint: u8,
    srgb: bool,
}

const FOOTPRINTS: [Footprint; 14] = [
    Footprint::F4X4,
    Footprint::F5X4,
    Footprint::F5X5,
    Footprint::F6X5,
    Footprint::F6X6,
    Footprint::F8X5,
    Footprint::F8X6,
    Footprint::F8X8,
    Footprint::F10X5,
    Footprint::F10X6,
    Footprint::F10X8,
    Footprint::F10X10,
    Footprint::F12X10,
    Footprint::F12X12,
];

fuzz_target!(|input: Input| {
    let footprint = FOOTPRINTS[input.footprint as usize % FOOTPRINTS.len()];

    // Decoding never panics and always produces the same output.
    let mut first = vec![0u8; footprint.texel_count() * 4];
    let mut second = vec![1u8; footprint.texel_count() * 4];
    let result = astcdec_rs::rgba8(&input.block, footprint, input.srgb, &mut first);
    assert_eq!(
        result,
        astcdec_rs::rgba8(&input.block, footprint, input.srgb, &mut second)
    );
    assert_eq!(first, second);

    let mut half = vec![half::f16::ZERO; footprint.texel_count() * 4];
    assert_eq!(
        result,
        astcdec_rs::rgbaf16(&input.block, footprint, input.srgb, &mut half)
    );
});
