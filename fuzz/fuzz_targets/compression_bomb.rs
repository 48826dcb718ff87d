#![no_main]

use arbitrary::Arbitrary;
use dakt_decrypt::algorithms::ids;
use dakt_decrypt::{AlgorithmRegistry, CompressorKind, DecodeError};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct CompressionBombTestCase {
    /// Compressor id as it would appear in a type code
    compressor: u8,
    /// Output ceiling (small, so expanding inputs hit it)
    ceiling: u16,
    /// Repeated-byte run to prepend (cheap way to reach extreme ratios)
    run_len: u16,
    run_byte: u8,
    /// Raw compressed bytes, valid or not
    data: Vec<u8>,
}

fuzz_target!(|test_case: CompressionBombTestCase| {
    // Attack scenarios:
    // 1. Decompression bomb: tiny input that claims or produces huge output
    // 2. Malformed frames: truncated or corrupt LZ4 / zstd streams
    // 3. Ceiling edge cases: zero and exact-size ceilings

    let registry = AlgorithmRegistry::with_defaults();
    let Ok(compressor) = registry.compressor(test_case.compressor % (ids::MAX_COMPRESSOR + 1))
    else {
        return;
    };

    let mut input = vec![test_case.run_byte; test_case.run_len as usize];
    input.extend_from_slice(&test_case.data);
    let ceiling = test_case.ceiling as usize;

    // Property 1: Decompression NEVER panics
    let result = compressor.decompress(&input, ceiling);

    match result {
        // Property 2: Output never exceeds the ceiling, in length or in capacity
        Ok(output) => {
            assert!(output.len() <= ceiling, "output {} > ceiling {}", output.len(), ceiling);
            assert!(
                output.capacity() <= ceiling,
                "capacity {} > ceiling {}",
                output.capacity(),
                ceiling
            );
            if compressor == CompressorKind::Store {
                assert_eq!(output.as_slice(), input.as_slice());
            }
        }
        // Property 3: Failures are transform-class errors only
        Err(err) => assert!(
            matches!(
                err,
                DecodeError::OutputTooLarge { .. } | DecodeError::DecompressFailure(_)
            ),
            "unexpected error {err:?}"
        ),
    }
});
