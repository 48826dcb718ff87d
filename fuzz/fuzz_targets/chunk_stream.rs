#![no_main]

use arbitrary::Arbitrary;
use dakt_decrypt::{
    AlgorithmRegistry, DecodeOptions, DecoderConfig, DecryptContext, HEADER_LEN, KeyMaterial,
    SessionState, StepOutcome,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct ChunkStreamTestCase {
    key: [u8; 32],
    stop_on_first_error: bool,
    allow_empty_chunks: bool,
    /// Output ceiling, kept small so bombs trip it quickly
    max_output_size: u16,
    stream: Vec<u8>,
}

fuzz_target!(|test_case: ChunkStreamTestCase| {
    // Attack scenarios:
    // 1. Size fields that overflow or point past the end of the stream
    // 2. Unknown and reserved type codes
    // 3. Payloads too short for their plan's nonce, tag and digest
    // 4. Compressed bodies that expand past the ceiling

    let options = DecodeOptions::default()
        .with_max_output_size(usize::from(test_case.max_output_size).max(1))
        .with_stop_on_first_error(test_case.stop_on_first_error)
        .with_allow_empty_chunks(test_case.allow_empty_chunks);
    let config = DecoderConfig::new(
        KeyMaterial::from_bytes(test_case.key),
        Arc::new(AlgorithmRegistry::with_defaults()),
    )
    .with_options(options);
    let Ok(mut ctx) = DecryptContext::open(config) else {
        return;
    };

    let stream = &test_case.stream;
    let max_steps = stream.len() / HEADER_LEN + 2;
    let mut steps = 0;

    // Property 1: The session never panics and always terminates
    while ctx.is_open() {
        steps += 1;
        assert!(steps <= max_steps, "session did not terminate");

        let before = ctx.cursor();
        match ctx.process_next(stream) {
            Ok(StepOutcome::ChunkOk(chunk)) => {
                // Property 2: Decoded chunks lie inside the stream and respect the ceiling
                assert!(chunk.range.end <= stream.len());
                assert!(chunk.plaintext.len() <= usize::from(test_case.max_output_size).max(1));
                assert!(ctx.cursor() > before);
            }
            Ok(StepOutcome::ChunkFailed { .. }) => assert!(ctx.cursor() > before),
            Ok(StepOutcome::StreamExhausted | StepOutcome::StreamCorrupted(_)) => {
                assert_eq!(ctx.state(), SessionState::Closed);
                assert!(!ctx.has_key());
            }
            Err(err) => panic!("open session returned usage error: {err}"),
        }
    }

    // Property 3: The report accounts for exactly the consumed bytes
    let report = ctx.finalize();
    assert!(report.is_frozen());
    assert!(report.bytes_consumed() <= stream.len() as u64);
    assert_eq!(report.succeeded() + report.failed(), report.total_chunks());
});
