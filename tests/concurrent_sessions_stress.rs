//! Concurrent Session Stress Tests
//!
//! WHY THIS TEST EXISTS:
//! Hosts decode many streams at once and share one algorithm registry across
//! threads. Sessions must be fully independent: no nonce history, cursor or
//! key material may leak from one session into another.
//!
//! WHAT WE'RE TESTING:
//! - Thread safety: many sessions over one shared registry
//! - Isolation: identical nonces in separate sessions are not reuse
//! - Data integrity: no corruption under contention
//! - Failure isolation: one thread's damaged stream does not affect others
//!
//! WHY STRESS TESTING MATTERS:
//! Concurrency bugs only manifest under high load. These tests start all
//! threads at a barrier to maximise overlap.

#![cfg(all(feature = "encryption", feature = "compression", feature = "checksum"))]

mod common;

use common::fixtures::*;
use dakt_decrypt::{
    AlgorithmRegistry, DecodeOptions, DecoderConfig, DecryptContext, KeyMaterial, StepOutcome,
};
use std::sync::{Arc, Barrier};
use std::thread;

fn shared_session(registry: &Arc<AlgorithmRegistry>, key: [u8; 32]) -> DecryptContext {
    let config = DecoderConfig::new(KeyMaterial::from_bytes(key), Arc::clone(registry));
    DecryptContext::open(config).expect("session should open")
}

#[test]
fn test_concurrent_sessions_shared_registry() {
    // WHY: The registry is read-only after setup and shared by every session

    let registry = Arc::new(AlgorithmRegistry::with_defaults());
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut key = TEST_KEY;
                key[0] = t as u8;
                let payloads: Vec<Vec<u8>> = (0..20)
                    .map(|i| format!("thread {t} chunk {i}").into_bytes())
                    .collect();
                let mut builder = StreamBuilder::new(key);
                for payload in &payloads {
                    builder = builder.chunk(STANDARD, payload);
                }
                let stream = builder.build();

                barrier.wait();

                let mut ctx = shared_session(&registry, key);
                let mut decoded = Vec::new();
                while ctx.is_open() {
                    if let StepOutcome::ChunkOk(chunk) = ctx.process_next(&stream).unwrap() {
                        decoded.push(chunk.plaintext.to_vec());
                    }
                }
                assert_eq!(decoded, payloads, "thread {t} decoded wrong data");
                ctx.finalize()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().expect("thread panicked");
        assert!(report.is_clean());
        assert_eq!(report.succeeded(), 20);
    }
}

#[test]
fn test_nonce_history_is_per_session() {
    // WHY: Every stream here uses the same nonces; reuse is only meaningful within one session

    let registry = Arc::new(AlgorithmRegistry::with_defaults());
    let stream = Arc::new(
        StreamBuilder::new(TEST_KEY)
            .chunk(STANDARD, SMALL_DATA)
            .chunk(STANDARD, UNICODE_DATA)
            .build(),
    );
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let stream = Arc::clone(&stream);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ctx = shared_session(&registry, TEST_KEY);
                ctx.run_to_end(&stream).unwrap().succeeded()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread panicked"), 2);
    }
}

#[test]
fn test_damaged_stream_isolated_across_threads() {
    let registry = Arc::new(AlgorithmRegistry::with_defaults());
    let barrier = Arc::new(Barrier::new(10));

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let builder = StreamBuilder::new(TEST_KEY)
                    .chunk(STANDARD, SMALL_DATA)
                    .chunk(STANDARD, SMALL_DATA);
                let second = builder.offset_of(1);
                let mut stream = builder.build();
                let damaged = t % 2 == 0;
                if damaged {
                    stream[second - 1] ^= 0xFF;
                }

                barrier.wait();
                let mut ctx = shared_session(&registry, TEST_KEY);
                let failed = ctx.run_to_end(&stream).unwrap().failed();
                (damaged, failed)
            })
        })
        .collect();

    for handle in handles {
        let (damaged, failed) = handle.join().expect("thread panicked");
        assert_eq!(failed, u64::from(damaged));
    }
}

#[test]
fn test_concurrent_registry_lookups() {
    use dakt_decrypt::AlgorithmKind;
    use dakt_decrypt::algorithms::ids;

    let registry = Arc::new(AlgorithmRegistry::with_defaults());
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    assert!(registry.contains(AlgorithmKind::Cipher, ids::CIPHER_AES_256_GCM));
                    assert!(registry.compressor(ids::COMPRESSOR_LZ4).is_ok());
                    assert!(registry.hash(ids::HASH_SHA256).is_ok());
                    assert!(registry.cipher(0xEE).is_err());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }
}

#[test]
fn test_options_shared_by_value() {
    // WHY: Options are cloned into each session; one session's settings cannot leak into another

    let registry = Arc::new(AlgorithmRegistry::with_defaults());
    let strict = DecodeOptions::default().with_stop_on_first_error(true);

    let builder = StreamBuilder::new(TEST_KEY)
        .chunk(STANDARD, SMALL_DATA)
        .chunk(STANDARD, SMALL_DATA)
        .chunk(STANDARD, SMALL_DATA);
    let first_end = builder.offset_of(1);
    let mut stream = builder.build();
    stream[first_end - 1] ^= 0xFF;
    let stream = Arc::new(stream);

    let spawn = |options: DecodeOptions| {
        let registry = Arc::clone(&registry);
        let stream = Arc::clone(&stream);
        thread::spawn(move || {
            let config = DecoderConfig::new(KeyMaterial::from_bytes(TEST_KEY), registry)
                .with_options(options);
            let mut ctx = DecryptContext::open(config).unwrap();
            ctx.run_to_end(&stream).unwrap().total_chunks()
        })
    };

    let strict_handle = spawn(strict);
    let lenient_handle = spawn(DecodeOptions::default());
    assert_eq!(strict_handle.join().unwrap(), 1);
    assert_eq!(lenient_handle.join().unwrap(), 3);
}
