//! Common test utilities and fixtures for the dakt-decrypt test suite.
//!
//! Shared stream builders, keys and data generators used across integration,
//! scenario, stress and property-based tests.

pub mod fixtures;

use dakt_decrypt::{AlgorithmRegistry, DecodeOptions, DecoderConfig, DecryptContext, KeyMaterial};
use std::sync::Arc;

/// Open a session over the default registry.
#[allow(dead_code)]
pub fn open_session(key: [u8; 32], options: DecodeOptions) -> DecryptContext {
    let config = DecoderConfig::new(
        KeyMaterial::from_bytes(key),
        Arc::new(AlgorithmRegistry::with_defaults()),
    )
    .with_options(options);
    DecryptContext::open(config).expect("default config should open")
}
