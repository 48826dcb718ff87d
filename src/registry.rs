//! Identifier to implementation table.
//!
//! The registry is filled once, wrapped in an `Arc`, and then only read.
//! Sessions on different threads share the same instance.

use crate::algorithms::{CipherKind, CompressorKind, HashKind};
use crate::error::{DecodeError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Algorithm family a registry slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    Cipher,
    Compressor,
    Hash,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlgorithmKind::Cipher => "cipher",
            AlgorithmKind::Compressor => "compressor",
            AlgorithmKind::Hash => "hash",
        })
    }
}

/// A registered implementation. The variant fixes the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Cipher(CipherKind),
    Compressor(CompressorKind),
    Hash(HashKind),
}

impl Algorithm {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Algorithm::Cipher(_) => AlgorithmKind::Cipher,
            Algorithm::Compressor(_) => AlgorithmKind::Compressor,
            Algorithm::Hash(_) => AlgorithmKind::Hash,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Cipher(c) => c.name(),
            Algorithm::Compressor(c) => c.name(),
            Algorithm::Hash(h) => h.name(),
        }
    }
}

impl From<CipherKind> for Algorithm {
    fn from(kind: CipherKind) -> Self {
        Algorithm::Cipher(kind)
    }
}

impl From<CompressorKind> for Algorithm {
    fn from(kind: CompressorKind) -> Self {
        Algorithm::Compressor(kind)
    }
}

impl From<HashKind> for Algorithm {
    fn from(kind: HashKind) -> Self {
        Algorithm::Hash(kind)
    }
}

/// Maps `(kind, id)` pairs to concrete implementations.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    entries: HashMap<(AlgorithmKind, u8), Algorithm>,
}

impl AlgorithmRegistry {
    /// An empty registry. Resolves nothing until populated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every implementation compiled into this build, under its format id.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for cipher in CipherKind::compiled() {
            registry.register(cipher.format_id(), cipher);
        }
        for compressor in CompressorKind::compiled() {
            registry.register(compressor.format_id(), compressor);
        }
        for hash in HashKind::compiled() {
            registry.register(hash.format_id(), hash);
        }
        registry
    }

    /// Register `implementation` under `id` in its own family.
    ///
    /// Last write wins; the displaced entry is returned.
    pub fn register(&mut self, id: u8, implementation: impl Into<Algorithm>) -> Option<Algorithm> {
        let implementation = implementation.into();
        self.entries.insert((implementation.kind(), id), implementation)
    }

    pub fn lookup(&self, kind: AlgorithmKind, id: u8) -> Result<Algorithm> {
        self.entries
            .get(&(kind, id))
            .copied()
            .ok_or(DecodeError::UnsupportedAlgorithm { kind, id })
    }

    pub fn cipher(&self, id: u8) -> Result<CipherKind> {
        match self.lookup(AlgorithmKind::Cipher, id)? {
            Algorithm::Cipher(cipher) => Ok(cipher),
            _ => Err(DecodeError::UnsupportedAlgorithm {
                kind: AlgorithmKind::Cipher,
                id,
            }),
        }
    }

    pub fn compressor(&self, id: u8) -> Result<CompressorKind> {
        match self.lookup(AlgorithmKind::Compressor, id)? {
            Algorithm::Compressor(compressor) => Ok(compressor),
            _ => Err(DecodeError::UnsupportedAlgorithm {
                kind: AlgorithmKind::Compressor,
                id,
            }),
        }
    }

    pub fn hash(&self, id: u8) -> Result<HashKind> {
        match self.lookup(AlgorithmKind::Hash, id)? {
            Algorithm::Hash(hash) => Ok(hash),
            _ => Err(DecodeError::UnsupportedAlgorithm {
                kind: AlgorithmKind::Hash,
                id,
            }),
        }
    }

    pub fn contains(&self, kind: AlgorithmKind, id: u8) -> bool {
        self.entries.contains_key(&(kind, id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (AlgorithmKind, u8, Algorithm)> + '_ {
        self.entries
            .iter()
            .map(|(&(kind, id), &algorithm)| (kind, id, algorithm))
    }
}
