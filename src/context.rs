//! Decode sessions.
//!
//! A [`DecryptContext`] walks one stream chunk by chunk. It owns the session
//! key, the cursor and the report, and moves through two states:
//!
//! ```text
//! Open --(exhausted | structural error | stop-on-error | close)--> Closed
//! ```
//!
//! A bad chunk is recorded and skipped. Only broken framing ends the session
//! on its own, since after that no chunk boundary can be trusted.
//!
//! # Example
//!
//! ```no_run
//! use dakt_decrypt::{AlgorithmRegistry, DecoderConfig, DecryptContext, KeyMaterial, StepOutcome};
//! use std::sync::Arc;
//!
//! # fn main() -> dakt_decrypt::Result<()> {
//! # let stream: Vec<u8> = Vec::new();
//! let registry = Arc::new(AlgorithmRegistry::with_defaults());
//! let config = DecoderConfig::new(KeyMaterial::from_bytes([0u8; 32]), registry);
//! let mut ctx = DecryptContext::open(config)?;
//!
//! while ctx.is_open() {
//!     match ctx.process_next(&stream)? {
//!         StepOutcome::ChunkOk(chunk) => println!("chunk {}: {} bytes", chunk.index, chunk.plaintext.len()),
//!         StepOutcome::ChunkFailed { index, kind } => eprintln!("chunk {index} failed: {kind}"),
//!         StepOutcome::StreamExhausted | StepOutcome::StreamCorrupted(_) => {}
//!     }
//! }
//! let report = ctx.finalize();
//! println!("{} of {} chunks decoded", report.succeeded(), report.total_chunks());
//! # Ok(())
//! # }
//! ```

use crate::error::{DecodeError, ErrorKind, Result};
use crate::header::{ChunkHeaderParser, ChunkInfo};
use crate::keys::KeyMaterial;
use crate::metrics::DecodeMetrics;
use crate::plan::{self, ChunkDecodePlan};
use crate::registry::AlgorithmRegistry;
use crate::report::{ChunkOutcome, ChunkStatus, CloseReason, DecryptReport, StreamFault};
use crate::transform::ChunkTransformer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

/// Default ceiling on a single chunk's decompressed size (64MB).
pub const DEFAULT_MAX_OUTPUT_SIZE: usize = 64 * 1024 * 1024;

/// Session behavior knobs. Deserializable so hosts can load them from config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Hard ceiling on decompressed bytes per chunk. Must be set and positive.
    pub max_output_size: Option<usize>,
    /// Close the session on the first chunk-level failure.
    pub stop_on_first_error: bool,
    /// Accept chunks that declare a zero-length payload.
    pub allow_empty_chunks: bool,
    /// Fail chunks whose nonce was already used in this session.
    pub reject_nonce_reuse: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_output_size: Some(DEFAULT_MAX_OUTPUT_SIZE),
            stop_on_first_error: false,
            allow_empty_chunks: false,
            reject_nonce_reuse: true,
        }
    }
}

impl DecodeOptions {
    pub fn with_max_output_size(mut self, max_output_size: usize) -> Self {
        self.max_output_size = Some(max_output_size);
        self
    }

    pub fn with_stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }

    pub fn with_allow_empty_chunks(mut self, allow: bool) -> Self {
        self.allow_empty_chunks = allow;
        self
    }

    pub fn with_reject_nonce_reuse(mut self, reject: bool) -> Self {
        self.reject_nonce_reuse = reject;
        self
    }
}

/// Everything needed to open a session.
#[derive(Debug)]
pub struct DecoderConfig {
    pub key: Option<KeyMaterial>,
    pub registry: Arc<AlgorithmRegistry>,
    pub options: DecodeOptions,
}

impl DecoderConfig {
    pub fn new(key: KeyMaterial, registry: Arc<AlgorithmRegistry>) -> Self {
        Self {
            key: Some(key),
            registry,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Open,
    Closed,
}

/// A successfully decoded chunk.
#[derive(Debug)]
pub struct DecodedChunk {
    pub index: u64,
    /// Byte range of the whole chunk, header included.
    pub range: Range<usize>,
    pub plaintext: Zeroizing<Vec<u8>>,
}

/// What one call to [`DecryptContext::process_next`] did.
#[derive(Debug)]
pub enum StepOutcome {
    ChunkOk(DecodedChunk),
    /// The chunk was skipped; its failure is in the report.
    ChunkFailed { index: u64, kind: ErrorKind },
    /// No bytes left. The session is closed.
    StreamExhausted,
    /// Framing is broken. The session is closed.
    StreamCorrupted(ErrorKind),
}

pub struct DecryptContext {
    key: Option<KeyMaterial>,
    registry: Arc<AlgorithmRegistry>,
    options: DecodeOptions,
    max_output_size: usize,
    parser: ChunkHeaderParser,
    state: SessionState,
    cursor: usize,
    next_index: u64,
    seen_nonces: HashSet<Vec<u8>>,
    last_metrics: Option<DecodeMetrics>,
    report: DecryptReport,
}

impl DecryptContext {
    /// Validate `config` and start a session.
    pub fn open(config: DecoderConfig) -> Result<Self> {
        let DecoderConfig {
            key,
            registry,
            options,
        } = config;

        let key = key.ok_or_else(|| {
            DecodeError::InvalidConfiguration("key material is required".to_string())
        })?;
        if registry.is_empty() {
            return Err(DecodeError::InvalidConfiguration(
                "algorithm registry is empty".to_string(),
            ));
        }
        let max_output_size = match options.max_output_size {
            Some(size) if size > 0 => size,
            _ => {
                return Err(DecodeError::InvalidConfiguration(
                    "max_output_size must be positive".to_string(),
                ));
            }
        };

        debug!(
            max_output_size,
            algorithms = registry.len(),
            stop_on_first_error = options.stop_on_first_error,
            "decode session opened"
        );

        Ok(Self {
            key: Some(key),
            registry,
            parser: ChunkHeaderParser::new(options.allow_empty_chunks),
            options,
            max_output_size,
            state: SessionState::Open,
            cursor: 0,
            next_index: 0,
            seen_nonces: HashSet::new(),
            last_metrics: None,
            report: DecryptReport::new(),
        })
    }

    /// Decode the chunk at the cursor.
    ///
    /// `source` must be the same stream on every call; the cursor is an offset into it.
    #[instrument(skip_all, fields(cursor = self.cursor, index = self.next_index))]
    pub fn process_next(&mut self, source: &[u8]) -> Result<StepOutcome> {
        if self.state == SessionState::Closed {
            return Err(DecodeError::SessionClosed);
        }

        if self.cursor == source.len() {
            debug!(
                chunks = self.report.total_chunks(),
                failed = self.report.failed(),
                "stream exhausted"
            );
            self.shut(CloseReason::Exhausted);
            return Ok(StepOutcome::StreamExhausted);
        }

        let (info, consumed) = match self.parser.parse(source, self.cursor) {
            Ok(parsed) => parsed,
            Err(err) => {
                let kind = err.kind();
                warn!(offset = self.cursor, error = %err, "chunk framing broken, ending session");
                self.report.record_fault(StreamFault {
                    offset: self.cursor,
                    kind,
                });
                self.shut(CloseReason::StreamCorrupted);
                return Ok(StepOutcome::StreamCorrupted(kind));
            }
        };

        let index = self.next_index;
        self.next_index += 1;
        self.cursor += consumed;

        match self.decode_chunk(&info, source, index) {
            Ok((plaintext, metrics)) => {
                debug!(
                    index,
                    size = info.header.size,
                    plaintext_len = plaintext.len(),
                    micros = metrics.total_time_micros(),
                    "chunk decoded"
                );
                self.last_metrics = Some(metrics);
                self.report.record(ChunkOutcome {
                    index,
                    range: info.range(),
                    status: ChunkStatus::Ok {
                        plaintext_len: plaintext.len(),
                    },
                });
                Ok(StepOutcome::ChunkOk(DecodedChunk {
                    index,
                    range: info.range(),
                    plaintext,
                }))
            }
            Err(err) => {
                let kind = err.kind();
                warn!(index, offset = info.offset, error = %err, "chunk failed");
                self.last_metrics = None;
                self.report.record(ChunkOutcome {
                    index,
                    range: info.range(),
                    status: ChunkStatus::Failed { kind },
                });
                if self.options.stop_on_first_error {
                    self.shut(CloseReason::StoppedOnError);
                }
                Ok(StepOutcome::ChunkFailed { index, kind })
            }
        }
    }

    fn decode_chunk(
        &mut self,
        info: &ChunkInfo,
        source: &[u8],
        index: u64,
    ) -> Result<(Zeroizing<Vec<u8>>, DecodeMetrics)> {
        let plan = plan::resolve(info, &self.registry)?;
        let nonce = self.fresh_nonce(&plan, source)?;

        let key = self.key.as_ref().ok_or(DecodeError::SessionClosed)?;
        let result = ChunkTransformer::new(key, self.max_output_size).apply(&plan, source, index);

        // A nonce counts as used once its chunk authenticated, even if a later stage failed
        if let Some(nonce) = nonce {
            if !matches!(result, Err(DecodeError::DecryptFailure)) {
                self.seen_nonces.insert(nonce);
            }
        }

        result.map(|out| (out.plaintext, out.metrics))
    }

    /// The chunk's nonce, if it must be tracked, after checking it was not seen before.
    fn fresh_nonce(&self, plan: &ChunkDecodePlan, source: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.options.reject_nonce_reuse || plan.cipher.is_none() {
            return Ok(None);
        }
        let nonce = plan
            .nonce
            .slice(source)
            .ok_or(DecodeError::DecryptFailure)?;
        if self.seen_nonces.contains(nonce) {
            warn!("nonce reuse detected");
            return Err(DecodeError::DecryptFailure);
        }
        Ok(Some(nonce.to_vec()))
    }

    /// Drive the session until it closes, dropping plaintext as it is produced.
    ///
    /// `SessionClosed` if the session was already closed on entry.
    pub fn run_to_end(&mut self, source: &[u8]) -> Result<&DecryptReport> {
        if self.state == SessionState::Closed {
            return Err(DecodeError::SessionClosed);
        }
        while self.is_open() {
            self.process_next(source)?;
        }
        Ok(&self.report)
    }

    /// Close the session and wipe the key. Idempotent.
    pub fn close(&mut self) {
        self.shut(CloseReason::Cancelled);
    }

    /// Close the session and hand over the report.
    pub fn finalize(mut self) -> DecryptReport {
        self.close();
        std::mem::take(&mut self.report)
    }

    fn shut(&mut self, reason: CloseReason) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        // Dropping wipes the key (ZeroizeOnDrop)
        self.key = None;
        self.seen_nonces.clear();
        self.report.freeze(reason);
        debug!(?reason, "decode session closed");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Offset of the next chunk header.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn report(&self) -> &DecryptReport {
        &self.report
    }

    /// Stage timings of the last successfully decoded chunk.
    pub fn last_metrics(&self) -> Option<&DecodeMetrics> {
        self.last_metrics.as_ref()
    }

    /// Whether key material is still held.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }
}

impl std::fmt::Debug for DecryptContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptContext")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("next_index", &self.next_index)
            .field("has_key", &self.key.is_some())
            .finish_non_exhaustive()
    }
}
