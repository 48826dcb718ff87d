//! Chunk framing.
//!
//! Every chunk starts with a fixed 8-byte header:
//!
//! ```text
//! +----------------+----------------+==================+
//! | type (u32 LE)  | size (u32 LE)  | payload (size B) |
//! +----------------+----------------+==================+
//! ```
//!
//! The parser only checks framing. What the type code means is the resolver's
//! business, so a chunk with an unknown type can still be skipped.

use crate::error::{DecodeError, Result};

/// Fixed header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Raw chunk header as read from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHeader {
    pub type_code: u32,
    pub size: u32,
}

impl ChunkHeader {
    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let [t0, t1, t2, t3, s0, s1, s2, s3] = *bytes;
        Self {
            type_code: u32::from_le_bytes([t0, t1, t2, t3]),
            size: u32::from_le_bytes([s0, s1, s2, s3]),
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&self.type_code.to_le_bytes());
        out[4..].copy_from_slice(&self.size.to_le_bytes());
        out
    }
}

/// A validated `[start, start + len)` range into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Exclusive end. Spans are built from checked arithmetic, so this cannot wrap.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the bytes this span covers, or `None` if it falls outside `source`.
    pub fn slice<'a>(&self, source: &'a [u8]) -> Option<&'a [u8]> {
        source.get(self.start..self.start.checked_add(self.len)?)
    }
}

/// Framing facts about one chunk. The payload is not copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    pub header: ChunkHeader,
    /// Stream offset of the header's first byte.
    pub offset: usize,
    pub payload: Span,
}

impl ChunkInfo {
    /// Whole chunk including the header.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.payload.end()
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len
    }
}

/// Reads chunk headers and validates their declared sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkHeaderParser {
    pub allow_empty_chunks: bool,
}

impl ChunkHeaderParser {
    pub fn new(allow_empty_chunks: bool) -> Self {
        Self { allow_empty_chunks }
    }

    /// Parse the chunk starting at `offset`.
    ///
    /// Returns the chunk and the number of bytes it occupies (header + payload).
    pub fn parse(&self, source: &[u8], offset: usize) -> Result<(ChunkInfo, usize)> {
        let available = source.len().saturating_sub(offset);
        let header_bytes: &[u8; HEADER_LEN] = source
            .get(offset..)
            .and_then(|rest| rest.get(..HEADER_LEN))
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(DecodeError::MalformedHeader {
                offset,
                available,
                needed: HEADER_LEN,
            })?;
        let header = ChunkHeader::from_bytes(header_bytes);

        let payload_start = offset + HEADER_LEN;
        let remaining = source.len() - payload_start;
        let invalid = DecodeError::InvalidSize {
            offset,
            declared: header.size,
            remaining,
        };

        if header.size == 0 && !self.allow_empty_chunks {
            return Err(invalid);
        }

        let payload_len = usize::try_from(header.size).map_err(|_| invalid.clone())?;
        let payload_end = payload_start
            .checked_add(payload_len)
            .filter(|&end| end <= source.len())
            .ok_or(invalid)?;

        let info = ChunkInfo {
            header,
            offset,
            payload: Span::new(payload_start, payload_len),
        };
        Ok((info, payload_end - offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(type_code: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = ChunkHeader {
            type_code,
            size: payload.len() as u32,
        }
        .to_bytes()
        .to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_header_layout_is_little_endian() {
        let header = ChunkHeader {
            type_code: 0x0102_0304,
            size: 0x10,
        };
        assert_eq!(header.to_bytes(), [0x04, 0x03, 0x02, 0x01, 0x10, 0, 0, 0]);
        assert_eq!(ChunkHeader::from_bytes(&header.to_bytes()), header);
    }

    #[test]
    fn test_parse_single_chunk() {
        let stream = chunk(7, b"payload");
        let (info, consumed) = ChunkHeaderParser::default().parse(&stream, 0).unwrap();

        assert_eq!(consumed, stream.len());
        assert_eq!(info.header.type_code, 7);
        assert_eq!(info.payload, Span::new(8, 7));
        assert_eq!(info.payload.slice(&stream), Some(&b"payload"[..]));
        assert_eq!(info.range(), 0..15);
    }

    #[test]
    fn test_parse_at_offset() {
        let mut stream = chunk(1, b"abc");
        stream.extend(chunk(2, b"defg"));

        let (info, consumed) = ChunkHeaderParser::default().parse(&stream, 11).unwrap();
        assert_eq!(info.offset, 11);
        assert_eq!(info.header.type_code, 2);
        assert_eq!(consumed, 12);
        assert_eq!(info.payload.slice(&stream), Some(&b"defg"[..]));
    }

    #[test]
    fn test_short_header_is_malformed() {
        let parser = ChunkHeaderParser::default();
        assert_eq!(
            parser.parse(&[1, 2, 3], 0),
            Err(DecodeError::MalformedHeader {
                offset: 0,
                available: 3,
                needed: HEADER_LEN
            })
        );

        // Offset beyond the end
        assert!(matches!(
            parser.parse(&[0u8; 4], 10),
            Err(DecodeError::MalformedHeader { available: 0, .. })
        ));
    }

    #[test]
    fn test_oversized_declared_size() {
        let mut stream = ChunkHeader {
            type_code: 1,
            size: 100,
        }
        .to_bytes()
        .to_vec();
        stream.extend_from_slice(&[0u8; 10]);

        assert_eq!(
            ChunkHeaderParser::default().parse(&stream, 0),
            Err(DecodeError::InvalidSize {
                offset: 0,
                declared: 100,
                remaining: 10
            })
        );
    }

    #[test]
    fn test_max_size_never_overflows() {
        let stream = ChunkHeader {
            type_code: 1,
            size: u32::MAX,
        }
        .to_bytes();
        assert!(matches!(
            ChunkHeaderParser::default().parse(&stream, 0),
            Err(DecodeError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_empty_chunks_policy() {
        let stream = chunk(1, b"");
        assert!(matches!(
            ChunkHeaderParser::default().parse(&stream, 0),
            Err(DecodeError::InvalidSize { declared: 0, .. })
        ));

        let (info, consumed) = ChunkHeaderParser::new(true).parse(&stream, 0).unwrap();
        assert!(info.payload.is_empty());
        assert_eq!(consumed, HEADER_LEN);
    }
}

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Property: an accepted chunk never extends past the stream and
    /// consumed bytes always equal header plus declared size.
    #[kani::proof]
    #[kani::unwind(3)]
    fn verify_accepted_size_fits_stream() {
        let stream_len: usize = kani::any();
        let offset: usize = kani::any();
        let size: u32 = kani::any();

        kani::assume(offset <= stream_len);
        kani::assume(stream_len - offset >= HEADER_LEN);

        let payload_start = offset + HEADER_LEN;
        let accepted = payload_start
            .checked_add(size as usize)
            .filter(|&end| end <= stream_len);

        if let Some(end) = accepted {
            assert!(end <= stream_len);
            assert_eq!(end - offset, HEADER_LEN + size as usize);
        }
    }

    /// Property: header encoding is lossless for every field value.
    #[kani::proof]
    fn verify_header_roundtrip() {
        let header = ChunkHeader {
            type_code: kani::any(),
            size: kani::any(),
        };
        assert_eq!(ChunkHeader::from_bytes(&header.to_bytes()), header);
    }
}
