//! Frame payload inspection
//!
//! Frames arrive as base64 JPEG strings, sometimes wrapped in a data URI.
//! This module cleans the payload, decodes it and checks the JPEG start
//! of image marker. Nothing here touches the network or the clock.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Data URI header some broadcasters put in front of the payload
pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// JPEG start of image marker
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Number of leading bytes reported as the header
pub const HEADER_LEN: usize = 4;

/// Strip a leading data URI header, if present
#[must_use]
pub fn strip_data_uri(frame_data: &str) -> &str {
    frame_data
        .strip_prefix(DATA_URI_PREFIX)
        .unwrap_or(frame_data)
}

/// Lowercase hex of the first [`HEADER_LEN`] bytes, `None` for short payloads
#[must_use]
pub fn hex_header(bytes: &[u8]) -> Option<String> {
    bytes.get(..HEADER_LEN).map(hex::encode)
}

/// Result of checking the JPEG signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JpegSignature {
    /// Starts with `FF D8`
    Valid,
    /// At least four bytes but no `FF D8`; carries the hex header
    Invalid(String),
    /// Fewer than four bytes, nothing to check
    TooShort,
}

impl JpegSignature {
    /// Check decoded payload bytes
    #[must_use]
    pub fn check(bytes: &[u8]) -> Self {
        match hex_header(bytes) {
            None => Self::TooShort,
            Some(_) if bytes.starts_with(&JPEG_SOI) => Self::Valid,
            Some(header) => Self::Invalid(header),
        }
    }

    /// Whether the payload looks like a JPEG
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// A successfully decoded frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Length of the base64 text after stripping the data URI header
    pub base64_len: usize,
    /// Decoded JPEG bytes
    pub bytes: Vec<u8>,
}

impl DecodedFrame {
    /// Decoded size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was decoded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex of the first four bytes, `None` when shorter
    #[must_use]
    pub fn header(&self) -> Option<String> {
        hex_header(&self.bytes)
    }

    /// JPEG signature check of the decoded bytes
    #[must_use]
    pub fn signature(&self) -> JpegSignature {
        JpegSignature::check(&self.bytes)
    }
}

/// Outcome of inspecting one `frameData` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    /// Field missing or empty
    Empty,
    /// Payload decoded
    Decoded(DecodedFrame),
    /// Payload is not valid base64
    DecodeError {
        /// Length of the cleaned base64 text
        base64_len: usize,
        /// Decoder message
        error: String,
    },
}

impl FramePayload {
    /// Clean and decode a `frameData` value
    #[must_use]
    pub fn inspect(frame_data: Option<&str>) -> Self {
        let Some(frame_data) = frame_data.filter(|data| !data.is_empty()) else {
            return Self::Empty;
        };

        let cleaned = strip_data_uri(frame_data);
        match STANDARD.decode(cleaned) {
            Ok(bytes) => Self::Decoded(DecodedFrame {
                base64_len: cleaned.len(),
                bytes,
            }),
            Err(e) => Self::DecodeError {
                base64_len: cleaned.len(),
                error: e.to_string(),
            },
        }
    }
}
