//! Opaque pagination cursors
//!
//! A cursor is URL-safe base64 over a small JSON object holding the offset and
//! page size. Decoding is forgiving: a token a client mangled decodes to the
//! first page instead of failing the request.
//!
//! Copyright (c) 2025 Versa Team
//! Licensed under the Apache-2.0 license

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when a cursor cannot be decoded
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Decoded pagination position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub offset: u64,
    pub limit: u32,
}

/// Why a token could not be decoded; never leaves this module
#[derive(Debug, Error)]
enum MalformedCursor {
    #[error("not base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("not a cursor payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Encodes and decodes cursors with a fallback page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorCodec {
    default_limit: u32,
}

impl CursorCodec {
    pub fn new(default_limit: u32) -> Self {
        Self { default_limit }
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Encode a position as an opaque token
    pub fn offset_to_cursor(&self, offset: u64, limit: u32) -> String {
        // Two integer fields always serialize
        let payload = serde_json::to_vec(&Cursor { offset, limit }).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(payload)
    }

    /// Decode a token, or `None` when it is malformed
    pub fn try_cursor_to_offset(&self, token: &str) -> Option<Cursor> {
        match decode(token) {
            Ok(cursor) => Some(cursor),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed cursor");
                None
            }
        }
    }

    /// Decode a token, falling back to the first page on any malformed input
    pub fn cursor_to_offset(&self, token: &str) -> Cursor {
        self.try_cursor_to_offset(token).unwrap_or(Cursor {
            offset: 0,
            limit: self.default_limit,
        })
    }

    /// Token for the page after `current`, or `None` once a short page came back
    pub fn next_cursor(&self, current: Cursor, returned: usize) -> Option<String> {
        if current.limit == 0 || returned < current.limit as usize {
            return None;
        }
        let offset = current.offset.checked_add(u64::from(current.limit))?;
        Some(self.offset_to_cursor(offset, current.limit))
    }
}

impl Default for CursorCodec {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

fn decode(token: &str) -> Result<Cursor, MalformedCursor> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}
