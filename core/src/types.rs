use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::{
    codec::DecodeError,
    config::ConfigError,
    constants::DEVICE_ID_LEN,
    engine::IngestError,
};

/// Validated device identifier.
/// - 1..=18 printable ASCII characters (the wire field width).
/// - Opaque: callers compare and hash it, they never parse it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    pub const MAX_LEN: usize = DEVICE_ID_LEN;

    pub fn parse(raw: &str) -> Result<Self, DecodeError> {
        Self::from_ascii(raw.as_bytes())
    }

    /// Build from raw id bytes (already stripped of NUL padding).
    pub fn from_ascii(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::EmptyId);
        }
        if bytes.len() > Self::MAX_LEN {
            return Err(DecodeError::IdTooLong { have: bytes.len(), max: Self::MAX_LEN });
        }
        if let Some(pos) = bytes.iter().position(|b| !b.is_ascii_graphic()) {
            return Err(DecodeError::InvalidIdByte { pos, byte: bytes[pos] });
        }
        // All bytes are ASCII graphic, so this cannot lose data.
        Ok(Self(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Unified core error covering decode, ingest and config.
/// - `#[from]` conversions enable `?` across module boundaries.
/// - Store failures never reach here: the durable counter logs them and the
///   in-memory total stays authoritative.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
