//! persist/store.rs
//!
//! Counter region codec, the `CounterStore` backend trait and the
//! ceiling-checking `DurableCounter` wrapper used by the engine.
//!
//! Region layout (little-endian, offset 0):
//! - `[0..8]`  total (u64)
//! - `[8..12]` crc32 over bytes `[0..8]`

use std::io::{self, Cursor};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;
use tracing::{error, warn};

use crate::constants::store_layout::{CRC_OFFSET, REGION_LEN, VALUE_LEN, VALUE_OFFSET};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Region unreadable as a counter (short, bad checksum).
    #[error("corrupt persistence: {reason}")]
    CorruptPersistence { reason: String },

    /// Region decoded but the value exceeds the sanity ceiling.
    #[error("corrupt persistence: stored total {value} exceeds ceiling {ceiling}")]
    AboveCeiling { value: u64, ceiling: u64 },

    #[error("persistence read failure: {0}")]
    Read(io::Error),

    #[error("persistence write failure: {0}")]
    PersistenceWriteFailure(io::Error),
}

/// Storage backend for the counter region.
/// - `read` returns `Ok(None)` when nothing was ever written.
/// - `write` must be durable before it returns.
pub trait CounterStore: Send {
    fn read(&mut self) -> Result<Option<u64>, StoreError>;
    fn write(&mut self, value: u64) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

impl CounterStore for Box<dyn CounterStore> {
    fn read(&mut self) -> Result<Option<u64>, StoreError> {
        (**self).read()
    }
    fn write(&mut self, value: u64) -> Result<(), StoreError> {
        (**self).write(value)
    }
    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Serialize `value` into the fixed counter region.
pub fn encode_region(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(REGION_LEN);
    // Writes into a Vec cannot fail.
    let _ = buf.write_u64::<LittleEndian>(value);
    let crc = crc32fast::hash(&buf[VALUE_OFFSET..VALUE_OFFSET + VALUE_LEN]);
    let _ = buf.write_u32::<LittleEndian>(crc);
    buf
}

/// Parse the fixed counter region. Extra trailing bytes are ignored.
pub fn decode_region(buf: &[u8]) -> Result<u64, StoreError> {
    if buf.len() < REGION_LEN {
        return Err(StoreError::CorruptPersistence {
            reason: format!("region too short: {} < {}", buf.len(), REGION_LEN),
        });
    }
    let mut cur = Cursor::new(buf);
    let value = cur.read_u64::<LittleEndian>().map_err(corrupt)?;
    cur.set_position(CRC_OFFSET as u64);
    let stored_crc = cur.read_u32::<LittleEndian>().map_err(corrupt)?;

    let computed = crc32fast::hash(&buf[VALUE_OFFSET..VALUE_OFFSET + VALUE_LEN]);
    if stored_crc != computed {
        return Err(StoreError::CorruptPersistence {
            reason: format!("crc mismatch: stored 0x{:08x}, computed 0x{:08x}", stored_crc, computed),
        });
    }
    Ok(value)
}

fn corrupt(e: io::Error) -> StoreError {
    StoreError::CorruptPersistence { reason: e.to_string() }
}

/// Backend plus sanity ceiling.
///
/// `load` never fails: absence, corruption and unreadable storage all yield 0.
/// `save` is attempted once; the error is logged and handed back for counting.
#[derive(Debug)]
pub struct DurableCounter<S> {
    store: S,
    ceiling: u64,
}

impl<S: CounterStore> DurableCounter<S> {
    pub fn new(store: S, ceiling: u64) -> Self {
        Self { store, ceiling }
    }

    /// Load with the error kept, for callers that want to tell the cases apart.
    pub fn try_load(&mut self) -> Result<u64, StoreError> {
        match self.store.read()? {
            None => Ok(0),
            Some(value) if value > self.ceiling => {
                Err(StoreError::AboveCeiling { value, ceiling: self.ceiling })
            }
            Some(value) => Ok(value),
        }
    }

    pub fn load(&mut self) -> u64 {
        match self.try_load() {
            Ok(value) => value,
            Err(e) => {
                warn!(store = %self.store.describe(), error = %e, "stored total rejected, starting from 0");
                0
            }
        }
    }

    pub fn save(&mut self, value: u64) -> Result<(), StoreError> {
        if value > self.ceiling {
            warn!(value, ceiling = self.ceiling, "saving total above sanity ceiling; next load will discard it");
        }
        self.store.write(value).map_err(|e| {
            error!(store = %self.store.describe(), value, error = %e, "failed to persist total");
            e
        })
    }
}
