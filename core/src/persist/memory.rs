//! persist/memory.rs
//! In-memory counter region, shared between clones.
//!
//! Used when no store path is configured and by tests that simulate a restart
//! (a second engine over a clone sees the same region) or a failing medium.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::persist::store::{decode_region, encode_region, CounterStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    region: Arc<Mutex<Option<Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the raw region bytes (corruption injection).
    pub fn set_raw(&self, bytes: Vec<u8>) {
        *self.region.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes);
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.region.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make every subsequent write fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl CounterStore for MemoryCounterStore {
    fn read(&mut self) -> Result<Option<u64>, StoreError> {
        match self.raw() {
            None => Ok(None),
            Some(bytes) => decode_region(&bytes).map(Some),
        }
    }

    fn write(&mut self, value: u64) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::PersistenceWriteFailure(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        self.set_raw(encode_region(value));
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
