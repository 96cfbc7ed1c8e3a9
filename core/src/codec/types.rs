//! codec/types.rs
//! Decoded record, wire layouts and decode errors.

use std::io;

use thiserror::Error;

use crate::constants::{
    DEVICE_ID_LEN, RECORD_LEN_ALIGNED, RECORD_LEN_ALIGNED_WIDE, RECORD_LEN_PACKED,
    RECORD_LEN_PACKED_WIDE,
};
use crate::types::DeviceId;

/// Byte layouts a sender may use for the same C struct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WireLayout {
    /// id[0..18] count[18..22] battery[22..26]
    Packed,
    /// id[0..18] pad[18..20] count[20..24] battery[24..28]
    Aligned,
    /// id[0..18] count[18..26] battery[26..30], u64 count
    PackedWide,
    /// id[0..18] pad[18..24] count[24..32] battery[32..36] pad[36..40], u64 count
    AlignedWide,
}

impl WireLayout {
    pub fn for_len(len: usize) -> Option<Self> {
        match len {
            RECORD_LEN_PACKED => Some(WireLayout::Packed),
            RECORD_LEN_ALIGNED => Some(WireLayout::Aligned),
            RECORD_LEN_PACKED_WIDE => Some(WireLayout::PackedWide),
            RECORD_LEN_ALIGNED_WIDE => Some(WireLayout::AlignedWide),
            _ => None,
        }
    }

    pub const fn len(self) -> usize {
        match self {
            WireLayout::Packed => RECORD_LEN_PACKED,
            WireLayout::Aligned => RECORD_LEN_ALIGNED,
            WireLayout::PackedWide => RECORD_LEN_PACKED_WIDE,
            WireLayout::AlignedWide => RECORD_LEN_ALIGNED_WIDE,
        }
    }

    pub const fn count_offset(self) -> usize {
        match self {
            WireLayout::Packed | WireLayout::PackedWide => DEVICE_ID_LEN,
            WireLayout::Aligned => DEVICE_ID_LEN + 2,
            WireLayout::AlignedWide => DEVICE_ID_LEN + 6,
        }
    }

    /// Senders with a 64-bit step counter.
    pub const fn is_wide(self) -> bool {
        matches!(self, WireLayout::PackedWide | WireLayout::AlignedWide)
    }
}

/// One validated inbound telemetry record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub device_id: DeviceId,
    /// Cumulative step counter as reported by the node.
    pub reported_count: u64,
    /// Battery level in percent.
    pub battery_level: f32,
}

impl Record {
    pub fn new(device_id: DeviceId, reported_count: u64, battery_level: f32) -> Self {
        Self { device_id, reported_count, battery_level }
    }
}

/// Every variant describes a malformed record: the bytes are dropped and
/// nothing is mutated.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("malformed record: length {have} matches no known layout")]
    WrongLength { have: usize },

    #[error("malformed record: empty device id")]
    EmptyId,

    #[error("malformed record: device id length {have} exceeds {max}")]
    IdTooLong { have: usize, max: usize },

    #[error("malformed record: device id byte 0x{byte:02x} at {pos} is not printable ASCII")]
    InvalidIdByte { pos: usize, byte: u8 },

    #[error("malformed record: battery level is not finite")]
    NonFiniteBattery,

    #[error("malformed record: battery level {value} outside 0..=100")]
    BatteryOutOfRange { value: f32 },

    #[error("malformed record: truncated field ({0})")]
    Truncated(String),
}

/// Allow `?` on the byteorder readers.
impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        DecodeError::Truncated(e.to_string())
    }
}
