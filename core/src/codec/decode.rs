//! codec/decode.rs
//!
//! Record decoding.
//!
//! Design notes:
//! - The id is the bytes before the first NUL; trailing bytes of the field are
//!   sender stack garbage and are ignored.
//! - Count and battery are read through a cursor at the layout's offsets.
//! - Validation runs before a `Record` is built.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::codec::types::{DecodeError, Record, WireLayout};
use crate::constants::{BATTERY_MAX, BATTERY_MIN, DEVICE_ID_LEN};
use crate::types::DeviceId;

/// Decode one inbound record, picking the layout from the buffer length.
///
/// # Returns
/// - `Ok(Record)` if the length matches a known layout and every field validates.
/// - `Err(DecodeError)` otherwise.
pub fn decode(buf: &[u8]) -> Result<Record, DecodeError> {
    let layout = WireLayout::for_len(buf.len())
        .ok_or(DecodeError::WrongLength { have: buf.len() })?;
    decode_with_layout(buf, layout)
}

/// Decode with an explicit layout; the buffer must be exactly `layout.len()` bytes.
pub fn decode_with_layout(buf: &[u8], layout: WireLayout) -> Result<Record, DecodeError> {
    if buf.len() != layout.len() {
        return Err(DecodeError::WrongLength { have: buf.len() });
    }

    let id_field = &buf[..DEVICE_ID_LEN];
    let id_len = id_field.iter().position(|&b| b == 0).unwrap_or(DEVICE_ID_LEN);
    let device_id = DeviceId::from_ascii(&id_field[..id_len])?;

    let mut cur = Cursor::new(&buf[layout.count_offset()..]);
    let reported_count = if layout.is_wide() {
        cur.read_u64::<LittleEndian>()?
    } else {
        u64::from(cur.read_u32::<LittleEndian>()?)
    };
    let battery_level = cur.read_f32::<LittleEndian>()?;

    validate_battery(battery_level)?;

    Ok(Record::new(device_id, reported_count, battery_level))
}

fn validate_battery(value: f32) -> Result<(), DecodeError> {
    if !value.is_finite() {
        return Err(DecodeError::NonFiniteBattery);
    }
    if !(BATTERY_MIN..=BATTERY_MAX).contains(&value) {
        return Err(DecodeError::BatteryOutOfRange { value });
    }
    Ok(())
}
