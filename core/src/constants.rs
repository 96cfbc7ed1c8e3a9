use std::time::Duration;

/// Bytes reserved for the device id on the wire (NUL-padded ASCII).
// - The id is a C string on the sender side, so the field is a fixed `[u8; 18]`:
//   17 characters of a "AA:BB:CC:11:22:33" MAC plus the terminator.
pub const DEVICE_ID_LEN: usize = 18;

/// Packed record: id (18) + u32 count (4) + f32 battery (4).
pub const RECORD_LEN_PACKED: usize = 26;
/// Naturally aligned record: two padding bytes after the id.
pub const RECORD_LEN_ALIGNED: usize = 28;
/// Packed record with a u64 count: id (18) + u64 count (8) + f32 battery (4).
pub const RECORD_LEN_PACKED_WIDE: usize = 30;
/// Naturally aligned u64 record: count at 24, battery at 32, tail padded to 8.
pub const RECORD_LEN_ALIGNED_WIDE: usize = 40;

/// Battery level bounds (percent).
pub const BATTERY_MIN: f32 = 0.0;
pub const BATTERY_MAX: f32 = 100.0;

/// Defaults when the config leaves a field out
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_millis(1000);
/// Totals above this on load are treated as corruption.
pub const DEFAULT_SANITY_CEILING: u64 = 1_000_000;
/// Radio peer table size on the receiving side.
pub const DEFAULT_MAX_DEVICES: usize = 20;
/// Largest accepted `max_devices`.
pub const MAX_DEVICES_LIMIT: usize = 4096;

/// Durable counter region (fixed offset 0).
pub mod store_layout {
    pub const VALUE_OFFSET: usize = 0;
    pub const VALUE_LEN: usize = 8;
    pub const CRC_OFFSET: usize = 8;
    pub const CRC_LEN: usize = 4;
    pub const REGION_LEN: usize = VALUE_LEN + CRC_LEN;
}

/// Plain confirmation returned to the presentation layer after a reset.
pub const RESET_CONFIRMATION: &str = "Counter reset";
