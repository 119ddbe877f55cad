//! Constants shared across the keyer core.
//!
//! Buffer sizes, chunk windows and timing ratios are all visible to the host.
//!
//! ## Key Concepts
//!
//! - **Units**: every duration is expressed in multiples of the speed unit (one dot).
//! - **Ticks**: the tick interrupt runs at [`TICK_HZ`], so one tick is one millisecond.
//! - **Markers**: [`WORD_SPACE`] and [`ESCAPE`] are the only in-band control bytes.

/// Capacity of both the inbound and the outbound queue.
pub const QUEUE_CAPACITY: usize = 128;

/// Maximum number of payload bytes carried by one transport chunk.
pub const CHUNK_LEN: usize = 8;

/// Maximum length of an autonomous notification, telemetry byte included.
pub const NOTIFY_LEN: usize = 8;

/// Shortest device-to-host `SEND` reply put on the wire.
///
/// Some hosts reject transfers shorter than this, so replies are zero-padded up to it.
pub const MIN_READ_LEN: usize = 8;

/// Capacity of a setup reply buffer.
pub const REPLY_CAPACITY: usize = QUEUE_CAPACITY;

/// Word gap marker.
pub const WORD_SPACE: u8 = b' ';

/// Escape byte introducing exactly [`SIGN_BYTES`] raw packed-sign bytes.
pub const ESCAPE: u8 = 0xff;

/// Number of raw bytes following an [`ESCAPE`].
pub const SIGN_BYTES: usize = 4;

/// Tick interrupt rate in Hz.
pub const TICK_HZ: u32 = 1_000;

/// Milliseconds per dot at one word per minute (PARIS timing).
pub const PARIS_MS: u16 = 1_200;

/// Length of a dash, in units.
pub const DASH_UNITS: u16 = 3;

/// Silence closing every played sign, in units.
pub const CHARACTER_SPACE_UNITS: u16 = 3;

/// Extra silence played for a host word space, in units.
///
/// Added to the [`CHARACTER_SPACE_UNITS`] that closed the previous sign this gives the
/// nominal seven-unit word gap.
pub const WORD_SPACE_UNITS: u16 = 4;

/// Keyed silence longer than this many units completes the pending character.
pub const CHARACTER_GAP_UNITS: u16 = 2;

/// Keyed silence longer than this many units, with nothing pending, is a word gap.
pub const WORD_GAP_UNITS: u16 = 6;

/// Poll interval while a custom code waits for its raw bytes, in milliseconds.
pub const CUSTOM_CODE_POLL_MS: u16 = 10;

/// Default speed in words per minute.
pub const DEFAULT_SPEED: u8 = 20;

/// Default inhibit time in milliseconds.
pub const DEFAULT_INHIBIT_TIME: u8 = 20;

/// Default sidetone frequency in Hz.
pub const DEFAULT_TONE: u16 = 600;

/// Size of the persisted configuration blob.
pub const CONFIG_BLOB_LEN: usize = 5;
