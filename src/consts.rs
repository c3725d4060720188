//! Constants used across the pulse-train decoder/replay engine.
//!
//! These values are lifted directly from the firmware this crate is
//! modeled on and are empirically tuned against commodity 433 MHz remotes
//! and sensors. They must not be changed casually — they are load-bearing
//! for sync discrimination and decoder validation.
//!
//! ## Key Concepts
//!
//! - **Noise floor**: pulses shorter than this are glitches, not edges.
//! - **Sync discrimination**: thresholds that decide when a run of cycles
//!   is "coherent" and which modulation it most likely is.
//! - **Decoder pre-pass lengths**: how many cycles each decoder demands
//!   before committing to emit a frame.
//! - **Checksum seed**: the starting value of the line-protocol checksum.

/// Number of slots in the circular pulse buffer. Index arithmetic wraps
/// naturally at this width because cursors are plain `u8`.
pub const PULSE_BUF_LEN: usize = 256;

/// A completed `(low, high)` cell shorter than this, on either phase, is
/// treated as a glitch by the sampler and does not advance the write cursor.
pub const NOISE_FLOOR_TICKS: u8 = 20;

/// Per-phase tick count at which a cell saturates. A saturated low phase is
/// the end-of-transmission sentinel.
pub const MAX_PHASE_TICKS: u8 = 255;

/// Number of consecutive near-equal cycles required to commit a sync point.
pub const SYNC_LEN: u8 = 8;

/// Above this full-cycle duration, sync-search attempts the three-way clock
/// correction (halving `p0`, `p1`, or `d`).
pub const CLOCK_ADJUST_THRESHOLD: u16 = 0x70;

/// Full-cycle durations below this are too short to be a real cycle; forces
/// a sync reset.
pub const SYNC_MIN_DURATION: u16 = 0x20;

/// Maximum allowed deviation from the running `sync_duration` before a
/// sync reset is forced.
pub const SYNC_MAX_DEVIATION: u16 = 8;

/// Above this smoothed `sync_duration`, the sync point is classified OOK.
pub const OOK_DURATION_THRESHOLD: u8 = 0x80;

/// Minimum manchester-like cycle count (of the 8 sync cycles) required to
/// prefer the Manchester decoder over ASK.
pub const MANCHESTER_SYNC_MIN: u8 = 4;

/// Number of matching cycles the ASK decoder requires before committing to
/// emit a frame.
pub const ASK_PREPASS_LEN: u8 = 20;

/// Number of matching cycles the OOK decoder requires before committing.
pub const OOK_PREPASS_LEN: u8 = 20;

/// Number of matching cycles the Manchester decoder requires before
/// committing.
pub const MANCHESTER_PREPASS_LEN: u8 = 32;

/// Manchester decoder emission hard stop: terminate even without a
/// saturated phase once this many bits have been stuffed.
pub const MANCHESTER_MAX_BITS: u8 = 0xD0;

/// Checksum seed for both the line-protocol trailer and the command parser.
pub const CHECKSUM_SEED: u8 = 0x55;

/// Default `sync_duration` used when staging an ASK transmit frame.
pub const DEFAULT_ASK_SYNC_DURATION: u8 = 0x63;

/// Default `sync_duration` used when staging a Manchester transmit frame.
pub const DEFAULT_MANCHESTER_SYNC_DURATION: u8 = 0x40;

/// Frames shorter than this many pulses are not worth the air time.
pub const MIN_TRANSMIT_PULSES: u8 = 16;

/// Number of times the transmit player replays a staged frame.
pub const TRANSMIT_RETRIES: u8 = 3;

/// Number of `tickcount` wraps (each 255 ticks) the command receiver waits
/// for a UART byte before giving up.
pub const UART_TIMEOUT_WRAPS: u16 = 1000;

/// Sentinel returned by a timed-out UART read.
pub const UART_TIMEOUT_BYTE: u8 = 0xFF;
