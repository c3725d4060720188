//! Shared dispatch-level data model: what task is running, and whether the
//! transceiver is currently listening or replaying (`spec.md` §3, §4.7).
//!
//! The actual dispatch loop lives in [`crate::node::RadioNode`]; this module
//! only holds the enums every component needs to agree on, so `txplayer.rs`
//! and `cmd.rs` don't have to depend on the whole node.

/// Which half-duplex direction the transceiver is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransceiverMode {
    /// Neither sampling nor transmitting; the command receiver owns the
    /// tick while it parses a line.
    Idle,
    /// The sampler is live, feeding the pulse buffer from the RX pin.
    Receiving,
    /// One-tick transition: latch the first cell and assert the antenna
    /// pin before moving to `Transmitting`.
    StartTransmit,
    /// The transmit player is live, replaying the staged buffer.
    Transmitting,
}

/// Which cooperative task the dispatcher should resume on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningState {
    SyncSearch,
    DecodingAsk,
    DecodingOok,
    DecodingManchester,
    DecodeRawPulses,
    DecodeDone,
    ReceivingCommand,
}

/// Host-controlled display toggles (`P`/`D`/`S` commands, `spec.md` §4.8).
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFlags {
    /// When set, sync points are routed to the raw-pulse dumper instead of
    /// being demodulated.
    pub display_pulses: bool,
    /// Reserved for a stack-high-water-mark dump; not meaningful off the
    /// embedded target but kept so the `S` command has somewhere to land.
    pub display_stacks: bool,
}
