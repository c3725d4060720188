//! Typed errors for the non-interrupt-context surfaces: command parsing and
//! transmit staging. The sampler/transmit-player hot path stays infallible
//! by design (`spec.md` §7) and reports failure through counters instead.

use thiserror::Error;

/// Failure modes surfaced while parsing a host command line.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The byte following `M` was not `A`, `M`, or `P`.
    #[error("unrecognized message type byte {0:#04x}")]
    UnknownMsgType(u8),
    /// A byte arrived where a `:`/`!`/`#`/`*` token key was expected.
    #[error("unrecognized token key byte {0:#04x}")]
    UnknownTokenKey(u8),
    /// The first byte of the line didn't match any recognized command.
    #[error("unrecognized command byte {0:#04x}")]
    UnknownCommand(u8),
}

/// Failure staging a frame for replay.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransmitError {
    /// The checksum supplied by the host didn't match what was accumulated.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },
    /// The staged frame was shorter than `MIN_TRANSMIT_PULSES`.
    #[error("frame too short to transmit: {pulses} pulses")]
    FrameTooShort { pulses: u8 },
}

/// Verifies a host-supplied checksum against the accumulated value.
pub fn verify_checksum(expected: u8, actual: u8) -> Result<(), TransmitError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TransmitError::ChecksumMismatch { expected, actual })
    }
}
