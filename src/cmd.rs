//! Command receiver (`spec.md` §4.8): parses one line from the UART,
//! disabling the transceiver for the duration and re-enabling receive on
//! exit. Tokens (`:`, `!`, `#`, `*`) may arrive in any order; `:` stages
//! raw ASK pulses, `!` overrides `sync_duration`, `#` overrides `bcount`,
//! and `*` is the checksum that, on match, stages and replays the frame.

use crate::buffer::{ovf_sub, PulseBuffer, PulseCell};
use crate::consts::{
    CHECKSUM_SEED, DEFAULT_ASK_SYNC_DURATION, DEFAULT_MANCHESTER_SYNC_DURATION,
    MIN_TRANSMIT_PULSES, TRANSMIT_RETRIES, UART_TIMEOUT_BYTE, UART_TIMEOUT_WRAPS,
};
use crate::dispatcher::{DisplayFlags, TransceiverMode};
use crate::errors::{verify_checksum, CommandError, TransmitError};
use crate::uart::Uart;

#[derive(Debug, Clone, Copy, Default)]
struct ByteWait {
    shadow_tick: u8,
    wraps: u16,
}

impl ByteWait {
    fn start(tickcount: u8) -> Self {
        Self {
            shadow_tick: tickcount,
            wraps: 0,
        }
    }

    /// Advances the shadow counter by one step per call while no byte has
    /// arrived, mirroring the firmware's busy-poll of its local tick
    /// shadow against the free-running `tickcount`. Returns `true` once
    /// [`UART_TIMEOUT_WRAPS`] have elapsed.
    fn advance(&mut self, tickcount: u8) -> bool {
        if self.shadow_tick != tickcount {
            self.shadow_tick = self.shadow_tick.wrapping_add(1);
            if self.shadow_tick == 0 {
                self.wraps += 1;
            }
        }
        self.wraps >= UART_TIMEOUT_WRAPS
    }
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        // Uppercase 'F' is not accepted here, matching getsbyte()'s `s < 'F'`.
        b'A'..=b'E' => Some(b - b'A' + 10),
        _ => None,
    }
}

enum HexByteOutcome {
    Partial,
    Complete(u8),
    Terminated(u8),
}

#[derive(Debug, Default)]
struct HexByteReader {
    hi: Option<u8>,
}

impl HexByteReader {
    fn feed(&mut self, byte: u8) -> HexByteOutcome {
        match hex_nibble(byte) {
            Some(v) => match self.hi {
                None => {
                    self.hi = Some(v);
                    HexByteOutcome::Partial
                }
                Some(hi) => HexByteOutcome::Complete((hi << 4) | v),
            },
            None => HexByteOutcome::Terminated(byte),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum HexTarget {
    RawPayload,
    SyncDuration,
    BitCount,
    Checksum,
}

#[derive(Debug, Clone, Copy)]
enum LiteralEffect {
    DisplayPulsesOn,
    DisplayPulsesOff,
    StackDump,
}

#[derive(Debug, Clone, Copy)]
enum ParseState {
    ReadCommandChar,
    ReadMsgType,
    ReadTokenKey,
    ReadHexFor(HexTarget),
    MatchLiteral {
        expect: &'static [u8],
        pos: u8,
        on_success: LiteralEffect,
    },
    SkipToEol,
    TransmitRetry {
        retries_left: u8,
    },
    Finished,
}

/// What the dispatcher should do once `step` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Still parsing; call again next tick.
    Continue,
    /// The command (and any reply/transmit it triggered) is fully
    /// handled; return to sync-search.
    Finished,
}

/// Resumable line-command parser.
#[derive(Debug)]
pub struct CommandReceiver {
    state: ParseState,
    wait: Option<ByteWait>,
    pending_byte: Option<u8>,
    hex: HexByteReader,
    msg_kind: u8,
    bcount: u8,
    chk: u8,
    sync_duration: u8,
    err: Option<u8>,
    ok: bool,
    checksum_failed: bool,
}

impl CommandReceiver {
    pub fn new() -> Self {
        Self {
            state: ParseState::ReadCommandChar,
            wait: None,
            pending_byte: None,
            hex: HexByteReader::default(),
            msg_kind: 0,
            bcount: 0,
            chk: 0,
            sync_duration: 0,
            err: None,
            ok: false,
            checksum_failed: false,
        }
    }

    /// Whether the line just parsed was rejected for a checksum mismatch.
    /// Checked by the dispatcher after `step` returns `Finished`, to bump
    /// its `checksum_rejected` counter.
    pub fn checksum_failed(&self) -> bool {
        self.checksum_failed
    }

    /// Resets to parse a fresh line. Called by the dispatcher once
    /// `step` has returned `Finished`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn read_byte<U: Uart>(&mut self, uart: &mut U, tickcount: u8) -> Option<u8> {
        if let Some(b) = uart.try_read() {
            self.wait = None;
            return Some(b);
        }
        let wait = self.wait.get_or_insert_with(|| ByteWait::start(tickcount));
        if wait.advance(tickcount) {
            self.wait = None;
            return Some(UART_TIMEOUT_BYTE);
        }
        None
    }

    fn stage_ask_byte(&mut self, buf: &mut PulseBuffer, byte: u8) {
        let dominant = self.sync_duration - self.sync_duration / 4;
        let minor = self.sync_duration / 4;
        for b in 0..8u8 {
            let bit = (byte >> (7 - b)) & 1 != 0;
            let cell = if bit {
                PulseCell { low: minor, high: dominant }
            } else {
                PulseCell { low: dominant, high: minor }
            };
            buf.set(self.bcount, cell);
            self.bcount = self.bcount.wrapping_add(1);
        }
    }

    fn apply_hex(&mut self, target: HexTarget, value: u8, buf: &mut PulseBuffer) {
        match target {
            HexTarget::RawPayload => {
                self.chk = self.chk.wrapping_add(value);
                if self.msg_kind == b'A' {
                    self.stage_ask_byte(buf, value);
                }
            }
            HexTarget::SyncDuration => {
                self.sync_duration = value;
                self.chk = self.chk.wrapping_add(value);
            }
            HexTarget::BitCount => {
                self.bcount = value;
                self.chk = self.chk.wrapping_add(value);
            }
            HexTarget::Checksum => {} // handled by the caller, which needs the raw value
        }
    }

    /// Appends the saturated terminator and stages the frame for replay.
    fn stage_transmit(
        &mut self,
        buf: &mut PulseBuffer,
        msg_start: &mut u8,
        msg_end: &mut u8,
    ) -> Result<(), TransmitError> {
        buf.set(self.bcount, PulseCell { low: 255, high: 0 });
        *msg_end = self.bcount.wrapping_add(1);
        *msg_start = 0;
        let pulses = ovf_sub(*msg_end, *msg_start);
        if pulses >= MIN_TRANSMIT_PULSES {
            Ok(())
        } else {
            Err(TransmitError::FrameTooShort { pulses })
        }
    }

    fn emit_reply<U: Uart>(&self, uart: &mut U) {
        if let Some(err) = self.err {
            uart.write_byte(b'!');
            uart.write_byte(err);
            uart.write_byte(b'\n');
        } else if self.ok {
            uart.write_byte(b'*');
            uart.write_byte(b'O');
            uart.write_byte(b'K');
            uart.write_byte(b'\n');
        }
    }

    /// Advances the parser by as much as currently-available UART input
    /// allows. `buf`/`mode`/`msg_start`/`msg_end`/`flags` are the shared
    /// dispatcher state this command may stage a transmit into or toggle.
    #[allow(clippy::too_many_arguments)]
    pub fn step<U: Uart>(
        &mut self,
        uart: &mut U,
        buf: &mut PulseBuffer,
        mode: &mut TransceiverMode,
        msg_start: &mut u8,
        msg_end: &mut u8,
        flags: &mut DisplayFlags,
        tickcount: u8,
    ) -> CommandOutcome {
        loop {
            if let ParseState::TransmitRetry { retries_left } = self.state {
                if *mode == TransceiverMode::Idle {
                    if retries_left == 0 {
                        self.state = ParseState::SkipToEol;
                        continue;
                    }
                    *mode = TransceiverMode::StartTransmit;
                    self.state = ParseState::TransmitRetry {
                        retries_left: retries_left - 1,
                    };
                }
                return CommandOutcome::Continue;
            }

            let byte = match self.pending_byte.take() {
                Some(b) => b,
                None => match self.read_byte(uart, tickcount) {
                    Some(b) => b,
                    None => return CommandOutcome::Continue,
                },
            };

            match self.state {
                ParseState::Finished => unreachable!("step called after Finished"),
                ParseState::TransmitRetry { .. } => unreachable!("handled above"),

                ParseState::ReadCommandChar => {
                    if byte == UART_TIMEOUT_BYTE {
                        *mode = TransceiverMode::Receiving;
                        self.state = ParseState::Finished;
                        return CommandOutcome::Finished;
                    }
                    *mode = TransceiverMode::Idle;
                    match byte {
                        b'M' => self.state = ParseState::ReadMsgType,
                        b'P' => {
                            self.state = ParseState::MatchLiteral {
                                expect: b"ULSE\n",
                                pos: 0,
                                on_success: LiteralEffect::DisplayPulsesOn,
                            }
                        }
                        b'D' => {
                            self.state = ParseState::MatchLiteral {
                                expect: b"EMOD\n",
                                pos: 0,
                                on_success: LiteralEffect::DisplayPulsesOff,
                            }
                        }
                        b'S' => {
                            self.state = ParseState::MatchLiteral {
                                expect: b"TACK\n",
                                pos: 0,
                                on_success: LiteralEffect::StackDump,
                            }
                        }
                        _ => {
                            // Unrecognized first character: silently drain
                            // to end-of-line, no reply.
                            #[cfg(feature = "log")]
                            log::debug!("command rejected: {}", CommandError::UnknownCommand(byte));
                            self.pending_byte = Some(byte);
                            self.state = ParseState::SkipToEol;
                        }
                    }
                }

                ParseState::ReadMsgType => {
                    if byte == UART_TIMEOUT_BYTE {
                        *mode = TransceiverMode::Receiving;
                        self.state = ParseState::Finished;
                        return CommandOutcome::Finished;
                    }
                    match byte {
                        b'A' => {
                            self.sync_duration = DEFAULT_ASK_SYNC_DURATION;
                            self.msg_kind = b'A';
                        }
                        b'M' => {
                            self.sync_duration = DEFAULT_MANCHESTER_SYNC_DURATION;
                            self.msg_kind = b'M';
                        }
                        b'P' => {
                            self.msg_kind = b'P';
                        }
                        _ => {
                            let e = CommandError::UnknownMsgType(byte);
                            #[cfg(feature = "log")]
                            log::warn!("command rejected: {e}");
                            let _ = e;
                            self.err = Some(b'M');
                            self.state = ParseState::SkipToEol;
                            continue;
                        }
                    }
                    self.bcount = 0;
                    self.chk = CHECKSUM_SEED;
                    self.state = ParseState::ReadTokenKey;
                }

                ParseState::ReadTokenKey => match byte {
                    b':' => self.state = ParseState::ReadHexFor(HexTarget::RawPayload),
                    b'*' => self.state = ParseState::ReadHexFor(HexTarget::Checksum),
                    b'!' => self.state = ParseState::ReadHexFor(HexTarget::SyncDuration),
                    b'#' => self.state = ParseState::ReadHexFor(HexTarget::BitCount),
                    other => {
                        let e = CommandError::UnknownTokenKey(other);
                        #[cfg(feature = "log")]
                        log::warn!("command rejected: {e}");
                        let _ = e;
                        self.err = Some(other);
                        self.state = ParseState::SkipToEol;
                    }
                },

                ParseState::ReadHexFor(target) => match self.hex.feed(byte) {
                    HexByteOutcome::Partial => {}
                    HexByteOutcome::Complete(value) => {
                        self.hex = HexByteReader::default();
                        match target {
                            HexTarget::Checksum => match verify_checksum(value, self.chk) {
                                Ok(()) => {
                                    self.ok = true;
                                    match self.stage_transmit(buf, msg_start, msg_end) {
                                        Ok(()) => {
                                            self.state = ParseState::TransmitRetry {
                                                retries_left: TRANSMIT_RETRIES,
                                            };
                                        }
                                        Err(e) => {
                                            #[cfg(feature = "log")]
                                            log::debug!("transmit skipped: {e}");
                                            let _ = e;
                                            self.state = ParseState::SkipToEol;
                                        }
                                    }
                                }
                                Err(e) => {
                                    #[cfg(feature = "log")]
                                    log::warn!("command rejected: {e}");
                                    let _ = e;
                                    self.err = Some(b'*');
                                    self.checksum_failed = true;
                                    self.state = ParseState::SkipToEol;
                                }
                            },
                            HexTarget::RawPayload => {
                                self.apply_hex(target, value, buf);
                                self.state = ParseState::ReadHexFor(HexTarget::RawPayload);
                            }
                            _ => {
                                self.apply_hex(target, value, buf);
                                self.state = ParseState::ReadTokenKey;
                            }
                        }
                    }
                    HexByteOutcome::Terminated(next) => {
                        self.hex = HexByteReader::default();
                        match target {
                            HexTarget::RawPayload => {
                                self.pending_byte = Some(next);
                                self.state = ParseState::ReadTokenKey;
                            }
                            _ => {
                                self.state = ParseState::SkipToEol;
                            }
                        }
                    }
                },

                ParseState::MatchLiteral { expect, pos, on_success } => {
                    if byte == expect[pos as usize] {
                        let next_pos = pos + 1;
                        if next_pos as usize == expect.len() {
                            // `expect` always ends in '\n', so the line is
                            // already fully consumed; reply immediately
                            // rather than waiting on a byte that won't come.
                            match on_success {
                                LiteralEffect::DisplayPulsesOn => flags.display_pulses = true,
                                LiteralEffect::DisplayPulsesOff => flags.display_pulses = false,
                                LiteralEffect::StackDump => flags.display_stacks = true,
                            }
                            self.ok = true;
                            self.emit_reply(uart);
                            *mode = TransceiverMode::Receiving;
                            self.state = ParseState::Finished;
                            return CommandOutcome::Finished;
                        } else {
                            self.state = ParseState::MatchLiteral { expect, pos: next_pos, on_success };
                        }
                    } else {
                        self.err = Some(byte);
                        self.state = ParseState::SkipToEol;
                    }
                }

                ParseState::SkipToEol => {
                    if byte >= b' ' && byte != UART_TIMEOUT_BYTE {
                        // keep draining
                    } else {
                        self.emit_reply(uart);
                        *mode = TransceiverMode::Receiving;
                        self.state = ParseState::Finished;
                        return CommandOutcome::Finished;
                    }
                }
            }
        }
    }
}

impl Default for CommandReceiver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::loopback::LoopbackUart;

    fn run_to_finish(
        cmd: &mut CommandReceiver,
        uart: &mut LoopbackUart,
        buf: &mut PulseBuffer,
        mode: &mut TransceiverMode,
        msg_start: &mut u8,
        msg_end: &mut u8,
        flags: &mut DisplayFlags,
    ) {
        for tick in 0..64u8 {
            if cmd.step(uart, buf, mode, msg_start, msg_end, flags, tick) == CommandOutcome::Finished {
                return;
            }
        }
        panic!("command did not finish within the tick budget");
    }

    #[test]
    fn pulse_command_sets_display_flag_and_replies_ok() {
        let mut uart = LoopbackUart::new();
        uart.feed_line("PULSE\n");
        let mut buf = PulseBuffer::new();
        let mut mode = TransceiverMode::Idle;
        let mut msg_start = 0u8;
        let mut msg_end = 0u8;
        let mut flags = DisplayFlags::default();
        let mut cmd = CommandReceiver::new();

        run_to_finish(&mut cmd, &mut uart, &mut buf, &mut mode, &mut msg_start, &mut msg_end, &mut flags);

        assert!(flags.display_pulses);
        assert_eq!(uart.take_output(), "*OK\n");
        assert_eq!(mode, TransceiverMode::Receiving);
    }

    #[test]
    fn demod_command_clears_display_flag() {
        let mut uart = LoopbackUart::new();
        uart.feed_line("DEMOD\n");
        let mut buf = PulseBuffer::new();
        let mut mode = TransceiverMode::Idle;
        let mut msg_start = 0u8;
        let mut msg_end = 0u8;
        let mut flags = DisplayFlags { display_pulses: true, display_stacks: false };
        let mut cmd = CommandReceiver::new();

        run_to_finish(&mut cmd, &mut uart, &mut buf, &mut mode, &mut msg_start, &mut msg_end, &mut flags);

        assert!(!flags.display_pulses);
        assert_eq!(uart.take_output(), "*OK\n");
    }

    #[test]
    fn checksum_mismatch_replies_with_star_error() {
        // MA:<no payload>#00*00 with a bogus checksum
        let mut uart = LoopbackUart::new();
        uart.feed_line("MA#00*00\n");
        let mut buf = PulseBuffer::new();
        let mut mode = TransceiverMode::Idle;
        let mut msg_start = 0u8;
        let mut msg_end = 0u8;
        let mut flags = DisplayFlags::default();
        let mut cmd = CommandReceiver::new();

        run_to_finish(&mut cmd, &mut uart, &mut buf, &mut mode, &mut msg_start, &mut msg_end, &mut flags);

        assert_eq!(uart.take_output(), "!*\n");
    }

    #[test]
    fn checksum_match_with_short_frame_is_silently_ignored() {
        // chk seed 0x55 + bcount(0x00) + sync_duration override not sent;
        // #00 sets bcount=0, chk=0x55+0=0x55; *55 matches -> staged but
        // msg_end(1) < MIN_TRANSMIT_PULSES so never keyed up.
        let mut uart = LoopbackUart::new();
        uart.feed_line("MA#00*55\n");
        let mut buf = PulseBuffer::new();
        let mut mode = TransceiverMode::Idle;
        let mut msg_start = 0u8;
        let mut msg_end = 0u8;
        let mut flags = DisplayFlags::default();
        let mut cmd = CommandReceiver::new();

        run_to_finish(&mut cmd, &mut uart, &mut buf, &mut mode, &mut msg_start, &mut msg_end, &mut flags);

        assert_eq!(uart.take_output(), "*OK\n");
        assert_eq!(mode, TransceiverMode::Receiving, "too-short frame must not key up the antenna");
    }

    #[test]
    fn unrecognized_first_character_is_silent() {
        let mut uart = LoopbackUart::new();
        uart.feed_line("X\n");
        let mut buf = PulseBuffer::new();
        let mut mode = TransceiverMode::Idle;
        let mut msg_start = 0u8;
        let mut msg_end = 0u8;
        let mut flags = DisplayFlags::default();
        let mut cmd = CommandReceiver::new();

        run_to_finish(&mut cmd, &mut uart, &mut buf, &mut mode, &mut msg_start, &mut msg_end, &mut flags);

        assert_eq!(uart.take_output(), "");
    }
}
