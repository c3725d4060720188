//! Manchester decoder (`spec.md` §4.5): the most delicate of the four.
//!
//! After the same four-way validation pre-pass as OOK (narrower margin,
//! longer run), recovers bits from a differential (half-bit) encoding via
//! a `demiclock`/`stuffclock` pair of counters: `demiclock` advances twice
//! per pulse cell (once per phase), `stuffclock` trails it and emits a bit
//! every time it passes an odd tick — the two-phases-per-cell, one-bit
//! cadence that differential Manchester needs.

use super::{four_way_match, DecodeOutcome};
use crate::buffer::{abs_sub, PulseBuffer};
use crate::consts::{MANCHESTER_MAX_BITS, MANCHESTER_PREPASS_LEN};
use crate::line::{write_header, FrameAccumulator, MsgType};
use crate::uart::Uart;

#[derive(Debug)]
pub struct ManchesterDecoder {
    start: u8,
    pi: u8,
    pcount: u8,
    validated: bool,
    bit: bool,
    /// `true` selects the high phase, `false` the low phase.
    phase: bool,
    demiclock: u8,
    stuffclock: u8,
}

impl ManchesterDecoder {
    pub fn new(msg_start: u8) -> Self {
        Self {
            start: msg_start,
            pi: msg_start,
            pcount: 0,
            validated: false,
            bit: false,
            phase: true,
            demiclock: 0,
            stuffclock: 0,
        }
    }

    pub fn step<U: Uart>(
        &mut self,
        buf: &PulseBuffer,
        sync_duration: u8,
        frame: &mut FrameAccumulator,
        uart: &mut U,
    ) -> DecodeOutcome {
        let margin = sync_duration / 4;

        if !self.validated {
            while self.pi != buf.current_pulse && self.pcount < MANCHESTER_PREPASS_LEN {
                let cell = buf.get(self.pi);
                if four_way_match(cell, sync_duration, margin) {
                    self.pcount += 1;
                    self.pi = self.pi.wrapping_add(1);
                } else {
                    break;
                }
            }
            if self.pi == buf.current_pulse {
                return DecodeOutcome::Continue;
            }
            if self.pcount < MANCHESTER_PREPASS_LEN {
                return DecodeOutcome::ValidationFailed { resume_at: self.pi };
            }
            self.validated = true;
            self.pi = self.start;
            write_header(uart, MsgType::Manchester);
        }

        loop {
            if self.pi == buf.current_pulse {
                if frame.bcount() >= MANCHESTER_MAX_BITS {
                    return DecodeOutcome::Done { msg_end: self.pi };
                }
                return DecodeOutcome::Continue;
            }

            let cell = buf.get(self.pi);
            let msg_end_now = cell.is_saturated();

            if self.stuffclock != self.demiclock {
                if self.stuffclock & 1 == 1 {
                    frame.stuff_bit(uart, self.bit, msg_end_now);
                }
                self.stuffclock = self.stuffclock.wrapping_add(1);
            }
            let phase_val = if self.phase { cell.high } else { cell.low };
            if (abs_sub(phase_val, sync_duration) as u16) < margin as u16 {
                self.bit = self.phase;
                self.demiclock = self.demiclock.wrapping_add(1);
            }
            self.demiclock = self.demiclock.wrapping_add(1);
            if self.stuffclock != self.demiclock {
                if self.stuffclock & 1 == 1 {
                    frame.stuff_bit(uart, self.bit, msg_end_now);
                }
                self.stuffclock = self.stuffclock.wrapping_add(1);
            }

            if !self.phase {
                self.pi = self.pi.wrapping_add(1);
            }
            self.phase = !self.phase;

            if msg_end_now {
                return DecodeOutcome::Done { msg_end: self.pi };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PulseCell;
    use crate::uart::loopback::LoopbackUart;

    fn buf_with(cells: &[PulseCell]) -> PulseBuffer {
        let mut buf = PulseBuffer::new();
        for (i, cell) in cells.iter().enumerate() {
            buf.set(i as u8, *cell);
        }
        buf.current_pulse = cells.len() as u8;
        buf
    }

    #[test]
    fn validation_failure_reports_the_offending_pulse() {
        let mut cells = vec![PulseCell { low: 0x20, high: 0x20 }; MANCHESTER_PREPASS_LEN as usize];
        cells[5] = PulseCell { low: 0xF0, high: 0xF0 };
        let buf = buf_with(&cells);
        let mut dec = ManchesterDecoder::new(0);
        let mut frame = FrameAccumulator::new();
        let mut uart = LoopbackUart::new();
        match dec.step(&buf, 0x40, &mut frame, &mut uart) {
            DecodeOutcome::ValidationFailed { resume_at } => assert_eq!(resume_at, 5),
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn emits_header_once_validated() {
        let cells = vec![PulseCell { low: 0x20, high: 0x20 }; MANCHESTER_PREPASS_LEN as usize + 2];
        let buf = buf_with(&cells);
        let mut dec = ManchesterDecoder::new(0);
        let mut frame = FrameAccumulator::new();
        let mut uart = LoopbackUart::new();
        let _ = dec.step(&buf, 0x40, &mut frame, &mut uart);
        assert!(uart.take_output().starts_with("MM:"));
    }

    #[test]
    fn saturated_cell_terminates_the_frame() {
        let mut cells = vec![PulseCell { low: 0x20, high: 0x20 }; MANCHESTER_PREPASS_LEN as usize];
        cells.push(PulseCell { low: 255, high: 0 });
        let buf = buf_with(&cells);
        let mut dec = ManchesterDecoder::new(0);
        let mut frame = FrameAccumulator::new();
        let mut uart = LoopbackUart::new();
        let outcome = dec.step(&buf, 0x40, &mut frame, &mut uart);
        assert_eq!(outcome, DecodeOutcome::Done { msg_end: cells.len() as u8 });
    }
}
