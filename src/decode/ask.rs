//! ASK decoder (`spec.md` §4.3): validates a run of cycles near the
//! committed `sync_duration`, then emits one bit per cycle by comparing
//! which phase is longer.

use super::DecodeOutcome;
use crate::buffer::{abs_sub, PulseBuffer};
use crate::consts::ASK_PREPASS_LEN;
use crate::line::{write_header, FrameAccumulator, MsgType};
use crate::uart::Uart;

#[derive(Debug)]
pub struct AskDecoder {
    start: u8,
    pi: u8,
    pcount: u8,
    validated: bool,
}

impl AskDecoder {
    pub fn new(msg_start: u8) -> Self {
        Self {
            start: msg_start,
            pi: msg_start,
            pcount: 0,
            validated: false,
        }
    }

    pub fn step<U: Uart>(
        &mut self,
        buf: &PulseBuffer,
        sync_duration: u8,
        frame: &mut FrameAccumulator,
        uart: &mut U,
    ) -> DecodeOutcome {
        if !self.validated {
            while self.pi != buf.current_pulse && self.pcount < ASK_PREPASS_LEN {
                let cell = buf.get(self.pi);
                let d = cell.low.wrapping_add(cell.high);
                if abs_sub(d, sync_duration) <= 8 {
                    self.pcount += 1;
                    self.pi = self.pi.wrapping_add(1);
                } else {
                    break;
                }
            }
            if self.pi == buf.current_pulse {
                return DecodeOutcome::Continue;
            }
            if self.pcount < ASK_PREPASS_LEN {
                return DecodeOutcome::ValidationFailed { resume_at: self.pi };
            }
            self.validated = true;
            self.pi = self.start;
            write_header(uart, MsgType::Ask);
        }

        loop {
            if self.pi == buf.current_pulse {
                return DecodeOutcome::Continue;
            }
            let cell = buf.get(self.pi);
            let bit = cell.high > cell.low;
            let saturated = cell.is_saturated();
            frame.stuff_bit(uart, bit, saturated);
            self.pi = self.pi.wrapping_add(1);
            if saturated {
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
    fn rejects_when_prepass_never_matches() {
        let mut cells = vec![PulseCell { low: 1, high: 1 }; ASK_PREPASS_LEN as usize];
        cells[0] = PulseCell { low: 90, high: 90 }; // duration way off from sync_duration
        let buf = buf_with(&cells);
        let mut dec = AskDecoder::new(0);
        let mut frame = FrameAccumulator::new();
        let mut uart = LoopbackUart::new();
        match dec.step(&buf, 0x10, &mut frame, &mut uart) {
            DecodeOutcome::ValidationFailed { resume_at } => assert_eq!(resume_at, 0),
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn emits_one_bit_per_cycle_after_validating() {
        let sync_duration = 0x40u8;
        let mut cells = vec![PulseCell { low: 0x20, high: 0x20 }; ASK_PREPASS_LEN as usize];
        // dominant-high cycle (bit=1) then saturated terminator
        cells.push(PulseCell { low: 0x10, high: 0x30 });
        cells.push(PulseCell { low: 255, high: 0 });
        let buf = buf_with(&cells);

        let mut dec = AskDecoder::new(0);
        let mut frame = FrameAccumulator::new();
        let mut uart = LoopbackUart::new();
        let outcome = dec.step(&buf, sync_duration, &mut frame, &mut uart);
        assert_eq!(outcome, DecodeOutcome::Done { msg_end: cells.len() as u8 });
        assert!(uart.take_output().starts_with("MA:"));
    }
}
