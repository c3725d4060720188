//! OOK decoder (`spec.md` §4.4): validates a run of cycles where either
//! phase lands near `sync_duration` or half of it, then emits a `0` for a
//! low-phase match and a `1` for a high-phase match (both may fire).

use super::{four_way_match, DecodeOutcome};
use crate::buffer::{abs_sub, PulseBuffer};
use crate::consts::OOK_PREPASS_LEN;
use crate::line::{write_header, FrameAccumulator, MsgType};
use crate::uart::Uart;

#[derive(Debug)]
pub struct OokDecoder {
    start: u8,
    pi: u8,
    pcount: u8,
    validated: bool,
}

impl OokDecoder {
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
        let margin = sync_duration / 8;

        if !self.validated {
            while self.pi != buf.current_pulse && self.pcount < OOK_PREPASS_LEN {
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
            if self.pcount < OOK_PREPASS_LEN {
                return DecodeOutcome::ValidationFailed { resume_at: self.pi };
            }
            self.validated = true;
            self.pi = self.start;
            write_header(uart, MsgType::Ook);
        }

        loop {
            if self.pi == buf.current_pulse {
                return DecodeOutcome::Continue;
            }
            let cell = buf.get(self.pi);
            let saturated = cell.is_saturated();
            if abs_sub(cell.low, sync_duration) <= margin {
                frame.stuff_bit(uart, false, saturated);
            }
            if abs_sub(cell.high, sync_duration) <= margin {
                frame.stuff_bit(uart, true, saturated);
            }
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
    fn emits_bit_for_each_matching_phase() {
        let sync_duration = 0x90u8; // above OOK threshold in real use, margin=0x12
        let mut cells = vec![PulseCell { low: sync_duration, high: 1 }; OOK_PREPASS_LEN as usize];
        cells.push(PulseCell { low: 1, high: sync_duration });
        cells.push(PulseCell { low: 255, high: 0 });
        let buf = buf_with(&cells);

        let mut dec = OokDecoder::new(0);
        let mut frame = FrameAccumulator::new();
        let mut uart = LoopbackUart::new();
        let outcome = dec.step(&buf, sync_duration, &mut frame, &mut uart);
        assert_eq!(outcome, DecodeOutcome::Done { msg_end: cells.len() as u8 });
        assert!(uart.take_output().starts_with("MO:"));
    }
}
