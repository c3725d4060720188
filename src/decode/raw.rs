//! Raw-pulse dumper (`spec.md` §4.6): no validation pre-pass, just echoes
//! every `(high, low)` pair as hex until the saturated terminator. Used
//! when `display_pulses` is set, regardless of what modulation the cycles
//! would otherwise have classified as.

use super::DecodeOutcome;
use crate::buffer::PulseBuffer;
use crate::line::{write_header, FrameAccumulator, MsgType};
use crate::uart::Uart;

#[derive(Debug)]
pub struct RawDecoder {
    pi: u8,
    header_written: bool,
}

impl RawDecoder {
    pub fn new(msg_start: u8) -> Self {
        Self {
            pi: msg_start,
            header_written: false,
        }
    }

    pub fn step<U: Uart>(
        &mut self,
        buf: &PulseBuffer,
        frame: &mut FrameAccumulator,
        uart: &mut U,
    ) -> DecodeOutcome {
        if !self.header_written {
            write_header(uart, MsgType::Pulses);
            self.header_written = true;
        }

        loop {
            if self.pi == buf.current_pulse {
                return DecodeOutcome::Continue;
            }
            let cell = buf.get(self.pi);
            let saturated = cell.is_saturated();
            frame.stuff_raw_pulse(uart, cell.high, cell.low);
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

    #[test]
    fn dumps_hex_of_high_then_low_per_pulse() {
        let mut buf = PulseBuffer::new();
        buf.set(0, PulseCell { low: 0x12, high: 0x34 });
        buf.set(1, PulseCell { low: 255, high: 0 });
        buf.current_pulse = 2;

        let mut dec = RawDecoder::new(0);
        let mut frame = FrameAccumulator::new();
        let mut uart = LoopbackUart::new();
        let outcome = dec.step(&buf, &mut frame, &mut uart);
        assert_eq!(outcome, DecodeOutcome::Done { msg_end: 2 });
        assert_eq!(uart.take_output(), "MP:3412ff00");
        assert_eq!(frame.bcount(), 2);
    }
}
