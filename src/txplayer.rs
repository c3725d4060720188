//! Transmit player (`spec.md` §4.9): replays the circular buffer onto the
//! antenna pin one phase at a time, mutually exclusive with the sampler —
//! the dispatcher never ticks both in the same call.

use crate::buffer::PulseBuffer;
use crate::dispatcher::TransceiverMode;
use embedded_hal::digital::OutputPin;

/// Countdown-driven pulse replay state machine.
#[derive(Debug, Default)]
pub struct TxPlayer {
    bit: bool,
    countdown: [u8; 2],
}

impl TxPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the transmit player by one tick. `msg_start`/`msg_end`
    /// bound the staged frame; `mode` both selects which phase of the
    /// replay to run and is mutated to reflect the new phase.
    pub fn tick<TX: OutputPin>(
        &mut self,
        tx_pin: &mut TX,
        buf: &mut PulseBuffer,
        mode: &mut TransceiverMode,
        msg_start: u8,
        msg_end: u8,
    ) {
        match *mode {
            TransceiverMode::StartTransmit => {
                self.bit = true;
                buf.current_pulse = msg_start;
                let cell = buf.get(buf.current_pulse);
                self.countdown = [cell.low, cell.high];
                let _ = tx_pin.set_high();
                *mode = TransceiverMode::Transmitting;
            }
            TransceiverMode::Transmitting => {
                let active = self.bit as usize;
                if self.countdown[active] > 0 {
                    self.countdown[active] -= 1;
                }
                if self.countdown[active] > 0 {
                    return;
                }
                self.bit = !self.bit;
                if self.bit {
                    buf.current_pulse = buf.current_pulse.wrapping_add(1);
                    let cell = buf.get(buf.current_pulse);
                    self.countdown = [cell.low, cell.high];
                    if buf.current_pulse == msg_end {
                        *mode = TransceiverMode::Idle;
                        self.bit = false;
                    } else {
                        self.bit = cell.high != 0;
                    }
                }
                let _ = if self.bit {
                    tx_pin.set_high()
                } else {
                    tx_pin.set_low()
                };
            }
            TransceiverMode::Idle | TransceiverMode::Receiving => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PulseCell;
    use embedded_hal_mock::eh1::digital::{Mock, State, Transaction};

    #[test]
    fn start_transmit_latches_first_cell_and_asserts_high() {
        let mut buf = PulseBuffer::new();
        buf.set(3, PulseCell { low: 2, high: 4 });
        let mut mode = TransceiverMode::StartTransmit;
        let mut player = TxPlayer::new();
        let mut pin = Mock::new([Transaction::set(State::High)]);

        player.tick(&mut pin, &mut buf, &mut mode, 3, 5);

        assert_eq!(mode, TransceiverMode::Transmitting);
        assert_eq!(buf.current_pulse, 3);
        pin.done();
    }

    #[test]
    fn reaching_msg_end_returns_to_idle() {
        let mut buf = PulseBuffer::new();
        buf.set(0, PulseCell { low: 0, high: 1 });
        buf.set(1, PulseCell { low: 0, high: 0 });
        let mut mode = TransceiverMode::Transmitting;
        let mut player = TxPlayer::new();
        player.tick(
            &mut Mock::new([Transaction::set(State::Low)]),
            &mut buf,
            &mut mode,
            0,
            1,
        );
        assert_eq!(mode, TransceiverMode::Idle);
    }
}
