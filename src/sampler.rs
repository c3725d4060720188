//! The free-running edge sampler (`spec.md` §4.1).
//!
//! Runs from the periodic tick shared with the transmit player. Feeds the
//! circular pulse buffer and advances the write cursor on each coherent
//! rising edge, rejecting sub-noise-floor glitches without any extra
//! memory beyond the cell currently being accumulated.

use crate::buffer::{PulseBuffer, PulseCell};
use crate::consts::NOISE_FLOOR_TICKS;

/// Edge-triggered pulse sampler.
#[derive(Debug, Default)]
pub struct Sampler {
    last_bit: bool,
    /// Free-running tick counter, read by the command receiver's UART
    /// read timeout.
    pub tickcount: u8,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the sampler by one tick, given the current RX pin sample.
    pub fn tick(&mut self, buf: &mut PulseBuffer, bit: bool) {
        buf.get_mut(buf.current_pulse).bump(bit);

        if !self.last_bit && bit {
            let cell = buf.get(buf.current_pulse);
            if cell.low > NOISE_FLOOR_TICKS || cell.high > NOISE_FLOOR_TICKS {
                buf.current_pulse = buf.current_pulse.wrapping_add(1);
                buf.set(buf.current_pulse, PulseCell::zero());
            }
        }
        self.last_bit = bit;
        self.tickcount = self.tickcount.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_noise_floor_glitch_does_not_advance_cursor() {
        let mut buf = PulseBuffer::new();
        let mut sampler = Sampler::new();
        for _ in 0..5 {
            sampler.tick(&mut buf, false);
        }
        sampler.tick(&mut buf, true); // rising edge, but only 5 low ticks
        assert_eq!(buf.current_pulse, 0, "glitch below noise floor must not advance cursor");
    }

    #[test]
    fn coherent_cycle_advances_cursor_on_rising_edge() {
        // A rising edge bumps the phase before testing for it, so the edge
        // tick itself is still counted against the cell being retired.
        let mut buf = PulseBuffer::new();
        let mut sampler = Sampler::new();
        for _ in 0..30 {
            sampler.tick(&mut buf, false);
        }
        for _ in 0..30 {
            sampler.tick(&mut buf, true);
        }
        assert_eq!(buf.current_pulse, 1);
        assert_eq!(buf.get(0).low, 30);
        assert_eq!(buf.get(0).high, 1);

        sampler.tick(&mut buf, false); // falling edge, no cursor change
        sampler.tick(&mut buf, true); // next rising edge advances again
        assert_eq!(buf.current_pulse, 2);
    }

    #[test]
    fn tickcount_wraps_modulo_256() {
        let mut buf = PulseBuffer::new();
        let mut sampler = Sampler::new();
        for _ in 0..300 {
            sampler.tick(&mut buf, false);
        }
        assert_eq!(sampler.tickcount, 44);
    }
}
