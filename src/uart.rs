//! Byte-oriented duplex transport abstraction.
//!
//! The UART itself is an external collaborator (`spec.md` §1, §6): a single
//! half-duplex byte pipe the radio node reads commands from and writes
//! decoded lines to. [`Uart`] is the seam; binaries back it with a real
//! serial port (the `serialport` crate), embedded targets back it with a
//! hardware USART, and tests back it with [`loopback::LoopbackUart`].

/// A byte-oriented duplex transport, modeling the radio node's single UART.
pub trait Uart {
    /// Writes one byte. Backends typically spin on a hardware FIFO-not-full
    /// flag; this must not block indefinitely.
    fn write_byte(&mut self, byte: u8);

    /// Non-blocking read: `None` if the receive FIFO is currently empty.
    fn try_read(&mut self) -> Option<u8>;

    /// Non-destructive check for whether a byte is currently available.
    ///
    /// Used by sync-search to decide whether to defer to the command
    /// receiver without consuming the byte itself.
    fn has_data(&mut self) -> bool;
}

/// An in-memory duplex byte pipe, useful for tests and desktop simulation
/// where no physical UART exists.
#[cfg(feature = "std")]
pub mod loopback {
    use super::Uart;
    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    pub struct LoopbackUart {
        inbound: VecDeque<u8>,
        outbound: Vec<u8>,
    }

    impl LoopbackUart {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn feed_line(&mut self, line: &str) {
            self.inbound.extend(line.as_bytes());
        }

        pub fn feed_bytes(&mut self, bytes: &[u8]) {
            self.inbound.extend(bytes);
        }

        pub fn take_output(&mut self) -> String {
            String::from_utf8_lossy(&core::mem::take(&mut self.outbound)).into_owned()
        }

        pub fn output(&self) -> &[u8] {
            &self.outbound
        }
    }

    impl Uart for LoopbackUart {
        fn write_byte(&mut self, byte: u8) {
            self.outbound.push(byte);
        }

        fn try_read(&mut self) -> Option<u8> {
            self.inbound.pop_front()
        }

        fn has_data(&mut self) -> bool {
            !self.inbound.is_empty()
        }
    }
}
