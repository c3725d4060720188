//! Desktop simulation of the radio dispatcher loop: no real 433 MHz
//! transceiver is attached, so the antenna pins are a no-op stand-in and
//! only the command/line-protocol side (driven over a real serial device)
//! is exercised. Useful for walking through the S1-S6 scenarios from a
//! terminal.
//!
//! Grounded on `main()` in
//! `examples/original_source/src/rf_bridge_linux.c` for the argument style,
//! and on `src/timer/delay.rs`'s `run_node_tick_loop` for the tick cadence.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use rf433bridge::node::RadioNode;
use rf433bridge::uart::Uart;
use std::convert::Infallible;
use std::io::Read;
use std::process::ExitCode;
use std::time::Duration;

struct Args {
    device: String,
    baud: u32,
    tick_us: u64,
}

fn parse_args() -> Option<Args> {
    let mut device = None;
    let mut baud = 115_200u32;
    let mut tick_us = 63u64;
    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-b" => baud = argv.next()?.parse().ok()?,
            "-t" => tick_us = argv.next()?.parse().ok()?,
            _ if device.is_none() => device = Some(arg),
            _ => return None,
        }
    }
    Some(Args { device: device?, baud, tick_us })
}

fn usage(prog: &str) {
    eprintln!("{prog}: [-b <baud rate>] [-t <tick interval, microseconds>] <serial port device file>");
}

/// Antenna stand-in: always reads low, ignores writes. There is no physical
/// transceiver in this desktop simulation.
struct NullPin;

impl ErrorType for NullPin {
    type Error = Infallible;
}

impl InputPin for NullPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl OutputPin for NullPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Adapts a `serialport::SerialPort` to the crate's [`Uart`] seam.
struct SerialUart {
    port: Box<dyn serialport::SerialPort>,
}

impl Uart for SerialUart {
    fn write_byte(&mut self, byte: u8) {
        use std::io::Write;
        let _ = self.port.write_all(&[byte]);
    }

    fn try_read(&mut self) -> Option<u8> {
        if self.has_data() {
            let mut buf = [0u8; 1];
            self.port.read_exact(&mut buf).ok()?;
            Some(buf[0])
        } else {
            None
        }
    }

    fn has_data(&mut self) -> bool {
        self.port.bytes_to_read().unwrap_or(0) > 0
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let prog = std::env::args().next().unwrap_or_else(|| "radio-node".to_string());
    let Some(args) = parse_args() else {
        usage(&prog);
        return ExitCode::FAILURE;
    };

    let port = match serialport::new(&args.device, args.baud)
        .timeout(Duration::from_millis(1))
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            eprintln!("{}: {e}", args.device);
            return ExitCode::FAILURE;
        }
    };

    let mut uart = SerialUart { port };
    let mut rx_pin = NullPin;
    let mut tx_pin = NullPin;
    let mut node = RadioNode::new();
    let tick = Duration::from_micros(args.tick_us);

    log::info!("radio-node simulation running against {}", args.device);
    loop {
        node.tick(&mut rx_pin, &mut tx_pin, &mut uart);
        std::thread::sleep(tick);
    }
}
