//! Reads framed lines from a serial device, re-decodes any raw-pulse
//! (`MP:`) frames on the host, and prints every line. MQTT publish and
//! mapping-file rule matching are out of scope (`spec.md` §1) and are left
//! as a `Sink` extension point for downstream consumers.
//!
//! Grounded on `main()` in
//! `examples/original_source/src/rf_bridge_linux.c`: hand-parsed `-flag
//! value` arguments plus one trailing positional, no `clap`.

use rf433bridge::buffer::PulseCell;
use rf433bridge::host::decode_pulses;
use rf433bridge::uart::Uart;
use std::io::{BufRead, BufReader};
use std::process::ExitCode;
use std::time::Duration;

struct Args {
    device: String,
    baud: u32,
}

fn parse_args() -> Option<Args> {
    let mut device = None;
    let mut baud = 115_200u32;
    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-b" => baud = argv.next()?.parse().ok()?,
            _ if device.is_none() => device = Some(arg),
            _ => return None,
        }
    }
    Some(Args { device: device?, baud })
}

fn usage(prog: &str) {
    eprintln!("{prog}: [-b <baud rate>] <serial port device file>");
}

/// Adapts a `Write`-only stdout into the crate's [`Uart`] seam so
/// `decode_pulses` can print through the same trait the firmware side
/// writes through.
struct StdoutSink;

impl Uart for StdoutSink {
    fn write_byte(&mut self, byte: u8) {
        use std::io::Write;
        let _ = std::io::stdout().write_all(&[byte]);
    }

    fn try_read(&mut self) -> Option<u8> {
        None
    }

    fn has_data(&mut self) -> bool {
        false
    }
}

/// Parses the hex payload of an `MP:...` line into pulse cells: each pulse
/// is four hex digits, high byte then low byte (`line.rs::stuff_raw_pulse`'s
/// emission order).
fn parse_raw_pulses(payload: &str) -> Option<Vec<PulseCell>> {
    let bytes = payload.as_bytes();
    if bytes.len() % 4 != 0 {
        return None;
    }
    let mut cells = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks(4) {
        let high = u8::from_str_radix(std::str::from_utf8(&chunk[0..2]).ok()?, 16).ok()?;
        let low = u8::from_str_radix(std::str::from_utf8(&chunk[2..4]).ok()?, 16).ok()?;
        cells.push(PulseCell { low, high });
    }
    Some(cells)
}

fn handle_line(line: &str) {
    println!("{line}");

    let Some(rest) = line.strip_prefix("MP:") else {
        return;
    };
    let Some(payload) = rest.split(['#', '!', '*']).next() else {
        return;
    };
    let Some(cells) = parse_raw_pulses(payload) else {
        log::warn!("malformed MP: payload, skipping re-decode");
        return;
    };

    let mut sink = StdoutSink;
    decode_pulses(&cells, &mut sink);
    println!();
}

fn main() -> ExitCode {
    env_logger::init();

    let prog = std::env::args().next().unwrap_or_else(|| "host-bridge".to_string());
    let Some(args) = parse_args() else {
        usage(&prog);
        return ExitCode::FAILURE;
    };

    let port = match serialport::new(&args.device, args.baud)
        .timeout(Duration::from_millis(100))
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            eprintln!("{}: {e}", args.device);
            return ExitCode::FAILURE;
        }
    };

    let reader = BufReader::new(port);
    for line in reader.lines() {
        match line {
            Ok(line) => handle_line(line.trim_end()),
            Err(e) => {
                log::warn!("serial read error: {e}");
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
