//! # rf433bridge
//!
//! A portable, no_std Rust engine for decoding and replaying pulse-train
//! RF433 MHz transmissions, compatible with cheap modules like the FS1000A
//! and the RF Bridge firmware/protocol it grew out of.
//!
//! This crate implements:
//! - `embedded-hal` traits for digital I/O and timing
//! - edge-triggered pulse sampling into a circular buffer
//! - forward sync-search and four pulse-train decoders (ASK, OOK, Manchester, raw)
//! - a transmit player that replays a staged frame back out over the antenna
//! - an ASCII line command protocol over a single UART
//! - interrupt-safe node access with `critical-section`
//! - optional tick sources using either timer interrupts or blocking delay
//!
//! ## Crate features
//! | Feature                | Description |
//! |-------------------------|-------------|
//! | `std`                   | Disables `#![no_std]`; enables [`uart::loopback`] and [`host`] |
//! | `delay-loop`             | Uses `embedded_hal::delay::DelayNs` for bit timing |
//! | `timer-isr` (default)   | Uses `critical_section::with` for bit timing |
//! | `defmt`                  | Uses `defmt` logging |
//! | `log`                    | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! use rf433bridge::node::RadioNode;
//! use rf433bridge::uart::loopback::LoopbackUart;
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, Transaction as PinTransaction, State as PinState};
//! fn main() {
//!     let mut node = RadioNode::new();
//!     let mut uart = LoopbackUart::new();
//!     # let mut rx_pin = Pin::new(&[PinTransaction::get(PinState::Low)]);
//!     # let mut tx_pin = Pin::new(&[]);
//!     loop {
//!         node.tick(&mut rx_pin, &mut tx_pin, &mut uart); // Call at ~62.5 µs intervals
//!         # break; // For testing purposes
//!     }
//!     # rx_pin.done();
//!     # tx_pin.done();
//! }
//! ```
//!
//! Or, use [`timer::run_node_tick_loop`] with a `DelayNs` implementation:
//!
//! ```rust
//! use rf433bridge::node::RadioNode;
//! use rf433bridge::uart::loopback::LoopbackUart;
//! #[cfg(feature = "delay-loop")]
//! use rf433bridge::timer::run_node_tick_loop;
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, Transaction as PinTransaction, State as PinState};
//! # use embedded_hal_mock::eh1::delay::NoopDelay as Delay;
//!
//! fn main() {
//!     let mut node = RadioNode::new();
//!     let mut uart = LoopbackUart::new();
//!     # let mut rx_pin = Pin::new(&[PinTransaction::get(PinState::Low)]);
//!     # let mut tx_pin = Pin::new(&[]);
//! # #[cfg(feature = "delay-loop")]
//!     # let mut delay = Delay::new();
//! # #[cfg(feature = "delay-loop")]
//!     # { let _ = || run_node_tick_loop(&mut node, &mut rx_pin, &mut tx_pin, &mut uart, &mut delay, 63); }
//!     # rx_pin.done();
//!     # tx_pin.done();
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - Sampling and transmit timing are based on a ~2 kbps tick rate (~62.5 µs per tick)
//! - Timing precision is critical; hardware timer configuration is recommended for reliability
//! - Only one [`node::RadioNode`] instance should be active at a time in interrupt-driven mode
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments;
//! `host` is the exception, used off-device by the `host-bridge` binary.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub mod buffer;
pub mod cmd;
pub mod consts;
pub mod decode;
pub mod dispatcher;
pub mod errors;
#[cfg(feature = "std")]
pub mod host;
pub mod line;
pub mod node;
pub mod sampler;
pub mod syncsearch;
pub mod timer;
pub mod txplayer;
pub mod uart;

#[cfg(test)]
mod tests {
    #[cfg(all(test, feature = "std"))]
    mod lib {
        use crate::node::RadioNode;
        use crate::uart::loopback::LoopbackUart;
        use core::fmt;
        use critical_section::RawRestoreState;
        use embedded_hal::digital;
        use std::collections::VecDeque;
        use std::sync::{Arc, Mutex};

        pub static CRIT: Mutex<bool> = Mutex::new(true);

        struct MyCriticalSection;
        critical_section::set_impl!(MyCriticalSection);

        unsafe impl critical_section::Impl for MyCriticalSection {
            unsafe fn acquire() -> RawRestoreState {
                let val = CRIT.lock().unwrap();
                *val
            }

            unsafe fn release(_token: RawRestoreState) {
                CRIT.clear_poison();
            }
        }

        #[derive(Clone, Debug)]
        pub struct Pin(Arc<Mutex<VecDeque<bool>>>);

        impl Pin {
            pub fn new() -> Self {
                Pin(Arc::new(Mutex::new(VecDeque::new())))
            }
        }

        pub struct PinError;

        impl fmt::Debug for PinError {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "PinError")
            }
        }
        impl fmt::Display for PinError {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "PinError")
            }
        }
        impl digital::Error for PinError {
            fn kind(&self) -> digital::ErrorKind {
                digital::ErrorKind::Other
            }
        }
        impl digital::ErrorType for &Pin {
            type Error = PinError;
        }

        impl digital::InputPin for &Pin {
            fn is_high(&mut self) -> Result<bool, Self::Error> {
                if self.0.is_poisoned() {
                    self.0.clear_poison();
                }
                if let Ok(mut state) = self.0.lock() {
                    Ok(state.pop_front().unwrap_or(false))
                } else {
                    Err(PinError)
                }
            }

            fn is_low(&mut self) -> Result<bool, Self::Error> {
                Ok(!self.is_high()?)
            }
        }

        impl digital::OutputPin for &Pin {
            fn set_high(&mut self) -> Result<(), Self::Error> {
                if self.0.is_poisoned() {
                    self.0.clear_poison();
                }
                if let Ok(mut state) = self.0.lock() {
                    state.extend(&[true; 8]);
                } else {
                    return Err(PinError);
                }
                Ok(())
            }

            fn set_low(&mut self) -> Result<(), Self::Error> {
                if self.0.is_poisoned() {
                    self.0.clear_poison();
                }
                if let Ok(mut state) = self.0.lock() {
                    state.extend(&[false; 8]);
                } else {
                    return Err(PinError);
                }
                Ok(())
            }
        }

        #[test]
        fn test_simulated_node_idles_without_panicking() {
            let pin = Pin::new();
            let mut node = RadioNode::new();
            let mut uart = LoopbackUart::new();

            for _ in 0..64 {
                node.tick(&mut &pin, &mut &pin, &mut uart);
            }

            assert_eq!(node.stats().sync_found, 0);
        }
    }

    #[cfg(all(test, feature = "timer-isr"))]
    mod macros {
        use crate::uart::loopback::LoopbackUart;
        use embedded_hal_mock::eh1::digital::{
            Mock as PinMock, State as PinState, Transaction as PinTransaction,
        };

        #[test]
        fn test_setup_macro_initializes_node() {
            use crate::{init_radio_node, setup_radio_node};
            init_radio_node!();

            setup_radio_node!();

            critical_section::with(|cs| {
                assert!(RADIO_NODE.borrow(cs).borrow().is_some());
            });
        }

        #[test]
        fn test_tick_macro_runs_node_tick() {
            use crate::{init_radio_node, setup_radio_node, tick_radio_node};
            init_radio_node!();
            setup_radio_node!();

            let mut rx = PinMock::new(&[PinTransaction::get(PinState::Low)]);
            let mut tx = PinMock::new(&[]);
            let mut uart = LoopbackUart::new();

            tick_radio_node!(&mut rx, &mut tx, &mut uart);

            critical_section::with(|cs| {
                assert_eq!(
                    RADIO_NODE.borrow(cs).borrow().as_ref().unwrap().stats().sync_found,
                    0
                );
            });

            rx.done();
            tx.done();
        }
    }
}
