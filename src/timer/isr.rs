use crate::node::RadioNode;
use crate::uart::Uart;
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::{InputPin, OutputPin};

/// Used to initialize the global static `RadioNode` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust
/// use rf433bridge::node::RadioNode;
/// use core::cell::RefCell;
/// use critical_section::Mutex;
/// use rf433bridge::timer::global_radio_node_init;
///
/// static RADIO_NODE: Mutex<RefCell<Option<RadioNode>>> = global_radio_node_init();
/// ```
pub const fn global_radio_node_init() -> Mutex<RefCell<Option<RadioNode>>> {
    Mutex::new(RefCell::new(None))
}

/// Sets up the `critical_section::with` callback, storing a freshly
/// constructed `RadioNode` in the global static.
///
/// # Example
/// ```rust
/// use rf433bridge::node::RadioNode;
/// use core::cell::RefCell;
/// use critical_section::Mutex;
/// use rf433bridge::timer::{global_radio_node_init, global_radio_node_setup};
///
/// static RADIO_NODE: Mutex<RefCell<Option<RadioNode>>> = global_radio_node_init();
///
/// fn main() {
///     global_radio_node_setup(&RADIO_NODE);
/// }
/// ```
pub fn global_radio_node_setup(global_node: &'static Mutex<RefCell<Option<RadioNode>>>) {
    critical_section::with(|cs| {
        let _ = global_node.borrow(cs).replace(Some(RadioNode::new()));
    });
}

/// Runs the tick at each interrupt.
///
/// # Arguments
/// * The global static `RadioNode`
/// * `rx_pin` / `tx_pin`: the antenna pins
/// * `uart`: the host-facing line protocol transport
///
/// # Example
/// ```rust,ignore
/// use rf433bridge::timer::{global_radio_node_init, global_radio_node_tick};
///
/// static RADIO_NODE: Mutex<RefCell<Option<RadioNode>>> = global_radio_node_init();
/// #[interrupt]
/// fn TIM2() {
///     global_radio_node_tick(&RADIO_NODE, &mut RX_PIN, &mut TX_PIN, &mut UART);
/// }
/// ```
pub fn global_radio_node_tick<RX, TX, U>(
    global_node: &'static Mutex<RefCell<Option<RadioNode>>>,
    rx_pin: &mut RX,
    tx_pin: &mut TX,
    uart: &mut U,
) where
    RX: InputPin,
    TX: OutputPin,
    U: Uart,
{
    critical_section::with(|cs| {
        if let Some(node) = global_node.borrow(cs).borrow_mut().as_mut() {
            node.tick(rx_pin, tx_pin, uart);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uart::loopback::LoopbackUart;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction};

    #[test]
    fn global_node_init_and_setup() {
        static GLOBAL_NODE: Mutex<RefCell<Option<RadioNode>>> = global_radio_node_init();

        global_radio_node_setup(&GLOBAL_NODE);

        critical_section::with(|cs| {
            assert!(GLOBAL_NODE.borrow(cs).borrow().is_some());
        });
    }

    #[test]
    fn global_tick_function_advances_the_node() {
        static GLOBAL_NODE: Mutex<RefCell<Option<RadioNode>>> = global_radio_node_init();
        global_radio_node_setup(&GLOBAL_NODE);

        let mut rx = PinMock::new(&[PinTransaction::get(PinState::Low)]);
        let mut tx = PinMock::new(&[]);
        let mut uart = LoopbackUart::new();

        global_radio_node_tick(&GLOBAL_NODE, &mut rx, &mut tx, &mut uart);

        critical_section::with(|cs| {
            assert_eq!(GLOBAL_NODE.borrow(cs).borrow().as_ref().unwrap().stats().sync_found, 0);
        });

        rx.done();
        tx.done();
    }
}
