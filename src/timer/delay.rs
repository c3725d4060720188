use crate::node::RadioNode;
use crate::uart::Uart;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Runs a blocking loop that repeatedly calls `tick()` on the provided radio node.
///
/// This is a simple timing loop for use in environments where interrupts are unavailable
/// or undesired. It drives the node's timing using a delay provider implementing
/// `embedded_hal::delay::DelayNs`.
///
/// # Arguments
/// - `node`: A mutable reference to a `RadioNode` instance.
/// - `rx_pin` / `tx_pin`: the antenna pins.
/// - `uart`: the host-facing line protocol transport.
/// - `delay`: A delay provider, typically from the HAL.
/// - `tick_us`: The delay between each tick call, in microseconds (e.g. 63 for ~2 kbps).
///
/// # Example
/// ```rust
/// use rf433bridge::node::RadioNode;
/// use rf433bridge::timer::run_node_tick_loop;
/// let mut node = RadioNode::new();
/// run_node_tick_loop(&mut node, &mut rx, &mut tx, &mut uart, &mut delay, 63);
/// ```
///
/// # Notes
/// - This loop will never return; it is intended for single-purpose polling firmware.
/// - For more efficient or concurrent applications, prefer interrupt-driven tick scheduling.
pub fn run_node_tick_loop<D, RX, TX, U>(
    node: &mut RadioNode,
    rx_pin: &mut RX,
    tx_pin: &mut TX,
    uart: &mut U,
    delay: &mut D,
    tick_us: u32,
) where
    D: DelayNs,
    RX: InputPin,
    TX: OutputPin,
    U: Uart,
{
    loop {
        node.tick(rx_pin, tx_pin, uart);
        delay.delay_us(tick_us);
    }
}
