/// Declares a static global `RADIO_NODE` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `RADIO_NODE` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to safely access the shared node state.
///
/// # Example
/// ```rust
/// init_radio_node!();
/// ```
#[macro_export]
macro_rules! init_radio_node {
    () => {
        pub static RADIO_NODE: $crate::critical_section::Mutex<
            core::cell::RefCell<Option<$crate::node::RadioNode>>,
        > = $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Initializes the global `RADIO_NODE` singleton with a freshly constructed node.
///
/// # Example
/// ```rust
/// fn main() {
///     setup_radio_node!();
/// }
/// ```
///
/// # Notes
/// - Must be called inside a critical section-aware context (safe in `main()`).
/// - Requires `init_radio_node!` to have been used earlier.
#[macro_export]
macro_rules! setup_radio_node {
    () => {
        $crate::critical_section::with(|cs| {
            RADIO_NODE
                .borrow(cs)
                .replace(Some($crate::node::RadioNode::new()));
        });
    };
}

/// Calls `tick()` on the global `RADIO_NODE` if it has been initialized.
///
/// This macro is intended to be invoked from a timer ISR to advance the
/// node's state machine at regular intervals (e.g., every 62.5 µs).
///
/// # Example
/// ```rust
/// #[interrupt]
/// fn TIM2() {
///     tick_radio_node!(&mut RX_PIN, &mut TX_PIN, &mut UART);
/// }
/// ```
///
/// # Notes
/// - This macro assumes `RADIO_NODE` was declared with `init_radio_node!`
///   and initialized via `setup_radio_node!`.
/// - Safe to call repeatedly — will silently do nothing if the node hasn't been set up yet.
#[macro_export]
macro_rules! tick_radio_node {
    ( $rx:expr, $tx:expr, $uart:expr ) => {
        $crate::critical_section::with(|cs| {
            if let Some(node) = RADIO_NODE.borrow(cs).borrow_mut().as_mut() {
                node.tick($rx, $tx, $uart);
            }
        });
    };
}
