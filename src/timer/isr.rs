use crate::clock::{Paddles, TickClock};
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::InputPin;

/// Paddle inputs shared with the tick interrupt.
pub type GlobalPaddles<DOT, DASH> = Mutex<RefCell<Option<Paddles<DOT, DASH>>>>;

/// Used to initialize the global static paddles for use with `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use cwkeyer::timer::{GlobalPaddles, global_paddles_init};
/// use some_hal::{PD2, PD3};
///
/// static PADDLES: GlobalPaddles<PD2, PD3> = global_paddles_init::<PD2, PD3>();
/// ```
pub const fn global_paddles_init<DOT: InputPin, DASH: InputPin>() -> GlobalPaddles<DOT, DASH> {
    Mutex::new(RefCell::new(None))
}

/// Installs the paddle pins so the tick interrupt can sample them.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     global_paddles_setup(&PADDLES, dot, dash);
/// }
/// ```
pub fn global_paddles_setup<DOT: InputPin, DASH: InputPin>(
    global_paddles: &GlobalPaddles<DOT, DASH>,
    dot: DOT,
    dash: DASH,
) {
    critical_section::with(|cs| {
        let _ = global_paddles
            .borrow(cs)
            .replace(Some(Paddles::new(dot, dash)));
    });
}

/// Runs the clock tick at each interrupt.
///
/// Before the paddles are installed the clock still advances, with both contacts
/// treated as open.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER0_COMPA() {
///     global_clock_tick(&CLOCK, &PADDLES);
/// }
/// ```
pub fn global_clock_tick<DOT: InputPin, DASH: InputPin>(
    clock: &TickClock,
    global_paddles: &GlobalPaddles<DOT, DASH>,
) {
    critical_section::with(|cs| match global_paddles.borrow(cs).borrow_mut().as_mut() {
        Some(paddles) => paddles.on_interrupt(clock),
        None => clock.tick(false, false),
    });
}
