/// Declares the static `KEYER_CLOCK` and `PADDLES` singletons shared between the main
/// loop and the tick interrupt.
///
/// # Arguments
/// - `$dot`: The concrete type of the dot paddle pin (must implement `InputPin`)
/// - `$dash`: The concrete type of the dash paddle pin (must implement `InputPin`)
///
/// # Example
/// ```rust,ignore
/// init_keyer_clock!(MyDotPinType, MyDashPinType);
///
/// let keyer = Keyer::new(&KEYER_CLOCK, output, usb, watchdog, eeprom)?;
/// ```
#[macro_export]
macro_rules! init_keyer_clock {
    ( $dot:ty, $dash:ty ) => {
        pub static KEYER_CLOCK: $crate::clock::TickClock = $crate::clock::TickClock::new();
        pub static PADDLES: $crate::timer::GlobalPaddles<$dot, $dash> =
            $crate::timer::global_paddles_init::<$dot, $dash>();
    };
}

/// Installs the paddle pins into the `PADDLES` singleton declared by
/// `init_keyer_clock!`.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_paddles!(dot, dash);
/// }
/// ```
#[macro_export]
macro_rules! setup_paddles {
    ( $dot:expr, $dash:expr ) => {
        $crate::timer::global_paddles_setup(&PADDLES, $dot, $dash)
    };
}

/// Samples the paddles and advances `KEYER_CLOCK` by one tick.
///
/// Intended to be the whole body of the 1 ms timer interrupt.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER0_COMPA() {
///     tick_keyer_clock!();
/// }
/// ```
///
/// # Notes
/// - Requires `init_keyer_clock!` to have been used earlier.
/// - The clock advances even before `setup_paddles!`, with both contacts open.
#[macro_export]
macro_rules! tick_keyer_clock {
    () => {
        $crate::timer::global_clock_tick(&KEYER_CLOCK, &PADDLES)
    };
}

#[cfg(test)]
mod tests {
    use crate::codec::Element;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_singletons_drive_the_clock() {
        crate::init_keyer_clock!(PinMock, PinMock);

        crate::tick_keyer_clock!();
        assert_eq!(KEYER_CLOCK.now(), 1);

        let dot = PinMock::new(&[Transaction::get(State::High)]);
        let dash = PinMock::new(&[Transaction::get(State::Low)]);
        crate::setup_paddles!(dot, dash);
        crate::tick_keyer_clock!();
        assert_eq!(KEYER_CLOCK.now(), 2);
        assert!(KEYER_CLOCK.is_latched(Element::Dash));

        let mut paddles = critical_section::with(|cs| PADDLES.borrow(cs).take()).unwrap();
        paddles.dot.done();
        paddles.dash.done();
    }
}
