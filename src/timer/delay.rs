use crate::clock::{Paddles, TickClock};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

/// Runs a blocking loop that samples the paddles and ticks the clock forever.
///
/// This is a simple time base for targets where a timer interrupt is unavailable or
/// undesired. The loop never yields, so it belongs on a core or thread of its own while
/// the [`Keyer`](crate::keyer::Keyer) runs elsewhere against the same `clock`.
///
/// # Arguments
/// - `clock`: The clock shared with the keyer
/// - `paddles`: The paddle inputs
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL
/// - `tick_us`: The delay between ticks in microseconds, usually [`TICK_US`](super::TICK_US)
///
/// # Example
/// ```rust,ignore
/// cwkeyer::timer::run_tick_loop(&CLOCK, &mut paddles, &mut delay, TICK_US);
/// ```
///
/// # Notes
/// - The time spent sampling adds to each period; trim `tick_us` on slow targets.
pub fn run_tick_loop<D, DOT, DASH>(
    clock: &TickClock,
    paddles: &mut Paddles<DOT, DASH>,
    delay: &mut D,
    tick_us: u32,
) -> !
where
    D: DelayNs,
    DOT: InputPin,
    DASH: InputPin,
{
    loop {
        run_ticks(clock, paddles, delay, tick_us, u32::MAX);
    }
}

/// Runs `count` periods of [`run_tick_loop`] and returns.
pub fn run_ticks<D, DOT, DASH>(
    clock: &TickClock,
    paddles: &mut Paddles<DOT, DASH>,
    delay: &mut D,
    tick_us: u32,
    count: u32,
) where
    D: DelayNs,
    DOT: InputPin,
    DASH: InputPin,
{
    for _ in 0..count {
        paddles.on_interrupt(clock);
        delay.delay_us(tick_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Element;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};
    use std::vec::Vec;

    #[test]
    fn test_ticks_sample_every_period() {
        let dot_states: Vec<Transaction> = [State::High, State::Low, State::High]
            .into_iter()
            .map(Transaction::get)
            .collect();
        let dash_states: Vec<Transaction> = (0..3).map(|_| Transaction::get(State::High)).collect();
        let clock = TickClock::new();
        let mut paddles = Paddles::new(PinMock::new(&dot_states), PinMock::new(&dash_states));

        run_ticks(&clock, &mut paddles, &mut NoopDelay::new(), 1_000, 3);
        assert_eq!(clock.now(), 3);
        assert!(clock.is_latched(Element::Dot));
        assert!(!clock.is_latched(Element::Dash));

        paddles.dot.done();
        paddles.dash.done();
    }
}
