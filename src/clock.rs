//! Interrupt-driven time base and paddle latches.
//!
//! [`TickClock`] is the only state shared between the tick interrupt and the main loop.
//! The interrupt calls [`TickClock::tick`] once per period (see
//! [`TICK_HZ`](crate::consts::TICK_HZ)), which
//!
//! - advances a wrapping 16-bit tick counter,
//! - advances the keying gap timer while it is running,
//! - latches each paddle whose contact is closed.
//!
//! A latch is only cleared by the main loop, so a closure shorter than one tick period is
//! never lost even while the loop is busy playing a sign. Every access goes through
//! `critical_section::with`, which keeps the multi-byte reads atomic on 8-bit targets.

use crate::codec::Element;
use core::cell::Cell;
use core::fmt;
use critical_section::Mutex;
use embedded_hal::digital::InputPin;

#[derive(Clone, Copy, Default)]
struct ClockState {
    ticks: u16,
    gap: u16,
    dot: bool,
    dash: bool,
}

/// Tick counter, gap timer and latched paddle flags.
///
/// Designed to live in a `static` so the interrupt handler can reach it:
///
/// ```rust
/// use cwkeyer::clock::TickClock;
///
/// static CLOCK: TickClock = TickClock::new();
///
/// // in the timer interrupt
/// CLOCK.tick(false, false);
/// assert_eq!(CLOCK.now(), 1);
/// ```
pub struct TickClock {
    state: Mutex<Cell<ClockState>>,
}

impl TickClock {
    /// Creates a stopped clock at tick zero with no latches set.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(ClockState {
                ticks: 0,
                gap: 0,
                dot: false,
                dash: false,
            })),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut ClockState) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            let r = f(&mut state);
            cell.set(state);
            r
        })
    }

    fn read(&self) -> ClockState {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    /// Advances the clock by one period. Call from the tick interrupt only.
    ///
    /// # Arguments
    /// - `dot_closed`: whether the dot contact is closed on this tick
    /// - `dash_closed`: whether the dash contact is closed on this tick
    pub fn tick(&self, dot_closed: bool, dash_closed: bool) {
        self.update(|s| {
            s.ticks = s.ticks.wrapping_add(1);
            if s.gap != 0 {
                s.gap = s.gap.saturating_add(1);
            }
            s.dot |= dot_closed;
            s.dash |= dash_closed;
        });
    }

    /// Current tick count.
    pub fn now(&self) -> u16 {
        self.read().ticks
    }

    /// Ticks since `start`, correct across one counter wrap.
    pub fn elapsed_since(&self, start: u16) -> u16 {
        self.now().wrapping_sub(start)
    }

    /// Whether a closure of `element`'s paddle has been latched.
    pub fn is_latched(&self, element: Element) -> bool {
        let s = self.read();
        match element {
            Element::Dot => s.dot,
            Element::Dash => s.dash,
        }
    }

    /// Whether either paddle is latched.
    pub fn any_latched(&self) -> bool {
        let s = self.read();
        s.dot || s.dash
    }

    /// Clears `element`'s latch.
    pub fn clear_latch(&self, element: Element) {
        self.update(|s| match element {
            Element::Dot => s.dot = false,
            Element::Dash => s.dash = false,
        });
    }

    /// Starts (or restarts) gap accounting from one tick.
    pub fn restart_gap(&self) {
        self.update(|s| s.gap = 1);
    }

    /// Stops gap accounting.
    pub fn stop_gap(&self) {
        self.update(|s| s.gap = 0);
    }

    /// Ticks on the gap timer, zero when stopped.
    pub fn gap_ticks(&self) -> u16 {
        self.read().gap
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TickClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.read();
        f.debug_struct("TickClock")
            .field("ticks", &s.ticks)
            .field("gap", &s.gap)
            .field("dot", &s.dot)
            .field("dash", &s.dash)
            .finish()
    }
}

/// The two paddle contacts.
///
/// Contacts pull their line low when closed. A pin read error counts as an open contact.
#[derive(Debug)]
pub struct Paddles<DOT, DASH>
where
    DOT: InputPin,
    DASH: InputPin,
{
    /// Dot paddle input
    pub dot: DOT,
    /// Dash paddle input
    pub dash: DASH,
}

impl<DOT, DASH> Paddles<DOT, DASH>
where
    DOT: InputPin,
    DASH: InputPin,
{
    /// Wraps the two paddle inputs.
    pub fn new(dot: DOT, dash: DASH) -> Self {
        Self { dot, dash }
    }

    /// Samples both contacts, returning `(dot_closed, dash_closed)`.
    pub fn sample(&mut self) -> (bool, bool) {
        (
            self.dot.is_low().unwrap_or(false),
            self.dash.is_low().unwrap_or(false),
        )
    }

    /// Samples both contacts and advances `clock` by one tick.
    ///
    /// This is the whole body of the tick interrupt.
    pub fn on_interrupt(&mut self, clock: &TickClock) {
        let (dot, dash) = self.sample();
        clock.tick(dot, dash);
    }
}
