//! Tick and sidetone timer utilities.
//!
//! The keyer needs one periodic interrupt at [`TICK_HZ`] that advances the
//! [`TickClock`](crate::clock::TickClock) and samples the paddles. It can be driven two
//! ways: from a hardware timer interrupt through `critical_section` singletons
//! (`timer-isr` feature), or from a blocking delay loop on a core of its own
//! (`delay-loop` feature).
//!
//! Also contains compare-value calculators for CTC-mode timers:
//! - `compute_ocr_value`: runtime tick compare value
//! - `const_ocr_value`: compile-time tick compare value
//! - `tone_compare_value`: toggle compare value for a square-wave sidetone
//!
//! Common prescalers for a 1 ms tick:
//!
//! | F_CPU  | PRESCALER | OCR |
//! |--------|-----------|-----|
//! | 16 MHz |        64 | 250 |
//! |  8 MHz |        64 | 125 |
//! | 12 MHz |        64 | 188 |

use crate::consts::TICK_HZ;
use libm::round;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// Tick period in microseconds.
pub const TICK_US: u32 = 1_000_000 / TICK_HZ;

/// Computes the compare value for a CTC-mode tick timer.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `tick_us`: desired tick interval in microseconds
///
/// # Returns
/// - counts per tick, rounded to the nearest integer
pub fn compute_ocr_value(f_cpu: u32, prescaler: u32, tick_us: f32) -> u16 {
    let counts_per_second = f64::from(f_cpu) / f64::from(prescaler);
    let counts = counts_per_second * f64::from(tick_us) / 1_000_000.0;
    round(counts) as u16
}

/// Compile-time tick compare value, truncating.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler
/// - `tick_us`: desired tick interval in whole microseconds
pub const fn const_ocr_value(f_cpu: u32, prescaler: u32, tick_us: u32) -> u16 {
    ((f_cpu / prescaler) as u64 * tick_us as u64 / 1_000_000) as u16
}

/// Compare value that toggles an output at `hz`, producing a square wave of that
/// frequency.
///
/// Returns `None` for a zero frequency (silent keying) or when the value does not fit
/// a 16-bit compare register.
pub fn tone_compare_value(f_cpu: u32, prescaler: u32, hz: u16) -> Option<u16> {
    if hz == 0 || prescaler == 0 {
        return None;
    }
    let toggles = u32::from(hz) * 2;
    u16::try_from(f_cpu / prescaler / toggles).ok()
}
