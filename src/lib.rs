//! # cwkeyer
//!
//! A portable, no_std control core for USB Morse (CW) keyers.
//!
//! The crate turns paddle closures into Morse signs reported to a host, and host text
//! into keyed Morse, using:
//! - `embedded-hal` traits for paddle inputs, the key line and timing
//! - fixed-capacity `heapless` queues on both sides of the host link
//! - interrupt-safe clock and paddle latches with `critical-section`
//! - `nb`-style non-blocking configuration storage
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` |
//! | `delay-loop`          | Drives the tick from a blocking `embedded_hal::delay::DelayNs` loop |
//! | `timer-isr` (default) | Drives the tick from a timer interrupt via `critical_section` singletons |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Software Features
//!
//! - **Paddle decoding**: dot and dash latches, inhibit time, character and word gaps
//! - **Playback** of host text and raw packed signs with PARIS timing
//! - **Host protocol**: vendor requests, chunked `SEND` with duplicate suppression, and
//!   8-byte telemetry notifications
//! - **Deferred persistence** of speed, inhibit time and sidetone frequency
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cwkeyer::keyer::Keyer;
//!
//! cwkeyer::init_keyer_clock!(DotPin, DashPin);
//!
//! #[interrupt]
//! fn TIMER0_COMPA() {
//!     cwkeyer::tick_keyer_clock!(); // every 1 ms
//! }
//!
//! fn main() -> ! {
//!     cwkeyer::setup_paddles!(dot, dash);
//!     let mut keyer = Keyer::new(&KEYER_CLOCK, output, usb, watchdog, eeprom).unwrap();
//!     keyer.run()
//! }
//! ```
//!
//! Or, tick from a dedicated core with `run_tick_loop()` and a `DelayNs` implementation:
//!
//! ```rust,ignore
//! cwkeyer::timer::run_tick_loop(&CLOCK, &mut paddles, &mut delay, cwkeyer::timer::TICK_US);
//! ```
//!
//! ## Integration Notes
//!
//! - All durations are counted in 1 ms ticks; the tick source must run at
//!   [`TICK_HZ`](consts::TICK_HZ)
//! - The [`Actuator`](actuator::Actuator), [`Link`](transport::Link),
//!   [`Storage`](config::Storage) and [`Watchdog`](keyer::Watchdog) traits are the board's
//!   integration points
//! - Only one keyer instance should be active at a time in interrupt-driven mode

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

#[macro_use]
mod fmt;

pub use critical_section;
pub use heapless;

pub mod actuator;
pub mod clock;
pub mod codec;
pub mod config;
pub mod consts;
pub mod keyer;
pub mod keying;
pub mod playback;
pub mod queue;
pub mod timer;
pub mod transport;

#[cfg(test)]
#[allow(dead_code)]
pub(crate) mod mock;
