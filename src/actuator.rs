//! Keying output.
//!
//! The core only ever asks for "key down with this tone" and "key up" through
//! [`Actuator`]. [`KeyOutput`] is the usual implementation: a keying line driven through an
//! `embedded_hal` output pin plus a [`Sidetone`] generator for the monitor tone.

use embedded_hal::digital::OutputPin;

/// Something the keyer can key.
pub trait Actuator {
    /// Keys down and starts the sidetone. A `tone_hz` of zero keys silently.
    fn activate(&mut self, tone_hz: u16);
    /// Keys up and silences the sidetone.
    fn deactivate(&mut self);
}

/// A tone generator, usually a PWM channel whose period the platform sets from the
/// frequency (see [`tone_compare_value`](crate::timer::tone_compare_value)).
pub trait Sidetone {
    /// Starts a tone at `hz`.
    fn start(&mut self, hz: u16);
    /// Stops the tone.
    fn stop(&mut self);
}

/// Sidetone that never sounds, for rigs without a speaker.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSidetone;

impl Sidetone for NoSidetone {
    fn start(&mut self, _hz: u16) {}
    fn stop(&mut self) {}
}

/// Keying line plus sidetone.
///
/// ## Example
///
/// ```rust
/// # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
/// use cwkeyer::actuator::{Actuator, KeyOutput, NoSidetone};
///
/// # let key = Pin::new(&[
/// #     PinTransaction::set(PinState::Low),
/// #     PinTransaction::set(PinState::High),
/// #     PinTransaction::set(PinState::Low),
/// # ]);
/// let mut output = KeyOutput::new(key, NoSidetone, false);
/// output.activate(600);
/// output.deactivate();
/// # output.key.done();
/// ```
#[derive(Debug)]
pub struct KeyOutput<KEY, TONE>
where
    KEY: OutputPin,
    TONE: Sidetone,
{
    /// Keying line
    pub key: KEY,
    /// Sidetone generator
    pub tone: TONE,
    inverted: bool,
}

impl<KEY, TONE> KeyOutput<KEY, TONE>
where
    KEY: OutputPin,
    TONE: Sidetone,
{
    /// Creates the output with the line released.
    ///
    /// # Arguments
    /// - `key`: the keying line
    /// - `tone`: the sidetone generator
    /// - `inverted`: whether key-down drives the line low
    pub fn new(key: KEY, tone: TONE, inverted: bool) -> Self {
        let mut output = Self {
            key,
            tone,
            inverted,
        };
        output.write_key(false);
        output
    }

    fn write_key(&mut self, down: bool) {
        let level = if self.inverted { !down } else { down };
        if level {
            let _ = self.key.set_high();
        } else {
            let _ = self.key.set_low();
        }
    }
}

impl<KEY, TONE> Actuator for KeyOutput<KEY, TONE>
where
    KEY: OutputPin,
    TONE: Sidetone,
{
    fn activate(&mut self, tone_hz: u16) {
        self.write_key(true);
        if tone_hz != 0 {
            self.tone.start(tone_hz);
        } else {
            self.tone.stop();
        }
    }

    fn deactivate(&mut self) {
        self.write_key(false);
        self.tone.stop();
    }
}
