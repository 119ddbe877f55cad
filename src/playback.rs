//! Timed replay of a packed sign.
//!
//! [`Playback`] turns a [`PackedSign`] into the ordered keyed and silent intervals that
//! make it audible. The keyer walks the schedule, keying the [`Actuator`](crate::actuator::Actuator)
//! and waiting `units * speed_unit` ticks for each interval, so the schedule itself stays
//! free of timing and hardware.

use crate::codec::{Elements, PackedSign};
use crate::consts::CHARACTER_SPACE_UNITS;

/// One step of a playback schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Interval {
    /// Whether the key is down for this interval.
    pub keyed: bool,
    /// Duration in units.
    pub units: u16,
}

impl Interval {
    /// Key down for `units`.
    pub const fn mark(units: u16) -> Self {
        Self { keyed: true, units }
    }

    /// Key up for `units`.
    pub const fn space(units: u16) -> Self {
        Self {
            keyed: false,
            units,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Mark,
    Space,
    Done,
}

/// Schedule of intervals for one sign.
///
/// Every element is keyed for its length and followed by one unit of silence. The sign
/// closes with [`CHARACTER_SPACE_UNITS`] of silence.
#[derive(Debug, Clone)]
pub struct Playback {
    elements: Elements,
    phase: Phase,
}

impl Playback {
    /// Builds the schedule for `sign`.
    pub fn new(sign: PackedSign) -> Self {
        Self {
            elements: sign.elements(),
            phase: Phase::Mark,
        }
    }
}

impl Iterator for Playback {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        match self.phase {
            Phase::Mark => match self.elements.next() {
                Some(element) => {
                    self.phase = Phase::Space;
                    Some(Interval::mark(element.units()))
                }
                None => {
                    self.phase = Phase::Done;
                    Some(Interval::space(CHARACTER_SPACE_UNITS))
                }
            },
            Phase::Space => {
                self.phase = Phase::Mark;
                Some(Interval::space(1))
            }
            Phase::Done => None,
        }
    }
}

/// Total length of the schedule for `sign`, in units.
pub fn duration_units(sign: PackedSign) -> u32 {
    Playback::new(sign).map(|i| u32::from(i.units)).sum()
}
