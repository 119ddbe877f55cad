//! Classification of manual paddle keying.
//!
//! The keyer reports each keyed element and each phase change to [`KeyingStateMachine`],
//! and hands it the gap timer reading on every loop iteration. The machine assembles the
//! pending [`PackedSign`] and decides when silence ends a character or a word:
//!
//! - more than [`WORD_GAP_UNITS`] of silence with nothing pending is a word space,
//! - otherwise more than [`CHARACTER_GAP_UNITS`] with a sign pending flushes that sign.
//!
//! The word-space test runs first, so a reading on both sides of a boundary resolves to
//! the longer gap. Classification is forward-only: a flushed sign is never revisited.

use crate::codec::{Element, PackedSign};
use crate::consts::{CHARACTER_GAP_UNITS, WORD_GAP_UNITS};

/// Phase of manual keying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum KeyingState {
    /// No keying since the last word space.
    #[default]
    Idle,
    /// An element is keyed.
    ElementActive,
    /// Mandatory quiet period directly after an element.
    Inhibit,
    /// Silence accumulating on the gap timer.
    Gap,
}

/// Output of [`KeyingStateMachine::classify_gap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum GapEvent {
    /// A complete character, to be sent escaped.
    Character(PackedSign),
    /// A word gap.
    WordSpace,
}

/// Paddle keying classifier.
#[derive(Debug, Default)]
pub struct KeyingStateMachine {
    state: KeyingState,
    sign: PackedSign,
}

impl KeyingStateMachine {
    /// Creates an idle machine with nothing pending.
    pub const fn new() -> Self {
        Self {
            state: KeyingState::Idle,
            sign: PackedSign::EMPTY,
        }
    }

    /// Current phase.
    pub fn state(&self) -> KeyingState {
        self.state
    }

    /// The sign assembled so far.
    pub fn pending(&self) -> PackedSign {
        self.sign
    }

    /// Records the start of a keyed `element`.
    ///
    /// Returns a completed sign when the pending one had no room left for the element;
    /// the new element then starts a fresh sign.
    pub fn begin_element(&mut self, element: Element) -> Option<PackedSign> {
        self.state = KeyingState::ElementActive;
        match self.sign.push(element) {
            Ok(()) => None,
            Err(_) => {
                let full = self.sign;
                self.sign = PackedSign::EMPTY;
                let _ = self.sign.push(element);
                Some(full)
            }
        }
    }

    /// The element is released and the inhibit period begins.
    pub fn begin_inhibit(&mut self) {
        self.state = KeyingState::Inhibit;
    }

    /// The element's full unit has elapsed and gap accounting starts.
    pub fn begin_gap(&mut self) {
        self.state = KeyingState::Gap;
    }

    /// Classifies the silence measured by the gap timer.
    ///
    /// # Arguments
    /// - `gap_ticks`: the gap timer reading, zero when it is stopped
    /// - `unit`: the speed unit in ticks
    pub fn classify_gap(&mut self, gap_ticks: u16, unit: u16) -> Option<GapEvent> {
        if gap_ticks == 0 {
            return None;
        }
        let gap = u32::from(gap_ticks);
        let unit = u32::from(unit);
        if gap > unit * u32::from(WORD_GAP_UNITS) && self.sign.is_empty() {
            self.state = KeyingState::Idle;
            Some(GapEvent::WordSpace)
        } else if gap > unit * u32::from(CHARACTER_GAP_UNITS) && !self.sign.is_empty() {
            let sign = self.sign;
            self.sign = PackedSign::EMPTY;
            Some(GapEvent::Character(sign))
        } else {
            None
        }
    }
}
