//! Operating parameters and their deferred persistence.
//!
//! [`Config`] holds speed, inhibit time and sidetone frequency and enforces
//! `inhibit_time < speed_unit`. [`ConfigStore`] owns the live config, counts pending
//! changes and writes them back through a [`Storage`] medium once it reports idle. Any
//! number of changes made before the write share that single write.
//!
//! ## Blob layout
//!
//! | Offset | Field                      |
//! |--------|----------------------------|
//! | 0      | speed (wpm)                |
//! | 1      | speed unit (ms, saturated) |
//! | 2..4   | tone (Hz, little-endian)   |
//! | 4      | inhibit time (ms)          |
//!
//! A stored speed of `0x00` or `0xff` marks blank storage.

use crate::consts::{CONFIG_BLOB_LEN, DEFAULT_INHIBIT_TIME, DEFAULT_SPEED, DEFAULT_TONE, PARIS_MS};
use nb::block;

/// A persisted configuration blob.
pub type ConfigBlob = [u8; CONFIG_BLOB_LEN];

/// Operating parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Config {
    speed: u8,
    speed_unit: u16,
    tone: u16,
    inhibit_time: u8,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            speed: DEFAULT_SPEED,
            speed_unit: PARIS_MS / DEFAULT_SPEED as u16,
            tone: DEFAULT_TONE,
            inhibit_time: 0,
        };
        let _ = config.set_speed(DEFAULT_SPEED, DEFAULT_INHIBIT_TIME);
        config
    }
}

impl Config {
    /// Speed in words per minute.
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Length of one dot in milliseconds, `1200 / speed`.
    pub fn speed_unit(&self) -> u16 {
        self.speed_unit
    }

    /// Sidetone frequency in Hz, zero for silent keying.
    pub fn tone(&self) -> u16 {
        self.tone
    }

    /// Post-element quiet period in milliseconds, always below the speed unit.
    pub fn inhibit_time(&self) -> u8 {
        self.inhibit_time
    }

    /// Applies a new speed and inhibit time.
    ///
    /// An inhibit time that is not shorter than the resulting speed unit is clamped to
    /// zero. A speed of zero is rejected and leaves the config untouched.
    ///
    /// # Returns
    /// Whether the config was changed.
    pub fn set_speed(&mut self, wpm: u8, inhibit_time: u8) -> bool {
        if wpm == 0 {
            return false;
        }
        self.speed = wpm;
        self.speed_unit = PARIS_MS / u16::from(wpm);
        self.inhibit_time = if u16::from(inhibit_time) < self.speed_unit {
            inhibit_time
        } else {
            0
        };
        true
    }

    /// Sets the sidetone frequency.
    pub fn set_tone(&mut self, hz: u16) {
        self.tone = hz;
    }

    /// Serializes to the persisted layout.
    pub fn to_blob(&self) -> ConfigBlob {
        let [tone_lo, tone_hi] = self.tone.to_le_bytes();
        [
            self.speed,
            u8::try_from(self.speed_unit).unwrap_or(u8::MAX),
            tone_lo,
            tone_hi,
            self.inhibit_time,
        ]
    }

    /// Parses a persisted blob, or `None` if the storage is blank.
    ///
    /// The speed unit is re-derived and the inhibit time re-validated rather than
    /// trusted.
    pub fn from_blob(blob: &ConfigBlob) -> Option<Self> {
        let [speed, _unit, tone_lo, tone_hi, inhibit_time] = *blob;
        if speed == 0 || speed == u8::MAX {
            return None;
        }
        let mut config = Self::default();
        let _ = config.set_speed(speed, inhibit_time);
        config.set_tone(u16::from_le_bytes([tone_lo, tone_hi]));
        Some(config)
    }
}

/// A persistent medium holding one configuration blob.
///
/// Both operations follow the `nb` convention: `WouldBlock` means the medium is busy
/// with an earlier write and the call should be retried later.
pub trait Storage {
    /// Error raised by the medium.
    type Error: core::fmt::Debug;

    /// Reads the blob into `blob`.
    fn load(&mut self, blob: &mut ConfigBlob) -> nb::Result<(), Self::Error>;

    /// Writes `blob`.
    fn store(&mut self, blob: &ConfigBlob) -> nb::Result<(), Self::Error>;
}

/// The live configuration plus its write-back state.
#[derive(Debug)]
pub struct ConfigStore<S: Storage> {
    storage: S,
    config: Config,
    dirty: u8,
}

impl<S: Storage> ConfigStore<S> {
    /// Loads the configuration from `storage`, waiting for the medium if it is busy.
    ///
    /// Blank storage yields [`Config::default`], marked dirty so the defaults get
    /// persisted on the first idle opportunity.
    pub fn load(mut storage: S) -> Result<Self, S::Error> {
        let mut blob = [0u8; CONFIG_BLOB_LEN];
        block!(storage.load(&mut blob))?;
        let (config, dirty) = match Config::from_blob(&blob) {
            Some(config) => {
                info!(
                    "config loaded: {} wpm, inhibit {} ms, tone {} Hz",
                    config.speed(),
                    config.inhibit_time(),
                    config.tone()
                );
                (config, 0)
            }
            None => {
                info!("config storage blank, using defaults");
                (Config::default(), 1)
            }
        };
        Ok(Self {
            storage,
            config,
            dirty,
        })
    }

    /// The live configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The storage medium.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the storage medium.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Number of changes waiting to be written.
    pub fn pending_saves(&self) -> u8 {
        self.dirty
    }

    /// Marks the configuration as needing a write-back.
    pub fn request_save(&mut self) {
        self.dirty = self.dirty.saturating_add(1);
    }

    /// Validated speed change; see [`Config::set_speed`].
    pub fn set_speed(&mut self, wpm: u8, inhibit_time: u8) -> bool {
        if !self.config.set_speed(wpm, inhibit_time) {
            warn!("rejected speed of {} wpm", wpm);
            return false;
        }
        if self.config.inhibit_time() != inhibit_time {
            debug!("inhibit time {} ms clamped to 0", inhibit_time);
        }
        info!(
            "speed set to {} wpm, inhibit {} ms",
            self.config.speed(),
            self.config.inhibit_time()
        );
        self.request_save();
        true
    }

    /// Sets the sidetone frequency.
    pub fn set_tone(&mut self, hz: u16) {
        self.config.set_tone(hz);
        info!("tone set to {} Hz", hz);
        self.request_save();
    }

    /// Writes the configuration back if it is dirty and the medium is idle.
    ///
    /// # Returns
    /// - `Ok(true)`: a write was performed and every pending change is persisted
    /// - `Ok(false)`: nothing to write, or the medium is busy
    /// - `Err(_)`: the medium failed; the changes stay pending
    pub fn maybe_flush(&mut self) -> Result<bool, S::Error> {
        if self.dirty == 0 {
            return Ok(false);
        }
        match self.storage.store(&self.config.to_blob()) {
            Ok(()) => {
                debug!("config written back ({} pending changes)", self.dirty);
                self.dirty = 0;
                Ok(true)
            }
            Err(nb::Error::WouldBlock) => Ok(false),
            Err(nb::Error::Other(e)) => Err(e),
        }
    }
}
