//! The cooperative main loop.
//!
//! [`Keyer`] owns every piece of foreground state and is the only place that composes
//! them. It shares exactly one thing with interrupt context: the [`TickClock`], which the
//! tick interrupt advances and the paddle latches live in.
//!
//! Each call to [`Keyer::poll`] runs one loop iteration:
//!
//! 1. feed the watchdog and service the host link,
//! 2. key a latched dot, then a latched dash,
//! 3. classify the silence on the gap timer,
//! 4. play at most one byte from the inbound queue,
//! 5. write dirty configuration back if the medium is idle.
//!
//! Every timed wait goes through [`Keyer::delay`], which keeps feeding the watchdog and
//! servicing the link, so the host is never starved while a sign is keyed or played.
//!
//! ```rust,ignore
//! static CLOCK: TickClock = TickClock::new();
//!
//! let mut keyer = Keyer::new(&CLOCK, output, usb, watchdog, eeprom)?;
//! keyer.run();
//! ```

use crate::actuator::Actuator;
use crate::clock::TickClock;
use crate::codec::{self, Element, PackedSign};
use crate::config::{Config, ConfigStore, Storage};
use crate::consts::{CUSTOM_CODE_POLL_MS, ESCAPE, SIGN_BYTES, WORD_SPACE, WORD_SPACE_UNITS};
use crate::keying::{GapEvent, KeyingState, KeyingStateMachine};
use crate::playback::Playback;
use crate::queue::{OverflowPolicy, RingQueue};
use crate::transport::{Link, LinkEvent, TransportAdapter};

/// A liveness watchdog, fed once per loop and wait iteration.
pub trait Watchdog {
    /// Resets the watchdog countdown.
    fn feed(&mut self);
}

/// For boards without a watchdog.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWatchdog;

impl Watchdog for NoWatchdog {
    fn feed(&mut self) {}
}

/// The keyer control core.
#[derive(Debug)]
pub struct Keyer<'a, A, L, W, S>
where
    A: Actuator,
    L: Link,
    W: Watchdog,
    S: Storage,
{
    clock: &'a TickClock,
    /// Key line and sidetone.
    pub actuator: A,
    /// Host transport.
    pub link: L,
    /// Liveness watchdog.
    pub watchdog: W,
    settings: ConfigStore<S>,
    inbound: RingQueue,
    outbound: RingQueue,
    transport: TransportAdapter,
    keying: KeyingStateMachine,
    unknown_characters: u16,
}

impl<'a, A, L, W, S> Keyer<'a, A, L, W, S>
where
    A: Actuator,
    L: Link,
    W: Watchdog,
    S: Storage,
{
    /// Loads the configuration from `storage` and releases the key line.
    ///
    /// # Errors
    /// Returns the medium's error if the configuration cannot be read.
    pub fn new(
        clock: &'a TickClock,
        mut actuator: A,
        link: L,
        watchdog: W,
        storage: S,
    ) -> Result<Self, S::Error> {
        let settings = ConfigStore::load(storage)?;
        actuator.deactivate();
        info!("keyer ready at {} wpm", settings.config().speed());
        Ok(Self {
            clock,
            actuator,
            link,
            watchdog,
            settings,
            inbound: RingQueue::new(OverflowPolicy::RejectNew),
            outbound: RingQueue::new(OverflowPolicy::OverwriteOldest),
            transport: TransportAdapter::new(),
            keying: KeyingStateMachine::new(),
            unknown_characters: 0,
        })
    }

    /// Runs the main loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// Runs one main loop iteration.
    pub fn poll(&mut self) {
        self.watchdog.feed();
        self.service();
        self.key_paddles();
        self.classify_gap();
        self.play_next();
        self.flush_config();
    }

    /// Handles every pending link event, then sends one notification if the link can
    /// take it.
    pub fn service(&mut self) {
        while let Some(event) = self.link.poll() {
            match event {
                LinkEvent::Setup(request) => {
                    let reply = self
                        .transport
                        .setup(&request, &mut self.inbound, &mut self.settings);
                    self.link.reply(&reply);
                }
                LinkEvent::Chunk(chunk) => {
                    let status = self.transport.write(&chunk, &mut self.inbound);
                    self.link.chunk_status(status);
                }
            }
        }
        if self.link.notification_ready() {
            let data = self
                .transport
                .notification(&self.inbound, &mut self.outbound);
            self.link.notify(&data);
        }
    }

    /// Waits `ticks` ticks while keeping the watchdog fed and the link serviced.
    pub fn delay(&mut self, ticks: u16) {
        let start = self.clock.now();
        while self.clock.elapsed_since(start) < ticks {
            self.watchdog.feed();
            self.service();
        }
    }

    /// The live configuration.
    pub fn config(&self) -> &Config {
        self.settings.config()
    }

    /// The configuration and its write-back state.
    pub fn settings(&self) -> &ConfigStore<S> {
        &self.settings
    }

    /// Characters queued by the host and not yet played.
    pub fn inbound(&self) -> &RingQueue {
        &self.inbound
    }

    /// Bytes waiting to be reported to the host.
    pub fn outbound(&self) -> &RingQueue {
        &self.outbound
    }

    /// The transport's reassembly state.
    pub fn transport(&self) -> &TransportAdapter {
        &self.transport
    }

    /// Phase of manual keying.
    pub fn keying_state(&self) -> KeyingState {
        self.keying.state()
    }

    /// Host characters that had no Morse code and were skipped.
    pub fn unknown_characters(&self) -> u16 {
        self.unknown_characters
    }

    fn key_paddles(&mut self) {
        for element in [Element::Dot, Element::Dash] {
            if self.clock.is_latched(element) {
                self.key_element(element);
            }
        }
    }

    fn key_element(&mut self, element: Element) {
        if !self.inbound.is_empty() {
            debug!("manual keying, dropping {} queued bytes", self.inbound.len());
            self.inbound.clear();
        }
        if let Some(sign) = self.keying.begin_element(element) {
            debug!("sign full, flushing early");
            self.emit_sign(sign);
        }

        let config = *self.settings.config();
        let unit = config.speed_unit();
        let inhibit = u16::from(config.inhibit_time());

        self.actuator.activate(config.tone());
        self.delay(unit.saturating_mul(element.units()));
        self.actuator.deactivate();

        self.keying.begin_inhibit();
        self.delay(inhibit);
        self.clock.clear_latch(element);
        self.delay(unit.saturating_sub(inhibit));

        self.keying.begin_gap();
        self.clock.restart_gap();
    }

    fn classify_gap(&mut self) {
        let unit = self.settings.config().speed_unit();
        match self.keying.classify_gap(self.clock.gap_ticks(), unit) {
            Some(GapEvent::WordSpace) => {
                self.clock.stop_gap();
                trace!("word space");
                self.emit(WORD_SPACE);
            }
            Some(GapEvent::Character(sign)) => self.emit_sign(sign),
            None => {}
        }
    }

    fn play_next(&mut self) {
        let Ok(byte) = self.inbound.get() else {
            return;
        };
        match byte {
            WORD_SPACE => {
                self.emit(WORD_SPACE);
                let unit = self.settings.config().speed_unit();
                self.delay(unit.saturating_mul(WORD_SPACE_UNITS));
            }
            ESCAPE => self.play_custom(),
            character => match codec::encode(character) {
                Ok(sign) => {
                    self.emit(character);
                    self.play(sign);
                }
                Err(_) => {
                    self.unknown_characters = self.unknown_characters.saturating_add(1);
                    warn!("skipping {:#x}: no Morse code", character);
                }
            },
        }
    }

    /// Plays the raw sign following an escape byte, low byte first, waiting for its
    /// bytes if the host has not delivered them yet. Manual keying abandons the wait.
    fn play_custom(&mut self) {
        while self.inbound.len() < SIGN_BYTES {
            if self.clock.any_latched() {
                warn!("custom code abandoned for manual keying");
                return;
            }
            self.delay(CUSTOM_CODE_POLL_MS);
        }
        let mut bytes = [0u8; SIGN_BYTES];
        for slot in bytes.iter_mut() {
            if let Ok(byte) = self.inbound.get() {
                *slot = byte;
            }
        }
        self.emit(ESCAPE);
        for byte in bytes {
            self.emit(byte);
        }
        self.play(PackedSign::from_le_bytes(bytes));
    }

    fn play(&mut self, sign: PackedSign) {
        let config = *self.settings.config();
        for interval in Playback::new(sign) {
            if interval.keyed {
                self.actuator.activate(config.tone());
            } else {
                self.actuator.deactivate();
            }
            self.delay(config.speed_unit().saturating_mul(interval.units));
        }
    }

    fn emit_sign(&mut self, sign: PackedSign) {
        trace!("sign {:#x}", sign.raw());
        self.emit(ESCAPE);
        for byte in sign.to_be_bytes() {
            self.emit(byte);
        }
    }

    fn emit(&mut self, byte: u8) {
        if self.outbound.is_full() {
            warn!("outbound queue full, dropping oldest");
        }
        let _ = self.outbound.put(byte);
    }

    fn flush_config(&mut self) {
        if self.settings.maybe_flush().is_err() {
            error!("config write-back failed, will retry");
        }
    }
}
