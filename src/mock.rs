//! Simulated collaborators for host-side tests.
//!
//! The keyer only moves forward in time when the tick interrupt fires. On the host there
//! is no interrupt, so [`SimTimer`] plays that role: the keyer feeds its watchdog once per
//! loop iteration and once per wait iteration, and every feed here samples the scripted
//! paddles and ticks the clock. One feed is one millisecond.

use crate::actuator::Actuator;
use crate::clock::TickClock;
use crate::codec::Element;
use crate::config::{ConfigBlob, Storage};
use crate::consts::CONFIG_BLOB_LEN;
use crate::keyer::Watchdog;
use crate::transport::{Chunk, ChunkStatus, Link, LinkEvent, Reply, Request, RequestCode};
use std::collections::VecDeque;
use std::vec::Vec;

/// Failure injected into [`MemoryStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageFault;

/// In-memory config medium with injectable busy periods and failures.
#[derive(Debug)]
pub struct MemoryStorage {
    pub blob: ConfigBlob,
    pub busy_for: u8,
    pub fail: bool,
    pub writes: u32,
}

impl MemoryStorage {
    pub fn blank() -> Self {
        Self::with([0xff; CONFIG_BLOB_LEN])
    }

    pub fn with(blob: ConfigBlob) -> Self {
        Self {
            blob,
            busy_for: 0,
            fail: false,
            writes: 0,
        }
    }

    fn busy(&mut self) -> bool {
        if self.busy_for > 0 {
            self.busy_for -= 1;
            true
        } else {
            false
        }
    }
}

impl Storage for MemoryStorage {
    type Error = StorageFault;

    fn load(&mut self, blob: &mut ConfigBlob) -> nb::Result<(), StorageFault> {
        if self.busy() {
            return Err(nb::Error::WouldBlock);
        }
        *blob = self.blob;
        Ok(())
    }

    fn store(&mut self, blob: &ConfigBlob) -> nb::Result<(), StorageFault> {
        if self.fail {
            return Err(nb::Error::Other(StorageFault));
        }
        if self.busy() {
            return Err(nb::Error::WouldBlock);
        }
        self.blob = *blob;
        self.writes += 1;
        Ok(())
    }
}

/// Stands in for the tick interrupt, see the module docs.
#[derive(Debug)]
pub struct SimTimer<'a> {
    clock: &'a TickClock,
    presses: Vec<(Element, u16, u16)>,
    pub feeds: u32,
}

impl<'a> SimTimer<'a> {
    pub fn new(clock: &'a TickClock) -> Self {
        Self {
            clock,
            presses: Vec::new(),
            feeds: 0,
        }
    }

    /// Holds `element`'s paddle closed for ticks `start..end`.
    pub fn press(&mut self, element: Element, start: u16, end: u16) {
        self.presses.push((element, start, end));
    }

    fn closed(&self, element: Element, now: u16) -> bool {
        self.presses
            .iter()
            .any(|&(e, start, end)| e == element && (start..end).contains(&now))
    }
}

impl Watchdog for SimTimer<'_> {
    fn feed(&mut self) {
        let now = self.clock.now();
        let dot = self.closed(Element::Dot, now);
        let dash = self.closed(Element::Dash, now);
        self.clock.tick(dot, dash);
        self.feeds += 1;
    }
}

/// Records every actuator call with the tick it happened on.
#[derive(Debug)]
pub struct RecordingActuator<'a> {
    clock: &'a TickClock,
    /// `(tick, Some(tone))` for activate, `(tick, None)` for deactivate.
    pub calls: Vec<(u16, Option<u16>)>,
}

impl<'a> RecordingActuator<'a> {
    pub fn new(clock: &'a TickClock) -> Self {
        Self {
            clock,
            calls: Vec::new(),
        }
    }

    /// Key-state changes as `(tick, keyed)`, with repeated calls collapsed.
    pub fn transitions(&self) -> Vec<(u16, bool)> {
        let mut out: Vec<(u16, bool)> = Vec::new();
        let mut keyed = false;
        for &(tick, tone) in &self.calls {
            let now_keyed = tone.is_some();
            if now_keyed != keyed {
                out.push((tick, now_keyed));
                keyed = now_keyed;
            }
        }
        out
    }

    /// Lengths of the keyed periods, in ticks.
    pub fn marks(&self) -> Vec<u16> {
        self.transitions()
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| pair[1].0 - pair[0].0)
            .collect()
    }
}

impl Actuator for RecordingActuator<'_> {
    fn activate(&mut self, tone_hz: u16) {
        self.calls.push((self.clock.now(), Some(tone_hz)));
    }

    fn deactivate(&mut self) {
        self.calls.push((self.clock.now(), None));
    }
}

/// Scripted host.
#[derive(Debug)]
pub struct SimLink<'a> {
    clock: &'a TickClock,
    script: VecDeque<(u16, LinkEvent)>,
    next_token: u8,
    pub ready: bool,
    pub replies: Vec<(u16, Reply)>,
    pub statuses: Vec<ChunkStatus>,
    pub notifications: Vec<Vec<u8>>,
}

impl<'a> SimLink<'a> {
    pub fn new(clock: &'a TickClock) -> Self {
        Self {
            clock,
            script: VecDeque::new(),
            next_token: 0x4b,
            ready: true,
            replies: Vec::new(),
            statuses: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Delivers `event` once the clock reaches `at`.
    pub fn at(&mut self, at: u16, event: LinkEvent) {
        self.script.push_back((at, event));
    }

    /// Scripts a host-to-device `SEND` of `data` at tick `at`, chunked like the host does.
    pub fn send(&mut self, at: u16, data: &[u8]) {
        let length = u16::try_from(data.len()).unwrap();
        self.at(at, LinkEvent::Setup(Request::set(RequestCode::Send, 0, length)));
        for part in data.chunks(crate::consts::CHUNK_LEN) {
            let token = self.next_token;
            self.next_token = if token == 0x4b { 0xc3 } else { 0x4b };
            self.at(at, LinkEvent::Chunk(Chunk::new(token, part)));
        }
    }

    /// Every outbound byte delivered through notifications, in order.
    pub fn outbound(&self) -> Vec<u8> {
        self.notifications
            .iter()
            .flat_map(|n| n[1..].iter().copied())
            .collect()
    }
}

impl Link for SimLink<'_> {
    fn poll(&mut self) -> Option<LinkEvent> {
        match self.script.front() {
            Some(&(at, _)) if at <= self.clock.now() => self.script.pop_front().map(|(_, e)| e),
            _ => None,
        }
    }

    fn reply(&mut self, reply: &Reply) {
        self.replies.push((self.clock.now(), reply.clone()));
    }

    fn chunk_status(&mut self, status: ChunkStatus) {
        self.statuses.push(status);
    }

    fn notification_ready(&self) -> bool {
        self.ready
    }

    fn notify(&mut self, data: &[u8]) {
        self.notifications.push(data.to_vec());
    }
}
