//! Host request protocol.
//!
//! The underlying transport (enumeration, framing, endpoint handling) lives outside the
//! core and is reached through the [`Link`] trait. It hands the core three kinds of
//! delivery:
//!
//! - a [`Request`] (the setup stage of a control transfer),
//! - a [`Chunk`] of at most [`CHUNK_LEN`] bytes belonging to a host-to-device `SEND`,
//! - a free notification slot, reported by [`Link::notification_ready`].
//!
//! [`TransportAdapter`] answers them against the inbound queue, the outbound queue and
//! the [`ConfigStore`].
//!
//! ## Requests
//!
//! | Code    | Host → device                     | Device → host                 |
//! |---------|-----------------------------------|-------------------------------|
//! | `TEST`  | echo of value and index           | echo of value and index       |
//! | `SEND`  | queue bytes from the data stage   | peek inbound, padded to 8     |
//! | `SPEED` | value: wpm low, inhibit high      | `[speed, inhibit]`            |
//! | `STOP`  | clear inbound                     | no-op                         |
//! | `BACK`  | undo the newest inbound byte      | no-op                         |
//! | `TONE`  | `value = Hz`                      | tone, little-endian           |
//!
//! Unknown codes get an empty reply and change nothing.
//!
//! ## Duplicate chunks
//!
//! When a device acknowledgement is lost the host resends the same chunk with the same
//! data token. A chunk whose token equals the previous accepted chunk's is dropped, so
//! every chunk is queued at most once.

use crate::config::{ConfigStore, Storage};
use crate::consts::{CHUNK_LEN, MIN_READ_LEN, NOTIFY_LEN, REPLY_CAPACITY};
use crate::queue::RingQueue;
use heapless::Vec;

/// Which way the data stage of a request flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Direction {
    /// The host writes (configuration sets, `SEND` data).
    HostToDevice,
    /// The host reads.
    DeviceToHost,
}

/// Request codes understood by the keyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum RequestCode {
    /// Echo diagnostic.
    Test = 0x01,
    /// Queue or read back characters.
    Send = 0x02,
    /// Speed and inhibit time.
    Speed = 0x03,
    /// Abort: clear the inbound queue.
    Stop = 0x04,
    /// Backspace: undo the newest inbound byte.
    Back = 0x05,
    /// Sidetone frequency.
    Tone = 0x06,
}

impl TryFrom<u8> for RequestCode {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        Ok(match code {
            0x01 => RequestCode::Test,
            0x02 => RequestCode::Send,
            0x03 => RequestCode::Speed,
            0x04 => RequestCode::Stop,
            0x05 => RequestCode::Back,
            0x06 => RequestCode::Tone,
            other => return Err(other),
        })
    }
}

/// The setup stage of a host request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Request {
    /// Data stage direction
    pub direction: Direction,
    /// Raw request code, see [`RequestCode`]
    pub code: u8,
    /// Request value
    pub value: u16,
    /// Request index
    pub index: u16,
    /// Length of the data stage the host expects to send or receive
    pub length: u16,
}

impl Request {
    /// A host-to-device request.
    pub fn set(code: RequestCode, value: u16, length: u16) -> Self {
        Self {
            direction: Direction::HostToDevice,
            code: code as u8,
            value,
            index: 0,
            length,
        }
    }

    /// A device-to-host request reading up to `length` bytes.
    pub fn get(code: RequestCode, length: u16) -> Self {
        Self {
            direction: Direction::DeviceToHost,
            code: code as u8,
            value: 0,
            index: 0,
            length,
        }
    }
}

/// One data-stage chunk of a host-to-device `SEND`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Chunk {
    /// Data toggle token assigned by the transport
    pub token: u8,
    /// Payload
    pub data: Vec<u8, CHUNK_LEN>,
}

impl Chunk {
    /// Builds a chunk, keeping at most [`CHUNK_LEN`] bytes of `data`.
    pub fn new(token: u8, data: &[u8]) -> Self {
        let len = data.len().min(CHUNK_LEN);
        let mut payload = Vec::new();
        let _ = payload.extend_from_slice(&data[..len]);
        Self {
            token,
            data: payload,
        }
    }
}

/// A delivery from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LinkEvent {
    /// A new request.
    Setup(Request),
    /// Data for the `SEND` in progress.
    Chunk(Chunk),
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Reply {
    /// Bytes for the host; possibly empty.
    Data(Vec<u8, REPLY_CAPACITY>),
    /// The device accepts a host-to-device data stage delivered as [`Chunk`]s.
    ExpectData,
}

impl Reply {
    /// The empty reply.
    pub fn empty() -> Self {
        Reply::Data(Vec::new())
    }

    fn from_slice(bytes: &[u8]) -> Self {
        let mut data = Vec::new();
        let _ = data.extend_from_slice(bytes);
        Reply::Data(data)
    }

    /// The reply payload, empty for [`Reply::ExpectData`].
    pub fn data(&self) -> &[u8] {
        match self {
            Reply::Data(data) => data.as_slice(),
            Reply::ExpectData => &[],
        }
    }
}

/// Outcome of a chunk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ChunkStatus {
    /// More data is expected.
    Pending,
    /// The data stage is complete.
    Complete,
}

/// The transport below the request level.
pub trait Link {
    /// Returns the next pending delivery, if any.
    fn poll(&mut self) -> Option<LinkEvent>;
    /// Completes the setup stage of the last [`LinkEvent::Setup`].
    fn reply(&mut self, reply: &Reply);
    /// Acknowledges the last [`LinkEvent::Chunk`].
    fn chunk_status(&mut self, status: ChunkStatus);
    /// Whether the previous notification has been collected by the host.
    fn notification_ready(&self) -> bool;
    /// Queues a notification of at most [`NOTIFY_LEN`] bytes.
    fn notify(&mut self, data: &[u8]);
}

/// State of the request protocol.
#[derive(Debug, Default)]
pub struct TransportAdapter {
    bytes_remaining: u16,
    receiving: bool,
    last_token: Option<u8>,
    duplicates: u16,
}

impl TransportAdapter {
    /// Creates an adapter with no transfer in progress.
    pub const fn new() -> Self {
        Self {
            bytes_remaining: 0,
            receiving: false,
            last_token: None,
            duplicates: 0,
        }
    }

    /// Bytes still expected by the `SEND` in progress.
    pub fn bytes_remaining(&self) -> u16 {
        self.bytes_remaining
    }

    /// Whether a host-to-device `SEND` is in progress.
    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    /// Number of retransmitted chunks dropped so far.
    pub fn duplicates(&self) -> u16 {
        self.duplicates
    }

    /// Handles the setup stage of `request`.
    pub fn setup<S: Storage>(
        &mut self,
        request: &Request,
        inbound: &mut RingQueue,
        settings: &mut ConfigStore<S>,
    ) -> Reply {
        let Ok(code) = RequestCode::try_from(request.code) else {
            debug!("ignoring unknown request {}", request.code);
            return Reply::empty();
        };
        let writing = request.direction == Direction::HostToDevice;
        let [value_lo, value_hi] = request.value.to_le_bytes();
        match code {
            RequestCode::Test => {
                let [index_lo, index_hi] = request.index.to_le_bytes();
                let echo = [value_lo, value_hi, index_lo, index_hi];
                let len = usize::from(request.length).min(echo.len());
                Reply::from_slice(&echo[..len])
            }
            RequestCode::Send if writing => {
                let free = u16::try_from(inbound.free()).unwrap_or(u16::MAX);
                self.bytes_remaining = request.length.min(free);
                self.receiving = self.bytes_remaining > 0;
                self.last_token = None;
                trace!(
                    "send of {} bytes, accepting {}",
                    request.length,
                    self.bytes_remaining
                );
                Reply::ExpectData
            }
            RequestCode::Send => {
                let len = usize::from(request.length).min(inbound.len());
                let mut data: Vec<u8, REPLY_CAPACITY> = Vec::new();
                for i in 0..len {
                    if let Ok(byte) = inbound.get_nth(i) {
                        let _ = data.push(byte);
                    }
                }
                while data.len() < MIN_READ_LEN {
                    let _ = data.push(0);
                }
                Reply::Data(data)
            }
            RequestCode::Speed if writing => {
                let _ = settings.set_speed(value_lo, value_hi);
                Reply::empty()
            }
            RequestCode::Speed => {
                let config = settings.config();
                Reply::from_slice(&[config.speed(), config.inhibit_time()])
            }
            RequestCode::Stop if writing => {
                debug!("stop: dropping {} inbound bytes", inbound.len());
                inbound.clear();
                Reply::empty()
            }
            RequestCode::Back if writing => {
                let _ = inbound.pop();
                Reply::empty()
            }
            RequestCode::Stop | RequestCode::Back => Reply::empty(),
            RequestCode::Tone if writing => {
                settings.set_tone(request.value);
                Reply::empty()
            }
            RequestCode::Tone => Reply::from_slice(&settings.config().tone().to_le_bytes()),
        }
    }

    /// Handles one data-stage chunk of a host-to-device `SEND`.
    pub fn write(&mut self, chunk: &Chunk, inbound: &mut RingQueue) -> ChunkStatus {
        if !self.receiving {
            warn!("chunk with token {} outside of a send", chunk.token);
            return ChunkStatus::Complete;
        }
        if self.last_token == Some(chunk.token) {
            self.duplicates = self.duplicates.saturating_add(1);
            debug!("dropping retransmitted chunk, token {}", chunk.token);
            return self.status();
        }
        self.last_token = Some(chunk.token);

        for &byte in chunk.data.iter() {
            if inbound.put(byte).is_err() {
                warn!("inbound queue full, dropped {:#x}", byte);
            }
        }
        let len = u16::try_from(chunk.data.len()).unwrap_or(u16::MAX);
        self.bytes_remaining = self.bytes_remaining.saturating_sub(len);

        let status = self.status();
        if status == ChunkStatus::Complete {
            self.receiving = false;
            self.last_token = None;
        }
        status
    }

    fn status(&self) -> ChunkStatus {
        if self.bytes_remaining == 0 {
            ChunkStatus::Complete
        } else {
            ChunkStatus::Pending
        }
    }

    /// Builds the next autonomous notification.
    ///
    /// Byte 0 is the inbound queue size; up to seven outbound bytes follow, drained in
    /// FIFO order.
    pub fn notification(
        &mut self,
        inbound: &RingQueue,
        outbound: &mut RingQueue,
    ) -> Vec<u8, NOTIFY_LEN> {
        let mut data = Vec::new();
        let _ = data.push(u8::try_from(inbound.len()).unwrap_or(u8::MAX));
        while !data.is_full() {
            match outbound.get() {
                Ok(byte) => {
                    let _ = data.push(byte);
                }
                Err(_) => break,
            }
        }
        data
    }
}
