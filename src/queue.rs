//! Fixed-capacity byte queue used for both directions of the host link.
//!
//! [`RingQueue`] wraps a `heapless::Deque` of [`QUEUE_CAPACITY`] bytes. Besides FIFO
//! `put`/`get` it supports peeking by offset (device-to-host `SEND` reads) and undoing the
//! most recent `put` (host `BACK` requests).
//!
//! What happens when a full queue is written is chosen per queue through
//! [`OverflowPolicy`]. Either way the event is counted and exposed via
//! [`RingQueue::overflows`].

use crate::consts::QUEUE_CAPACITY;
use heapless::Deque;
use thiserror::Error;

/// Failures reported by [`RingQueue`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum QueueError {
    /// `get` on an empty queue.
    #[error("queue is empty")]
    Empty,
    /// `get_nth` past the last queued byte.
    #[error("index {index} out of range for queue of {len} bytes")]
    OutOfRange {
        /// Requested offset from the front.
        index: usize,
        /// Number of queued bytes at the time of the call.
        len: usize,
    },
    /// `put` on a full queue with [`OverflowPolicy::RejectNew`].
    #[error("queue is full")]
    Full,
}

/// Behavior of [`RingQueue::put`] when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum OverflowPolicy {
    /// Drop the oldest byte to make room. Used for telemetry-like outbound data.
    OverwriteOldest,
    /// Keep the queue untouched and report [`QueueError::Full`].
    RejectNew,
}

/// A 128-byte FIFO with indexed peek and undo.
#[derive(Debug)]
pub struct RingQueue {
    buf: Deque<u8, QUEUE_CAPACITY>,
    policy: OverflowPolicy,
    overflows: u16,
}

impl RingQueue {
    /// Creates an empty queue with the given overflow policy.
    pub const fn new(policy: OverflowPolicy) -> Self {
        Self {
            buf: Deque::new(),
            policy,
            overflows: 0,
        }
    }

    /// Appends `byte` at the back.
    ///
    /// On a full queue the configured [`OverflowPolicy`] applies and the overflow
    /// counter is incremented.
    pub fn put(&mut self, byte: u8) -> Result<(), QueueError> {
        if self.buf.is_full() {
            self.overflows = self.overflows.saturating_add(1);
            match self.policy {
                OverflowPolicy::RejectNew => return Err(QueueError::Full),
                OverflowPolicy::OverwriteOldest => {
                    let _ = self.buf.pop_front();
                }
            }
        }
        self.buf.push_back(byte).map_err(|_| QueueError::Full)
    }

    /// Removes and returns the oldest byte.
    pub fn get(&mut self) -> Result<u8, QueueError> {
        self.buf.pop_front().ok_or(QueueError::Empty)
    }

    /// Returns the byte `index` positions behind the front without removing it.
    pub fn get_nth(&self, index: usize) -> Result<u8, QueueError> {
        let (front, back) = self.buf.as_slices();
        let byte = if index < front.len() {
            front.get(index)
        } else {
            back.get(index - front.len())
        };
        byte.copied().ok_or(QueueError::OutOfRange {
            index,
            len: self.buf.len(),
        })
    }

    /// Removes the most recently queued byte, undoing the last [`put`](Self::put).
    pub fn pop(&mut self) -> Option<u8> {
        self.buf.pop_back()
    }

    /// Drops every queued byte.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Number of queued bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the queue holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    /// Remaining room in bytes.
    pub fn free(&self) -> usize {
        QUEUE_CAPACITY - self.buf.len()
    }

    /// Total capacity in bytes.
    pub const fn capacity(&self) -> usize {
        QUEUE_CAPACITY
    }

    /// How many `put`s found the queue full.
    pub fn overflows(&self) -> u16 {
        self.overflows
    }

    /// The policy this queue applies when full.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(policy: OverflowPolicy, count: usize) -> RingQueue {
        let mut q = RingQueue::new(policy);
        for i in 0..count {
            q.put(i as u8).unwrap();
        }
        q
    }

    #[test]
    fn test_fifo_order() {
        let mut q = filled(OverflowPolicy::RejectNew, 3);
        assert_eq!(q.len(), 3);
        assert_eq!(q.get(), Ok(0));
        assert_eq!(q.get(), Ok(1));
        assert_eq!(q.get(), Ok(2));
        assert_eq!(q.get(), Err(QueueError::Empty));
    }

    #[test]
    fn test_fifo_survives_wraparound() {
        let mut q = RingQueue::new(OverflowPolicy::RejectNew);
        let mut next_in: u32 = 0;
        let mut next_out: u32 = 0;
        // Keep ~100 bytes in flight so head and tail lap index 127 several times.
        for _ in 0..10 {
            while q.len() < 100 {
                q.put(next_in as u8).unwrap();
                next_in += 1;
            }
            while q.len() > 10 {
                assert_eq!(q.get(), Ok(next_out as u8));
                next_out += 1;
            }
        }
        assert!(next_in > 3 * QUEUE_CAPACITY as u32);
        for i in 0..q.len() {
            assert_eq!(q.get_nth(i), Ok((next_out + i as u32) as u8));
        }
    }

    #[test]
    fn test_get_nth_peeks_without_removing() {
        let q = filled(OverflowPolicy::RejectNew, 4);
        assert_eq!(q.get_nth(0), Ok(0));
        assert_eq!(q.get_nth(3), Ok(3));
        assert_eq!(q.get_nth(4), Err(QueueError::OutOfRange { index: 4, len: 4 }));
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn test_pop_undoes_last_put() {
        let mut q = filled(OverflowPolicy::RejectNew, 5);
        q.put(0xaa).unwrap();
        assert_eq!(q.pop(), Some(0xaa));
        assert_eq!(q.len(), 5);
        for i in 0..5 {
            assert_eq!(q.get_nth(i), Ok(i as u8));
        }
    }

    #[test]
    fn test_pop_on_empty_is_none() {
        let mut q = RingQueue::new(OverflowPolicy::RejectNew);
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_clear_resets() {
        let mut q = filled(OverflowPolicy::RejectNew, 7);
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.free(), QUEUE_CAPACITY);
        assert_eq!(q.get(), Err(QueueError::Empty));
    }

    #[test]
    fn test_reject_new_when_full() {
        let mut q = filled(OverflowPolicy::RejectNew, QUEUE_CAPACITY);
        assert_eq!(q.policy(), OverflowPolicy::RejectNew);
        assert_eq!(q.capacity(), QUEUE_CAPACITY);
        assert!(q.is_full());
        assert_eq!(q.put(0xee), Err(QueueError::Full));
        assert_eq!(q.overflows(), 1);
        assert_eq!(q.get_nth(QUEUE_CAPACITY - 1), Ok((QUEUE_CAPACITY - 1) as u8));
        assert_eq!(q.get(), Ok(0));
    }

    #[test]
    fn test_overwrite_oldest_when_full() {
        let mut q = filled(OverflowPolicy::OverwriteOldest, QUEUE_CAPACITY);
        assert_eq!(q.policy(), OverflowPolicy::OverwriteOldest);
        assert_eq!(q.put(0xee), Ok(()));
        assert_eq!(q.overflows(), 1);
        assert_eq!(q.len(), QUEUE_CAPACITY);
        assert_eq!(q.get(), Ok(1));
        assert_eq!(q.get_nth(QUEUE_CAPACITY - 2), Ok(0xee));
    }
}
