//! Recovery of frame boundaries from an unstructured byte stream.
//!
//! Frames carry no length field, so a frame is simply the [`FRAME_LEN`] bytes
//! starting at a sync marker. The synchronizer only bounds candidate frames;
//! validating them is left to [`crate::sans::frame::decode`]. A candidate that
//! later fails its checksum is still consumed whole, never re-scanned at a
//! shifted offset.

use alloc::vec::Vec;

use super::frame::{FRAME_LEN, SYNC};

/// Default bound on buffered bytes.
pub const DEFAULT_CAPACITY: usize = 256;

/// A result of advancing the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A candidate frame, removed from the buffer.
    FrameExtracted([u8; FRAME_LEN]),
    /// Not enough bytes are buffered to continue.
    NeedMoreData,
    /// Bytes were discarded to regain alignment.
    DesyncSkip(usize),
    /// Unaligned bytes filled the buffer and were discarded.
    Overflow(usize),
}

/// Condition of the accumulation buffer between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Empty,
    /// Aligned on a sync marker (or too short to judge), awaiting bytes.
    Accumulating,
    /// A complete candidate frame is buffered.
    FrameReady,
    /// Buffered bytes do not open with a sync marker.
    ResyncNeeded,
}

/// Accumulates bytes and extracts candidate frames.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    buffer: Vec<u8>,
    capacity: usize,
    overflows: usize,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Synchronizer {
    /// Create a synchronizer buffering at most `capacity` bytes.
    ///
    /// Capacities shorter than a frame are raised to [`FRAME_LEN`].
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(FRAME_LEN);

        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            overflows: 0,
        }
    }

    /// Append bytes and extract every candidate frame they complete.
    ///
    /// Bytes are appended as room allows, extracting frames in between, so a
    /// stream that stays aligned never overflows however it is chunked. If
    /// unaligned bytes fill the buffer so that not even a frame fits, and the
    /// remaining input does not fit either, alignment has been lost for longer
    /// than the buffer window: the buffered bytes are dropped and reported as
    /// an overflow.
    pub fn ingest(&mut self, r: &[u8]) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        let mut rest = r;

        if rest.is_empty() {
            self.advance(&mut outcomes);
        }

        while !rest.is_empty() {
            let room = self.capacity - self.buffer.len();

            if rest.len() > room && room < FRAME_LEN && self.state() == State::ResyncNeeded {
                // A trailing first marker byte may still open a frame.
                let keep = usize::from(self.buffer.last() == Some(&SYNC[0]));
                let discarded = self.buffer.len() - keep;
                self.buffer.drain(..discarded);
                self.overflows += 1;

                tracing::warn!(discarded, "Synchronizer buffer overflow, discarding buffered bytes");
                outcomes.push(Outcome::Overflow(discarded));
                continue;
            }

            let (piece, tail) = rest.split_at(room.min(rest.len()));
            rest = tail;

            self.buffer.extend_from_slice(piece);
            self.advance(&mut outcomes);
        }

        outcomes
    }

    fn advance(&mut self, outcomes: &mut Vec<Outcome>) {
        loop {
            let found = self.buffer.windows(SYNC.len()).position(|w| w == SYNC);

            let outcome = match found {
                None if self.buffer.len() < SYNC.len() => Outcome::NeedMoreData,
                None => {
                    // Keep the tail, which may open a marker split across reads.
                    self.buffer.drain(..1);
                    tracing::debug!("No sync marker in {} buffered bytes", self.buffer.len() + 1);
                    Outcome::DesyncSkip(1)
                }
                Some(k) if k > 0 => {
                    self.buffer.drain(..k);
                    tracing::debug!("Skipped {k} bytes before sync marker");
                    outcomes.push(Outcome::DesyncSkip(k));
                    continue;
                }
                Some(_) if self.buffer.len() < FRAME_LEN => Outcome::NeedMoreData,
                Some(_) => {
                    let mut frame = [0; FRAME_LEN];
                    frame.copy_from_slice(&self.buffer[..FRAME_LEN]);
                    self.buffer.drain(..FRAME_LEN);

                    tracing::trace!(id = frame[2], "Extracted candidate frame");
                    outcomes.push(Outcome::FrameExtracted(frame));
                    continue;
                }
            };

            outcomes.push(outcome);
            break;
        }
    }

    /// The condition of the buffer.
    pub fn state(&self) -> State {
        match self.buffer.len() {
            0 => State::Empty,
            1 => State::Accumulating,
            _ if !self.buffer.starts_with(&SYNC) => State::ResyncNeeded,
            n if n < FRAME_LEN => State::Accumulating,
            _ => State::FrameReady,
        }
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bound on buffered bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of overflows since creation.
    pub fn overflows(&self) -> usize {
        self.overflows
    }

    /// Discard all buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
