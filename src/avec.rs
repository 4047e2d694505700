//! Convenience interfaces for decoding a live sensor stream.
//!
//! A [`Session`] owns the synchronizer and slow data aggregate for one sensor
//! and publishes every decoded frame to a [`Consumer`]. Bytes are supplied by
//! the caller, either directly through [`Session::feed`], all at once from a
//! captured log with [`decode_slice`], or, with the `std` feature, pulled from
//! a reader by the functions in [`reader`].

use thiserror::Error;

use crate::sans::{
    aggregate::SlowDataAggregate,
    field::Revision,
    frame::{DecodedFrame, FrameError},
    sync::DEFAULT_CAPACITY,
};

#[cfg(feature = "std")]
pub mod reader;
pub mod session;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use session::{Session, Stats};
pub use slice::decode as decode_slice;

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Protocol revision spoken by the sensor.
    pub revision: Revision,
    /// Bound on bytes buffered while searching for frames.
    pub capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            revision: Revision::default(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Default configuration for a protocol revision.
    pub fn with_revision(revision: Revision) -> Self {
        Self {
            revision,
            ..Self::default()
        }
    }
}

/// Errors occurring while processing a stream.
///
/// None of these halt a session; later frames are still processed.
#[derive(Debug, PartialEq, Error)]
pub enum Error<E> {
    /// A candidate frame failed validation and was dropped.
    #[error("Rejected frame: {0}")]
    Frame(#[from] FrameError),
    /// Alignment was lost for longer than the buffer window.
    #[error("Synchronizer buffer overflowed; {discarded} buffered bytes were discarded.")]
    BufferOverflow { discarded: usize },
    /// The consumer reported a failure.
    #[error("Consumer failed: {0}")]
    Consumer(E),
}

/// Receive decoded frames.
///
/// Called once for each valid frame, after its slow data has been merged into
/// the aggregate. A failure is reported by the session but does not stop it.
///
/// Implemented for closures of matching signature. Their argument types must
/// be annotated.
///
/// ```
/// let mut consumer = |frame: &DecodedFrame, slow: &SlowDataAggregate| {
///     if frame.status.apnea {
///         return Err("apnea");
///     }
///     Ok(())
/// };
/// ```
pub trait Consumer {
    /// Failure reported by the consumer.
    type Error;

    /// Receive a decoded frame along with the current slow data.
    fn on_frame(
        &mut self,
        frame: &DecodedFrame,
        slow_data: &SlowDataAggregate,
    ) -> Result<(), Self::Error>;
}

impl<F, E> Consumer for F
where
    F: FnMut(&DecodedFrame, &SlowDataAggregate) -> Result<(), E>,
{
    type Error = E;

    fn on_frame(
        &mut self,
        frame: &DecodedFrame,
        slow_data: &SlowDataAggregate,
    ) -> Result<(), Self::Error> {
        self(frame, slow_data)
    }
}
