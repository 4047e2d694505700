//! Frame-level machinery without any I/O.
//!
//! Everything here works on byte slices supplied by the caller and allocates
//! only inside the [`sync`] buffer. See [`crate::avec`] for a driver tying the
//! pieces together.
//!
//! # Architecture
//!
//! Decoding a stream takes four steps:
//!
//! 1. A [`sync::Synchronizer`] accumulates bytes and cuts them into candidate
//! frames at each sync marker.
//!
//! 2. [`frame::decode`] validates a candidate (sync, then checksum, then
//! identifier) and splits it into fast waveform data and a slow data record.
//!
//! 3. [`slow::SlowData::decode`] interprets the record according to the frame
//! identifier and protocol revision.
//!
//! 4. A [`aggregate::SlowDataAggregate`] keeps the latest record of each kind.
//!
//! Frames that fail validation should be dropped whole. Fast data from a frame
//! with an unknown identifier can still be salvaged with [`frame::decode_fast`].

pub mod aggregate;
pub mod check;
pub mod field;
pub mod frame;
pub mod slow;
pub mod sync;
