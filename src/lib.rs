#![no_std]

//! A streaming decoder for the serial output of mainstream and sidestream
//! anesthetic gas analyzers.
//!
//! Sensors emit a continuous stream of fixed-length frames. Each frame carries
//! five fast waveform samples and one rotating slice of slow data, so a full
//! picture of the slow values builds up over a ten-frame cycle.
//!
//! Most users should begin with [`avec::Session`], which finds frames in
//! arbitrarily chunked input, validates them, and keeps the slow data current.
//! The pieces it is built from live in the [`sans`] module for applications
//! that manage their own buffering (such as those running on embedded
//! systems).
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader-based decoding (default).
//! - `serde`: derive `Serialize` and `Deserialize` for decoded values.

extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod avec;
pub mod sans;
