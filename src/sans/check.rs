//! Helpers for computing and verifying frame checksums.

use super::frame::FRAME_LEN;

/// Compute the checksum of a frame.
///
/// The checksum is the two's complement of the sum of bytes `2..20` (the
/// frame identifier through the last slow data byte), truncated to 8 bits.
pub fn compute_checksum(r: &[u8; FRAME_LEN]) -> u8 {
    let sum = r[2..20]
        .iter()
        .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));

    (!sum).wrapping_add(1) as u8
}

/// Check the final byte of a frame against its computed checksum.
///
/// Sync markers are not inspected.
pub fn verify_checksum(r: &[u8; FRAME_LEN]) -> bool {
    compute_checksum(r) == r[FRAME_LEN - 1]
}
