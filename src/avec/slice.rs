//! Slice-based decoder for captured streams.

use thiserror::Error;

use super::{Config, Consumer, Session};

/// Errors occurring while decoding from a slice.
#[derive(Debug, PartialEq, Error)]
pub enum Error<E> {
    /// A frame was rejected, or the consumer failed.
    #[error(transparent)]
    Stream(#[from] super::Error<E>),
    /// The slice ended partway through a frame.
    #[error("Slice ended with {0} bytes of an incomplete frame.")]
    Truncated(usize),
}

/// Decode every frame in a captured stream, publishing to a consumer.
///
/// Unlike a live [`Session`], any rejected frame, consumer failure, or
/// overflow fails the whole decode. The slice is still processed to its end,
/// so the consumer sees every valid frame, and the first error is returned
/// afterwards. Bytes before the first sync marker are skipped. On success,
/// returns the finished session, holding the final slow data and counters.
///
/// This method is also re-exported as `gaslink::avec::decode_slice`.
pub fn decode<C: Consumer>(
    r: &[u8],
    config: Config,
    o: &mut C,
) -> Result<Session, Error<C::Error>> {
    let mut session = Session::new(config);

    for result in session.feed(r, o) {
        result?;
    }

    match session.buffered() {
        0 => Ok(session),
        n => Err(Error::Truncated(n)),
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;
    use crate::sans::{
        aggregate::SlowDataAggregate,
        field::Revision,
        frame::{DecodedFrame, FrameError, FrameId, PAYLOAD_LEN, encode},
    };

    fn ignore(_: &DecodedFrame, _: &SlowDataAggregate) -> Result<(), Infallible> {
        Ok(())
    }

    fn capture() -> alloc::vec::Vec<u8> {
        (0..10)
            .flat_map(|id| encode(id, 0, [0; 5], [id; PAYLOAD_LEN], Revision::Current))
            .collect()
    }

    #[test]
    fn whole_capture() {
        let session = decode(&capture(), Config::default(), &mut ignore).unwrap();

        assert_eq!(session.stats().frames, 10);
        assert_eq!(session.aggregate().last_frame_id, Some(FrameId::Service));
    }

    #[test]
    fn truncated() {
        let data = capture();
        let err = decode(&data[..data.len() - 5], Config::default(), &mut ignore).unwrap_err();

        assert_eq!(err, Error::Truncated(16));
    }

    #[test]
    fn stops_at_bad_frame() {
        let mut data = capture();
        data[21 + 20] ^= 0xFF;

        let mut seen = 0;
        let err = decode(&data, Config::default(), &mut |_: &DecodedFrame,
                                                         _: &SlowDataAggregate| {
            seen += 1;
            Ok::<_, Infallible>(())
        })
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Stream(crate::avec::Error::Frame(
                FrameError::ChecksumMismatch { .. }
            ))
        ));
        // Frames after the rejected one still reach the consumer.
        assert_eq!(seen, 9);
    }
}
