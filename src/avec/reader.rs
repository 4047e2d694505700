//! Reader-based stream driver.
//!
//! _Requires Cargo feature `std`._

use std::io::{self, Read};

use thiserror::Error;

use crate::sans::frame::{DecodedFrame, FRAME_LEN};

use super::{Consumer, Session, Stats};

extern crate std;

/// Errors occurring while reading frames from a byte source.
#[derive(Debug, Error)]
pub enum Error<E> {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error processing the stream.
    #[error(transparent)]
    Stream(#[from] super::Error<E>),
}

/// Read from a byte source until the next candidate frame is processed.
///
/// Blocks as long as the reader does. Returns the frame if it was valid and
/// accepted by the consumer. End of input is reported as
/// [`io::ErrorKind::UnexpectedEof`].
pub fn read_frame<C: Consumer>(
    r: &mut impl Read,
    session: &mut Session,
    o: &mut C,
) -> Result<DecodedFrame, Error<C::Error>> {
    let mut buf = [0; FRAME_LEN];

    loop {
        // Never read past the end of the next frame, so each read completes at
        // most one.
        let want = FRAME_LEN.saturating_sub(session.buffered()).max(1);

        let n = match r.read(&mut buf[..want]) {
            Ok(0) => Err(io::Error::from(io::ErrorKind::UnexpectedEof))?,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => Err(err)?,
        };

        if let Some(result) = session.feed(&buf[..n], o).into_iter().next() {
            return Ok(result?);
        }
    }
}

/// Process frames from a byte source until it is exhausted.
///
/// Invalid frames and consumer failures are skipped; only reader errors end
/// decoding early. Returns the session's counters.
pub fn decode<C: Consumer>(
    r: &mut impl Read,
    session: &mut Session,
    o: &mut C,
) -> Result<Stats, io::Error> {
    loop {
        match read_frame(r, session, o) {
            Ok(_) | Err(Error::Stream(_)) => {}
            Err(Error::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(Error::Io(err)) => return Err(err),
        }
    }

    Ok(session.stats())
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, io::Cursor, vec::Vec};

    use super::*;
    use crate::{
        avec::Config,
        sans::{
            aggregate::SlowDataAggregate,
            field::Revision,
            frame::{FrameError, FrameId, PAYLOAD_LEN, encode},
        },
    };

    fn ignore(_: &DecodedFrame, _: &SlowDataAggregate) -> Result<(), Infallible> {
        Ok(())
    }

    /// Yields at most `limit` bytes per read.
    struct Trickle<'a>(&'a [u8], usize);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.1).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn one_frame_per_call() {
        let mut input = vec![0x00, 0x13];
        for id in 0..3 {
            input.extend_from_slice(&encode(id, 0, [0; 5], [id; PAYLOAD_LEN], Revision::Current));
        }

        let mut r = Cursor::new(input);
        let mut session = Session::default();

        for id in 0..3u8 {
            let frame = read_frame(&mut r, &mut session, &mut ignore).unwrap();
            assert_eq!(frame.frame_id, FrameId::try_from(id).unwrap());
        }

        let err = read_frame(&mut r, &mut session, &mut ignore).unwrap_err();
        assert!(matches!(err, Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
        assert_eq!(session.stats().skipped, 2);
    }

    #[test]
    fn reports_rejected_frame() {
        let mut bad = encode(5, 0, [0; 5], [0; PAYLOAD_LEN], Revision::Current);
        bad[20] = bad[20].wrapping_add(1);

        let mut r = Cursor::new(bad);
        let mut session = Session::default();

        let err = read_frame(&mut r, &mut session, &mut ignore).unwrap_err();
        assert!(matches!(
            err,
            Error::Stream(crate::avec::Error::Frame(
                FrameError::ChecksumMismatch { .. }
            ))
        ));
    }

    #[test]
    fn short_reads() {
        let input: Vec<u8> = (0..10)
            .flat_map(|id| encode(id, 0, [0; 5], [id; PAYLOAD_LEN], Revision::Legacy))
            .collect();

        for limit in [1, 2, 7, 21, 64] {
            let mut r = Trickle(&input, limit);
            let mut session = Session::new(Config::with_revision(Revision::Legacy));
            let mut ids = Vec::new();

            let stats = decode(&mut r, &mut session, &mut |f: &DecodedFrame,
                                                           _: &SlowDataAggregate| {
                ids.push(f.frame_id);
                Ok::<_, Infallible>(())
            })
            .unwrap();

            assert_eq!(stats.frames, 10, "limit {limit}");
            assert_eq!(ids.len(), 10);
            assert_eq!(session.aggregate().last_frame_id, Some(FrameId::Service));
        }
    }

    #[test]
    fn decode_skips_bad_frames() {
        let mut input = encode(0, 0, [0; 5], [1; PAYLOAD_LEN], Revision::Current).to_vec();
        input[7] ^= 0x10;
        input.extend_from_slice(&[0xDE, 0xAD]);
        input.extend_from_slice(&encode(3, 0, [0; 5], [1; PAYLOAD_LEN], Revision::Current));

        let mut session = Session::default();
        let stats = decode(&mut Cursor::new(input), &mut session, &mut ignore).unwrap();

        assert_eq!(stats.frames, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(session.aggregate().general.respiration_rate, Some(1));
    }

    #[test]
    fn reader_error() {
        struct Broken;

        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("unplugged"))
            }
        }

        let mut session = Session::default();
        let err = decode(&mut Broken, &mut session, &mut ignore).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
