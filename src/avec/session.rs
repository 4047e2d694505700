//! Stateful decoding of one sensor's byte stream.

use alloc::vec::Vec;

use crate::sans::{
    aggregate::SlowDataAggregate,
    frame::{self, DecodedFrame},
    sync::{Outcome, Synchronizer},
};

use super::{Config, Consumer, Error};

/// Running counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// Frames that passed validation.
    pub frames: usize,
    /// Candidate frames that failed validation.
    pub rejected: usize,
    /// Bytes discarded while searching for sync markers, including overflows.
    pub skipped: usize,
    /// Times the synchronizer buffer overflowed.
    pub overflows: usize,
}

/// Decoding state for one sensor.
///
/// Access must be serialized by the caller if a session is shared between
/// threads.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    sync: Synchronizer,
    aggregate: SlowDataAggregate,
    stats: Stats,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Session {
    /// Start a session with empty buffers and invalid slow data.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sync: Synchronizer::new(config.capacity),
            aggregate: SlowDataAggregate::new(),
            stats: Stats::default(),
        }
    }

    /// Process a chunk of bytes, publishing every frame it completes.
    ///
    /// Returns one entry per candidate frame and per overflow, in stream
    /// order.
    pub fn feed<C: Consumer>(
        &mut self,
        r: &[u8],
        o: &mut C,
    ) -> Vec<Result<DecodedFrame, Error<C::Error>>> {
        let mut results = Vec::new();

        for outcome in self.sync.ingest(r) {
            match outcome {
                Outcome::FrameExtracted(bytes) => results.push(self.publish(&bytes, o)),
                Outcome::DesyncSkip(n) => self.stats.skipped += n,
                Outcome::Overflow(discarded) => {
                    self.stats.skipped += discarded;
                    self.stats.overflows += 1;
                    results.push(Err(Error::BufferOverflow { discarded }));
                }
                Outcome::NeedMoreData => {}
            }
        }

        results
    }

    fn publish<C: Consumer>(
        &mut self,
        bytes: &[u8; frame::FRAME_LEN],
        o: &mut C,
    ) -> Result<DecodedFrame, Error<C::Error>> {
        let decoded = match frame::decode(bytes, self.config.revision) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.stats.rejected += 1;
                tracing::debug!("Dropping frame: {err}");
                Err(err)?
            }
        };

        self.stats.frames += 1;

        if let Some(record) = decoded.slow_data.clone() {
            self.aggregate.merge(record);
        }

        if let Err(err) = o.on_frame(&decoded, &self.aggregate) {
            tracing::warn!(id = decoded.frame_id.index(), "Consumer failed on frame");
            return Err(Error::Consumer(err));
        }

        Ok(decoded)
    }

    /// Slow data merged so far.
    pub fn aggregate(&self) -> &SlowDataAggregate {
        &self.aggregate
    }

    /// Counters accumulated since creation or the last reset.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// The configuration the session was started with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of bytes awaiting a complete frame.
    pub fn buffered(&self) -> usize {
        self.sync.len()
    }

    /// Discard buffered bytes, slow data, and counters.
    pub fn reset(&mut self) {
        self.sync.reset();
        self.aggregate.reset();
        self.stats = Stats::default();
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;
    use crate::sans::{
        field::Revision,
        frame::{FrameError, FrameId, PAYLOAD_LEN, encode},
    };

    #[derive(Default)]
    struct Recorder {
        ids: Vec<FrameId>,
        last: Option<SlowDataAggregate>,
    }

    impl Consumer for Recorder {
        type Error = Infallible;

        fn on_frame(
            &mut self,
            frame: &DecodedFrame,
            slow_data: &SlowDataAggregate,
        ) -> Result<(), Self::Error> {
            self.ids.push(frame.frame_id);
            self.last = Some(slow_data.clone());
            Ok(())
        }
    }

    fn cycle(revision: Revision) -> Vec<u8> {
        (0..10)
            .flat_map(|id| encode(id, 0x01, [400, 0, 0, 0, 2100], [id + 1; PAYLOAD_LEN], revision))
            .collect()
    }

    #[test]
    fn full_cycle() {
        let mut session = Session::default();
        let mut recorder = Recorder::default();

        let results = session.feed(&cycle(Revision::Current), &mut recorder);

        assert_eq!(results.len(), 10);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(recorder.ids.len(), 10);
        assert_eq!(recorder.ids[3], FrameId::General);

        let agg = session.aggregate();
        assert_eq!(agg.last_frame_id, Some(FrameId::Service));
        assert_eq!(agg.inspiration.co2.percent(), Some(1.0));
        assert_eq!(agg.general.respiration_rate, Some(4));
        assert_eq!(session.stats().frames, 10);
        assert_eq!(session.stats().skipped, 0);
        assert_eq!(session.buffered(), 0);
    }

    #[test]
    fn consumer_sees_merged_slow_data() {
        let mut session = Session::default();
        let mut recorder = Recorder::default();

        let f = encode(1, 0, [0; 5], [30; PAYLOAD_LEN], Revision::Current);
        session.feed(&f, &mut recorder);

        let seen = recorder.last.unwrap();
        assert_eq!(seen.last_frame_id, Some(FrameId::Expiration));
        assert_eq!(seen.expiration.co2.percent(), Some(30.0));
    }

    #[test]
    fn legacy_revision() {
        let mut session = Session::new(Config::with_revision(Revision::Legacy));
        let mut recorder = Recorder::default();

        session.feed(&cycle(Revision::Legacy), &mut recorder);

        assert_eq!(session.aggregate().inspiration.co2.percent(), Some(0.1));
        assert_eq!(session.stats().frames, 10);
    }

    #[test]
    fn rejected_frames_do_not_stop_processing() {
        let mut session = Session::default();
        let mut recorder = Recorder::default();

        let mut bad = encode(0, 0, [0; 5], [7; PAYLOAD_LEN], Revision::Current);
        bad[20] ^= 0x01;
        let bad_id = encode(12, 0, [0; 5], [0; PAYLOAD_LEN], Revision::Current);
        let good = encode(2, 0, [0; 5], [9; PAYLOAD_LEN], Revision::Current);

        let input: Vec<u8> = [bad, bad_id, good].concat();
        let results = session.feed(&input, &mut recorder);

        assert!(matches!(
            results[0],
            Err(Error::Frame(FrameError::ChecksumMismatch { .. }))
        ));
        assert_eq!(results[1], Err(Error::Frame(FrameError::InvalidFrameId(12))));
        assert!(results[2].is_ok());

        assert_eq!(recorder.ids, [FrameId::Momentary]);
        assert_eq!(session.stats().rejected, 2);
        assert_eq!(session.stats().frames, 1);
        // The corrupt inspiration frame never reached the aggregate.
        assert_eq!(
            session.aggregate().get(FrameId::Inspiration),
            SlowDataAggregate::new().get(FrameId::Inspiration)
        );
    }

    #[test]
    fn reserved_frame_leaves_aggregate() {
        let mut session = Session::default();
        let mut recorder = Recorder::default();

        session.feed(
            &encode(4, 0, [0; 5], [2, 0, 0, 0, 0, 0], Revision::Current),
            &mut recorder,
        );
        let before = session.aggregate().clone();

        let results = session.feed(
            &encode(8, 0, [0; 5], [0xEE; PAYLOAD_LEN], Revision::Current),
            &mut recorder,
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().slow_data, None);
        assert_eq!(session.aggregate(), &before);
        assert_eq!(recorder.ids, [FrameId::SensorRegisters, FrameId::Reserved8]);
    }

    #[test]
    fn consumer_failure_is_reported() {
        let mut session = Session::default();
        let mut calls = 0;
        let mut consumer = |frame: &DecodedFrame, _: &SlowDataAggregate| {
            calls += 1;
            if frame.status.breath_detected {
                Err("breath")
            } else {
                Ok(())
            }
        };

        let input: Vec<u8> = [
            encode(0, 0x01, [0; 5], [0; PAYLOAD_LEN], Revision::Current),
            encode(1, 0x00, [0; 5], [0; PAYLOAD_LEN], Revision::Current),
        ]
        .concat();

        let results = session.feed(&input, &mut consumer);

        assert_eq!(results[0], Err(Error::Consumer("breath")));
        assert!(results[1].is_ok());
        assert_eq!(calls, 2);
        // The failing frame was still merged.
        let agg = session.aggregate();
        assert_eq!(agg.last_frame_id, Some(FrameId::Expiration));
        assert_eq!(agg.inspiration.co2.percent(), Some(0.0));
    }

    #[test]
    fn overflow_is_reported() {
        let mut session = Session::default();
        let mut recorder = Recorder::default();

        let results = session.feed(&[0x00; 600], &mut recorder);

        assert_eq!(
            results,
            [
                Err(Error::BufferOverflow { discarded: 255 }),
                Err(Error::BufferOverflow { discarded: 255 }),
            ]
        );
        assert_eq!(session.stats().overflows, 2);
        assert_eq!(session.stats().skipped + session.buffered(), 600);
        assert!(session.buffered() <= session.config().capacity);

        // Frames after the loss are reported after it.
        let mut input = [0x00; 40].to_vec();
        input.extend_from_slice(&encode(2, 0, [0; 5], [3; PAYLOAD_LEN], Revision::Current));
        input.extend_from_slice(&[0x00; 300]);
        input.extend_from_slice(&encode(1, 0, [0; 5], [4; PAYLOAD_LEN], Revision::Current));

        let results = session.feed(&input, &mut recorder);
        let kinds: Vec<_> = results
            .iter()
            .map(|r| match r {
                Ok(frame) => Some(frame.frame_id),
                Err(Error::BufferOverflow { .. }) => None,
                Err(err) => panic!("unexpected error {err:?}"),
            })
            .collect();

        assert_eq!(
            kinds,
            [Some(FrameId::Momentary), None, Some(FrameId::Expiration)]
        );
        assert_eq!(results[1], Err(Error::BufferOverflow { discarded: 255 }));
        assert_eq!(recorder.ids, [FrameId::Momentary, FrameId::Expiration]);
    }

    #[test]
    fn reset() {
        let mut session = Session::default();
        let mut recorder = Recorder::default();

        session.feed(&cycle(Revision::Current)[..30], &mut recorder);
        assert_ne!(session.buffered(), 0);

        session.reset();
        assert_eq!(session.buffered(), 0);
        assert_eq!(session.stats(), Stats::default());
        assert_eq!(session.aggregate(), &SlowDataAggregate::new());
    }
}
