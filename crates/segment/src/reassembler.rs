//! Reconstruction of whole trace payloads from segment runs.

use tracing::{error, warn};

/// One chunk of a block's trace payload as delivered on the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// The block number the run belongs to (the message key).
    pub key: u64,
    /// The producer that emitted the run.
    pub producer_id: String,
    /// Total segments in the run, from the `totalSegments` header.
    pub total_segments: u64,
    /// This segment's position, from the `segmentIdx` header.
    pub segment_idx: u64,
    /// The chunk bytes.
    pub value: Vec<u8>,
    /// Partition the message arrived on.
    pub partition: i32,
    /// Offset of the message within its partition.
    pub offset: i64,
}

/// A fully reassembled trace payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracePayload {
    /// The block number of the run.
    pub block_number: u64,
    /// The concatenated segment bytes.
    pub data: Vec<u8>,
    /// Partition of the run's last constituent message.
    pub partition: i32,
    /// Offset of the run's last constituent message; the job publishes it
    /// so an outer driver can resume.
    pub offset: i64,
}

/// Buffers partial segment runs and emits completed payloads.
///
/// Runs are keyed by (producer id, block number). Segments must arrive in
/// strict `segment_idx` order within a run: a gap is logged and the partial
/// run retained so late data can fill it; a duplicate is dropped. Completed
/// runs are emitted FIFO over run start order, so a complete run behind an
/// incomplete one waits.
///
/// The buffer is unbounded here; the trace-group driver bounds it by
/// rejecting runs whose key falls outside its block range.
#[derive(Debug, Default)]
pub struct Reassembler {
    runs: Vec<Vec<Segment>>,
}

impl Reassembler {
    /// Creates an empty reassembler.
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Number of in-flight partial runs.
    pub fn in_flight(&self) -> usize {
        self.runs.len()
    }

    /// Inserts one segment and drains every run that became emittable.
    pub fn insert(&mut self, segment: Segment) -> Vec<TracePayload> {
        self.buffer(segment);
        self.drain_complete()
    }

    fn buffer(&mut self, segment: Segment) {
        for run in &mut self.runs {
            let first = match run.first() {
                Some(first) => first,
                None => continue,
            };
            if first.key != segment.key || first.producer_id != segment.producer_id {
                continue;
            }

            let buffered = run.len() as u64;
            if segment.segment_idx > buffered {
                // a hole in the run; keep the partial so late data can fill it
                error!(
                    target: "segment",
                    key = segment.key,
                    producer_id = %segment.producer_id,
                    buffered,
                    segment_idx = segment.segment_idx,
                    "missing segment detected, retaining partial run"
                );
                return;
            }
            if segment.segment_idx < buffered {
                warn!(
                    target: "segment",
                    key = segment.key,
                    producer_id = %segment.producer_id,
                    segment_idx = segment.segment_idx,
                    "duplicate segment dropped"
                );
                return;
            }
            run.push(segment);
            return;
        }

        if segment.segment_idx == 0 {
            self.runs.push(vec![segment]);
        } else {
            warn!(
                target: "segment",
                key = segment.key,
                producer_id = %segment.producer_id,
                segment_idx = segment.segment_idx,
                "segment for an unknown run dropped, probably handled already"
            );
        }
    }

    fn drain_complete(&mut self) -> Vec<TracePayload> {
        let mut complete = Vec::new();
        while let Some(front) = self.runs.first() {
            let total = front.first().map(|first| first.total_segments).unwrap_or_default();
            if front.len() as u64 != total {
                break;
            }
            let run = self.runs.remove(0);
            let last = run.last().expect("complete run is non-empty");
            let (partition, offset) = (last.partition, last.offset);
            let block_number = run[0].key;
            let mut data = Vec::with_capacity(run.iter().map(|segment| segment.value.len()).sum());
            for segment in run {
                data.extend_from_slice(&segment.value);
            }
            complete.push(TracePayload { block_number, data, partition, offset });
        }
        complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn segment(key: u64, producer: &str, total: u64, idx: u64, value: &[u8]) -> Segment {
        Segment {
            key,
            producer_id: producer.to_string(),
            total_segments: total,
            segment_idx: idx,
            value: value.to_vec(),
            partition: 0,
            offset: (key * 100 + idx) as i64,
        }
    }

    #[test]
    fn single_segment_run_completes_immediately() {
        let mut reassembler = Reassembler::new();
        let payloads = reassembler.insert(segment(7, "p0", 1, 0, b"whole"));
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].block_number, 7);
        assert_eq!(payloads[0].data, b"whole");
    }

    #[test]
    fn multi_segment_run_concatenates_in_order() {
        let mut reassembler = Reassembler::new();
        assert!(reassembler.insert(segment(7, "p0", 3, 0, b"aa")).is_empty());
        assert!(reassembler.insert(segment(7, "p0", 3, 1, b"bb")).is_empty());
        let payloads = reassembler.insert(segment(7, "p0", 3, 2, b"cc"));
        assert_eq!(payloads[0].data, b"aabbcc");
        assert_eq!(payloads[0].offset, 702);
        assert_eq!(reassembler.in_flight(), 0);
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut reassembler = Reassembler::new();
        reassembler.insert(segment(7, "p0", 2, 0, b"aa"));
        reassembler.insert(segment(7, "p0", 2, 0, b"aa"));
        let payloads = reassembler.insert(segment(7, "p0", 2, 1, b"bb"));
        assert_eq!(payloads[0].data, b"aabb");
    }

    #[test]
    fn gap_retains_partial_run() {
        let mut reassembler = Reassembler::new();
        reassembler.insert(segment(7, "p0", 3, 0, b"aa"));
        // idx 2 arrives before idx 1
        assert!(reassembler.insert(segment(7, "p0", 3, 2, b"cc")).is_empty());
        assert_eq!(reassembler.in_flight(), 1);
        // late data can still fill the hole
        assert!(reassembler.insert(segment(7, "p0", 3, 1, b"bb")).is_empty());
        let payloads = reassembler.insert(segment(7, "p0", 3, 2, b"cc"));
        assert_eq!(payloads[0].data, b"aabbcc");
    }

    #[test]
    fn gap_opening_segment_is_dropped() {
        let mut reassembler = Reassembler::new();
        assert!(reassembler.insert(segment(7, "p0", 2, 1, b"bb")).is_empty());
        assert_eq!(reassembler.in_flight(), 0);
    }

    #[test]
    fn emission_is_fifo_over_run_start() {
        let mut reassembler = Reassembler::new();
        reassembler.insert(segment(7, "p0", 2, 0, b"a0"));
        // run 8 starts later and completes first, but waits behind run 7
        assert!(reassembler.insert(segment(8, "p0", 1, 0, b"b0")).is_empty());
        let payloads = reassembler.insert(segment(7, "p0", 2, 1, b"a1"));
        assert_eq!(
            payloads.iter().map(|payload| payload.block_number).collect::<Vec<_>>(),
            vec![7, 8]
        );
    }

    #[test]
    fn same_key_different_producers_stay_separate() {
        let mut reassembler = Reassembler::new();
        reassembler.insert(segment(7, "p0", 2, 0, b"a0"));
        reassembler.insert(segment(7, "p1", 2, 0, b"b0"));
        let payloads = reassembler.insert(segment(7, "p0", 2, 1, b"a1"));
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].data, b"a0a1");
    }

    proptest! {
        /// An in-order stream with arbitrary duplications for K runs emits
        /// exactly K payloads whose bytes match the originals.
        #[test]
        fn duplicated_streams_reassemble_exactly(
            runs in prop::collection::vec(
                prop::collection::vec(prop::collection::vec(any::<u8>(), 1..16), 1..5),
                1..6,
            ),
            dup_seed in any::<u64>(),
        ) {
            let mut reassembler = Reassembler::new();
            let mut emitted = Vec::new();

            for (run_index, chunks) in runs.iter().enumerate() {
                let key = run_index as u64;
                for (idx, chunk) in chunks.iter().enumerate() {
                    let message = segment(key, "p0", chunks.len() as u64, idx as u64, chunk);
                    let duplicate = message.clone();
                    emitted.extend(reassembler.insert(message));
                    // redeliver roughly half the non-final messages
                    if idx + 1 < chunks.len() && (dup_seed >> (idx % 64)) & 1 == 1 {
                        emitted.extend(reassembler.insert(duplicate));
                    }
                }
            }

            prop_assert_eq!(emitted.len(), runs.len());
            for (run_index, chunks) in runs.iter().enumerate() {
                let expected: Vec<u8> = chunks.concat();
                prop_assert_eq!(&emitted[run_index].data, &expected);
                prop_assert_eq!(emitted[run_index].block_number, run_index as u64);
            }
        }
    }
}
