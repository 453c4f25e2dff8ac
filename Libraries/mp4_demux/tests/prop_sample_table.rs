//! Property-based tests for sample indexing over generated files.

mod common;

use std::io::Cursor;

use common::{create_test_file, TrackConfig};
use mp4_demux::Demuxer;
use proptest::prelude::*;

const SPS: [u8; 4] = [0x67, 0x42, 0x00, 0x1E];
const PPS: [u8; 2] = [0x68, 0xCE];

/// Chunks of 1 to 5 samples, each sample 0 to 40 bytes of filler.
fn arb_chunks() -> impl Strategy<Value = Vec<Vec<Vec<u8>>>> {
    prop::collection::vec(
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 1..5),
        1..12,
    )
}

proptest! {
    #[test]
    fn index_matches_generated_layout(chunks in arb_chunks(), delta in 1u32..5000) {
        let mut track = TrackConfig::h264(1, &SPS, &PPS, chunks.clone());
        track.sample_duration = delta;
        let data = create_test_file(&[track]);
        let demuxer = Demuxer::new(Cursor::new(data.clone())).unwrap();
        let index = demuxer.track(1).unwrap().sample_index().unwrap();

        let expected: Vec<&Vec<u8>> = chunks.iter().flatten().collect();
        prop_assert_eq!(index.len(), expected.len());
        prop_assert_eq!(index.chunks.len(), chunks.len());

        // Chunk sample counts add up to the sample count, and numbering is contiguous.
        let mut next = 1u32;
        for (chunk, generated) in index.chunks.iter().zip(&chunks) {
            prop_assert_eq!(chunk.sample_count as usize, generated.len());
            prop_assert_eq!(chunk.start_sample_index, next);
            next += chunk.sample_count;
        }

        // Every sample points at its own bytes.
        for (i, (sample, bytes)) in index.samples.iter().zip(&expected).enumerate() {
            prop_assert_eq!(sample.size as usize, bytes.len());
            prop_assert_eq!(&data[sample.offset as usize..sample.end() as usize], bytes.as_slice());
            prop_assert_eq!(sample.start_time, i as u32 * delta);
        }
        prop_assert_eq!(index.total_duration(), expected.len() as u64 * delta as u64);
    }

    #[test]
    fn corrupted_files_never_panic(
        chunks in arb_chunks(),
        position in any::<prop::sample::Index>(),
        value in any::<u8>(),
    ) {
        let mut data = create_test_file(&[TrackConfig::h264(1, &SPS, &PPS, chunks)]);
        let position = position.index(data.len());
        data[position] = value;

        if let Ok(demuxer) = Demuxer::new(Cursor::new(data)) {
            for trak in demuxer.tracks() {
                let _ = trak.sample_index();
                let _ = trak.codec_config();
            }
            let _ = demuxer.plan(None);
        }
    }
}
