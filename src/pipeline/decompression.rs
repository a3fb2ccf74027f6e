// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use byteorder::{BigEndian, ByteOrder};
use flate2::{Decompress, FlushDecompress, Status};
use log::warn;

use super::item::{DecodedItem, RawItem};
use crate::error::{DecompressionError, Fail};
use crate::sync::queue::{QueueConsumer, QueueProducer};

//==============================================================================
// Decompression worker
//==============================================================================

const WORD_SIZE: usize = 4;
const HEADER_WORDS: usize = 4;

/// Inflates `compressed` (zlib-wrapped DEFLATE) into `scratch`, which is
/// sized to exactly the expected decompressed length.
///
/// `scratch` is *not* cleared before the attempt: on partial or failed
/// inflation, whatever bytes were already sitting in the (reused-across-
/// same-size-records) buffer are left in place for the fields that
/// weren't overwritten, so a record with a corrupt or truncated payload
/// is still forwarded downstream — possibly with stale sample values —
/// instead of being silently dropped.
fn inflate(compressed: &[u8], scratch: &mut [u8]) -> Result<(), DecompressionError> {
    let mut decompress = Decompress::new(true);
    match decompress.decompress(compressed, scratch, FlushDecompress::Finish) {
        Ok(Status::Ok) => {
            if (decompress.total_out() as usize) < scratch.len() {
                Err(DecompressionError::BufferTooSmall)
            } else {
                Ok(())
            }
        }
        Ok(Status::StreamEnd) => Ok(()),
        Ok(Status::BufError) => Err(DecompressionError::BufferTooSmall),
        Err(_) => Err(DecompressionError::CorruptData),
    }
}

/// Decodes the fixed header plus `reduced_fft_size` big-endian IEEE-754
/// samples out of `scratch`, which callers must size to
/// `(4 + reduced_fft_size) * 4` bytes.
fn decode(scratch: &[u8], reduced_fft_size: u32) -> DecodedItem {
    let center_freq = BigEndian::read_u32(&scratch[0..WORD_SIZE]);
    let ts_sec = BigEndian::read_u32(&scratch[WORD_SIZE..2 * WORD_SIZE]);
    let ts_usec = BigEndian::read_u32(&scratch[2 * WORD_SIZE..3 * WORD_SIZE]);
    let freq_res = BigEndian::read_f32(&scratch[3 * WORD_SIZE..4 * WORD_SIZE]);

    let mut samples = Vec::with_capacity(reduced_fft_size as usize);
    for i in 0..reduced_fft_size as usize {
        let offset = (HEADER_WORDS + i) * WORD_SIZE;
        samples.push(BigEndian::read_f32(&scratch[offset..offset + WORD_SIZE]));
    }

    DecodedItem {
        reduced_fft_size,
        center_freq,
        ts_sec,
        ts_usec,
        freq_res,
        samples,
    }
}

/// Runs the decompression stage to completion: pops raw items until the
/// input queue reports end-of-stream, inflating and decoding each one and
/// fanning it out to every queue in `qsout`. With a single output queue
/// the decoded item is moved; with more than one, each queue receives an
/// independently-owned deep copy.
pub fn run(worker_id: u32, qin: QueueConsumer<RawItem>, qsout: Vec<QueueProducer<DecodedItem>>) {
    let mut scratch: Vec<u8> = Vec::new();
    let mut prev_reduced_fft_size: u32 = 0;

    while let Some(raw) = qin.remove() {
        if raw.reduced_fft_size != prev_reduced_fft_size {
            scratch = vec![0u8; (HEADER_WORDS + raw.reduced_fft_size as usize) * WORD_SIZE];
            prev_reduced_fft_size = raw.reduced_fft_size;
        }

        if let Err(category) = inflate(&raw.data, &mut scratch) {
            let err = Fail::Decompression { category };
            warn!(target: "DCMP", "ID:\t{}\t{}", worker_id, err);
        }

        let decoded = decode(&scratch, raw.reduced_fft_size);

        match qsout.as_slice() {
            [] => {}
            [single] => {
                let _ = single.insert(decoded);
            }
            many => {
                for out in many {
                    let _ = out.insert(decoded.clone());
                }
            }
        }
    }

    for out in qsout {
        out.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::queue;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn compress(payload: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        encoder.finish().unwrap()
    }

    fn encode_payload(center_freq: u32, ts_sec: u32, ts_usec: u32, freq_res: f32, samples: &[f32]) -> Vec<u8> {
        let mut buf = vec![0u8; (HEADER_WORDS + samples.len()) * WORD_SIZE];
        BigEndian::write_u32(&mut buf[0..4], center_freq);
        BigEndian::write_u32(&mut buf[4..8], ts_sec);
        BigEndian::write_u32(&mut buf[8..12], ts_usec);
        BigEndian::write_f32(&mut buf[12..16], freq_res);
        for (i, s) in samples.iter().enumerate() {
            let off = (HEADER_WORDS + i) * WORD_SIZE;
            BigEndian::write_f32(&mut buf[off..off + 4], *s);
        }
        buf
    }

    /// A well-formed compressed record round-trips through inflate+decode
    /// to the exact values that were encoded.
    #[test]
    fn round_trip_decode_matches_input() {
        let payload = encode_payload(100_000_000, 1000, 0, 1_000_000.0, &[-10.0, -20.0, -30.0, -40.0]);
        let compressed = compress(&payload);

        let (tx, rx) = queue::bounded::<RawItem>(1);
        let (out_tx, out_rx) = queue::bounded::<DecodedItem>(1);
        tx.insert(RawItem {
            reduced_fft_size: 4,
            data_size: compressed.len() as u32,
            data: compressed,
        })
        .unwrap();
        tx.close();

        run(0, rx, vec![out_tx]);

        let decoded = out_rx.remove().unwrap();
        assert_eq!(decoded.center_freq, 100_000_000);
        assert_eq!(decoded.ts_sec, 1000);
        assert_eq!(decoded.freq_res, 1_000_000.0);
        assert_eq!(decoded.samples, vec![-10.0, -20.0, -30.0, -40.0]);
        assert!(out_rx.remove().is_none());
    }

    /// Fan-out to two output queues delivers equal, independently-owned
    /// copies to each.
    #[test]
    fn fan_out_delivers_to_every_queue() {
        let payload = encode_payload(1, 2, 3, 1.0, &[1.0, 2.0]);
        let compressed = compress(&payload);

        let (tx, rx) = queue::bounded::<RawItem>(1);
        let (a_tx, a_rx) = queue::bounded::<DecodedItem>(1);
        let (b_tx, b_rx) = queue::bounded::<DecodedItem>(1);
        tx.insert(RawItem {
            reduced_fft_size: 2,
            data_size: compressed.len() as u32,
            data: compressed,
        })
        .unwrap();
        tx.close();

        run(0, rx, vec![a_tx, b_tx]);

        let a = a_rx.remove().unwrap();
        let b = b_rx.remove().unwrap();
        assert_eq!(a.samples, b.samples);
        assert!(a_rx.remove().is_none());
        assert!(b_rx.remove().is_none());
    }

    /// Corrupt compressed bytes don't stop the pipeline: a warning is
    /// logged and a (possibly garbage) item is still forwarded.
    #[test]
    fn corrupt_payload_still_forwards_an_item() {
        let (tx, rx) = queue::bounded::<RawItem>(1);
        let (out_tx, out_rx) = queue::bounded::<DecodedItem>(1);
        tx.insert(RawItem {
            reduced_fft_size: 2,
            data_size: 4,
            data: vec![0xde, 0xad, 0xbe, 0xef],
        })
        .unwrap();
        tx.close();

        run(0, rx, vec![out_tx]);

        assert!(out_rx.remove().is_some());
    }
}
