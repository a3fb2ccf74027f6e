// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{error, warn};

use super::item::DecodedItem;
use crate::error::{self, Fail};
use crate::sync::queue::QueueConsumer;

//==============================================================================
// Storing worker
//==============================================================================

/// Per-peer output file rotation state, tracked across the lifetime of one
/// connection.
struct Rotation {
    file: Option<BufWriter<File>>,
    opened_at: Option<Instant>,
    prev_center_freq: u32,
    file_time: Duration,
    dir: PathBuf,
    hostaddr: String,
    port: u16,
}

impl Rotation {
    fn new(dir: PathBuf, hostaddr: String, port: u16, file_time: Duration) -> Self {
        Self {
            file: None,
            opened_at: None,
            prev_center_freq: 0,
            file_time,
            dir,
            hostaddr,
            port,
        }
    }

    /// Opens a new output file when either no file is open, or `file_time`
    /// has elapsed *and* `center_freq` has dropped below the previous
    /// record's, signaling the start of a new sweep. The second clause is
    /// what keeps a sweep from being split across two files.
    fn ensure_file(&mut self, worker_id: u32, center_freq: u32) {
        let should_rotate = match self.opened_at {
            None => true,
            Some(opened_at) => {
                opened_at.elapsed() > self.file_time && center_freq < self.prev_center_freq
            }
        };
        if should_rotate {
            if let Some(mut file) = self.file.take() {
                let _ = file.flush();
            }
            let path = self.next_path();
            match Self::open(&path) {
                Ok(file) => self.file = Some(file),
                Err(err) => {
                    error!(target: "STOR", "ID:\t{}\t{}", worker_id, err);
                    self.file = None;
                }
            }
            self.opened_at = Some(Instant::now());
        }
        self.prev_center_freq = center_freq;
    }

    /// Creates the output file at `path`, wrapping any failure in
    /// [`Fail::Store`] so the caller can log through the same taxonomy
    /// every other record-scoped failure in the pipeline uses.
    fn open(path: &Path) -> error::Result<BufWriter<File>> {
        File::create(path)
            .map(BufWriter::new)
            .map_err(|e| Fail::Store {
                reason: format!("{}: {}", path.display(), e),
            })
    }

    fn next_path(&self) -> PathBuf {
        let datetime = chrono::Local::now().format("%Y-%m-%d_%H:%M:%S");
        self.dir
            .join(format!("{}_{}:{}.csv", datetime, self.hostaddr, self.port))
    }

    fn write_row(&mut self, line: &str) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
    }

    fn close(mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }
    }
}

/// Computes the per-bin frequency axis value: the offset from the center
/// bin is computed in integer arithmetic before being scaled by
/// `freq_res`, so rounding matches bin-for-bin regardless of sample count.
pub fn bin_frequency(center_freq: u32, reduced_fft_size: u32, freq_res: f32, bin: u32) -> u32 {
    let half = (reduced_fft_size / 2) as i64;
    let offset = half - bin as i64;
    let freq = center_freq as f64 - (offset as f64 * freq_res as f64);
    freq as u32
}

/// Runs the storing stage to completion: pops decoded items until the
/// input queue reports end-of-stream, rotating files and appending CSV
/// rows as it goes. Has exactly one suspension point (`qin.remove()`) and
/// needs no stop token — it terminates when its upstream closes.
pub fn run(worker_id: u32, qin: QueueConsumer<DecodedItem>, peer: SocketAddr, file_time: Duration, root: &Path) {
    let hostaddr = peer.ip().to_string();
    let port = peer.port();
    let dir = root.join(&hostaddr);
    if let Err(e) = fs::create_dir_all(&dir) {
        warn!(target: "STOR", "ID:\t{}\tcould not create output directory {}: {}", worker_id, dir.display(), e);
    }

    let mut rotation = Rotation::new(dir, hostaddr, port, file_time);

    while let Some(item) = qin.remove() {
        rotation.ensure_file(worker_id, item.center_freq);
        for bin in 0..item.reduced_fft_size {
            let freq = bin_frequency(item.center_freq, item.reduced_fft_size, item.freq_res, bin);
            let sample = item.samples[bin as usize];
            let line = format!("{},{},{},{:.1}\n", item.ts_sec, item.ts_usec, freq, sample);
            rotation.write_row(&line);
        }
    }

    rotation.close();
}
