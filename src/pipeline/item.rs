// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

//==============================================================================
// Item
//==============================================================================

/// A raw, still-compressed record as read off the wire by the reception
/// worker.
///
/// `data` is owned until the decompression worker consumes it to produce a
/// [`DecodedItem`]; it is released exactly once, at the end of
/// decompression.
pub struct RawItem {
    pub reduced_fft_size: u32,
    pub data_size: u32,
    pub data: Vec<u8>,
}

/// A fully decoded record, ready to be written to disk.
///
/// `samples.len()` is always exactly `reduced_fft_size` once an item
/// reaches this state. The sample buffer is released exactly once, at the
/// end of storing.
#[derive(Clone)]
pub struct DecodedItem {
    pub reduced_fft_size: u32,
    pub center_freq: u32,
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub freq_res: f32,
    pub samples: Vec<f32>,
}

impl DecodedItem {
    /// Produces `count` independently-owned deep copies of this item, one
    /// per downstream queue in a fan-out. Each copy gets its own sample
    /// buffer — no aliasing between downstream consumers.
    pub fn fan_out(&self, count: usize) -> Vec<DecodedItem> {
        (0..count).map(|_| self.clone()).collect()
    }
}
