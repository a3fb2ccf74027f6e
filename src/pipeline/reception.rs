// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::{self, select, Receiver, Sender};
use log::info;

use super::decompression;
use super::item::RawItem;
use super::storing;
use crate::error::{self, Fail};
use crate::net::Connection;
use crate::sync::queue::{self, QueueProducer};
use crate::sync::worker::{self, StopToken, WorkerHandle};

//==============================================================================
// Reception worker
//==============================================================================

const CONNECTION_QUEUE_CAPACITY: usize = 1000;

/// Rounds `n` up to the next multiple of 4, so a compressed payload of any
/// length still leaves subsequent reads aligned on a 32-bit word boundary.
fn round_up_to_word(n: u32) -> u32 {
    (n + 3) & !0x03
}

/// Everything a long-lived reception worker needs besides its own id: a
/// way to be handed a connection, a way to signal the acceptor it's ready
/// for one, and a way to return itself to the pool when done.
pub struct Handles {
    pub worker: WorkerHandle,
    pub assign: Sender<Connection>,
}

/// Spawns one reception worker. Blocks the caller until the worker has
/// parked waiting for its first assignment, so the pool never contains a
/// worker id the acceptor could race ahead of.
pub fn spawn(id: u32, file_time: Duration, file_path: PathBuf, pool_tx: QueueProducer<u32>) -> Handles {
    let (assign_tx, assign_rx) = crossbeam_channel::bounded::<Connection>(1);
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<()>(1);

    let worker = worker::spawn(id, &format!("reception-{}", id), move |token| {
        run(id, assign_rx, ready_tx, file_time, file_path, pool_tx, token);
    });

    ready_rx
        .recv()
        .expect("reception worker dropped its ready signal before parking");

    Handles { worker, assign: assign_tx }
}

fn run(
    id: u32,
    assign_rx: Receiver<Connection>,
    ready_tx: Sender<()>,
    file_time: Duration,
    file_path: PathBuf,
    pool_tx: QueueProducer<u32>,
    token: StopToken,
) {
    // Signal readiness before the first wait: from here on the worker is
    // parked on `select!` below, so the acceptor may safely hand it a
    // connection as soon as it is reinserted into the pool.
    let _ = ready_tx.send(());

    loop {
        let conn = select! {
            recv(token.receiver()) -> _ => break,
            recv(assign_rx) -> msg => match msg {
                Ok(conn) => conn,
                Err(_) => break,
            },
        };

        info!(target: "RECP", "ID:\t{}\trequest received", id);
        serve(id, conn, file_time, &file_path, &token);
        info!(target: "RECP", "ID:\t{}\trequest served", id);

        if pool_tx.insert(id).is_err() {
            break;
        }
    }
}

/// Services one connection end to end: spawns the private decompression
/// and storing workers, reads framed records until disconnect or a
/// graceful `data_size == 0`, then tears everything down in order.
fn serve(id: u32, mut conn: Connection, file_time: Duration, file_path: &std::path::Path, token: &StopToken) {
    let peer = conn.peer_addr();
    let (raw_tx, raw_rx) = queue::bounded::<RawItem>(CONNECTION_QUEUE_CAPACITY);
    let (decoded_tx, decoded_rx) = queue::bounded(CONNECTION_QUEUE_CAPACITY);

    let decompression_handle = worker::spawn(id, &format!("decompression-{}", id), move |_token| {
        decompression::run(id, raw_rx, vec![decoded_tx]);
    });
    let file_path = file_path.to_path_buf();
    let storing_handle = worker::spawn(id, &format!("storing-{}", id), move |_token| {
        storing::run(id, decoded_rx, peer, file_time, &file_path);
    });

    if let Err(err) = read_records(&mut conn, token, &raw_tx) {
        info!(target: "RECP", "ID:\t{}\tconnection ended: {}", id, err);
    }

    raw_tx.close();
    decompression_handle.join();
    storing_handle.join();
    conn.disconnect();
}

/// Reads framed records off `conn` until a graceful `data_size == 0`, the
/// stop token fires, or the connection is otherwise lost. A short or failed
/// socket read surfaces as [`Fail::ConnectionLost`] via the blanket
/// `From<io::Error>` impl and the `?` operator, rather than a bare `break`.
fn read_records(conn: &mut Connection, token: &StopToken, raw_tx: &QueueProducer<RawItem>) -> error::Result<()> {
    loop {
        if token.is_requested() {
            return Ok(());
        }
        let data_size = conn.read_u32_be()?;
        if data_size == 0 {
            return Ok(());
        }
        let reduced_fft_size = conn.read_u32_be()?;
        let payload_size = round_up_to_word(data_size);
        let data = conn.read_exact_bytes(payload_size as usize)?;

        let item = RawItem {
            reduced_fft_size,
            data_size,
            data,
        };
        raw_tx.insert(item).map_err(|_| Fail::ConnectionLost {
            reason: "decompression queue closed early".to_string(),
        })?;
    }
}
