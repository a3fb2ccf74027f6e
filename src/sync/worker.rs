// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crossbeam_channel::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

//==============================================================================
// Worker handle
//==============================================================================

/// Cooperative stop signal handed to a worker's closure.
///
/// Cancellation is just another message: a worker that can suspend on
/// more than one event (e.g. "assigned a connection" or "told to stop")
/// selects between the two channels; a worker with only one suspension
/// point (waiting on its input queue) simply lets the queue's own
/// close/drain sequence carry the termination, and never touches this
/// token at all.
#[derive(Clone)]
pub struct StopToken {
    rx: Receiver<()>,
}

impl StopToken {
    /// Non-blocking check, for workers that poll rather than select.
    pub fn is_requested(&self) -> bool {
        !self.rx.is_empty()
    }

    /// The underlying receiver, for use inside a
    /// `crossbeam_channel::select!` alongside a worker's other channels.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

/// A named, individually addressable worker thread.
///
/// Constructed by [`spawn`] before the worker's closure starts running, and
/// consumed by [`WorkerHandle::join`] once the thread has exited.
pub struct WorkerHandle {
    id: u32,
    stop_tx: Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Stable id this worker was spawned with; surfaces in every log line
    /// a stage emits so operators can correlate records with a worker.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Requests cooperative termination. The worker observes this the next
    /// time it selects or polls its [`StopToken`]; it is not interrupted
    /// mid-syscall. Idempotent — a second call finds the channel already
    /// holding the token and is a no-op.
    pub fn request_stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    /// Blocks until the worker thread has returned.
    pub fn join(mut self) {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

/// Spawns `body` as a named OS thread with id `id`, returning a handle that
/// can request cooperative termination and be joined.
///
/// `body` receives a [`StopToken`] so it can select or poll for a
/// termination request between iterations of its main loop.
pub fn spawn<F>(id: u32, name: &str, body: F) -> WorkerHandle
where
    F: FnOnce(StopToken) + Send + 'static,
{
    let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
    let token = StopToken { rx: stop_rx };
    let join = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || body(token))
        .expect("failed to spawn worker thread");
    WorkerHandle {
        id,
        stop_tx,
        join: Some(join),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// A worker observes `request_stop` at its next poll and exits.
    #[test]
    fn request_stop_is_observed() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_in_thread = counter.clone();
        let handle = spawn(0, "test-worker", move |token| {
            while !token.is_requested() {
                counter_in_thread.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
            }
        });
        thread::sleep(Duration::from_millis(10));
        handle.request_stop();
        handle.join();
        assert!(counter.load(Ordering::SeqCst) > 0);
    }

    /// Requesting stop twice does not panic or block.
    #[test]
    fn request_stop_is_idempotent() {
        let handle = spawn(0, "test-worker", |token| {
            let _ = token.receiver().recv();
        });
        handle.request_stop();
        handle.request_stop();
        handle.join();
    }
}
