// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use std::net::TcpStream;
use std::sync::Arc;

use crossbeam_channel::{self, select, Receiver, Sender};
use log::{info, warn};

use super::reception;
use crate::config::Config;
use crate::error::Fail;
use crate::net::{Connection, Listener};
use crate::shutdown::Shutdown;
use crate::sync::queue::{self, QueueConsumer, QueueProducer};
use crate::sync::worker::{self, WorkerHandle};

//==============================================================================
// Acceptor
//==============================================================================

/// Owns the listening socket and the fixed pool of reception workers.
///
/// Startup spawns every reception worker up front and waits for each one's
/// readiness signal before admitting it to the pool, so the pool queue
/// never names a worker that hasn't already parked waiting for work.
pub struct Acceptor {
    listener: Arc<Listener>,
    pool_tx: QueueProducer<u32>,
    pool_rx: QueueConsumer<u32>,
    assigns: Vec<Sender<Connection>>,
    handles: Vec<WorkerHandle>,
    accept_thread: WorkerHandle,
    conn_rx: Receiver<Connection>,
}

impl Acceptor {
    /// Spawns the pool, then binds the listener with a backlog equal to
    /// the pool size. Returns a [`Fail::Fatal`] if the port cannot be
    /// bound — the only fatal failure after argument parsing.
    pub fn start(config: &Config) -> Result<Self, Fail> {
        let pool_size = config.pool_size.max(1);
        let (pool_tx, pool_rx) = queue::bounded::<u32>(pool_size);

        let mut handles = Vec::with_capacity(pool_size);
        let mut assigns = Vec::with_capacity(pool_size);
        for id in 0..pool_size as u32 {
            let reception::Handles { worker, assign } =
                reception::spawn(id, config.file_time, config.file_path.clone(), pool_tx.clone());
            handles.push(worker);
            assigns.push(assign);
            pool_tx
                .insert(id)
                .expect("pool queue sized to pool_size, cannot be full here");
        }

        let listener = Arc::new(Listener::bind(config.port, pool_size).map_err(|e| Fail::Fatal {
            reason: format!("failed to bind port {}: {}", config.port, e),
        })?);
        info!(target: "ACPT", "listening on port {} with pool size {}", config.port, pool_size);

        let (conn_tx, conn_rx) = crossbeam_channel::bounded::<Connection>(0);
        let accept_listener = listener.clone();
        let accept_thread = worker::spawn(0, "acceptor-accept", move |token| loop {
            if token.is_requested() {
                break;
            }
            match accept_listener.accept() {
                Ok(conn) => {
                    if token.is_requested() {
                        conn.disconnect();
                        break;
                    }
                    if conn_tx.send(conn).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        Ok(Self {
            listener,
            pool_tx,
            pool_rx,
            assigns,
            handles,
            accept_thread,
            conn_rx,
        })
    }

    /// Runs the main accept loop until `shutdown` fires, then performs the
    /// systematic teardown: stop accepting, request-stop every reception
    /// worker, join them, and return.
    pub fn run(self, shutdown: &Shutdown) {
        let Acceptor {
            listener,
            pool_tx,
            pool_rx,
            assigns,
            handles,
            accept_thread,
            conn_rx,
        } = self;

        loop {
            let id = select! {
                recv(shutdown.receiver()) -> _ => break,
                recv(pool_rx.receiver()) -> msg => match msg {
                    Ok(id) => id,
                    Err(_) => break,
                },
            };

            let conn = select! {
                recv(shutdown.receiver()) -> _ => break,
                recv(conn_rx) -> msg => match msg {
                    Ok(conn) => conn,
                    Err(_) => break,
                },
            };

            if assigns[id as usize].send(conn).is_err() {
                warn!(target: "ACPT", "reception worker {} is no longer listening", id);
            }
        }

        drop(pool_tx);
        info!(target: "ACPT", "shutting down: stopping acceptor and {} reception workers", handles.len());

        // Nudge a blocked accept() so the background accept thread observes
        // its stop request instead of waiting for the next real peer.
        accept_thread.request_stop();
        if let Ok(addr) = listener.local_addr() {
            let _ = TcpStream::connect(addr);
        }
        accept_thread.join();

        for handle in &handles {
            handle.request_stop();
        }
        for handle in handles {
            handle.join();
        }

        info!(target: "ACPT", "terminated");
    }
}
