// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use crossbeam_channel::{self, Receiver, Sender};
use log::info;

//==============================================================================
// Shutdown coordinator
//==============================================================================

/// Translates OS interrupt delivery into a single token on a channel the
/// acceptor selects against.
///
/// This is the only piece of the collector that touches global process
/// state (the signal handler installed with `ctrlc`). Everything else —
/// stopping the reception workers, joining them, closing queues — is
/// ordinary code on the main thread, run once the acceptor's main loop
/// observes the token. Repeated interrupts after the first are a no-op:
/// the underlying channel is bounded to one slot and a full channel simply
/// drops the extra signal.
pub struct Shutdown {
    rx: Receiver<()>,
}

impl Shutdown {
    /// Installs the interrupt handler and returns a coordinator the
    /// acceptor can poll or select on.
    pub fn install() -> Self {
        let (tx, rx): (Sender<()>, Receiver<()>) = crossbeam_channel::bounded(1);
        ctrlc::set_handler(move || {
            // A full channel means shutdown was already requested; ignore
            // the repeat, matching the "repeated interrupts are no-ops"
            // property.
            let _ = tx.try_send(());
        })
        .expect("failed to install SIGINT handler");
        Self { rx }
    }

    /// True if an interrupt has been delivered and not yet consumed.
    pub fn is_requested(&self) -> bool {
        !self.rx.is_empty()
    }

    /// A receiver usable in a `crossbeam_channel::select!` alongside the
    /// acceptor's own channels, so a blocked accept can be raced against
    /// shutdown.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    /// Blocks until shutdown has been requested.
    pub fn wait(&self) {
        let _ = self.rx.recv();
        info!(target: "ACPT", "shutdown requested, waiting for termination...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A manually-constructed coordinator observes exactly one token even
    /// if more than one sender attempts to send.
    #[test]
    fn repeated_signal_is_a_no_op() {
        let (tx, rx) = crossbeam_channel::bounded::<()>(1);
        tx.try_send(()).unwrap();
        assert!(tx.try_send(()).is_err());
        let shutdown = Shutdown { rx };
        assert!(shutdown.is_requested());
    }
}
