// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};

use socket2::{Domain, Socket, Type};

use super::connection::Connection;

//==============================================================================
// Listener
//==============================================================================

/// Owns the bound, listening TCP socket.
///
/// Listen backlog is sized equal to the reception worker pool: a burst of
/// inbound connections larger than the pool can momentarily queue at the
/// OS level rather than being refused outright.
pub struct Listener {
    inner: StdTcpListener,
}

impl Listener {
    /// Binds `port` on every interface with a listen backlog of
    /// `backlog` (the pool size).
    ///
    /// `std::net::TcpListener` has no post-bind way to set the backlog, so
    /// the socket is built with `socket2` (bind then `listen(backlog)`
    /// directly) and converted into a standard `TcpListener` afterwards —
    /// every other operation on it is ordinary std.
    pub fn bind(port: u16, backlog: usize) -> io::Result<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        let socket = Socket::new(Domain::IPV4, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(backlog as i32)?;
        Ok(Self { inner: socket.into() })
    }

    /// Blocks until an inbound connection arrives, or returns an error if
    /// the listener has been closed (e.g. during shutdown on some
    /// platforms) or accept otherwise fails.
    pub fn accept(&self) -> io::Result<Connection> {
        let (stream, peer) = self.inner.accept()?;
        Ok(Connection::new(stream, peer))
    }

    /// The bound local address, used by the shutdown coordinator to open a
    /// throwaway loopback connection that wakes a thread blocked in
    /// `accept` (std's blocking listener has no native cancel).
    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.inner.local_addr()
    }
}
