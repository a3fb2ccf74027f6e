// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpStream};

use byteorder::{BigEndian, ReadBytesExt};

//==============================================================================
// Connection
//==============================================================================

/// One accepted TCP connection from a sensing node.
///
/// `Connection` exposes only the framed-read operations the reception
/// worker needs: reading a big-endian `u32` header field, and reading an
/// exact payload of `n` bytes. Any short read or I/O error is reported as
/// connection loss — the reception worker treats both identically and
/// tears the connection down.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    /// Address and port of the sensing node, used to compose the per-peer
    /// output subdirectory and file name.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Reads one big-endian `u32` header field (`data_size` or
    /// `reduced_fft_size`). A short read surfaces as an ordinary I/O
    /// error; callers treat it the same as any other connection loss.
    pub fn read_u32_be(&mut self) -> io::Result<u32> {
        self.stream.read_u32::<BigEndian>()
    }

    /// Reads exactly `len` bytes into a freshly allocated buffer.
    pub fn read_exact_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Best-effort shutdown of both halves of the socket. Used during
    /// graceful teardown and at process shutdown; failures are not
    /// actionable (the peer may already have gone away) and are ignored.
    pub fn disconnect(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
