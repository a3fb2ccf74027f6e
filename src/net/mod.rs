// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The server socket layer: a thin wrapper over [`std::net::TcpListener`]
//! and [`std::net::TcpStream`] that gives the acceptor and reception
//! workers exactly the operations the pipeline needs — listen/accept,
//! framed reads, peer identity, and disconnect — and nothing else. It
//! carries no pipeline logic of its own.

pub mod connection;
pub mod listener;

pub use connection::Connection;
pub use listener::Listener;
