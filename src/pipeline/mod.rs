// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The four pipeline stages — reception, decompression, storing — and the
//! [`acceptor`] that owns the reception pool and the listening socket.

pub mod acceptor;
pub mod decompression;
pub mod item;
pub mod reception;
pub mod storing;
