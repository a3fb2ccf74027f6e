// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! A concurrent collector for compressed RTL-SDR spectrum-sensing records.
//!
//! A fixed pool of reception workers accepts connections from sensing
//! nodes, each spawning a private decompression and storing worker for the
//! lifetime of that connection. Records flow reception -> decompression ->
//! storing over bounded hand-off queues; see [`pipeline`] for the stage
//! implementations and [`sync`] for the queue and worker primitives they
//! share.

pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod pipeline;
pub mod shutdown;
pub mod sync;
