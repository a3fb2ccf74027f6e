// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Concurrency primitives shared by every pipeline stage: the bounded
//! hand-off [`queue`] and the named, cooperatively-cancellable
//! [`worker`] thread handle.

pub mod queue;
pub mod worker;