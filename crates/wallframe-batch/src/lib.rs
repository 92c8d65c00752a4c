// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wallframe Batch: expands photo x template x platform submissions into
// render tasks, runs them on a bounded worker pool, tracks progress, and
// records each finished job in a JSON manifest.

pub mod cache;
pub mod engine;
pub mod forward;
pub mod job;
pub mod manifest;

pub use cache::RoomCache;
pub use engine::BatchEngine;
pub use forward::{ForwardItem, ForwardSummary, OutputForwarder, SpoolDirForwarder, forward_outputs};
pub use job::{BatchRequest, BatchTask, JobSnapshot, JobStatus, SubmitReceipt, TaskError, TaskResult};
pub use manifest::{JobManifest, manifest_path, read_manifest, write_manifest};
