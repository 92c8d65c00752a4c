// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-job JSON manifest: the durable record of a finished batch.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use wallframe_core::config::WallframeConfig;
use wallframe_core::error::{Result, WallframeError};
use wallframe_core::types::JobId;

use crate::forward::ForwardSummary;
use crate::job::{BatchRequest, JobStatus, TaskError, TaskResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobManifest {
    pub job_id: JobId,
    pub status: JobStatus,
    pub request: BatchRequest,
    pub config: WallframeConfig,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_images: usize,
    pub completed: usize,
    pub failed: usize,
    pub results: Vec<TaskResult>,
    pub errors: Vec<TaskError>,
    /// Present when outputs were forwarded to the external queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarding: Option<ForwardSummary>,
}

pub fn manifest_path(dir: &Path, job_id: &JobId) -> PathBuf {
    dir.join(format!("{job_id}.json"))
}

/// Write `manifest` as pretty JSON to `{dir}/{job_id}.json`.
#[instrument(skip(manifest), fields(job_id = %manifest.job_id))]
pub async fn write_manifest(dir: &Path, manifest: &JobManifest) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = manifest_path(dir, &manifest.job_id);
    let json = serde_json::to_vec_pretty(manifest)?;
    tokio::fs::write(&path, json).await?;
    info!(path = %path.display(), "job manifest written");
    Ok(path)
}

/// Read back a finished job's manifest. A missing file is `UnknownJob`.
pub async fn read_manifest(dir: &Path, job_id: &JobId) -> Result<JobManifest> {
    let path = manifest_path(dir, job_id);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(WallframeError::UnknownJob(job_id.to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_slice(&data)?)
}
