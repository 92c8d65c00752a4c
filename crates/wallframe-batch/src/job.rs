// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch job records: submission, task list, live state, and snapshots.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use wallframe_core::error::{Result, WallframeError};
use wallframe_core::platform::platform_spec;
use wallframe_core::types::{JobId, PrintSize};

/// Lifecycle of a batch job. `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// A batch submission as received from a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub photo_paths: Vec<PathBuf>,
    pub template_ids: Vec<String>,
    pub platforms: Vec<String>,
    /// `"WxH"` in inches.
    pub print_size: String,
    /// Forward finished outputs to the external queue.
    #[serde(default)]
    pub queue_to_agent: bool,
}

impl BatchRequest {
    /// Check caller input that must fail before any work starts: empty
    /// axes, unknown platforms, and an unparseable print size.
    pub fn validate(&self) -> Result<PrintSize> {
        if self.photo_paths.is_empty() {
            return Err(WallframeError::InvalidRequest("no photos".into()));
        }
        if self.template_ids.is_empty() {
            return Err(WallframeError::InvalidRequest("no templates".into()));
        }
        if self.platforms.is_empty() {
            return Err(WallframeError::InvalidRequest("no platforms".into()));
        }
        for platform in &self.platforms {
            platform_spec(platform)?;
        }
        self.print_size.parse()
    }

    /// Photo x template x platform, photo-major.
    pub fn expand(&self) -> Vec<BatchTask> {
        let mut tasks = Vec::with_capacity(
            self.photo_paths.len() * self.template_ids.len() * self.platforms.len(),
        );
        for photo_path in &self.photo_paths {
            for template_id in &self.template_ids {
                for platform in &self.platforms {
                    tasks.push(BatchTask {
                        index: tasks.len(),
                        photo_path: photo_path.clone(),
                        template_id: template_id.clone(),
                        platform: platform.clone(),
                    });
                }
            }
        }
        tasks
    }
}

/// One (photo, template, platform) render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTask {
    pub index: usize,
    pub photo_path: PathBuf,
    pub template_id: String,
    pub platform: String,
}

impl BatchTask {
    /// `{index:04}_{photo stem}_{template}_{platform}.{ext}` under `dir`.
    /// The index keeps paths unique within a job.
    pub fn output_path(&self, dir: &Path, extension: &str) -> PathBuf {
        let stem = self
            .photo_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".into());
        dir.join(format!(
            "{:04}_{}_{}_{}.{}",
            self.index,
            sanitize(&stem),
            sanitize(&self.template_id),
            sanitize(&self.platform),
            extension
        ))
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    #[serde(flatten)]
    pub task: BatchTask,
    pub output_path: PathBuf,
    pub render_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskError {
    #[serde(flatten)]
    pub task: BatchTask,
    pub error: String,
    /// `WallframeError::code` of the failure.
    pub code: String,
}

impl TaskError {
    pub fn new(task: BatchTask, err: &WallframeError) -> Self {
        Self {
            task,
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

/// Returned from submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub job_id: JobId,
    pub total_images: usize,
    pub status: JobStatus,
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub total_images: usize,
    pub completed: usize,
    pub failed: usize,
    /// 0-100.
    pub progress: f64,
    pub duration_ms: u64,
    pub errors: Vec<TaskError>,
}

// -- Live state ---------------------------------------------------------------

/// Mutable job progress, guarded by `JobState::progress`.
#[derive(Debug)]
pub(crate) struct Progress {
    pub status: JobStatus,
    pub completed: usize,
    pub failed: usize,
    pub results: Vec<TaskResult>,
    pub errors: Vec<TaskError>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

/// Shared state of one job. Workers pull from `cursor`; only the job's own
/// pool mutates `progress`.
#[derive(Debug)]
pub(crate) struct JobState {
    pub id: JobId,
    pub request: BatchRequest,
    pub print_size: PrintSize,
    pub tasks: Vec<BatchTask>,
    pub cursor: AtomicUsize,
    pub cancel_requested: AtomicBool,
    pub started_at: DateTime<Utc>,
    pub started: Instant,
    pub progress: Mutex<Progress>,
    /// Flips to `true` once forwarding and the manifest write are done.
    pub finalized: watch::Sender<bool>,
}

impl JobState {
    pub fn new(id: JobId, request: BatchRequest, print_size: PrintSize) -> Self {
        let tasks = request.expand();
        let (finalized, _) = watch::channel(false);
        Self {
            id,
            request,
            print_size,
            tasks,
            cursor: AtomicUsize::new(0),
            cancel_requested: AtomicBool::new(false),
            started_at: Utc::now(),
            started: Instant::now(),
            progress: Mutex::new(Progress {
                status: JobStatus::Running,
                completed: 0,
                failed: 0,
                results: Vec::new(),
                errors: Vec::new(),
                finished_at: None,
                duration_ms: None,
            }),
            finalized,
        }
    }

    pub fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the next task, or `None` when the list is exhausted or the job
    /// was cancelled. Each index is handed out at most once.
    pub fn next_task(&self) -> Option<&BatchTask> {
        if self.cancel_requested.load(Ordering::Acquire) {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::AcqRel);
        self.tasks.get(index)
    }

    pub fn record_success(&self, result: TaskResult) {
        let mut progress = self.progress();
        progress.completed += 1;
        progress.results.push(result);
    }

    pub fn record_failure(&self, error: TaskError) {
        let mut progress = self.progress();
        progress.failed += 1;
        progress.errors.push(error);
    }

    /// Flip to `Cancelled` if still running. Returns whether it flipped.
    pub fn cancel(&self) -> bool {
        let mut progress = self.progress();
        if progress.status != JobStatus::Running {
            return false;
        }
        progress.status = JobStatus::Cancelled;
        self.cancel_requested.store(true, Ordering::Release);
        true
    }

    /// Settle the terminal status once every worker has stopped. A
    /// cancelled job stays cancelled; otherwise the job failed only if no
    /// task succeeded.
    pub fn finish(&self) -> JobStatus {
        let mut progress = self.progress();
        if progress.status == JobStatus::Running {
            progress.status = if progress.completed == 0 && progress.failed > 0 {
                JobStatus::Failed
            } else {
                JobStatus::Completed
            };
        }
        progress.finished_at = Some(Utc::now());
        progress.duration_ms = Some(self.started.elapsed().as_millis() as u64);
        progress.status
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let progress = self.progress();
        let total = self.tasks.len();
        let done = progress.completed + progress.failed;
        JobSnapshot {
            job_id: self.id,
            status: progress.status,
            total_images: total,
            completed: progress.completed,
            failed: progress.failed,
            progress: if total == 0 {
                100.0
            } else {
                done as f64 / total as f64 * 100.0
            },
            duration_ms: progress
                .duration_ms
                .unwrap_or_else(|| self.started.elapsed().as_millis() as u64),
            errors: progress.errors.clone(),
        }
    }
}
