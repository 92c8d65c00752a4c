// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch mockup engine.
//
// A submission is expanded into photo x template x platform tasks and run
// by a fixed-size pool of workers that pull from the job's atomic cursor.
// Rendering happens on the blocking pool. A task failure is recorded
// against that task and never stops the job. Once every worker has
// stopped, outputs are optionally forwarded to the external queue and the
// manifest is written; only then is the job finalized.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};
use wallframe_core::catalog::TemplateCatalog;
use wallframe_core::config::WallframeConfig;
use wallframe_core::error::{Result, WallframeError};
use wallframe_core::types::JobId;
use wallframe_render::{Compositor, ImageProcessor};

use crate::cache::RoomCache;
use crate::forward::{ForwardItem, ForwardSummary, OutputForwarder, forward_outputs};
use crate::job::{
    BatchRequest, BatchTask, JobSnapshot, JobState, JobStatus, SubmitReceipt, TaskError, TaskResult,
};
use crate::manifest::{JobManifest, read_manifest, write_manifest};

/// Runs batch jobs. Cloning is cheap; clones share the job table.
#[derive(Clone)]
pub struct BatchEngine {
    config: Arc<WallframeConfig>,
    catalog: Arc<dyn TemplateCatalog>,
    compositor: Arc<Compositor>,
    forwarder: Option<Arc<dyn OutputForwarder>>,
    jobs: Arc<Mutex<HashMap<JobId, Arc<JobState>>>>,
    rooms: Arc<RoomCache>,
}

impl BatchEngine {
    /// Build an engine whose compositor follows `config`, including the
    /// branding logo when one is configured.
    pub fn new(config: WallframeConfig, catalog: Arc<dyn TemplateCatalog>) -> Result<Self> {
        let compositor = Compositor::from_config(&config)?;
        Ok(Self::with_compositor(config, catalog, compositor))
    }

    pub fn with_compositor(
        config: WallframeConfig,
        catalog: Arc<dyn TemplateCatalog>,
        compositor: Compositor,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            compositor: Arc::new(compositor),
            forwarder: None,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            rooms: Arc::new(RoomCache::default()),
        }
    }

    /// Attach the external queue used for `queue_to_agent` submissions.
    pub fn with_forwarder(mut self, forwarder: Arc<dyn OutputForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn config(&self) -> &WallframeConfig {
        &self.config
    }

    // -- Job control ----------------------------------------------------------

    /// Validate and start a job. Unknown platforms, a bad print size or an
    /// empty axis fail here; unknown templates and missing photos fail per
    /// task. Must be called from within a Tokio runtime.
    #[instrument(skip(self, request), fields(
        photos = request.photo_paths.len(),
        templates = request.template_ids.len(),
        platforms = request.platforms.len(),
    ))]
    pub async fn submit(&self, request: BatchRequest) -> Result<SubmitReceipt> {
        let print_size = request.validate().inspect_err(|err| {
            warn!(code = err.code(), error = %err, "batch submission rejected");
        })?;
        let job_id = JobId::new();
        let state = Arc::new(JobState::new(job_id, request, print_size));
        let total_images = state.tasks.len();

        self.lock_jobs().insert(job_id, Arc::clone(&state));
        info!(%job_id, total_images, "batch job submitted");

        let engine = self.clone();
        tokio::spawn(async move { engine.run_job(state).await });

        Ok(SubmitReceipt {
            job_id,
            total_images,
            status: JobStatus::Running,
        })
    }

    /// Live snapshot of a job.
    pub fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot> {
        Ok(self.job(job_id)?.snapshot())
    }

    /// Request cancellation. Returns `false` when the job had already left
    /// `Running`. In-flight tasks still finish.
    pub fn cancel(&self, job_id: &JobId) -> Result<bool> {
        let flipped = self.job(job_id)?.cancel();
        if flipped {
            info!(%job_id, "batch job cancelled");
        }
        Ok(flipped)
    }

    /// Wait until the job is finalized (workers stopped, forwarding done,
    /// manifest written) and return its final snapshot.
    pub async fn wait(&self, job_id: &JobId) -> Result<JobSnapshot> {
        let state = self.job(job_id)?;
        let mut finalized = state.finalized.subscribe();
        // The sender lives in `state`, which we hold, so this cannot close.
        let _ = finalized.wait_for(|done| *done).await;
        Ok(state.snapshot())
    }

    /// Snapshots of every job this engine has run, newest last.
    pub fn list_jobs(&self) -> Vec<JobSnapshot> {
        let states: Vec<Arc<JobState>> = self.lock_jobs().values().cloned().collect();
        let mut snapshots: Vec<(chrono::DateTime<chrono::Utc>, JobSnapshot)> = states
            .iter()
            .map(|s| (s.started_at, s.snapshot()))
            .collect();
        snapshots.sort_by_key(|(started, _)| *started);
        snapshots.into_iter().map(|(_, s)| s).collect()
    }

    /// Read a finished job's manifest from the manifest directory.
    pub async fn load_manifest(&self, job_id: &JobId) -> Result<JobManifest> {
        read_manifest(&self.config.manifest_dir, job_id).await
    }

    fn job(&self, job_id: &JobId) -> Result<Arc<JobState>> {
        self.lock_jobs()
            .get(job_id)
            .cloned()
            .ok_or_else(|| WallframeError::UnknownJob(job_id.to_string()))
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<JobId, Arc<JobState>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Execution ------------------------------------------------------------

    async fn run_job(self, state: Arc<JobState>) {
        let workers = self.config.concurrency.max(1);
        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let engine = self.clone();
            let state = Arc::clone(&state);
            pool.spawn(async move { engine.worker_loop(worker, state).await });
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                error!(job_id = %state.id, error = %err, "batch worker aborted");
            }
        }

        let status = state.finish();
        let snapshot = state.snapshot();
        info!(
            job_id = %state.id,
            ?status,
            completed = snapshot.completed,
            failed = snapshot.failed,
            duration_ms = snapshot.duration_ms,
            "batch job finished"
        );

        let forwarding = match (&self.forwarder, state.request.queue_to_agent) {
            (Some(forwarder), true) => {
                let items = self.forward_items(&state);
                let timeout = Duration::from_millis(self.config.forward_timeout_ms);
                Some(forward_outputs(Arc::clone(forwarder), items, timeout).await)
            }
            (None, true) => {
                warn!(job_id = %state.id, "queue_to_agent requested but no forwarder configured");
                None
            }
            _ => None,
        };

        let manifest = self.build_manifest(&state, forwarding);
        if let Err(err) = write_manifest(&self.config.manifest_dir, &manifest).await {
            error!(job_id = %state.id, error = %err, "failed to write job manifest");
        }

        state.finalized.send_replace(true);
        debug!(job_id = %state.id, "batch job finalized");
    }

    async fn worker_loop(self, worker: usize, state: Arc<JobState>) {
        while let Some(task) = state.next_task() {
            let task = task.clone();
            let engine = self.clone();
            let job_state = Arc::clone(&state);
            let render_task = task.clone();
            let outcome = tokio::task::spawn_blocking(move || engine.render(&job_state, &render_task))
                .await
                .unwrap_or_else(|join_err| {
                    Err(WallframeError::ImageError(format!(
                        "render task aborted: {join_err}"
                    )))
                });

            match outcome {
                Ok(result) => {
                    debug!(worker, index = task.index, render_ms = result.render_ms, "task complete");
                    state.record_success(result);
                }
                Err(err) => {
                    error!(
                        worker,
                        index = task.index,
                        template = %task.template_id,
                        platform = %task.platform,
                        code = err.code(),
                        error = %err,
                        "task failed"
                    );
                    state.record_failure(TaskError::new(task, &err));
                }
            }
        }
        debug!(worker, job_id = %state.id, "worker stopped");
    }

    /// Render one task to its output file. Runs on the blocking pool.
    fn render(&self, state: &JobState, task: &BatchTask) -> Result<TaskResult> {
        let started = Instant::now();
        let template = self.catalog.require(&task.template_id)?;
        let room = self.rooms.get_or_load(&template.image_path)?;
        let artwork = ImageProcessor::open(&task.photo_path)?.into_dynamic();

        let composite =
            self.compositor
                .composite_image(&artwork, &room, &template, state.print_size, 0)?;
        let output = self.compositor.render_platform(composite, &task.platform, false)?;

        let format = self.compositor.output_format();
        let job_dir = self.config.output_dir.join(state.id.to_string());
        std::fs::create_dir_all(&job_dir)?;
        let output_path = task.output_path(&job_dir, format.extension());
        let bytes = ImageProcessor::from_rgba(output).encode(format)?;
        std::fs::write(&output_path, bytes)?;

        Ok(TaskResult {
            task: task.clone(),
            output_path,
            render_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn forward_items(&self, state: &JobState) -> Vec<ForwardItem> {
        state
            .progress()
            .results
            .iter()
            .map(|r| ForwardItem {
                job_id: state.id,
                output_path: r.output_path.clone(),
                photo_path: r.task.photo_path.clone(),
                template_id: r.task.template_id.clone(),
                platform: r.task.platform.clone(),
            })
            .collect()
    }

    fn build_manifest(
        &self,
        state: &JobState,
        forwarding: Option<ForwardSummary>,
    ) -> JobManifest {
        let progress = state.progress();
        let mut results = progress.results.clone();
        results.sort_by_key(|r| r.task.index);
        let mut errors = progress.errors.clone();
        errors.sort_by_key(|e| e.task.index);
        JobManifest {
            job_id: state.id,
            status: progress.status,
            request: state.request.clone(),
            config: (*self.config).clone(),
            started_at: state.started_at,
            finished_at: progress.finished_at.unwrap_or_else(chrono::Utc::now),
            duration_ms: progress.duration_ms.unwrap_or_default(),
            total_images: state.tasks.len(),
            completed: progress.completed,
            failed: progress.failed,
            results,
            errors,
            forwarding,
        }
    }
}
