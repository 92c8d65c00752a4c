// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hand-off of finished mockups to an external queueing collaborator.
//
// Every item is forwarded on its own task under a timeout. Outcomes come
// back over a completion channel, which the job drains before it is
// finalized. Forwarding failures are logged and counted; they never change
// a job's status.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use wallframe_core::error::{Result, WallframeError};
use wallframe_core::types::JobId;

/// One finished output offered to the external queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardItem {
    pub job_id: JobId,
    pub output_path: PathBuf,
    pub photo_path: PathBuf,
    pub template_id: String,
    pub platform: String,
}

/// The external queueing collaborator.
pub trait OutputForwarder: Send + Sync {
    fn forward(&self, item: ForwardItem) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Forwarding outcome counts, recorded in the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardSummary {
    pub sent: usize,
    pub failed: usize,
    pub timed_out: usize,
}

/// Forward every item concurrently, each bounded by `timeout`, and wait for
/// all outcomes.
#[instrument(skip(forwarder, items), fields(items = items.len()))]
pub async fn forward_outputs(
    forwarder: Arc<dyn OutputForwarder>,
    items: Vec<ForwardItem>,
    timeout: Duration,
) -> ForwardSummary {
    let expected = items.len();
    let (tx, mut rx) = mpsc::channel::<Result<()>>(expected.max(1));

    for item in items {
        let forwarder = Arc::clone(&forwarder);
        let tx = tx.clone();
        tokio::spawn(async move {
            let label = item.output_path.display().to_string();
            let outcome = match tokio::time::timeout(timeout, forwarder.forward(item)).await {
                Ok(result) => result,
                Err(_) => Err(WallframeError::ForwardingTimeout {
                    item: label,
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };
            // The receiver outlives every sender; a failed send means the
            // job was dropped mid-forward.
            let _ = tx.send(outcome).await;
        });
    }
    drop(tx);

    let mut summary = ForwardSummary::default();
    while let Some(outcome) = rx.recv().await {
        match outcome {
            Ok(()) => summary.sent += 1,
            Err(err @ WallframeError::ForwardingTimeout { .. }) => {
                warn!(error = %err, "forwarding timed out");
                summary.timed_out += 1;
            }
            Err(err) => {
                warn!(error = %err, "forwarding failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        sent = summary.sent,
        failed = summary.failed,
        timed_out = summary.timed_out,
        "forwarding finished"
    );
    summary
}

/// Copies each output into a spool directory watched by the external agent.
#[derive(Debug, Clone)]
pub struct SpoolDirForwarder {
    dir: PathBuf,
}

impl SpoolDirForwarder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn spool(&self, item: ForwardItem) -> Result<()> {
        let name = item.output_path.file_name().ok_or_else(|| {
            WallframeError::Forwarding(format!(
                "output path has no file name: {}",
                item.output_path.display()
            ))
        })?;
        let job_dir = self.dir.join(item.job_id.to_string());
        tokio::fs::create_dir_all(&job_dir).await?;
        let target = job_dir.join(name);
        tokio::fs::copy(&item.output_path, &target).await?;
        debug!(target = %target.display(), "output spooled");
        Ok(())
    }
}

impl OutputForwarder for SpoolDirForwarder {
    fn forward(&self, item: ForwardItem) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.spool(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Slow(Duration);

    impl OutputForwarder for Slow {
        fn forward(
            &self,
            _item: ForwardItem,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            let delay = self.0;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(())
            })
        }
    }

    struct Flaky(AtomicUsize);

    impl OutputForwarder for Flaky {
        fn forward(
            &self,
            _item: ForwardItem,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n % 2 == 0 {
                    Ok(())
                } else {
                    Err(WallframeError::Forwarding("queue rejected item".into()))
                }
            })
        }
    }

    fn item(path: impl Into<PathBuf>) -> ForwardItem {
        ForwardItem {
            job_id: JobId::new(),
            output_path: path.into(),
            photo_path: "art.jpg".into(),
            template_id: "loft".into(),
            platform: "web".into(),
        }
    }

    #[tokio::test]
    async fn timeouts_are_counted_not_fatal() {
        let summary = forward_outputs(
            Arc::new(Slow(Duration::from_secs(30))),
            vec![item("a.jpg"), item("b.jpg")],
            Duration::from_millis(20),
        )
        .await;
        assert_eq!(
            summary,
            ForwardSummary {
                sent: 0,
                failed: 0,
                timed_out: 2
            }
        );
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let summary = forward_outputs(
            Arc::new(Flaky(AtomicUsize::new(0))),
            (0..4).map(|i| item(format!("{i}.jpg"))).collect(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!((summary.sent, summary.failed), (2, 2));
    }

    #[tokio::test]
    async fn empty_batch_finishes_immediately() {
        let summary =
            forward_outputs(Arc::new(Slow(Duration::ZERO)), vec![], Duration::from_secs(1)).await;
        assert_eq!(summary, ForwardSummary::default());
    }

    #[tokio::test]
    async fn spool_dir_copies_outputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("0000_art_loft_web.jpg");
        std::fs::write(&output, b"jpeg").expect("write");
        let spool = dir.path().join("spool");
        let forwarder = SpoolDirForwarder::new(&spool);

        let it = item(&output);
        let job = it.job_id;
        forwarder.forward(it).await.expect("forward");
        let copied = spool.join(job.to_string()).join("0000_art_loft_web.jpg");
        assert_eq!(std::fs::read(copied).expect("read"), b"jpeg");

        let err = forwarder
            .forward(item(dir.path().join("missing.jpg")))
            .await
            .err()
            .expect("error");
        assert!(matches!(err, WallframeError::Io(_)));
    }
}
