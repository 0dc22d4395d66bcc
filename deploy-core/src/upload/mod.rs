//! Upload engine: pumps the publish file list through a bounded-concurrency
//! pool of connections, reporting progress and collecting per-file outcomes.

pub mod task;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument};

use crate::pool::ConnectionPool;
use crate::progress::{ProgressSnapshot, SharedProgressObserver, Stage};
use crate::retry::RetryPolicy;
use crate::walk::PublishFile;

use task::{TaskOutcome, run_upload_task};

/// Default number of files uploaded concurrently when a profile does not
/// override it via `pool_size`.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Result of running the upload engine over a full file set.
#[derive(Debug, Default)]
pub struct UploadStats {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub cancelled: bool,
}

impl UploadStats {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failed.is_empty()
    }
}

/// Uploads every file in `files` through `pool`, bounded by the pool's size,
/// retrying per `policy`, and reporting progress to `observer`.
///
/// # Errors
///
/// This function does not return an error directly; individual file
/// failures are accumulated into [`UploadStats::failed`] so that one bad
/// file does not abort the whole run.
#[instrument(skip(pool, policy, observer, cancel_flag, files), fields(file_count = files.len()))]
pub async fn run_upload_engine(
    files: &[PublishFile],
    remote_root: &str,
    pool: Arc<ConnectionPool>,
    policy: RetryPolicy,
    observer: SharedProgressObserver,
    cancel_flag: Arc<AtomicBool>,
) -> UploadStats {
    observer.on_stage_change(Stage::Publishing).await;

    let bytes_total: u64 = files.iter().map(|f| f.size).sum();
    let bytes_completed = Arc::new(AtomicU64::new(0));
    let files_completed = Arc::new(AtomicU64::new(0));
    let files_total = files.len();

    let concurrency = pool.size().max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));

    let mut handles = Vec::with_capacity(files.len());
    for file in files {
        let permit = Arc::clone(&semaphore);
        let pool = Arc::clone(&pool);
        let policy = policy;
        let observer = Arc::clone(&observer);
        let cancel_flag = Arc::clone(&cancel_flag);
        let remote_root = remote_root.to_string();
        let bytes_completed = Arc::clone(&bytes_completed);
        let files_completed = Arc::clone(&files_completed);
        let file = file.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit
                .acquire_owned()
                .await
                .expect("upload semaphore is never closed");

            if cancel_flag.load(Ordering::Relaxed) {
                return (file.remote_relative_path.clone(), TaskOutcome::Cancelled);
            }

            let mut lease = match pool.acquire().await {
                Ok(lease) => lease,
                Err(err) => {
                    return (
                        file.remote_relative_path.clone(),
                        TaskOutcome::Failed {
                            error: err.to_string(),
                        },
                    );
                }
            };

            let outcome = run_upload_task(
                lease.driver_mut(),
                &file,
                &remote_root,
                &policy,
                &cancel_flag,
            )
            .await;

            if matches!(outcome, TaskOutcome::Failed { .. }) {
                lease.mark_unhealthy();
            }

            if matches!(outcome, TaskOutcome::Success) {
                bytes_completed.fetch_add(file.size, Ordering::Relaxed);
            }
            files_completed.fetch_add(1, Ordering::Relaxed);

            observer
                .on_progress(ProgressSnapshot {
                    files_total,
                    files_completed: files_completed.load(Ordering::Relaxed) as usize,
                    bytes_total,
                    bytes_completed: bytes_completed.load(Ordering::Relaxed),
                    current_file: Some(file.remote_relative_path.clone()),
                })
                .await;

            (file.remote_relative_path.clone(), outcome)
        }));
    }

    let mut stats = UploadStats::default();
    for handle in handles {
        match handle.await {
            Ok((path, TaskOutcome::Success)) => stats.succeeded.push(path),
            Ok((path, TaskOutcome::Failed { error })) => stats.failed.push((path, error)),
            Ok((_, TaskOutcome::Cancelled)) => stats.cancelled = true,
            Err(join_error) => {
                observer
                    .on_warning(format!("upload task panicked: {join_error}"))
                    .await;
            }
        }
    }

    info!(
        succeeded = stats.succeeded.len(),
        failed = stats.failed.len(),
        cancelled = stats.cancelled,
        "upload engine finished"
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_stats_is_success_requires_no_failures_and_no_cancellation() {
        let mut stats = UploadStats::default();
        assert!(stats.is_success());

        stats.failed.push(("app.js".to_string(), "boom".to_string()));
        assert!(!stats.is_success());

        stats.failed.clear();
        stats.cancelled = true;
        assert!(!stats.is_success());
    }
}
