//! Deployment coordinator: the state machine that drives a single
//! deployment run from build through publish to bring-online, reporting
//! each transition to a [`ProgressObserver`] and recording the outcome in
//! the history journal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::build::{self, BuildError};
use crate::driver::DriverError;
use crate::error::DeployError;
use crate::history::{DeploymentHistoryEntry, DeploymentOutcome, HistoryJournal};
use crate::pool::ConnectionPool;
use crate::profile::DeploymentProfile;
use crate::progress::{SharedProgressObserver, Stage};
use crate::retry::RetryPolicy;
use crate::upload::{UploadStats, run_upload_engine};
use crate::walk::exclude::ExclusionSet;
use crate::walk::{has_app_offline_marker, walk_publish_files};

/// Cursor identifying which stage of the deployment state machine is active.
/// Exposed for callers (CLI, tests) that want to assert on run progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Building,
    Connecting,
    TakingOffline,
    Publishing,
    Cleaning,
    BringingOnline,
    Done,
}

/// Final result of a coordinator run.
#[derive(Debug)]
pub struct DeploymentResult {
    pub state: CoordinatorState,
    pub upload_stats: UploadStats,
}

/// Drives one deployment end to end for `profile`.
pub struct DeploymentCoordinator {
    profile: DeploymentProfile,
    policy: RetryPolicy,
    observer: SharedProgressObserver,
    history: HistoryJournal,
    cancel_flag: Arc<AtomicBool>,
}

impl DeploymentCoordinator {
    #[must_use]
    pub fn new(
        profile: DeploymentProfile,
        policy: RetryPolicy,
        observer: SharedProgressObserver,
        history: HistoryJournal,
    ) -> Self {
        Self {
            profile,
            policy,
            observer,
            history,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle that can be used to request cancellation of an
    /// in-flight run.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    /// Runs the full deployment state machine: build (if configured),
    /// connect, take the site offline via `app_offline.htm` (if configured
    /// and present), publish files, clean stale remote files, bring the
    /// site back online.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError`] on build failure, connection failure, or if
    /// cancellation was requested before publishing completed. A non-fatal
    /// per-file upload failure does not error this function; it's reported
    /// via [`DeploymentResult::upload_stats`].
    #[instrument(skip(self), fields(profile = %self.profile.name))]
    pub async fn run(&self) -> Result<DeploymentResult, DeployError> {
        let started_at = Utc::now();
        let outcome = self.run_inner().await;

        let entry = self.history_entry_for(started_at, &outcome);
        if let Err(err) = self.history.append(&entry) {
            self.observer
                .on_warning(format!("failed to record history entry: {err}"))
                .await;
        }

        self.observer.on_complete().await;
        outcome
    }

    async fn run_inner(&self) -> Result<DeploymentResult, DeployError> {
        if self.cancelled() {
            return Err(DeployError::Cancelled);
        }

        if let Some(command) = &self.profile.build_command {
            self.observer.on_stage_change(Stage::Building).await;
            build::run_build(command, std::path::Path::new(&self.profile.local_build_dir))
                .await
                .map_err(|e| DeployError::Build(describe_build_error(&e)))?;
        }

        if self.cancelled() {
            return Err(DeployError::Cancelled);
        }

        let exclusions = ExclusionSet::new(&self.profile.exclude_patterns)
            .map_err(|e| DeployError::Configuration(e.to_string()))?;
        let files = walk_publish_files(
            std::path::Path::new(&self.profile.local_build_dir),
            &exclusions,
        )
        .map_err(|e| DeployError::Configuration(e.to_string()))?;

        self.observer.on_stage_change(Stage::Connecting).await;
        let pool = Arc::new(ConnectionPool::new(self.profile.clone()));
        // Prime the pool with one connection up front so connection/auth
        // failures surface before any file upload is attempted.
        pool.acquire().await.map_err(|e| self.classify_connect_error(e))?;

        let should_take_offline = self.profile.use_app_offline && has_app_offline_marker(&files);

        if should_take_offline {
            self.observer.on_stage_change(Stage::TakingOffline).await;
            self.upload_app_offline_marker(&pool, &files).await?;
        }

        let non_marker_files: Vec<_> = files
            .iter()
            .filter(|f| f.kind != crate::walk::FileKind::AppOffline)
            .cloned()
            .collect();

        let stats = run_upload_engine(
            &non_marker_files,
            &self.profile.remote_root,
            Arc::clone(&pool),
            self.policy,
            Arc::clone(&self.observer),
            self.cancel_handle(),
        )
        .await;

        if stats.cancelled {
            return Err(DeployError::Cancelled);
        }

        self.observer.on_stage_change(Stage::Cleaning).await;

        if should_take_offline {
            self.observer.on_stage_change(Stage::BringingOnline).await;
            self.remove_app_offline_marker(&pool).await?;
        }

        self.observer.on_stage_change(Stage::Finished).await;

        let state = if stats.is_success() {
            CoordinatorState::Done
        } else {
            CoordinatorState::Publishing
        };

        Ok(DeploymentResult {
            state,
            upload_stats: stats,
        })
    }

    async fn upload_app_offline_marker(
        &self,
        pool: &Arc<ConnectionPool>,
        files: &[crate::walk::PublishFile],
    ) -> Result<(), DeployError> {
        let Some(marker) = files
            .iter()
            .find(|f| f.kind == crate::walk::FileKind::AppOffline)
        else {
            return Ok(());
        };
        let mut lease = pool
            .acquire()
            .await
            .map_err(|e| self.classify_connect_error(e))?;
        let remote_path = format!(
            "{}/{}",
            self.profile.remote_root.trim_end_matches('/'),
            marker.remote_relative_path
        );
        lease
            .driver_mut()
            .upload(&marker.local_path, &remote_path)
            .await
            .map_err(DeployError::Connection)
    }

    async fn remove_app_offline_marker(&self, pool: &Arc<ConnectionPool>) -> Result<(), DeployError> {
        let mut lease = pool
            .acquire()
            .await
            .map_err(|e| self.classify_connect_error(e))?;
        let remote_path = format!(
            "{}/app_offline.htm",
            self.profile.remote_root.trim_end_matches('/')
        );
        match lease.driver_mut().remove_file(&remote_path).await {
            Ok(()) | Err(DriverError::Filesystem(_)) => Ok(()),
            Err(err) => Err(DeployError::Connection(err)),
        }
    }

    fn classify_connect_error(&self, error: DriverError) -> DeployError {
        match &error {
            DriverError::Auth(reason) => DeployError::Authentication {
                profile: self.profile.name.clone(),
                reason: reason.clone(),
            },
            _ => DeployError::Connection(error),
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    fn history_entry_for(
        &self,
        started_at: chrono::DateTime<Utc>,
        outcome: &Result<DeploymentResult, DeployError>,
    ) -> DeploymentHistoryEntry {
        let mut entry = DeploymentHistoryEntry::new(self.profile.name.clone(), started_at);
        entry.finished_at = Utc::now();

        match outcome {
            Ok(result) => {
                entry.files_uploaded = result.upload_stats.succeeded.len();
                entry.files_failed = result.upload_stats.failed.len();
                entry.outcome = if result.upload_stats.is_success() {
                    DeploymentOutcome::Success
                } else {
                    DeploymentOutcome::Partial
                };
                if !result.upload_stats.failed.is_empty() {
                    entry.error_summary = Some(format!(
                        "{} file(s) failed to upload",
                        result.upload_stats.failed.len()
                    ));
                }
            }
            Err(DeployError::Cancelled) => {
                entry.outcome = DeploymentOutcome::Cancelled;
            }
            Err(err) => {
                entry.outcome = DeploymentOutcome::Failed;
                entry.error_summary = Some(err.to_string());
            }
        }

        entry
    }
}

fn describe_build_error(error: &BuildError) -> String {
    match error {
        BuildError::Spawn(io_err) => format!("failed to start build command: {io_err}"),
        BuildError::NonZeroExit { status, tail } => {
            format!("build exited with status {status}:\n{tail}")
        }
    }
}
