//! Composes a [`DeploymentCoordinator`] run with a CLI progress observer and
//! ctrl-c cancellation.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use deploy_core::{
    DeployError, DeploymentCoordinator, DeploymentResult, ProgressObserver, ProgressSnapshot,
    RetryPolicy, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use super::context::RunContext;
use crate::cli::DeployArgs;

struct CliProgressObserver {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl CliProgressObserver {
    fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }
}

#[async_trait]
impl ProgressObserver for CliProgressObserver {
    async fn on_stage_change(&self, stage: Stage) {
        if self.quiet {
            return;
        }
        tracing::info!(?stage, "stage");
    }

    async fn on_progress(&self, snapshot: ProgressSnapshot) {
        if self.quiet {
            return;
        }
        let mut guard = self.bar.lock().await;
        let bar = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new(snapshot.files_total as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} files ({eta})",
            ) {
                bar.set_style(style);
            }
            bar
        });
        bar.set_position(snapshot.files_completed as u64);
        if let Some(current) = snapshot.current_file {
            bar.set_message(current);
        }
        if snapshot.files_completed == snapshot.files_total {
            bar.finish_and_clear();
        }
    }

    async fn on_warning(&self, message: String) {
        tracing::warn!("{message}");
    }

    async fn on_error(&self, message: String) {
        tracing::error!("{message}");
    }

    async fn on_complete(&self) {
        if let Some(bar) = self.bar.lock().await.take() {
            bar.finish_and_clear();
        }
    }
}

/// Runs the deploy subcommand: loads the named profile, builds a
/// coordinator, and races it against ctrl-c.
///
/// Returns `Ok(true)` if every file published successfully, `Ok(false)` if
/// the run completed but left files failed, or `Err` for build/connection/
/// authentication failures and cancellation.
pub(crate) async fn run_deploy(
    ctx: &RunContext,
    args: &DeployArgs,
) -> Result<bool, DeployError> {
    let mut profile = ctx.profiles.load(&args.profile)?;
    if args.skip_build {
        profile.build_command = None;
    }

    let policy = RetryPolicy {
        max_attempts: ctx.config.default_max_retries,
        ..RetryPolicy::default()
    };
    let observer = Arc::new(CliProgressObserver::new(ctx.quiet));
    let history = deploy_core::HistoryJournal::default_location()?;

    let coordinator = DeploymentCoordinator::new(profile, policy, observer, history);
    let cancel_flag = coordinator.cancel_handle();

    let run_future = coordinator.run();
    tokio::pin!(run_future);

    let result: Result<DeploymentResult, DeployError> = tokio::select! {
        result = &mut run_future => result,
        _ = tokio::signal::ctrl_c() => {
            cancel_flag.store(true, Ordering::Relaxed);
            run_future.await
        }
    };

    result.map(|r| r.upload_stats.is_success())
}
