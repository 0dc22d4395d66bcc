//! Progress bus: an observer interface the coordinator and upload engine
//! report to, decoupling the deployment state machine from any particular
//! presentation (CLI progress bars, logs, a future GUI).

use std::sync::Arc;

use async_trait::async_trait;

/// Stage of a deployment run, reported via [`ProgressObserver::on_stage_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Building,
    TakingOffline,
    Connecting,
    Publishing,
    Cleaning,
    BringingOnline,
    Finished,
}

/// An immutable snapshot of upload progress, safe to clone and hand to a
/// renderer without holding any lock on the engine's internal state.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub files_total: usize,
    pub files_completed: usize,
    pub bytes_total: u64,
    pub bytes_completed: u64,
    pub current_file: Option<String>,
}

/// Observer for deployment progress. Implementations must not block;
/// the coordinator and upload engine call these synchronously from async
/// contexts.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    async fn on_stage_change(&self, stage: Stage);
    async fn on_progress(&self, snapshot: ProgressSnapshot);
    async fn on_warning(&self, message: String);
    async fn on_error(&self, message: String);
    async fn on_complete(&self);
}

/// A [`ProgressObserver`] that discards every event, used when no caller is
/// listening (e.g. in tests or non-interactive contexts).
pub struct NullProgressObserver;

#[async_trait]
impl ProgressObserver for NullProgressObserver {
    async fn on_stage_change(&self, _stage: Stage) {}
    async fn on_progress(&self, _snapshot: ProgressSnapshot) {}
    async fn on_warning(&self, _message: String) {}
    async fn on_error(&self, _message: String) {}
    async fn on_complete(&self) {}
}

/// Shared handle to a progress observer, clonable across upload tasks.
pub type SharedProgressObserver = Arc<dyn ProgressObserver>;

#[must_use]
pub fn null_observer() -> SharedProgressObserver {
    Arc::new(NullProgressObserver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_observer_accepts_all_events_without_panicking() {
        let observer = null_observer();
        observer.on_stage_change(Stage::Publishing).await;
        observer
            .on_progress(ProgressSnapshot {
                files_total: 10,
                files_completed: 3,
                bytes_total: 1000,
                bytes_completed: 300,
                current_file: Some("app.js".to_string()),
            })
            .await;
        observer.on_warning("disk almost full".to_string()).await;
        observer.on_error("connection reset".to_string()).await;
        observer.on_complete().await;
    }
}
