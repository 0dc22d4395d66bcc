//! A single file upload, including its own retry loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::driver::{Driver, DriverError};
use crate::retry::{RetryPolicy, classify_error};
use crate::walk::PublishFile;

/// Outcome of uploading a single [`PublishFile`].
#[derive(Debug)]
pub enum TaskOutcome {
    Success,
    Failed { error: String },
    Cancelled,
}

/// Uploads `file` via `driver`, retrying transient failures per `policy`.
/// Checks `cancel_flag` between attempts so an in-flight retry backoff can be
/// interrupted promptly.
#[instrument(skip(driver, policy, cancel_flag), fields(remote = %file.remote_relative_path))]
pub async fn run_upload_task(
    driver: &mut dyn Driver,
    file: &PublishFile,
    remote_root: &str,
    policy: &RetryPolicy,
    cancel_flag: &Arc<AtomicBool>,
) -> TaskOutcome {
    let remote_path = format!(
        "{}/{}",
        remote_root.trim_end_matches('/'),
        file.remote_relative_path
    );

    let mut attempt: u32 = 1;
    loop {
        if cancel_flag.load(Ordering::Relaxed) {
            return TaskOutcome::Cancelled;
        }

        match driver.upload(&file.local_path, &remote_path).await {
            Ok(()) => return TaskOutcome::Success,
            Err(err) => {
                let failure_type = classify_error(&err.message());
                match policy.decide(attempt, failure_type) {
                    crate::retry::RetryDecision::Retry { attempt: next } => {
                        warn!(attempt, error = %err, "upload attempt failed, retrying");
                        let delay = policy.delay_for(next);
                        tokio::select! {
                            () = tokio::time::sleep(delay) => {}
                            () = wait_for_cancel(cancel_flag) => return TaskOutcome::Cancelled,
                        }
                        attempt = next;
                    }
                    crate::retry::RetryDecision::GiveUp => {
                        return TaskOutcome::Failed {
                            error: describe_failure(&err),
                        };
                    }
                }
            }
        }
    }
}

async fn wait_for_cancel(cancel_flag: &Arc<AtomicBool>) {
    loop {
        if cancel_flag.load(Ordering::Relaxed) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

fn describe_failure(err: &DriverError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::driver::RemoteEntry;
    use crate::walk::FileKind;

    struct FlakyDriver {
        failures_remaining: Mutex<u32>,
        fail_message: String,
    }

    #[async_trait]
    impl Driver for FlakyDriver {
        async fn connect(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
        async fn disconnect(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
        fn is_connected(&self) -> bool {
            true
        }
        async fn upload(&mut self, _local: &Path, _remote: &str) -> Result<(), DriverError> {
            let mut remaining = self.failures_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::Transfer(self.fail_message.clone()));
            }
            Ok(())
        }
        async fn remove_file(&mut self, _remote: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn make_dir_all(&mut self, _remote: &str) -> Result<(), DriverError> {
            Ok(())
        }
        async fn list_dir(&mut self, _remote: &str) -> Result<Vec<RemoteEntry>, DriverError> {
            Ok(Vec::new())
        }
        async fn rename(&mut self, _from: &str, _to: &str) -> Result<(), DriverError> {
            Ok(())
        }
    }

    fn sample_file() -> PublishFile {
        PublishFile {
            local_path: PathBuf::from("dist/app.js"),
            remote_relative_path: "app.js".to_string(),
            size: 100,
            kind: FileKind::Regular,
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            initial_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(5),
            multiplier: 1.0,
            jitter_ratio: 0.0,
        }
    }

    #[tokio::test]
    async fn test_upload_succeeds_after_transient_failures() {
        let mut driver = FlakyDriver {
            failures_remaining: Mutex::new(2),
            fail_message: "connection reset".to_string(),
        };
        let cancel = Arc::new(AtomicBool::new(false));
        let outcome = run_upload_task(&mut driver, &sample_file(), "/var/www", &fast_policy(), &cancel).await;
        assert!(matches!(outcome, TaskOutcome::Success));
    }

    #[tokio::test]
    async fn test_upload_gives_up_on_permanent_failure() {
        let mut driver = FlakyDriver {
            failures_remaining: Mutex::new(99),
            fail_message: "550 permission denied for path".to_string(),
        };
        let cancel = Arc::new(AtomicBool::new(false));
        let outcome = run_upload_task(&mut driver, &sample_file(), "/var/www", &fast_policy(), &cancel).await;
        assert!(matches!(outcome, TaskOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_upload_respects_cancel_flag_before_starting() {
        let mut driver = FlakyDriver {
            failures_remaining: Mutex::new(0),
            fail_message: String::new(),
        };
        let cancel = Arc::new(AtomicBool::new(true));
        let outcome = run_upload_task(&mut driver, &sample_file(), "/var/www", &fast_policy(), &cancel).await;
        assert!(matches!(outcome, TaskOutcome::Cancelled));
    }
}
