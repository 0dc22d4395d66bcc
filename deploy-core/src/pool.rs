//! Connection pool: a fixed-size set of [`Driver`] connections leased out to
//! concurrent upload tasks, gated by a semaphore so the pool never exceeds
//! `profile.pool_size` concurrent remote connections.

use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore, SemaphorePermit};

use crate::driver::{Driver, DriverError, build_driver};
use crate::profile::DeploymentProfile;

/// A leased connection. Dropping it releases the semaphore permit and
/// returns the driver to the pool, unless [`ConnectionLease::mark_unhealthy`]
/// was called, in which case the connection is discarded and replaced with a
/// fresh one on the next lease.
pub struct ConnectionLease<'pool> {
    driver: Option<Box<dyn Driver>>,
    slot: &'pool Mutex<Option<Box<dyn Driver>>>,
    unhealthy: bool,
    _permit: SemaphorePermit<'pool>,
}

impl<'pool> ConnectionLease<'pool> {
    #[must_use]
    pub fn driver_mut(&mut self) -> &mut (dyn Driver + 'static) {
        self.driver
            .as_deref_mut()
            .expect("driver is present for the lease's lifetime")
    }

    /// Marks the leased connection as unhealthy: it will be dropped instead
    /// of returned to the pool, and a fresh connection will be opened on the
    /// next lease from this slot.
    pub fn mark_unhealthy(&mut self) {
        self.unhealthy = true;
    }
}

impl Drop for ConnectionLease<'_> {
    fn drop(&mut self) {
        if self.unhealthy {
            return;
        }
        if let Some(driver) = self.driver.take()
            && let Ok(mut guard) = self.slot.try_lock()
        {
            *guard = Some(driver);
        }
    }
}

/// Pool of up to `profile.pool_size` concurrent connections to the same
/// deployment target.
pub struct ConnectionPool {
    profile: DeploymentProfile,
    semaphore: Arc<Semaphore>,
    slots: Vec<Mutex<Option<Box<dyn Driver>>>>,
}

impl ConnectionPool {
    #[must_use]
    pub fn new(profile: DeploymentProfile) -> Self {
        let size = profile.pool_size.max(1);
        let mut slots = Vec::with_capacity(size);
        for _ in 0..size {
            slots.push(Mutex::new(None));
        }
        Self {
            profile,
            semaphore: Arc::new(Semaphore::new(size)),
            slots,
        }
    }

    /// Acquires a connection, opening a new one if the slot is empty or was
    /// previously marked unhealthy.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if establishing a fresh connection fails.
    pub async fn acquire(&self) -> Result<ConnectionLease<'_>, DriverError> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("pool semaphore is never closed");

        let slot = self.free_slot();
        let mut guard = slot.lock().await;
        let mut driver = match guard.take() {
            Some(driver) if driver.is_connected() => driver,
            _ => {
                let mut fresh = build_driver(&self.profile);
                fresh.connect().await?;
                fresh
            }
        };
        drop(guard);

        if !driver.is_connected() {
            driver.connect().await?;
        }

        Ok(ConnectionLease {
            driver: Some(driver),
            slot,
            unhealthy: false,
            _permit: permit,
        })
    }

    /// Returns a slot not currently locked by another lease. One is
    /// guaranteed to exist because the semaphore bounds concurrent holders
    /// to `slots.len()`.
    fn free_slot(&self) -> &Mutex<Option<Box<dyn Driver>>> {
        self.slots
            .iter()
            .find(|slot| slot.try_lock().is_ok())
            .unwrap_or(&self.slots[0])
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Protocol;

    fn sample_profile(pool_size: usize) -> DeploymentProfile {
        DeploymentProfile {
            name: "staging".to_string(),
            host: "ftp.example.com".to_string(),
            port: None,
            protocol: Protocol::Ftp,
            username: "deployer".to_string(),
            remote_root: "/var/www".to_string(),
            local_build_dir: "dist".to_string(),
            build_command: None,
            exclude_patterns: Vec::new(),
            pool_size,
            use_app_offline: true,
        }
    }

    #[test]
    fn test_pool_size_is_at_least_one() {
        let pool = ConnectionPool::new(sample_profile(0));
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_pool_size_matches_profile() {
        let pool = ConnectionPool::new(sample_profile(6));
        assert_eq!(pool.size(), 6);
    }
}
