//! Connector watchdog
//!
//! Polls the connector status on an interval and heals what it can: a missing
//! connector is registered again, a failed one is restarted. Registration
//! exhaustion at startup is therefore not permanent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::status::ConnectorStatus;
use crate::traits::{ConnectorControl, RegisterResponse};

/// Default interval between checks
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(15);

/// What the watchdog does about an observed status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogAction {
    /// Healthy or transitional; leave it alone
    Nothing,
    /// Not registered; register once
    Register,
    /// Failed; restart
    Restart,
    /// REST API unreachable or erroring; try again next tick
    Wait,
}

/// Decide the action for a status
pub fn decide(status: &ConnectorStatus) -> WatchdogAction {
    match status {
        ConnectorStatus::Missing => WatchdogAction::Register,
        ConnectorStatus::Failed { .. } => WatchdogAction::Restart,
        ConnectorStatus::Unreachable(_) | ConnectorStatus::Error(_) => WatchdogAction::Wait,
        ConnectorStatus::Running
        | ConnectorStatus::Paused
        | ConnectorStatus::Unassigned
        | ConnectorStatus::Other(_) => WatchdogAction::Nothing,
    }
}

/// Watchdog counters
#[derive(Debug, Default)]
pub struct WatchdogMetrics {
    checks: AtomicU64,
    heals: AtomicU64,
    heal_failures: AtomicU64,
}

impl WatchdogMetrics {
    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    /// Successful re-registrations and restarts
    pub fn heals(&self) -> u64 {
        self.heals.load(Ordering::Relaxed)
    }

    pub fn heal_failures(&self) -> u64 {
        self.heal_failures.load(Ordering::Relaxed)
    }
}

/// Periodic connector supervisor
pub struct ConnectorWatchdog<C> {
    control: C,
    interval: Duration,
    metrics: Arc<WatchdogMetrics>,
}

impl<C: ConnectorControl> ConnectorWatchdog<C> {
    pub fn new(control: C, interval: Duration) -> Self {
        Self {
            control,
            interval,
            metrics: Arc::new(WatchdogMetrics::default()),
        }
    }

    /// Underlying connector control
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Shared handle to the counters
    pub fn metrics(&self) -> Arc<WatchdogMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run one check and apply the resulting action
    pub async fn check_once(&self) -> WatchdogAction {
        let name = self.control.name();
        let status = self.control.status().await;
        self.metrics.checks.fetch_add(1, Ordering::Relaxed);

        let action = decide(&status);
        match action {
            WatchdogAction::Nothing => {
                debug!(connector = %name, status = %status, "connector healthy");
            }
            WatchdogAction::Wait => {
                warn!(connector = %name, status = ?status, "connector API unavailable, waiting");
            }
            WatchdogAction::Register => {
                warn!(connector = %name, "connector missing, registering");
                match self.control.register().await {
                    Ok(response) => {
                        self.metrics.heals.fetch_add(1, Ordering::Relaxed);
                        let existed = response == RegisterResponse::AlreadyExists;
                        info!(connector = %name, existed, "connector re-registered");
                    }
                    Err(e) => {
                        self.metrics.heal_failures.fetch_add(1, Ordering::Relaxed);
                        error!(connector = %name, error = %e, "connector re-registration failed");
                    }
                }
            }
            WatchdogAction::Restart => {
                if let ConnectorStatus::Failed { trace } = &status {
                    warn!(connector = %name, trace = %trace, "connector failed, restarting");
                }
                match self.control.restart().await {
                    Ok(()) => {
                        self.metrics.heals.fetch_add(1, Ordering::Relaxed);
                        info!(connector = %name, "connector restarted");
                    }
                    Err(e) => {
                        self.metrics.heal_failures.fetch_add(1, Ordering::Relaxed);
                        error!(connector = %name, error = %e, "connector restart failed");
                    }
                }
            }
        }
        action
    }

    /// Check every `interval` until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            connector = %self.control.name(),
            interval_secs = self.interval.as_secs_f64(),
            "connector watchdog started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; registration just ran
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.check_once().await;
                }
            }
        }

        info!(
            connector = %self.control.name(),
            checks = self.metrics.checks(),
            heals = self.metrics.heals(),
            "connector watchdog stopped"
        );
    }
}
