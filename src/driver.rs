//! Runs reconciliation cycles and remembers what the last one saw.
//!
//! Cycles can be triggered by the HTTP API, by the periodic timer and by
//! device events. Only one runs at a time: the previous snapshot sits
//! behind an async mutex that is held for the whole cycle.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use togglboard_core::{
    sync, DeviceAdapter, ObservedState, ParticleClient, PositionTable, SyncError, TrackerAdapter,
};

/// Wait before reconnecting to the device event stream.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Summary of recent cycles, for the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriverStatus {
    /// Completed cycles, successful or not
    pub cycles: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    /// Snapshot the next cycle will compare against
    pub previous: Option<ObservedState>,
}

pub struct Driver {
    tracker: Arc<dyn TrackerAdapter>,
    device: Arc<dyn DeviceAdapter>,
    table: PositionTable,
    previous: Mutex<Option<ObservedState>>,
    status: RwLock<DriverStatus>,
}

impl Driver {
    pub fn new(
        tracker: Arc<dyn TrackerAdapter>,
        device: Arc<dyn DeviceAdapter>,
        table: PositionTable,
    ) -> Self {
        Self {
            tracker,
            device,
            table,
            previous: Mutex::new(None),
            status: RwLock::new(DriverStatus::default()),
        }
    }

    /// Runs a cycle, waiting for any cycle already in flight to finish.
    pub async fn run_cycle(&self) -> Result<ObservedState, SyncError> {
        let mut previous = self.previous.lock().await;
        self.cycle(&mut previous).await
    }

    /// Runs a cycle unless one is already in flight.
    ///
    /// Returns `None` when the trigger was dropped.
    pub async fn try_run_cycle(&self) -> Option<Result<ObservedState, SyncError>> {
        let Ok(mut previous) = self.previous.try_lock() else {
            tracing::debug!("sync already in progress, skipping");
            return None;
        };
        Some(self.cycle(&mut previous).await)
    }

    async fn cycle(&self, previous: &mut Option<ObservedState>) -> Result<ObservedState, SyncError> {
        let result = sync(
            previous.as_ref(),
            self.tracker.as_ref(),
            self.device.as_ref(),
            &self.table,
        )
        .await;

        // Any failure forgets the previous snapshot so the next cycle
        // bootstraps from the tracker.
        *previous = result.as_ref().ok().cloned();

        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        status.cycles += 1;
        status.previous = previous.clone();
        match &result {
            Ok(state) => {
                status.last_success_at = Some(Utc::now());
                tracing::debug!(?state, "sync success");
            }
            Err(e) => {
                status.last_error = Some(e.to_string());
                status.last_error_at = Some(Utc::now());
                tracing::warn!("sync error: {}", e);
            }
        }

        result
    }

    pub fn status(&self) -> DriverStatus {
        self.status
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Runs a cycle every `period` until shutdown.
    ///
    /// Ticks that land while a cycle is still running are dropped.
    pub fn spawn_timer(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await; // consume the first immediate tick

            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = interval.tick() => {
                        let _ = self.try_run_cycle().await;
                    }
                }
            }
            tracing::debug!("sync timer stopped");
        })
    }

    /// Runs a cycle whenever the device reports a position change or comes
    /// online. Reconnects when the event stream drops.
    pub fn spawn_event_listener(
        self: Arc<Self>,
        particle: ParticleClient,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            'connect: loop {
                match particle.subscribe().await {
                    Ok(mut events) => {
                        tracing::info!("Subscribed to events from {}", particle.device_name());
                        loop {
                            tokio::select! {
                                _ = shutdown.recv() => break 'connect,
                                event = events.next() => match event {
                                    Some(Ok(event)) if event.is_trigger() => {
                                        tracing::debug!(event = %event.name, "device event");
                                        let _ = self.try_run_cycle().await;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        tracing::warn!("Device event stream failed: {}", e);
                                        break;
                                    }
                                    None => {
                                        tracing::debug!("Device event stream closed");
                                        break;
                                    }
                                },
                            }
                        }
                    }
                    Err(e) => tracing::warn!("Failed to subscribe to device events: {}", e),
                }

                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
            tracing::debug!("device event listener stopped");
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use togglboard_core::{AdapterError, DeviceState, ProjectId, TrackerState};
    use tokio::sync::Notify;

    /// Tracker fake; optionally parks inside `get_current_state` until released.
    #[derive(Default)]
    pub(crate) struct FakeTracker {
        pub state: std::sync::Mutex<TrackerState>,
        pub writes: std::sync::Mutex<Vec<Option<ProjectId>>>,
        pub fail: std::sync::atomic::AtomicBool,
        pub gated: bool,
        pub entered: Notify,
        pub release: Notify,
    }

    #[async_trait]
    impl TrackerAdapter for FakeTracker {
        async fn get_current_state(&self) -> Result<TrackerState, AdapterError> {
            if self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(AdapterError::Unreachable(
                    "Connection to Toggl API failed!".to_string(),
                ));
            }
            Ok(self.state.lock().unwrap().clone())
        }

        async fn set_current_state(
            &self,
            project: Option<ProjectId>,
        ) -> Result<TrackerState, AdapterError> {
            self.writes.lock().unwrap().push(project);
            let state = project
                .map(TrackerState::with_project)
                .unwrap_or_else(TrackerState::idle);
            *self.state.lock().unwrap() = state.clone();
            Ok(state)
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeDevice {
        pub state: std::sync::Mutex<DeviceState>,
        pub writes: std::sync::Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl DeviceAdapter for FakeDevice {
        async fn get_current_state(&self) -> Result<DeviceState, AdapterError> {
            Ok(self.state.lock().unwrap().clone())
        }

        async fn set_current_state(&self, position: usize) -> Result<DeviceState, AdapterError> {
            self.writes.lock().unwrap().push(position);
            let state = DeviceState::at(position as i32);
            *self.state.lock().unwrap() = state.clone();
            Ok(state)
        }
    }

    pub(crate) fn table() -> PositionTable {
        [1000u64, 2000, 3000, 4000, 5000, 6000, 7000]
            .into_iter()
            .collect()
    }

    pub(crate) fn fakes(project: Option<u64>, position: i32) -> (Arc<FakeTracker>, Arc<FakeDevice>) {
        let tracker = FakeTracker {
            state: std::sync::Mutex::new(TrackerState {
                project_id: project.map(ProjectId),
                ..TrackerState::default()
            }),
            ..FakeTracker::default()
        };
        let device = FakeDevice {
            state: std::sync::Mutex::new(DeviceState::at(position)),
            ..FakeDevice::default()
        };
        (Arc::new(tracker), Arc::new(device))
    }

    #[tokio::test]
    async fn test_success_keeps_observed_state() {
        let (tracker, device) = fakes(Some(2000), 2);
        let driver = Driver::new(tracker, device, table());

        let observed = driver.run_cycle().await.unwrap();

        let status = driver.status();
        assert_eq!(status.cycles, 1);
        assert_eq!(status.previous, Some(observed));
        assert!(status.last_success_at.is_some());
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_previous_state_drives_next_cycle() {
        let (tracker, device) = fakes(Some(1000), 1);
        let driver = Driver::new(tracker.clone(), device.clone(), table());

        driver.run_cycle().await.unwrap();
        *device.state.lock().unwrap() = DeviceState::at(7);
        driver.run_cycle().await.unwrap();

        // The board moved since the last cycle, so Toggl follows it
        assert_eq!(*tracker.writes.lock().unwrap(), vec![Some(ProjectId(7000))]);
        assert!(device.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_resets_to_bootstrap() {
        let (tracker, device) = fakes(Some(1000), 1);
        let driver = Driver::new(tracker.clone(), device.clone(), table());

        driver.run_cycle().await.unwrap();
        tracker.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(driver.run_cycle().await.is_err());

        let status = driver.status();
        assert!(status.previous.is_none());
        assert_eq!(
            status.last_error.as_deref(),
            Some("tracker: Connection to Toggl API failed!")
        );

        // With no previous snapshot the board change is overridden by Toggl
        tracker.fail.store(false, std::sync::atomic::Ordering::SeqCst);
        *device.state.lock().unwrap() = DeviceState::at(7);
        driver.run_cycle().await.unwrap();
        assert_eq!(*device.writes.lock().unwrap(), vec![1]);
        assert!(tracker.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_dropped() {
        let tracker = Arc::new(FakeTracker {
            gated: true,
            ..FakeTracker::default()
        });
        let device = Arc::new(FakeDevice::default());
        *device.state.lock().unwrap() = DeviceState::at(0);
        let driver = Arc::new(Driver::new(tracker.clone(), device, table()));

        let running = {
            let driver = driver.clone();
            tokio::spawn(async move { driver.run_cycle().await })
        };
        tracker.entered.notified().await;

        assert!(driver.try_run_cycle().await.is_none());

        tracker.release.notify_one();
        running.await.unwrap().unwrap();
        assert_eq!(driver.status().cycles, 1);
    }

    #[tokio::test]
    async fn test_timer_runs_cycles_until_shutdown() {
        let (tracker, device) = fakes(None, 0);
        let driver = Arc::new(Driver::new(tracker, device, table()));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = driver
            .clone()
            .spawn_timer(Duration::from_millis(10), shutdown_rx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(driver.status().cycles >= 1);
    }
}
