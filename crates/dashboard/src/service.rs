//! DashboardService - effective state and override requests

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use contracts::{OverridePolicy, OverrideValue, SensorName, Snapshot};
use ingestion::{SnapshotStore, StoreStatus};
use overrides::OverrideTable;
use relay::{CommandRelay, RelayMetricsSnapshot};
use tracing::{debug, info, instrument, warn};

use crate::error::DashboardError;

/// Everything the display needs for one refresh
#[derive(Debug)]
pub struct DisplayFrame {
    /// Effective state, or the reason it could not be read
    pub state: Result<Snapshot, DashboardError>,
    /// Active overrides in sensor order
    pub overrides: Vec<(SensorName, OverrideValue)>,
    /// Store health
    pub store: StoreStatus,
}

/// Point-in-time service status
#[derive(Debug, Clone)]
pub struct DashboardStatus {
    pub policy: OverridePolicy,
    pub store: StoreStatus,
    pub active_overrides: usize,
    pub relay: Option<RelayMetricsSnapshot>,
}

/// Query interface for the display layer
///
/// Reads never wait for producer data: before the first snapshot the default
/// snapshot is served. Override requests apply locally at once; with a relay
/// attached they are also forwarded, fire-and-forget.
pub struct DashboardService {
    store: Arc<SnapshotStore>,
    overrides: RwLock<OverrideTable>,
    relay: Option<CommandRelay>,
}

impl DashboardService {
    /// Overrides stay local
    pub fn local(store: Arc<SnapshotStore>) -> Self {
        Self {
            store,
            overrides: RwLock::new(OverrideTable::new()),
            relay: None,
        }
    }

    /// Overrides apply locally and are forwarded through `relay`
    pub fn forwarding(store: Arc<SnapshotStore>, relay: CommandRelay) -> Self {
        Self {
            store,
            overrides: RwLock::new(OverrideTable::new()),
            relay: Some(relay),
        }
    }

    /// Active policy, implied by whether a relay is attached
    pub fn policy(&self) -> OverridePolicy {
        if self.relay.is_some() {
            OverridePolicy::Forward
        } else {
            OverridePolicy::Local
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Latest snapshot with active overrides applied
    pub fn effective_state(&self) -> Result<Snapshot, DashboardError> {
        let snapshot = self.store.read();
        let table = self.read_table()?;
        Ok(table.apply(&snapshot))
    }

    /// Active overrides in sensor order
    pub fn overrides(&self) -> Result<Vec<(SensorName, OverrideValue)>, DashboardError> {
        Ok(self.read_table()?.iter().collect())
    }

    /// Gather one display refresh
    pub fn frame(&self) -> DisplayFrame {
        DisplayFrame {
            state: self.effective_state(),
            overrides: self.overrides().unwrap_or_default(),
            store: self.store.status(),
        }
    }

    /// Force `sensor` to `value`
    #[instrument(name = "dashboard_set_override", skip(self))]
    pub fn set_override(&self, sensor: SensorName, value: f64) -> Result<(), DashboardError> {
        self.set_override_value(sensor, OverrideValue::constant(value))
    }

    /// Keep `sensor` within `[min, max]` (bounds swapped if reversed)
    #[instrument(name = "dashboard_set_override_range", skip(self))]
    pub fn set_override_range(
        &self,
        sensor: SensorName,
        min: f64,
        max: f64,
    ) -> Result<(), DashboardError> {
        self.set_override_value(sensor, OverrideValue::range(min, max))
    }

    fn set_override_value(
        &self,
        sensor: SensorName,
        value: OverrideValue,
    ) -> Result<(), DashboardError> {
        self.write_table()?.set_value(sensor, value)?;
        metrics::counter!("greenhouse_overrides_total", "action" => "set").increment(1);
        info!(sensor = %sensor, value = ?value, "Override set");

        if let Some(relay) = &self.relay {
            let sent = match value {
                OverrideValue::Constant { value } => relay.send_override(sensor, value),
                OverrideValue::Range { min, max } => relay.send_override_range(sensor, min, max),
            };
            if let Err(e) = sent {
                warn!(sensor = %sensor, error = %e, "Override not forwarded to producer");
            }
        }
        Ok(())
    }

    /// Remove the override on `sensor`, returning the one that was active
    ///
    /// The clear is forwarded even when nothing was active locally, so the
    /// producer converges after a restart of the dashboard.
    #[instrument(name = "dashboard_clear_override", skip(self))]
    pub fn clear_override(
        &self,
        sensor: SensorName,
    ) -> Result<Option<OverrideValue>, DashboardError> {
        let removed = self.write_table()?.clear(sensor);
        metrics::counter!("greenhouse_overrides_total", "action" => "clear").increment(1);
        debug!(sensor = %sensor, removed = ?removed, "Override cleared");

        if let Some(relay) = &self.relay {
            if let Err(e) = relay.send_clear(sensor) {
                warn!(sensor = %sensor, error = %e, "Clear not forwarded to producer");
            }
        }
        Ok(removed)
    }

    /// Service status
    pub fn status(&self) -> DashboardStatus {
        DashboardStatus {
            policy: self.policy(),
            store: self.store.status(),
            active_overrides: self.read_table().map(|t| t.len()).unwrap_or(0),
            relay: self.relay.as_ref().map(|r| r.metrics().snapshot()),
        }
    }

    /// Stop the relay worker, draining queued commands for at most
    /// `drain_timeout`
    ///
    /// Returns `false` when queued commands had to be abandoned.
    #[instrument(name = "dashboard_shutdown", skip(self))]
    pub async fn shutdown(self, drain_timeout: Duration) -> bool {
        match self.relay {
            Some(relay) => relay.shutdown(drain_timeout).await,
            None => true,
        }
    }

    fn read_table(&self) -> Result<RwLockReadGuard<'_, OverrideTable>, DashboardError> {
        self.overrides
            .read()
            .map_err(|_| DashboardError::state_unavailable("override table lock poisoned"))
    }

    fn write_table(&self) -> Result<RwLockWriteGuard<'_, OverrideTable>, DashboardError> {
        self.overrides
            .write()
            .map_err(|_| DashboardError::state_unavailable("override table lock poisoned"))
    }
}
