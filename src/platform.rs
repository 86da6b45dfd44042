use crate::config::Config;
use crate::device::{DeviceInfo, DEVICE_INFO};
use crate::enablement;
use crate::error::SetupError;
use crate::field::{sensor_type, FieldKey, FieldSpec, SENSOR_TYPES};
use crate::home_assistant::{HomeAssistantAPI, StateUpdate};
use crate::projector::{Projection, SensorProjector};
use crate::reading::Reading;
use crate::snapshot::Snapshot;
use crate::snapshot_reader::SnapshotFeed;
use tracing::{debug, info, warn};

/// The set of sensors registered for one meter.
///
/// Built once from the first snapshot; every later refresh cycle is projected
/// through the same projectors so their stale values carry over.
pub struct MeterPlatform {
    projectors: Vec<SensorProjector>,
}

impl MeterPlatform {
    /// Registers every known sensor.
    pub fn setup(first_snapshot: Option<&Snapshot>) -> Self {
        Self::setup_with_specs(&SENSOR_TYPES, first_snapshot)
    }

    /// Registers the sensors named in configuration. Unknown names abort setup.
    pub fn from_key_names<S: AsRef<str>>(
        names: &[S],
        first_snapshot: Option<&Snapshot>,
    ) -> Result<Self, SetupError> {
        let specs = names
            .iter()
            .map(|name| name.as_ref().parse::<FieldKey>().map(|key| *sensor_type(key)))
            .collect::<Result<Vec<FieldSpec>, SetupError>>()?;
        if specs.is_empty() {
            return Err(SetupError::NoSensors);
        }
        Ok(Self::setup_with_specs(&specs, first_snapshot))
    }

    pub fn setup_with_specs(specs: &[FieldSpec], first_snapshot: Option<&Snapshot>) -> Self {
        debug!("Setting up B-Route meter sensor platform");
        let decision = enablement::decide(specs, first_snapshot);
        let projectors = enablement::finalize(specs, &decision)
            .into_iter()
            .map(SensorProjector::new)
            .collect();
        Self { projectors }
    }

    pub fn device(&self) -> &'static DeviceInfo {
        &DEVICE_INFO
    }

    pub fn projectors(&self) -> &[SensorProjector] {
        &self.projectors
    }

    pub fn projector(&self, key: FieldKey) -> Option<&SensorProjector> {
        self.projectors.iter().find(|p| p.key() == key)
    }

    /// Sensors exposed to the host: those enabled by default after setup.
    pub fn enabled(&self) -> impl Iterator<Item = &SensorProjector> {
        self.projectors.iter().filter(|p| p.is_enabled_by_default())
    }

    /// Projects every enabled sensor against one snapshot reference.
    pub fn refresh(&self, snapshot: Option<&Snapshot>) -> Vec<(FieldSpec, Reading)> {
        self.enabled()
            .map(|p| (*p.spec(), p.project(snapshot)))
            .collect()
    }

    /// Projects one refresh cycle and pushes the readings to Home Assistant.
    /// Returns how many states were accepted.
    pub async fn publish(
        &self,
        snapshot: Option<&Snapshot>,
        api: &HomeAssistantAPI,
        log_readings: bool,
    ) -> usize {
        let mut published = 0;
        for (spec, reading) in self.refresh(snapshot) {
            let update = StateUpdate::from_reading(&spec, &reading);
            if log_readings {
                info!(sensor = %reading.unique_id, state = %update.state, "Reading");
            }
            if !api.is_configured() {
                continue;
            }
            let entity_id = format!("sensor.{}", reading.unique_id);
            match api.publish_state(&entity_id, &update).await {
                Ok(_) => published += 1,
                Err(e) => warn!(entity_id = %entity_id, error = %e, "Failed to publish state"),
            }
        }
        published
    }
}

/// Waits for the first refresh, sets the platform up from it, then publishes
/// every refresh cycle until the feed closes.
pub async fn run(
    mut feed: SnapshotFeed,
    api: HomeAssistantAPI,
    config: Config,
) -> Result<(), SetupError> {
    if feed.changed().await.is_err() {
        info!("Snapshot feed closed before the first refresh");
        return Ok(());
    }
    let first = feed.borrow_and_update().clone();
    if first.is_none() {
        warn!("First refresh failed, only default sensors will be enabled");
    }

    let platform = MeterPlatform::from_key_names(&config.sensors, first.as_deref())?;
    let device = platform.device();
    info!(
        device = device.name,
        model = device.model,
        sensors = platform.enabled().count(),
        "B-Route meter platform ready"
    );

    platform
        .publish(first.as_deref(), &api, config.log_readings)
        .await;
    while feed.changed().await.is_ok() {
        let snapshot = feed.borrow_and_update().clone();
        platform
            .publish(snapshot.as_deref(), &api, config.log_readings)
            .await;
    }

    info!("Snapshot feed closed, platform stopping");
    Ok(())
}
