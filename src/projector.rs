use crate::diagnostic;
use crate::field::{FieldKey, FieldSpec};
use crate::formatter;
use crate::reading::{AttributeValue, Attributes, DisplayValue, Reading};
use crate::snapshot::{RawValue, Snapshot, TIMESTAMP_FORMAT};
use crate::stale_cache::StaleValueCache;
use tracing::{debug, warn};

/// Extra raw keys surfaced as attributes of the current sensor.
const PHASE_CURRENT_KEYS: [&str; 2] = ["r_phase_current", "t_phase_current"];

/// Pull-based view of one sensor, evaluated against the snapshot of the
/// current refresh cycle. `None` as snapshot means the refresh failed.
pub trait Projection: Send + Sync {
    fn spec(&self) -> &FieldSpec;

    fn current_value(&self, snapshot: Option<&Snapshot>) -> Option<DisplayValue>;

    fn attributes(&self, snapshot: Option<&Snapshot>) -> Attributes;

    fn unique_id(&self) -> String {
        self.spec().unique_id()
    }

    fn is_enabled_by_default(&self) -> bool {
        self.spec().enabled_by_default
    }

    /// Readings stay visible across failed refreshes, so this never flips.
    fn available(&self) -> bool {
        true
    }

    fn project(&self, snapshot: Option<&Snapshot>) -> Reading {
        Reading {
            key: self.spec().key,
            unique_id: self.unique_id(),
            value: self.current_value(snapshot),
            attributes: self.attributes(snapshot),
            available: self.available(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionState {
    NoValueYet,
    HasValue,
}

/// Projects one field, falling back to the last good value when the
/// snapshot lacks the field or carries something unusable.
#[derive(Debug)]
pub struct SensorProjector {
    spec: FieldSpec,
    last_value: StaleValueCache<DisplayValue>,
    last_update: StaleValueCache<String>,
}

impl SensorProjector {
    pub fn new(spec: FieldSpec) -> Self {
        debug!(field = %spec.key, "Setting up B-Route sensor projector");
        Self {
            spec,
            last_value: StaleValueCache::new(),
            last_update: StaleValueCache::new(),
        }
    }

    pub fn key(&self) -> FieldKey {
        self.spec.key
    }

    pub fn state(&self) -> ProjectionState {
        if self.last_value.is_empty() {
            ProjectionState::NoValueYet
        } else {
            ProjectionState::HasValue
        }
    }

    pub fn last_update(&self) -> Option<String> {
        self.last_update.get()
    }

    fn stale_value(&self) -> Option<DisplayValue> {
        let value = self.last_value.get();
        if let Some(value) = &value {
            debug!(field = %self.spec.key, %value, "Using last known value");
        }
        value
    }

    fn scalar_value(&self, snapshot: Option<&Snapshot>) -> Option<DisplayValue> {
        let Some(raw) = snapshot.and_then(|s| s.field(self.spec.key)) else {
            return self.stale_value();
        };
        match formatter::format(self.spec.key, raw) {
            Ok(value) => {
                self.last_value.put(value.clone());
                Some(value)
            }
            Err(e) => {
                warn!(field = %self.spec.key, error = %e, "Invalid value in snapshot");
                self.stale_value()
            }
        }
    }

    fn record_timestamp(&self, snapshot: Option<&Snapshot>) {
        let Some(ts_key) = self.spec.key.timestamp_key() else {
            return;
        };
        let rendered = match snapshot.and_then(|s| s.get(ts_key)) {
            Some(RawValue::Timestamp(ts)) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Some(RawValue::Text(text)) if !text.is_empty() => text.clone(),
            Some(RawValue::Number(n)) => n.to_string(),
            _ => return,
        };
        self.last_update.put(rendered);
    }

    fn phase_currents(snapshot: Option<&Snapshot>, attrs: &mut Attributes) {
        let Some(snapshot) = snapshot else {
            return;
        };
        for key in PHASE_CURRENT_KEYS {
            if let Some(value) = snapshot.get(key) {
                attrs.insert(key.to_string(), AttributeValue::Text(format!("{value} A")));
            }
        }
    }
}

impl Projection for SensorProjector {
    fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    fn current_value(&self, snapshot: Option<&Snapshot>) -> Option<DisplayValue> {
        match self.spec.key {
            FieldKey::DiagnosticInfo => {
                let (status, _) = diagnostic::synthesize(snapshot.and_then(Snapshot::diagnostic));
                Some(DisplayValue::Text(status))
            }
            _ => self.scalar_value(snapshot),
        }
    }

    fn attributes(&self, snapshot: Option<&Snapshot>) -> Attributes {
        let mut attrs = match self.spec.key {
            FieldKey::DiagnosticInfo => {
                let Some(record) = snapshot.and_then(Snapshot::diagnostic) else {
                    return Attributes::new();
                };
                diagnostic::attributes(record)
            }
            FieldKey::E8Current => {
                let mut attrs = Attributes::new();
                Self::phase_currents(snapshot, &mut attrs);
                attrs
            }
            _ => Attributes::new(),
        };

        self.record_timestamp(snapshot);
        if let Some(last_update) = self.last_update.get() {
            attrs.insert("last_update".to_string(), last_update.into());
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::sensor_type;
    use crate::snapshot::DiagnosticRecord;
    use chrono::NaiveDate;

    fn projector(key: FieldKey) -> SensorProjector {
        SensorProjector::new(*sensor_type(key))
    }

    #[test]
    fn test_no_value_before_first_success() {
        let power = projector(FieldKey::E7Power);
        assert_eq!(power.state(), ProjectionState::NoValueYet);
        assert_eq!(power.current_value(None), None);
        assert_eq!(power.current_value(Some(&Snapshot::new())), None);
        assert_eq!(
            power.current_value(Some(&Snapshot::new().with("e7_power", "bad"))),
            None
        );
        assert_eq!(power.state(), ProjectionState::NoValueYet);
    }

    #[test]
    fn test_power_stale_fallback_scenario() {
        let power = projector(FieldKey::E7Power);

        let first = Snapshot::new().with("e7_power", "1500.4");
        assert_eq!(power.current_value(Some(&first)), Some(DisplayValue::Integer(1500)));
        assert_eq!(power.state(), ProjectionState::HasValue);

        assert_eq!(
            power.current_value(Some(&Snapshot::new())),
            Some(DisplayValue::Integer(1500))
        );

        let bad = Snapshot::new().with("e7_power", "bad");
        assert_eq!(power.current_value(Some(&bad)), Some(DisplayValue::Integer(1500)));

        assert_eq!(power.current_value(None), Some(DisplayValue::Integer(1500)));
        assert_eq!(power.state(), ProjectionState::HasValue);
    }

    #[test]
    fn test_newer_values_overwrite_cache() {
        let voltage = projector(FieldKey::E9Voltage);
        voltage.current_value(Some(&Snapshot::new().with("e9_voltage", 101.04)));
        voltage.current_value(Some(&Snapshot::new().with("e9_voltage", 99.96)));
        assert_eq!(voltage.current_value(None), Some(DisplayValue::Float(100.0)));
    }

    #[test]
    fn test_caches_are_per_field() {
        let power = projector(FieldKey::E7Power);
        let current = projector(FieldKey::E8Current);
        let snapshot = Snapshot::new().with("e7_power", 800.0);

        power.current_value(Some(&snapshot));
        assert_eq!(current.current_value(Some(&snapshot)), None);
        assert_eq!(current.state(), ProjectionState::NoValueYet);
    }

    #[test]
    fn test_timestamp_recorded_independently_of_value() {
        let forward = projector(FieldKey::EaForward);
        let ts = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        // timestamp without a value
        let attrs = forward.attributes(Some(&Snapshot::new().with("forward_timestamp", ts)));
        assert_eq!(attrs["last_update"], AttributeValue::from("2026-10-16 09:30:00"));
        assert_eq!(forward.current_value(None), None);

        // later cycle without timestamp keeps the recorded one
        let attrs = forward.attributes(Some(&Snapshot::new().with("ea_forward", 12.345)));
        assert_eq!(attrs["last_update"], AttributeValue::from("2026-10-16 09:30:00"));
        assert_eq!(forward.last_update().as_deref(), Some("2026-10-16 09:30:00"));
    }

    #[test]
    fn test_fields_without_paired_timestamp_never_report_last_update() {
        let voltage = projector(FieldKey::E9Voltage);
        let snapshot = Snapshot::new()
            .with("e9_voltage", 100.0)
            .with("power_timestamp", "2026-10-16 09:30:00");
        assert!(voltage.attributes(Some(&snapshot)).is_empty());
    }

    #[test]
    fn test_phase_current_attributes() {
        let current = projector(FieldKey::E8Current);
        let snapshot = Snapshot::new()
            .with("e8_current", 12.34)
            .with("r_phase_current", 7.0)
            .with("t_phase_current", 5.3);
        let attrs = current.attributes(Some(&snapshot));
        assert_eq!(attrs["r_phase_current"], AttributeValue::from("7 A"));
        assert_eq!(attrs["t_phase_current"], AttributeValue::from("5.3 A"));

        assert!(current.attributes(Some(&Snapshot::new())).is_empty());
    }

    #[test]
    fn test_diagnostic_projection() {
        let diag = projector(FieldKey::DiagnosticInfo);
        assert_eq!(
            diag.current_value(None),
            Some(DisplayValue::Text("NO DATA".to_string()))
        );
        assert!(diag.attributes(None).is_empty());

        let record = DiagnosticRecord {
            ipv6_address: Some("fe80::1".to_string()),
            rssi: Some(-79),
            ..Default::default()
        };
        let snapshot = Snapshot::new().with("diagnostic_info", record);
        assert_eq!(
            diag.current_value(Some(&snapshot)),
            Some(DisplayValue::Text("ONLINE (FAIR -79dBm)".to_string()))
        );
        let attrs = diag.attributes(Some(&snapshot));
        assert_eq!(attrs["ipv6_address"], AttributeValue::from("fe80::1"));
        assert_eq!(attrs["rssi"], AttributeValue::from("-79 dBm"));

        // diagnostic status reflects the current cycle only
        assert_eq!(
            diag.current_value(Some(&Snapshot::new())),
            Some(DisplayValue::Text("NO DATA".to_string()))
        );
    }

    #[test]
    fn test_projection_reports_identity_and_availability() {
        let rssi = SensorProjector::new(sensor_type(FieldKey::Rssi).with_enabled_by_default(true));
        let reading = rssi.project(None);

        assert_eq!(reading.unique_id, "b_route_rssi");
        assert_eq!(reading.key, FieldKey::Rssi);
        assert_eq!(reading.value, None);
        assert!(reading.available);
        assert!(rssi.is_enabled_by_default());
    }
}
