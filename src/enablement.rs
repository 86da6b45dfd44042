use crate::field::{FieldKey, FieldSpec};
use crate::snapshot::Snapshot;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fields that are switched on together when the meter reports any of them.
const OPERATION_GROUP: [FieldKey; 3] = [
    FieldKey::OperationStatus,
    FieldKey::ErrorStatus,
    FieldKey::MeterType,
];

/// Condition deciding whether a sensor is exposed by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Always,
    /// The first snapshot carried any data at all.
    SnapshotPresent,
    AnyPresent(&'static [FieldKey]),
    Present(FieldKey),
}

impl Rule {
    pub fn for_spec(spec: &FieldSpec) -> Self {
        if spec.enabled_by_default {
            return Rule::Always;
        }
        match spec.key {
            FieldKey::OperationStatus | FieldKey::ErrorStatus | FieldKey::MeterType => {
                Rule::AnyPresent(&OPERATION_GROUP)
            }
            FieldKey::CurrentLimit
            | FieldKey::DetectedAbnormality
            | FieldKey::PowerUnit
            | FieldKey::Rssi => Rule::Present(spec.key),
            FieldKey::DiagnosticInfo
            | FieldKey::E7Power
            | FieldKey::E8Current
            | FieldKey::E9Voltage
            | FieldKey::EaForward
            | FieldKey::EbReverse => Rule::SnapshotPresent,
        }
    }

    pub fn holds(&self, first_snapshot: Option<&Snapshot>) -> bool {
        if let Rule::Always = self {
            return true;
        }
        let Some(snapshot) = first_snapshot.filter(|s| !s.is_empty()) else {
            return false;
        };
        match self {
            Rule::Always | Rule::SnapshotPresent => true,
            Rule::AnyPresent(keys) => keys.iter().any(|key| snapshot.contains(*key)),
            Rule::Present(key) => snapshot.contains(*key),
        }
    }
}

pub type EnablementDecision = BTreeMap<FieldKey, bool>;

/// Decides, from the first snapshot only, which sensors are enabled by default.
///
/// Pure: the same inputs always give the same decision.
pub fn decide(specs: &[FieldSpec], first_snapshot: Option<&Snapshot>) -> EnablementDecision {
    specs
        .iter()
        .map(|spec| {
            let enabled = Rule::for_spec(spec).holds(first_snapshot);
            if enabled && !spec.enabled_by_default {
                info!(field = %spec.key, "Enabling optional sensor supported by meter");
            }
            (spec.key, enabled)
        })
        .collect()
}

/// Builds the registered specs, overriding the enabled flag where the decision
/// differs from the static default.
pub fn finalize(specs: &[FieldSpec], decision: &EnablementDecision) -> Vec<FieldSpec> {
    specs
        .iter()
        .map(|spec| match decision.get(&spec.key) {
            Some(&enabled) if enabled != spec.enabled_by_default => {
                debug!(
                    field = %spec.key,
                    enabled,
                    "Overriding enabled-by-default"
                );
                spec.with_enabled_by_default(enabled)
            }
            _ => *spec,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{sensor_type, SENSOR_TYPES};

    fn enabled_keys(decision: &EnablementDecision) -> Vec<FieldKey> {
        decision
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(key, _)| *key)
            .collect()
    }

    const BASE: [FieldKey; 5] = [
        FieldKey::E7Power,
        FieldKey::E8Current,
        FieldKey::E9Voltage,
        FieldKey::EaForward,
        FieldKey::EbReverse,
    ];

    #[test]
    fn test_failed_first_refresh_exposes_only_defaults() {
        assert_eq!(enabled_keys(&decide(&SENSOR_TYPES, None)), BASE.to_vec());
        assert_eq!(
            enabled_keys(&decide(&SENSOR_TYPES, Some(&Snapshot::new()))),
            BASE.to_vec()
        );
    }

    #[test]
    fn test_any_data_enables_diagnostic_sensor() {
        let first = Snapshot::new().with("e7_power", 1500.0);
        let decision = decide(&SENSOR_TYPES, Some(&first));

        assert!(decision[&FieldKey::DiagnosticInfo]);
        assert!(!decision[&FieldKey::Rssi]);
        assert!(!decision[&FieldKey::OperationStatus]);
    }

    #[test]
    fn test_operation_fields_enable_as_a_group() {
        let first = Snapshot::new().with("error_status", "Normal");
        let decision = decide(&SENSOR_TYPES, Some(&first));

        assert!(decision[&FieldKey::OperationStatus]);
        assert!(decision[&FieldKey::ErrorStatus]);
        assert!(decision[&FieldKey::MeterType]);
        assert!(!decision[&FieldKey::CurrentLimit]);
    }

    #[test]
    fn test_individual_fields_enable_on_their_own_presence() {
        let first = Snapshot::new()
            .with("current_limit", 60.0)
            .with("rssi", -70.0);
        let decision = decide(&SENSOR_TYPES, Some(&first));

        assert!(decision[&FieldKey::CurrentLimit]);
        assert!(decision[&FieldKey::Rssi]);
        assert!(!decision[&FieldKey::PowerUnit]);
        assert!(!decision[&FieldKey::DetectedAbnormality]);
        assert!(!decision[&FieldKey::OperationStatus]);
    }

    #[test]
    fn test_decision_is_idempotent() {
        let first = Snapshot::new()
            .with("power_unit", 0.1)
            .with("meter_type", "low-voltage");
        assert_eq!(
            decide(&SENSOR_TYPES, Some(&first)),
            decide(&SENSOR_TYPES, Some(&first))
        );
    }

    #[test]
    fn test_default_enabled_spec_is_always_enabled() {
        let forced = sensor_type(FieldKey::Rssi).with_enabled_by_default(true);
        assert_eq!(Rule::for_spec(&forced), Rule::Always);
        assert!(decide(&[forced], None)[&FieldKey::Rssi]);
    }

    #[test]
    fn test_finalize_overrides_only_changed_specs() {
        let first = Snapshot::new().with("rssi", -70.0);
        let decision = decide(&SENSOR_TYPES, Some(&first));
        let finalized = finalize(&SENSOR_TYPES, &decision);

        assert_eq!(finalized.len(), SENSOR_TYPES.len());
        for (spec, original) in finalized.iter().zip(SENSOR_TYPES.iter()) {
            assert_eq!(spec.enabled_by_default, decision[&spec.key]);
            assert_eq!(spec.name, original.name);
        }
        // the static table is untouched
        assert!(!sensor_type(FieldKey::Rssi).enabled_by_default);
    }
}
