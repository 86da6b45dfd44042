use crate::error::SetupError;
use std::fmt;
use std::str::FromStr;

/// Identifies one telemetry quantity exposed by the meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    DiagnosticInfo,
    E7Power,
    E8Current,
    E9Voltage,
    EaForward,
    EbReverse,
    OperationStatus,
    ErrorStatus,
    CurrentLimit,
    MeterType,
    DetectedAbnormality,
    PowerUnit,
    Rssi,
}

impl FieldKey {
    pub const ALL: [FieldKey; 13] = [
        FieldKey::DiagnosticInfo,
        FieldKey::E7Power,
        FieldKey::E8Current,
        FieldKey::E9Voltage,
        FieldKey::EaForward,
        FieldKey::EbReverse,
        FieldKey::OperationStatus,
        FieldKey::ErrorStatus,
        FieldKey::CurrentLimit,
        FieldKey::MeterType,
        FieldKey::DetectedAbnormality,
        FieldKey::PowerUnit,
        FieldKey::Rssi,
    ];

    /// Snapshot key carrying this field's raw value.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::DiagnosticInfo => "diagnostic_info",
            FieldKey::E7Power => "e7_power",
            FieldKey::E8Current => "e8_current",
            FieldKey::E9Voltage => "e9_voltage",
            FieldKey::EaForward => "ea_forward",
            FieldKey::EbReverse => "eb_reverse",
            FieldKey::OperationStatus => "operation_status",
            FieldKey::ErrorStatus => "error_status",
            FieldKey::CurrentLimit => "current_limit",
            FieldKey::MeterType => "meter_type",
            FieldKey::DetectedAbnormality => "detected_abnormality",
            FieldKey::PowerUnit => "power_unit",
            FieldKey::Rssi => "rssi",
        }
    }

    /// Snapshot key of the raw timestamp paired with this field, if the meter reports one.
    pub fn timestamp_key(&self) -> Option<&'static str> {
        match self {
            FieldKey::E7Power => Some("power_timestamp"),
            FieldKey::EaForward => Some("forward_timestamp"),
            FieldKey::EbReverse => Some("reverse_timestamp"),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SetupError::UnknownField(s.to_string()))
    }
}

/// Numeric display policy of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Value is passed through as reported.
    None,
    Integer,
    OneDecimal,
    TwoDecimals,
}

impl Precision {
    pub fn decimals(&self) -> Option<u32> {
        match self {
            Precision::None => None,
            Precision::Integer => Some(0),
            Precision::OneDecimal => Some(1),
            Precision::TwoDecimals => Some(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Power,
    Current,
    Voltage,
    Energy,
    Enum,
    SignalStrength,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Power => "power",
            DeviceClass::Current => "current",
            DeviceClass::Voltage => "voltage",
            DeviceClass::Energy => "energy",
            DeviceClass::Enum => "enum",
            DeviceClass::SignalStrength => "signal_strength",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

impl StateClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateClass::Measurement => "measurement",
            StateClass::TotalIncreasing => "total_increasing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityCategory {
    Diagnostic,
}

impl EntityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Diagnostic => "diagnostic",
        }
    }
}

/// Static description of one exposed sensor.
///
/// Specs are never mutated once built; the enablement step derives a new spec
/// with [`FieldSpec::with_enabled_by_default`] instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub name: &'static str,
    pub icon: &'static str,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub unit: Option<&'static str>,
    pub category: Option<EntityCategory>,
    pub options: &'static [&'static str],
    pub enabled_by_default: bool,
    pub precision: Precision,
}

impl FieldSpec {
    pub fn with_enabled_by_default(self, enabled: bool) -> Self {
        Self {
            enabled_by_default: enabled,
            ..self
        }
    }

    /// Stable identifier handed to the host platform.
    pub fn unique_id(&self) -> String {
        format!("b_route_{}", self.key)
    }

    pub fn is_numeric(&self) -> bool {
        self.precision.decimals().is_some()
    }
}

/// Every sensor the meter integration knows about, in registration order.
pub static SENSOR_TYPES: [FieldSpec; 13] = [
    FieldSpec {
        key: FieldKey::DiagnosticInfo,
        name: "B-Route Diagnostic Info",
        icon: "mdi:information",
        device_class: None,
        state_class: None,
        unit: None,
        category: Some(EntityCategory::Diagnostic),
        options: &[],
        enabled_by_default: false,
        precision: Precision::None,
    },
    FieldSpec {
        key: FieldKey::E7Power,
        name: "B-Route Instantaneous Power",
        icon: "mdi:flash",
        device_class: Some(DeviceClass::Power),
        state_class: Some(StateClass::Measurement),
        unit: Some("W"),
        category: None,
        options: &[],
        enabled_by_default: true,
        precision: Precision::Integer,
    },
    FieldSpec {
        key: FieldKey::E8Current,
        name: "B-Route Instantaneous Current",
        icon: "mdi:current-ac",
        device_class: Some(DeviceClass::Current),
        state_class: Some(StateClass::Measurement),
        unit: Some("A"),
        category: None,
        options: &[],
        enabled_by_default: true,
        precision: Precision::OneDecimal,
    },
    FieldSpec {
        key: FieldKey::E9Voltage,
        name: "B-Route Instantaneous Voltage",
        icon: "mdi:power-plug",
        device_class: Some(DeviceClass::Voltage),
        state_class: Some(StateClass::Measurement),
        unit: Some("V"),
        category: None,
        options: &[],
        enabled_by_default: true,
        precision: Precision::OneDecimal,
    },
    FieldSpec {
        key: FieldKey::EaForward,
        name: "B-Route Cumulative Forward",
        icon: "mdi:gauge",
        device_class: Some(DeviceClass::Energy),
        state_class: Some(StateClass::TotalIncreasing),
        unit: Some("kWh"),
        category: None,
        options: &[],
        enabled_by_default: true,
        precision: Precision::TwoDecimals,
    },
    FieldSpec {
        key: FieldKey::EbReverse,
        name: "B-Route Cumulative Reverse",
        icon: "mdi:gauge",
        device_class: Some(DeviceClass::Energy),
        state_class: Some(StateClass::TotalIncreasing),
        unit: Some("kWh"),
        category: None,
        options: &[],
        enabled_by_default: true,
        precision: Precision::TwoDecimals,
    },
    FieldSpec {
        key: FieldKey::OperationStatus,
        name: "B-Route Operation Status",
        icon: "mdi:power",
        device_class: Some(DeviceClass::Enum),
        state_class: None,
        unit: None,
        category: Some(EntityCategory::Diagnostic),
        options: &["ON", "OFF"],
        enabled_by_default: false,
        precision: Precision::None,
    },
    FieldSpec {
        key: FieldKey::ErrorStatus,
        name: "B-Route Error Status",
        icon: "mdi:alert-circle",
        device_class: Some(DeviceClass::Enum),
        state_class: None,
        unit: None,
        category: Some(EntityCategory::Diagnostic),
        options: &["Normal", "Error"],
        enabled_by_default: false,
        precision: Precision::None,
    },
    FieldSpec {
        key: FieldKey::CurrentLimit,
        name: "B-Route Current Limit",
        icon: "mdi:current-ac",
        device_class: Some(DeviceClass::Current),
        state_class: Some(StateClass::Measurement),
        unit: Some("A"),
        category: Some(EntityCategory::Diagnostic),
        options: &[],
        enabled_by_default: false,
        precision: Precision::None,
    },
    FieldSpec {
        key: FieldKey::MeterType,
        name: "B-Route Meter Type",
        icon: "mdi:meter-electric",
        device_class: Some(DeviceClass::Enum),
        state_class: None,
        unit: None,
        category: Some(EntityCategory::Diagnostic),
        options: &[],
        enabled_by_default: false,
        precision: Precision::None,
    },
    FieldSpec {
        key: FieldKey::DetectedAbnormality,
        name: "B-Route Detected Abnormality",
        icon: "mdi:alert",
        device_class: Some(DeviceClass::Enum),
        state_class: None,
        unit: None,
        category: Some(EntityCategory::Diagnostic),
        options: &[],
        enabled_by_default: false,
        precision: Precision::None,
    },
    FieldSpec {
        key: FieldKey::PowerUnit,
        name: "B-Route Power Unit",
        icon: "mdi:scale",
        device_class: None,
        state_class: None,
        unit: Some("kWh"),
        category: Some(EntityCategory::Diagnostic),
        options: &[],
        enabled_by_default: false,
        precision: Precision::None,
    },
    FieldSpec {
        key: FieldKey::Rssi,
        name: "B-Route Signal Strength",
        icon: "mdi:signal",
        device_class: Some(DeviceClass::SignalStrength),
        state_class: None,
        unit: Some("dBm"),
        category: Some(EntityCategory::Diagnostic),
        options: &[],
        enabled_by_default: false,
        precision: Precision::None,
    },
];

/// Looks up the static spec for a field.
pub fn sensor_type(key: FieldKey) -> &'static FieldSpec {
    // SENSOR_TYPES is declared in FieldKey::ALL order
    &SENSOR_TYPES[key as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key_round_trips_through_name() {
        for key in FieldKey::ALL {
            assert_eq!(key.as_str().parse::<FieldKey>(), Ok(key));
        }
    }

    #[test]
    fn test_unknown_field_key_is_a_setup_error() {
        assert_eq!(
            "e7_powr".parse::<FieldKey>(),
            Err(SetupError::UnknownField("e7_powr".to_string()))
        );
    }

    #[test]
    fn test_sensor_type_lookup_matches_key() {
        for key in FieldKey::ALL {
            assert_eq!(sensor_type(key).key, key);
        }
    }

    #[test]
    fn test_unique_id_prefix() {
        assert_eq!(sensor_type(FieldKey::E7Power).unique_id(), "b_route_e7_power");
        assert_eq!(sensor_type(FieldKey::Rssi).unique_id(), "b_route_rssi");
    }

    #[test]
    fn test_override_leaves_static_default_untouched() {
        let spec = *sensor_type(FieldKey::Rssi);
        let enabled = spec.with_enabled_by_default(true);

        assert!(enabled.enabled_by_default);
        assert!(!sensor_type(FieldKey::Rssi).enabled_by_default);
        assert_eq!(enabled.with_enabled_by_default(false), spec);
    }

    #[test]
    fn test_only_base_readings_are_numeric() {
        let numeric: Vec<FieldKey> = SENSOR_TYPES
            .iter()
            .filter(|spec| spec.is_numeric())
            .map(|spec| spec.key)
            .collect();
        assert_eq!(
            numeric,
            vec![
                FieldKey::E7Power,
                FieldKey::E8Current,
                FieldKey::E9Voltage,
                FieldKey::EaForward,
                FieldKey::EbReverse
            ]
        );
    }

    #[test]
    fn test_paired_timestamps() {
        assert_eq!(FieldKey::E7Power.timestamp_key(), Some("power_timestamp"));
        assert_eq!(FieldKey::EaForward.timestamp_key(), Some("forward_timestamp"));
        assert_eq!(FieldKey::EbReverse.timestamp_key(), Some("reverse_timestamp"));
        assert_eq!(FieldKey::E8Current.timestamp_key(), None);
    }
}
