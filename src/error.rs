use crate::field::FieldKey;

/// A value was present in the snapshot but could not be converted for display.
///
/// Callers treat this exactly like an absent field: the projector falls back to
/// its stale value and logs the failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid value for {field}: {raw}")]
pub struct FormatError {
    pub field: FieldKey,
    pub raw: String,
}

/// Misconfiguration detected while building the sensor set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("unknown field key: {0}")]
    UnknownField(String),
    #[error("no sensors configured")]
    NoSensors,
}
