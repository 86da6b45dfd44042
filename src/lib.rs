//! B-Route Smart Meter Sensor Library
//!
//! This library projects periodically polled smart-meter snapshots into typed,
//! fallback-aware sensor readings, and publishes them to Home Assistant.

pub mod config;
pub mod device;
pub mod diagnostic;
pub mod enablement;
pub mod error;
pub mod field;
pub mod formatter;
pub mod home_assistant;
pub mod platform;
pub mod projector;
pub mod reading;
pub mod snapshot;
pub mod snapshot_reader;
pub mod stale_cache;

// Re-export commonly used types for easier access
pub use config::Config;
pub use error::{FormatError, SetupError};
pub use field::{FieldKey, FieldSpec, SENSOR_TYPES};
pub use home_assistant::HomeAssistantAPI;
pub use platform::MeterPlatform;
pub use projector::{Projection, SensorProjector};
pub use reading::{DisplayValue, Reading};
pub use snapshot::{DiagnosticRecord, RawValue, Snapshot};
pub use snapshot_reader::SnapshotReader;
