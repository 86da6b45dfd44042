use crate::field::FieldKey;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Format used when rendering meter timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A raw value as delivered by the acquisition layer. Anything that fits no
/// known shape is kept as `Other` so only that field fails to format.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Timestamp(NaiveDateTime),
    Text(String),
    Diagnostic(DiagnosticRecord),
    Other(Value),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Diagnostic(_) => f.write_str("<diagnostic record>"),
            RawValue::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(value: NaiveDateTime) -> Self {
        RawValue::Timestamp(value)
    }
}

impl From<DiagnosticRecord> for RawValue {
    fn from(value: DiagnosticRecord) -> Self {
        RawValue::Diagnostic(value)
    }
}

/// One refresh cycle's raw data.
///
/// Keys holding `null` on the wire are dropped, so presence of a key always
/// means a non-absent value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "HashMap<String, Option<RawValue>>")]
pub struct Snapshot {
    values: HashMap<String, RawValue>,
}

impl From<HashMap<String, Option<RawValue>>> for Snapshot {
    fn from(raw: HashMap<String, Option<RawValue>>) -> Self {
        Self {
            values: raw
                .into_iter()
                .filter_map(|(key, value)| value.map(|value| (key, value)))
                .collect(),
        }
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by the acquisition side and tests.
    pub fn with(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    pub fn field(&self, key: FieldKey) -> Option<&RawValue> {
        self.get(key.as_str())
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.values.contains_key(key.as_str())
    }

    pub fn diagnostic(&self) -> Option<&DiagnosticRecord> {
        match self.field(FieldKey::DiagnosticInfo) {
            Some(RawValue::Diagnostic(record)) => Some(record),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An open TCP session reported by the Wi-SUN module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TcpConnection {
    pub handle: u8,
    pub remote_address: String,
    pub remote_port: u16,
    pub local_port: u16,
}

impl fmt::Display for TcpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}]:{} -> local {}",
            self.handle, self.remote_address, self.remote_port, self.local_port
        )
    }
}

/// A node present in the module's neighbor table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NeighborDevice {
    pub ipv6_address: String,
    #[serde(default)]
    pub mac_address: Option<String>,
}

impl fmt::Display for NeighborDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mac_address {
            Some(mac) => write!(f, "{} ({})", self.ipv6_address, mac),
            None => f.write_str(&self.ipv6_address),
        }
    }
}

/// Device and network status of the meter link. Every field is optional and
/// decoded on its own: a malformed field reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiagnosticRecord {
    #[serde(deserialize_with = "lenient")]
    pub mac_address: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub ipv6_address: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub stack_version: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub app_version: Option<String>,
    #[serde(deserialize_with = "lenient_rssi")]
    pub rssi: Option<i32>,
    #[serde(deserialize_with = "lenient")]
    pub channel: Option<u16>,
    #[serde(deserialize_with = "lenient")]
    pub pan_id: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub active_tcp_connections: Vec<TcpConnection>,
    #[serde(deserialize_with = "lenient_list")]
    pub udp_ports: BTreeSet<u16>,
    #[serde(deserialize_with = "lenient_list")]
    pub tcp_ports: BTreeSet<u16>,
    #[serde(deserialize_with = "lenient_list")]
    pub neighbor_devices: Vec<NeighborDevice>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Keeps the well-formed entries of a list and drops the rest.
fn lenient_list<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: IntoIterator + FromIterator<C::Item> + Default,
    C::Item: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(C::default()),
    }
}

/// Signal strength in dBm, rounded when reported with a fraction.
fn lenient_rssi<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let dbm = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(dbm
        .filter(|dbm| dbm.is_finite() && dbm.abs() <= f64::from(i16::MAX))
        .map(|dbm| dbm.round() as i32))
}
