//! Turns the meter's diagnostic record into a one-line status and an attribute map.

use crate::reading::{AttributeValue, Attributes};
use crate::snapshot::DiagnosticRecord;

pub const NO_DATA: &str = "NO DATA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Online,
    Offline,
}

impl LinkState {
    /// First matching rule wins: an IPv6 address, then any neighbor, then any
    /// open TCP session. A link without IPv6 yet still counts as online when
    /// either of the other two holds.
    pub fn classify(record: &DiagnosticRecord) -> Self {
        if present(&record.ipv6_address).is_some()
            || !record.neighbor_devices.is_empty()
            || !record.active_tcp_connections.is_empty()
        {
            LinkState::Online
        } else {
            LinkState::Offline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Online => "ONLINE",
            LinkState::Offline => "OFFLINE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    Good,
    Fair,
    Poor,
}

impl SignalQuality {
    pub fn from_rssi(rssi: i32) -> Self {
        if rssi <= -80 {
            SignalQuality::Poor
        } else if rssi <= -70 {
            SignalQuality::Fair
        } else {
            SignalQuality::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalQuality::Good => "GOOD",
            SignalQuality::Fair => "FAIR",
            SignalQuality::Poor => "POOR",
        }
    }
}

/// Status line and attributes for an optional record. Never fails.
pub fn synthesize(record: Option<&DiagnosticRecord>) -> (String, Attributes) {
    match record {
        Some(record) => (status(record), attributes(record)),
        None => (NO_DATA.to_string(), Attributes::new()),
    }
}

/// e.g. `ONLINE (FAIR -72dBm) (1 CONN, 2 NEIGH)`
pub fn status(record: &DiagnosticRecord) -> String {
    let mut status = LinkState::classify(record).as_str().to_string();

    if let Some(rssi) = record.rssi {
        let quality = SignalQuality::from_rssi(rssi);
        status = format!("{status} ({} {rssi}dBm)", quality.as_str());
    }

    let mut counts = Vec::new();
    if !record.active_tcp_connections.is_empty() {
        counts.push(format!("{} CONN", record.active_tcp_connections.len()));
    }
    if !record.neighbor_devices.is_empty() {
        counts.push(format!("{} NEIGH", record.neighbor_devices.len()));
    }
    if !counts.is_empty() {
        status = format!("{status} ({})", counts.join(", "));
    }

    status
}

pub fn attributes(record: &DiagnosticRecord) -> Attributes {
    let mut attrs = Attributes::new();

    let identity = [
        ("mac_address", &record.mac_address),
        ("ipv6_address", &record.ipv6_address),
        ("stack_version", &record.stack_version),
        ("app_version", &record.app_version),
    ];
    for (name, value) in identity {
        if let Some(value) = present(value) {
            attrs.insert(name.to_string(), value.into());
        }
    }

    if let Some(rssi) = record.rssi {
        attrs.insert("rssi".to_string(), format!("{rssi} dBm").into());
    }
    if let Some(channel) = record.channel {
        attrs.insert("channel".to_string(), AttributeValue::Integer(channel.into()));
    }
    if let Some(pan_id) = present(&record.pan_id) {
        attrs.insert("pan_id".to_string(), pan_id.into());
    }

    if !record.active_tcp_connections.is_empty() {
        attrs.insert(
            "tcp_connections_count".to_string(),
            record.active_tcp_connections.len().into(),
        );
        for (i, conn) in record.active_tcp_connections.iter().enumerate() {
            attrs.insert(format!("tcp_connection_{}", i + 1), conn.to_string().into());
        }
    }

    if !record.udp_ports.is_empty() {
        attrs.insert("udp_ports".to_string(), join_ports(&record.udp_ports).into());
    }
    if !record.tcp_ports.is_empty() {
        attrs.insert("tcp_ports".to_string(), join_ports(&record.tcp_ports).into());
    }

    if !record.neighbor_devices.is_empty() {
        attrs.insert(
            "neighbor_devices_count".to_string(),
            record.neighbor_devices.len().into(),
        );
        for (i, neighbor) in record.neighbor_devices.iter().enumerate() {
            attrs.insert(format!("neighbor_device_{}", i + 1), neighbor.to_string().into());
        }
    }

    attrs
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn join_ports<'a>(ports: impl IntoIterator<Item = &'a u16>) -> String {
    ports
        .into_iter()
        .map(|port| port.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
