use serde::Serialize;

pub const DOMAIN: &str = "b_route_meter";

/// Identity shared by every sensor of one meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub name: &'static str,
    pub unique_id: &'static str,
}

impl DeviceInfo {
    /// `(domain, unique id)` pair the host registry keys the device on.
    pub fn identifier(&self) -> (&'static str, &'static str) {
        (DOMAIN, self.unique_id)
    }
}

pub const DEVICE_INFO: DeviceInfo = DeviceInfo {
    manufacturer: "Wi-SUN B-Route",
    model: "Low-voltage Smart Electric Energy Meter",
    name: "B-Route Smart Meter",
    unique_id: "b_route_smart_meter",
};
