use crate::config::Config;
use crate::field::FieldSpec;
use crate::reading::Reading;
use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State Home Assistant shows for an entity that has no value yet.
pub const UNKNOWN_STATE: &str = "unknown";

pub struct HomeAssistantAPI {
    endpoint_url: String,
    auth_token: String,
    client: reqwest::Client,
}

impl HomeAssistantAPI {
    pub fn new(endpoint_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ha_url.clone(), config.ha_token.clone())
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint_url.is_empty()
    }

    /// Creates or updates the state of `entity_id` through the REST API.
    pub async fn publish_state(
        &self,
        entity_id: &str,
        update: &StateUpdate,
    ) -> Result<HASensor, anyhow::Error> {
        if !self.is_configured() {
            anyhow::bail!("No HA connection");
        }
        let result = self
            .client
            .post(format!("{}/api/states/{}", self.endpoint_url, entity_id))
            .bearer_auth(&self.auth_token)
            .json(update)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(result)
    }
}

/// Body of `POST /api/states/<entity_id>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateUpdate {
    pub state: String,
    pub attributes: Map<String, Value>,
}

impl StateUpdate {
    /// Combines a projected reading with the sensor's display metadata.
    pub fn from_reading(spec: &FieldSpec, reading: &Reading) -> Self {
        let mut attributes = Map::new();
        for (name, value) in &reading.attributes {
            if let Ok(value) = serde_json::to_value(value) {
                attributes.insert(name.clone(), value);
            }
        }

        attributes.insert("friendly_name".into(), spec.name.into());
        attributes.insert("icon".into(), spec.icon.into());
        if let Some(unit) = spec.unit {
            attributes.insert("unit_of_measurement".into(), unit.into());
        }
        if let Some(device_class) = spec.device_class {
            attributes.insert("device_class".into(), device_class.as_str().into());
        }
        if let Some(state_class) = spec.state_class {
            attributes.insert("state_class".into(), state_class.as_str().into());
        }
        if let Some(category) = spec.category {
            attributes.insert("entity_category".into(), category.as_str().into());
        }
        if !spec.options.is_empty() {
            attributes.insert("options".into(), spec.options.to_vec().into());
        }

        Self {
            state: reading
                .value
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_else(|| UNKNOWN_STATE.to_string()),
            attributes,
        }
    }
}

/// Entity state as returned by Home Assistant.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HASensor {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub last_changed: String,
    #[serde(default)]
    pub last_reported: String,
    pub last_updated: String,
}
