//! Service call type used to command entities

use serde::{Deserialize, Serialize};

/// A call to an entity service such as `light.turn_on`
///
/// `service_data` carries the target (`entity_id`, a string or an array)
/// and the service arguments (`brightness`, `hs_color`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g. "light", "fan")
    pub domain: String,

    /// The service name (e.g. "turn_on", "set_percentage")
    pub service: String,

    pub service_data: serde_json::Value,
}

impl ServiceCall {
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
        }
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Whether service data carries a key at all
    pub fn has(&self, key: &str) -> bool {
        self.service_data.get(key).is_some()
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get entity_id(s) from service data, accepting a string or an array
    pub fn entity_ids(&self) -> Vec<String> {
        match self.service_data.get(crate::attrs::ENTITY_ID) {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => vec![],
        }
    }
}
