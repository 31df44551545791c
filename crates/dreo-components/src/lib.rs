//! Dreo entity platforms
//!
//! Each platform module builds entities from the loaded devices and maps
//! service calls onto device property writes.

pub mod climate;
pub mod conversions;
mod entity;
mod error;
pub mod fan;
pub mod humidifier;
pub mod light;
pub mod number;
pub mod sensor;
pub mod switch;

use std::sync::Arc;

use dreo_client::DreoDevice;
use dreo_core::Platform;
use tracing::debug;

pub use entity::{
    on_off, optional_arg, required_arg, DeviceInfo, DreoEntity, Entity, DOMAIN, MANUFACTURER,
};
pub use error::{EntityError, EntityResult};

/// Build every entity a platform exposes for the given devices
pub fn setup_platform(platform: Platform, devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    let entities = match platform {
        Platform::Climate => climate::setup_entities(devices),
        Platform::Fan => fan::setup_entities(devices),
        Platform::Humidifier => humidifier::setup_entities(devices),
        Platform::Light => light::setup_entities(devices),
        Platform::Number => number::setup_entities(devices),
        Platform::Sensor => sensor::setup_entities(devices),
        Platform::Switch => switch::setup_entities(devices),
    };
    debug!(%platform, count = entities.len(), "Built platform entities");
    entities
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use dreo_client::{DeviceCapabilities, DreoDevice, LoopbackTransport};
    use serde_json::Value;

    /// A device of the given model over a running loopback transport.
    /// Serial is `SN-<model>`, name `Test <model>`.
    pub fn device_with(model: &str, state: Value) -> (Arc<DreoDevice>, Arc<LoopbackTransport>) {
        let transport = Arc::new(LoopbackTransport::new());
        transport.start();
        let capabilities = DeviceCapabilities {
            speed_range: Some((1, 12)),
            preset_modes: ["normal", "natural", "sleep", "auto"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            temperature_range: None,
            humidity_range: None,
        };
        let device = DreoDevice::new(
            format!("SN-{model}"),
            format!("Test {model}"),
            model,
            transport.clone(),
        )
        .with_capabilities(capabilities)
        .with_state(state.as_object().cloned().unwrap_or_default());
        (Arc::new(device), transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::device_with;
    use serde_json::json;

    #[test]
    fn test_ceiling_fan_across_platforms() {
        let (fan, _) = device_with(
            "DR-HCF003S",
            json!({"poweron": true, "windlevel": 2, "lighton": true, "atmon": false,
                   "voiceon": true, "timeroff": 0}),
        );
        let devices = vec![fan];

        assert_eq!(setup_platform(Platform::Fan, &devices).len(), 1);
        assert_eq!(setup_platform(Platform::Light, &devices).len(), 2);
        assert_eq!(setup_platform(Platform::Switch, &devices).len(), 1);
        assert_eq!(setup_platform(Platform::Number, &devices).len(), 1);
        assert!(setup_platform(Platform::Climate, &devices).is_empty());
        assert!(setup_platform(Platform::Humidifier, &devices).is_empty());
    }

    #[test]
    fn test_unavailable_when_disconnected() {
        let (fan, _) = device_with("DR-HTF008S", json!({"poweron": true, "connected": false}));
        let entities = setup_platform(Platform::Fan, &[fan]);
        assert!(!entities[0].available());
    }
}
