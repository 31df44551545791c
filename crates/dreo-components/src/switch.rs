//! Switch platform: one switch per boolean device property

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{keys, DreoDevice, DreoDeviceType};
use dreo_core::{attrs, Platform, ServiceCall};
use serde_json::{json, Value};

use crate::entity::{on_off, unsupported, DeviceInfo, DreoEntity, Entity};
use crate::EntityResult;

#[derive(Debug, Clone, Copy)]
pub struct SwitchDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    /// Device types that expose this property through another platform
    pub skip_for: &'static [DreoDeviceType],
}

pub const SWITCHES: &[SwitchDescription] = &[
    SwitchDescription {
        key: keys::OSCILLATE,
        name: "Oscillating",
        icon: "mdi:rotate-3d-variant",
        skip_for: &[],
    },
    SwitchDescription {
        key: keys::DISPLAY_ALWAYS_ON,
        name: "Display Always On",
        icon: "mdi:led-on",
        skip_for: &[],
    },
    SwitchDescription {
        key: keys::PANEL_SOUND,
        name: "Panel Sound",
        icon: "mdi:volume-high",
        skip_for: &[],
    },
    SwitchDescription {
        key: keys::CHILD_LOCK,
        name: "Child Lock",
        icon: "mdi:lock",
        skip_for: &[],
    },
    SwitchDescription {
        key: keys::PTC_ON,
        name: "Heater PTC",
        icon: "mdi:heat-wave",
        skip_for: &[],
    },
    SwitchDescription {
        key: keys::LIGHT_ON,
        name: "Light",
        icon: "mdi:lightbulb",
        skip_for: &[DreoDeviceType::CeilingFan],
    },
];

pub fn setup_entities(devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    let mut entities: Vec<Arc<dyn Entity>> = Vec::new();
    for device in devices {
        for description in SWITCHES {
            if description.skip_for.contains(&device.device_type())
                || !device.is_feature_supported(description.key)
            {
                continue;
            }
            entities.push(Arc::new(DreoSwitch::new(device.clone(), *description)));
        }
    }
    entities
}

#[derive(Debug)]
pub struct DreoSwitch {
    base: DreoEntity,
    description: SwitchDescription,
}

impl DreoSwitch {
    pub fn new(device: Arc<DreoDevice>, description: SwitchDescription) -> Self {
        Self {
            base: DreoEntity::new(device, Some(description.name), Some(description.key)),
            description,
        }
    }

    pub fn is_on(&self) -> Option<bool> {
        self.base.device().get_bool(self.description.key)
    }

    fn set(&self, on: bool) -> EntityResult<()> {
        self.base.device().set(self.description.key, on)?;
        Ok(())
    }
}

impl Entity for DreoSwitch {
    fn platform(&self) -> Platform {
        Platform::Switch
    }

    fn unique_id(&self) -> &str {
        self.base.unique_id()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn available(&self) -> bool {
        self.base.available()
    }

    fn state(&self) -> String {
        on_off(self.is_on())
    }

    fn attributes(&self) -> HashMap<String, Value> {
        HashMap::from([(attrs::ICON.to_string(), json!(self.description.icon))])
    }

    fn device_info(&self) -> DeviceInfo {
        self.base.device_info()
    }

    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()> {
        match call.service.as_str() {
            "turn_on" => self.set(true),
            "turn_off" => self.set(false),
            "toggle" => self.set(self.is_on() != Some(true)),
            _ => Err(unsupported(Platform::Switch, call)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::device_with;
    use serde_json::json;

    #[test]
    fn test_one_switch_per_supported_key() {
        let (heater, _) = device_with(
            "DR-HSH004S",
            json!({"poweron": true, "childlockon": false, "ptcon": 1, "lighton": true}),
        );
        let entities = setup_entities(&[heater]);
        let ids: Vec<_> = entities.iter().map(|e| e.unique_id().to_string()).collect();
        assert_eq!(
            ids,
            vec!["SN-DR-HSH004S-childlockon", "SN-DR-HSH004S-ptcon", "SN-DR-HSH004S-lighton"]
        );
        assert_eq!(entities[0].name(), "Test DR-HSH004S Child Lock");
        assert_eq!(entities[1].state(), "on");
    }

    #[test]
    fn test_ceiling_fan_light_is_not_a_switch() {
        let (fan, _) = device_with("DR-HCF003S", json!({"lighton": true, "voiceon": true}));
        let entities = setup_entities(&[fan]);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name(), "Test DR-HCF003S Panel Sound");
    }

    #[test]
    fn test_services() {
        let (device, transport) = device_with("DR-HTF008S", json!({"childlockon": false}));
        let switch = DreoSwitch::new(device, SWITCHES[3]);

        switch
            .handle_service(&ServiceCall::new("switch", "toggle", json!({})))
            .unwrap();
        assert_eq!(switch.state(), "on");
        switch
            .handle_service(&ServiceCall::new("switch", "turn_off", json!({})))
            .unwrap();
        assert_eq!(switch.state(), "off");

        let sent = transport.sent_commands();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].params.get("childlockon"), Some(&json!(false)));
    }
}
