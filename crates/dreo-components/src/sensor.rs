//! Read-only sensors for reported device measurements

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{keys, DreoDevice};
use dreo_core::{attrs, Platform, ServiceCall, STATE_OFF, STATE_ON, STATE_UNKNOWN};
use serde_json::{json, Value};

use crate::entity::{unsupported, DeviceInfo, DreoEntity, Entity};
use crate::EntityResult;

#[derive(Debug, Clone, Copy)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<&'static str>,
    pub icon: &'static str,
}

pub const SENSORS: &[SensorDescription] = &[
    SensorDescription {
        key: keys::TEMPERATURE,
        name: "Temperature",
        unit: Some("°F"),
        device_class: Some("temperature"),
        icon: "mdi:thermometer",
    },
    SensorDescription {
        key: keys::HUMIDITY,
        name: "Humidity",
        unit: Some("%"),
        device_class: Some("humidity"),
        icon: "mdi:water-percent",
    },
    SensorDescription {
        key: keys::PM25,
        name: "PM2.5",
        unit: Some("µg/m³"),
        device_class: Some("pm25"),
        icon: "mdi:blur",
    },
    SensorDescription {
        key: keys::MODE,
        name: "Mode",
        unit: None,
        device_class: None,
        icon: "mdi:format-list-bulleted",
    },
    SensorDescription {
        key: keys::WORK_TIME,
        name: "Work Time",
        unit: Some("h"),
        device_class: Some("duration"),
        icon: "mdi:timer",
    },
    SensorDescription {
        key: keys::FILTER_LIFE,
        name: "Filter Life",
        unit: Some("%"),
        device_class: None,
        icon: "mdi:air-filter",
    },
];

/// Build one sensor per description whose property the device reports
pub fn setup_entities(devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    let mut entities: Vec<Arc<dyn Entity>> = Vec::new();
    for device in devices {
        for description in SENSORS {
            if device.get(description.key).is_some() {
                entities.push(Arc::new(DreoSensor::new(device.clone(), *description)));
            }
        }
    }
    entities
}

#[derive(Debug)]
pub struct DreoSensor {
    base: DreoEntity,
    description: SensorDescription,
}

impl DreoSensor {
    pub fn new(device: Arc<DreoDevice>, description: SensorDescription) -> Self {
        Self {
            base: DreoEntity::new(device, Some(description.name), Some(description.key)),
            description,
        }
    }

    pub fn native_value(&self) -> Option<Value> {
        self.base.device().get(self.description.key)
    }
}

impl Entity for DreoSensor {
    fn platform(&self) -> Platform {
        Platform::Sensor
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
        match self.native_value() {
            Some(Value::String(s)) => s,
            Some(Value::Bool(true)) => STATE_ON.to_string(),
            Some(Value::Bool(false)) => STATE_OFF.to_string(),
            Some(other) => other.to_string(),
            None => STATE_UNKNOWN.to_string(),
        }
    }

    fn attributes(&self) -> HashMap<String, Value> {
        let mut attributes = HashMap::new();
        attributes.insert(attrs::ICON.to_string(), json!(self.description.icon));
        if let Some(unit) = self.description.unit {
            attributes.insert(attrs::UNIT_OF_MEASUREMENT.to_string(), json!(unit));
        }
        if let Some(device_class) = self.description.device_class {
            attributes.insert(attrs::DEVICE_CLASS.to_string(), json!(device_class));
        }
        attributes
    }

    fn device_info(&self) -> DeviceInfo {
        self.base.device_info()
    }

    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()> {
        Err(unsupported(Platform::Sensor, call))
    }
}
