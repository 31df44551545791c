//! Number platform: bounded numeric device settings

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{keys, DreoDevice};
use dreo_core::{attrs, Platform, ServiceCall, STATE_UNKNOWN};
use serde_json::{json, Value};

use crate::entity::{required_arg, unsupported, DeviceInfo, DreoEntity, Entity};
use crate::{EntityError, EntityResult};

#[derive(Debug, Clone, Copy)]
pub struct NumberDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: &'static str,
    pub icon: &'static str,
}

pub const NUMBERS: &[NumberDescription] = &[
    NumberDescription {
        key: keys::HORIZONTAL_ANGLE,
        name: "Horizontal Oscillation Angle",
        min: 0.0,
        max: 120.0,
        step: 1.0,
        unit: "°",
        icon: "mdi:angle-acute",
    },
    NumberDescription {
        key: keys::VERTICAL_ANGLE,
        name: "Vertical Oscillation Angle",
        min: 0.0,
        max: 90.0,
        step: 1.0,
        unit: "°",
        icon: "mdi:angle-acute",
    },
    NumberDescription {
        key: keys::TIMER_OFF,
        name: "Timer Off",
        min: 0.0,
        max: 720.0,
        step: 1.0,
        unit: "min",
        icon: "mdi:timer-off",
    },
];

pub fn setup_entities(devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    let mut entities: Vec<Arc<dyn Entity>> = Vec::new();
    for device in devices {
        for description in NUMBERS {
            if device.is_feature_supported(description.key) {
                entities.push(Arc::new(DreoNumber::new(device.clone(), *description)));
            }
        }
    }
    entities
}

#[derive(Debug)]
pub struct DreoNumber {
    base: DreoEntity,
    description: NumberDescription,
}

impl DreoNumber {
    pub fn new(device: Arc<DreoDevice>, description: NumberDescription) -> Self {
        Self {
            base: DreoEntity::new(device, Some(description.name), Some(description.key)),
            description,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.base.device().get_f64(self.description.key)
    }

    pub fn set_value(&self, value: f64) -> EntityResult<()> {
        let NumberDescription { key, min, max, .. } = self.description;
        if !(min..=max).contains(&value) {
            return Err(EntityError::OutOfRange {
                key: key.to_string(),
                value,
                min,
                max,
            });
        }
        self.base.device().set(key, value.round() as i64)?;
        Ok(())
    }
}

impl Entity for DreoNumber {
    fn platform(&self) -> Platform {
        Platform::Number
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
        match self.value() {
            Some(value) => value.to_string(),
            None => STATE_UNKNOWN.to_string(),
        }
    }

    fn attributes(&self) -> HashMap<String, Value> {
        HashMap::from([
            (attrs::MIN.to_string(), json!(self.description.min)),
            (attrs::MAX.to_string(), json!(self.description.max)),
            (attrs::STEP.to_string(), json!(self.description.step)),
            (attrs::UNIT_OF_MEASUREMENT.to_string(), json!(self.description.unit)),
            (attrs::ICON.to_string(), json!(self.description.icon)),
        ])
    }

    fn device_info(&self) -> DeviceInfo {
        self.base.device_info()
    }

    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()> {
        match call.service.as_str() {
            "set_value" => self.set_value(required_arg(call, attrs::VALUE)?),
            _ => Err(unsupported(Platform::Number, call)),
        }
    }
}
