//! Humidifier platform

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{keys, DreoDevice, DreoDeviceType};
use dreo_core::{attrs, Platform, ServiceCall};
use serde_json::{json, Value};

use crate::entity::{
    mode_for_preset, on_off, preset_from_mode, required_arg, unsupported, DeviceInfo, DreoEntity,
    Entity,
};
use crate::{EntityError, EntityResult};

pub const DEFAULT_HUMIDITY_RANGE: (u32, u32) = (30, 90);

/// `HumidifierEntityFeature::MODES`
pub const SUPPORT_MODES: u32 = 1;

pub fn setup_entities(devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    devices
        .iter()
        .filter(|d| d.device_type() == DreoDeviceType::Humidifier)
        .map(|d| Arc::new(DreoHumidifier::new(d.clone())) as Arc<dyn Entity>)
        .collect()
}

#[derive(Debug)]
pub struct DreoHumidifier {
    base: DreoEntity,
}

impl DreoHumidifier {
    pub fn new(device: Arc<DreoDevice>) -> Self {
        Self {
            base: DreoEntity::new(device, None, None),
        }
    }

    fn device(&self) -> &DreoDevice {
        self.base.device()
    }

    fn modes(&self) -> &[String] {
        &self.device().capabilities().preset_modes
    }

    pub fn humidity_range(&self) -> (u32, u32) {
        self.device()
            .capabilities()
            .humidity_range
            .unwrap_or(DEFAULT_HUMIDITY_RANGE)
    }

    pub fn is_on(&self) -> Option<bool> {
        self.device().power_on()
    }

    pub fn current_humidity(&self) -> Option<f64> {
        self.device().get_f64(keys::HUMIDITY)
    }

    pub fn target_humidity(&self) -> Option<i64> {
        self.device().get_i64(keys::TARGET_HUMIDITY)
    }

    pub fn mode(&self) -> Option<String> {
        preset_from_mode(self.modes(), self.device().get(keys::MODE))
    }

    pub fn turn_on(&self) -> EntityResult<()> {
        self.device().set_power_on(true)?;
        Ok(())
    }

    pub fn turn_off(&self) -> EntityResult<()> {
        self.device().set_power_on(false)?;
        Ok(())
    }

    /// Set the target humidity; values outside the device range are rejected
    pub fn set_humidity(&self, humidity: u32) -> EntityResult<()> {
        let (min, max) = self.humidity_range();
        if !(min..=max).contains(&humidity) {
            return Err(EntityError::OutOfRange {
                key: keys::TARGET_HUMIDITY.to_string(),
                value: f64::from(humidity),
                min: f64::from(min),
                max: f64::from(max),
            });
        }
        self.device().set(keys::TARGET_HUMIDITY, humidity)?;
        Ok(())
    }

    pub fn set_mode(&self, mode: &str) -> EntityResult<()> {
        let index = mode_for_preset(self.modes(), mode)?;
        self.device().set(keys::MODE, index)?;
        Ok(())
    }
}

impl Entity for DreoHumidifier {
    fn platform(&self) -> Platform {
        Platform::Humidifier
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
        let (min, max) = self.humidity_range();
        let mut attributes = HashMap::new();
        attributes.insert(attrs::MIN_HUMIDITY.to_string(), json!(min));
        attributes.insert(attrs::MAX_HUMIDITY.to_string(), json!(max));
        if let Some(current) = self.current_humidity() {
            attributes.insert(attrs::CURRENT_HUMIDITY.to_string(), json!(current));
        }
        if let Some(target) = self.target_humidity() {
            attributes.insert(attrs::HUMIDITY.to_string(), json!(target));
        }
        if !self.modes().is_empty() {
            attributes.insert(attrs::SUPPORTED_FEATURES.to_string(), json!(SUPPORT_MODES));
            attributes.insert(attrs::AVAILABLE_MODES.to_string(), json!(self.modes()));
            attributes.insert(attrs::MODE.to_string(), json!(self.mode()));
        }
        attributes
    }

    fn device_info(&self) -> DeviceInfo {
        self.base.device_info()
    }

    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()> {
        match call.service.as_str() {
            "turn_on" => self.turn_on(),
            "turn_off" => self.turn_off(),
            "toggle" if self.is_on() == Some(true) => self.turn_off(),
            "toggle" => self.turn_on(),
            "set_humidity" => self.set_humidity(required_arg(call, attrs::HUMIDITY)?),
            "set_mode" => {
                let mode: String = required_arg(call, attrs::MODE)?;
                self.set_mode(&mode)
            }
            _ => Err(unsupported(Platform::Humidifier, call)),
        }
    }
}
