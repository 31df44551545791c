//! Climate platform for heaters and air conditioners

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{keys, DreoDevice, DreoDeviceType};
use dreo_core::{attrs, Platform, ServiceCall};
use serde_json::{json, Value};
use tracing::debug;

use crate::entity::{
    mode_for_preset, optional_arg, preset_from_mode, required_arg, unsupported, DeviceInfo,
    DreoEntity, Entity,
};
use crate::{EntityError, EntityResult};

pub const HVAC_MODE_OFF: &str = "off";
pub const HVAC_MODE_HEAT: &str = "heat";
pub const HVAC_MODE_COOL: &str = "cool";

pub const TEMPERATURE_UNIT: &str = "°F";

/// Target range used when the model does not report one
pub const HEATER_TEMPERATURE_RANGE: (i64, i64) = (41, 95);
pub const AIR_CONDITIONER_TEMPERATURE_RANGE: (i64, i64) = (60, 86);

// ClimateEntityFeature bits
pub const SUPPORT_TARGET_TEMPERATURE: u32 = 1;
pub const SUPPORT_PRESET_MODE: u32 = 16;
pub const SUPPORT_TURN_OFF: u32 = 128;
pub const SUPPORT_TURN_ON: u32 = 256;

pub fn setup_entities(devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    devices
        .iter()
        .filter(|d| {
            matches!(
                d.device_type(),
                DreoDeviceType::Heater | DreoDeviceType::AirConditioner
            )
        })
        .map(|d| Arc::new(DreoClimate::new(d.clone())) as Arc<dyn Entity>)
        .collect()
}

#[derive(Debug)]
pub struct DreoClimate {
    base: DreoEntity,
}

impl DreoClimate {
    pub fn new(device: Arc<DreoDevice>) -> Self {
        Self {
            base: DreoEntity::new(device, None, None),
        }
    }

    fn device(&self) -> &DreoDevice {
        self.base.device()
    }

    fn preset_modes(&self) -> &[String] {
        &self.device().capabilities().preset_modes
    }

    /// The mode the device runs in while powered
    fn active_mode(&self) -> &'static str {
        match self.device().device_type() {
            DreoDeviceType::AirConditioner => HVAC_MODE_COOL,
            _ => HVAC_MODE_HEAT,
        }
    }

    pub fn hvac_modes(&self) -> [&'static str; 2] {
        [HVAC_MODE_OFF, self.active_mode()]
    }

    pub fn hvac_mode(&self) -> Option<&'static str> {
        self.device()
            .power_on()
            .map(|on| if on { self.active_mode() } else { HVAC_MODE_OFF })
    }

    pub fn temperature_range(&self) -> (i64, i64) {
        self.device()
            .capabilities()
            .temperature_range
            .unwrap_or(match self.device().device_type() {
                DreoDeviceType::AirConditioner => AIR_CONDITIONER_TEMPERATURE_RANGE,
                _ => HEATER_TEMPERATURE_RANGE,
            })
    }

    pub fn supported_features(&self) -> u32 {
        let mut features = SUPPORT_TURN_ON | SUPPORT_TURN_OFF;
        if self.device().is_feature_supported(keys::TARGET_TEMPERATURE) {
            features |= SUPPORT_TARGET_TEMPERATURE;
        }
        if !self.preset_modes().is_empty() {
            features |= SUPPORT_PRESET_MODE;
        }
        features
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.device().get_f64(keys::TEMPERATURE)
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.device().get_f64(keys::TARGET_TEMPERATURE)
    }

    pub fn preset_mode(&self) -> Option<String> {
        preset_from_mode(self.preset_modes(), self.device().get(keys::MODE))
    }

    pub fn turn_on(&self) -> EntityResult<()> {
        self.device().set_power_on(true)?;
        Ok(())
    }

    pub fn turn_off(&self) -> EntityResult<()> {
        self.device().set_power_on(false)?;
        Ok(())
    }

    pub fn set_hvac_mode(&self, mode: &str) -> EntityResult<()> {
        if mode == HVAC_MODE_OFF {
            self.turn_off()
        } else if mode == self.active_mode() {
            self.turn_on()
        } else {
            Err(EntityError::UnknownMode(mode.to_string()))
        }
    }

    /// Set the target temperature, clamped to the device range
    pub fn set_temperature(&self, temperature: f64) -> EntityResult<()> {
        if !self.device().is_feature_supported(keys::TARGET_TEMPERATURE) {
            return Err(EntityError::NotSupported(keys::TARGET_TEMPERATURE.to_string()));
        }
        let (min, max) = self.temperature_range();
        let target = (temperature.round() as i64).clamp(min, max);
        debug!(entity = %self.base.unique_id(), requested = temperature, target, "Setting target temperature");
        self.device().set(keys::TARGET_TEMPERATURE, target)?;
        Ok(())
    }

    pub fn set_preset_mode(&self, preset_mode: &str) -> EntityResult<()> {
        let mode = mode_for_preset(self.preset_modes(), preset_mode)?;
        self.device().set(keys::MODE, mode)?;
        Ok(())
    }
}

impl Entity for DreoClimate {
    fn platform(&self) -> Platform {
        Platform::Climate
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
        self.hvac_mode()
            .unwrap_or(dreo_core::STATE_UNKNOWN)
            .to_string()
    }

    fn attributes(&self) -> HashMap<String, Value> {
        let (min, max) = self.temperature_range();
        let mut attributes = HashMap::new();
        attributes.insert(attrs::SUPPORTED_FEATURES.to_string(), json!(self.supported_features()));
        attributes.insert(attrs::HVAC_MODES.to_string(), json!(self.hvac_modes()));
        attributes.insert(attrs::MIN_TEMP.to_string(), json!(min));
        attributes.insert(attrs::MAX_TEMP.to_string(), json!(max));
        attributes.insert(attrs::UNIT_OF_MEASUREMENT.to_string(), json!(TEMPERATURE_UNIT));
        if let Some(current) = self.current_temperature() {
            attributes.insert(attrs::CURRENT_TEMPERATURE.to_string(), json!(current));
        }
        if let Some(target) = self.target_temperature() {
            attributes.insert(attrs::TEMPERATURE.to_string(), json!(target));
        }
        if !self.preset_modes().is_empty() {
            attributes.insert(attrs::PRESET_MODES.to_string(), json!(self.preset_modes()));
            attributes.insert(attrs::PRESET_MODE.to_string(), json!(self.preset_mode()));
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
            "set_hvac_mode" => {
                let mode: String = required_arg(call, attrs::HVAC_MODE)?;
                self.set_hvac_mode(&mode)
            }
            "set_temperature" => {
                // an hvac_mode alongside the temperature is applied first
                if let Some(mode) = optional_arg::<String>(call, attrs::HVAC_MODE)? {
                    self.set_hvac_mode(&mode)?;
                }
                self.set_temperature(required_arg(call, attrs::TEMPERATURE)?)
            }
            "set_preset_mode" => {
                let preset: String = required_arg(call, attrs::PRESET_MODE)?;
                self.set_preset_mode(&preset)
            }
            _ => Err(unsupported(Platform::Climate, call)),
        }
    }
}
