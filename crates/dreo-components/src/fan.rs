//! Fan platform
//!
//! Tower fans, air circulators, air purifiers, ceiling fans and evaporative
//! coolers all expose power, speed and preset mode.

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{keys, DreoDevice};
use dreo_core::{attrs, Platform, ServiceCall};
use serde_json::{json, Value};
use tracing::debug;

use crate::conversions::{percentage_to_ranged_value, ranged_value_to_percentage};
use crate::entity::{
    mode_for_preset, on_off, optional_arg, preset_from_mode, required_arg, unsupported,
    DeviceInfo, DreoEntity, Entity,
};
use crate::{EntityError, EntityResult};

// FanEntityFeature bits
pub const SUPPORT_SET_SPEED: u32 = 1;
pub const SUPPORT_OSCILLATE: u32 = 2;
pub const SUPPORT_PRESET_MODE: u32 = 8;
pub const SUPPORT_TURN_OFF: u32 = 16;
pub const SUPPORT_TURN_ON: u32 = 32;

pub fn setup_entities(devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    devices
        .iter()
        .filter(|d| d.device_type().is_fan() && d.is_feature_supported(keys::POWER_ON))
        .map(|d| Arc::new(DreoFan::new(d.clone())) as Arc<dyn Entity>)
        .collect()
}

#[derive(Debug)]
pub struct DreoFan {
    base: DreoEntity,
}

impl DreoFan {
    pub fn new(device: Arc<DreoDevice>) -> Self {
        Self {
            base: DreoEntity::new(device, None, None),
        }
    }

    fn device(&self) -> &DreoDevice {
        self.base.device()
    }

    fn speed_range(&self) -> Option<(u32, u32)> {
        self.device().capabilities().speed_range
    }

    fn preset_modes(&self) -> &[String] {
        &self.device().capabilities().preset_modes
    }

    pub fn supported_features(&self) -> u32 {
        let mut features = SUPPORT_TURN_ON | SUPPORT_TURN_OFF;
        if self.speed_range().is_some() && self.device().is_feature_supported(keys::WIND_LEVEL) {
            features |= SUPPORT_SET_SPEED;
        }
        if self.device().is_feature_supported(keys::OSCILLATE) {
            features |= SUPPORT_OSCILLATE;
        }
        if !self.preset_modes().is_empty() {
            features |= SUPPORT_PRESET_MODE;
        }
        features
    }

    pub fn is_on(&self) -> Option<bool> {
        self.device().power_on()
    }

    pub fn percentage(&self) -> Option<u8> {
        let range = self.speed_range()?;
        let level = self.device().get_i64(keys::WIND_LEVEL)?;
        let level = u32::try_from(level).ok()?;
        Some(ranged_value_to_percentage(range, level))
    }

    pub fn speed_count(&self) -> Option<u32> {
        self.speed_range().map(|(low, high)| high.saturating_sub(low) + 1)
    }

    pub fn preset_mode(&self) -> Option<String> {
        preset_from_mode(self.preset_modes(), self.device().get(keys::MODE))
    }

    pub fn oscillating(&self) -> Option<bool> {
        self.device().get_bool(keys::OSCILLATE)
    }

    pub fn turn_on(&self, percentage: Option<u8>, preset_mode: Option<&str>) -> EntityResult<()> {
        if self.is_on() != Some(true) {
            self.device().set_power_on(true)?;
        }
        if let Some(percentage) = percentage {
            self.set_percentage(percentage)?;
        }
        if let Some(preset_mode) = preset_mode {
            self.set_preset_mode(preset_mode)?;
        }
        Ok(())
    }

    pub fn turn_off(&self) -> EntityResult<()> {
        self.device().set_power_on(false)?;
        Ok(())
    }

    /// Set the speed; 0 turns the fan off
    pub fn set_percentage(&self, percentage: u8) -> EntityResult<()> {
        if percentage > 100 {
            return Err(EntityError::OutOfRange {
                key: attrs::PERCENTAGE.to_string(),
                value: f64::from(percentage),
                min: 0.0,
                max: 100.0,
            });
        }
        if percentage == 0 {
            return self.turn_off();
        }

        let range = self
            .speed_range()
            .ok_or_else(|| EntityError::NotSupported(keys::WIND_LEVEL.to_string()))?;
        let level = percentage_to_ranged_value(range, percentage);
        debug!(entity = %self.base.unique_id(), percentage, level, "Setting fan speed");

        if self.is_on() != Some(true) {
            self.device().set_power_on(true)?;
        }
        self.device().set(keys::WIND_LEVEL, level)?;
        Ok(())
    }

    pub fn set_preset_mode(&self, preset_mode: &str) -> EntityResult<()> {
        let mode = mode_for_preset(self.preset_modes(), preset_mode)?;
        self.device().set(keys::MODE, mode)?;
        Ok(())
    }

    pub fn oscillate(&self, oscillating: bool) -> EntityResult<()> {
        if !self.device().is_feature_supported(keys::OSCILLATE) {
            return Err(EntityError::NotSupported(keys::OSCILLATE.to_string()));
        }
        self.device().set(keys::OSCILLATE, oscillating)?;
        Ok(())
    }
}

impl Entity for DreoFan {
    fn platform(&self) -> Platform {
        Platform::Fan
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
        let mut attributes = HashMap::new();
        attributes.insert(attrs::SUPPORTED_FEATURES.to_string(), json!(self.supported_features()));
        if let Some(percentage) = self.percentage() {
            attributes.insert(attrs::PERCENTAGE.to_string(), json!(percentage));
        }
        if let Some(count) = self.speed_count() {
            attributes.insert(attrs::PERCENTAGE_STEP.to_string(), json!(100.0 / f64::from(count)));
        }
        if !self.preset_modes().is_empty() {
            attributes.insert(attrs::PRESET_MODES.to_string(), json!(self.preset_modes()));
            attributes.insert(attrs::PRESET_MODE.to_string(), json!(self.preset_mode()));
        }
        if let Some(oscillating) = self.oscillating() {
            attributes.insert(attrs::OSCILLATING.to_string(), json!(oscillating));
        }
        attributes
    }

    fn device_info(&self) -> DeviceInfo {
        self.base.device_info()
    }

    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()> {
        match call.service.as_str() {
            "turn_on" => {
                let preset: Option<String> = optional_arg(call, attrs::PRESET_MODE)?;
                self.turn_on(optional_arg(call, attrs::PERCENTAGE)?, preset.as_deref())
            }
            "turn_off" => self.turn_off(),
            "toggle" if self.is_on() == Some(true) => self.turn_off(),
            "toggle" => self.turn_on(None, None),
            "set_percentage" => self.set_percentage(required_arg(call, attrs::PERCENTAGE)?),
            "set_preset_mode" => {
                let preset: String = required_arg(call, attrs::PRESET_MODE)?;
                self.set_preset_mode(&preset)
            }
            "oscillate" => self.oscillate(required_arg(call, attrs::OSCILLATING)?),
            _ => Err(unsupported(Platform::Fan, call)),
        }
    }
}
