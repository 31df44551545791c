//! Ceiling fan lights
//!
//! A ceiling fan can carry a main light (brightness and color temperature)
//! and an RGB light ring (brightness and hue/saturation).

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{keys, DreoDevice, DreoDeviceType};
use dreo_core::{attrs, Platform, ServiceCall};
use serde_json::{json, Value};
use tracing::debug;

use crate::conversions::{
    brightness_from_hass, brightness_to_hass, dial_to_kelvin, hs_to_rgb, kelvin_to_dial,
    pack_rgb, ring_brightness_from_hass, ring_brightness_to_hass, rgb_to_hs, unpack_rgb,
    DREO_FAN_LIGHT_MAX_KELVIN, DREO_FAN_LIGHT_MIN_KELVIN,
};
use crate::entity::{on_off, optional_arg, unsupported, DeviceInfo, DreoEntity, Entity};
use crate::EntityResult;

/// `LightEntityFeature::TRANSITION`
pub const SUPPORT_TRANSITION: u32 = 32;

pub const COLOR_MODE_COLOR_TEMP: &str = "color_temp";
pub const COLOR_MODE_BRIGHTNESS: &str = "brightness";
pub const COLOR_MODE_HS: &str = "hs";

/// Build light entities for every ceiling fan
pub fn setup_entities(devices: &[Arc<DreoDevice>]) -> Vec<Arc<dyn Entity>> {
    let mut entities: Vec<Arc<dyn Entity>> = Vec::new();
    for device in devices {
        if device.device_type() != DreoDeviceType::CeilingFan {
            continue;
        }
        if device.is_feature_supported(keys::LIGHT_ON) {
            entities.push(Arc::new(DreoFanLight::new(device.clone())));
        }
        if device.is_feature_supported(keys::ATM_ON) {
            entities.push(Arc::new(DreoFanRgbLight::new(device.clone())));
        }
    }
    entities
}

/// Main light of a ceiling fan
#[derive(Debug)]
pub struct DreoFanLight {
    base: DreoEntity,
}

impl DreoFanLight {
    pub fn new(device: Arc<DreoDevice>) -> Self {
        Self {
            base: DreoEntity::new(device, Some("Light"), Some("light")),
        }
    }

    fn device(&self) -> &DreoDevice {
        self.base.device()
    }

    pub fn is_on(&self) -> Option<bool> {
        self.device().light_on()
    }

    pub fn brightness(&self) -> Option<u8> {
        self.device().brightness().map(brightness_to_hass)
    }

    pub fn color_temp_kelvin(&self) -> Option<u32> {
        self.device()
            .color_temp()
            .map(|dial| dial_to_kelvin(dial, DREO_FAN_LIGHT_MIN_KELVIN, DREO_FAN_LIGHT_MAX_KELVIN))
    }

    pub fn turn_on(&self, brightness: Option<u8>, color_temp_kelvin: Option<u32>) -> EntityResult<()> {
        if let Some(brightness) = brightness {
            self.device().set_brightness(brightness_from_hass(brightness))?;
        }

        if let Some(kelvin) = color_temp_kelvin {
            let dial = kelvin_to_dial(kelvin, DREO_FAN_LIGHT_MIN_KELVIN, DREO_FAN_LIGHT_MAX_KELVIN);
            self.device().set_color_temp(dial)?;
        }

        if self.is_on() != Some(true) {
            self.device().set_light_on(true)?;
        }
        Ok(())
    }

    pub fn turn_off(&self) -> EntityResult<()> {
        self.device().set_light_on(false)?;
        Ok(())
    }
}

impl Entity for DreoFanLight {
    fn platform(&self) -> Platform {
        Platform::Light
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
        attributes.insert(
            attrs::SUPPORTED_COLOR_MODES.to_string(),
            json!([COLOR_MODE_BRIGHTNESS, COLOR_MODE_COLOR_TEMP]),
        );
        attributes.insert(attrs::COLOR_MODE.to_string(), json!(COLOR_MODE_COLOR_TEMP));
        attributes.insert(
            attrs::MIN_COLOR_TEMP_KELVIN.to_string(),
            json!(DREO_FAN_LIGHT_MIN_KELVIN),
        );
        attributes.insert(
            attrs::MAX_COLOR_TEMP_KELVIN.to_string(),
            json!(DREO_FAN_LIGHT_MAX_KELVIN),
        );
        attributes.insert(attrs::SUPPORTED_FEATURES.to_string(), json!(SUPPORT_TRANSITION));
        if let Some(brightness) = self.brightness() {
            attributes.insert(attrs::BRIGHTNESS.to_string(), json!(brightness));
        }
        if let Some(kelvin) = self.color_temp_kelvin() {
            attributes.insert(attrs::COLOR_TEMP_KELVIN.to_string(), json!(kelvin));
        }
        attributes
    }

    fn device_info(&self) -> DeviceInfo {
        self.base.device_info()
    }

    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()> {
        debug!(entity = %self.unique_id(), service = %call.service, "Handling light service");
        match call.service.as_str() {
            "turn_on" => self.turn_on(
                optional_arg(call, attrs::BRIGHTNESS)?,
                optional_arg(call, attrs::COLOR_TEMP_KELVIN)?,
            ),
            "turn_off" => self.turn_off(),
            "toggle" if self.is_on() == Some(true) => self.turn_off(),
            "toggle" => self.turn_on(None, None),
            _ => Err(unsupported(Platform::Light, call)),
        }
    }
}

/// RGB light ring of a ceiling fan
#[derive(Debug)]
pub struct DreoFanRgbLight {
    base: DreoEntity,
}

impl DreoFanRgbLight {
    pub fn new(device: Arc<DreoDevice>) -> Self {
        Self {
            base: DreoEntity::new(device, Some("Light Ring"), Some("rgb-light")),
        }
    }

    fn device(&self) -> &DreoDevice {
        self.base.device()
    }

    pub fn is_on(&self) -> Option<bool> {
        self.device().atm_on()
    }

    pub fn brightness(&self) -> Option<u8> {
        self.device().atm_brightness().map(ring_brightness_to_hass)
    }

    pub fn hs_color(&self) -> Option<(f64, f64)> {
        let (red, green, blue) = unpack_rgb(self.device().atm_color()?);
        Some(rgb_to_hs(red, green, blue))
    }

    pub fn turn_on(&self, brightness: Option<u8>, hs_color: Option<(f64, f64)>) -> EntityResult<()> {
        if let Some(brightness) = brightness {
            self.device()
                .set_atm_brightness(ring_brightness_from_hass(brightness))?;
        }

        if let Some((hue, saturation)) = hs_color {
            let (red, green, blue) = hs_to_rgb(hue, saturation);
            self.device().set_atm_color(pack_rgb(red, green, blue))?;
        }

        if self.is_on() != Some(true) {
            self.device().set_atm_on(true)?;
        }
        Ok(())
    }

    pub fn turn_off(&self) -> EntityResult<()> {
        self.device().set_atm_on(false)?;
        Ok(())
    }
}

impl Entity for DreoFanRgbLight {
    fn platform(&self) -> Platform {
        Platform::Light
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
        attributes.insert(attrs::SUPPORTED_COLOR_MODES.to_string(), json!([COLOR_MODE_HS]));
        attributes.insert(attrs::COLOR_MODE.to_string(), json!(COLOR_MODE_HS));
        if let Some(brightness) = self.brightness() {
            attributes.insert(attrs::BRIGHTNESS.to_string(), json!(brightness));
        }
        if let Some((hue, saturation)) = self.hs_color() {
            attributes.insert(attrs::HS_COLOR.to_string(), json!([hue, saturation]));
        }
        attributes
    }

    fn device_info(&self) -> DeviceInfo {
        self.base.device_info()
    }

    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()> {
        debug!(entity = %self.unique_id(), service = %call.service, "Handling light service");
        match call.service.as_str() {
            "turn_on" => self.turn_on(
                optional_arg(call, attrs::BRIGHTNESS)?,
                optional_arg(call, attrs::HS_COLOR)?,
            ),
            "turn_off" => self.turn_off(),
            "toggle" if self.is_on() == Some(true) => self.turn_off(),
            "toggle" => self.turn_on(None, None),
            _ => Err(unsupported(Platform::Light, call)),
        }
    }
}
