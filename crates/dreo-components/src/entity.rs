//! Entity contract shared by every platform

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::DreoDevice;
use dreo_core::{Platform, ServiceCall, STATE_OFF, STATE_ON, STATE_UNKNOWN};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{EntityError, EntityResult};

/// Integration domain, used for device identifiers
pub const DOMAIN: &str = "dreo";

pub const MANUFACTURER: &str = "Dreo";

/// Device registry information for an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, String)>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
}

/// An entity exposed to the host
///
/// Reads go straight to the device's cached properties, so the state is
/// always the device's last report. Commands are blocking device writes;
/// the host runs `handle_service` off the event loop.
pub trait Entity: Send + Sync {
    fn platform(&self) -> Platform;

    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// State string while available
    fn state(&self) -> String;

    fn attributes(&self) -> HashMap<String, Value> {
        HashMap::new()
    }

    fn device_info(&self) -> DeviceInfo;

    /// Run one of the platform's services against the device
    fn handle_service(&self, call: &ServiceCall) -> EntityResult<()>;
}

/// Naming, identity and availability common to all Dreo entities
#[derive(Debug, Clone)]
pub struct DreoEntity {
    device: Arc<DreoDevice>,
    name: String,
    unique_id: String,
}

impl DreoEntity {
    /// `name_suffix` is appended to the device name after a space,
    /// `id_suffix` to the serial number after a dash.
    pub fn new(device: Arc<DreoDevice>, name_suffix: Option<&str>, id_suffix: Option<&str>) -> Self {
        let name = match name_suffix {
            Some(suffix) => format!("{} {}", device.name(), suffix),
            None => device.name().to_string(),
        };
        let unique_id = match id_suffix {
            Some(suffix) => format!("{}-{}", device.serial_number(), suffix),
            None => device.serial_number().to_string(),
        };
        Self {
            device,
            name,
            unique_id,
        }
    }

    pub fn device(&self) -> &Arc<DreoDevice> {
        &self.device
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn available(&self) -> bool {
        self.device.is_connected()
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            identifiers: vec![(DOMAIN.to_string(), self.device.serial_number().to_string())],
            manufacturer: MANUFACTURER.to_string(),
            model: self.device.model().to_string(),
            name: self.device.name().to_string(),
        }
    }
}

/// State string for an optional on/off flag
pub fn on_off(value: Option<bool>) -> String {
    match value {
        Some(true) => STATE_ON.to_string(),
        Some(false) => STATE_OFF.to_string(),
        None => STATE_UNKNOWN.to_string(),
    }
}

/// Optional service argument; present but malformed is an error
pub fn optional_arg<T: DeserializeOwned>(call: &ServiceCall, key: &str) -> EntityResult<Option<T>> {
    match call.service_data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => call
            .get(key)
            .map(Some)
            .ok_or_else(|| EntityError::InvalidData(key.to_string())),
    }
}

pub fn required_arg<T: DeserializeOwned>(call: &ServiceCall, key: &str) -> EntityResult<T> {
    optional_arg(call, key)?.ok_or_else(|| EntityError::MissingData(key.to_string()))
}

pub(crate) fn unsupported(platform: Platform, call: &ServiceCall) -> EntityError {
    EntityError::UnsupportedService {
        platform,
        service: call.service.clone(),
    }
}

/// Preset name for a 1-based mode index, or the mode itself when the device
/// reports names
pub(crate) fn preset_from_mode(presets: &[String], mode: Option<Value>) -> Option<String> {
    match mode? {
        Value::String(name) => Some(name),
        Value::Number(n) => {
            let index = usize::try_from(n.as_u64()?).ok()?;
            presets.get(index.checked_sub(1)?).cloned()
        }
        _ => None,
    }
}

/// 1-based mode index for a preset name
pub(crate) fn mode_for_preset(presets: &[String], preset: &str) -> EntityResult<i64> {
    presets
        .iter()
        .position(|p| p == preset)
        .map(|index| index as i64 + 1)
        .ok_or_else(|| EntityError::UnknownMode(preset.to_string()))
}
