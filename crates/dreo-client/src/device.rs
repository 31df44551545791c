//! A single Dreo device and its reported properties

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::keys;
use crate::{ClientResult, DreoDeviceType, Transport};

/// Model capabilities that are not part of the reported state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    /// Inclusive fan speed range, e.g. `(1, 9)`
    #[serde(default)]
    pub speed_range: Option<(u32, u32)>,

    /// Preset (mode) names; the device reports the 1-based index
    #[serde(default)]
    pub preset_modes: Vec<String>,

    /// Inclusive target temperature range in °F
    #[serde(default)]
    pub temperature_range: Option<(i64, i64)>,

    /// Inclusive target humidity range in %
    #[serde(default)]
    pub humidity_range: Option<(u32, u32)>,
}

/// A Dreo device owned by the device manager
///
/// Reads return the last value the device reported. Writes go through the
/// transport and update the cached value once the command is accepted.
pub struct DreoDevice {
    serial_number: String,
    name: String,
    model: String,
    product_name: Option<String>,
    device_type: DreoDeviceType,
    capabilities: DeviceCapabilities,
    state: DashMap<String, Value>,
    transport: Arc<dyn Transport>,
}

impl DreoDevice {
    pub fn new(
        serial_number: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let model = model.into();
        Self {
            serial_number: serial_number.into(),
            name: name.into(),
            device_type: DreoDeviceType::from_model(&model),
            model,
            product_name: None,
            capabilities: DeviceCapabilities::default(),
            state: DashMap::new(),
            transport,
        }
    }

    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = Some(product_name.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Seed the reported state
    pub fn with_state(self, state: Map<String, Value>) -> Self {
        for (key, value) in state {
            self.state.insert(key, value);
        }
        self
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    pub fn device_type(&self) -> DreoDeviceType {
        self.device_type
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Whether the device has ever reported the given property
    pub fn is_feature_supported(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// Devices are available unless they report `connected: false`
    pub fn is_connected(&self) -> bool {
        self.get_bool(keys::CONNECTED).unwrap_or(true)
    }

    /// Raw reported value of a property
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state
            .get(key)
            .map(|v| v.clone())
            .filter(|v| !v.is_null())
    }

    /// Boolean property; the cloud reports some flags as 0/1
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Write a single property
    pub fn set(&self, key: &str, value: impl Into<Value>) -> ClientResult<()> {
        let mut params = Map::new();
        params.insert(key.to_string(), value.into());
        self.set_many(params)
    }

    /// Write several properties in one command
    pub fn set_many(&self, params: Map<String, Value>) -> ClientResult<()> {
        debug!(serial_number = %self.serial_number, ?params, "Sending command");
        self.transport.send_command(&self.serial_number, &params)?;
        self.apply_update(params);
        Ok(())
    }

    /// Merge a state report pushed by the transport
    pub fn apply_update(&self, update: Map<String, Value>) {
        for (key, value) in update {
            trace!(serial_number = %self.serial_number, key = %key, %value, "Property updated");
            self.state.insert(key, value);
        }
    }

    /// Snapshot of every reported property
    pub fn state_snapshot(&self) -> Map<String, Value> {
        self.state
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    // Typed accessors for the properties the light platform drives.

    pub fn power_on(&self) -> Option<bool> {
        self.get_bool(keys::POWER_ON)
    }

    pub fn set_power_on(&self, on: bool) -> ClientResult<()> {
        self.set(keys::POWER_ON, on)
    }

    pub fn light_on(&self) -> Option<bool> {
        self.get_bool(keys::LIGHT_ON)
    }

    pub fn set_light_on(&self, on: bool) -> ClientResult<()> {
        self.set(keys::LIGHT_ON, on)
    }

    /// Main light brightness, 0-100
    pub fn brightness(&self) -> Option<i64> {
        self.get_i64(keys::BRIGHTNESS)
    }

    pub fn set_brightness(&self, brightness: i64) -> ClientResult<()> {
        self.set(keys::BRIGHTNESS, brightness)
    }

    /// Main light color temperature dial, 0-100
    pub fn color_temp(&self) -> Option<i64> {
        self.get_i64(keys::COLOR_TEMP)
    }

    pub fn set_color_temp(&self, dial: i64) -> ClientResult<()> {
        self.set(keys::COLOR_TEMP, dial)
    }

    pub fn atm_on(&self) -> Option<bool> {
        self.get_bool(keys::ATM_ON)
    }

    pub fn set_atm_on(&self, on: bool) -> ClientResult<()> {
        self.set(keys::ATM_ON, on)
    }

    /// Light ring brightness, 1-5
    pub fn atm_brightness(&self) -> Option<i64> {
        self.get_i64(keys::ATM_BRIGHTNESS)
    }

    pub fn set_atm_brightness(&self, level: i64) -> ClientResult<()> {
        self.set(keys::ATM_BRIGHTNESS, level)
    }

    /// Light ring color packed as 0xRRGGBB
    pub fn atm_color(&self) -> Option<u32> {
        self.get_i64(keys::ATM_COLOR)
            .and_then(|c| u32::try_from(c).ok())
    }

    pub fn set_atm_color(&self, color: u32) -> ClientResult<()> {
        self.set(keys::ATM_COLOR, color)
    }
}

impl fmt::Debug for DreoDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DreoDevice")
            .field("serial_number", &self.serial_number)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("device_type", &self.device_type)
            .finish_non_exhaustive()
    }
}
