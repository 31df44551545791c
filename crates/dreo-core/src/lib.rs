//! Core types shared by the Dreo integration crates
//!
//! These are the pieces of the host contract the integration depends on:
//! entity ids, state snapshots, service calls and the entity platforms.

mod entity_id;
mod platform;
mod service_call;
mod state;

pub use entity_id::{slugify, EntityId, EntityIdError};
pub use platform::Platform;
pub use service_call::ServiceCall;
pub use state::State;

/// State value for an entity that is switched on
pub const STATE_ON: &str = "on";

/// State value for an entity that is switched off
pub const STATE_OFF: &str = "off";

/// State value used when the backing device is not reachable
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// State value used when the backing property has not been reported yet
pub const STATE_UNKNOWN: &str = "unknown";

/// Standard attribute keys used in entity state and service data
pub mod attrs {
    pub const ENTITY_ID: &str = "entity_id";
    pub const FRIENDLY_NAME: &str = "friendly_name";
    pub const ICON: &str = "icon";
    pub const UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";
    pub const DEVICE_CLASS: &str = "device_class";

    pub const BRIGHTNESS: &str = "brightness";
    pub const COLOR_TEMP_KELVIN: &str = "color_temp_kelvin";
    pub const HS_COLOR: &str = "hs_color";
    pub const COLOR_MODE: &str = "color_mode";
    pub const SUPPORTED_COLOR_MODES: &str = "supported_color_modes";
    pub const MIN_COLOR_TEMP_KELVIN: &str = "min_color_temp_kelvin";
    pub const MAX_COLOR_TEMP_KELVIN: &str = "max_color_temp_kelvin";
    pub const SUPPORTED_FEATURES: &str = "supported_features";

    pub const PERCENTAGE: &str = "percentage";
    pub const PERCENTAGE_STEP: &str = "percentage_step";
    pub const PRESET_MODE: &str = "preset_mode";
    pub const PRESET_MODES: &str = "preset_modes";
    pub const OSCILLATING: &str = "oscillating";

    pub const HVAC_MODE: &str = "hvac_mode";
    pub const HVAC_MODES: &str = "hvac_modes";
    pub const CURRENT_TEMPERATURE: &str = "current_temperature";
    pub const TEMPERATURE: &str = "temperature";
    pub const MIN_TEMP: &str = "min_temp";
    pub const MAX_TEMP: &str = "max_temp";

    pub const HUMIDITY: &str = "humidity";
    pub const CURRENT_HUMIDITY: &str = "current_humidity";
    pub const MIN_HUMIDITY: &str = "min_humidity";
    pub const MAX_HUMIDITY: &str = "max_humidity";
    pub const MODE: &str = "mode";
    pub const AVAILABLE_MODES: &str = "available_modes";

    pub const VALUE: &str = "value";
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
    pub const STEP: &str = "step";
}
