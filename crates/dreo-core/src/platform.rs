//! Entity platforms the integration forwards setup to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An entity platform (entity domain) such as `fan` or `light`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Climate,
    Fan,
    Humidifier,
    Light,
    Number,
    Sensor,
    Switch,
}

impl Platform {
    /// All platforms, in setup order
    pub const ALL: [Platform; 7] = [
        Platform::Climate,
        Platform::Fan,
        Platform::Humidifier,
        Platform::Light,
        Platform::Number,
        Platform::Sensor,
        Platform::Switch,
    ];

    /// The entity domain string for this platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Climate => "climate",
            Platform::Fan => "fan",
            Platform::Humidifier => "humidifier",
            Platform::Light => "light",
            Platform::Number => "number",
            Platform::Sensor => "sensor",
            Platform::Switch => "switch",
        }
    }

    /// Read-only platforms only report state and accept no services
    pub fn is_readonly(&self) -> bool {
        matches!(self, Platform::Sensor)
    }

    /// Services an entity of this platform accepts
    pub fn services(&self) -> &'static [&'static str] {
        match self {
            Platform::Climate => &[
                "turn_on",
                "turn_off",
                "set_hvac_mode",
                "set_temperature",
                "set_preset_mode",
            ],
            Platform::Fan => &[
                "turn_on",
                "turn_off",
                "toggle",
                "set_percentage",
                "set_preset_mode",
                "oscillate",
            ],
            Platform::Humidifier => &["turn_on", "turn_off", "toggle", "set_humidity", "set_mode"],
            Platform::Light => &["turn_on", "turn_off", "toggle"],
            Platform::Number => &["set_value"],
            Platform::Sensor => &[],
            Platform::Switch => &["turn_on", "turn_off", "toggle"],
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown platform: {s}"))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>(), Ok(platform));
        }
        assert!("vacuum".parse::<Platform>().is_err());
    }

    #[test]
    fn test_sensor_has_no_services() {
        assert!(Platform::Sensor.is_readonly());
        assert!(Platform::Sensor.services().is_empty());
        assert!(Platform::Fan.services().contains(&"oscillate"));
    }
}
