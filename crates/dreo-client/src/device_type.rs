//! Dreo device families

use serde::{Deserialize, Serialize};
use std::fmt;

/// The family a Dreo model belongs to, which decides the entity platforms
/// it is exposed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DreoDeviceType {
    TowerFan,
    AirCirculator,
    AirPurifier,
    CeilingFan,
    Heater,
    AirConditioner,
    Humidifier,
    ChefMaker,
    EvaporativeCooler,
    Unknown,
}

/// Model number prefixes per device family
const MODEL_PREFIXES: &[(&str, DreoDeviceType)] = &[
    ("DR-HTF", DreoDeviceType::TowerFan),
    ("DR-HAF", DreoDeviceType::AirCirculator),
    ("DR-HPF", DreoDeviceType::AirCirculator),
    ("DR-HAP", DreoDeviceType::AirPurifier),
    ("DR-HCF", DreoDeviceType::CeilingFan),
    ("DR-HSH", DreoDeviceType::Heater),
    ("WH", DreoDeviceType::Heater),
    ("DR-HAC", DreoDeviceType::AirConditioner),
    ("DR-HHM", DreoDeviceType::Humidifier),
    ("DR-KCM", DreoDeviceType::ChefMaker),
    ("DR-HEC", DreoDeviceType::EvaporativeCooler),
];

impl DreoDeviceType {
    /// Classify a model string such as `DR-HTF008S`
    pub fn from_model(model: &str) -> Self {
        let model = model.trim().to_ascii_uppercase();
        MODEL_PREFIXES
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map(|(_, device_type)| *device_type)
            .unwrap_or(DreoDeviceType::Unknown)
    }

    /// Device families that are driven as a fan entity
    pub fn is_fan(&self) -> bool {
        matches!(
            self,
            DreoDeviceType::TowerFan
                | DreoDeviceType::AirCirculator
                | DreoDeviceType::AirPurifier
                | DreoDeviceType::CeilingFan
                | DreoDeviceType::EvaporativeCooler
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DreoDeviceType::TowerFan => "tower_fan",
            DreoDeviceType::AirCirculator => "air_circulator",
            DreoDeviceType::AirPurifier => "air_purifier",
            DreoDeviceType::CeilingFan => "ceiling_fan",
            DreoDeviceType::Heater => "heater",
            DreoDeviceType::AirConditioner => "air_conditioner",
            DreoDeviceType::Humidifier => "humidifier",
            DreoDeviceType::ChefMaker => "chef_maker",
            DreoDeviceType::EvaporativeCooler => "evaporative_cooler",
            DreoDeviceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DreoDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
