//! Dreo integration
//!
//! Entry points the host calls for a Dreo config entry, the minimal host
//! runtime they run against, and the config/options flows.
//!
//! ```ignore
//! let hass = Arc::new(HomeAssistant::new());
//! let entries = Arc::new(ConfigEntries::new());
//! register(&entries, hass.clone(), factory);
//! entries.setup(&entry_id).await?;
//! hass.call_service(ServiceCall::new("light", "turn_on", json!({"entity_id": "light.office_fan_light"}))).await?;
//! ```

pub mod config_flow;
pub mod constants;
mod entity_registry;
mod hass;
mod setup;

use std::sync::Arc;

use async_trait::async_trait;
use dreo_client::DeviceManagerFactory;
use dreo_config_entries::{ConfigEntries, ConfigEntry, EntrySetupContext, SetupHandler};

pub use config_flow::{DreoConfigFlow, DreoOptionsFlow, FlowResult, FormField};
pub use constants::DOMAIN;
pub use entity_registry::EntityRegistry;
pub use hass::{HassError, HassResult, HomeAssistant, RuntimeData, ServiceError, ServiceResult};
pub use setup::{async_setup_entry, async_unload_entry, platforms_for, platforms_for_device_type};

/// Setup handler registered with the config entries manager for `dreo`
pub struct DreoIntegration {
    hass: Arc<HomeAssistant>,
    factory: Arc<dyn DeviceManagerFactory>,
}

impl DreoIntegration {
    pub fn new(hass: Arc<HomeAssistant>, factory: Arc<dyn DeviceManagerFactory>) -> Self {
        Self { hass, factory }
    }
}

#[async_trait]
impl SetupHandler for DreoIntegration {
    async fn setup_entry(&self, entry: &ConfigEntry, ctx: &EntrySetupContext) -> bool {
        async_setup_entry(&self.hass, self.factory.as_ref(), entry, ctx).await
    }

    async fn unload_entry(&self, entry: &ConfigEntry) -> bool {
        async_unload_entry(&self.hass, entry).await
    }
}

/// Register the integration's setup handler
pub fn register(
    entries: &ConfigEntries,
    hass: Arc<HomeAssistant>,
    factory: Arc<dyn DeviceManagerFactory>,
) {
    entries.register_handler(DOMAIN, Arc::new(DreoIntegration::new(hass, factory)));
}
