//! Config entry setup and unload

use std::collections::BTreeSet;

use dreo_client::{Credentials, DeviceManagerFactory, DreoDeviceType};
use dreo_config_entries::{ConfigEntry, EntrySetupContext, UpdateListener};
use dreo_core::Platform;
use tracing::{debug, error, info, instrument, warn};

use crate::constants::{CONF_AUTO_RECONNECT, CONF_PASSWORD, CONF_USERNAME, DEFAULT_AUTO_RECONNECT};
use crate::hass::{HomeAssistant, RuntimeData};

/// Platforms a device family is exposed on
pub fn platforms_for_device_type(device_type: DreoDeviceType) -> &'static [Platform] {
    use Platform::*;
    match device_type {
        DreoDeviceType::TowerFan | DreoDeviceType::AirCirculator | DreoDeviceType::AirPurifier => {
            &[Fan, Sensor, Switch, Number]
        }
        DreoDeviceType::CeilingFan => &[Fan, Light, Sensor, Switch, Number],
        DreoDeviceType::Heater | DreoDeviceType::AirConditioner => {
            &[Climate, Sensor, Switch, Number]
        }
        DreoDeviceType::Humidifier => &[Humidifier, Sensor, Switch, Number],
        DreoDeviceType::ChefMaker => &[Sensor, Switch, Number],
        DreoDeviceType::EvaporativeCooler => &[Fan, Sensor, Switch, Number],
        DreoDeviceType::Unknown => &[],
    }
}

/// Union of the platforms needed by the given device families
pub fn platforms_for(device_types: &BTreeSet<DreoDeviceType>) -> BTreeSet<Platform> {
    device_types
        .iter()
        .flat_map(|t| platforms_for_device_type(*t).iter().copied())
        .collect()
}

/// Set up a Dreo config entry
///
/// Logs in, loads the account's devices, starts the transport and forwards
/// setup to the platforms the devices need. Returns `false` when the vendor
/// service cannot be reached.
#[instrument(skip_all, fields(entry_id = %entry.entry_id))]
pub async fn async_setup_entry(
    hass: &HomeAssistant,
    factory: &dyn DeviceManagerFactory,
    entry: &ConfigEntry,
    ctx: &EntrySetupContext,
) -> bool {
    debug!("async_setup_entry");

    let (Some(username), Some(password)) = (
        entry.data_str(CONF_USERNAME),
        entry.data_str(CONF_PASSWORD),
    ) else {
        error!("Config entry is missing username or password");
        return false;
    };

    let auto_reconnect = match entry.option_bool(CONF_AUTO_RECONNECT) {
        Some(auto_reconnect) => auto_reconnect,
        None => {
            debug!("auto_reconnect is not set, defaulting to {}", DEFAULT_AUTO_RECONNECT);
            DEFAULT_AUTO_RECONNECT
        }
    };

    let credentials = Credentials::new(username, password);
    debug!(username = %credentials.username, region = %credentials.region, "Creating device manager");

    if factory.is_debug_test_mode() {
        error!("Debug test mode is active, devices come from a local payload");
    }
    let manager = factory.create(&credentials);
    manager.set_auto_reconnect(auto_reconnect);

    let job_manager = manager.clone();
    if let Err(err) = hass.async_add_device_job(move || job_manager.login()).await {
        error!(error = %err, "Unable to login to the dreo server");
        return false;
    }

    let job_manager = manager.clone();
    if let Err(err) = hass.async_add_device_job(move || job_manager.load_devices()).await {
        error!(error = %err, "Unable to load devices from the dreo server");
        return false;
    }

    let devices = manager.devices();
    let device_types: BTreeSet<DreoDeviceType> = devices.iter().map(|d| d.device_type()).collect();
    debug!(?device_types, "Device types found");
    info!("{} Dreo devices found", devices.len());

    let platforms = platforms_for(&device_types);

    let job_manager = manager.clone();
    if let Err(err) = hass.async_add_device_job(move || job_manager.start_transport()).await {
        error!(error = %err, "Unable to start the dreo transport");
        return false;
    }

    hass.data.insert(
        entry.entry_id.clone(),
        RuntimeData {
            manager,
            platforms: platforms.clone(),
        },
    );
    debug!(?platforms, "Forwarding setup to platforms");

    for platform in &platforms {
        let entities = dreo_components::setup_platform(*platform, &devices);
        hass.entities.add_entities(&entry.entry_id, *platform, entities);
    }

    ctx.add_update_listener(UpdateListener::Reload);
    true
}

/// Unload a Dreo config entry
///
/// Runtime data is only dropped when every platform unloads; the transport
/// is stopped either way.
#[instrument(skip_all, fields(entry_id = %entry.entry_id))]
pub async fn async_unload_entry(hass: &HomeAssistant, entry: &ConfigEntry) -> bool {
    let Some(runtime) = hass.runtime_data(&entry.entry_id) else {
        warn!("No runtime data for entry, nothing to unload");
        return false;
    };

    let unload_ok = hass
        .entities
        .unload_platforms(&entry.entry_id, &runtime.platforms);
    if unload_ok {
        hass.data.remove(&entry.entry_id);
    }

    let manager = runtime.manager.clone();
    if let Err(err) = hass
        .async_add_executor_job(move || manager.stop_transport())
        .await
    {
        warn!(error = %err, "Stopping the dreo transport failed");
    }

    unload_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platforms_per_device_type() {
        let ceiling = BTreeSet::from([DreoDeviceType::CeilingFan]);
        assert_eq!(
            platforms_for(&ceiling),
            BTreeSet::from([
                Platform::Fan,
                Platform::Light,
                Platform::Sensor,
                Platform::Switch,
                Platform::Number
            ])
        );

        let heater = BTreeSet::from([DreoDeviceType::Heater]);
        assert!(platforms_for(&heater).contains(&Platform::Climate));
        assert!(!platforms_for(&heater).contains(&Platform::Fan));

        let chef = BTreeSet::from([DreoDeviceType::ChefMaker]);
        assert_eq!(
            platforms_for(&chef),
            BTreeSet::from([Platform::Sensor, Platform::Switch, Platform::Number])
        );

        assert!(platforms_for(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_platforms_union() {
        let mixed = BTreeSet::from([DreoDeviceType::Humidifier, DreoDeviceType::TowerFan]);
        let platforms = platforms_for(&mixed);
        assert!(platforms.contains(&Platform::Humidifier));
        assert!(platforms.contains(&Platform::Fan));
        assert!(!platforms.contains(&Platform::Light));
        assert_eq!(platforms.len(), 5);
    }
}
