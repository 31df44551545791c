//! Entry setup, unload and reload

mod common;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use common::{mock_entry, FailingFactory, TestDreo};
use dreo_client::{DeviceManager, Transport};
use dreo_config_entries::{ConfigEntries, ConfigEntriesError, ConfigEntryState};
use dreo_core::Platform;
use dreo_integration::{register, HomeAssistant};
use serde_json::json;

#[tokio::test]
async fn test_setup_creates_entities_for_supported_devices() {
    let dreo = TestDreo::new().setup().await;

    let entry = dreo.entries.get(&dreo.entry_id).unwrap();
    assert_eq!(entry.state, ConfigEntryState::Loaded);

    let runtime = dreo.hass.runtime_data(&dreo.entry_id).unwrap();
    assert_eq!(runtime.platforms, BTreeSet::from(Platform::ALL));
    assert_eq!(dreo.manager().devices().len(), 4);

    let ids = dreo.hass.entities.entity_ids();
    for expected in [
        "fan.office_fan",
        "light.office_fan_light",
        "light.office_fan_light_ring",
        "switch.office_fan_panel_sound",
        "number.office_fan_timer_off",
        "fan.bedroom_tower",
        "switch.bedroom_tower_oscillating",
        "switch.bedroom_tower_child_lock",
        "sensor.bedroom_tower_temperature",
        "climate.den_heater",
        "switch.den_heater_heater_ptc",
        "humidifier.nursery_humidifier",
        "sensor.nursery_humidifier_humidity",
    ] {
        assert!(ids.iter().any(|id| id == expected), "missing {expected}, have {ids:?}");
    }
    assert!(!ids.iter().any(|id| id.contains("mystery")));
    // the ceiling fan light is a light entity, not a switch
    assert!(!ids.iter().any(|id| id == "switch.office_fan_light"));
}

#[tokio::test]
async fn test_initial_states() {
    let dreo = TestDreo::new().setup().await;

    dreo.assert_state("fan.office_fan", "on");
    dreo.assert_state("light.office_fan_light", "off");
    dreo.assert_state("climate.den_heater", "heat");
    dreo.assert_state("humidifier.nursery_humidifier", "off");
    dreo.assert_state("sensor.bedroom_tower_temperature", "72");

    let fan = dreo.state("fan.office_fan");
    assert_eq!(fan.attribute::<u8>("percentage"), Some(33));
    assert_eq!(fan.attribute::<String>("preset_mode").as_deref(), Some("normal"));
    assert_eq!(fan.attribute::<String>("friendly_name").as_deref(), Some("Office Fan"));

    let ring = dreo.state("light.office_fan_light_ring");
    assert_eq!(ring.attribute::<u8>("brightness"), Some(153));
    assert_eq!(ring.attribute::<(f64, f64)>("hs_color"), Some((30.118, 100.0)));
}

#[tokio::test]
async fn test_transport_started_and_auto_reconnect_default() {
    let dreo = TestDreo::new().setup().await;
    let manager = dreo.manager();
    assert!(manager.transport().is_running());
    assert!(manager.auto_reconnect());
}

#[tokio::test]
async fn test_auto_reconnect_from_options() {
    let dreo = TestDreo::with_options(HashMap::from([(
        "auto_reconnect".to_string(),
        json!(false),
    )]))
    .setup()
    .await;
    assert!(!dreo.manager().auto_reconnect());
}

async fn setup_failing(fail_login: bool) -> (Arc<HomeAssistant>, Arc<ConfigEntries>, String) {
    let hass = Arc::new(HomeAssistant::new());
    let entries = Arc::new(ConfigEntries::new());
    register(&entries, hass.clone(), Arc::new(FailingFactory { fail_login }));
    let entry = entries.add(mock_entry(HashMap::new())).unwrap();
    (hass, entries, entry.entry_id)
}

#[tokio::test]
async fn test_login_failure_fails_setup() {
    let (hass, entries, entry_id) = setup_failing(true).await;

    let result = entries.setup(&entry_id).await;
    assert!(matches!(result, Err(ConfigEntriesError::SetupFailed(_))));
    assert_eq!(entries.get(&entry_id).unwrap().state, ConfigEntryState::SetupError);
    assert!(hass.data.is_empty());
    assert!(hass.entities.is_empty());
}

#[tokio::test]
async fn test_device_load_failure_fails_setup() {
    let (hass, entries, entry_id) = setup_failing(false).await;

    assert!(entries.setup(&entry_id).await.is_err());
    assert_eq!(entries.get(&entry_id).unwrap().state, ConfigEntryState::SetupError);
    assert!(hass.runtime_data(&entry_id).is_none());
}

#[tokio::test]
async fn test_missing_credentials_fail_setup() {
    let hass = Arc::new(HomeAssistant::new());
    let entries = Arc::new(ConfigEntries::new());
    register(&entries, hass.clone(), Arc::new(FailingFactory { fail_login: false }));
    let entry = entries
        .add(dreo_config_entries::ConfigEntry::new("dreo", "no credentials"))
        .unwrap();

    assert!(entries.setup(&entry.entry_id).await.is_err());
}

#[tokio::test]
async fn test_unload_removes_data_and_stops_transport() {
    let dreo = TestDreo::new().setup().await;
    let manager = dreo.manager();

    dreo.entries.unload(&dreo.entry_id).await.unwrap();

    assert_eq!(
        dreo.entries.get(&dreo.entry_id).unwrap().state,
        ConfigEntryState::NotLoaded
    );
    assert!(dreo.hass.runtime_data(&dreo.entry_id).is_none());
    assert!(dreo.hass.entities.is_empty());
    assert!(!manager.transport().is_running());
}

#[tokio::test]
async fn test_options_update_reloads_entry() {
    let dreo = TestDreo::new().setup().await;
    let first = dreo.manager();

    dreo.entries
        .update_options(
            &dreo.entry_id,
            HashMap::from([("auto_reconnect".to_string(), json!(false))]),
        )
        .await
        .unwrap();

    let second = dreo.manager();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!first.transport().is_running());
    assert!(second.transport().is_running());
    assert!(!second.auto_reconnect());

    assert_eq!(
        dreo.entries.get(&dreo.entry_id).unwrap().state,
        ConfigEntryState::Loaded
    );
    // same entities come back with the same ids
    assert!(dreo.hass.entities.entity("light.office_fan_light").is_some());
    assert!(dreo.hass.entities.entity("light.office_fan_light_2").is_none());
}

#[tokio::test]
async fn test_remove_entry_unloads_it() {
    let dreo = TestDreo::new().setup().await;
    let manager = dreo.manager();

    dreo.entries.remove(&dreo.entry_id).await.unwrap();

    assert!(dreo.entries.get(&dreo.entry_id).is_none());
    assert!(dreo.hass.entities.is_empty());
    assert!(!manager.transport().is_running());
}

#[tokio::test]
async fn test_platforms_follow_device_types() {
    let dir = common::write_payload(
        r#"{"devices": [{
            "deviceSn": "HHM-1",
            "deviceName": "Kitchen Humidifier",
            "model": "DR-HHM001S",
            "state": {"poweron": true, "rh": 45, "rhautolevel": 55}
        }]}"#,
    );
    let payload = dreo_client::DebugTestModePayload::load(dir.path()).unwrap();

    let hass = Arc::new(HomeAssistant::new());
    let entries = Arc::new(ConfigEntries::new());
    register(
        &entries,
        hass.clone(),
        Arc::new(dreo_client::DebugTestModeFactory::new(payload)),
    );
    let entry = entries.add(mock_entry(HashMap::new())).unwrap();
    entries.setup(&entry.entry_id).await.unwrap();

    let runtime = hass.runtime_data(&entry.entry_id).unwrap();
    assert_eq!(
        runtime.platforms,
        BTreeSet::from([
            Platform::Humidifier,
            Platform::Sensor,
            Platform::Switch,
            Platform::Number
        ])
    );
    assert_eq!(
        hass.entities.entity_ids(),
        vec![
            "humidifier.kitchen_humidifier",
            "sensor.kitchen_humidifier_humidity"
        ]
    );
    assert_eq!(
        hass.entities.get_state("humidifier.kitchen_humidifier").unwrap().state,
        "on"
    );
}
