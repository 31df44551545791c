//! A host with the Dreo integration registered and one config entry

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dreo_client::{
    ClientError, ClientResult, DebugTestModeFactory, DebugTestModeManager, DeviceManager,
    DeviceManagerFactory, DreoDevice, Credentials, SentCommand,
};
use dreo_config_entries::{ConfigEntries, ConfigEntry};
use dreo_core::{ServiceCall, State};
use dreo_integration::{register, HomeAssistant, ServiceResult, DOMAIN};
use serde_json::{json, Value};

use super::load_payload;

pub const TEST_USERNAME: &str = "User@Example.com";
pub const TEST_PASSWORD: &str = "hunter2";

pub fn mock_entry(options: HashMap<String, Value>) -> ConfigEntry {
    ConfigEntry::new(DOMAIN, TEST_USERNAME)
        .with_data(HashMap::from([
            ("username".to_string(), json!(TEST_USERNAME)),
            ("password".to_string(), json!(TEST_PASSWORD)),
        ]))
        .with_options(options)
        .with_unique_id(TEST_USERNAME.to_lowercase())
}

pub struct TestDreo {
    pub hass: Arc<HomeAssistant>,
    pub entries: Arc<ConfigEntries>,
    pub factory: Arc<DebugTestModeFactory>,
    pub entry_id: String,
}

impl TestDreo {
    pub fn new() -> Self {
        Self::with_options(HashMap::new())
    }

    pub fn with_options(options: HashMap<String, Value>) -> Self {
        let hass = Arc::new(HomeAssistant::new());
        let entries = Arc::new(ConfigEntries::new());
        let factory = Arc::new(DebugTestModeFactory::new(load_payload()));
        register(&entries, hass.clone(), factory.clone());

        let entry = entries
            .add(mock_entry(options))
            .expect("entry should be added");

        Self {
            hass,
            entries,
            factory,
            entry_id: entry.entry_id,
        }
    }

    /// Set up the entry, panicking on failure
    pub async fn setup(self) -> Self {
        self.entries
            .setup(&self.entry_id)
            .await
            .expect("setup should succeed");
        self
    }

    pub fn manager(&self) -> Arc<DebugTestModeManager> {
        self.factory
            .last_manager()
            .expect("a manager should have been created")
    }

    pub fn device(&self, serial_number: &str) -> Arc<DreoDevice> {
        self.manager()
            .devices()
            .into_iter()
            .find(|d| d.serial_number() == serial_number)
            .unwrap_or_else(|| panic!("no device {}", serial_number))
    }

    pub fn sent_commands(&self) -> Vec<SentCommand> {
        self.manager().transport().sent_commands()
    }

    pub fn state(&self, entity_id: &str) -> State {
        self.hass
            .entities
            .get_state(entity_id)
            .unwrap_or_else(|| panic!("no state for {}", entity_id))
    }

    pub fn assert_state(&self, entity_id: &str, expected: &str) {
        let state = self.state(entity_id);
        assert_eq!(
            state.state, expected,
            "Expected entity {} to be in state '{}', but was '{}'",
            entity_id, expected, state.state
        );
    }

    pub async fn call(&self, domain: &str, service: &str, data: Value) -> ServiceResult<Vec<State>> {
        self.hass
            .call_service(ServiceCall::new(domain, service, data))
            .await
    }
}

/// Device manager whose login or device load fails
pub struct FailingManager {
    fail_login: bool,
    pub transport_started: AtomicBool,
}

impl DeviceManager for FailingManager {
    fn login(&self) -> ClientResult<()> {
        if self.fail_login {
            Err(ClientError::LoginFailed("bad credentials".to_string()))
        } else {
            Ok(())
        }
    }

    fn load_devices(&self) -> ClientResult<()> {
        Err(ClientError::LoadDevices("timed out".to_string()))
    }

    fn devices(&self) -> Vec<Arc<DreoDevice>> {
        Vec::new()
    }

    fn start_transport(&self) -> ClientResult<()> {
        self.transport_started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_transport(&self) {}

    fn set_auto_reconnect(&self, _enabled: bool) {}

    fn auto_reconnect(&self) -> bool {
        true
    }
}

pub struct FailingFactory {
    pub fail_login: bool,
}

impl DeviceManagerFactory for FailingFactory {
    fn create(&self, _credentials: &Credentials) -> Arc<dyn DeviceManager> {
        Arc::new(FailingManager {
            fail_login: self.fail_login,
            transport_started: AtomicBool::new(false),
        })
    }
}
