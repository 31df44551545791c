//! Debug test mode
//!
//! Serves devices from a JSON payload instead of the Dreo cloud. The payload
//! lives at `<base_dir>/debug_test_mode/devices.json`:
//!
//! ```json
//! {
//!   "devices": [
//!     {
//!       "deviceSn": "HCF-0001",
//!       "deviceName": "Office Fan",
//!       "model": "DR-HCF003S",
//!       "speedRange": [1, 12],
//!       "presetModes": ["normal", "natural", "sleep"],
//!       "state": {"poweron": true, "windlevel": 4, "lighton": false}
//!     }
//!   ]
//! }
//! ```
//!
//! Commands are accepted by a [`LoopbackTransport`] that records them, so the
//! written value becomes the device's reported value.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    ClientError, ClientResult, Credentials, DeviceCapabilities, DeviceManager,
    DeviceManagerFactory, DreoDevice, DreoDeviceType, Transport,
};

pub const DIRECTORY_NAME: &str = "debug_test_mode";
pub const DEVICES_FILE_NAME: &str = "devices.json";

/// Credentials the debug manager logs in with
pub const TEST_EMAIL: &str = "TEST_EMAIL";
pub const TEST_PASSWORD: &str = "TEST_PASSWORD";

/// One device in the payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePayload {
    pub device_sn: String,
    pub device_name: String,
    pub model: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(flatten)]
    pub capabilities: DeviceCapabilities,
    #[serde(default)]
    pub state: Map<String, Value>,
}

/// The full payload file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugTestModePayload {
    #[serde(default)]
    pub devices: Vec<DevicePayload>,
}

impl DebugTestModePayload {
    /// Path of the payload file under a base directory
    pub fn path(base_dir: impl AsRef<Path>) -> PathBuf {
        base_dir
            .as_ref()
            .join(DIRECTORY_NAME)
            .join(DEVICES_FILE_NAME)
    }

    /// Load the payload from `<base_dir>/debug_test_mode/devices.json`
    pub fn load(base_dir: impl AsRef<Path>) -> ClientResult<Self> {
        let path = Self::path(base_dir);
        let content = std::fs::read_to_string(&path).map_err(|source| ClientError::ReadPayload {
            path: path.clone(),
            source,
        })?;
        let payload = Self::from_json(&content)?;
        debug!(path = %path.display(), devices = payload.devices.len(), "Loaded debug test mode payload");
        Ok(payload)
    }

    pub fn from_json(json: &str) -> ClientResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A command accepted by the loopback transport
#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    pub serial_number: String,
    pub params: Map<String, Value>,
}

/// Transport that accepts every command while running and records it
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    running: AtomicBool,
    sent: Mutex<Vec<SentCommand>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Commands accepted so far, oldest first
    pub fn sent_commands(&self) -> Vec<SentCommand> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Transport for LoopbackTransport {
    fn send_command(&self, serial_number: &str, params: &Map<String, Value>) -> ClientResult<()> {
        if !self.is_running() {
            return Err(ClientError::TransportNotRunning);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentCommand {
                serial_number: serial_number.to_string(),
                params: params.clone(),
            });
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Device manager backed by a [`DebugTestModePayload`]
pub struct DebugTestModeManager {
    payload: DebugTestModePayload,
    transport: Arc<LoopbackTransport>,
    devices: RwLock<Vec<Arc<DreoDevice>>>,
    logged_in: AtomicBool,
    auto_reconnect: AtomicBool,
}

impl DebugTestModeManager {
    pub fn new(payload: DebugTestModePayload) -> Self {
        Self {
            payload,
            transport: Arc::new(LoopbackTransport::new()),
            devices: RwLock::new(Vec::new()),
            logged_in: AtomicBool::new(false),
            auto_reconnect: AtomicBool::new(true),
        }
    }

    pub fn transport(&self) -> Arc<LoopbackTransport> {
        self.transport.clone()
    }

    fn build_device(&self, payload: &DevicePayload) -> DreoDevice {
        let transport: Arc<dyn Transport> = self.transport.clone();
        let mut device = DreoDevice::new(
            &payload.device_sn,
            &payload.device_name,
            &payload.model,
            transport,
        )
        .with_capabilities(payload.capabilities.clone())
        .with_state(payload.state.clone());
        if let Some(product_name) = &payload.product_name {
            device = device.with_product_name(product_name);
        }
        device
    }
}

impl DeviceManager for DebugTestModeManager {
    fn login(&self) -> ClientResult<()> {
        self.logged_in.store(true, Ordering::SeqCst);
        debug!("Debug test mode login accepted");
        Ok(())
    }

    fn load_devices(&self) -> ClientResult<()> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Err(ClientError::NotLoggedIn);
        }

        let mut loaded = Vec::with_capacity(self.payload.devices.len());
        for payload in &self.payload.devices {
            let device = self.build_device(payload);
            if device.device_type() == DreoDeviceType::Unknown {
                warn!(
                    model = %payload.model,
                    serial_number = %payload.device_sn,
                    "Unsupported model, skipping device"
                );
                continue;
            }
            loaded.push(Arc::new(device));
        }

        info!(count = loaded.len(), "Loaded debug test mode devices");
        let mut devices = self
            .devices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *devices = loaded;
        Ok(())
    }

    fn devices(&self) -> Vec<Arc<DreoDevice>> {
        self.devices
            .read()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn start_transport(&self) -> ClientResult<()> {
        self.transport.start();
        Ok(())
    }

    fn stop_transport(&self) {
        self.transport.stop();
    }

    fn set_auto_reconnect(&self, enabled: bool) {
        self.auto_reconnect.store(enabled, Ordering::SeqCst);
    }

    fn auto_reconnect(&self) -> bool {
        self.auto_reconnect.load(Ordering::SeqCst)
    }
}

/// Factory that hands out debug test mode managers over one payload
///
/// The last manager created is kept so callers can inspect the commands
/// its transport accepted.
#[derive(Default)]
pub struct DebugTestModeFactory {
    payload: DebugTestModePayload,
    last: Mutex<Option<Arc<DebugTestModeManager>>>,
}

impl DebugTestModeFactory {
    pub fn new(payload: DebugTestModePayload) -> Self {
        Self {
            payload,
            last: Mutex::new(None),
        }
    }

    pub fn last_manager(&self) -> Option<Arc<DebugTestModeManager>> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl DeviceManagerFactory for DebugTestModeFactory {
    fn create(&self, credentials: &Credentials) -> Arc<dyn DeviceManager> {
        debug!(
            username = %credentials.username,
            "Ignoring credentials, debug test mode uses {}",
            TEST_EMAIL
        );
        let manager = Arc::new(DebugTestModeManager::new(self.payload.clone()));
        if let Ok(mut last) = self.last.lock() {
            *last = Some(manager.clone());
        }
        manager
    }

    fn is_debug_test_mode(&self) -> bool {
        true
    }
}
