//! Device manager seam

use std::sync::Arc;

use crate::{ClientResult, DreoDevice};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us";

/// Account credentials for the Dreo cloud
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub region: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"**REDACTED**")
            .field("region", &self.region)
            .finish()
    }
}

/// Authenticates against the vendor service and owns the device list
///
/// All methods block on network I/O; callers run them on an executor thread.
pub trait DeviceManager: Send + Sync {
    fn login(&self) -> ClientResult<()>;

    /// Enumerate the account's devices. Requires a successful login.
    fn load_devices(&self) -> ClientResult<()>;

    /// Devices loaded so far
    fn devices(&self) -> Vec<Arc<DreoDevice>>;

    /// Open the push/command channel
    fn start_transport(&self) -> ClientResult<()>;

    fn stop_transport(&self);

    fn set_auto_reconnect(&self, enabled: bool);

    fn auto_reconnect(&self) -> bool;
}

/// Builds a device manager for a set of credentials
pub trait DeviceManagerFactory: Send + Sync {
    fn create(&self, credentials: &Credentials) -> Arc<dyn DeviceManager>;

    /// Whether managers from this factory serve canned test devices
    fn is_debug_test_mode(&self) -> bool {
        false
    }
}
