//! Command transport to Dreo devices

use serde_json::{Map, Value};

use crate::ClientResult;

/// Delivers property writes to a device
///
/// The real transport is the vendor websocket owned by the external library.
/// Calls are blocking and must be made off the async event loop.
pub trait Transport: Send + Sync {
    /// Send a set of property writes to one device
    fn send_command(&self, serial_number: &str, params: &Map<String, Value>) -> ClientResult<()>;

    /// Whether the transport is connected and accepting commands
    fn is_running(&self) -> bool;
}
