//! Dreo device library seam
//!
//! The cloud login, device enumeration and websocket transport for Dreo
//! devices live in an external library. This crate defines the surface the
//! integration calls ([`DeviceManager`], [`Transport`], [`DreoDevice`]) and
//! ships the debug test mode manager, which reads devices from a JSON
//! payload on disk and loops commands back into local device state.

pub mod debug_test_mode;
mod device;
mod device_type;
mod error;
pub mod keys;
mod manager;
mod transport;

pub use debug_test_mode::{
    DebugTestModeFactory, DebugTestModeManager, DebugTestModePayload, DevicePayload,
    LoopbackTransport, SentCommand,
};
pub use device::{DeviceCapabilities, DreoDevice};
pub use device_type::DreoDeviceType;
pub use error::{ClientError, ClientResult};
pub use manager::{Credentials, DeviceManager, DeviceManagerFactory, DEFAULT_REGION};
pub use transport::Transport;
