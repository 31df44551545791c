//! Integration constants

pub const DOMAIN: &str = "dreo";

pub const CONF_USERNAME: &str = "username";
pub const CONF_PASSWORD: &str = "password";
pub const CONF_AUTO_RECONNECT: &str = "auto_reconnect";

pub const DEFAULT_AUTO_RECONNECT: bool = true;
