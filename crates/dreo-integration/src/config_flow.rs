//! Config flow and options flow
//!
//! The user step asks for Dreo account credentials, checks them with a
//! login and creates the config entry. The options flow edits
//! `auto_reconnect`.

use std::collections::HashMap;
use std::sync::Arc;

use dreo_client::{Credentials, DeviceManagerFactory};
use dreo_config_entries::{ConfigEntries, ConfigEntriesResult, ConfigEntry};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::constants::{
    CONF_AUTO_RECONNECT, CONF_PASSWORD, CONF_USERNAME, DEFAULT_AUTO_RECONNECT, DOMAIN,
};
use crate::hass::HomeAssistant;

pub const STEP_USER: &str = "user";
pub const STEP_INIT: &str = "init";

pub const ERROR_INVALID_AUTH: &str = "invalid_auth";
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

/// Form field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FormField {
    fn new(name: &str, field_type: &str, required: bool, default: Option<Value>) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            required,
            default,
        }
    }
}

/// Result of a flow step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    Form {
        step_id: String,
        data_schema: Vec<FormField>,
        /// Field name (or `base`) -> error key
        errors: HashMap<String, String>,
    },
    CreateEntry {
        title: String,
        entry_id: String,
    },
    Abort {
        reason: String,
    },
}

impl FlowResult {
    fn form(step_id: &str, data_schema: Vec<FormField>, errors: HashMap<String, String>) -> Self {
        FlowResult::Form {
            step_id: step_id.to_string(),
            data_schema,
            errors,
        }
    }
}

fn user_schema() -> Vec<FormField> {
    vec![
        FormField::new(CONF_USERNAME, "string", true, None),
        FormField::new(CONF_PASSWORD, "password", true, None),
    ]
}

fn input_str<'a>(input: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Creates Dreo config entries from user credentials
pub struct DreoConfigFlow {
    hass: Arc<HomeAssistant>,
    factory: Arc<dyn DeviceManagerFactory>,
    entries: Arc<ConfigEntries>,
}

impl DreoConfigFlow {
    pub fn new(
        hass: Arc<HomeAssistant>,
        factory: Arc<dyn DeviceManagerFactory>,
        entries: Arc<ConfigEntries>,
    ) -> Self {
        Self {
            hass,
            factory,
            entries,
        }
    }

    /// Show the credentials form, or validate submitted credentials
    #[instrument(skip_all)]
    pub async fn async_step_user(
        &self,
        user_input: Option<HashMap<String, Value>>,
    ) -> ConfigEntriesResult<FlowResult> {
        let Some(input) = user_input else {
            return Ok(FlowResult::form(STEP_USER, user_schema(), HashMap::new()));
        };

        let mut errors = HashMap::new();
        let (Some(username), Some(password)) =
            (input_str(&input, CONF_USERNAME), input_str(&input, CONF_PASSWORD))
        else {
            for key in [CONF_USERNAME, CONF_PASSWORD] {
                if input_str(&input, key).is_none() {
                    errors.insert(key.to_string(), "required".to_string());
                }
            }
            return Ok(FlowResult::form(STEP_USER, user_schema(), errors));
        };

        let unique_id = username.to_lowercase();
        if self.entries.get_by_unique_id(DOMAIN, &unique_id).is_some() {
            debug!(unique_id = %unique_id, "Account already configured");
            return Ok(FlowResult::Abort {
                reason: ABORT_ALREADY_CONFIGURED.to_string(),
            });
        }

        let manager = self.factory.create(&Credentials::new(username, password));
        if let Err(err) = self
            .hass
            .async_add_device_job(move || manager.login())
            .await
        {
            warn!(error = %err, "Login failed during config flow");
            errors.insert("base".to_string(), ERROR_INVALID_AUTH.to_string());
            return Ok(FlowResult::form(STEP_USER, user_schema(), errors));
        }

        let data = HashMap::from([
            (CONF_USERNAME.to_string(), json!(username)),
            (CONF_PASSWORD.to_string(), json!(password)),
        ]);
        let entry = self.entries.add(
            ConfigEntry::new(DOMAIN, username)
                .with_data(data)
                .with_unique_id(unique_id),
        )?;
        info!(entry_id = %entry.entry_id, "Created Dreo config entry");

        Ok(FlowResult::CreateEntry {
            title: entry.title,
            entry_id: entry.entry_id,
        })
    }
}

/// Edits the options of an existing Dreo entry
pub struct DreoOptionsFlow {
    entries: Arc<ConfigEntries>,
    entry_id: String,
}

impl DreoOptionsFlow {
    pub fn new(entries: Arc<ConfigEntries>, entry_id: impl Into<String>) -> Self {
        Self {
            entries,
            entry_id: entry_id.into(),
        }
    }

    /// Show the options form, or store submitted options
    ///
    /// Storing options fires the entry's update listeners, which reload it.
    #[instrument(skip_all, fields(entry_id = %self.entry_id))]
    pub async fn async_step_init(
        &self,
        user_input: Option<HashMap<String, Value>>,
    ) -> ConfigEntriesResult<FlowResult> {
        let Some(input) = user_input else {
            let current = self
                .entries
                .get(&self.entry_id)
                .and_then(|e| e.option_bool(CONF_AUTO_RECONNECT))
                .unwrap_or(DEFAULT_AUTO_RECONNECT);
            let schema = vec![FormField::new(
                CONF_AUTO_RECONNECT,
                "boolean",
                false,
                Some(json!(current)),
            )];
            return Ok(FlowResult::form(STEP_INIT, schema, HashMap::new()));
        };

        let auto_reconnect = input
            .get(CONF_AUTO_RECONNECT)
            .and_then(|v| v.as_bool())
            .unwrap_or(DEFAULT_AUTO_RECONNECT);
        let options = HashMap::from([(CONF_AUTO_RECONNECT.to_string(), json!(auto_reconnect))]);

        let entry = self.entries.update_options(&self.entry_id, options).await?;
        Ok(FlowResult::CreateEntry {
            title: String::new(),
            entry_id: entry.entry_id,
        })
    }
}
