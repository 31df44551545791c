//! Config Entries
//!
//! A config entry is one configured instance of the integration (one Dreo
//! account). This crate tracks entries and drives their lifecycle: setup,
//! unload, reload, and reload-on-options-update.
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - A single integration configuration
//! - [`ConfigEntryState`] - Lifecycle state of an entry
//! - [`ConfigEntries`] - Manager for all config entries
//! - [`SetupHandler`] - Implemented by integrations to set up and unload entries

pub mod entry;
pub mod manager;
pub mod state_machine;

pub use entry::{
    ConfigEntry, ConfigEntryDisabledBy, ConfigEntrySource, ConfigEntryState, ConfigEntryUpdate,
};
pub use manager::{
    ConfigEntries, ConfigEntriesError, ConfigEntriesResult, EntrySetupContext, SetupHandler,
    UpdateListener,
};
pub use state_machine::InvalidTransition;
