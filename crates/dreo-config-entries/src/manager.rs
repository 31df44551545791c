//! Config Entries Manager
//!
//! Tracks config entries in memory and drives their lifecycle through the
//! integration's [`SetupHandler`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::entry::{ConfigEntry, ConfigEntryState, ConfigEntryUpdate};
use crate::state_machine::InvalidTransition;

/// Config entries errors
#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("entry already exists for domain {domain} with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },

    #[error("no setup handler registered for domain {0}")]
    NoHandler(String),

    #[error("setup failed for entry {0}")]
    SetupFailed(String),

    #[error("unload failed for entry {0}")]
    UnloadFailed(String),

    #[error(transparent)]
    InvalidState(#[from] InvalidTransition),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// What to do when an entry's options change
#[derive(Clone)]
pub enum UpdateListener {
    /// Unload and set the entry up again
    Reload,
    /// Run a callback with the updated entry
    Callback(Arc<dyn Fn(&ConfigEntry) + Send + Sync>),
}

impl std::fmt::Debug for UpdateListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateListener::Reload => f.write_str("Reload"),
            UpdateListener::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Handed to [`SetupHandler::setup_entry`] so the integration can register
/// listeners that live until the entry is unloaded.
#[derive(Debug, Default)]
pub struct EntrySetupContext {
    listeners: std::sync::Mutex<Vec<UpdateListener>>,
}

impl EntrySetupContext {
    pub fn add_update_listener(&self, listener: UpdateListener) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(listener);
        }
    }

    fn into_listeners(self) -> Vec<UpdateListener> {
        self.listeners.into_inner().unwrap_or_default()
    }
}

/// Integration entry points for config entries
#[async_trait]
pub trait SetupHandler: Send + Sync {
    /// Set up an entry. Returning `false` marks the entry as failed.
    async fn setup_entry(&self, entry: &ConfigEntry, ctx: &EntrySetupContext) -> bool;

    /// Unload a loaded entry. Returning `false` marks the unload as failed.
    async fn unload_entry(&self, entry: &ConfigEntry) -> bool;
}

/// Config Entries Manager
pub struct ConfigEntries {
    /// Primary index: entry_id -> ConfigEntry
    entries: DashMap<String, ConfigEntry>,

    /// Index: domain -> set of entry_ids
    by_domain: DashMap<String, HashSet<String>>,

    /// Index: (domain, unique_id) -> entry_id
    by_unique_id: DashMap<(String, String), String>,

    /// Update listeners registered during setup, by entry_id
    update_listeners: DashMap<String, Vec<UpdateListener>>,

    /// Serializes setup and unload
    setup_lock: Mutex<()>,

    handlers: DashMap<String, Arc<dyn SetupHandler>>,
}

impl ConfigEntries {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            by_domain: DashMap::new(),
            by_unique_id: DashMap::new(),
            update_listeners: DashMap::new(),
            setup_lock: Mutex::new(()),
            handlers: DashMap::new(),
        }
    }

    fn index_entry(&self, entry: &ConfigEntry) {
        let entry_id = entry.entry_id.clone();

        self.entries.insert(entry_id.clone(), entry.clone());
        self.by_domain
            .entry(entry.domain.clone())
            .or_default()
            .insert(entry_id.clone());
        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .insert((entry.domain.clone(), unique_id.clone()), entry_id);
        }
    }

    fn unindex_entry(&self, entry: &ConfigEntry) {
        if let Some(mut ids) = self.by_domain.get_mut(&entry.domain) {
            ids.remove(&entry.entry_id);
        }
        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .remove(&(entry.domain.clone(), unique_id.clone()));
        }
        self.entries.remove(&entry.entry_id);
    }

    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|r| r.value().clone())
    }

    pub fn get_by_domain(&self, domain: &str) -> Vec<ConfigEntry> {
        self.by_domain
            .get(domain)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn get_by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        self.by_unique_id
            .get(&(domain.to_string(), unique_id.to_string()))
            .and_then(|entry_id| self.get(&entry_id))
    }

    /// Add a new config entry
    pub fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some(ref unique_id) = entry.unique_id {
            if self.get_by_unique_id(&entry.domain, unique_id).is_some() {
                return Err(ConfigEntriesError::AlreadyExists {
                    domain: entry.domain.clone(),
                    unique_id: unique_id.clone(),
                });
            }
        }

        self.index_entry(&entry);
        info!(
            domain = %entry.domain,
            entry_id = %entry.entry_id,
            "Added config entry: {}",
            entry.title
        );
        Ok(entry)
    }

    /// Update an existing entry without reloading it
    pub fn update(
        &self,
        entry_id: &str,
        update: ConfigEntryUpdate,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.unindex_entry(&entry);

        let mut updated = entry;
        if let Some(title) = update.title {
            updated.title = title;
        }
        if let Some(data) = update.data {
            updated.data = data;
        }
        if let Some(options) = update.options {
            updated.options = options;
        }
        if let Some(unique_id) = update.unique_id {
            updated.unique_id = unique_id;
        }
        updated.modified_at = Utc::now();

        self.index_entry(&updated);
        debug!(entry_id = %entry_id, "Updated config entry");
        Ok(updated)
    }

    /// Replace an entry's options and notify its update listeners
    #[instrument(skip(self, options))]
    pub async fn update_options(
        &self,
        entry_id: &str,
        options: HashMap<String, serde_json::Value>,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let updated = self.update(entry_id, ConfigEntryUpdate::new().options(options))?;

        let listeners = self
            .update_listeners
            .get(entry_id)
            .map(|l| l.clone())
            .unwrap_or_default();

        for listener in listeners {
            match listener {
                UpdateListener::Reload => {
                    debug!(entry_id = %entry_id, "Options updated, reloading entry");
                    self.reload(entry_id).await?;
                }
                UpdateListener::Callback(callback) => callback(&updated),
            }
        }

        self.get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))
    }

    /// Unload (if loaded) and remove an entry
    pub async fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        self.unload(entry_id).await?;

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        self.unindex_entry(&entry);

        info!(entry_id = %entry_id, "Removed config entry: {}", entry.title);
        Ok(entry)
    }

    fn transition(
        &self,
        entry_id: &str,
        state: ConfigEntryState,
        reason: Option<String>,
    ) -> ConfigEntriesResult<ConfigEntry> {
        let mut entry = self
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        entry.try_set_state(state, reason)?;
        debug!(entry_id = %entry_id, state = ?state, "Entry state changed");
        Ok(entry.clone())
    }

    /// Register the setup handler for a domain
    pub fn register_handler(&self, domain: &str, handler: Arc<dyn SetupHandler>) {
        self.handlers.insert(domain.to_string(), handler);
        debug!(domain = %domain, "Registered setup handler");
    }

    fn handler(&self, domain: &str) -> ConfigEntriesResult<Arc<dyn SetupHandler>> {
        self.handlers
            .get(domain)
            .map(|h| h.clone())
            .ok_or_else(|| ConfigEntriesError::NoHandler(domain.to_string()))
    }

    /// Set up an entry through its domain's handler
    #[instrument(skip(self))]
    pub async fn setup(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        let _lock = self.setup_lock.lock().await;

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if entry.is_disabled() {
            debug!(entry_id = %entry_id, "Skipping setup for disabled entry");
            return Ok(());
        }

        let handler = self.handler(&entry.domain)?;
        let entry = self.transition(entry_id, ConfigEntryState::SetupInProgress, None)?;

        let ctx = EntrySetupContext::default();
        if handler.setup_entry(&entry, &ctx).await {
            self.update_listeners
                .insert(entry_id.to_string(), ctx.into_listeners());
            self.transition(entry_id, ConfigEntryState::Loaded, None)?;
            info!(entry_id = %entry_id, "Setup completed for entry: {}", entry.title);
            Ok(())
        } else {
            warn!(entry_id = %entry_id, "Setup failed for entry: {}", entry.title);
            self.transition(
                entry_id,
                ConfigEntryState::SetupError,
                Some("setup returned false".to_string()),
            )?;
            Err(ConfigEntriesError::SetupFailed(entry_id.to_string()))
        }
    }

    /// Unload an entry. Entries that never loaded only have their state reset.
    #[instrument(skip(self))]
    pub async fn unload(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        let _lock = self.setup_lock.lock().await;

        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        if entry.state == ConfigEntryState::NotLoaded {
            return Ok(());
        }

        let was_loaded = entry.is_loaded();
        let entry = self.transition(entry_id, ConfigEntryState::UnloadInProgress, None)?;
        self.update_listeners.remove(entry_id);

        if was_loaded {
            let handler = self.handler(&entry.domain)?;
            if !handler.unload_entry(&entry).await {
                self.transition(
                    entry_id,
                    ConfigEntryState::FailedUnload,
                    Some("unload returned false".to_string()),
                )?;
                return Err(ConfigEntriesError::UnloadFailed(entry_id.to_string()));
            }
        }

        self.transition(entry_id, ConfigEntryState::NotLoaded, None)?;
        info!(entry_id = %entry_id, "Unloaded entry: {}", entry.title);
        Ok(())
    }

    /// Reload an entry (unload + setup)
    pub async fn reload(&self, entry_id: &str) -> ConfigEntriesResult<()> {
        self.unload(entry_id).await?;
        self.setup(entry_id).await
    }

    /// Set up every entry, collecting the per-entry results
    pub async fn setup_all(&self) -> Vec<ConfigEntriesResult<()>> {
        let entry_ids = self.entry_ids();
        futures::future::join_all(entry_ids.iter().map(|id| self.setup(id))).await
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConfigEntries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        fail_setup: AtomicBool,
        fail_unload: AtomicBool,
        setups: AtomicUsize,
        unloads: AtomicUsize,
    }

    #[async_trait]
    impl SetupHandler for CountingHandler {
        async fn setup_entry(&self, _entry: &ConfigEntry, ctx: &EntrySetupContext) -> bool {
            self.setups.fetch_add(1, Ordering::SeqCst);
            ctx.add_update_listener(UpdateListener::Reload);
            !self.fail_setup.load(Ordering::SeqCst)
        }

        async fn unload_entry(&self, _entry: &ConfigEntry) -> bool {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            !self.fail_unload.load(Ordering::SeqCst)
        }
    }

    fn manager_with_handler() -> (ConfigEntries, Arc<CountingHandler>) {
        let manager = ConfigEntries::new();
        let handler = Arc::new(CountingHandler::default());
        manager.register_handler("dreo", handler.clone());
        (manager, handler)
    }

    #[test]
    fn test_duplicate_unique_id_rejected() {
        let manager = ConfigEntries::new();
        manager
            .add(ConfigEntry::new("dreo", "A").with_unique_id("user@example.com"))
            .unwrap();
        let result = manager.add(ConfigEntry::new("dreo", "B").with_unique_id("user@example.com"));
        assert!(matches!(
            result,
            Err(ConfigEntriesError::AlreadyExists { .. })
        ));
        assert_eq!(manager.get_by_domain("dreo").len(), 1);
    }

    #[tokio::test]
    async fn test_setup_and_unload() {
        let (manager, handler) = manager_with_handler();
        let entry = manager.add(ConfigEntry::new("dreo", "Test")).unwrap();

        manager.setup(&entry.entry_id).await.unwrap();
        assert!(manager.get(&entry.entry_id).unwrap().is_loaded());

        manager.unload(&entry.entry_id).await.unwrap();
        assert_eq!(
            manager.get(&entry.entry_id).unwrap().state,
            ConfigEntryState::NotLoaded
        );
        assert_eq!(handler.setups.load(Ordering::SeqCst), 1);
        assert_eq!(handler.unloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_setup_failure_sets_error_and_skips_unload_handler() {
        let (manager, handler) = manager_with_handler();
        handler.fail_setup.store(true, Ordering::SeqCst);
        let entry = manager.add(ConfigEntry::new("dreo", "Test")).unwrap();

        let result = manager.setup(&entry.entry_id).await;
        assert!(matches!(result, Err(ConfigEntriesError::SetupFailed(_))));
        assert_eq!(
            manager.get(&entry.entry_id).unwrap().state,
            ConfigEntryState::SetupError
        );

        manager.unload(&entry.entry_id).await.unwrap();
        assert_eq!(handler.unloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_unload() {
        let (manager, handler) = manager_with_handler();
        handler.fail_unload.store(true, Ordering::SeqCst);
        let entry = manager.add(ConfigEntry::new("dreo", "Test")).unwrap();

        manager.setup(&entry.entry_id).await.unwrap();
        let result = manager.unload(&entry.entry_id).await;
        assert!(matches!(result, Err(ConfigEntriesError::UnloadFailed(_))));
        assert_eq!(
            manager.get(&entry.entry_id).unwrap().state,
            ConfigEntryState::FailedUnload
        );
    }

    #[tokio::test]
    async fn test_update_options_reloads_loaded_entry() {
        let (manager, handler) = manager_with_handler();
        let entry = manager.add(ConfigEntry::new("dreo", "Test")).unwrap();
        manager.setup(&entry.entry_id).await.unwrap();

        let updated = manager
            .update_options(
                &entry.entry_id,
                HashMap::from([("auto_reconnect".to_string(), json!(false))]),
            )
            .await
            .unwrap();

        assert_eq!(updated.option_bool("auto_reconnect"), Some(false));
        assert!(updated.is_loaded());
        assert_eq!(handler.setups.load(Ordering::SeqCst), 2);
        assert_eq!(handler.unloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_options_without_setup_does_not_reload() {
        let (manager, handler) = manager_with_handler();
        let entry = manager.add(ConfigEntry::new("dreo", "Test")).unwrap();

        manager
            .update_options(&entry.entry_id, HashMap::new())
            .await
            .unwrap();
        assert_eq!(handler.setups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_handler() {
        let manager = ConfigEntries::new();
        let entry = manager.add(ConfigEntry::new("other", "Test")).unwrap();
        let result = manager.setup(&entry.entry_id).await;
        assert!(matches!(result, Err(ConfigEntriesError::NoHandler(_))));
    }

    #[tokio::test]
    async fn test_remove_unloads_first() {
        let (manager, handler) = manager_with_handler();
        let entry = manager.add(ConfigEntry::new("dreo", "Test")).unwrap();
        manager.setup(&entry.entry_id).await.unwrap();

        manager.remove(&entry.entry_id).await.unwrap();
        assert!(manager.is_empty());
        assert_eq!(handler.unloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_setup_all_collects_results() {
        let (manager, _handler) = manager_with_handler();
        manager.add(ConfigEntry::new("dreo", "A")).unwrap();
        manager.add(ConfigEntry::new("other", "B")).unwrap();

        let results = tokio_test::block_on(manager.setup_all());
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ConfigEntriesError::NoHandler(_)))));
    }
}
