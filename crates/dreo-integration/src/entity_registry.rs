//! Entity registry
//!
//! Holds the entities added by each config entry's platforms, assigns their
//! entity ids and keeps the last state snapshot of each.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use dreo_components::Entity;
use dreo_core::{attrs, EntityId, Platform, State, STATE_UNAVAILABLE};
use serde_json::json;
use tracing::{debug, info, instrument, trace, warn};

struct RegisteredEntity {
    entity_id: EntityId,
    config_entry_id: String,
    platform: Platform,
    entity: Arc<dyn Entity>,
}

pub struct EntityRegistry {
    /// entity_id -> entity
    entities: DashMap<String, RegisteredEntity>,

    /// (platform, unique_id) -> entity_id
    by_unique_id: DashMap<(Platform, String), String>,

    /// config entry id -> platforms set up for it
    loaded_platforms: DashMap<String, BTreeSet<Platform>>,

    /// Last snapshot per entity_id
    states: DashMap<String, State>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
            by_unique_id: DashMap::new(),
            loaded_platforms: DashMap::new(),
            states: DashMap::new(),
        }
    }

    /// Add a platform's entities for a config entry
    ///
    /// The platform counts as loaded for the entry even when it brings no
    /// entities. Entities whose unique id is already registered are skipped.
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub fn add_entities(
        &self,
        config_entry_id: &str,
        platform: Platform,
        entities: Vec<Arc<dyn Entity>>,
    ) -> Vec<EntityId> {
        self.loaded_platforms
            .entry(config_entry_id.to_string())
            .or_default()
            .insert(platform);

        let mut added = Vec::with_capacity(entities.len());
        for entity in entities {
            let key = (platform, entity.unique_id().to_string());
            if self.by_unique_id.contains_key(&key) {
                warn!(unique_id = %key.1, "Entity with this unique_id already exists, skipping");
                continue;
            }

            let entity_id = match EntityId::generate(platform.as_str(), entity.name(), |candidate| {
                self.entities.contains_key(candidate)
            }) {
                Ok(entity_id) => entity_id,
                Err(err) => {
                    warn!(name = %entity.name(), error = %err, "Cannot derive entity_id, skipping");
                    continue;
                }
            };

            let key_str = entity_id.to_string();
            self.by_unique_id.insert(key, key_str.clone());
            self.entities.insert(
                key_str.clone(),
                RegisteredEntity {
                    entity_id: entity_id.clone(),
                    config_entry_id: config_entry_id.to_string(),
                    platform,
                    entity,
                },
            );
            self.refresh(&key_str);
            debug!(entity_id = %key_str, "Added entity");
            added.push(entity_id);
        }

        info!(%platform, added = added.len(), "Set up platform");
        added
    }

    /// Re-read an entity and store its snapshot
    ///
    /// `last_changed` only moves when the state string changes.
    pub fn refresh(&self, entity_id: &str) -> Option<State> {
        let (id, entity) = {
            let registered = self.entities.get(entity_id)?;
            (registered.entity_id.clone(), registered.entity.clone())
        };

        let (state, mut attributes) = if entity.available() {
            (entity.state(), entity.attributes())
        } else {
            (STATE_UNAVAILABLE.to_string(), HashMap::new())
        };
        attributes.insert(attrs::FRIENDLY_NAME.to_string(), json!(entity.name()));

        let previous = self.states.get(entity_id).map(|s| s.clone());
        let snapshot = match previous {
            Some(existing) => existing.with_update(state, attributes),
            None => State::new(id, state, attributes),
        };
        trace!(entity_id = %entity_id, state = %snapshot.state, "Refreshed state");
        self.states.insert(entity_id.to_string(), snapshot.clone());
        Some(snapshot)
    }

    /// Fresh snapshot of one entity
    pub fn get_state(&self, entity_id: &str) -> Option<State> {
        self.refresh(entity_id)
    }

    /// Fresh snapshots of every entity, ordered by entity_id
    pub fn states(&self) -> Vec<State> {
        self.entity_ids()
            .iter()
            .filter_map(|id| self.refresh(id))
            .collect()
    }

    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entities.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn entity(&self, entity_id: &str) -> Option<Arc<dyn Entity>> {
        self.entities.get(entity_id).map(|r| r.entity.clone())
    }

    /// Entity by id, only if it belongs to the given platform
    pub fn entity_for_platform(&self, platform: Platform, entity_id: &str) -> Option<Arc<dyn Entity>> {
        self.entities
            .get(entity_id)
            .filter(|r| r.platform == platform)
            .map(|r| r.entity.clone())
    }

    /// Entity id registered for a unique id
    pub fn entity_id_for_unique_id(&self, platform: Platform, unique_id: &str) -> Option<String> {
        self.by_unique_id
            .get(&(platform, unique_id.to_string()))
            .map(|r| r.clone())
    }

    pub fn entity_ids_for_entry(&self, config_entry_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entities
            .iter()
            .filter(|r| r.config_entry_id == config_entry_id)
            .map(|r| r.key().clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn loaded_platforms(&self, config_entry_id: &str) -> BTreeSet<Platform> {
        self.loaded_platforms
            .get(config_entry_id)
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn remove_platform(&self, config_entry_id: &str, platform: Platform) -> usize {
        let doomed: Vec<String> = self
            .entities
            .iter()
            .filter(|r| r.config_entry_id == config_entry_id && r.platform == platform)
            .map(|r| r.key().clone())
            .collect();

        for entity_id in &doomed {
            if let Some((_, registered)) = self.entities.remove(entity_id) {
                self.by_unique_id
                    .remove(&(platform, registered.entity.unique_id().to_string()));
            }
            self.states.remove(entity_id);
        }
        doomed.len()
    }

    /// Remove the entities of the given platforms for a config entry
    ///
    /// Returns `false` if any platform was never set up for the entry; the
    /// other platforms are still unloaded.
    #[instrument(skip(self, platforms))]
    pub fn unload_platforms(&self, config_entry_id: &str, platforms: &BTreeSet<Platform>) -> bool {
        let loaded = self.loaded_platforms(config_entry_id);
        let mut unload_ok = true;

        for platform in platforms {
            if !loaded.contains(platform) {
                warn!(%platform, "Platform was not set up for this entry");
                unload_ok = false;
                continue;
            }
            let removed = self.remove_platform(config_entry_id, *platform);
            debug!(%platform, removed, "Unloaded platform");
        }

        let now_empty = match self.loaded_platforms.get_mut(config_entry_id) {
            Some(mut remaining) => {
                remaining.retain(|p| !platforms.contains(p));
                remaining.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.loaded_platforms.remove(config_entry_id);
        }

        unload_ok
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreo_components::{DeviceInfo, EntityResult};
    use dreo_core::ServiceCall;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockSwitch {
        unique_id: String,
        name: String,
        on: AtomicBool,
        available: AtomicBool,
    }

    impl MockSwitch {
        fn new(unique_id: &str, name: &str) -> Arc<Self> {
            Arc::new(Self {
                unique_id: unique_id.to_string(),
                name: name.to_string(),
                on: AtomicBool::new(false),
                available: AtomicBool::new(true),
            })
        }
    }

    impl Entity for MockSwitch {
        fn platform(&self) -> Platform {
            Platform::Switch
        }
        fn unique_id(&self) -> &str {
            &self.unique_id
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }
        fn state(&self) -> String {
            if self.on.load(Ordering::SeqCst) { "on" } else { "off" }.to_string()
        }
        fn attributes(&self) -> HashMap<String, Value> {
            HashMap::new()
        }
        fn device_info(&self) -> DeviceInfo {
            DeviceInfo {
                identifiers: vec![],
                manufacturer: "Dreo".to_string(),
                model: "mock".to_string(),
                name: self.name.clone(),
            }
        }
        fn handle_service(&self, _call: &ServiceCall) -> EntityResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_entity_ids_and_collisions() {
        let registry = EntityRegistry::new();
        let added = registry.add_entities(
            "entry1",
            Platform::Switch,
            vec![
                MockSwitch::new("a", "Office Fan Child Lock"),
                MockSwitch::new("b", "Office Fan Child Lock"),
                MockSwitch::new("c", "Office Fan Child Lock"),
            ],
        );
        let ids: Vec<String> = added.iter().map(|id| id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "switch.office_fan_child_lock",
                "switch.office_fan_child_lock_2",
                "switch.office_fan_child_lock_3",
            ]
        );
    }

    #[test]
    fn test_duplicate_unique_id_skipped() {
        let registry = EntityRegistry::new();
        registry.add_entities("entry1", Platform::Switch, vec![MockSwitch::new("a", "One")]);
        let added = registry.add_entities("entry1", Platform::Switch, vec![MockSwitch::new("a", "Two")]);
        assert!(added.is_empty());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.entity_id_for_unique_id(Platform::Switch, "a").as_deref(),
            Some("switch.one")
        );
    }

    #[test]
    fn test_snapshot_tracks_changes_and_availability() {
        let registry = EntityRegistry::new();
        let switch = MockSwitch::new("a", "Lamp");
        registry.add_entities("entry1", Platform::Switch, vec![switch.clone()]);

        let first = registry.get_state("switch.lamp").unwrap();
        assert_eq!(first.state, "off");
        assert_eq!(first.attribute::<String>("friendly_name").as_deref(), Some("Lamp"));

        let same = registry.get_state("switch.lamp").unwrap();
        assert_eq!(same.last_changed, first.last_changed);

        switch.on.store(true, Ordering::SeqCst);
        assert_eq!(registry.get_state("switch.lamp").unwrap().state, "on");

        switch.available.store(false, Ordering::SeqCst);
        assert!(registry.get_state("switch.lamp").unwrap().is_unavailable());
    }

    #[test]
    fn test_unload_platforms() {
        let registry = EntityRegistry::new();
        registry.add_entities("entry1", Platform::Switch, vec![MockSwitch::new("a", "Lamp")]);
        registry.add_entities("entry1", Platform::Number, vec![]);
        registry.add_entities("entry2", Platform::Switch, vec![MockSwitch::new("b", "Other")]);

        let platforms = BTreeSet::from([Platform::Switch, Platform::Number]);
        assert!(registry.unload_platforms("entry1", &platforms));
        assert!(registry.entity_ids_for_entry("entry1").is_empty());
        assert!(registry.loaded_platforms("entry1").is_empty());
        assert_eq!(registry.entity_ids(), vec!["switch.other"]);

        // unloading again reports the platforms as not loaded
        assert!(!registry.unload_platforms("entry1", &platforms));
    }

    #[test]
    fn test_entity_for_platform_checks_domain() {
        let registry = EntityRegistry::new();
        registry.add_entities("entry1", Platform::Switch, vec![MockSwitch::new("a", "Lamp")]);
        assert!(registry.entity_for_platform(Platform::Switch, "switch.lamp").is_some());
        assert!(registry.entity_for_platform(Platform::Light, "switch.lamp").is_none());
        assert!(registry.entity("switch.lamp").is_some());
    }
}
