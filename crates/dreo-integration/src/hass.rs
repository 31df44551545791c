//! Host runtime the integration is set up against

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use dreo_client::{ClientError, ClientResult, DeviceManager};
use dreo_components::EntityError;
use dreo_core::{Platform, ServiceCall, State};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::entity_registry::EntityRegistry;

#[derive(Debug, Error)]
pub enum HassError {
    #[error("executor job failed: {0}")]
    Executor(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type HassResult<T> = Result<T, HassError>;

/// Service call errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Service not found: {domain}.{service}")]
    NotFound { domain: String, service: String },

    #[error("No entity_id given for {0}")]
    NoTarget(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("{entity_id}: {source}")]
    Entity {
        entity_id: String,
        #[source]
        source: EntityError,
    },

    #[error(transparent)]
    Hass(#[from] HassError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// What a loaded config entry keeps while it is set up
#[derive(Clone)]
pub struct RuntimeData {
    pub manager: Arc<dyn DeviceManager>,
    pub platforms: BTreeSet<Platform>,
}

/// The host instance: per-entry runtime data, the entity registry and the
/// blocking executor
pub struct HomeAssistant {
    /// Runtime data by config entry id
    pub data: DashMap<String, RuntimeData>,
    pub entities: EntityRegistry,
}

impl HomeAssistant {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            entities: EntityRegistry::new(),
        }
    }

    /// Run blocking work on the blocking thread pool
    pub async fn async_add_executor_job<F, T>(&self, job: F) -> HassResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ok(tokio::task::spawn_blocking(job).await?)
    }

    /// Run a blocking device library call on the executor
    pub async fn async_add_device_job<F, T>(&self, job: F) -> HassResult<T>
    where
        F: FnOnce() -> ClientResult<T> + Send + 'static,
        T: Send + 'static,
    {
        Ok(self.async_add_executor_job(job).await??)
    }

    pub fn runtime_data(&self, entry_id: &str) -> Option<RuntimeData> {
        self.data.get(entry_id).map(|d| d.clone())
    }

    /// Dispatch a service call to each targeted entity and return their
    /// refreshed states
    #[instrument(skip(self, call), fields(service = %call.service_id()))]
    pub async fn call_service(&self, call: ServiceCall) -> ServiceResult<Vec<State>> {
        let platform: Platform = call
            .domain
            .parse()
            .map_err(|_| ServiceError::UnknownDomain(call.domain.clone()))?;

        if !platform.services().contains(&call.service.as_str()) {
            return Err(ServiceError::NotFound {
                domain: call.domain.clone(),
                service: call.service.clone(),
            });
        }

        let entity_ids = call.entity_ids();
        if entity_ids.is_empty() {
            return Err(ServiceError::NoTarget(call.service_id()));
        }

        let call = Arc::new(call);
        let mut states = Vec::with_capacity(entity_ids.len());
        for entity_id in entity_ids {
            let entity = self
                .entities
                .entity_for_platform(platform, &entity_id)
                .ok_or_else(|| ServiceError::EntityNotFound(entity_id.clone()))?;

            debug!(entity_id = %entity_id, "Calling entity service");
            let job_call = call.clone();
            self.async_add_executor_job(move || entity.handle_service(&job_call))
                .await?
                .map_err(|source| ServiceError::Entity {
                    entity_id: entity_id.clone(),
                    source,
                })?;

            if let Some(state) = self.entities.refresh(&entity_id) {
                states.push(state);
            }
        }
        Ok(states)
    }
}

impl Default for HomeAssistant {
    fn default() -> Self {
        Self::new()
    }
}
