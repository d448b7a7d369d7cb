//! Generic per-entity CRUD service.
//!
//! One factory-built type replaces per-entity boilerplate: every entity
//! gets the same list/get/create/update/delete surface over the shared
//! gateway, cache, and notifier. Cache policy: reads serve fresh hits
//! without a round-trip, a successful list primes each row's detail key,
//! and mutations invalidate the exact detail key plus every list key of
//! the entity.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use lineops_core::feedback::{Notifier, Severity};
use lineops_core::pagination::{ListQuery, Paginated};
use lineops_core::types::EntityId;

use crate::cache::{CacheLookup, QueryCache};
use crate::gateway::{ApiGateway, GatewayError};

/// Errors from the entity service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Records that expose their server-assigned id (used to prime detail
/// cache keys from list rows).
pub trait Identified {
    fn entity_id(&self) -> &str;
}

/// Shared dependency bundle, one per client instance.
#[derive(Clone)]
pub struct ServiceContext {
    pub gateway: Arc<ApiGateway>,
    pub cache: Arc<QueryCache>,
    pub notifier: Arc<dyn Notifier>,
}

/// Response body of a successful create.
#[derive(Debug, Deserialize)]
pub struct Created {
    pub id: EntityId,
}

/// CRUD service for one entity type.
///
/// `T` is the record, `C` the create DTO, `U` the update DTO.
pub struct EntityService<T, C, U> {
    ctx: ServiceContext,
    entity: &'static str,
    base_path: &'static str,
    _marker: PhantomData<fn() -> (T, C, U)>,
}

impl<T, C, U> EntityService<T, C, U>
where
    T: Serialize + DeserializeOwned + Identified,
    C: Serialize + Validate,
    U: Serialize + Validate,
{
    pub fn new(ctx: ServiceContext, entity: &'static str, base_path: &'static str) -> Self {
        Self {
            ctx,
            entity,
            base_path,
            _marker: PhantomData,
        }
    }

    /// List records matching a query. Fresh cached pages are served
    /// without a network round-trip; a fetched page also primes each
    /// row's detail key.
    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<T>, ServiceError> {
        let key = QueryCache::list_key(self.entity, &query.cache_suffix());
        if let CacheLookup::Fresh(page) = self.ctx.cache.get::<Paginated<T>>(&key) {
            return Ok(page);
        }

        let page: Paginated<T> = self
            .ctx
            .gateway
            .get_with_query(self.base_path, &query.to_query_pairs())
            .await
            .map_err(|e| self.report("list", e.into()))?;

        self.ctx.cache.set(&key, &page);
        for row in &page.data {
            self.ctx
                .cache
                .set(&QueryCache::detail_key(self.entity, row.entity_id()), row);
        }
        Ok(page)
    }

    /// Fetch one record by id, serving a fresh cache hit directly.
    pub async fn get_by_id(&self, id: &str) -> Result<T, ServiceError> {
        let key = QueryCache::detail_key(self.entity, id);
        if let CacheLookup::Fresh(record) = self.ctx.cache.get::<T>(&key) {
            return Ok(record);
        }

        let record: T = self
            .ctx
            .gateway
            .get(&format!("{}/{id}", self.base_path))
            .await
            .map_err(|e| self.report("get", e.into()))?;
        self.ctx.cache.set(&key, &record);
        Ok(record)
    }

    /// Create a record, returning its server-assigned id. List keys are
    /// invalidated so the new row shows up on the next read.
    pub async fn create(&self, dto: &C) -> Result<EntityId, ServiceError> {
        self.validate("create", dto)?;
        let created: Created = self
            .ctx
            .gateway
            .post(self.base_path, dto)
            .await
            .map_err(|e| self.report("create", e.into()))?;
        self.ctx
            .cache
            .invalidate_prefix(&QueryCache::list_prefix(self.entity));
        Ok(created.id)
    }

    /// Update a record. With `force`, the detail is refetched and
    /// re-cached immediately; otherwise its keys are marked stale for
    /// the next natural read.
    pub async fn update(&self, id: &str, dto: &U, force: bool) -> Result<(), ServiceError> {
        self.validate("update", dto)?;
        self.ctx
            .gateway
            .put(&format!("{}/{id}", self.base_path), dto)
            .await
            .map_err(|e| self.report("update", e.into()))?;

        self.ctx
            .cache
            .invalidate(&QueryCache::detail_key(self.entity, id));
        self.ctx
            .cache
            .invalidate_prefix(&QueryCache::list_prefix(self.entity));

        if force {
            // The mutation itself already succeeded and the keys are
            // invalidated; a failed refetch is reported but does not turn
            // the update into an error. The next read refetches anyway.
            match self.ctx.gateway.get::<T>(&format!("{}/{id}", self.base_path)).await {
                Ok(record) => {
                    self.ctx
                        .cache
                        .set(&QueryCache::detail_key(self.entity, id), &record);
                }
                Err(e) => {
                    self.report("update", e.into());
                }
            }
        }
        Ok(())
    }

    /// Delete a record, dropping its detail key and invalidating lists.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.ctx
            .gateway
            .delete(&format!("{}/{id}", self.base_path))
            .await
            .map_err(|e| self.report("delete", e.into()))?;
        self.ctx
            .cache
            .remove(&QueryCache::detail_key(self.entity, id));
        self.ctx
            .cache
            .invalidate_prefix(&QueryCache::list_prefix(self.entity));
        Ok(())
    }

    fn validate(&self, op: &str, dto: &impl Validate) -> Result<(), ServiceError> {
        dto.validate()
            .map_err(|e| self.report(op, ServiceError::Validation(e.to_string())))
    }

    /// Single error funnel per entity: every failure is surfaced to the
    /// user before being returned to the caller.
    fn report(&self, op: &str, err: ServiceError) -> ServiceError {
        let context = format!("{}.{op}", self.entity);
        tracing::warn!(context, error = %err, "Entity operation failed");
        self.ctx.notifier.notify(Severity::Error, &context, &err.to_string());
        err
    }
}
