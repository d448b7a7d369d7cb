//! Digital-form service: CRUD plus the workflow transition endpoints.
//!
//! Implements the `lineops-workflow` seams so the coordinator and
//! aggregator persist through the same gateway and cache as everything
//! else. Transitions and entry saves invalidate the form's cache keys;
//! the form and its entries are two independent cache operations with no
//! atomicity between them (next refetch reconciles).

use async_trait::async_trait;

use lineops_core::entry::DigitalFormEntry;
use lineops_core::form::{CreateDigitalForm, DigitalForm, UpdateDigitalForm};
use lineops_core::pagination::{ListQuery, Paginated};
use lineops_core::types::EntityId;
use lineops_workflow::aggregator::EntryStore;
use lineops_workflow::coordinator::FormTransitionBackend;
use lineops_workflow::WorkflowError;

use crate::cache::{CacheLookup, QueryCache};
use crate::service::{EntityService, ServiceContext, ServiceError};

const ENTITY: &str = "digital-form";
const BASE_PATH: &str = "/digital-forms";

fn entries_key(form_id: &str) -> String {
    format!("digital-form-entries:{form_id}")
}

/// Client service for digital forms.
pub struct DigitalFormService {
    ctx: ServiceContext,
    inner: EntityService<DigitalForm, CreateDigitalForm, UpdateDigitalForm>,
}

impl DigitalFormService {
    pub fn new(ctx: ServiceContext) -> Self {
        let inner = EntityService::new(ctx.clone(), ENTITY, BASE_PATH);
        Self { ctx, inner }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<DigitalForm>, ServiceError> {
        self.inner.list(query).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<DigitalForm, ServiceError> {
        self.inner.get_by_id(id).await
    }

    pub async fn create(&self, dto: &CreateDigitalForm) -> Result<EntityId, ServiceError> {
        self.inner.create(dto).await
    }

    pub async fn update(
        &self,
        id: &str,
        dto: &UpdateDigitalForm,
        force: bool,
    ) -> Result<(), ServiceError> {
        self.inner.update(id, dto, force).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.inner.delete(id).await
    }

    /// Fetch the form's worker entries, served from cache when fresh.
    pub async fn entries(&self, form_id: &str) -> Result<Vec<DigitalFormEntry>, ServiceError> {
        let key = entries_key(form_id);
        if let CacheLookup::Fresh(entries) = self.ctx.cache.get::<Vec<DigitalFormEntry>>(&key) {
            return Ok(entries);
        }
        let entries: Vec<DigitalFormEntry> = self
            .ctx
            .gateway
            .get(&format!("{BASE_PATH}/{form_id}/entries"))
            .await?;
        self.ctx.cache.set(&key, &entries);
        Ok(entries)
    }

    /// Fetch a form together with its entries, for seeding the workflow
    /// coordinator and aggregator when the UI opens it.
    pub async fn open(
        &self,
        form_id: &str,
    ) -> Result<(DigitalForm, Vec<DigitalFormEntry>), ServiceError> {
        let form = self.get_by_id(form_id).await?;
        let entries = self.entries(form_id).await?;
        Ok((form, entries))
    }

    /// Invalidate every cache key touched by a form mutation.
    fn invalidate_form(&self, form_id: &str) {
        self.ctx
            .cache
            .invalidate(&QueryCache::detail_key(ENTITY, form_id));
        self.ctx
            .cache
            .invalidate_prefix(&QueryCache::list_prefix(ENTITY));
    }

    async fn transition(
        &self,
        form_id: &str,
        action: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), WorkflowError> {
        let path = format!("{BASE_PATH}/{form_id}/{action}");
        let result = match body {
            Some(body) => self.ctx.gateway.post_unit(&path, &body).await,
            None => self.ctx.gateway.post_empty(&path).await,
        };
        result.map_err(|e| WorkflowError::Backend(e.to_string()))?;
        self.invalidate_form(form_id);
        Ok(())
    }
}

#[async_trait]
impl FormTransitionBackend for DigitalFormService {
    async fn submit(
        &self,
        form_id: &str,
        approval_request_id: Option<&str>,
    ) -> Result<(), WorkflowError> {
        let body = approval_request_id
            .map(|id| serde_json::json!({ "approvalRequestId": id }));
        self.transition(form_id, "submit", body).await
    }

    async fn approve(&self, form_id: &str) -> Result<(), WorkflowError> {
        self.transition(form_id, "approve", None).await
    }

    async fn reject(&self, form_id: &str) -> Result<(), WorkflowError> {
        self.transition(form_id, "reject", None).await
    }
}

#[async_trait]
impl EntryStore for DigitalFormService {
    async fn save_entry(&self, entry: &DigitalFormEntry) -> Result<(), WorkflowError> {
        let path = format!(
            "{BASE_PATH}/{}/entries/{}",
            entry.form_id, entry.worker_id
        );
        self.ctx
            .gateway
            .patch(&path, entry)
            .await
            .map_err(|e| WorkflowError::Backend(e.to_string()))?;
        self.ctx.cache.invalidate(&entries_key(&entry.form_id));
        self.ctx
            .cache
            .invalidate(&QueryCache::detail_key(ENTITY, &entry.form_id));
        Ok(())
    }
}
