//! Service registry: one shared gateway/cache/notifier, one service per
//! entity.
//!
//! The explicit constructor-injection counterpart of per-entity provider
//! boilerplate: every entity gets a uniform CRUD surface from the same
//! factory, and all services share one cookie session and one query
//! cache.

use std::sync::Arc;

use lineops_core::entities::*;
use lineops_core::feedback::Notifier;
use lineops_core::form::DigitalForm;

use crate::auth::AuthService;
use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::forms::DigitalFormService;
use crate::gateway::{ApiGateway, GatewayError};
use crate::notify::TracingNotifier;
use crate::service::{EntityService, Identified, ServiceContext};

macro_rules! impl_identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn entity_id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_identified!(
    Department, Factory, Line, Team, Group, Role, HandBag, BagProcess, User, DigitalForm,
);

/// Builds and hands out entity services over shared dependencies.
pub struct ServiceRegistry {
    ctx: ServiceContext,
}

impl ServiceRegistry {
    pub fn new(
        gateway: Arc<ApiGateway>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ctx: ServiceContext {
                gateway,
                cache,
                notifier,
            },
        }
    }

    /// Registry with a fresh gateway and cache, logging notifications
    /// via tracing.
    pub fn from_config(config: &ClientConfig) -> Result<Self, GatewayError> {
        Ok(Self::new(
            Arc::new(ApiGateway::new(config)?),
            Arc::new(QueryCache::new()),
            Arc::new(TracingNotifier),
        ))
    }

    pub fn context(&self) -> ServiceContext {
        self.ctx.clone()
    }

    pub fn departments(&self) -> EntityService<Department, CreateDepartment, UpdateDepartment> {
        EntityService::new(self.ctx.clone(), "department", "/departments")
    }

    pub fn factories(&self) -> EntityService<Factory, CreateFactory, UpdateFactory> {
        EntityService::new(self.ctx.clone(), "factory", "/factories")
    }

    pub fn lines(&self) -> EntityService<Line, CreateLine, UpdateLine> {
        EntityService::new(self.ctx.clone(), "line", "/lines")
    }

    pub fn teams(&self) -> EntityService<Team, CreateTeam, UpdateTeam> {
        EntityService::new(self.ctx.clone(), "team", "/teams")
    }

    pub fn groups(&self) -> EntityService<Group, CreateGroup, UpdateGroup> {
        EntityService::new(self.ctx.clone(), "group", "/groups")
    }

    pub fn roles(&self) -> EntityService<Role, CreateRole, UpdateRole> {
        EntityService::new(self.ctx.clone(), "role", "/roles")
    }

    pub fn handbags(&self) -> EntityService<HandBag, CreateHandBag, UpdateHandBag> {
        EntityService::new(self.ctx.clone(), "handbag", "/handbags")
    }

    pub fn bag_processes(&self) -> EntityService<BagProcess, CreateBagProcess, UpdateBagProcess> {
        EntityService::new(self.ctx.clone(), "bag-process", "/bag-processes")
    }

    pub fn users(&self) -> EntityService<User, CreateUser, UpdateUser> {
        EntityService::new(self.ctx.clone(), "user", "/users")
    }

    pub fn digital_forms(&self) -> DigitalFormService {
        DigitalFormService::new(self.ctx.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.ctx.clone())
    }
}
