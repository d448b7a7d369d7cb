//! Session authentication over the backend's cookie contract.
//!
//! The HTTP-only `accessToken` cookie is the source of truth for session
//! state; it lives in the gateway's cookie store. This service only
//! drives the login/logout/profile endpoints around it.

use serde::Serialize;

use lineops_core::entities::User;
use lineops_core::feedback::Severity;

use crate::service::{ServiceContext, ServiceError};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

pub struct AuthService {
    ctx: ServiceContext,
}

impl AuthService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Log in, establishing the session cookie. Returns the profile.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let user: User = self
            .ctx
            .gateway
            .post("/auth/login", &LoginRequest { username, password })
            .await
            .map_err(|e| self.report("auth.login", e.into()))?;
        tracing::info!(username, "Logged in");
        Ok(user)
    }

    /// Log out and drop every cached query (the next session may have
    /// different visibility).
    pub async fn logout(&self) -> Result<(), ServiceError> {
        self.ctx
            .gateway
            .post_empty("/auth/logout")
            .await
            .map_err(|e| self.report("auth.logout", e.into()))?;
        self.ctx.cache.clear();
        Ok(())
    }

    /// Session check: fetch the current profile through the cookie.
    pub async fn me(&self) -> Result<User, ServiceError> {
        self.ctx
            .gateway
            .get("/users/me")
            .await
            .map_err(|e| self.report("auth.me", e.into()))
    }

    fn report(&self, context: &str, err: ServiceError) -> ServiceError {
        tracing::warn!(context, error = %err, "Auth operation failed");
        self.ctx.notifier.notify(Severity::Error, context, &err.to_string());
        err
    }
}
