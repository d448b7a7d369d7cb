//! Submit/approve/reject coordination for digital forms.
//!
//! The coordinator owns the client-visible status of each open form and
//! serializes transition attempts per form id. A transition only changes
//! the local status after the backend confirms it; there is no optimistic
//! status change.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lineops_core::feedback::{Notifier, Severity};
use lineops_core::form::{DigitalForm, FormStatus};
use lineops_core::types::EntityId;

use crate::WorkflowError;

/// Remote mutation seam for form transitions.
///
/// Implemented over HTTP by `lineops-client`; tests substitute counting
/// or failing mocks.
#[async_trait]
pub trait FormTransitionBackend: Send + Sync {
    async fn submit(
        &self,
        form_id: &str,
        approval_request_id: Option<&str>,
    ) -> Result<(), WorkflowError>;

    async fn approve(&self, form_id: &str) -> Result<(), WorkflowError>;

    async fn reject(&self, form_id: &str) -> Result<(), WorkflowError>;
}

/// Hook invoked after a confirmed transition (UI navigation/refresh).
pub type OnTransition = Box<dyn Fn(&str, FormStatus) + Send + Sync>;

/// Coordinates the lifecycle transitions of open digital forms.
pub struct FormWorkflowCoordinator {
    backend: Arc<dyn FormTransitionBackend>,
    notifier: Arc<dyn Notifier>,
    /// Client-visible status per open form.
    statuses: Mutex<HashMap<EntityId, FormStatus>>,
    /// Form ids with a transition currently in flight. One slot per
    /// form id, not a queue: a second attempt while one is pending
    /// fails fast.
    in_flight: Mutex<HashSet<EntityId>>,
    /// Last transition error per form, readable by the UI.
    last_errors: Mutex<HashMap<EntityId, String>>,
    on_transition: Option<OnTransition>,
}

impl FormWorkflowCoordinator {
    pub fn new(backend: Arc<dyn FormTransitionBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            statuses: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            last_errors: Mutex::new(HashMap::new()),
            on_transition: None,
        }
    }

    /// Register a hook invoked after every confirmed transition.
    pub fn with_on_transition(mut self, hook: OnTransition) -> Self {
        self.on_transition = Some(hook);
        self
    }

    /// Register a form with the coordinator. Must be called before any
    /// transition on it.
    pub fn open_form(&self, form: &DigitalForm) {
        self.statuses
            .lock()
            .expect("coordinator status lock poisoned")
            .insert(form.id.clone(), form.status);
    }

    /// Discard all coordinator state for a form (UI navigated away).
    pub fn close_form(&self, form_id: &str) {
        self.statuses
            .lock()
            .expect("coordinator status lock poisoned")
            .remove(form_id);
        self.last_errors
            .lock()
            .expect("coordinator error lock poisoned")
            .remove(form_id);
        self.in_flight
            .lock()
            .expect("coordinator in-flight lock poisoned")
            .remove(form_id);
    }

    /// Client-visible status of an open form.
    pub fn status(&self, form_id: &str) -> Option<FormStatus> {
        self.statuses
            .lock()
            .expect("coordinator status lock poisoned")
            .get(form_id)
            .copied()
    }

    /// Last transition error recorded for a form, if any.
    pub fn last_error(&self, form_id: &str) -> Option<String> {
        self.last_errors
            .lock()
            .expect("coordinator error lock poisoned")
            .get(form_id)
            .cloned()
    }

    /// Submit a DRAFT form for approval. Returns `true` once the backend
    /// confirms the transition to PENDING.
    pub async fn submit_form(&self, form_id: &str, approval_request_id: Option<&str>) -> bool {
        self.run_transition(form_id, FormStatus::Pending, "digital-form.submit", || {
            self.backend.submit(form_id, approval_request_id)
        })
        .await
    }

    /// Approve a PENDING form.
    pub async fn approve_form(&self, form_id: &str) -> bool {
        self.run_transition(form_id, FormStatus::Confirmed, "digital-form.approve", || {
            self.backend.approve(form_id)
        })
        .await
    }

    /// Reject a PENDING form.
    pub async fn reject_form(&self, form_id: &str) -> bool {
        self.run_transition(form_id, FormStatus::Rejected, "digital-form.reject", || {
            self.backend.reject(form_id)
        })
        .await
    }

    async fn run_transition<F, Fut>(
        &self,
        form_id: &str,
        target: FormStatus,
        context: &str,
        action: F,
    ) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), WorkflowError>>,
    {
        // Gate on the current status before touching the network. A form
        // in a terminal state (or the wrong source state) never produces
        // a remote call.
        let current = match self.status(form_id) {
            Some(status) => status,
            None => {
                self.record_error(form_id, context, format!("Form {form_id} is not open"));
                return false;
            }
        };
        if let Err(e) = current.validate_transition(target) {
            self.record_error(form_id, context, e.to_string());
            return false;
        }

        // Per-form in-flight lock, acquired before any await so a second
        // concurrent attempt observes it and fails fast.
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .expect("coordinator in-flight lock poisoned");
            if !in_flight.insert(form_id.to_string()) {
                tracing::debug!(form_id, context, "Transition already in flight, skipping");
                return false;
            }
        }
        // The slot must be released even if this future is dropped at the
        // await (caller timeout, select, navigation), or the form would
        // stay locked for the coordinator's lifetime.
        let _slot = InFlightSlot {
            slots: &self.in_flight,
            form_id,
        };

        let result = action().await;

        match result {
            Ok(()) => {
                self.statuses
                    .lock()
                    .expect("coordinator status lock poisoned")
                    .insert(form_id.to_string(), target);
                self.last_errors
                    .lock()
                    .expect("coordinator error lock poisoned")
                    .remove(form_id);
                tracing::info!(form_id, status = %target, "Form transition confirmed");
                if let Some(hook) = &self.on_transition {
                    hook(form_id, target);
                }
                true
            }
            Err(e) => {
                self.record_error(form_id, context, e.to_string());
                false
            }
        }
    }

    fn record_error(&self, form_id: &str, context: &str, message: String) {
        tracing::warn!(form_id, context, error = %message, "Form transition failed");
        self.notifier.notify(Severity::Error, context, &message);
        self.last_errors
            .lock()
            .expect("coordinator error lock poisoned")
            .insert(form_id.to_string(), message);
    }
}

/// Releases a form's in-flight slot when the transition future completes
/// or is dropped.
struct InFlightSlot<'a> {
    slots: &'a Mutex<HashSet<EntityId>>,
    form_id: &'a str,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.slots
            .lock()
            .expect("coordinator in-flight lock poisoned")
            .remove(self.form_id);
    }
}
