//! Digital form record and status state machine.
//!
//! A digital form aggregates one production line's attendance and hourly
//! output for one day and shift. Its lifecycle is:
//!
//! ```text
//! DRAFT --submit--> PENDING --approve--> CONFIRMED
//!                           --reject---> REJECTED
//! ```
//!
//! CONFIRMED and REJECTED are terminal; no client-side transition can
//! leave them.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::shift::ShiftType;
use crate::types::{EntityId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormStatus {
    Draft,
    Pending,
    Confirmed,
    Rejected,
}

impl FormStatus {
    /// The set of statuses reachable from this one.
    ///
    /// Terminal states return an empty slice.
    pub fn valid_transitions(self) -> &'static [FormStatus] {
        match self {
            FormStatus::Draft => &[FormStatus::Pending],
            FormStatus::Pending => &[FormStatus::Confirmed, FormStatus::Rejected],
            FormStatus::Confirmed | FormStatus::Rejected => &[],
        }
    }

    pub fn can_transition(self, to: FormStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a transition, returning a typed error for invalid ones.
    pub fn validate_transition(self, to: FormStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition { from: self, to })
        }
    }

    pub fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormStatus::Draft => "DRAFT",
            FormStatus::Pending => "PENDING",
            FormStatus::Confirmed => "CONFIRMED",
            FormStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-line, per-shift record aggregating worker attendance and hourly
/// production entries for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalForm {
    pub id: EntityId,
    pub form_code: String,
    pub form_name: String,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub line_id: EntityId,
    pub status: FormStatus,
    pub created_by_id: Option<EntityId>,
    pub updated_by_id: Option<EntityId>,
    /// Set by the backend when the form enters PENDING.
    pub submit_time: Option<Timestamp>,
    /// Approval request the submission was attached to, if any.
    pub approval_request_id: Option<EntityId>,
    pub is_exported: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Payload for creating a new form (always born DRAFT).
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDigitalForm {
    #[validate(length(min = 1, max = 128))]
    pub form_name: String,
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    pub line_id: EntityId,
}

/// Mutable fields of a DRAFT form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDigitalForm {
    #[validate(length(min = 1, max = 128))]
    pub form_name: Option<String>,
    pub shift_type: Option<ShiftType>,
}
