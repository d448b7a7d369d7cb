//! One worker's row within a digital form.
//!
//! The entry owns the hourly output mapping and derives `total_output`
//! from it. The total is recomputed after every mutation and is never
//! settable independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attendance::AttendanceStatus;
use crate::error::CoreError;
use crate::issue::ProductionIssue;
use crate::shift::{self, ShiftType};
use crate::types::{EntityId, Timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalFormEntry {
    pub id: EntityId,
    pub form_id: EntityId,
    pub worker_id: EntityId,
    /// Which time-interval set is valid for this worker. Defaults to the
    /// form's shift type but can diverge per worker.
    pub shift_type: ShiftType,
    /// Produced quantity keyed by interval label (`"07:30-08:30"`).
    pub hourly_data: BTreeMap<String, f64>,
    /// Always equals the sum of `hourly_data` values.
    pub total_output: f64,
    pub attendance_status: AttendanceStatus,
    pub check_in: Option<Timestamp>,
    pub check_out: Option<Timestamp>,
    pub issues: Vec<ProductionIssue>,
    /// Quality score in percent (0-100).
    pub quality_score: f64,
}

impl DigitalFormEntry {
    /// Create an empty entry for a worker on a form.
    pub fn new(
        id: impl Into<EntityId>,
        form_id: impl Into<EntityId>,
        worker_id: impl Into<EntityId>,
        shift_type: ShiftType,
    ) -> Self {
        Self {
            id: id.into(),
            form_id: form_id.into(),
            worker_id: worker_id.into(),
            shift_type,
            hourly_data: BTreeMap::new(),
            total_output: 0.0,
            attendance_status: AttendanceStatus::default(),
            check_in: None,
            check_out: None,
            issues: Vec::new(),
            quality_score: 100.0,
        }
    }

    /// Replace the produced quantity for one slot and recompute the total.
    ///
    /// Rejects negative or non-finite quantities and slots outside the
    /// entry's current shift window, without mutating anything.
    pub fn set_hourly(&mut self, slot: &str, quantity: f64) -> Result<(), CoreError> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(CoreError::Validation(format!(
                "Hourly quantity must be a non-negative finite number, got {quantity}"
            )));
        }
        if !shift::is_valid_slot(self.shift_type, slot) {
            return Err(CoreError::Validation(format!(
                "Slot '{slot}' is not valid for shift {}",
                self.shift_type
            )));
        }
        self.hourly_data.insert(slot.to_string(), quantity);
        self.recompute_total();
        Ok(())
    }

    /// Sum of all recorded hourly values.
    pub fn hourly_sum(&self) -> f64 {
        self.hourly_data.values().sum()
    }

    fn recompute_total(&mut self) {
        self.total_output = self.hourly_sum();
    }

    /// Drop hourly keys that fall outside the current shift's interval
    /// set and recompute the total. Returns how many slots were removed.
    pub fn prune_invalid_slots(&mut self) -> usize {
        let before = self.hourly_data.len();
        let shift_type = self.shift_type;
        self.hourly_data
            .retain(|slot, _| shift::is_valid_slot(shift_type, slot));
        let removed = before - self.hourly_data.len();
        if removed > 0 {
            self.recompute_total();
        }
        removed
    }

    /// Append an issue, returning its stable id.
    pub fn add_issue(&mut self, issue: ProductionIssue) -> Uuid {
        let id = issue.id;
        self.issues.push(issue);
        id
    }

    /// Remove an issue by stable id. Returns `false` if no issue matched.
    pub fn remove_issue(&mut self, issue_id: Uuid) -> bool {
        let before = self.issues.len();
        self.issues.retain(|i| i.id != issue_id);
        self.issues.len() != before
    }
}
