//! Worker attendance states.

use serde::{Deserialize, Serialize};

/// Attendance status of one worker for one form's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    EarlyLeave,
    LeaveApproved,
}

impl AttendanceStatus {
    /// Whether the worker was on the line for at least part of the day.
    /// Marking a worker ABSENT never clears their hourly data; partial-day
    /// production recorded before the absence is kept.
    pub fn counts_as_worked(self) -> bool {
        !matches!(self, AttendanceStatus::Absent | AttendanceStatus::LeaveApproved)
    }
}
