//! Shift types and the static time-interval table.
//!
//! The set of valid hourly slots is a pure function of [`ShiftType`].
//! It is static configuration shared by every form, never persisted
//! per form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shift classification for a form or a single worker's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    /// Standard working day (9 hourly slots).
    Regular,
    /// Standard day plus 3 extension slots.
    Extended,
    /// Extended day plus 3 overtime slots.
    Overtime,
}

impl ShiftType {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Regular => "REGULAR",
            ShiftType::Extended => "EXTENDED",
            ShiftType::Overtime => "OVERTIME",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fixed (start, end, label) slot used as the key for hourly output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeInterval {
    pub start: &'static str,
    pub end: &'static str,
    pub label: &'static str,
}

const fn interval(start: &'static str, end: &'static str, label: &'static str) -> TimeInterval {
    TimeInterval { start, end, label }
}

/// The full standard interval table. Slots 0..9 belong to the regular
/// day, 9..12 to the extension window, 12..15 to overtime.
pub const STANDARD_INTERVALS: [TimeInterval; 15] = [
    interval("07:30", "08:30", "07:30-08:30"),
    interval("08:30", "09:30", "08:30-09:30"),
    interval("09:30", "10:30", "09:30-10:30"),
    interval("10:30", "11:30", "10:30-11:30"),
    interval("11:30", "12:30", "11:30-12:30"),
    interval("12:30", "13:30", "12:30-13:30"),
    interval("13:30", "14:30", "13:30-14:30"),
    interval("14:30", "15:30", "14:30-15:30"),
    interval("15:30", "16:30", "15:30-16:30"),
    interval("16:30", "17:30", "16:30-17:30"),
    interval("17:30", "18:30", "17:30-18:30"),
    interval("18:30", "19:30", "18:30-19:30"),
    interval("19:30", "20:30", "19:30-20:30"),
    interval("20:30", "21:30", "20:30-21:30"),
    interval("21:30", "22:30", "21:30-22:30"),
];

const REGULAR_SLOTS: usize = 9;
const EXTENDED_SLOTS: usize = 12;

/// Valid intervals for a shift type.
///
/// A shift extension adds hours to the working day rather than moving
/// it, so EXTENDED includes the regular slots and OVERTIME includes
/// both earlier windows.
pub fn intervals_for(shift: ShiftType) -> &'static [TimeInterval] {
    match shift {
        ShiftType::Regular => &STANDARD_INTERVALS[..REGULAR_SLOTS],
        ShiftType::Extended => &STANDARD_INTERVALS[..EXTENDED_SLOTS],
        ShiftType::Overtime => &STANDARD_INTERVALS[..],
    }
}

/// Check whether a slot label is valid for the given shift type.
pub fn is_valid_slot(shift: ShiftType, label: &str) -> bool {
    intervals_for(shift).iter().any(|i| i.label == label)
}
