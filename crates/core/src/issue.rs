//! Production issue records.
//!
//! Issues are append-only events on an entry. Each one carries a
//! client-generated stable id so removal happens by identity, never by
//! list position (positions shift under concurrent edits).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Category of a logged production issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Absent,
    Late,
    WaitingMaterials,
    QualityIssues,
    LostMaterials,
    Other,
}

/// A logged event affecting a worker's output during a specific hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionIssue {
    /// Stable identifier, generated client-side at creation.
    pub id: Uuid,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// Hour of day the issue occurred (0-23).
    pub hour: u8,
    /// Estimated output impact in percent, within `[0, 100]`.
    pub impact_percent: f64,
    pub description: Option<String>,
}

impl ProductionIssue {
    /// Create a new issue, validating the hour and impact range.
    pub fn new(
        issue_type: IssueType,
        hour: u8,
        impact_percent: f64,
        description: Option<String>,
    ) -> Result<Self, CoreError> {
        if hour > 23 {
            return Err(CoreError::Validation(format!(
                "Issue hour must be 0-23, got {hour}"
            )));
        }
        if !impact_percent.is_finite() || !(0.0..=100.0).contains(&impact_percent) {
            return Err(CoreError::Validation(format!(
                "Issue impact must be within [0, 100], got {impact_percent}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            issue_type,
            hour,
            impact_percent,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn valid_issue_gets_fresh_id() {
        let a = ProductionIssue::new(IssueType::Late, 8, 10.0, None).unwrap();
        let b = ProductionIssue::new(IssueType::Late, 8, 10.0, None).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn impact_above_hundred_rejected() {
        let result = ProductionIssue::new(IssueType::QualityIssues, 9, 100.5, None);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_finite_impact_rejected() {
        assert!(ProductionIssue::new(IssueType::Other, 9, f64::NAN, None).is_err());
        assert!(ProductionIssue::new(IssueType::Other, 9, f64::INFINITY, None).is_err());
    }

    #[test]
    fn hour_out_of_range_rejected() {
        assert!(ProductionIssue::new(IssueType::Absent, 24, 50.0, None).is_err());
    }

    #[test]
    fn type_field_serializes_as_type() {
        let issue =
            ProductionIssue::new(IssueType::WaitingMaterials, 10, 25.0, Some("no zippers".into()))
                .unwrap();
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "WAITING_MATERIALS");
        assert_eq!(json["impactPercent"], 25.0);
    }
}
