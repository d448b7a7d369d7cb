//! Organizational hierarchy entities and their create/update DTOs.
//!
//! Hierarchy: departments -> factories -> lines -> teams -> groups.
//! Handbags and bag processes describe the product catalog; roles and
//! users carry the permission model. All records come from the backend
//! API and are read/written as camelCase JSON.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{EntityId, Timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factory {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub department_id: Option<EntityId>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub factory_id: EntityId,
    /// Planned capacity in units per day, if configured.
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub line_id: EntityId,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub team_id: EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    /// Smaller is more privileged; used for approval routing.
    pub level: Option<i32>,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandBag {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub active: bool,
}

/// One step of the handbag manufacturing process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagProcess {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    /// Position within the process sequence.
    pub order_index: Option<i32>,
    /// Expected output per worker-hour, used for rate statistics.
    pub standard_output: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub full_name: Option<String>,
    pub employee_id: Option<String>,
    pub role_id: Option<EntityId>,
    pub status: Option<String>,
    pub created_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Create / update DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFactory {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub department_id: Option<EntityId>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFactory {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub department_id: Option<EntityId>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLine {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub factory_id: EntityId,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLine {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeam {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub line_id: EntityId,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeam {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub team_id: EntityId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroup {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRole {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRole {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHandBag {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHandBag {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBagProcess {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub order_index: Option<i32>,
    pub standard_output: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBagProcess {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub order_index: Option<i32>,
    pub standard_output: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub full_name: Option<String>,
    pub employee_id: Option<String>,
    pub role_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub employee_id: Option<String>,
    pub role_id: Option<EntityId>,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_team_requires_code() {
        let dto = CreateTeam {
            code: String::new(),
            name: "Sewing A".into(),
            line_id: "l1".into(),
            description: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn valid_create_line_passes() {
        let dto = CreateLine {
            code: "L-01".into(),
            name: "Line 1".into(),
            factory_id: "f1".into(),
            capacity: Some(400),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn entity_wire_format_is_camel_case() {
        let line = Line {
            id: "l1".into(),
            code: "L-01".into(),
            name: "Line 1".into(),
            factory_id: "f1".into(),
            capacity: None,
        };
        let json = serde_json::to_value(&line).unwrap();
        assert!(json.get("factoryId").is_some());
    }
}
