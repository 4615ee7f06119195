use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{ApiEntity, OrderDir};
use crate::error::{ApiError, ValidationErrors};

/// Staff directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub position: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub display_order: i32,
    pub active: bool,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmployeeInput {
    pub name: String,
    pub position: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub display_order: i32,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

impl ApiEntity for Employee {
    const TABLE: &'static str = "employees";
    const PATH: &'static str = "employees";

    type Input = EmployeeInput;
    type Patch = EmployeePatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &EmployeeInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.name.trim().is_empty() {
            errors.put("name", "Name is required");
        }
        if input.position.trim().is_empty() {
            errors.put("position", "Position is required");
        }
        errors.into_result()
    }

    fn from_input(input: EmployeeInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            position: input.position,
            email: input.email,
            phone: input.phone,
            photo: input.photo,
            display_order: input.display_order,
            active: input.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: EmployeePatch) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.position {
            self.position = v;
        }
        if let Some(v) = patch.email {
            self.email = Some(v);
        }
        if let Some(v) = patch.phone {
            self.phone = Some(v);
        }
        if let Some(v) = patch.photo {
            self.photo = Some(v);
        }
        if let Some(v) = patch.display_order {
            self.display_order = v;
        }
        if let Some(v) = patch.active {
            self.active = v;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn order() -> (&'static str, OrderDir) {
        ("display_order", OrderDir::Asc)
    }

    fn filterable() -> &'static [&'static str] {
        &["active"]
    }
}
