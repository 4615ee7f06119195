use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::ApiEntity;
use crate::error::{ApiError, ValidationErrors};

/// A message submitted by a site visitor. Created publicly, read and deleted
/// only by operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// Contacts are immutable once submitted; the patch type exists only to
/// satisfy the entity contract.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactPatch {}

fn valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    parts.len() == 2 && !parts[0].is_empty() && parts[1].contains('.') && !parts[1].starts_with('.')
}

impl ApiEntity for Contact {
    const TABLE: &'static str = "contacts";
    const PATH: &'static str = "contacts";

    type Input = ContactInput;
    type Patch = ContactPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &ContactInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.name.trim().is_empty() {
            errors.put("name", "Name is required");
        }
        if input.email.trim().is_empty() {
            errors.put("email", "Email is required");
        } else if !valid_email(&input.email) {
            errors.put("email", "Invalid email format");
        }
        if input.subject.trim().is_empty() {
            errors.put("subject", "Subject is required");
        }
        if input.message.trim().is_empty() {
            errors.put("message", "Message is required");
        }
        errors.into_result()
    }

    fn from_input(input: ContactInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            subject: input.subject,
            message: input.message,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, _patch: ContactPatch) {}

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
