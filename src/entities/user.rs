use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::ApiEntity;
use crate::error::{ApiError, ValidationErrors};

/// Operator account. The stored record carries the bcrypt hash; everything
/// that leaves the server goes through `PublicUser`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

/// Sanitized projection returned by handlers and stored in session payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserInput {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

// Users are not routed through the generic CRUD handlers; the trait impl
// exists so the storage backends can persist them like any other record.
impl ApiEntity for User {
    const TABLE: &'static str = "users";
    const PATH: &'static str = "users";

    type Input = UserInput;
    type Patch = UserPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &UserInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if !input.email.contains('@') {
            errors.put("email", "Invalid email format");
        }
        if input.password_hash.is_empty() {
            errors.put("password_hash", "Password hash is required");
        }
        errors.into_result()
    }

    fn from_input(input: UserInput) -> Self {
        User::new(input.email, input.name, input.password_hash)
    }

    fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(v) = patch.email {
            self.email = v;
        }
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.password_hash {
            self.password_hash = v;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn unique_fields() -> &'static [&'static str] {
        &["email"]
    }
}
