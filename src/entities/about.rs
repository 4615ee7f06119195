use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{ApiEntity, OrderDir};
use crate::error::{ApiError, ValidationErrors};

/// An "about us" content section rendered on the institutional page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutSection {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub display_order: i32,
    pub active: bool,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AboutSectionInput {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub display_order: i32,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AboutSectionPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

impl ApiEntity for AboutSection {
    const TABLE: &'static str = "about_sections";
    const PATH: &'static str = "about-us";

    type Input = AboutSectionInput;
    type Patch = AboutSectionPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &AboutSectionInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.title.trim().is_empty() {
            errors.put("title", "Title is required");
        }
        if input.content.trim().is_empty() {
            errors.put("content", "Content is required");
        }
        errors.into_result()
    }

    fn from_input(input: AboutSectionInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            content: input.content,
            image: input.image,
            display_order: input.display_order,
            active: input.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: AboutSectionPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.content {
            self.content = v;
        }
        if let Some(v) = patch.image {
            self.image = Some(v);
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
