use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{valid_slug, ApiEntity, OrderDir};
use crate::error::{ApiError, ValidationErrors};

/// Lookup table driving the property-type filters on the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub display_order: i32,
    pub active: bool,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyCategoryInput {
    pub name: String,
    pub slug: String,
    pub display_order: i32,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyCategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub display_order: Option<i32>,
    pub active: Option<bool>,
}

impl ApiEntity for PropertyCategory {
    const TABLE: &'static str = "property_categories";
    const PATH: &'static str = "categories";

    type Input = PropertyCategoryInput;
    type Patch = PropertyCategoryPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &PropertyCategoryInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.name.trim().is_empty() {
            errors.put("name", "Name is required");
        }
        if !valid_slug(&input.slug) {
            errors.put("slug", "Slug must be lowercase letters, digits and hyphens");
        }
        errors.into_result()
    }

    fn validate_patch(patch: &PropertyCategoryPatch) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if matches!(&patch.slug, Some(s) if !valid_slug(s)) {
            errors.put("slug", "Slug must be lowercase letters, digits and hyphens");
        }
        errors.into_result()
    }

    fn from_input(input: PropertyCategoryInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            slug: input.slug,
            display_order: input.display_order,
            active: input.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: PropertyCategoryPatch) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.slug {
            self.slug = v;
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

    fn unique_fields() -> &'static [&'static str] {
        &["slug"]
    }
}
