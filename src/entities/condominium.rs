use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{ApiEntity, PropertyStatus};
use crate::error::{ApiError, ValidationErrors};

/// A condominium development: a property listing plus unit totals and
/// sale terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condominium {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Formatted price range, e.g. "R$ 320.000 - R$ 510.000".
    pub price_range: Option<String>,
    pub sale_terms: Option<String>,
    pub city_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub total_units: Option<i32>,
    pub available_units: Option<i32>,
    pub completed_units: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub images: Vec<String>,
    pub status: PropertyStatus,
    pub featured: bool,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CondominiumInput {
    pub title: String,
    pub description: String,
    pub price_range: Option<String>,
    pub sale_terms: Option<String>,
    pub city_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub total_units: Option<i32>,
    pub available_units: Option<i32>,
    pub completed_units: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub images: Vec<String>,
    pub status: PropertyStatus,
    pub featured: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CondominiumPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_range: Option<String>,
    pub sale_terms: Option<String>,
    pub city_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub total_units: Option<i32>,
    pub available_units: Option<i32>,
    pub completed_units: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub images: Option<Vec<String>>,
    pub status: Option<PropertyStatus>,
    pub featured: Option<bool>,
}

fn check_units(
    errors: &mut ValidationErrors,
    total: Option<i32>,
    available: Option<i32>,
    completed: Option<i32>,
) {
    for (field, value) in [
        ("total_units", total),
        ("available_units", available),
        ("completed_units", completed),
    ] {
        if matches!(value, Some(n) if n < 0) {
            errors.put(field, "Must not be negative");
        }
    }
    if let (Some(total), Some(available)) = (total, available) {
        if available > total {
            errors.put("available_units", "Cannot exceed total units");
        }
    }
}

impl ApiEntity for Condominium {
    const TABLE: &'static str = "condominiums";
    const PATH: &'static str = "condominiums";

    type Input = CondominiumInput;
    type Patch = CondominiumPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &CondominiumInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.title.trim().is_empty() {
            errors.put("title", "Title is required");
        }
        if input.description.trim().is_empty() {
            errors.put("description", "Description is required");
        }
        check_units(
            &mut errors,
            input.total_units,
            input.available_units,
            input.completed_units,
        );
        errors.into_result()
    }

    fn validate_patch(patch: &CondominiumPatch) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        check_units(
            &mut errors,
            patch.total_units,
            patch.available_units,
            patch.completed_units,
        );
        errors.into_result()
    }

    fn from_input(input: CondominiumInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            price_range: input.price_range,
            sale_terms: input.sale_terms,
            city_id: input.city_id,
            category_id: input.category_id,
            total_units: input.total_units,
            available_units: input.available_units,
            completed_units: input.completed_units,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            area: input.area,
            images: input.images,
            status: input.status,
            featured: input.featured,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: CondominiumPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.price_range {
            self.price_range = Some(v);
        }
        if let Some(v) = patch.sale_terms {
            self.sale_terms = Some(v);
        }
        if let Some(v) = patch.city_id {
            self.city_id = Some(v);
        }
        if let Some(v) = patch.category_id {
            self.category_id = Some(v);
        }
        if let Some(v) = patch.total_units {
            self.total_units = Some(v);
        }
        if let Some(v) = patch.available_units {
            self.available_units = Some(v);
        }
        if let Some(v) = patch.completed_units {
            self.completed_units = Some(v);
        }
        if let Some(v) = patch.bedrooms {
            self.bedrooms = Some(v);
        }
        if let Some(v) = patch.bathrooms {
            self.bathrooms = Some(v);
        }
        if let Some(v) = patch.area {
            self.area = Some(v);
        }
        if let Some(v) = patch.images {
            self.images = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.featured {
            self.featured = v;
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn filterable() -> &'static [&'static str] {
        &["city_id", "status", "featured"]
    }
}
