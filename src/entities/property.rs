use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::ApiEntity;
use crate::error::{ApiError, ValidationErrors};

/// A listed property: created and edited by operators, read publicly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Formatted listing price, e.g. "R$ 450.000". Display text, never math.
    pub price: String,
    pub city_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    /// Built area in square meters.
    pub area: Option<i32>,
    pub images: Vec<String>,
    pub status: PropertyStatus,
    pub featured: bool,
    pub payment_terms: Option<String>,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Available,
    Sold,
    Rented,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyInput {
    pub title: String,
    pub description: String,
    pub price: String,
    pub city_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub images: Vec<String>,
    pub status: PropertyStatus,
    pub featured: bool,
    pub payment_terms: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub city_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<i32>,
    pub images: Option<Vec<String>>,
    pub status: Option<PropertyStatus>,
    pub featured: Option<bool>,
    pub payment_terms: Option<String>,
}

fn check_counts(errors: &mut ValidationErrors, counts: [(&str, Option<i32>); 3]) {
    for (field, value) in counts {
        if matches!(value, Some(n) if n < 0) {
            errors.put(field, "Must not be negative");
        }
    }
}

impl ApiEntity for Property {
    const TABLE: &'static str = "properties";
    const PATH: &'static str = "properties";

    type Input = PropertyInput;
    type Patch = PropertyPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &PropertyInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.title.trim().is_empty() {
            errors.put("title", "Title is required");
        }
        if input.description.trim().is_empty() {
            errors.put("description", "Description is required");
        }
        if input.price.trim().is_empty() {
            errors.put("price", "Price is required");
        }
        check_counts(
            &mut errors,
            [
                ("bedrooms", input.bedrooms),
                ("bathrooms", input.bathrooms),
                ("area", input.area),
            ],
        );
        errors.into_result()
    }

    fn validate_patch(patch: &PropertyPatch) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if matches!(&patch.title, Some(t) if t.trim().is_empty()) {
            errors.put("title", "Title must not be empty");
        }
        if matches!(&patch.price, Some(p) if p.trim().is_empty()) {
            errors.put("price", "Price must not be empty");
        }
        check_counts(
            &mut errors,
            [
                ("bedrooms", patch.bedrooms),
                ("bathrooms", patch.bathrooms),
                ("area", patch.area),
            ],
        );
        errors.into_result()
    }

    fn from_input(input: PropertyInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            price: input.price,
            city_id: input.city_id,
            category_id: input.category_id,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            area: input.area,
            images: input.images,
            status: input.status,
            featured: input.featured,
            payment_terms: input.payment_terms,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: PropertyPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.price {
            self.price = v;
        }
        if let Some(v) = patch.city_id {
            self.city_id = Some(v);
        }
        if let Some(v) = patch.category_id {
            self.category_id = Some(v);
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
        if let Some(v) = patch.payment_terms {
            self.payment_terms = Some(v);
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn filterable() -> &'static [&'static str] {
        &["city_id", "category_id", "status", "featured"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_fields_are_reported_per_field() {
        let input = PropertyInput::default();
        let err = Property::validate(&input).unwrap_err();
        let body = err.to_json();
        assert!(body["errors"]["title"].is_string());
        assert!(body["errors"]["description"].is_string());
        assert!(body["errors"]["price"].is_string());
    }

    #[test]
    fn negative_counts_rejected() {
        let input = PropertyInput {
            title: "Casa na praia".into(),
            description: "Vista para o mar".into(),
            price: "R$ 450.000".into(),
            bedrooms: Some(-1),
            ..Default::default()
        };
        let err = Property::validate(&input).unwrap_err();
        assert!(err.to_json()["errors"]["bedrooms"].is_string());
    }

    #[test]
    fn patch_leaves_unspecified_fields_untouched() {
        let mut property = Property::from_input(PropertyInput {
            title: "Casa na praia".into(),
            description: "Vista para o mar".into(),
            price: "R$ 450.000".into(),
            bedrooms: Some(3),
            ..Default::default()
        });
        property.apply_patch(PropertyPatch {
            price: Some("R$ 480.000".into()),
            ..Default::default()
        });
        assert_eq!(property.price, "R$ 480.000");
        assert_eq!(property.title, "Casa na praia");
        assert_eq!(property.bedrooms, Some(3));
    }

    #[test]
    fn status_serializes_snake_case() {
        let v = serde_json::to_value(PropertyStatus::Available).unwrap();
        assert_eq!(v, "available");
    }
}
