use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::ApiEntity;
use crate::error::{ApiError, ValidationErrors};

/// A construction project showcased on the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Total built area in square meters.
    pub area: Option<i32>,
    /// Human-readable build duration, e.g. "18 meses".
    pub duration: Option<String>,
    pub units: Option<i32>,
    pub year: Option<i32>,
    pub status: ProjectStatus,
    pub images: Vec<String>,
    pub featured: bool,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planned,
    #[default]
    UnderConstruction,
    Completed,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub area: Option<i32>,
    pub duration: Option<String>,
    pub units: Option<i32>,
    pub year: Option<i32>,
    pub status: ProjectStatus,
    pub images: Vec<String>,
    pub featured: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub area: Option<i32>,
    pub duration: Option<String>,
    pub units: Option<i32>,
    pub year: Option<i32>,
    pub status: Option<ProjectStatus>,
    pub images: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl ApiEntity for Project {
    const TABLE: &'static str = "projects";
    const PATH: &'static str = "projects";

    type Input = ProjectInput;
    type Patch = ProjectPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &ProjectInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.title.trim().is_empty() {
            errors.put("title", "Title is required");
        }
        if input.description.trim().is_empty() {
            errors.put("description", "Description is required");
        }
        if matches!(input.area, Some(n) if n < 0) {
            errors.put("area", "Must not be negative");
        }
        if matches!(input.units, Some(n) if n < 0) {
            errors.put("units", "Must not be negative");
        }
        errors.into_result()
    }

    fn from_input(input: ProjectInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            area: input.area,
            duration: input.duration,
            units: input.units,
            year: input.year,
            status: input.status,
            images: input.images,
            featured: input.featured,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ProjectPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.area {
            self.area = Some(v);
        }
        if let Some(v) = patch.duration {
            self.duration = Some(v);
        }
        if let Some(v) = patch.units {
            self.units = Some(v);
        }
        if let Some(v) = patch.year {
            self.year = Some(v);
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.images {
            self.images = v;
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
        &["status", "featured"]
    }
}
