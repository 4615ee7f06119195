use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::ApiEntity;
use crate::error::{ApiError, ValidationErrors};

/// Homepage banner configuration. At most one active record is served to the
/// storefront; the admin view can inspect the latest regardless of the flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroSettings {
    pub id: Uuid,
    pub headline: String,
    pub subheadline: Option<String>,
    /// Rotating banner image URLs.
    pub images: Vec<String>,
    pub carousel_interval_ms: i32,
    pub active: bool,
    #[serde(with = "crate::entities::time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::entities::time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeroSettingsInput {
    pub headline: String,
    pub subheadline: Option<String>,
    pub images: Vec<String>,
    pub carousel_interval_ms: i32,
    pub active: bool,
}

impl Default for HeroSettingsInput {
    fn default() -> Self {
        Self {
            headline: String::new(),
            subheadline: None,
            images: vec![],
            carousel_interval_ms: 5000,
            active: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeroSettingsPatch {
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub images: Option<Vec<String>>,
    pub carousel_interval_ms: Option<i32>,
    pub active: Option<bool>,
}

// Carousel timings under this are visually unusable and almost always a
// units mistake (seconds instead of milliseconds).
const MIN_INTERVAL_MS: i32 = 500;

impl ApiEntity for HeroSettings {
    const TABLE: &'static str = "hero_settings";
    const PATH: &'static str = "hero-settings";

    type Input = HeroSettingsInput;
    type Patch = HeroSettingsPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &HeroSettingsInput) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if input.headline.trim().is_empty() {
            errors.put("headline", "Headline is required");
        }
        if input.carousel_interval_ms < MIN_INTERVAL_MS {
            errors.put("carousel_interval_ms", "Interval must be at least 500ms");
        }
        errors.into_result()
    }

    fn validate_patch(patch: &HeroSettingsPatch) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if matches!(patch.carousel_interval_ms, Some(ms) if ms < MIN_INTERVAL_MS) {
            errors.put("carousel_interval_ms", "Interval must be at least 500ms");
        }
        errors.into_result()
    }

    fn from_input(input: HeroSettingsInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            headline: input.headline,
            subheadline: input.subheadline,
            images: input.images,
            carousel_interval_ms: input.carousel_interval_ms,
            active: input.active,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: HeroSettingsPatch) {
        if let Some(v) = patch.headline {
            self.headline = v;
        }
        if let Some(v) = patch.subheadline {
            self.subheadline = Some(v);
        }
        if let Some(v) = patch.images {
            self.images = v;
        }
        if let Some(v) = patch.carousel_interval_ms {
            self.carousel_interval_ms = v;
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

    fn filterable() -> &'static [&'static str] {
        &["active"]
    }
}
