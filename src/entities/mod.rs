//! Business entity records and their request payloads.
//!
//! Every entity is a flat serde struct persisted as a JSON document by the
//! storage layer. The `ApiEntity` trait carries the declarative pieces the
//! generic handlers and storage backends need: table/path names, create and
//! partial-update payload types, boundary validation, default list ordering
//! and the whitelist of query-string filters.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

pub mod about;
pub mod category;
pub mod city;
pub mod condominium;
pub mod contact;
pub mod employee;
pub mod hero;
pub mod project;
pub mod property;
pub mod user;

pub use about::AboutSection;
pub use category::PropertyCategory;
pub use city::City;
pub use condominium::Condominium;
pub use contact::Contact;
pub use employee::Employee;
pub use hero::HeroSettings;
pub use project::Project;
pub use property::{Property, PropertyStatus};
pub use user::{PublicUser, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}

pub trait ApiEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Storage table name.
    const TABLE: &'static str;
    /// URL path segment under /api.
    const PATH: &'static str;

    /// Create payload. Fields default when absent so validation can report
    /// missing values per field instead of failing deserialization.
    type Input: DeserializeOwned + Send;
    /// Partial-update payload; absent fields are left untouched.
    type Patch: DeserializeOwned + Send;

    fn id(&self) -> Uuid;

    fn validate(input: &Self::Input) -> Result<(), ApiError>;

    fn validate_patch(_patch: &Self::Patch) -> Result<(), ApiError> {
        Ok(())
    }

    /// Build a full record from a validated payload, assigning id and
    /// timestamps.
    fn from_input(input: Self::Input) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch);

    /// Refresh `updated_at`.
    fn touch(&mut self);

    fn created_at(&self) -> DateTime<Utc>;

    /// Default list ordering. Lookup and content tables override this with
    /// `display_order` ascending.
    fn order() -> (&'static str, OrderDir) {
        ("created_at", OrderDir::Desc)
    }

    /// Query-string parameters accepted as equality filters on list requests.
    fn filterable() -> &'static [&'static str] {
        &[]
    }

    /// Fields enforced unique across the table (409 on duplicates).
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }
}

/// Fixed-width RFC3339 serialization (microsecond precision) for entity
/// timestamps. chrono's default trims subseconds to 0/3/6/9 digits, which
/// breaks lexicographic ordering between widths; list ordering compares
/// these values as strings, both in-process and in the mirrored SQL columns.
pub mod time {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Slug charset shared by category and city lookups: lowercase ascii,
/// digits and hyphens.
pub(crate) fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
