use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque caller identifier resolved from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub weekly: Option<f64>,
    pub monthly: Option<f64>,
    pub nightly: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SellerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A stored property listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: PropertyFields,
    pub images: Vec<String>,
    pub owner: Identity,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller-editable part of a property. Create and update both replace
/// the whole set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFields {
    #[serde(rename = "type")]
    pub property_type: String,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub beds: Option<i32>,
    pub baths: Option<f64>,
    pub square_feet: Option<i32>,
    pub amenities: Vec<String>,
    pub rates: Rates,
    pub seller_info: SellerInfo,
}

/// Everything the store needs to insert a new record; id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProperty {
    pub fields: PropertyFields,
    pub images: Vec<String>,
    pub owner: Identity,
}

impl PropertyFields {
    /// Minimal required-field checks run before anything is persisted.
    /// Returns field name -> message for every violation.
    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut field_errors = HashMap::new();
        if self.property_type.trim().is_empty() {
            field_errors.insert("type".to_string(), "This field is required".to_string());
        }
        if self.name.trim().is_empty() {
            field_errors.insert("name".to_string(), "This field is required".to_string());
        }
        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(field_errors)
        }
    }

    /// Drop duplicate amenities, keeping the first occurrence.
    pub fn dedup_amenities(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.amenities.retain(|a| seen.insert(a.clone()));
    }
}
