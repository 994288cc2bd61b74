//! Subject domain model
//!
//! A subject is one registered legal entity of a tracked type, flattened
//! from the registry's nested address into the columns the replica stores.

use crate::domain::ids::RegistrationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tracked legal-entity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Owners' association (společenství vlastníků jednotek)
    Svj,
    /// Housing cooperative (bytové družstvo)
    Bd,
}

impl EntityType {
    /// All tracked types in sync order
    pub const ALL: [EntityType; 2] = [EntityType::Svj, EntityType::Bd];

    /// Short code stored in the replica
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Svj => "svj",
            EntityType::Bd => "bd",
        }
    }

    /// Legal form code used by the registry search filter
    pub fn legal_form_code(&self) -> &'static str {
        match self {
            EntityType::Svj => "145",
            EntityType::Bd => "205",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "svj" => Ok(EntityType::Svj),
            "bd" => Ok(EntityType::Bd),
            other => Err(format!(
                "Unknown entity type '{other}'. Must be one of: svj, bd"
            )),
        }
    }
}

/// Normalized subject as written by the registry sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: RegistrationId,
    pub entity_type: EntityType,
    pub name: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub municipality: Option<String>,
    pub municipality_part: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub orientation_number: Option<String>,
    pub postal_code: Option<String>,
    /// Registration date, `YYYY-MM-DD`
    pub registration_date: Option<String>,
    pub status: Option<String>,
}

impl Subject {
    /// Creates a subject with every optional attribute empty
    pub fn new(id: RegistrationId, entity_type: EntityType) -> Self {
        Self {
            id,
            entity_type,
            name: None,
            region: None,
            region_code: None,
            municipality: None,
            municipality_part: None,
            street: None,
            house_number: None,
            orientation_number: None,
            postal_code: None,
            registration_date: None,
            status: None,
        }
    }
}

/// A geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Written for subjects whose geocoding failed
    pub const SENTINEL: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and not the failure sentinel
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && !self.is_sentinel()
    }

    pub fn is_sentinel(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// Geocoding state of a stored subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodeStatus {
    /// Never attempted, or reset for a deliberate retry
    Pending,
    /// Coordinates hold a real location
    Succeeded,
    /// Coordinates hold the sentinel
    Failed,
}

impl GeocodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocodeStatus::Pending => "pending",
            GeocodeStatus::Succeeded => "succeeded",
            GeocodeStatus::Failed => "failed",
        }
    }
}

impl FromStr for GeocodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GeocodeStatus::Pending),
            "succeeded" => Ok(GeocodeStatus::Succeeded),
            "failed" => Ok(GeocodeStatus::Failed),
            other => Err(format!("Unknown geocode status: {other}")),
        }
    }
}

/// Address fields a geocoding pass needs for one pending subject
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub id: RegistrationId,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub municipality: Option<String>,
    pub postal_code: Option<String>,
}

/// Outcome of geocoding one subject, ready to be written back
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeUpdate {
    pub id: RegistrationId,
    pub status: GeocodeStatus,
    pub coordinates: Coordinates,
}

impl GeocodeUpdate {
    pub fn located(id: RegistrationId, coordinates: Coordinates) -> Self {
        Self {
            id,
            status: GeocodeStatus::Succeeded,
            coordinates,
        }
    }

    pub fn failed(id: RegistrationId) -> Self {
        Self {
            id,
            status: GeocodeStatus::Failed,
            coordinates: Coordinates::SENTINEL,
        }
    }
}

/// A subject as read back from the replica
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSubject {
    pub subject: Subject,
    pub coordinates: Option<Coordinates>,
    pub geocode_status: GeocodeStatus,
    pub geocode_attempts: u32,
    pub updated_at: DateTime<Utc>,
}
