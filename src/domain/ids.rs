//! Domain identifier types with validation
//!
//! Newtype wrappers keep registry identifiers, municipality codes and region
//! codes from being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registry identification number (IČO)
///
/// Stable primary key of a subject. Kept as text because the registry
/// zero-pads it to eight digits.
///
/// # Examples
///
/// ```
/// use prvotkar::domain::ids::RegistrationId;
/// use std::str::FromStr;
///
/// let id = RegistrationId::from_str(" 01234567 ").unwrap();
/// assert_eq!(id.as_str(), "01234567");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(String);

impl RegistrationId {
    /// Creates a new RegistrationId, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Registration ID cannot be empty".to_string());
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Registration ID must be numeric, got: {trimmed}"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegistrationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RegistrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Municipality code as used by both the gazetteer and the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MunicipalityId(u32);

impl MunicipalityId {
    /// Wraps a raw municipality code
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw code
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MunicipalityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MunicipalityId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| format!("Invalid municipality code: {s}"))
    }
}

/// Region code (kraj)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(u32);

impl RegionId {
    /// Wraps a raw region code
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw code
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_id_valid() {
        let id = RegistrationId::new("27074358").unwrap();
        assert_eq!(id.as_str(), "27074358");
        assert_eq!(id.to_string(), "27074358");
    }

    #[test]
    fn test_registration_id_rejects_empty() {
        assert!(RegistrationId::new("").is_err());
        assert!(RegistrationId::new("   ").is_err());
    }

    #[test]
    fn test_registration_id_rejects_non_numeric() {
        assert!(RegistrationId::new("CZ27074358").is_err());
    }

    #[test]
    fn test_municipality_id_from_str() {
        let id = MunicipalityId::from_str(" 582786 ").unwrap();
        assert_eq!(id.get(), 582786);
        assert!(MunicipalityId::from_str("Brno").is_err());
    }

    #[test]
    fn test_municipality_id_serde_transparent() {
        let json = serde_json::to_string(&MunicipalityId::new(554782)).unwrap();
        assert_eq!(json, "554782");
    }
}
