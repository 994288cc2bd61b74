//! Administrative units returned by the gazetteer

use crate::domain::ids::{MunicipalityId, RegionId};
use serde::{Deserialize, Serialize};

/// Top-level administrative region (kraj)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
}

/// Municipality (obec), the unit the registry search is partitioned by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: MunicipalityId,
    pub name: String,
    /// Unknown for entries from the static fallback list
    pub region: Option<RegionId>,
}

impl Municipality {
    pub fn new(id: MunicipalityId, name: impl Into<String>, region: Option<RegionId>) -> Self {
        Self {
            id,
            name: name.into(),
            region,
        }
    }
}
