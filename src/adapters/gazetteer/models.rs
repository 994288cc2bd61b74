//! Wire models of the RÚIAN building API

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Every list endpoint wraps its payload in `data`
///
/// Entries are kept as raw JSON so a single malformed one can be skipped
/// without losing the rest of the list.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope {
    #[serde(default)]
    pub data: Vec<Value>,
}

impl DataEnvelope {
    /// Decodes each entry as `T`, dropping the ones that don't fit
    pub fn entries<T: DeserializeOwned>(self, list: &str) -> Vec<T> {
        let mut entries = Vec::with_capacity(self.data.len());
        for raw in self.data {
            match serde_json::from_value::<T>(raw.clone()) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        list,
                        entry = %raw,
                        error = %e,
                        "Skipping malformed gazetteer entry"
                    );
                }
            }
        }
        entries
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDto {
    pub region_id: u32,
    pub region_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityDto {
    pub municipality_id: u32,
    pub municipality_name: String,
}
