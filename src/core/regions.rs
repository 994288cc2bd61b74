//! Region and municipality enumeration
//!
//! Walks the gazetteer's region list and merges every region's
//! municipalities into one map. When the gazetteer is unreachable the run
//! continues on a short built-in list of the largest cities.

use crate::adapters::gazetteer::Gazetteer;
use crate::core::pacing::Pacer;
use crate::domain::MunicipalityId;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Largest municipalities by population, used when the gazetteer is down
const FALLBACK_MUNICIPALITIES: &[(u32, &str)] = &[
    (554782, "Praha"),
    (582786, "Brno"),
    (554821, "Ostrava"),
    (554791, "Plzeň"),
    (544973, "České Budějovice"),
    (569810, "Liberec"),
    (569925, "Olomouc"),
    (574490, "Hradec Králové"),
    (555134, "Pardubice"),
    (585068, "Zlín"),
    (555771, "Kladno"),
    (567985, "Most"),
    (510266, "Opava"),
    (598003, "Jihlava"),
    (573868, "Teplice"),
    (598909, "Karlovy Vary"),
    (560286, "Ústí nad Labem"),
];

/// Result of one enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionEnumeration {
    /// Municipality id to display name, ids unique across regions
    pub municipalities: BTreeMap<MunicipalityId, String>,
    /// True when the built-in fallback list was used
    pub degraded: bool,
    /// Regions whose municipality lookup failed
    pub failed_regions: usize,
}

impl RegionEnumeration {
    pub fn len(&self) -> usize {
        self.municipalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.municipalities.is_empty()
    }

    /// The built-in list of major cities
    pub fn fallback() -> Self {
        Self {
            municipalities: FALLBACK_MUNICIPALITIES
                .iter()
                .map(|(id, name)| (MunicipalityId::new(*id), (*name).to_string()))
                .collect(),
            degraded: true,
            failed_regions: 0,
        }
    }
}

pub struct RegionEnumerator {
    gazetteer: Arc<dyn Gazetteer>,
    pacer: Arc<dyn Pacer>,
}

impl RegionEnumerator {
    pub fn new(gazetteer: Arc<dyn Gazetteer>, pacer: Arc<dyn Pacer>) -> Self {
        Self { gazetteer, pacer }
    }

    /// Builds the municipality map; never fails
    pub async fn enumerate(&self) -> RegionEnumeration {
        let regions = match self.gazetteer.regions().await {
            Ok(regions) if !regions.is_empty() => regions,
            Ok(_) => {
                tracing::warn!("Gazetteer returned no regions, using built-in municipality list");
                return RegionEnumeration::fallback();
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Gazetteer unreachable, using built-in municipality list (degraded coverage)"
                );
                return RegionEnumeration::fallback();
            }
        };

        tracing::info!(regions = regions.len(), "Enumerating municipalities");

        let mut result = RegionEnumeration::default();
        for region in &regions {
            self.pacer.wait().await;

            match self.gazetteer.municipalities(region).await {
                Ok(municipalities) => {
                    tracing::debug!(
                        region = %region.name,
                        count = municipalities.len(),
                        "Loaded municipalities"
                    );
                    for municipality in municipalities {
                        result
                            .municipalities
                            .insert(municipality.id, municipality.name);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        region = %region.name,
                        region_id = %region.id,
                        error = %e,
                        "Failed to load municipalities for region, skipping"
                    );
                    result.failed_regions += 1;
                }
            }
        }

        if result.is_empty() {
            tracing::warn!(
                "No municipalities loaded from gazetteer, using built-in municipality list"
            );
            return RegionEnumeration::fallback();
        }

        tracing::info!(
            municipalities = result.len(),
            failed_regions = result.failed_regions,
            "Municipality enumeration complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pacing::NoPacing;
    use crate::domain::{HttpError, Municipality, Region, RegionId};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeGazetteer {
        regions: Result<Vec<Region>, HttpError>,
        municipalities: HashMap<u32, Result<Vec<Municipality>, HttpError>>,
    }

    #[async_trait]
    impl Gazetteer for FakeGazetteer {
        async fn regions(&self) -> Result<Vec<Region>, HttpError> {
            self.regions.clone()
        }

        async fn municipalities(&self, region: &Region) -> Result<Vec<Municipality>, HttpError> {
            self.municipalities
                .get(&region.id.get())
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn region(id: u32, name: &str) -> Region {
        Region {
            id: RegionId::new(id),
            name: name.to_string(),
        }
    }

    fn municipality(id: u32, name: &str, region: u32) -> Municipality {
        Municipality::new(MunicipalityId::new(id), name, Some(RegionId::new(region)))
    }

    fn enumerator(gazetteer: FakeGazetteer) -> RegionEnumerator {
        RegionEnumerator::new(Arc::new(gazetteer), Arc::new(NoPacing))
    }

    #[tokio::test]
    async fn test_merges_regions() {
        let gazetteer = FakeGazetteer {
            regions: Ok(vec![region(116, "Jihomoravský"), region(19, "Praha")]),
            municipalities: HashMap::from([
                (
                    116,
                    Ok(vec![
                        municipality(582786, "Brno", 116),
                        municipality(583031, "Blansko", 116),
                    ]),
                ),
                (19, Ok(vec![municipality(554782, "Praha", 19)])),
            ]),
        };

        let result = enumerator(gazetteer).enumerate().await;

        assert!(!result.degraded);
        assert_eq!(result.len(), 3);
        assert_eq!(
            result.municipalities.get(&MunicipalityId::new(582786)).map(String::as_str),
            Some("Brno")
        );
    }

    #[tokio::test]
    async fn test_single_region_failure_is_skipped() {
        let gazetteer = FakeGazetteer {
            regions: Ok(vec![region(116, "Jihomoravský"), region(19, "Praha")]),
            municipalities: HashMap::from([
                (116, Ok(vec![municipality(582786, "Brno", 116)])),
                (19, Err(HttpError::Timeout("slow".to_string()))),
            ]),
        };

        let result = enumerator(gazetteer).enumerate().await;

        assert!(!result.degraded);
        assert_eq!(result.len(), 1);
        assert_eq!(result.failed_regions, 1);
    }

    #[tokio::test]
    async fn test_unreachable_gazetteer_falls_back() {
        let gazetteer = FakeGazetteer {
            regions: Err(HttpError::ConnectionFailed("refused".to_string())),
            municipalities: HashMap::new(),
        };

        let result = enumerator(gazetteer).enumerate().await;

        assert!(result.degraded);
        assert_eq!(result.len(), FALLBACK_MUNICIPALITIES.len());
        assert!(result.municipalities.contains_key(&MunicipalityId::new(554782)));
    }

    #[tokio::test]
    async fn test_empty_result_falls_back() {
        let gazetteer = FakeGazetteer {
            regions: Ok(vec![region(19, "Praha")]),
            municipalities: HashMap::new(),
        };

        let result = enumerator(gazetteer).enumerate().await;

        assert!(result.degraded);
    }

    #[test]
    fn test_fallback_ids_are_unique() {
        assert_eq!(
            RegionEnumeration::fallback().len(),
            FALLBACK_MUNICIPALITIES.len()
        );
    }
}
