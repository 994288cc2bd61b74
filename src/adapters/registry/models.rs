//! Registry search request/response models

use crate::domain::{EntityType, MunicipalityId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sub-code the registry attaches when a search matches more records than
/// it is willing to page through
pub const OVERFLOW_SUBCODE: &str = "VYSTUP_PRILIS_MNOHO_VYSLEDKU";

/// One page of a filtered search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub entity_type: EntityType,
    pub municipality: MunicipalityId,
    pub name_prefix: Option<String>,
    pub offset: usize,
    pub limit: usize,
}

impl SearchQuery {
    pub fn first_page(
        entity_type: EntityType,
        municipality: MunicipalityId,
        name_prefix: Option<String>,
        limit: usize,
    ) -> Self {
        Self {
            entity_type,
            municipality,
            name_prefix,
            offset: 0,
            limit,
        }
    }

    /// Same filter, following page
    pub fn next_page(&self) -> Self {
        Self {
            offset: self.offset + self.limit,
            ..self.clone()
        }
    }

    pub fn to_request(&self) -> SearchRequest<'_> {
        SearchRequest {
            legal_forms: vec![self.entity_type.legal_form_code()],
            seat: SeatFilter {
                municipality_code: self.municipality.get(),
            },
            business_name: self.name_prefix.as_deref(),
            start: self.offset,
            count: self.limit,
        }
    }
}

/// JSON body of the search endpoint
#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    #[serde(rename = "pravniForma")]
    pub legal_forms: Vec<&'a str>,
    #[serde(rename = "sidlo")]
    pub seat: SeatFilter,
    #[serde(rename = "obchodniJmeno", skip_serializing_if = "Option::is_none")]
    pub business_name: Option<&'a str>,
    pub start: usize,
    #[serde(rename = "pocet")]
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SeatFilter {
    #[serde(rename = "kodObce")]
    pub municipality_code: u32,
}

/// Search response body; also returned (as a 400) for overflow
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub pocet_celkem: Option<u64>,
    #[serde(default)]
    pub ekonomicke_subjekty: Option<Vec<Value>>,
    #[serde(default)]
    pub sub_kod: Option<String>,
}

impl SearchResponse {
    pub fn is_overflow(&self) -> bool {
        self.sub_kod.as_deref() == Some(OVERFLOW_SUBCODE)
    }
}

/// Outcome of one search page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub records: Vec<RawSubject>,
    /// The filter matched more than the result ceiling; `records` is empty
    pub overflow: bool,
    pub total: Option<u64>,
}

impl SearchPage {
    pub fn overflow() -> Self {
        Self {
            records: Vec::new(),
            overflow: true,
            total: None,
        }
    }

    pub fn with_records(records: Vec<RawSubject>) -> Self {
        Self {
            records,
            overflow: false,
            total: None,
        }
    }
}

impl From<SearchResponse> for SearchPage {
    fn from(response: SearchResponse) -> Self {
        if response.is_overflow() {
            return SearchPage::overflow();
        }
        SearchPage {
            records: response
                .ekonomicke_subjekty
                .unwrap_or_default()
                .into_iter()
                .map(RawSubject)
                .collect(),
            overflow: false,
            total: response.pocet_celkem,
        }
    }
}

/// A registry record exactly as received
///
/// Kept loosely typed: the registry is inconsistent about numbers versus
/// strings, and normalization is the upserter's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSubject(pub Value);

impl RawSubject {
    /// Registration number as text, if present
    pub fn ico(&self) -> Option<String> {
        self.text("ico")
    }

    /// Top-level field as text
    pub fn text(&self, key: &str) -> Option<String> {
        value_as_text(self.0.get(key))
    }

    /// Field of the nested seat address as text
    pub fn seat_text(&self, key: &str) -> Option<String> {
        value_as_text(self.0.get("sidlo").and_then(|seat| seat.get(key)))
    }
}

/// Accepts strings and numbers; blank strings and other shapes become `None`
fn value_as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let query = SearchQuery::first_page(
            EntityType::Svj,
            MunicipalityId::new(582786),
            Some("AB".to_string()),
            1000,
        );
        let body = serde_json::to_value(query.to_request()).unwrap();
        assert_eq!(
            body,
            json!({
                "pravniForma": ["145"],
                "sidlo": {"kodObce": 582786},
                "obchodniJmeno": "AB",
                "start": 0,
                "pocet": 1000
            })
        );
    }

    #[test]
    fn test_request_body_without_prefix() {
        let query =
            SearchQuery::first_page(EntityType::Bd, MunicipalityId::new(554782), None, 1000)
                .next_page();
        let body = serde_json::to_value(query.to_request()).unwrap();
        assert!(body.get("obchodniJmeno").is_none());
        assert_eq!(body["start"], 1000);
        assert_eq!(body["pravniForma"][0], "205");
    }

    #[test]
    fn test_overflow_response_becomes_overflow_page() {
        let response: SearchResponse = serde_json::from_value(json!({
            "kod": "CHYBA_VSTUPU",
            "subKod": "VYSTUP_PRILIS_MNOHO_VYSLEDKU"
        }))
        .unwrap();
        let page = SearchPage::from(response);
        assert!(page.overflow);
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_raw_subject_text_accessors() {
        let raw = RawSubject(json!({
            "ico": "27074358",
            "sidlo": {"cisloDomovni": 1234, "nazevUlice": "  ", "psc": 60200}
        }));
        assert_eq!(raw.ico().as_deref(), Some("27074358"));
        assert_eq!(raw.seat_text("cisloDomovni").as_deref(), Some("1234"));
        assert_eq!(raw.seat_text("psc").as_deref(), Some("60200"));
        assert_eq!(raw.seat_text("nazevUlice"), None);
        assert_eq!(raw.seat_text("missing"), None);
    }
}
