//! Free-text geocoding queries

use crate::domain::GeocodeCandidate;

/// Builds the most specific query the candidate's address supports
///
/// Preference: street with house number, street alone, postal code, then
/// municipality alone. Without a municipality there is nothing to anchor
/// the query, so `None` is returned.
pub fn build_query(candidate: &GeocodeCandidate, country: &str) -> Option<String> {
    let municipality = non_blank(candidate.municipality.as_deref())?;
    let street = non_blank(candidate.street.as_deref());
    let house_number = non_blank(candidate.house_number.as_deref());
    let postal_code = non_blank(candidate.postal_code.as_deref());

    let query = match (street, house_number, postal_code) {
        (Some(street), Some(house), _) => format!("{street} {house}, {municipality}, {country}"),
        (Some(street), None, _) => format!("{street}, {municipality}, {country}"),
        (None, _, Some(postal)) => format!("{postal} {municipality}, {country}"),
        (None, _, None) => format!("{municipality}, {country}"),
    };
    Some(query)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
