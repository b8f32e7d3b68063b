use super::types::{Field, Predicate};

/// Property type value meaning "do not filter by type"
pub const ALL_TYPES: &str = "All";

/// Longest accepted location token, in characters
pub const MAX_SEARCH_TERM_CHARS: usize = 1000;

/// Build the filter for a free-text location search.
///
/// The location token is matched as a literal, case-insensitive substring
/// of any searchable text field; an empty token matches everything. A type
/// token other than `"All"` additionally restricts the `type` field.
pub fn build_search_filter(location: &str, property_type: Option<&str>) -> Predicate {
    let location_match = Predicate::Or(
        Field::SEARCHABLE
            .iter()
            .map(|field| Predicate::contains(*field, location))
            .collect(),
    );

    match property_type {
        Some(t) if !t.is_empty() && t != ALL_TYPES => {
            Predicate::And(vec![location_match, Predicate::contains(Field::Type, t)])
        }
        _ => location_match,
    }
}
