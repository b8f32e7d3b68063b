use regex::{Regex, RegexBuilder};

use super::error::FilterError;
use super::types::{Field, Predicate, Scalar};
use crate::models::Property;

// Fits a case-insensitive needle of MAX_SEARCH_TERM_CHARS multi-byte characters.
const REGEX_SIZE_LIMIT: usize = 1 << 23;

/// A `Predicate` compiled for in-memory evaluation.
///
/// Substring needles are escaped before compilation, so `a.*` only matches
/// the literal text `a.*`. The `regex` engine runs in linear time, so no
/// input can trigger catastrophic backtracking.
#[derive(Debug)]
pub enum Matcher {
    All,
    Eq(Field, Scalar),
    Contains(Field, Regex),
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
}

impl Matcher {
    pub fn compile(predicate: &Predicate) -> Result<Self, FilterError> {
        Ok(match predicate {
            Predicate::All => Matcher::All,
            Predicate::Eq(field, value) => Matcher::Eq(*field, value.clone()),
            Predicate::Contains(field, needle) => {
                let regex = RegexBuilder::new(&regex::escape(needle))
                    .case_insensitive(true)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                    .map_err(|e| FilterError::InvalidPattern(e.to_string()))?;
                Matcher::Contains(*field, regex)
            }
            Predicate::And(parts) => Matcher::And(parts.iter().map(Self::compile).collect::<Result<_, _>>()?),
            Predicate::Or(parts) => Matcher::Or(parts.iter().map(Self::compile).collect::<Result<_, _>>()?),
        })
    }

    pub fn matches(&self, property: &Property) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Eq(Field::IsFeatured, Scalar::Bool(b)) => property.is_featured == *b,
            Matcher::Eq(field, Scalar::Text(s)) => text_of(property, *field) == Some(s.as_str()),
            Matcher::Eq(_, Scalar::Bool(_)) => false,
            Matcher::Contains(field, regex) => text_of(property, *field).map_or(false, |t| regex.is_match(t)),
            Matcher::And(parts) => parts.iter().all(|m| m.matches(property)),
            Matcher::Or(parts) => parts.iter().any(|m| m.matches(property)),
        }
    }
}

fn text_of(property: &Property, field: Field) -> Option<&str> {
    let f = &property.fields;
    Some(match field {
        Field::Name => &f.name,
        Field::Description => &f.description,
        Field::Type => &f.property_type,
        Field::Street => &f.location.street,
        Field::City => &f.location.city,
        Field::State => &f.location.state,
        Field::Zipcode => &f.location.zipcode,
        Field::Owner => property.owner.as_str(),
        Field::IsFeatured => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::search::{build_search_filter, MAX_SEARCH_TERM_CHARS};
    use crate::models::{Identity, Location, PropertyFields};
    use chrono::Utc;
    use uuid::Uuid;

    fn property(name: &str, kind: &str, city: &str) -> Property {
        Property {
            id: Uuid::new_v4(),
            fields: PropertyFields {
                property_type: kind.into(),
                name: name.into(),
                location: Location { city: city.into(), ..Default::default() },
                ..Default::default()
            },
            images: vec![],
            owner: Identity::new("owner123"),
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn matches(p: &Predicate, prop: &Property) -> bool {
        Matcher::compile(p).unwrap().matches(prop)
    }

    #[test]
    fn location_match_is_case_insensitive_across_fields() {
        let by_name = property("Big LAKE house", "House", "Denver");
        let by_city = property("Cabin", "Cabin", "Salt Lake City");
        let neither = property("Cabin", "Cabin", "Denver");
        let filter = build_search_filter("lake", Some("All"));
        assert!(matches(&filter, &by_name));
        assert!(matches(&filter, &by_city));
        assert!(!matches(&filter, &neither));
    }

    #[test]
    fn type_filter_restricts_results() {
        let apartment = property("Lake view", "Studio Apartment", "Chicago");
        let house = property("Lake view", "House", "Chicago");
        let filter = build_search_filter("lake", Some("apartment"));
        assert!(matches(&filter, &apartment));
        assert!(!matches(&filter, &house));
    }

    #[test]
    fn metacharacters_are_literal() {
        let plain = property("abc", "House", "x");
        let literal = property("deal a.* here", "House", "x");
        let filter = build_search_filter("a.*", None);
        assert!(!matches(&filter, &plain));
        assert!(matches(&filter, &literal));
        assert!(Matcher::compile(&build_search_filter("(a+)+$[", None)).is_ok());
    }

    #[test]
    fn longest_accepted_needle_compiles() {
        for ch in ["a", "é", "ß"] {
            let needle = ch.repeat(MAX_SEARCH_TERM_CHARS);
            assert!(Matcher::compile(&build_search_filter(&needle, Some("Cabin"))).is_ok());
        }
    }

    #[test]
    fn empty_location_matches_everything() {
        assert!(matches(&build_search_filter("", None), &property("", "", "")));
    }

    #[test]
    fn owner_and_featured_equality() {
        let mut p = property("x", "House", "y");
        assert!(matches(&Predicate::eq(Field::Owner, "owner123"), &p));
        assert!(!matches(&Predicate::eq(Field::Owner, "owner1234"), &p));
        assert!(!matches(&Predicate::eq(Field::IsFeatured, true), &p));
        p.is_featured = true;
        assert!(matches(&Predicate::eq(Field::IsFeatured, true), &p));
    }
}
