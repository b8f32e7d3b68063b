// Reassembles a flat multi-part field set (dotted keys) into the nested
// property value objects.

use std::collections::HashMap;
use std::str::FromStr;

use super::property::{Location, PropertyFields, Rates, SellerInfo};

/// One submitted file part
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original file name; empty when the file input was left unset
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Text parts of a multi-part submission, in submission order. Keys may
/// repeat (`amenities`).
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    entries: Vec<(String, String)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn text(&self, key: &str) -> String {
        self.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    /// First non-blank value among alias keys
    fn text_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.get(k).filter(|v| !v.trim().is_empty()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Field name -> coercion message
pub type FieldErrors = HashMap<String, String>;

impl PropertyFields {
    /// Decode the property field set from a multi-part submission.
    ///
    /// Empty numeric values are treated as absent; non-numeric values are
    /// reported per field. Unknown keys are ignored.
    pub fn from_form(form: &FormFields) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let beds = number(form, &["beds"], "beds", &mut errors);
        let baths = number(form, &["baths"], "baths", &mut errors);
        let square_feet = number(form, &["square_feet"], "square_feet", &mut errors);
        let rates = Rates {
            weekly: number(form, &["rates.weekly"], "rates.weekly", &mut errors),
            monthly: number(form, &["rates.monthly"], "rates.monthly", &mut errors),
            // older clients post the nightly rate under a trailing-dot key
            nightly: number(form, &["rates.nightly", "rates.nightly."], "rates.nightly", &mut errors),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let amenities = form
            .get_all("amenities")
            .into_iter()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();

        let mut fields = PropertyFields {
            property_type: form.text("type"),
            name: form.text("name"),
            description: form.text("description"),
            location: Location {
                street: form.text("location.street"),
                city: form.text("location.city"),
                state: form.text("location.state"),
                zipcode: form.text("location.zipcode"),
            },
            beds,
            baths,
            square_feet,
            amenities,
            rates,
            seller_info: SellerInfo {
                name: form.text("seller_info.name"),
                email: form.text("seller_info.email"),
                phone: form.text("seller_info.phone"),
            },
        };
        fields.dedup_amenities();
        Ok(fields)
    }
}

fn number<T: FromStr>(form: &FormFields, keys: &[&str], field: &str, errors: &mut FieldErrors) -> Option<T> {
    let raw = form.text_any(keys)?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.insert(field.to_string(), format!("'{}' is not a valid number", raw));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> FormFields {
        [
            ("type", "Apartment"),
            ("name", " Lakeside Loft "),
            ("description", "Two rooms by the lake"),
            ("location.street", "1 Shore Rd"),
            ("location.city", "Boston"),
            ("location.state", "MA"),
            ("location.zipcode", "02101"),
            ("beds", "2"),
            ("baths", "1.5"),
            ("square_feet", "900"),
            ("amenities", "Wifi"),
            ("amenities", "Pool"),
            ("amenities", "Wifi"),
            ("rates.weekly", "700"),
            ("rates.monthly", ""),
            ("rates.nightly.", "120"),
            ("seller_info.name", "Jane"),
            ("seller_info.email", "jane@example.com"),
            ("seller_info.phone", "555-0100"),
            ("unknown", "ignored"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn reassembles_dotted_keys_into_value_objects() {
        let fields = PropertyFields::from_form(&sample_form()).unwrap();
        assert_eq!(fields.property_type, "Apartment");
        assert_eq!(fields.name, "Lakeside Loft");
        assert_eq!(fields.location.city, "Boston");
        assert_eq!(fields.location.zipcode, "02101");
        assert_eq!(fields.seller_info.email, "jane@example.com");
        assert_eq!(fields.beds, Some(2));
        assert_eq!(fields.baths, Some(1.5));
        assert_eq!(fields.square_feet, Some(900));
        assert_eq!(fields.amenities, vec!["Wifi", "Pool"]);
    }

    #[test]
    fn empty_rates_are_absent_and_nightly_alias_is_accepted() {
        let fields = PropertyFields::from_form(&sample_form()).unwrap();
        assert_eq!(fields.rates.weekly, Some(700.0));
        assert_eq!(fields.rates.monthly, None);
        assert_eq!(fields.rates.nightly, Some(120.0));
    }

    #[test]
    fn blank_canonical_rate_falls_back_to_alias() {
        let form: FormFields = [("type", "House"), ("name", "x"), ("rates.nightly", ""), ("rates.nightly.", "120")]
            .into_iter()
            .collect();
        let fields = PropertyFields::from_form(&form).unwrap();
        assert_eq!(fields.rates.nightly, Some(120.0));
    }

    #[test]
    fn non_numeric_values_are_field_errors() {
        let form: FormFields = [("type", "House"), ("name", "x"), ("beds", "two"), ("rates.weekly", "abc")]
            .into_iter()
            .collect();
        let errors = PropertyFields::from_form(&form).unwrap_err();
        assert!(errors.contains_key("beds"));
        assert!(errors.contains_key("rates.weekly"));
    }

    #[test]
    fn missing_keys_decode_to_defaults() {
        let fields = PropertyFields::from_form(&FormFields::new()).unwrap();
        assert_eq!(fields, PropertyFields::default());
    }
}
