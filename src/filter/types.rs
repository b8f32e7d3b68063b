use serde::{Deserialize, Serialize};

/// Queryable property fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Description,
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "location.street")]
    Street,
    #[serde(rename = "location.city")]
    City,
    #[serde(rename = "location.state")]
    State,
    #[serde(rename = "location.zipcode")]
    Zipcode,
    Owner,
    IsFeatured,
}

impl Field {
    /// Text fields searched by a free-text location query
    pub const SEARCHABLE: [Field; 6] = [
        Field::Name,
        Field::Description,
        Field::Street,
        Field::City,
        Field::State,
        Field::Zipcode,
    ];

    /// Column expression in the `properties` table
    pub fn sql_expr(&self) -> &'static str {
        match self {
            Field::Name => "\"name\"",
            Field::Description => "\"description\"",
            Field::Type => "\"type\"",
            Field::Street => "(\"location\"->>'street')",
            Field::City => "(\"location\"->>'city')",
            Field::State => "(\"location\"->>'state')",
            Field::Zipcode => "(\"location\"->>'zipcode')",
            Field::Owner => "\"owner\"",
            Field::IsFeatured => "\"is_featured\"",
        }
    }
}

/// Literal value compared by `Predicate::Eq`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Text(String),
}

/// Store-neutral filter tree. Rendered to SQL by `filter::sql` and
/// evaluated in memory by `filter::matcher`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    All,
    Eq(Field, Scalar),
    /// Case-insensitive literal substring match
    Contains(Field, String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: Field, value: impl Into<Scalar>) -> Self {
        Predicate::Eq(field, value.into())
    }

    pub fn contains(field: Field, needle: impl Into<String>) -> Self {
        Predicate::Contains(field, needle.into())
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// Bounded range of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// Positional parameter bound to a rendered statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Bool(bool),
    Text(String),
    Int(i64),
}
