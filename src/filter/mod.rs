pub mod error;
pub mod matcher;
pub mod pagination;
pub mod search;
pub mod sql;
pub mod types;

pub use error::FilterError;
pub use matcher::Matcher;
pub use pagination::{PageQuery, Pagination};
pub use search::{build_search_filter, MAX_SEARCH_TERM_CHARS};
pub use types::*;
