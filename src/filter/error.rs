use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
}
