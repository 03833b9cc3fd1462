use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JPathError {
    #[error("Path parse error in '{0}': {1}")]
    PathParse(String, String),

    #[error("Aggregation '{0}' must be the last segment of '{1}'")]
    MisplacedCall(String, String),

    #[error("Unknown aggregate function: {0}")]
    UnknownAggregate(String),
}
