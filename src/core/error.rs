use thiserror::Error;

/// Crate-wide error type.
///
/// Validation failures are never coerced into defaults; conversion and
/// resource errors propagate to the caller without retry.
#[derive(Debug, Error)]
pub enum Error {
    #[error("'{0}' is not a valid 24 digit hex string")]
    InvalidId(String),

    #[error("object id must be 12 bytes, got {0}")]
    InvalidIdLength(usize),

    #[error("cannot convert value of field '{field}': {message}")]
    TypeConversion { field: String, message: String },

    #[error("document has no 'id' field value")]
    MissingKey,

    #[error("schema for this record has no field named '{0}'")]
    UnknownField(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index engine error: {0}")]
    Engine(#[from] tantivy::TantivyError),

    #[error("query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),
}

impl Error {
    /// Build a type-conversion error for a named field.
    pub fn conversion(field: &str, message: impl ToString) -> Self {
        Error::TypeConversion {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
