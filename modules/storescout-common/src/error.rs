use thiserror::Error;

/// A field that should exist on an otherwise-successfully fetched page is
/// absent or malformed. Never aborts a batch; the offending item is
/// surfaced as a per-item failure by its stage.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("malformed number in {field}: {value:?}")]
    Number { field: &'static str, value: String },

    #[error("embedded profile payload not found")]
    PayloadMissing,

    #[error("profile payload JSON: {0}")]
    PayloadJson(String),
}
