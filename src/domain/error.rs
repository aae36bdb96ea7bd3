// Errors raised while turning upstream payloads into display values
use thiserror::Error;

/// An expected field was missing or had the wrong shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("forecast payload is not valid JSON: {0}")]
    Payload(String),

    #[error("missing field `{0}` in forecast payload")]
    MissingField(String),

    #[error("expected at least {expected} daily buckets, found {found}")]
    TooFewBuckets { expected: usize, found: usize },

    #[error("invalid time series: {0}")]
    InvalidSeries(String),
}

/// The bus departure board did not contain a usable JSON object.
#[derive(Debug, Error)]
pub enum MalformedFeedError {
    #[error("no JSON object found in departure feed")]
    NoJsonObject,

    #[error("departure feed JSON failed to parse: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("colour range is empty or not finite: [{min}, {max}]")]
    EmptyRange { min: f64, max: f64 },

    #[error("unknown colour `{0}`")]
    UnknownColour(String),

    #[error("colour channel {0} is outside the encodable range 0..=1")]
    OutOfGamut(f64),
}
