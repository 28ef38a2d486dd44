use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the facility dataset. All of these abort startup.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("cannot open dataset {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: {reason}")]
    InvalidRow { row: u64, reason: String },

    #[error("dataset contains no facilities")]
    Empty,
}

/// Failures of a single call to the text-generation service.
///
/// These never escape [`crate::dispatch::QueryDispatcher::dispatch`]; they are
/// carried inside a [`crate::dispatch::DispatchResult`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("request to {endpoint} failed: {message}")]
    Network { endpoint: String, message: String },

    #[error("authentication rejected (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum GeoMeshError {
    #[error("Data load error: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude} (both must be finite)")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, GeoMeshError>;

impl GeoMeshError {
    /// Whether this error belongs to a single query rather than to the process.
    pub fn is_per_query(&self) -> bool {
        matches!(
            self,
            GeoMeshError::InvalidCoordinate { .. } | GeoMeshError::Validation(_)
        )
    }
}
