//! Error types for the map shading pipeline and its services.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for map rendering operations.
///
/// Every variant aborts the request it was raised in. Variants carry the
/// offending value (source key, geometry kind, transform name, ...) so the
/// caller can report it verbatim.
#[derive(Debug, Error)]
pub enum MapError {
    // === Request Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Service '{service}' is not enabled for source '{source_key}'")]
    ServiceNotAvailable { source_key: String, service: String },

    // === Pipeline Errors ===
    #[error("Unsupported geometry type '{kind}' for source '{source_key}'")]
    UnsupportedGeometry { source_key: String, kind: String },

    #[error("Invalid interpolation method: {0}")]
    InvalidInterpolation(String),

    #[error("No data to rasterize for source '{0}'")]
    EmptyAggregate(String),

    #[error("Invalid transform name: {0}")]
    UnknownTransform(String),

    #[error("Invalid projection: EPSG:{0}")]
    InvalidProjection(u32),

    // === Configuration / Load Errors ===
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    #[error("Failed to read data: {0}")]
    DataRead(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),
}

impl MapError {
    /// Shorthand for an InvalidConfig error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        MapError::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for error responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            MapError::InvalidRequest(_) => "InvalidRequest",
            MapError::SourceNotFound(_) => "SourceNotFound",
            MapError::ServiceNotAvailable { .. } => "ServiceNotAvailable",
            MapError::UnsupportedGeometry { .. } => "UnsupportedGeometry",
            MapError::InvalidInterpolation(_) => "InvalidInterpolation",
            MapError::EmptyAggregate(_) => "EmptyAggregate",
            MapError::UnknownTransform(_) => "UnknownTransform",
            MapError::InvalidProjection(_) => "InvalidProjection",
            MapError::InvalidConfig { .. } => "InvalidConfig",
            MapError::DataRead(_) => "DataReadError",
            MapError::Encode(_) => "EncodeError",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MapError::InvalidRequest(_)
            | MapError::InvalidInterpolation(_)
            | MapError::InvalidConfig { .. } => 400,

            MapError::SourceNotFound(_)
            | MapError::ServiceNotAvailable { .. }
            | MapError::EmptyAggregate(_) => 404,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::DataRead(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::DataRead(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for MapError {
    fn from(err: serde_yaml::Error) -> Self {
        MapError::invalid_config("yaml", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MapError::InvalidRequest("x".into()).http_status_code(), 400);
        assert_eq!(MapError::EmptyAggregate("elevation".into()).http_status_code(), 404);
        assert_eq!(MapError::UnknownTransform("blur".into()).http_status_code(), 500);
        assert_eq!(MapError::InvalidProjection(2154).http_status_code(), 500);
    }

    #[test]
    fn test_messages_embed_offending_value() {
        let err = MapError::UnknownTransform("blur".into());
        assert!(err.to_string().contains("blur"));

        let err = MapError::UnsupportedGeometry {
            source_key: "world-cities".into(),
            kind: "raster".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("world-cities"));
        assert!(msg.contains("raster"));
    }
}
