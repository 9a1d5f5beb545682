use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MapError, MapResult};

/// Geometry kind of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    Raster,
}

impl GeometryKind {
    /// Parse a geometry kind name as found in source configuration.
    pub fn parse(s: &str, source_key: &str) -> MapResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "point" | "points" => Ok(GeometryKind::Point),
            "line" | "lines" | "linestring" => Ok(GeometryKind::Line),
            "polygon" | "polygons" => Ok(GeometryKind::Polygon),
            "raster" => Ok(GeometryKind::Raster),
            other => Err(MapError::UnsupportedGeometry {
                source_key: source_key.to_string(),
                kind: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Polygon => "polygon",
            GeometryKind::Raster => "raster",
        }
    }

    pub fn is_vector(&self) -> bool {
        !matches!(self, GeometryKind::Raster)
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
