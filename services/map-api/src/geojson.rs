//! GeoJSON document types for reading vector sources and exporting them.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use aggregation::Feature;

/// A GeoJSON position. Only x and y are kept; any altitude is dropped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Position(pub [f64; 2]);

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self([x, y])
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y, ..] => Ok(Self([*x, *y])),
            _ => Err(format!(
                "position needs at least 2 elements, got {}",
                values.len()
            )),
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self {
        p.0
    }
}

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoJsonFeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<GeoJsonFeature>,
}

impl GeoJsonFeatureCollection {
    pub fn new(features: Vec<GeoJsonFeature>) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features,
        }
    }

    pub fn from_features(features: &[Feature]) -> Self {
        Self::new(features.iter().map(GeoJsonFeature::from).collect())
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoJsonFeature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Null geometries are allowed by GeoJSON.
    pub geometry: Option<GeoJsonGeometry>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl GeoJsonFeature {
    /// Convert to a feature for aggregation. None for a null geometry.
    pub fn to_feature(&self) -> Option<Feature> {
        let geometry = self.geometry.as_ref()?;
        Some(Feature {
            geometry: Geometry::from(geometry),
            properties: self.properties.clone().unwrap_or_default(),
        })
    }
}

impl From<&Feature> for GeoJsonFeature {
    fn from(feature: &Feature) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry: Some(GeoJsonGeometry::from(&feature.geometry)),
            properties: Some(feature.properties.clone()),
        }
    }
}

/// GeoJSON geometry objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    /// First ring is the exterior, the rest are holes.
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

fn coord(p: &Position) -> Coord<f64> {
    Coord {
        x: p.0[0],
        y: p.0[1],
    }
}

fn line(ring: &[Position]) -> LineString<f64> {
    LineString::new(ring.iter().map(coord).collect())
}

fn polygon(rings: &[Vec<Position>]) -> Polygon<f64> {
    let mut iter = rings.iter().map(|r| line(r));
    let exterior = iter.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, iter.collect())
}

fn positions(ls: &LineString<f64>) -> Vec<Position> {
    ls.coords().map(|c| Position::new(c.x, c.y)).collect()
}

fn rings(p: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .map(positions)
        .collect()
}

impl From<&GeoJsonGeometry> for Geometry<f64> {
    fn from(g: &GeoJsonGeometry) -> Self {
        match g {
            GeoJsonGeometry::Point { coordinates } => Point::from(coord(coordinates)).into(),
            GeoJsonGeometry::MultiPoint { coordinates } => {
                MultiPoint::new(coordinates.iter().map(|p| Point::from(coord(p))).collect()).into()
            }
            GeoJsonGeometry::LineString { coordinates } => line(coordinates).into(),
            GeoJsonGeometry::MultiLineString { coordinates } => {
                MultiLineString::new(coordinates.iter().map(|l| line(l)).collect()).into()
            }
            GeoJsonGeometry::Polygon { coordinates } => polygon(coordinates).into(),
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                MultiPolygon::new(coordinates.iter().map(|p| polygon(p)).collect()).into()
            }
            GeoJsonGeometry::GeometryCollection { geometries } => {
                Geometry::GeometryCollection(GeometryCollection::new_from(
                    geometries.iter().map(Geometry::from).collect(),
                ))
            }
        }
    }
}

impl From<&Geometry<f64>> for GeoJsonGeometry {
    fn from(g: &Geometry<f64>) -> Self {
        match g {
            Geometry::Point(p) => GeoJsonGeometry::Point {
                coordinates: Position::new(p.x(), p.y()),
            },
            Geometry::MultiPoint(mp) => GeoJsonGeometry::MultiPoint {
                coordinates: mp.iter().map(|p| Position::new(p.x(), p.y())).collect(),
            },
            Geometry::Line(l) => GeoJsonGeometry::LineString {
                coordinates: vec![
                    Position::new(l.start.x, l.start.y),
                    Position::new(l.end.x, l.end.y),
                ],
            },
            Geometry::LineString(ls) => GeoJsonGeometry::LineString {
                coordinates: positions(ls),
            },
            Geometry::MultiLineString(mls) => GeoJsonGeometry::MultiLineString {
                coordinates: mls.iter().map(positions).collect(),
            },
            Geometry::Polygon(p) => GeoJsonGeometry::Polygon {
                coordinates: rings(p),
            },
            Geometry::MultiPolygon(mp) => GeoJsonGeometry::MultiPolygon {
                coordinates: mp.iter().map(rings).collect(),
            },
            Geometry::Rect(r) => GeoJsonGeometry::Polygon {
                coordinates: rings(&r.to_polygon()),
            },
            Geometry::Triangle(t) => GeoJsonGeometry::Polygon {
                coordinates: rings(&t.to_polygon()),
            },
            Geometry::GeometryCollection(gc) => GeoJsonGeometry::GeometryCollection {
                geometries: gc.iter().map(GeoJsonGeometry::from).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ring(points: &[(f64, f64)]) -> Vec<Position> {
        points.iter().map(|&(x, y)| Position::new(x, y)).collect()
    }

    #[test]
    fn test_parse_feature_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                    "properties": { "value": 3 }
                },
                { "type": "Feature", "geometry": null, "properties": null }
            ]
        });
        let fc: GeoJsonFeatureCollection = serde_json::from_value(doc).unwrap();
        assert_eq!(fc.features.len(), 2);

        let feature = fc.features[0].to_feature().unwrap();
        assert_eq!(feature.geometry, Geometry::Point(Point::new(1.0, 2.0)));
        assert_eq!(feature.numeric_property("value"), Some(3.0));
        assert!(fc.features[1].to_feature().is_none());
    }

    #[test]
    fn test_polygon_with_hole() {
        let geometry = GeoJsonGeometry::Polygon {
            coordinates: vec![
                ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]),
                ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]),
            ],
        };
        match Geometry::from(&geometry) {
            Geometry::Polygon(p) => assert_eq!(p.interiors().len(), 1),
            other => panic!("expected polygon, got {:?}", other),
        }
        assert_eq!(GeoJsonGeometry::from(&Geometry::from(&geometry)), geometry);
    }

    #[test]
    fn test_export_shape() {
        let feature = Feature::new(Point::new(5.0, 6.0)).with_property("name", "a");
        let collection = GeoJsonFeatureCollection::from_features(&[feature]);
        let value = serde_json::to_value(collection).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["properties"]["name"], "a");
        assert!(value["features"][0].get("id").is_none());
    }

    #[test]
    fn test_altitude_is_dropped() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[1.0, 2.0, 30.0], [3.0, 4.0, 31.5, 7.0]]
                },
                "properties": {}
            }]
        });
        let fc: GeoJsonFeatureCollection = serde_json::from_value(doc).unwrap();
        let feature = fc.features[0].to_feature().unwrap();
        assert_eq!(
            feature.geometry,
            Geometry::LineString(LineString::from(vec![(1.0, 2.0), (3.0, 4.0)]))
        );

        let exported = serde_json::to_value(GeoJsonGeometry::from(&feature.geometry)).unwrap();
        assert_eq!(exported["coordinates"], json!([[1.0, 2.0], [3.0, 4.0]]));
    }

    #[test]
    fn test_short_position_is_rejected() {
        let doc = json!({ "type": "Point", "coordinates": [1.0] });
        assert!(serde_json::from_value::<GeoJsonGeometry>(doc).is_err());
    }

    #[test]
    fn test_geometry_collection_round_trip() {
        let doc = json!({
            "type": "GeometryCollection",
            "geometries": [
                { "type": "Point", "coordinates": [1.0, 2.0] },
                { "type": "LineString", "coordinates": [[0.0, 0.0], [5.0, 5.0]] }
            ]
        });
        let geometry: GeoJsonGeometry = serde_json::from_value(doc.clone()).unwrap();
        match Geometry::from(&geometry) {
            Geometry::GeometryCollection(gc) => {
                assert_eq!(gc.len(), 2);
                assert_eq!(gc[0], Geometry::Point(Point::new(1.0, 2.0)));
            }
            other => panic!("expected geometry collection, got {:?}", other),
        }
        assert_eq!(GeoJsonGeometry::from(&Geometry::from(&geometry)), geometry);
        assert_eq!(serde_json::to_value(&geometry).unwrap(), doc);
    }
}
