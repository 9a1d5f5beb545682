//! Source configuration loader.
//!
//! Sources are declared in a YAML file under a top-level `sources:` list.
//! Each entry is parsed into raw `Yaml*` structs first and then converted
//! into a [`SourceDescriptor`] with every option validated. Relative data
//! paths resolve against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use aggregation::{Interpolation, Overview, OverviewSpec, Reduction};
use map_common::{Extent, GeometryKind, MapError, MapResult, DEFAULT_TILE_SIZE};
use renderer::{ColorMap, ShadeHow, SpanPolicy, DEFAULT_RAMP};

use crate::source::{ServiceType, SourceDescriptor, DEFAULT_EXTENT, WEB_MERCATOR_EPSG};

/// Error text for a min/max span on a vector source without a value field.
const MINMAX_NEEDS_ZFIELD: &str = "You must include a zfield for min/max scan calculation";

// ============================================================================
// YAML Parsing Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct YamlConfigFile {
    #[serde(default)]
    sources: Vec<YamlSource>,
}

#[derive(Debug, Deserialize)]
struct YamlSource {
    key: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    geometry_type: String,
    filepath: String,
    #[serde(default)]
    zfield: Option<String>,
    #[serde(default)]
    agg_func: Option<String>,
    #[serde(default)]
    cmap: Option<YamlColorMap>,
    #[serde(default)]
    span: Option<YamlSpan>,
    #[serde(default)]
    shade_how: Option<String>,
    #[serde(default)]
    dynspread: Option<u32>,
    #[serde(default)]
    raster_padding: Option<f64>,
    #[serde(default)]
    raster_interpolate: Option<String>,
    #[serde(default)]
    extras: Vec<String>,
    #[serde(default)]
    overviews: Vec<YamlOverview>,
    #[serde(default)]
    service_types: Option<Vec<String>>,
    #[serde(default)]
    default_extent: Option<[f64; 4]>,
    #[serde(default)]
    default_width: Option<u32>,
    #[serde(default)]
    default_height: Option<u32>,
    #[serde(default)]
    epsg: Option<u32>,
    /// Georeferencing for image rasters: [xmin, ymin, xmax, ymax].
    #[serde(default)]
    extent: Option<[f64; 4]>,
}

/// A ramp name, a list of colours, or a category -> colour mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlColorMap {
    Name(String),
    List(Vec<String>),
    Categories(serde_yaml::Mapping),
}

/// `min/max` or an explicit `[lo, hi]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlSpan {
    Policy(String),
    Range(Vec<f64>),
}

#[derive(Debug, Deserialize)]
struct YamlOverview {
    #[serde(default = "default_overview_levels")]
    levels: u32,
    #[serde(default)]
    min_zoom: Option<u32>,
    #[serde(default)]
    max_zoom: Option<u32>,
}

fn default_overview_levels() -> u32 {
    1
}

// ============================================================================
// Loading
// ============================================================================

/// Read and validate every source declared in a config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> MapResult<Vec<SourceDescriptor>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        MapError::invalid_config("config", format!("failed to read {}: {}", path.display(), e))
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let sources = parse_config(&contents, base_dir)?;
    info!(path = %path.display(), sources = sources.len(), "Loaded source config");
    Ok(sources)
}

/// Parse config text. Relative file paths resolve against `base_dir`.
pub fn parse_config(contents: &str, base_dir: &Path) -> MapResult<Vec<SourceDescriptor>> {
    let yaml: YamlConfigFile = serde_yaml::from_str(contents)?;
    if yaml.sources.is_empty() {
        warn!("Source config declares no sources");
    }

    let mut descriptors: Vec<SourceDescriptor> = Vec::with_capacity(yaml.sources.len());
    for source in yaml.sources {
        let descriptor = convert_source(source, base_dir)?;
        if descriptors.iter().any(|d| d.key == descriptor.key) {
            return Err(MapError::invalid_config(
                "key",
                format!("duplicate source key '{}'", descriptor.key),
            ));
        }
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

fn convert_source(yaml: YamlSource, base_dir: &Path) -> MapResult<SourceDescriptor> {
    let key = yaml.key.trim().to_string();
    if key.is_empty() || key.contains('/') {
        return Err(MapError::invalid_config(
            "key",
            format!("invalid source key '{}'", yaml.key),
        ));
    }

    let geometry_kind = GeometryKind::parse(&yaml.geometry_type, &key)?;
    let value_field = yaml.zfield.filter(|f| !f.trim().is_empty());

    let span = match yaml.span {
        None => SpanPolicy::None,
        Some(span) => parse_span(span)?,
    };
    if span == SpanPolicy::MinMax && geometry_kind.is_vector() && value_field.is_none() {
        return Err(MapError::invalid_config("span", MINMAX_NEEDS_ZFIELD));
    }

    let raster_padding = yaml.raster_padding.unwrap_or(0.0);
    if !raster_padding.is_finite() || raster_padding < 0.0 {
        return Err(MapError::invalid_config(
            "raster_padding",
            format!("padding must be >= 0, got {}", raster_padding),
        ));
    }

    let service_types = match yaml.service_types {
        None => ServiceType::ALL.to_vec(),
        Some(names) => {
            let mut types = Vec::with_capacity(names.len());
            for name in &names {
                let service = ServiceType::parse(name)?;
                if !types.contains(&service) {
                    types.push(service);
                }
            }
            types
        }
    };

    let overviews = yaml
        .overviews
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let (lo, hi) = Overview::default_band(i);
            OverviewSpec {
                levels: o.levels,
                min_zoom: o.min_zoom.unwrap_or(lo),
                max_zoom: o.max_zoom.unwrap_or(hi),
            }
        })
        .collect();

    let default_extent = match yaml.default_extent {
        Some([xmin, ymin, xmax, ymax]) => Extent::checked(xmin, ymin, xmax, ymax)
            .map_err(|e| MapError::invalid_config("default_extent", e.to_string()))?,
        None => DEFAULT_EXTENT,
    };

    let raster_extent = yaml
        .extent
        .map(|[xmin, ymin, xmax, ymax]| Extent::checked(xmin, ymin, xmax, ymax))
        .transpose()
        .map_err(|e| MapError::invalid_config("extent", e.to_string()))?;

    let default_width = yaml.default_width.unwrap_or(DEFAULT_TILE_SIZE);
    let default_height = yaml.default_height.unwrap_or(DEFAULT_TILE_SIZE);
    if default_width == 0 || default_height == 0 {
        return Err(MapError::invalid_config(
            "default_width",
            "default image dimensions must be positive",
        ));
    }

    let filepath = PathBuf::from(&yaml.filepath);
    let filepath = if filepath.is_absolute() {
        filepath
    } else {
        base_dir.join(filepath)
    };

    Ok(SourceDescriptor {
        name: yaml.name.unwrap_or_else(|| key.clone()),
        description: yaml.description.unwrap_or_default(),
        geometry_kind,
        filepath,
        value_field,
        reduction: yaml
            .agg_func
            .as_deref()
            .map(Reduction::parse)
            .transpose()?
            .unwrap_or_default(),
        colormap: parse_colormap(yaml.cmap)?,
        span,
        how: yaml
            .shade_how
            .as_deref()
            .map(ShadeHow::parse)
            .transpose()?
            .unwrap_or_default(),
        spread: yaml.dynspread,
        raster_padding,
        interpolation: yaml
            .raster_interpolate
            .as_deref()
            .map(Interpolation::parse)
            .transpose()?
            .unwrap_or_default(),
        extras: yaml.extras,
        overviews,
        service_types,
        default_extent,
        default_width,
        default_height,
        epsg: yaml.epsg.unwrap_or(WEB_MERCATOR_EPSG),
        raster_extent,
        key,
    })
}

fn parse_span(span: YamlSpan) -> MapResult<SpanPolicy> {
    match span {
        YamlSpan::Policy(s) => match s.trim().to_lowercase().as_str() {
            "min/max" | "minmax" => Ok(SpanPolicy::MinMax),
            "none" | "" => Ok(SpanPolicy::None),
            other => Err(MapError::invalid_config(
                "span",
                format!("unknown span policy '{}'", other),
            )),
        },
        YamlSpan::Range(values) => match values.as_slice() {
            [lo, hi] if lo.is_finite() && hi.is_finite() => Ok(SpanPolicy::Explicit(*lo, *hi)),
            _ => Err(MapError::invalid_config(
                "span",
                format!("expected [lo, hi], got {:?}", values),
            )),
        },
    }
}

fn parse_colormap(cmap: Option<YamlColorMap>) -> MapResult<ColorMap> {
    match cmap {
        None => ColorMap::named(DEFAULT_RAMP),
        Some(YamlColorMap::Name(name)) => ColorMap::named(&name),
        Some(YamlColorMap::List(colors)) => ColorMap::ramp(&colors),
        Some(YamlColorMap::Categories(mapping)) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, color) in mapping {
                let value = category_value(&key)?;
                let color = color.as_str().ok_or_else(|| {
                    MapError::invalid_config(
                        "cmap",
                        format!("colour for category {} must be a string", value),
                    )
                })?;
                entries.push((value, color.to_string()));
            }
            ColorMap::categorical(&entries)
        }
    }
}

/// Category keys may be written as numbers or numeric strings.
fn category_value(key: &serde_yaml::Value) -> MapResult<f64> {
    let value = match key {
        serde_yaml::Value::Number(n) => n.as_f64(),
        serde_yaml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.ok_or_else(|| {
        MapError::invalid_config("cmap", format!("category key {:?} is not numeric", key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::Color;

    fn parse_one(yaml: &str) -> MapResult<SourceDescriptor> {
        parse_config(yaml, Path::new("/data")).map(|mut v| v.remove(0))
    }

    #[test]
    fn test_defaults() {
        let source = parse_one(
            "sources:\n  - key: cities\n    geometry_type: point\n    filepath: cities.geojson\n",
        )
        .unwrap();

        assert_eq!(source.name, "cities");
        assert_eq!(source.filepath, PathBuf::from("/data/cities.geojson"));
        assert_eq!(source.reduction, Reduction::Count);
        assert_eq!(source.colormap, ColorMap::default());
        assert_eq!(source.span, SpanPolicy::None);
        assert_eq!(source.interpolation, Interpolation::Linear);
        assert_eq!(source.service_types, ServiceType::ALL.to_vec());
        assert_eq!(source.default_extent, DEFAULT_EXTENT);
        assert_eq!((source.default_width, source.default_height), (256, 256));
        assert_eq!(source.epsg, 3857);
    }

    #[test]
    fn test_full_source() {
        let source = parse_one(
            r#"
sources:
  - key: parcels
    name: Parcels
    geometry_type: polygon
    filepath: /abs/parcels.geojson
    zfield: value
    agg_func: max
    cmap:
      1: red
      "2": '#00ff00'
    span: [0, 10]
    shade_how: eq_hist
    dynspread: 3
    service_types: [tile, WMS]
"#,
        )
        .unwrap();

        assert_eq!(source.filepath, PathBuf::from("/abs/parcels.geojson"));
        assert_eq!(source.value_field.as_deref(), Some("value"));
        assert_eq!(source.reduction, Reduction::Max);
        assert_eq!(
            source.colormap,
            ColorMap::Categorical(vec![(1.0, Color::rgb(255, 0, 0)), (2.0, Color::rgb(0, 255, 0))])
        );
        assert_eq!(source.span, SpanPolicy::Explicit(0.0, 10.0));
        assert_eq!(source.how, ShadeHow::EqHist);
        assert_eq!(source.spread, Some(3));
        assert_eq!(source.service_types, vec![ServiceType::Tile, ServiceType::Wms]);
    }

    #[test]
    fn test_overview_default_bands() {
        let source = parse_one(
            r#"
sources:
  - key: dem
    geometry_type: raster
    filepath: dem.asc
    overviews:
      - levels: 3
      - levels: 2
      - levels: 1
        min_zoom: 6
        max_zoom: 10
"#,
        )
        .unwrap();

        let bands: Vec<(u32, u32, u32)> = source
            .overviews
            .iter()
            .map(|o| (o.levels, o.min_zoom, o.max_zoom))
            .collect();
        assert_eq!(bands, vec![(3, 0, 3), (2, 3, 6), (1, 6, 10)]);
    }

    #[test]
    fn test_minmax_requires_zfield() {
        let err = parse_one(
            "sources:\n  - key: roads\n    geometry_type: line\n    filepath: r.geojson\n    span: min/max\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains(MINMAX_NEEDS_ZFIELD));

        // Rasters carry their own values.
        assert!(parse_one(
            "sources:\n  - key: dem\n    geometry_type: raster\n    filepath: d.asc\n    span: min/max\n",
        )
        .is_ok());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let base = "sources:\n  - key: dem\n    geometry_type: raster\n    filepath: d.asc\n";

        let err = parse_one(&format!("{}    raster_interpolate: cubic\n", base)).unwrap_err();
        assert!(matches!(err, MapError::InvalidInterpolation(ref m) if m == "cubic"));

        let err = parse_one(&format!("{}    agg_func: median\n", base)).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig { ref field, .. } if field == "agg_func"));

        let err = parse_one(&format!("{}    shade_how: sqrt\n", base)).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig { ref field, .. } if field == "shade_how"));

        let err = parse_one(&format!("{}    cmap: [white, notacolour]\n", base)).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig { ref field, .. } if field == "cmap"));

        let err = parse_one(&format!("{}    span: [1]\n", base)).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig { ref field, .. } if field == "span"));

        let err = parse_one(
            "sources:\n  - key: s\n    geometry_type: hexbin\n    filepath: s.json\n",
        )
        .unwrap_err();
        assert!(matches!(err, MapError::UnsupportedGeometry { .. }));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let yaml = "sources:\n  - key: a\n    geometry_type: point\n    filepath: a\n  - key: a\n    geometry_type: point\n    filepath: b\n";
        assert!(parse_config(yaml, Path::new(".")).is_err());
    }
}
