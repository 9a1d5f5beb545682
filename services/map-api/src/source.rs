//! Source descriptors, their service surfaces and load state.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use aggregation::{Feature, Interpolation, Overview, OverviewSpec, Raster, Reduction};
use map_common::{Extent, GeometryKind, MapError, MapResult, DEFAULT_TILE_SIZE};
use renderer::{ColorMap, ShadeHow, SpanPolicy};

/// Extent advertised by image and WMS services when a source declares none.
pub const DEFAULT_EXTENT: Extent = Extent {
    min_x: -20e6,
    min_y: -20e6,
    max_x: 20e6,
    max_y: 20e6,
};

/// EPSG code of web mercator, the projection everything renders in.
pub const WEB_MERCATOR_EPSG: u32 = 3857;

/// EPSG code of WGS84 lon/lat.
pub const WGS84_EPSG: u32 = 4326;

/// A way of serving a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Tile,
    Image,
    Wms,
    Geojson,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Tile,
        ServiceType::Image,
        ServiceType::Wms,
        ServiceType::Geojson,
    ];

    pub fn parse(s: &str) -> MapResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "tile" => Ok(ServiceType::Tile),
            "image" => Ok(ServiceType::Image),
            "wms" => Ok(ServiceType::Wms),
            "geojson" => Ok(ServiceType::Geojson),
            other => Err(MapError::invalid_config(
                "service_types",
                format!("unknown service type '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Tile => "tile",
            ServiceType::Image => "image",
            ServiceType::Wms => "wms",
            ServiceType::Geojson => "geojson",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to load and render one source. Built from configuration
/// with every enumerated option already parsed.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub key: String,
    pub name: String,
    pub description: String,
    pub geometry_kind: GeometryKind,
    pub filepath: PathBuf,
    /// Attribute reduced per pixel; None means an unweighted count.
    pub value_field: Option<String>,
    pub reduction: Reduction,
    pub colormap: ColorMap,
    pub span: SpanPolicy,
    pub how: ShadeHow,
    /// Maximum dynamic spread radius in pixels.
    pub spread: Option<u32>,
    pub raster_padding: f64,
    pub interpolation: Interpolation,
    /// Transform names applied after aggregation, in order.
    pub extras: Vec<String>,
    pub overviews: Vec<OverviewSpec>,
    pub service_types: Vec<ServiceType>,
    pub default_extent: Extent,
    pub default_width: u32,
    pub default_height: u32,
    /// Projection of the data on disk.
    pub epsg: u32,
    /// Extent of an image raster, which carries no georeferencing itself.
    pub raster_extent: Option<Extent>,
}

impl SourceDescriptor {
    /// A descriptor with default options for everything but the essentials.
    pub fn new(
        key: impl Into<String>,
        geometry_kind: GeometryKind,
        filepath: impl Into<PathBuf>,
    ) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            description: String::new(),
            geometry_kind,
            filepath: filepath.into(),
            value_field: None,
            reduction: Reduction::default(),
            colormap: ColorMap::default(),
            span: SpanPolicy::None,
            how: ShadeHow::default(),
            spread: None,
            raster_padding: 0.0,
            interpolation: Interpolation::default(),
            extras: Vec::new(),
            overviews: Vec::new(),
            service_types: ServiceType::ALL.to_vec(),
            default_extent: DEFAULT_EXTENT,
            default_width: DEFAULT_TILE_SIZE,
            default_height: DEFAULT_TILE_SIZE,
            epsg: WEB_MERCATOR_EPSG,
            raster_extent: None,
        }
    }

    pub fn serves(&self, service: ServiceType) -> bool {
        self.service_types.contains(&service)
    }

    /// The service surfaces this source exposes, in declaration order.
    pub fn services(&self) -> Vec<ServiceInfo> {
        self.service_types
            .iter()
            .map(|&service| ServiceInfo::new(self, service))
            .collect()
    }
}

/// A published service: one source served one way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceInfo {
    /// `{source-key}-{service-type}`
    pub key: String,
    pub name: String,
    pub source_key: String,
    pub service_type: ServiceType,
    /// URL template for map clients.
    pub client_url: String,
    /// A ready-to-fetch URL showing the source's default view.
    pub default_url: String,
}

impl ServiceInfo {
    pub fn new(source: &SourceDescriptor, service_type: ServiceType) -> Self {
        let key = format!("{}-{}", source.key, service_type);
        let [xmin, ymin, xmax, ymax] = source.default_extent.as_array();
        let (width, height) = (source.default_width, source.default_height);

        let (client_url, default_url) = match service_type {
            ServiceType::Tile => (
                format!("/{}/tile/{{z}}/{{x}}/{{y}}", key),
                format!("/{}/tile/0/0/0", key),
            ),
            ServiceType::Image => (
                format!("/{}/image/{{XMIN}}/{{YMIN}}/{{XMAX}}/{{YMAX}}/{{width}}/{{height}}", key),
                format!(
                    "/{}/image/{}/{}/{}/{}/{}/{}",
                    key, xmin, ymin, xmax, ymax, width, height
                ),
            ),
            ServiceType::Wms => (
                format!(
                    "/{}/wms?bbox={{XMIN}},{{YMIN}},{{XMAX}},{{YMAX}}&width={}&height={}",
                    key, width, height
                ),
                format!(
                    "/{}/wms?bbox={},{},{},{}&width={}&height={}",
                    key, xmin, ymin, xmax, ymax, width, height
                ),
            ),
            ServiceType::Geojson => (format!("/{}/geojson", key), format!("/{}/geojson", key)),
        };

        Self {
            name: format!("{} {}", source.name, service_type),
            key,
            source_key: source.key.clone(),
            service_type,
            client_url,
            default_url,
        }
    }
}

/// Data held by a loaded source.
#[derive(Debug, Clone)]
pub enum SourceData {
    /// Features in web mercator.
    Vector(Vec<Feature>),
    /// Base raster plus overviews, in web mercator.
    Raster {
        base: Raster,
        overviews: Vec<Overview>,
    },
}

/// A source whose data is in memory. Read-only once built.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub descriptor: SourceDescriptor,
    pub data: SourceData,
    /// Finite min/max over the whole source: raster values, or the value
    /// field of vector features.
    pub value_range: Option<(f64, f64)>,
}

impl LoadedSource {
    pub fn key(&self) -> &str {
        &self.descriptor.key
    }
}

/// Load state of a configured source.
#[derive(Debug, Clone)]
pub enum SourceState {
    Unloaded(SourceDescriptor),
    Loaded(Arc<LoadedSource>),
}

impl SourceState {
    pub fn key(&self) -> &str {
        match self {
            SourceState::Unloaded(d) => &d.key,
            SourceState::Loaded(s) => s.key(),
        }
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        match self {
            SourceState::Unloaded(d) => d,
            SourceState::Loaded(s) => &s.descriptor,
        }
    }

    /// Read the source's data. Loading an already loaded source is a no-op.
    pub fn load(self) -> MapResult<SourceState> {
        match self {
            SourceState::Unloaded(descriptor) => {
                let loaded = crate::loaders::load_source(descriptor)?;
                Ok(SourceState::Loaded(Arc::new(loaded)))
            }
            loaded @ SourceState::Loaded(_) => Ok(loaded),
        }
    }

    pub fn loaded(&self) -> Option<&Arc<LoadedSource>> {
        match self {
            SourceState::Loaded(s) => Some(s),
            SourceState::Unloaded(_) => None,
        }
    }
}
