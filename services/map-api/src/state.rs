//! Application state and shared resources.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use aggregation::TransformRegistry;
use map_common::{MapError, MapResult};

use crate::config::load_config;
use crate::metrics::MetricsCollector;
use crate::source::{LoadedSource, ServiceInfo, ServiceType, SourceDescriptor, SourceState};

/// Shared application state. Sources are loaded before the server starts and
/// are read-only afterwards.
pub struct AppState {
    sources: BTreeMap<String, Arc<LoadedSource>>,
    /// Declaration order of source keys, for the service index.
    order: Vec<String>,
    pub registry: TransformRegistry,
    pub metrics: Arc<MetricsCollector>,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Load every source declared in a YAML config file.
    pub fn from_config(path: impl AsRef<Path>) -> MapResult<Self> {
        let descriptors = load_config(path)?;
        Self::load(descriptors, TransformRegistry::builtin())
    }

    /// Load the given sources.
    pub fn load(
        descriptors: Vec<SourceDescriptor>,
        registry: TransformRegistry,
    ) -> MapResult<Self> {
        let mut sources = BTreeMap::new();
        let mut order = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let key = descriptor.key.clone();
            let loaded = match SourceState::Unloaded(descriptor).load()? {
                SourceState::Loaded(source) => source,
                SourceState::Unloaded(d) => {
                    return Err(MapError::DataRead(format!("source '{}' did not load", d.key)));
                }
            };
            order.push(key.clone());
            sources.insert(key, loaded);
        }

        info!(sources = sources.len(), "Sources loaded");
        Ok(Self {
            sources,
            order,
            registry,
            metrics: Arc::new(MetricsCollector::new()),
            prometheus: None,
        })
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn source(&self, key: &str) -> Option<&Arc<LoadedSource>> {
        self.sources.get(key)
    }

    /// Find the source behind a request path key.
    ///
    /// The key may be a service key (`{source}-{type}`) or a plain source
    /// key. Fails when the source is unknown or does not enable `service`.
    pub fn service_source(
        &self,
        path_key: &str,
        service: ServiceType,
    ) -> MapResult<Arc<LoadedSource>> {
        let suffix = format!("-{}", service);
        let source = path_key
            .strip_suffix(&suffix)
            .and_then(|key| self.sources.get(key))
            .or_else(|| self.sources.get(path_key))
            .ok_or_else(|| MapError::SourceNotFound(path_key.to_string()))?;

        if !source.descriptor.serves(service) {
            return Err(MapError::ServiceNotAvailable {
                source_key: source.key().to_string(),
                service: service.to_string(),
            });
        }
        Ok(Arc::clone(source))
    }

    /// Every published service, sources in declaration order.
    pub fn services(&self) -> Vec<ServiceInfo> {
        self.order
            .iter()
            .filter_map(|key| self.sources.get(key))
            .flat_map(|source| source.descriptor.services())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceData;
    use map_common::GeometryKind;

    fn state() -> AppState {
        let mut points = SourceDescriptor::new("points", GeometryKind::Point, "points.geojson");
        points.service_types = vec![ServiceType::Tile, ServiceType::Geojson];
        let loaded = LoadedSource {
            descriptor: points,
            data: SourceData::Vector(Vec::new()),
            value_range: None,
        };

        let mut sources = BTreeMap::new();
        sources.insert("points".to_string(), Arc::new(loaded));
        AppState {
            sources,
            order: vec!["points".to_string()],
            registry: TransformRegistry::builtin(),
            metrics: Arc::new(MetricsCollector::new()),
            prometheus: None,
        }
    }

    #[test]
    fn test_service_source_key_forms() {
        let state = state();
        assert_eq!(state.service_source("points-tile", ServiceType::Tile).unwrap().key(), "points");
        assert_eq!(state.service_source("points", ServiceType::Tile).unwrap().key(), "points");
    }

    #[test]
    fn test_service_source_errors() {
        let state = state();
        assert!(matches!(
            state.service_source("roads-tile", ServiceType::Tile),
            Err(MapError::SourceNotFound(_))
        ));
        assert!(matches!(
            state.service_source("points-wms", ServiceType::Wms),
            Err(MapError::ServiceNotAvailable { .. })
        ));
    }

    #[test]
    fn test_services_listing() {
        let keys: Vec<String> = state().services().into_iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["points-tile", "points-geojson"]);
    }
}
