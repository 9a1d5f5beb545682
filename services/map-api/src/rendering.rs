//! The render pipeline: resolve, aggregate, transform, shade, spread.

use serde_json::{json, Value};
use tracing::{debug, instrument};

use aggregation::{
    aggregate_geometry, aggregate_raster, apply_transforms, select_raster, Aggregate,
    TransformRegistry,
};
use map_common::{CanvasSpec, ExtentRequest, GeometryKind, MapResult};
use renderer::{dynspread, shade, RenderedImage, SpanPolicy, DYNSPREAD_THRESHOLD};

use crate::geojson::GeoJsonFeatureCollection;
use crate::source::{LoadedSource, SourceData};

/// Render a source over the requested extent at `width` x `height`.
#[instrument(
    skip(source, request, registry),
    fields(source = %source.key(), zoom = ?request.zoom())
)]
pub fn render_map(
    source: &LoadedSource,
    request: &ExtentRequest,
    width: u32,
    height: u32,
    registry: &TransformRegistry,
) -> MapResult<RenderedImage> {
    let descriptor = &source.descriptor;
    let extent = request.resolve()?;
    let canvas = CanvasSpec::for_request(width, height, extent)?;

    let agg = aggregate(source, &canvas, request.zoom())?;
    let agg = apply_transforms(agg, &descriptor.extras, registry)?;

    let span = resolve_span(source);
    debug!(span = ?span, how = ?descriptor.how, "Shading aggregate");
    let image = shade(&agg, &descriptor.colormap, descriptor.how, span)?;
    let image = image.crop_to_canvas(&canvas)?;

    match descriptor.spread {
        Some(px) if px > 0 => Ok(dynspread(image, px, DYNSPREAD_THRESHOLD)),
        _ => Ok(image),
    }
}

fn aggregate(
    source: &LoadedSource,
    canvas: &CanvasSpec,
    zoom: Option<u32>,
) -> MapResult<Aggregate> {
    let descriptor = &source.descriptor;
    match &source.data {
        SourceData::Vector(features) => aggregate_geometry(
            &descriptor.key,
            descriptor.geometry_kind,
            features,
            canvas,
            descriptor.value_field.as_deref(),
            descriptor.reduction,
        ),
        SourceData::Raster { base, overviews } => {
            let raster = select_raster(base, overviews, zoom);
            aggregate_raster(
                &descriptor.key,
                raster,
                canvas,
                descriptor.raster_padding,
                descriptor.interpolation,
            )
        }
    }
}

/// Shading bounds for a source, or None to use the aggregate's own range.
///
/// Raster min/max bounds are widened to whole numbers.
pub fn resolve_span(source: &LoadedSource) -> Option<(f64, f64)> {
    match source.descriptor.span {
        SpanPolicy::None => None,
        SpanPolicy::Explicit(lo, hi) => Some((lo, hi)),
        SpanPolicy::MinMax => match source.descriptor.geometry_kind {
            GeometryKind::Raster => source
                .value_range
                .map(|(lo, hi)| (lo.trunc(), hi.trunc() + 1.0)),
            _ => source.value_range,
        },
    }
}

/// Export a source as JSON: a FeatureCollection for vector sources, a grid
/// description for rasters.
pub fn render_geojson(source: &LoadedSource) -> MapResult<Value> {
    match &source.data {
        SourceData::Vector(features) => {
            Ok(serde_json::to_value(GeoJsonFeatureCollection::from_features(features))?)
        }
        SourceData::Raster { base, .. } => {
            let values: Vec<Value> = base
                .data()
                .iter()
                .map(|&v| if v.is_finite() { json!(v) } else { Value::Null })
                .collect();
            Ok(json!({
                "width": base.width(),
                "height": base.height(),
                "extent": base.extent().as_array(),
                "values": values,
            }))
        }
    }
}
