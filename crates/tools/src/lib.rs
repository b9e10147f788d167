//! Command implementations behind the `mapkit` binary.
//!
//! Each command returns a JSON value; `main` only parses arguments and prints.

use std::fs;
use std::path::Path;

use camera::{CameraMove, GeometryClass, RecordingCamera, ViewFitPolicy};
use foundation::Extent;
use formats::{features_from_geojson_str, wkt};
use layers::highlight::FeatureHighlighter;
use layers::raster::TileMatrixSet;
use layers::style::StyleResolver;
use layers::symbology::Theme;
use runtime::{Diagnostics, MapConfig};
use scene::Feature;
use serde_json::{Value, json};

pub fn load_config(path: Option<&Path>) -> Result<MapConfig, String> {
    match path {
        Some(p) => MapConfig::load(p).map_err(|e| format!("{}: {e}", p.display())),
        None => Ok(MapConfig::default()),
    }
}

pub fn read_features(path: &Path) -> Result<Vec<Feature>, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    features_from_geojson_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

/// Ids on the command line are JSON when they parse as JSON (`2`, `"2"`),
/// and plain strings otherwise (`002`, `parcel-7`).
pub fn parse_id(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Tile matrix set for `extent`. Zoom levels default to the configured `maxZoom`.
pub fn tile_matrix(
    cfg: &MapConfig,
    extent: [f64; 4],
    tile_size: Option<u32>,
    zoom_levels: Option<u32>,
) -> Result<TileMatrixSet, String> {
    TileMatrixSet::compute(
        Extent::from_array(extent),
        tile_size.unwrap_or(cfg.tile_size),
        zoom_levels.unwrap_or(cfg.max_zoom),
        None,
    )
    .map_err(|e| e.to_string())
}

/// WKT of every feature, in input order.
pub fn encode_wkt(features: &[Feature]) -> Result<Vec<String>, String> {
    features
        .iter()
        .enumerate()
        .map(|(i, f)| wkt::encode(&f.geometry).map_err(|e| format!("feature {i}: {e}")))
        .collect()
}

pub fn decode_wkt(text: &str) -> Result<Value, String> {
    let geometry = wkt::decode(text).map_err(|e| e.to_string())?;
    serde_json::to_value(geometry).map_err(|e| format!("json: {e}"))
}

/// Resolved styles for every feature, optionally with one highlighted.
pub fn styles(
    cfg: &MapConfig,
    features: &[Feature],
    highlight: Option<&Value>,
    diagnostics: &mut Diagnostics,
) -> Result<Value, String> {
    let mut highlighter = highlighter(cfg)?;
    highlighter.paint(features, diagnostics);
    if let Some(target) = highlight {
        highlighter
            .highlight(features, target, diagnostics)
            .map_err(|e| e.to_string())?;
    }
    let rows = highlighter
        .styles()
        .iter()
        .enumerate()
        .map(|(index, style)| {
            json!({
                "index": index,
                "selected": style.selected,
                "style": style.spec,
                "render": style.render,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

/// Highlights the feature with id `target` and plans the camera move to it.
pub fn fit(
    cfg: &MapConfig,
    features: &[Feature],
    target: &Value,
    diagnostics: &mut Diagnostics,
) -> Result<CameraMove, String> {
    let mut highlighter = highlighter(cfg)?;
    let index = highlighter
        .highlight(features, target, diagnostics)
        .map_err(|e| e.to_string())?;
    let feature = &features[index];
    tracing::info!(
        index,
        class = ?GeometryClass::from(feature.geometry_type()),
        "fitting view to feature"
    );
    let mut camera = RecordingCamera::new();
    ViewFitPolicy::from_config(cfg)
        .fit_feature(&mut camera, feature, diagnostics)
        .map_err(|e| e.to_string())
}

fn highlighter(cfg: &MapConfig) -> Result<FeatureHighlighter, String> {
    cfg.validate().map_err(|e| e.to_string())?;
    let theme = Theme::from_config(cfg).map_err(|e| e.to_string())?;
    Ok(FeatureHighlighter::new(
        StyleResolver::new(theme),
        cfg.id_column.clone(),
    ))
}
