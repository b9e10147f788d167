use scene::{Feature, Geometry};
use serde_json::{Map, Value};

#[derive(Debug)]
pub enum GeoJsonError {
    Json(serde_json::Error),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Json(e) => write!(f, "JSON error: {e}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

/// Reads a GeoJSON FeatureCollection.
///
/// A feature-level `id` is copied into `properties` under `"id"` when the
/// properties do not already carry that key, so it can serve as id column.
pub fn features_from_geojson_str(payload: &str) -> Result<Vec<Feature>, GeoJsonError> {
    let value: Value = serde_json::from_str(payload).map_err(GeoJsonError::Json)?;
    features_from_geojson_value(&value)
}

pub fn features_from_geojson_value(value: &Value) -> Result<Vec<Feature>, GeoJsonError> {
    let obj = value.as_object().ok_or(GeoJsonError::NotAFeatureCollection)?;
    if obj.get("type").and_then(|v| v.as_str()) != Some("FeatureCollection") {
        return Err(GeoJsonError::NotAFeatureCollection);
    }
    let features_val = obj
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or(GeoJsonError::NotAFeatureCollection)?;

    let mut features = Vec::with_capacity(features_val.len());
    for (index, feat_val) in features_val.iter().enumerate() {
        let invalid = |reason: String| GeoJsonError::InvalidFeature { index, reason };

        let feat_obj = feat_val
            .as_object()
            .ok_or_else(|| invalid("feature must be an object".to_string()))?;
        match feat_obj.get("type").and_then(|v| v.as_str()) {
            Some("Feature") => {}
            Some(other) => return Err(invalid(format!("unexpected feature type: {other}"))),
            None => return Err(invalid("feature missing type".to_string())),
        }

        let mut properties = match feat_obj.get("properties") {
            Some(Value::Object(m)) => m.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => return Err(invalid("properties must be an object".to_string())),
        };
        if let Some(id) = feat_obj.get("id") {
            properties.entry("id").or_insert_with(|| id.clone());
        }

        let geometry_val = feat_obj
            .get("geometry")
            .filter(|v| !v.is_null())
            .ok_or_else(|| invalid("feature missing geometry".to_string()))?;
        let geometry: Geometry = serde_json::from_value(geometry_val.clone())
            .map_err(|e| invalid(format!("bad geometry: {e}")))?;

        features.push(Feature {
            geometry,
            properties,
        });
    }

    Ok(features)
}

/// Writes a FeatureCollection. JSON has no NaN or infinity, so a feature with
/// a non-finite coordinate is refused rather than written with `null`s.
pub fn features_to_geojson_value(features: &[Feature]) -> Result<Value, GeoJsonError> {
    let mut items = Vec::with_capacity(features.len());
    for (index, f) in features.iter().enumerate() {
        let mut finite = true;
        f.geometry.for_each_coord(|c| finite &= c[0].is_finite() && c[1].is_finite());
        if !finite {
            return Err(GeoJsonError::InvalidFeature {
                index,
                reason: "geometry has a non-finite coordinate".to_string(),
            });
        }
        let geometry = serde_json::to_value(&f.geometry).map_err(GeoJsonError::Json)?;
        items.push(serde_json::json!({
            "type": "Feature",
            "properties": Value::Object(f.properties.clone()),
            "geometry": geometry,
        }));
    }
    Ok(serde_json::json!({ "type": "FeatureCollection", "features": items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::GeometryType;
    use serde_json::json;

    const PARCELS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "001", "properties": {"name": "north"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type": "Feature", "properties": {"id": "002"},
             "geometry": {"type": "LineString", "coordinates": [[0,0],[2,2]]}},
            {"type": "Feature", "id": 7, "properties": null,
             "geometry": {"type": "Point", "coordinates": [3.5, 4.25]}}
        ]
    }"#;

    #[test]
    fn parses_feature_collection() {
        let fs = features_from_geojson_str(PARCELS).expect("parse");
        assert_eq!(fs.len(), 3);
        assert_eq!(fs[0].geometry_type(), GeometryType::Polygon);
        assert_eq!(fs[0].property("id"), Some(&json!("001")));
        assert_eq!(fs[0].property("name"), Some(&json!("north")));
        assert_eq!(fs[1].property("id"), Some(&json!("002")));
        assert_eq!(fs[2].property("id"), Some(&json!(7)));
        assert_eq!(fs[2].geometry, Geometry::Point([3.5, 4.25]));
    }

    #[test]
    fn rejects_non_collections() {
        let err = features_from_geojson_str(r#"{"type": "Feature"}"#).unwrap_err();
        assert!(matches!(err, GeoJsonError::NotAFeatureCollection));
    }

    #[test]
    fn reports_index_of_bad_feature() {
        let payload = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Point", "coordinates": [0, 0]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "GeometryCollection", "coordinates": []}}
        ]}"#;
        match features_from_geojson_str(payload) {
            Err(GeoJsonError::InvalidFeature { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exports_back_to_geojson() {
        let fs = features_from_geojson_str(PARCELS).expect("parse");
        let out = features_to_geojson_value(&fs).expect("export");
        let again = features_from_geojson_value(&out).expect("reparse");
        assert_eq!(again, fs);
    }

    #[test]
    fn export_refuses_non_finite_coordinates() {
        let fs = vec![
            Feature::new(Geometry::Point([0.0, 0.0])),
            Feature::new(Geometry::LineString(vec![[0.0, 0.0], [f64::NAN, 1.0]])),
        ];
        match features_to_geojson_value(&fs) {
            Err(GeoJsonError::InvalidFeature { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected {other:?}"),
        }
    }
}
