use foundation::Extent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::{Geometry, GeometryType};

/// Attribute table of a feature.
pub type Properties = Map<String, Value>;

/// A single geometry plus its attribute properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry.geometry_type()
    }

    pub fn extent(&self) -> Extent {
        self.geometry.extent()
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// `properties[column] == target`. A missing column never matches.
    pub fn id_matches(&self, column: &str, target: &Value) -> bool {
        self.property(column).is_some_and(|v| v == target)
    }
}

/// Index of the first feature whose `column` equals `target`.
pub fn find_by_id(features: &[Feature], column: &str, target: &Value) -> Option<usize> {
    features.iter().position(|f| f.id_matches(column, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pt(id: &str) -> Feature {
        Feature::new(Geometry::Point([0.0, 0.0])).with_property("id", id)
    }

    #[test]
    fn finds_first_match_by_column() {
        let fs = vec![pt("001"), pt("002"), pt("002")];
        assert_eq!(find_by_id(&fs, "id", &json!("002")), Some(1));
        assert_eq!(find_by_id(&fs, "id", &json!("999")), None);
        assert_eq!(find_by_id(&fs, "other", &json!("001")), None);
    }

    #[test]
    fn id_comparison_is_type_sensitive() {
        let f = Feature::new(Geometry::Point([0.0, 0.0])).with_property("id", 2);
        assert!(f.id_matches("id", &json!(2)));
        assert!(!f.id_matches("id", &json!("2")));
    }
}
