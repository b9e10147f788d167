use foundation::{Coord, Extent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }
}

impl std::fmt::Display for GeometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vector geometry in map coordinates.
///
/// Serializes in the GeoJSON geometry shape:
/// `{"type": "Polygon", "coordinates": [[[x, y], ...]]}`.
/// Polygon rings are stored as given; the first ring is the exterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

impl Geometry {
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// Visits every vertex in storage order.
    pub fn for_each_coord(&self, mut f: impl FnMut(Coord)) {
        match self {
            Geometry::Point(c) => f(*c),
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.iter().for_each(|c| f(*c)),
            Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => rings
                .iter()
                .flat_map(|r| r.iter())
                .for_each(|c| f(*c)),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flat_map(|p| p.iter())
                .flat_map(|r| r.iter())
                .for_each(|c| f(*c)),
        }
    }

    pub fn vertex_count(&self) -> usize {
        let mut n = 0;
        self.for_each_coord(|_| n += 1);
        n
    }

    /// Bounding extent; empty (non-finite) when the geometry has no vertices.
    pub fn extent(&self) -> Extent {
        let mut out = Extent::empty();
        self.for_each_coord(|c| out.extend(c));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extent_covers_all_parts() {
        let g = Geometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            vec![vec![[5.0, 5.0], [6.0, 5.0], [6.0, 7.0], [5.0, 5.0]]],
        ]);
        assert_eq!(g.extent().to_array(), [0.0, 0.0, 6.0, 7.0]);
        assert_eq!(g.vertex_count(), 8);
        assert_eq!(g.geometry_type(), GeometryType::MultiPolygon);
    }

    #[test]
    fn empty_geometry_has_non_finite_extent() {
        let g = Geometry::LineString(Vec::new());
        assert!(!g.extent().is_finite());
    }

    #[test]
    fn serializes_as_geojson_geometry() {
        let g = Geometry::Point([1.5, -2.0]);
        let json = serde_json::to_value(&g).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "Point", "coordinates": [1.5, -2.0]})
        );
        let back: Geometry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, g);
    }
}
