use std::collections::BTreeMap;
use std::sync::Arc;

use foundation::{ConfigurationError, Coord, Extent, canonical_bits};
use serde::{Deserialize, Serialize};

use crate::layer::{Layer, LayerId, LayerKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrix {
    pub id: String,
    /// Map units per pixel.
    pub resolution: f64,
}

/// Per-zoom resolutions and identifiers for one projection extent.
///
/// Level `z` has resolution `span / (tile_size * 2^z)` where `span` is the
/// longest side of the extent, so resolutions strictly decrease with `z`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMatrixSet {
    pub extent: Extent,
    pub origin: Coord,
    pub tile_size: u32,
    pub matrices: Vec<TileMatrix>,
}

impl TileMatrixSet {
    /// `origin` defaults to the extent's top-left corner.
    pub fn compute(
        extent: Extent,
        tile_size: u32,
        zoom_levels: u32,
        origin: Option<Coord>,
    ) -> Result<Self, ConfigurationError> {
        let extent = extent.ensure_finite()?;
        let span = extent.span();
        if span <= 0.0 {
            return Err(ConfigurationError::DegenerateExtent {
                width: extent.width(),
                height: extent.height(),
            });
        }
        if tile_size == 0 {
            return Err(ConfigurationError::InvalidTileSize(tile_size));
        }
        if zoom_levels == 0 {
            return Err(ConfigurationError::InvalidZoomLevels(zoom_levels));
        }

        let level_zero = span / tile_size as f64;
        let mut matrices = Vec::new();
        let mut coarser = f64::INFINITY;
        for z in 0..zoom_levels {
            let resolution = level_zero / 2f64.powi(z as i32);
            // 2^z overflows at deep levels and collapses the resolution to zero.
            if !(resolution.is_finite() && resolution > 0.0 && resolution < coarser) {
                return Err(ConfigurationError::InvalidZoomLevels(zoom_levels));
            }
            matrices.push(TileMatrix {
                id: z.to_string(),
                resolution,
            });
            coarser = resolution;
        }

        Ok(Self {
            extent,
            origin: origin.unwrap_or_else(|| extent.top_left()),
            tile_size,
            matrices,
        })
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn resolutions(&self) -> Vec<f64> {
        self.matrices.iter().map(|m| m.resolution).collect()
    }

    pub fn matrix_ids(&self) -> Vec<&str> {
        self.matrices.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn resolution(&self, z: u32) -> Option<f64> {
        self.matrices.get(z as usize).map(|m| m.resolution)
    }

    pub fn matrix_id(&self, z: u32) -> Option<&str> {
        self.matrices.get(z as usize).map(|m| m.id.as_str())
    }

    /// Map units covered by one tile edge at level `z`.
    pub fn tile_span(&self, z: u32) -> Option<f64> {
        self.resolution(z).map(|r| r * self.tile_size as f64)
    }

    /// First level at least as fine as `resolution`, or the finest level.
    pub fn zoom_for_resolution(&self, resolution: f64) -> u32 {
        self.matrices
            .iter()
            .position(|m| m.resolution <= resolution)
            .unwrap_or(self.matrices.len().saturating_sub(1)) as u32
    }

    /// Column/row of the tile containing `coord` at level `z`, counted from
    /// the origin rightwards and downwards.
    pub fn tile_coord(&self, z: u32, coord: Coord) -> Option<(u32, u32)> {
        let span = self.tile_span(z)?;
        let col = ((coord[0] - self.origin[0]) / span).floor();
        let row = ((self.origin[1] - coord[1]) / span).floor();
        if !(col.is_finite() && row.is_finite()) || col < 0.0 || row < 0.0 {
            return None;
        }
        let cols = ((self.extent.max[0] - self.origin[0]) / span).ceil();
        let rows = ((self.origin[1] - self.extent.min[1]) / span).ceil();
        if col >= cols || row >= rows {
            return None;
        }
        Some((col as u32, row as u32))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GridKey {
    extent: [u64; 4],
    tile_size: u32,
    zoom_levels: u32,
    origin: Option<[u64; 2]>,
}

/// Memoizes tile matrix sets per distinct input; the result never changes for
/// a given key, so callers share one `Arc`.
#[derive(Debug, Default)]
pub struct TileGridCache {
    grids: BTreeMap<GridKey, Arc<TileMatrixSet>>,
}

impl TileGridCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        extent: Extent,
        tile_size: u32,
        zoom_levels: u32,
        origin: Option<Coord>,
    ) -> Result<Arc<TileMatrixSet>, ConfigurationError> {
        let key = GridKey {
            extent: extent.key_bits(),
            tile_size,
            zoom_levels,
            origin: origin.map(|o| o.map(canonical_bits)),
        };
        if let Some(grid) = self.grids.get(&key) {
            return Ok(Arc::clone(grid));
        }
        let grid = Arc::new(TileMatrixSet::compute(extent, tile_size, zoom_levels, origin)?);
        tracing::debug!(
            tile_size,
            zoom_levels,
            "computed tile matrix set for extent {:?}",
            extent.to_array()
        );
        self.grids.insert(key, Arc::clone(&grid));
        Ok(grid)
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

/// Tiled base layer backed by a tile matrix set.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    id: LayerId,
    pub visible: bool,
    pub grid: Arc<TileMatrixSet>,
    pub min_zoom: u32,
    pub max_zoom: u32,
}

impl RasterLayer {
    pub fn new(id: u64, grid: Arc<TileMatrixSet>) -> Self {
        let max_zoom = grid.len().saturating_sub(1) as u32;
        Self {
            id: LayerId(id),
            visible: true,
            grid,
            min_zoom: 0,
            max_zoom,
        }
    }

    /// Restricts visibility to `[min_zoom, max_zoom]`, clamped to the grid.
    pub fn with_zoom_range(mut self, min_zoom: u32, max_zoom: u32) -> Self {
        let finest = self.grid.len().saturating_sub(1) as u32;
        self.max_zoom = max_zoom.min(finest);
        self.min_zoom = min_zoom.min(self.max_zoom);
        self
    }

    pub fn visible_at(&self, zoom: u32) -> bool {
        self.visible && zoom >= self.min_zoom && zoom <= self.max_zoom
    }
}

impl Layer for RasterLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Base
    }
}
