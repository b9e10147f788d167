use std::sync::Arc;

use foundation::{ConfigurationError, Extent};
use layers::raster::{RasterLayer, TileGridCache, TileMatrixSet};
use layers::{Layer, LayerId};
use runtime::{DiagnosticKind, Diagnostics, Generation, GenerationCounter, MapConfig};
use serde::{Deserialize, Serialize};

pub const TILE_MATRIX: &str = "{TileMatrix}";
pub const TILE_COL: &str = "{TileCol}";
pub const TILE_ROW: &str = "{TileRow}";
pub const TILE_MATRIX_SET: &str = "{TileMatrixSet}";

pub const FALLBACK_ID: &str = "osm";
pub const FALLBACK_NAME: &str = "OpenStreetMap";
pub const FALLBACK_URL: &str =
    "https://tile.openstreetmap.org/{TileMatrix}/{TileCol}/{TileRow}.png";

/// One base layer as advertised by a capabilities service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseLayerDescriptor {
    pub id: String,
    pub name: String,
    /// Tile URL template; see [`UrlTemplate`].
    pub url: String,
}

impl BaseLayerDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_ID, FALLBACK_NAME, FALLBACK_URL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    Fetch { url: String, reason: String },
    MalformedResponse(String),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::Fetch { url, reason } => write!(f, "fetching {url} failed: {reason}"),
            NetworkError::MalformedResponse(msg) => {
                write!(f, "base layer list is malformed: {msg}")
            }
        }
    }
}

impl std::error::Error for NetworkError {}

/// Decodes a JSON array of descriptors as returned by a capabilities endpoint.
pub fn parse_descriptors(body: &str) -> Result<Vec<BaseLayerDescriptor>, NetworkError> {
    serde_json::from_str(body).map_err(|e| NetworkError::MalformedResponse(e.to_string()))
}

/// A tile URL with `{TileMatrix}`, `{TileCol}` and `{TileRow}` placeholders and
/// an optional `{TileMatrixSet}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, ConfigurationError> {
        for placeholder in [TILE_MATRIX, TILE_COL, TILE_ROW] {
            if !template.contains(placeholder) {
                return Err(ConfigurationError::MissingPlaceholder {
                    template: template.to_string(),
                    placeholder,
                });
            }
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn format(&self, matrix_set: &str, matrix_id: &str, col: u32, row: u32) -> String {
        self.template
            .replace(TILE_MATRIX_SET, matrix_set)
            .replace(TILE_MATRIX, matrix_id)
            .replace(TILE_COL, &col.to_string())
            .replace(TILE_ROW, &row.to_string())
    }
}

/// A raster layer whose tiles are addressed through a URL template.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseLayer {
    pub descriptor: BaseLayerDescriptor,
    pub template: UrlTemplate,
    pub matrix_set_id: String,
    pub raster: RasterLayer,
}

impl BaseLayer {
    /// Fails without building anything when the template is unusable.
    pub fn build(
        id: LayerId,
        descriptor: BaseLayerDescriptor,
        matrix_set_id: &str,
        grid: Arc<TileMatrixSet>,
        zoom_range: (u32, u32),
    ) -> Result<Self, ConfigurationError> {
        let template = UrlTemplate::parse(&descriptor.url)?;
        let raster = RasterLayer::new(id.0, grid).with_zoom_range(zoom_range.0, zoom_range.1);
        Ok(Self {
            descriptor,
            template,
            matrix_set_id: matrix_set_id.to_string(),
            raster,
        })
    }

    pub fn id(&self) -> LayerId {
        self.raster.id()
    }

    /// URL of tile `(col, row)` at level `z`, or `None` outside the visible zoom range.
    pub fn tile_url(&self, z: u32, col: u32, row: u32) -> Option<String> {
        if !self.raster.visible_at(z) {
            return None;
        }
        let matrix_id = self.raster.grid.matrix_id(z)?;
        Some(self.template.format(&self.matrix_set_id, matrix_id, col, row))
    }
}

/// Anything that can list base layers. Fetching happens outside the registry.
pub trait BaseLayerSource {
    fn fetch(&self) -> Result<Vec<BaseLayerDescriptor>, NetworkError>;
}

/// How a refresh completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A newer refresh had started; the result was dropped.
    Stale,
    Installed { layers: usize, skipped: usize },
    Fallback,
}

/// Holds the current base layers.
///
/// Every refresh is tagged with a generation; a completion whose generation is
/// no longer current is discarded, so a slow old response never replaces a
/// newer one.
#[derive(Debug)]
pub struct BaseLayerRegistry {
    grid: Arc<TileMatrixSet>,
    matrix_set_id: String,
    zoom_range: (u32, u32),
    generations: GenerationCounter,
    next_layer_id: u64,
    layers: Vec<BaseLayer>,
    active: Option<usize>,
    notice: Option<String>,
}

impl BaseLayerRegistry {
    pub fn new(grid: Arc<TileMatrixSet>, matrix_set_id: impl Into<String>) -> Self {
        let finest = grid.len().saturating_sub(1) as u32;
        Self {
            grid,
            matrix_set_id: matrix_set_id.into(),
            zoom_range: (0, finest),
            generations: GenerationCounter::new(),
            next_layer_id: 1,
            layers: Vec::new(),
            active: None,
            notice: None,
        }
    }

    /// Registry for the projection `extent` laid out by `cfg`: one grid level
    /// per `maxZoom`, layers visible from `minZoom`, tiles addressed under
    /// `matrixSetId`. Grids are shared through `cache`.
    pub fn from_config(
        extent: Extent,
        cfg: &MapConfig,
        cache: &mut TileGridCache,
    ) -> Result<Self, ConfigurationError> {
        cfg.validate()?;
        let grid = cache.get_or_compute(extent, cfg.tile_size, cfg.max_zoom, None)?;
        Ok(Self::new(grid, cfg.matrix_set_id.clone()).with_zoom_range(cfg.min_zoom, cfg.max_zoom))
    }

    pub fn with_zoom_range(mut self, min_zoom: u32, max_zoom: u32) -> Self {
        self.zoom_range = (min_zoom, max_zoom);
        self
    }

    pub fn grid(&self) -> &Arc<TileMatrixSet> {
        &self.grid
    }

    pub fn layers(&self) -> &[BaseLayer] {
        &self.layers
    }

    pub fn active(&self) -> Option<&BaseLayer> {
        self.active.and_then(|i| self.layers.get(i))
    }

    /// Makes the layer with descriptor id `id` the active one.
    pub fn select(&mut self, id: &str) -> bool {
        match self.layers.iter().position(|l| l.descriptor.id == id) {
            Some(i) => {
                self.active = Some(i);
                true
            }
            None => false,
        }
    }

    /// User-visible message left by the last failed refresh.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn begin_refresh(&mut self) -> Generation {
        self.generations.begin()
    }

    /// Drops any in-flight refresh.
    pub fn cancel_refresh(&mut self) {
        self.generations.cancel();
    }

    pub fn complete(
        &mut self,
        generation: Generation,
        result: Result<Vec<BaseLayerDescriptor>, NetworkError>,
        diagnostics: &mut Diagnostics,
    ) -> RefreshOutcome {
        if !self.generations.is_current(generation) {
            tracing::debug!(generation = generation.0, "discarding stale base layer list");
            return RefreshOutcome::Stale;
        }
        let descriptors = match result {
            Ok(descriptors) => descriptors,
            Err(e) => {
                diagnostics.record(DiagnosticKind::Network, e.to_string());
                return self.install_fallback(format!(
                    "Base layers could not be loaded ({e}); showing {FALLBACK_NAME}."
                ));
            }
        };

        let mut built = Vec::with_capacity(descriptors.len());
        let mut skipped = 0;
        for descriptor in descriptors {
            let id = self.allocate_id();
            match BaseLayer::build(
                id,
                descriptor.clone(),
                &self.matrix_set_id,
                Arc::clone(&self.grid),
                self.zoom_range,
            ) {
                Ok(layer) => built.push(layer),
                Err(e) => {
                    skipped += 1;
                    diagnostics.record(
                        DiagnosticKind::Configuration,
                        format!("base layer {:?} skipped: {e}", descriptor.id),
                    );
                }
            }
        }
        if built.is_empty() {
            return self.install_fallback(format!(
                "No usable base layers were advertised; showing {FALLBACK_NAME}."
            ));
        }

        let previous = self.active().map(|l| l.descriptor.id.clone());
        self.layers = built;
        self.active = Some(
            previous
                .and_then(|id| self.layers.iter().position(|l| l.descriptor.id == id))
                .unwrap_or(0),
        );
        self.notice = None;
        tracing::info!(layers = self.layers.len(), skipped, "installed base layers");
        RefreshOutcome::Installed {
            layers: self.layers.len(),
            skipped,
        }
    }

    /// Runs a full refresh against `source` in one step.
    pub fn refresh<S: BaseLayerSource + ?Sized>(
        &mut self,
        source: &S,
        diagnostics: &mut Diagnostics,
    ) -> RefreshOutcome {
        let generation = self.begin_refresh();
        let result = source.fetch();
        self.complete(generation, result, diagnostics)
    }

    fn install_fallback(&mut self, notice: String) -> RefreshOutcome {
        let id = self.allocate_id();
        match BaseLayer::build(
            id,
            BaseLayerDescriptor::fallback(),
            &self.matrix_set_id,
            Arc::clone(&self.grid),
            self.zoom_range,
        ) {
            Ok(layer) => {
                self.layers = vec![layer];
                self.active = Some(0);
            }
            Err(e) => tracing::error!("fallback base layer is unusable: {e}"),
        }
        tracing::warn!("{notice}");
        self.notice = Some(notice);
        RefreshOutcome::Fallback
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WMTS: &str =
        "https://tiles.example.org/wmts/{TileMatrixSet}/{TileMatrix}/{TileRow}/{TileCol}.png";

    fn grid() -> Arc<TileMatrixSet> {
        let extent = Extent::from_array([-180.0, -90.0, 180.0, 90.0]);
        Arc::new(TileMatrixSet::compute(extent, 256, 4, None).expect("grid"))
    }

    fn registry() -> BaseLayerRegistry {
        BaseLayerRegistry::new(grid(), "EPSG:4326")
    }

    fn topo() -> BaseLayerDescriptor {
        BaseLayerDescriptor::new("topo", "Topographic", WMTS)
    }

    struct Offline;

    impl BaseLayerSource for Offline {
        fn fetch(&self) -> Result<Vec<BaseLayerDescriptor>, NetworkError> {
            Err(NetworkError::Fetch {
                url: "https://tiles.example.org/capabilities".to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    #[test]
    fn registry_follows_map_config() {
        let world = Extent::from_array([-180.0, -90.0, 180.0, 90.0]);
        let cfg = MapConfig {
            tile_size: 512,
            min_zoom: 2,
            max_zoom: 4,
            matrix_set_id: "WorldCRS84Quad".to_string(),
            ..MapConfig::default()
        };
        let mut cache = TileGridCache::new();
        let mut reg = BaseLayerRegistry::from_config(world, &cfg, &mut cache).expect("registry");
        assert_eq!(reg.grid().tile_size, 512);
        assert_eq!(reg.grid().resolutions(), vec![0.703125, 0.3515625, 0.17578125, 0.087890625]);

        let mut diag = Diagnostics::new();
        let g = reg.begin_refresh();
        reg.complete(g, Ok(vec![topo()]), &mut diag);
        let Some(layer) = reg.active() else {
            panic!("topo installed");
        };
        assert_eq!(layer.tile_url(1, 0, 0), None);
        assert_eq!(
            layer.tile_url(3, 4, 1).as_deref(),
            Some("https://tiles.example.org/wmts/WorldCRS84Quad/3/1/4.png")
        );

        let again = BaseLayerRegistry::from_config(world, &cfg, &mut cache).expect("registry");
        assert!(Arc::ptr_eq(reg.grid(), again.grid()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn registry_rejects_invalid_config() {
        let world = Extent::from_array([-180.0, -90.0, 180.0, 90.0]);
        let mut cache = TileGridCache::new();
        let too_deep = MapConfig {
            max_zoom: 1100,
            ..MapConfig::default()
        };
        assert_eq!(
            BaseLayerRegistry::from_config(world, &too_deep, &mut cache).map(|_| ()),
            Err(ConfigurationError::InvalidZoomLevels(1100))
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn template_requires_tile_placeholders() {
        assert_eq!(
            UrlTemplate::parse("https://x/{TileMatrix}/{TileCol}.png"),
            Err(ConfigurationError::MissingPlaceholder {
                template: "https://x/{TileMatrix}/{TileCol}.png".to_string(),
                placeholder: TILE_ROW,
            })
        );
        let t = UrlTemplate::parse(WMTS).expect("template");
        assert_eq!(
            t.format("EPSG:4326", "3", 5, 2),
            "https://tiles.example.org/wmts/EPSG:4326/3/2/5.png"
        );
    }

    #[test]
    fn base_layer_urls_respect_zoom_range() {
        let layer =
            BaseLayer::build(LayerId(1), topo(), "EPSG:4326", grid(), (1, 2)).expect("layer");
        assert_eq!(layer.tile_url(0, 0, 0), None);
        assert_eq!(
            layer.tile_url(2, 1, 0).as_deref(),
            Some("https://tiles.example.org/wmts/EPSG:4326/2/0/1.png")
        );
        assert_eq!(layer.tile_url(3, 0, 0), None);
    }

    #[test]
    fn bad_template_builds_nothing() {
        let bad = BaseLayerDescriptor::new("bad", "Bad", "https://x/{z}/{x}/{y}.png");
        assert!(matches!(
            BaseLayer::build(LayerId(1), bad, "EPSG:4326", grid(), (0, 3)),
            Err(ConfigurationError::MissingPlaceholder { .. })
        ));
    }

    #[test]
    fn installs_valid_layers_and_skips_bad_ones() {
        let mut reg = registry();
        let mut diag = Diagnostics::new();
        let generation = reg.begin_refresh();
        let list = vec![
            topo(),
            BaseLayerDescriptor::new("bad", "Bad", "https://x/{z}/{x}/{y}.png"),
        ];
        assert_eq!(
            reg.complete(generation, Ok(list), &mut diag),
            RefreshOutcome::Installed {
                layers: 1,
                skipped: 1
            }
        );
        assert_eq!(reg.active().map(|l| l.descriptor.id.as_str()), Some("topo"));
        assert_eq!(diag.count(DiagnosticKind::Configuration), 1);
        assert_eq!(reg.notice(), None);
    }

    #[test]
    fn stale_completion_never_replaces_newer() {
        let mut reg = registry();
        let mut diag = Diagnostics::new();
        let old = reg.begin_refresh();
        let new = reg.begin_refresh();
        assert!(matches!(
            reg.complete(new, Ok(vec![topo()]), &mut diag),
            RefreshOutcome::Installed { .. }
        ));
        let older_list = vec![BaseLayerDescriptor::new("old", "Old", WMTS)];
        assert_eq!(
            reg.complete(old, Ok(older_list), &mut diag),
            RefreshOutcome::Stale
        );
        assert_eq!(reg.layers().len(), 1);
        assert_eq!(reg.layers()[0].descriptor.id, "topo");
    }

    #[test]
    fn network_failure_installs_fallback_with_notice() {
        let mut reg = registry();
        let mut diag = Diagnostics::new();
        assert_eq!(reg.refresh(&Offline, &mut diag), RefreshOutcome::Fallback);
        assert_eq!(reg.active().map(|l| l.descriptor.id.as_str()), Some(FALLBACK_ID));
        assert!(reg.notice().is_some_and(|n| n.contains("connection refused")));
        assert_eq!(diag.count(DiagnosticKind::Network), 1);

        reg.dismiss_notice();
        assert_eq!(reg.notice(), None);
    }

    #[test]
    fn empty_list_falls_back() {
        let mut reg = registry();
        let mut diag = Diagnostics::new();
        let generation = reg.begin_refresh();
        assert_eq!(
            reg.complete(generation, Ok(Vec::new()), &mut diag),
            RefreshOutcome::Fallback
        );
        assert_eq!(reg.layers().len(), 1);
    }

    #[test]
    fn refresh_keeps_the_previous_active_layer() {
        let mut reg = registry();
        let mut diag = Diagnostics::new();
        let street = BaseLayerDescriptor::new("street", "Street", WMTS);
        let g = reg.begin_refresh();
        reg.complete(g, Ok(vec![topo(), street.clone()]), &mut diag);
        assert!(reg.select("street"));
        assert!(!reg.select("missing"));

        let g = reg.begin_refresh();
        reg.complete(g, Ok(vec![street, topo()]), &mut diag);
        assert_eq!(reg.active().map(|l| l.descriptor.id.as_str()), Some("street"));
    }

    #[test]
    fn cancelled_refresh_is_discarded() {
        let mut reg = registry();
        let mut diag = Diagnostics::new();
        let g = reg.begin_refresh();
        reg.cancel_refresh();
        assert_eq!(reg.complete(g, Ok(vec![topo()]), &mut diag), RefreshOutcome::Stale);
        assert!(reg.layers().is_empty());
    }

    #[test]
    fn parses_descriptor_lists() {
        let body = r#"[{"id":"topo","name":"Topographic",
            "url":"https://t/{TileMatrix}/{TileCol}/{TileRow}"}]"#;
        let list = parse_descriptors(body).expect("list");
        assert_eq!(list[0].name, "Topographic");
        assert!(matches!(
            parse_descriptors("{\"id\": 1}"),
            Err(NetworkError::MalformedResponse(_))
        ));
    }
}
