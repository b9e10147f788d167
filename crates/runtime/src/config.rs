use std::path::Path;

use foundation::{ConfigurationError, HexColor, check_opacity};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TILE_SIZE: u32 = 256;
pub const DEFAULT_MAX_ZOOM: u32 = 21;
pub const DEFAULT_MIN_ZOOM: u32 = 1;
pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 1000;
pub const DEFAULT_FILL_COLOR: &str = "#3388ff";
pub const DEFAULT_STROKE_COLOR: &str = "#3388ff";
pub const DEFAULT_OPACITY: f64 = 0.2;
pub const DEFAULT_ID_COLUMN: &str = "id";
pub const DEFAULT_MATRIX_SET_ID: &str = "EPSG:3857";
pub const DEFAULT_FIT_PADDING_PX: f64 = 50.0;
/// Deepest `maxZoom` accepted; tile grids are built with `maxZoom` levels.
pub const MAX_ZOOM_LIMIT: u32 = 42;

/// Recognized map options. Anything else in the JSON is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MapConfig {
    pub tile_size: u32,
    pub matrix_set_id: String,
    pub max_zoom: u32,
    pub min_zoom: u32,
    pub animation_duration_ms: u64,
    pub default_fill_color: String,
    pub default_stroke_color: String,
    pub default_opacity: f64,
    pub id_column: String,
    pub fit_padding_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            matrix_set_id: DEFAULT_MATRIX_SET_ID.to_string(),
            max_zoom: DEFAULT_MAX_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            default_fill_color: DEFAULT_FILL_COLOR.to_string(),
            default_stroke_color: DEFAULT_STROKE_COLOR.to_string(),
            default_opacity: DEFAULT_OPACITY,
            id_column: DEFAULT_ID_COLUMN.to_string(),
            fit_padding_px: DEFAULT_FIT_PADDING_PX,
        }
    }
}

#[derive(Debug)]
pub enum ConfigLoadError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(ConfigurationError),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigLoadError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigLoadError::Invalid(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl MapConfig {
    /// Parses and validates a JSON document. Missing keys take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigLoadError> {
        let cfg: MapConfig = serde_json::from_str(s).map_err(ConfigLoadError::Parse)?;
        cfg.validate().map_err(ConfigLoadError::Invalid)?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigLoadError::Io)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.tile_size == 0 {
            return Err(ConfigurationError::InvalidTileSize(self.tile_size));
        }
        if self.max_zoom < 1 || self.max_zoom > MAX_ZOOM_LIMIT {
            return Err(ConfigurationError::InvalidZoomLevels(self.max_zoom));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigurationError::InvalidOption {
                name: "minZoom",
                reason: format!("{} exceeds maxZoom {}", self.min_zoom, self.max_zoom),
            });
        }
        if self.matrix_set_id.trim().is_empty() {
            return Err(ConfigurationError::InvalidOption {
                name: "matrixSetId",
                reason: "must not be empty".to_string(),
            });
        }
        if self.id_column.trim().is_empty() {
            return Err(ConfigurationError::InvalidOption {
                name: "idColumn",
                reason: "must not be empty".to_string(),
            });
        }
        if !(self.fit_padding_px.is_finite() && self.fit_padding_px >= 0.0) {
            return Err(ConfigurationError::InvalidOption {
                name: "fitPaddingPx",
                reason: format!("must be a non-negative number, got {}", self.fit_padding_px),
            });
        }
        HexColor::parse(&self.default_fill_color)?;
        HexColor::parse(&self.default_stroke_color)?;
        check_opacity(self.default_opacity)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = MapConfig::from_json_str("{}").expect("defaults are valid");
        assert_eq!(cfg, MapConfig::default());
        assert_eq!(cfg.tile_size, 256);
        assert_eq!(cfg.max_zoom, 21);
        assert_eq!(cfg.min_zoom, 1);
        assert_eq!(cfg.animation_duration_ms, 1000);
        assert_eq!(cfg.default_fill_color, "#3388ff");
        assert_eq!(cfg.default_opacity, 0.2);
    }

    #[test]
    fn reads_camel_case_keys() {
        let cfg = MapConfig::from_json_str(
            r#"{"tileSize": 512, "maxZoom": 18, "idColumn": "row_id", "defaultOpacity": 0.5}"#,
        )
        .expect("valid");
        assert_eq!(cfg.tile_size, 512);
        assert_eq!(cfg.max_zoom, 18);
        assert_eq!(cfg.id_column, "row_id");
        assert_eq!(cfg.default_opacity, 0.5);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = MapConfig::from_json_str(r#"{"token": "secret"}"#).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse(_)));
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            (r#"{"tileSize": 0}"#, ConfigurationError::InvalidTileSize(0)),
            (
                r#"{"defaultFillColor": "blue"}"#,
                ConfigurationError::InvalidColor("blue".to_string()),
            ),
            (
                r#"{"defaultOpacity": 1.2}"#,
                ConfigurationError::InvalidOpacity(1.2),
            ),
            (r#"{"maxZoom": 0, "minZoom": 0}"#, ConfigurationError::InvalidZoomLevels(0)),
            (r#"{"maxZoom": 1100}"#, ConfigurationError::InvalidZoomLevels(1100)),
        ];
        for (json, expected) in cases {
            match MapConfig::from_json_str(json) {
                Err(ConfigLoadError::Invalid(e)) => assert_eq!(e, expected, "{json}"),
                other => panic!("{json}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn deepest_accepted_max_zoom() {
        let at_limit = MapConfig {
            max_zoom: MAX_ZOOM_LIMIT,
            ..MapConfig::default()
        };
        assert_eq!(at_limit.validate(), Ok(()));
        let beyond = MapConfig {
            max_zoom: MAX_ZOOM_LIMIT + 1,
            ..MapConfig::default()
        };
        assert_eq!(
            beyond.validate(),
            Err(ConfigurationError::InvalidZoomLevels(MAX_ZOOM_LIMIT + 1))
        );
    }

    #[test]
    fn min_zoom_above_max_is_invalid() {
        let err = MapConfig::from_json_str(r#"{"minZoom": 5, "maxZoom": 4}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid(ConfigurationError::InvalidOption { name: "minZoom", .. })
        ));
    }
}
