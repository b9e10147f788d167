use foundation::{ConfigurationError, HexColor, Rgba, check_opacity};
use runtime::MapConfig;
use scene::GeometryType;
use serde::{Deserialize, Serialize};

/// Stroke width added to selected features.
pub const SELECTED_STROKE_BONUS: f64 = 1.0;
pub const SELECTED_FILL_RGB: [u8; 3] = [0xff, 0xcc, 0x00];
pub const SELECTED_STROKE_RGB: [u8; 3] = [0xff, 0x66, 0x00];
pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;
pub const DEFAULT_STROKE_OPACITY: f64 = 1.0;
pub const DEFAULT_POINT_RADIUS: f64 = 10.0;

/// Plain style description as exchanged with callers and style overrides.
///
/// Nothing here is trusted until it passes [`StyleSpec::check`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSpec {
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
}

impl StyleSpec {
    pub fn check(&self) -> Result<CheckedStyle, ConfigurationError> {
        if !(self.stroke_width.is_finite() && self.stroke_width >= 0.0) {
            return Err(ConfigurationError::InvalidOption {
                name: "strokeWidth",
                reason: format!("must be a non-negative number, got {}", self.stroke_width),
            });
        }
        Ok(CheckedStyle {
            fill: Paint::new(&self.fill_color, self.fill_opacity)?,
            stroke: Paint::new(&self.stroke_color, self.stroke_opacity)?,
            stroke_width: self.stroke_width,
        })
    }
}

/// A validated color plus opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub color: HexColor,
    pub opacity: f64,
}

impl Paint {
    pub fn new(color: &str, opacity: f64) -> Result<Self, ConfigurationError> {
        Ok(Self {
            color: HexColor::parse(color)?,
            opacity: check_opacity(opacity)?,
        })
    }

    pub fn rgba(&self) -> Rgba {
        let [r, g, b] = self.color.rgb();
        Rgba {
            r,
            g,
            b,
            a: self.opacity,
        }
    }
}

/// A style whose colors and ranges have been validated.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedStyle {
    pub fill: Paint,
    pub stroke: Paint,
    pub stroke_width: f64,
}

impl CheckedStyle {
    pub fn to_spec(&self) -> StyleSpec {
        StyleSpec {
            fill_color: self.fill.color.to_string(),
            fill_opacity: self.fill.opacity,
            stroke_color: self.stroke.color.to_string(),
            stroke_width: self.stroke_width,
            stroke_opacity: self.stroke.opacity,
        }
    }

    /// Renderable shape for a geometry type.
    pub fn render(&self, geometry_type: GeometryType, point_radius: f64) -> RenderStyle {
        let fill = Fill {
            color: self.fill.rgba(),
        };
        let stroke = Stroke {
            color: self.stroke.rgba(),
            width: self.stroke_width,
        };
        match geometry_type {
            GeometryType::Point | GeometryType::MultiPoint => RenderStyle::Circle {
                radius: point_radius,
                fill,
                stroke,
            },
            GeometryType::LineString | GeometryType::MultiLineString => {
                RenderStyle::Line { stroke }
            }
            GeometryType::Polygon | GeometryType::MultiPolygon => {
                RenderStyle::Area { fill, stroke }
            }
        }
    }
}

/// Fixed colors used for the selected feature.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPalette {
    pub fill: HexColor,
    pub stroke: HexColor,
}

impl SelectedPalette {
    pub fn new(fill: &str, stroke: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            fill: HexColor::parse(fill)?,
            stroke: HexColor::parse(stroke)?,
        })
    }

    /// Selected variant of `base`: palette colors, wider stroke, opacities kept.
    pub fn apply(&self, base: &CheckedStyle) -> CheckedStyle {
        CheckedStyle {
            fill: Paint {
                color: self.fill.clone(),
                opacity: base.fill.opacity,
            },
            stroke: Paint {
                color: self.stroke.clone(),
                opacity: base.stroke.opacity,
            },
            stroke_width: base.stroke_width + SELECTED_STROKE_BONUS,
        }
    }
}

impl Default for SelectedPalette {
    fn default() -> Self {
        Self {
            fill: HexColor::from_rgb(SELECTED_FILL_RGB),
            stroke: HexColor::from_rgb(SELECTED_STROKE_RGB),
        }
    }
}

/// Default appearance of features without (or with a failing) override.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub style: CheckedStyle,
    pub point_radius: f64,
}

impl Theme {
    pub fn new(spec: &StyleSpec, point_radius: f64) -> Result<Self, ConfigurationError> {
        if !(point_radius.is_finite() && point_radius >= 0.0) {
            return Err(ConfigurationError::InvalidOption {
                name: "pointRadius",
                reason: format!("must be a non-negative number, got {point_radius}"),
            });
        }
        Ok(Self {
            style: spec.check()?,
            point_radius,
        })
    }

    pub fn from_config(cfg: &MapConfig) -> Result<Self, ConfigurationError> {
        let spec = StyleSpec {
            fill_color: cfg.default_fill_color.clone(),
            fill_opacity: cfg.default_opacity,
            stroke_color: cfg.default_stroke_color.clone(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            stroke_opacity: DEFAULT_STROKE_OPACITY,
        };
        Self::new(&spec, DEFAULT_POINT_RADIUS)
    }

    pub fn spec(&self) -> StyleSpec {
        self.style.to_spec()
    }

    pub fn default_color(&self) -> &HexColor {
        &self.style.fill.color
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub color: Rgba,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
}

/// Renderer-facing style, shaped by geometry type.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RenderStyle {
    Circle {
        radius: f64,
        fill: Fill,
        stroke: Stroke,
    },
    Line {
        stroke: Stroke,
    },
    Area {
        fill: Fill,
        stroke: Stroke,
    },
}
