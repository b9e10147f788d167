use std::panic::{AssertUnwindSafe, catch_unwind};

use foundation::{ConfigurationError, HexColor};
use scene::{Feature, Properties};

use crate::symbology::{CheckedStyle, RenderStyle, SelectedPalette, StyleSpec, Theme};

pub type OverrideResult = Result<StyleSpec, Box<dyn std::error::Error + Send + Sync>>;

/// Caller-supplied per-feature style callback: `(properties, default color) -> spec`.
pub type StyleOverrideFn = dyn Fn(&Properties, &HexColor) -> OverrideResult;

/// Why a feature fell back to the theme.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    OverrideFailed(String),
    OverridePanicked(String),
    InvalidOverride(ConfigurationError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::OverrideFailed(msg) => write!(f, "style override failed: {msg}"),
            RenderError::OverridePanicked(msg) => write!(f, "style override panicked: {msg}"),
            RenderError::InvalidOverride(e) => {
                write!(f, "style override returned an invalid style: {e}")
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Outcome of one style resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub spec: StyleSpec,
    pub render: RenderStyle,
    pub selected: bool,
    /// Set when the override was discarded in favour of the theme.
    pub error: Option<RenderError>,
}

/// Turns a feature into a concrete style.
///
/// The override (if any) runs first. A failing or invalid override is replaced
/// by the theme; the selected palette is applied afterwards, so selection
/// always wins over whatever the override produced.
pub struct StyleResolver {
    theme: Theme,
    palette: SelectedPalette,
    style_override: Option<Box<StyleOverrideFn>>,
}

impl std::fmt::Debug for StyleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleResolver")
            .field("theme", &self.theme)
            .field("palette", &self.palette)
            .field("style_override", &self.style_override.is_some())
            .finish()
    }
}

impl StyleResolver {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            palette: SelectedPalette::default(),
            style_override: None,
        }
    }

    pub fn with_palette(mut self, palette: SelectedPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_override<F>(mut self, f: F) -> Self
    where
        F: Fn(&Properties, &HexColor) -> OverrideResult + 'static,
    {
        self.style_override = Some(Box::new(f));
        self
    }

    pub fn set_override(&mut self, f: Option<Box<StyleOverrideFn>>) {
        self.style_override = f;
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn resolve(&self, feature: &Feature, selected: bool) -> ResolvedStyle {
        let (base, error) = match self.base_style(&feature.properties) {
            Ok(style) => (style, None),
            Err(e) => {
                tracing::debug!("{e}; using default theme");
                (self.theme.style.clone(), Some(e))
            }
        };
        let style = if selected {
            self.palette.apply(&base)
        } else {
            base
        };
        ResolvedStyle {
            spec: style.to_spec(),
            render: style.render(feature.geometry_type(), self.theme.point_radius),
            selected,
            error,
        }
    }

    fn base_style(&self, properties: &Properties) -> Result<CheckedStyle, RenderError> {
        let Some(f) = &self.style_override else {
            return Ok(self.theme.style.clone());
        };
        let default_color = self.theme.default_color();
        let outcome = catch_unwind(AssertUnwindSafe(|| f(properties, default_color)))
            .map_err(|payload| RenderError::OverridePanicked(panic_message(payload.as_ref())))?;
        let spec = outcome.map_err(|e| RenderError::OverrideFailed(e.to_string()))?;
        spec.check().map_err(RenderError::InvalidOverride)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
