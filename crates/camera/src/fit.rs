use foundation::{ConfigurationError, Extent};
use runtime::{DiagnosticKind, Diagnostics, MapConfig};
use scene::{Feature, GeometryType};
use serde::{Deserialize, Serialize};

use crate::host::{AnimateOptions, CameraHost, CameraMove, FitOptions};

pub const POINT_ZOOM: u32 = 17;
pub const LINE_MAX_ZOOM: u32 = 14;
pub const POLYGON_MAX_ZOOM: u32 = 16;

/// Coarse geometry grouping that decides how the camera frames a feature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryClass {
    Point,
    Line,
    Polygon,
    Other,
}

impl From<GeometryType> for GeometryClass {
    fn from(t: GeometryType) -> Self {
        match t {
            GeometryType::Point => GeometryClass::Point,
            GeometryType::LineString | GeometryType::MultiLineString => GeometryClass::Line,
            GeometryType::Polygon | GeometryType::MultiPolygon => GeometryClass::Polygon,
            // Several points have no single center to fly to.
            GeometryType::MultiPoint => GeometryClass::Other,
        }
    }
}

/// Turns an extent into a camera move.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFitPolicy {
    pub point_zoom: u32,
    pub line_max_zoom: u32,
    pub polygon_max_zoom: u32,
    pub padding_px: f64,
    pub duration_ms: u64,
}

impl Default for ViewFitPolicy {
    fn default() -> Self {
        Self::from_config(&MapConfig::default())
    }
}

impl ViewFitPolicy {
    pub fn from_config(cfg: &MapConfig) -> Self {
        Self {
            point_zoom: POINT_ZOOM,
            line_max_zoom: LINE_MAX_ZOOM,
            polygon_max_zoom: POLYGON_MAX_ZOOM,
            padding_px: cfg.fit_padding_px,
            duration_ms: cfg.animation_duration_ms,
        }
    }

    /// Fails on any non-finite extent coordinate, including empty extents.
    pub fn plan(
        &self,
        extent: Extent,
        class: GeometryClass,
    ) -> Result<CameraMove, ConfigurationError> {
        let extent = extent.ensure_finite()?;
        let fit = |max_zoom| CameraMove::Fit {
            extent,
            options: FitOptions {
                padding_px: self.padding_px,
                duration_ms: self.duration_ms,
                max_zoom,
            },
        };
        Ok(match class {
            GeometryClass::Point => CameraMove::Animate(AnimateOptions {
                center: extent.center(),
                zoom: self.point_zoom,
                duration_ms: self.duration_ms,
            }),
            GeometryClass::Line => fit(Some(self.line_max_zoom)),
            GeometryClass::Polygon => fit(Some(self.polygon_max_zoom)),
            GeometryClass::Other => fit(None),
        })
    }

    /// Plans and applies the move. A rejected extent is recorded and the
    /// camera is left alone.
    pub fn apply<C: CameraHost + ?Sized>(
        &self,
        camera: &mut C,
        extent: Extent,
        class: GeometryClass,
        diagnostics: &mut Diagnostics,
    ) -> Result<CameraMove, ConfigurationError> {
        match self.plan(extent, class) {
            Ok(step) => {
                step.apply_to(camera);
                Ok(step)
            }
            Err(e) => {
                diagnostics.record(
                    DiagnosticKind::Configuration,
                    format!("view fit rejected: {e}"),
                );
                Err(e)
            }
        }
    }

    pub fn fit_feature<C: CameraHost + ?Sized>(
        &self,
        camera: &mut C,
        feature: &Feature,
        diagnostics: &mut Diagnostics,
    ) -> Result<CameraMove, ConfigurationError> {
        self.apply(
            camera,
            feature.extent(),
            feature.geometry_type().into(),
            diagnostics,
        )
    }
}
