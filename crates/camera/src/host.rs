use foundation::{Coord, Extent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOptions {
    pub padding_px: f64,
    pub duration_ms: u64,
    /// `None` lets the host zoom in as far as the extent allows.
    pub max_zoom: Option<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimateOptions {
    pub center: Coord,
    pub zoom: u32,
    pub duration_ms: u64,
}

/// The host map's view. Implementations move the camera; they never see a
/// non-finite extent.
pub trait CameraHost {
    fn fit(&mut self, extent: Extent, options: FitOptions);

    fn animate(&mut self, options: AnimateOptions);
}

/// What a [`CameraHost`] was asked to do.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraMove {
    Fit { extent: Extent, options: FitOptions },
    Animate(AnimateOptions),
}

impl CameraMove {
    pub fn apply_to<C: CameraHost + ?Sized>(&self, camera: &mut C) {
        match *self {
            CameraMove::Fit { extent, options } => camera.fit(extent, options),
            CameraMove::Animate(options) => camera.animate(options),
        }
    }
}

/// Camera that only remembers the moves it received.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingCamera {
    pub moves: Vec<CameraMove>,
}

impl RecordingCamera {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CameraHost for RecordingCamera {
    fn fit(&mut self, extent: Extent, options: FitOptions) {
        self.moves.push(CameraMove::Fit { extent, options });
    }

    fn animate(&mut self, options: AnimateOptions) {
        self.moves.push(CameraMove::Animate(options));
    }
}
