use foundation::Extent;
use runtime::Diagnostics;
use scene::Feature;
use serde_json::Value;

use crate::highlight::{FeatureHighlighter, NotFoundError};
use crate::layer::{Layer, LayerId, LayerKind};
use crate::style::ResolvedStyle;

/// Caller-supplied features drawn above the base map.
#[derive(Debug)]
pub struct VectorLayer {
    id: LayerId,
    features: Vec<Feature>,
    highlighter: FeatureHighlighter,
}

impl VectorLayer {
    /// Builds the layer and runs the initial style pass.
    pub fn new(
        id: u64,
        features: Vec<Feature>,
        highlighter: FeatureHighlighter,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut layer = Self {
            id: LayerId(id),
            features,
            highlighter,
        };
        layer.highlighter.paint(&layer.features, diagnostics);
        layer
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Replaces the collection and repaints. The selection is dropped.
    pub fn set_features(&mut self, features: Vec<Feature>, diagnostics: &mut Diagnostics) {
        self.features = features;
        self.highlighter.clear_highlight(&self.features, diagnostics);
    }

    pub fn highlight(
        &mut self,
        target: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<&Feature, NotFoundError> {
        let index = self.highlighter.highlight(&self.features, target, diagnostics)?;
        Ok(&self.features[index])
    }

    pub fn clear_highlight(&mut self, diagnostics: &mut Diagnostics) {
        self.highlighter.clear_highlight(&self.features, diagnostics);
    }

    pub fn selected(&self) -> Option<&Feature> {
        self.highlighter.selected_feature(&self.features)
    }

    /// Features zipped with their current styles.
    pub fn styled(&self) -> impl Iterator<Item = (&Feature, &ResolvedStyle)> {
        self.features.iter().zip(self.highlighter.styles())
    }

    /// Union of all feature extents; empty when no feature has vertices.
    pub fn extent(&self) -> Extent {
        let mut out = Extent::empty();
        for f in &self.features {
            out.merge(&f.extent());
        }
        out
    }
}

impl Layer for VectorLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn kind(&self) -> LayerKind {
        LayerKind::Vector
    }
}
