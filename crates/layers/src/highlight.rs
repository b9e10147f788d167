use runtime::{DiagnosticKind, Diagnostics};
use scene::{Feature, find_by_id};
use serde_json::Value;

use crate::style::{ResolvedStyle, StyleResolver};

/// No feature carries the requested id.
#[derive(Debug, Clone, PartialEq)]
pub struct NotFoundError {
    pub column: String,
    pub target: Value,
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no feature with {} = {}", self.column, self.target)
    }
}

impl std::error::Error for NotFoundError {}

/// Keeps at most one feature of a collection highlighted.
///
/// Styles are cached per feature index and rebuilt wholesale on every
/// selection change, so the cache never mixes two selections.
#[derive(Debug)]
pub struct FeatureHighlighter {
    resolver: StyleResolver,
    id_column: String,
    styles: Vec<ResolvedStyle>,
    selected: Option<usize>,
}

impl FeatureHighlighter {
    pub fn new(resolver: StyleResolver, id_column: impl Into<String>) -> Self {
        Self {
            resolver,
            id_column: id_column.into(),
            styles: Vec::new(),
            selected: None,
        }
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_feature<'a>(&self, features: &'a [Feature]) -> Option<&'a Feature> {
        self.selected.and_then(|i| features.get(i))
    }

    pub fn style_of(&self, index: usize) -> Option<&ResolvedStyle> {
        self.styles.get(index)
    }

    pub fn styles(&self) -> &[ResolvedStyle] {
        &self.styles
    }

    /// Restyles every feature against the current selection.
    pub fn paint(&mut self, features: &[Feature], diagnostics: &mut Diagnostics) {
        if self.selected.is_some_and(|i| i >= features.len()) {
            self.selected = None;
        }
        self.styles = features
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                let style = self.resolver.resolve(feature, self.selected == Some(i));
                if let Some(err) = &style.error {
                    diagnostics.record(DiagnosticKind::Render, format!("feature {i}: {err}"));
                }
                style
            })
            .collect();
    }

    /// Selects the first feature whose id column equals `target`.
    ///
    /// On a miss the previous selection and cached styles stay as they were.
    pub fn highlight(
        &mut self,
        features: &[Feature],
        target: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize, NotFoundError> {
        let Some(index) = find_by_id(features, &self.id_column, target) else {
            let err = NotFoundError {
                column: self.id_column.clone(),
                target: target.clone(),
            };
            diagnostics.record(DiagnosticKind::NotFound, err.to_string());
            return Err(err);
        };
        self.selected = Some(index);
        self.paint(features, diagnostics);
        tracing::debug!(index, "highlighted feature {target}");
        Ok(index)
    }

    pub fn clear_highlight(&mut self, features: &[Feature], diagnostics: &mut Diagnostics) {
        self.selected = None;
        self.paint(features, diagnostics);
    }
}
