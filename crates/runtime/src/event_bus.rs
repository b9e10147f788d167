/// Category of a recorded diagnostic. Mirrors the error taxonomy: only
/// configuration errors are surfaced to callers as failures, the others are
/// recovered locally and only show up here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Configuration,
    Render,
    NotFound,
    Network,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Configuration => "configuration",
            DiagnosticKind::Render => "render",
            DiagnosticKind::NotFound => "not_found",
            DiagnosticKind::Network => "network",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 0-based, monotonically increasing per log.
    pub sequence: u64,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Append-only diagnostics log.
///
/// Every record is also forwarded to `tracing` so hosts that only install a
/// subscriber still see it.
#[derive(Debug, Default)]
pub struct Diagnostics {
    next_sequence: u64,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            DiagnosticKind::Configuration | DiagnosticKind::Network => {
                tracing::error!(kind = kind.as_str(), "{message}")
            }
            DiagnosticKind::Render | DiagnosticKind::NotFound => {
                tracing::warn!(kind = kind.as_str(), "{message}")
            }
        }
        self.entries.push(Diagnostic {
            sequence: self.next_sequence,
            kind,
            message,
        });
        self.next_sequence += 1;
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn last(&self) -> Option<&Diagnostic> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}
