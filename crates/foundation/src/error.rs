/// A programmer or configuration mistake.
///
/// These are never defaulted away: the affected layer, style or camera move is
/// refused instead of being rendered wrongly.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Extent with a non-positive span.
    DegenerateExtent { width: f64, height: f64 },
    /// Extent with a NaN or infinite coordinate.
    NonFiniteExtent([f64; 4]),
    InvalidTileSize(u32),
    /// Zero levels, or more than the grid can halve into.
    InvalidZoomLevels(u32),
    InvalidColor(String),
    InvalidOpacity(f64),
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },
    InvalidOption { name: &'static str, reason: String },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::DegenerateExtent { width, height } => {
                write!(f, "degenerate extent: width={width} height={height}")
            }
            ConfigurationError::NonFiniteExtent(e) => {
                write!(
                    f,
                    "non-finite extent: [{}, {}, {}, {}]",
                    e[0], e[1], e[2], e[3]
                )
            }
            ConfigurationError::InvalidTileSize(size) => {
                write!(f, "tile size must be positive, got {size}")
            }
            ConfigurationError::InvalidZoomLevels(levels) => {
                write!(f, "unsupported zoom level count: {levels}")
            }
            ConfigurationError::InvalidColor(color) => {
                write!(f, "invalid hex color: {color:?}")
            }
            ConfigurationError::InvalidOpacity(opacity) => {
                write!(f, "opacity must be within [0, 1], got {opacity}")
            }
            ConfigurationError::MissingPlaceholder {
                template,
                placeholder,
            } => write!(f, "url template {template:?} lacks {placeholder}"),
            ConfigurationError::InvalidOption { name, reason } => {
                write!(f, "invalid option {name}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}
