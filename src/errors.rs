use std::fmt;

/// Everything that can go wrong while building or synthesizing a pattern.
/// Degenerate inputs (single elements, empty neighborhoods) are not errors,
/// they just produce empty or trivial results.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// A stroke could not be fitted to the requested element shape.
    ShapeFitFailed,
    /// The target cell has no usable extent.
    InvalidTargetCell,
    /// Synthesis was requested on a group with nothing to learn from.
    EmptyGroup,
    /// Synthesis was requested before any group defined a bounding box.
    EmptyPattern,
    /// Saving or loading went sideways.
    Persistence(String),
}

impl std::error::Error for PatternError {}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PatternError::ShapeFitFailed => write!(f, "Stroke does not fit the requested element shape"),
            PatternError::InvalidTargetCell => write!(f, "Target cell is empty or malformed"),
            PatternError::EmptyGroup => write!(f, "Stroke group has no elements to synthesize from"),
            PatternError::EmptyPattern => write!(f, "Pattern has no valid bounding box"),
            PatternError::Persistence(msg) => write!(f, "Pattern persistence error: {}", msg),
        }
    }
}

impl From<ron::error::SpannedError> for PatternError {
    fn from(err: ron::error::SpannedError) -> Self {
        PatternError::Persistence(err.to_string())
    }
}

#[derive(Debug)]
pub enum SvgCreationError {
    UndefinedViewBox,
}

impl std::error::Error for SvgCreationError {}

impl fmt::Display for SvgCreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SvgCreationError::UndefinedViewBox => write!(f, "Nothing to draw, so no viewbox either"),
        }
    }
}
