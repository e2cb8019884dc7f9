//! Source locations

use std::fmt;
use std::sync::Arc;

/// Position of a node in the source that produced it.
///
/// Lines and columns are 1-based. The file name is shared between all the
/// locations of one input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Same file, different position
    pub fn at(&self, line: u32, column: u32) -> Self {
        Self {
            file: Arc::clone(&self.file),
            line,
            column,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new("<input>", 1, 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
