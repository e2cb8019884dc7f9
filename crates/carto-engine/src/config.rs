//! Compiler Configuration

use carto_style::CascadeMode;

/// Compiler configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Fail on statements of unexpected kind instead of skipping them
    pub strict: bool,

    /// How specializing rules relate to the rules they specialize
    pub cascade: CascadeMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: true,
            cascade: CascadeMode::Distinct,
        }
    }
}

impl Config {
    /// Lenient configuration: unexpected statements are logged and skipped
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }
}
