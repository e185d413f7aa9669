// Errors
// Why an edit was refused, and what can go wrong loading or saving the config

use thiserror::Error;

use super::hooks::EditKind;

/// Result of an editing operation
pub type EditResult<T = ()> = Result<T, EditError>;

/// Why an edit did not happen.
///
/// Out-of-range positions are never an error: they are clamped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("{0} rejected by mutation hook")]
    Vetoed(EditKind),

    #[error("editor is read-only")]
    ReadOnly,
}

/// Failure to load or store an `EditorConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
