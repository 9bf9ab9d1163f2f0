use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Where in a `.sim` source a format problem was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File path, or a placeholder such as `<string>` for in-memory input.
    pub source: String,
    /// 1-based line number. Points one past the last line for truncated input.
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// Errors raised while loading, validating, rendering or exporting a simulation.
///
/// Every failure is fatal for the run; variants carry enough context
/// (path, line, timestep) to point at the offending input.
#[derive(Debug, Error)]
pub enum SimError {
    /// Input missing/unreadable or output location not writable.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `.sim` content.
    #[error("format error at {location}: {message}")]
    Format { location: Location, message: String },

    /// Well-formed input that breaks a model invariant (e.g. `max_mass <= min_mass`).
    #[error("validation error: {0}")]
    Validation(String),

    /// Plotting backend failure while drawing or saving a frame.
    #[error("failed to render timestep {timestep}: {message}")]
    Render { timestep: u64, message: String },

    /// Unreadable or invalid TOML configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Serializer failure while exporting.
    #[error("export error: {0}")]
    Export(String),
}

impl SimError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SimError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn format(source: &str, line: usize, message: impl Into<String>) -> Self {
        SimError::Format {
            location: Location {
                source: source.to_string(),
                line,
            },
            message: message.into(),
        }
    }
}
