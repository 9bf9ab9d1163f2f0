pub mod config;
pub mod error;
pub mod loader;
pub mod snapshot;
pub mod writer;

// Re-export key types for easier use by dependent crates
pub use config::{ColormapKind, ExecutionConfig, InputConfig, OutputConfig, RenderConfig, StyleConfig, MAX_MARK, MIN_MARK};
pub use error::{Location, Result, SimError};
pub use loader::{load, parse_str, parse_str_unchecked, read_simulation, SimParser};
pub use snapshot::{Metadata, Particle, Simulation};
