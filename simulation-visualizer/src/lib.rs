//! Scatter-plot rendering for loaded `.sim` snapshots.
//!
//! One PNG per timestep (see [`Renderer`]) and an optional GIF of all
//! timesteps (see [`render_animation`]).

pub mod animation;
pub mod colormap;
pub mod renderer;
pub mod style;

pub use animation::render_animation;
pub use colormap::Colormap;
pub use renderer::{RenderReport, Renderer};
pub use style::{marker_radius_px, MarkerScale, RenderStyle, MAX_MARK, MIN_MARK};
