use crate::renderer::draw_frame;
use crate::style::{MarkerScale, RenderStyle};
use log::{info, warn};
use plotters::prelude::*;
use simulation_common::{Result, SimError, Simulation};
use std::path::Path;

/// Writes every timestep as one frame of an animated GIF, in iteration order.
///
/// Frames share axis bounds and the mass scale, so the animation reads like
/// the individual PNGs played back. An empty simulation writes nothing.
pub fn render_animation(
    sim: &Simulation,
    style: &RenderStyle,
    path: &Path,
    frame_delay_ms: u32,
) -> Result<()> {
    let scale = MarkerScale::for_metadata(&sim.metadata, style)?;
    if sim.is_empty() {
        warn!("Simulation contains no timesteps; skipping animation {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SimError::io(parent, e))?;
    }

    let backend = BitMapBackend::gif(path, (style.width_px, style.height_px), frame_delay_ms)
        .map_err(|e| SimError::Render {
            timestep: 0,
            message: format!("cannot open {}: {}", path.display(), e),
        })?;
    let root = backend.into_drawing_area();

    for (timestep, particles) in sim.timesteps() {
        draw_frame(&root, &sim.metadata, &scale, style, timestep, particles)
            .and_then(|()| root.present())
            .map_err(|e| SimError::Render {
                timestep,
                message: e.to_string(),
            })?;
    }

    info!("Wrote {}-frame animation to {}", sim.len(), path.display());
    Ok(())
}
