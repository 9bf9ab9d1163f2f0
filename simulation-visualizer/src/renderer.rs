use crate::style::{marker_radius_px, MarkerScale, RenderStyle};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use rayon::prelude::*;
use simulation_common::{Metadata, Particle, Result, SimError, Simulation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Width of the color legend strip on the right of each frame.
const LEGEND_WIDTH_PX: i32 = 110;
/// Number of bands the color legend is drawn with.
const LEGEND_STEPS: usize = 64;
const TITLE_FONT_PX: u32 = 22;

type ScatterChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Files produced by one [`Renderer::render_all`] call, in timestep iteration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub frames: Vec<PathBuf>,
}

impl RenderReport {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Writes one scatter plot per timestep.
#[derive(Debug, Clone)]
pub struct Renderer {
    style: RenderStyle,
    parallel: bool,
    progress: bool,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Renderer {
            style,
            parallel: false,
            progress: false,
        }
    }

    /// Render frames on the rayon pool instead of one after another.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Show a progress bar on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn frame_path(&self, output_dir: &Path, timestep: u64) -> PathBuf {
        output_dir.join(self.style.frame_file_name(timestep))
    }

    /// Renders every timestep of `sim` into `output_dir`, overwriting existing frames.
    ///
    /// The mass range is validated before any frame is drawn. The first failing
    /// frame aborts the run.
    pub fn render_all(&self, sim: &Simulation, output_dir: &Path) -> Result<RenderReport> {
        let scale = MarkerScale::for_metadata(&sim.metadata, &self.style)?;
        fs::create_dir_all(output_dir).map_err(|e| SimError::io(output_dir, e))?;

        if sim.is_empty() {
            warn!("Simulation contains no timesteps; nothing to render.");
            return Ok(RenderReport::default());
        }

        info!(
            "Rendering {} timesteps to {} ({}x{} px, {})",
            sim.len(),
            output_dir.display(),
            self.style.width_px,
            self.style.height_px,
            if self.parallel { "parallel" } else { "sequential" }
        );
        let start_time = Instant::now();
        let progress_bar = self.progress_bar(sim.len() as u64);

        let jobs: Vec<(u64, &[Particle])> = sim.timesteps().collect();
        let render_one = |&(timestep, particles): &(u64, &[Particle])| -> Result<PathBuf> {
            let path = self.frame_path(output_dir, timestep);
            self.render_timestep(&sim.metadata, &scale, timestep, particles, &path)?;
            progress_bar.inc(1);
            Ok(path)
        };

        let frames = if self.parallel {
            jobs.par_iter().map(render_one).collect::<Result<Vec<_>>>()?
        } else {
            jobs.iter().map(render_one).collect::<Result<Vec<_>>>()?
        };

        progress_bar.finish_with_message(format!("Rendered {} frames", frames.len()));
        info!(
            "Rendered {} frames in {:.2?}",
            frames.len(),
            start_time.elapsed()
        );
        Ok(RenderReport { frames })
    }

    /// Draws and saves a single frame to `path`.
    ///
    /// The bitmap backend lives only for this call, so nothing carries over
    /// to the next frame even when this one fails.
    pub fn render_timestep(
        &self,
        metadata: &Metadata,
        scale: &MarkerScale,
        timestep: u64,
        particles: &[Particle],
        path: &Path,
    ) -> Result<()> {
        debug!("Drawing timestep {} ({} particles) -> {}", timestep, particles.len(), path.display());
        let root = BitMapBackend::new(path, (self.style.width_px, self.style.height_px)).into_drawing_area();
        draw_frame(&root, metadata, scale, &self.style, timestep, particles)
            .and_then(|()| root.present())
            .map_err(|e| SimError::Render {
                timestep,
                message: e.to_string(),
            })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let progress_bar = ProgressBar::new(len);
        match ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")
        {
            Ok(style) => progress_bar.set_style(style.progress_chars("#>-")),
            Err(e) => warn!("Invalid progress bar template: {}", e),
        }
        progress_bar
    }
}

fn plot_color(style: &RenderStyle, position: f64) -> RGBAColor {
    let c = style.colormap.color(position);
    RGBColor(c.red, c.green, c.blue).mix(style.alpha)
}

/// Draws one frame onto `root`: the scatter plot on the left and the "Mass"
/// color legend on the right. Shared by PNG frames and GIF animation.
pub(crate) fn draw_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    metadata: &Metadata,
    scale: &MarkerScale,
    style: &RenderStyle,
    timestep: u64,
    particles: &[Particle],
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let (plot_area, legend_area) = split_frame(root, style);

    // --- Scatter plot ---
    let mut chart = scatter_chart(&plot_area, metadata, timestep)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("X")
        .y_desc("Y")
        .draw()?;

    chart.draw_series(particles.iter().map(|p| {
        let radius = marker_radius_px(scale.size(p.mass), style.dpi);
        Circle::new((p.x, p.y), radius, plot_color(style, scale.color_position(p.mass)).filled())
    }))?;

    // --- Color legend ---
    let (min_mass, max_mass) = scale.mass_range();
    let mut legend = ChartBuilder::on(&legend_area)
        .margin_top(10 + TITLE_FONT_PX as i32 + 10)
        .margin_bottom(50)
        .margin_right(20)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, min_mass..max_mass)?;

    legend
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_desc("Mass")
        .draw()?;

    let band = (max_mass - min_mass) / LEGEND_STEPS as f64;
    legend.draw_series((0..LEGEND_STEPS).map(|i| {
        let low = min_mass + band * i as f64;
        let position = (i as f64 + 0.5) / LEGEND_STEPS as f64;
        Rectangle::new([(0.0, low), (1.0, low + band)], plot_color(style, position).filled())
    }))?;

    Ok(())
}

/// Splits a frame into the plot area and the legend strip on its right.
fn split_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    style: &RenderStyle,
) -> (DrawingArea<DB, Shift>, DrawingArea<DB, Shift>) {
    let split_at = (style.width_px as i32 - LEGEND_WIDTH_PX).max(style.width_px as i32 / 2);
    root.split_horizontally(split_at)
}

/// Titled chart over `[0, width+1] x [0, height+1]`.
fn scatter_chart<'a, DB: DrawingBackend>(
    plot_area: &'a DrawingArea<DB, Shift>,
    metadata: &Metadata,
    timestep: u64,
) -> std::result::Result<ScatterChart<'a, DB>, DrawingAreaErrorKind<DB::ErrorType>> {
    let (x_max, y_max) = metadata.plot_bounds();
    ChartBuilder::on(plot_area)
        .caption(format!("Timestep {}", timestep), ("sans-serif", TITLE_FONT_PX))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
}
