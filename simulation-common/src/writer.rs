use crate::error::{Result, SimError};
use crate::snapshot::Simulation;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes `sim` in `.sim` text form.
///
/// Floats use the shortest representation that parses back to the same value,
/// so loading the output reproduces `sim` exactly.
pub fn write_simulation<W: Write>(sim: &Simulation, mut out: W) -> io::Result<()> {
    let meta = &sim.metadata;
    writeln!(out, "{}", meta.particle_count)?;
    writeln!(out, "{}", meta.width)?;
    writeln!(out, "{}", meta.height)?;
    writeln!(out, "{}", meta.min_mass)?;
    writeln!(out, "{}", meta.max_mass)?;
    writeln!(out)?;

    for (index, particles) in sim.timesteps() {
        writeln!(out, "{}", index)?;
        for p in particles {
            writeln!(out, "{} {} {}", p.x, p.y, p.mass)?;
        }
        writeln!(out)?;
    }
    out.flush()
}

pub fn to_sim_string(sim: &Simulation) -> String {
    let mut buf = Vec::new();
    write_simulation(sim, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

/// Saves `sim` to `path`, replacing any existing file.
pub fn save<P: AsRef<Path>>(sim: &Simulation, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SimError::io(path, e))?;
    write_simulation(sim, BufWriter::new(file)).map_err(|e| SimError::io(path, e))?;
    info!("Wrote {} timesteps to {}", sim.len(), path.display());
    Ok(())
}
