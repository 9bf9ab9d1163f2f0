use clap::ValueEnum;
use log::info;
use serde::Serialize;
use simulation_common::{Result, SimError, Simulation};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Formats a loaded simulation can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Bincode,
    Messagepack,
    /// One `timestep,x,y,mass` row per particle.
    Csv,
}

#[derive(Serialize)]
struct CsvRow {
    timestep: u64,
    x: f64,
    y: f64,
    mass: f64,
}

/// Writes `sim` to `path` in the requested format, replacing any existing file.
pub fn export_simulation(sim: &Simulation, format: ExportFormat, path: &Path) -> Result<()> {
    match format {
        ExportFormat::Json => {
            let mut writer = create(path)?;
            serde_json::to_writer(&mut writer, sim).map_err(|e| SimError::Export(format!("JSON: {}", e)))?;
            writer.flush().map_err(|e| SimError::io(path, e))?;
        }
        ExportFormat::Bincode => {
            let writer = create(path)?;
            bincode::serialize_into(writer, sim).map_err(|e| SimError::Export(format!("bincode: {}", e)))?;
        }
        ExportFormat::Messagepack => {
            let mut writer = create(path)?;
            rmp_serde::encode::write(&mut writer, sim)
                .map_err(|e| SimError::Export(format!("MessagePack: {}", e)))?;
            writer.flush().map_err(|e| SimError::io(path, e))?;
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(path).map_err(|e| SimError::Export(format!("CSV: {}", e)))?;
            for (timestep, particles) in sim.timesteps() {
                for p in particles {
                    writer
                        .serialize(CsvRow { timestep, x: p.x, y: p.y, mass: p.mass })
                        .map_err(|e| SimError::Export(format!("CSV: {}", e)))?;
                }
            }
            writer.flush().map_err(|e| SimError::io(path, e))?;
        }
    }
    info!("Exported {} timesteps to {} ({:?})", sim.len(), path.display(), format);
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| SimError::io(path, e))
}
