//! Line-oriented reader for the `.sim` snapshot format.
//!
//! ```text
//! N
//! width
//! height
//! min_mass
//! max_mass
//!
//! <timestep index>
//! <x> <y> <mass>
//! ...
//!
//! <timestep index>
//! ...
//! ```
//!
//! Parsing is a small state machine fed one line at a time, so blank-line and
//! end-of-file handling never depends on what a "read" happened to return.

use crate::error::{Result, SimError};
use crate::snapshot::{Metadata, Particle, Simulation};
use log::{debug, info, trace, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;

/// Header lines, in file order.
const HEADER_FIELDS: [&str; 5] = ["particle count", "width", "height", "min_mass", "max_mass"];

/// Source name used for in-memory input.
const STRING_SOURCE: &str = "<string>";

#[derive(Debug)]
enum ParseState {
    /// Collecting the five header integers.
    ReadingHeader { values: Vec<i64> },
    /// Header complete; the next line must be the blank separator.
    HeaderSeparator { sim: Simulation },
    /// Outside any block. Blank lines are skipped, anything else is a timestep index.
    BetweenBlocks { sim: Simulation },
    /// Inside a block; particle lines accumulate until a blank line or EOF.
    ReadingTimestepBlock {
        sim: Simulation,
        index: u64,
        particles: Vec<Particle>,
    },
}

/// Incremental `.sim` parser.
///
/// Feed lines in order with [`SimParser::feed_line`], then call
/// [`SimParser::finish`]. After an error the parser must be discarded.
#[derive(Debug)]
pub struct SimParser {
    source: String,
    state: ParseState,
    line_no: usize,
}

impl SimParser {
    /// `source` only labels error messages (usually the file path).
    pub fn new(source: impl Into<String>) -> Self {
        SimParser {
            source: source.into(),
            state: ParseState::ReadingHeader { values: Vec::with_capacity(HEADER_FIELDS.len()) },
            line_no: 0,
        }
    }

    /// Consumes one line (with or without its line terminator).
    pub fn feed_line(&mut self, raw: &str) -> Result<()> {
        self.line_no += 1;
        let line = raw.trim();
        let state = mem::replace(&mut self.state, ParseState::ReadingHeader { values: Vec::new() });

        self.state = match state {
            ParseState::ReadingHeader { mut values } => {
                let field = HEADER_FIELDS[values.len()];
                values.push(self.parse_header_value(line, field)?);
                if values.len() == HEADER_FIELDS.len() {
                    let metadata = self.build_metadata(&values)?;
                    debug!("Parsed header from {}: {:?}", self.source, metadata);
                    ParseState::HeaderSeparator { sim: Simulation::new(metadata) }
                } else {
                    ParseState::ReadingHeader { values }
                }
            }
            ParseState::HeaderSeparator { sim } => {
                if !line.is_empty() {
                    return Err(self.error(format!("expected a blank line after the header, found '{}'", line)));
                }
                ParseState::BetweenBlocks { sim }
            }
            ParseState::BetweenBlocks { sim } => {
                if line.is_empty() {
                    trace!("{}:{}: skipping extra blank line", self.source, self.line_no);
                    ParseState::BetweenBlocks { sim }
                } else {
                    let index = line.parse::<u64>().map_err(|_| {
                        self.error(format!("expected a timestep index, found '{}'", line))
                    })?;
                    ParseState::ReadingTimestepBlock { sim, index, particles: Vec::new() }
                }
            }
            ParseState::ReadingTimestepBlock { mut sim, index, mut particles } => {
                if line.is_empty() {
                    commit_block(&mut sim, index, particles);
                    ParseState::BetweenBlocks { sim }
                } else {
                    particles.push(self.parse_particle(line)?);
                    ParseState::ReadingTimestepBlock { sim, index, particles }
                }
            }
        };
        Ok(())
    }

    /// Ends input. EOF closes an open block; a header cut short is an error.
    pub fn finish(self) -> Result<Simulation> {
        match self.state {
            ParseState::ReadingHeader { values } => Err(SimError::format(
                &self.source,
                self.line_no + 1,
                format!("truncated header: missing {}", HEADER_FIELDS[values.len()]),
            )),
            ParseState::HeaderSeparator { sim } | ParseState::BetweenBlocks { sim } => Ok(sim),
            ParseState::ReadingTimestepBlock { mut sim, index, particles } => {
                commit_block(&mut sim, index, particles);
                Ok(sim)
            }
        }
    }

    fn parse_header_value(&self, line: &str, field: &str) -> Result<i64> {
        line.parse::<i64>()
            .map_err(|_| self.error(format!("{} must be an integer, found '{}'", field, line)))
    }

    fn build_metadata(&self, values: &[i64]) -> Result<Metadata> {
        let particle_count = u64::try_from(values[0])
            .map_err(|_| self.error(format!("particle count must be non-negative, found {}", values[0])))?;
        Ok(Metadata {
            particle_count,
            width: values[1],
            height: values[2],
            min_mass: values[3],
            max_mass: values[4],
        })
    }

    fn parse_particle(&self, line: &str) -> Result<Particle> {
        let fields: Vec<&str> = line.split(' ').collect();
        let [x, y, mass] = fields.as_slice() else {
            return Err(self.error(format!(
                "expected 3 fields (x y mass), found {}: '{}'",
                fields.len(),
                line
            )));
        };
        Ok(Particle::new(
            self.parse_float(x, "x")?,
            self.parse_float(y, "y")?,
            self.parse_float(mass, "mass")?,
        ))
    }

    fn parse_float(&self, field: &str, name: &str) -> Result<f64> {
        field
            .parse::<f64>()
            .map_err(|_| self.error(format!("{} must be a number, found '{}'", name, field)))
    }

    fn error(&self, message: String) -> SimError {
        SimError::format(&self.source, self.line_no, message)
    }
}

fn commit_block(sim: &mut Simulation, index: u64, particles: Vec<Particle>) {
    let count = particles.len();
    if count as u64 != sim.metadata.particle_count {
        warn!(
            "Timestep {} has {} particles, header declares {}",
            index, count, sim.metadata.particle_count
        );
    }
    if sim.insert_timestep(index, particles).is_some() {
        // Later block wins; the index keeps its original iteration position.
        warn!("Timestep {} appears more than once; keeping the later block", index);
    }
    trace!("Stored timestep {} ({} particles)", index, count);
}

/// Parses `.sim` text from any buffered reader without validating metadata.
pub fn read_simulation<R: BufRead>(reader: R, source: &str) -> Result<Simulation> {
    let mut parser = SimParser::new(source);
    for line in reader.lines() {
        let line = line.map_err(|e| SimError::io(source, e))?;
        parser.feed_line(&line)?;
    }
    parser.finish()
}

/// Loads and validates a `.sim` file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Simulation> {
    let path = path.as_ref();
    info!("Loading snapshot file: {}", path.display());

    let file = File::open(path).map_err(|e| SimError::io(path, e))?;
    let sim = read_simulation(BufReader::new(file), &path.display().to_string())?;
    sim.validate()?;

    info!(
        "Loaded {} timesteps ({} particle records), domain {}x{}, mass range [{}, {}]",
        sim.len(),
        sim.total_particles(),
        sim.metadata.width,
        sim.metadata.height,
        sim.metadata.min_mass,
        sim.metadata.max_mass
    );
    Ok(sim)
}

/// Parses and validates in-memory `.sim` text.
pub fn parse_str(text: &str) -> Result<Simulation> {
    let sim = parse_str_unchecked(text)?;
    sim.validate()?;
    Ok(sim)
}

/// Parses in-memory `.sim` text, skipping metadata validation.
pub fn parse_str_unchecked(text: &str) -> Result<Simulation> {
    read_simulation(text.as_bytes(), STRING_SOURCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "2\n100\n100\n1\n10\n";

    fn format_line(err: SimError) -> usize {
        match err {
            SimError::Format { location, .. } => location.line,
            other => panic!("expected a format error, got {other:?}"),
        }
    }

    #[test]
    fn parses_block_without_trailing_blank_line() {
        let sim = parse_str(&format!("{HEADER}\n3\n1 2 3\n4 5 6")).unwrap();
        assert_eq!(
            sim.timestep(3),
            Some(&[Particle::new(1.0, 2.0, 3.0), Particle::new(4.0, 5.0, 6.0)][..])
        );
    }

    #[test]
    fn header_without_separator_is_empty_simulation() {
        let sim = parse_str(HEADER).unwrap();
        assert!(sim.is_empty());
        assert_eq!(sim.metadata.max_mass, 10);
    }

    #[test]
    fn extra_blank_lines_between_blocks_are_skipped() {
        let sim = parse_str(&format!("{HEADER}\n0\n1 1 1\n\n\n\n1\n2 2 2\n\n")).unwrap();
        assert_eq!(sim.timestep_indices().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let text = format!("{HEADER}\n0\n1.5 2.5 3\n").replace('\n', "\r\n");
        let sim = parse_str(&text).unwrap();
        assert_eq!(sim.timestep(0), Some(&[Particle::new(1.5, 2.5, 3.0)][..]));
    }

    #[test]
    fn empty_block_is_kept() {
        let sim = parse_str(&format!("{HEADER}\n4\n\n")).unwrap();
        assert_eq!(sim.timestep(4), Some(&[][..]));
    }

    #[test]
    fn truncated_header_points_past_last_line() {
        let err = parse_str("2\n100\n100\n").unwrap_err();
        assert!(err.to_string().contains("min_mass"));
        assert_eq!(format_line(err), 4);
    }

    #[test]
    fn non_integer_header_is_rejected() {
        let err = parse_str("2\n100.5\n100\n1\n10\n").unwrap_err();
        assert!(err.to_string().contains("width"));
        assert_eq!(format_line(err), 2);
    }

    #[test]
    fn negative_particle_count_is_rejected() {
        let err = parse_str("-1\n100\n100\n1\n10\n").unwrap_err();
        assert_eq!(format_line(err), 5);
    }

    #[test]
    fn non_blank_separator_is_rejected() {
        let err = parse_str(&format!("{HEADER}0\n1 1 1\n")).unwrap_err();
        assert_eq!(format_line(err), 6);
    }

    #[test]
    fn particle_line_needs_three_fields() {
        let err = parse_str(&format!("{HEADER}\n0\n10.0 20.0\n")).unwrap_err();
        assert!(err.to_string().contains("expected 3 fields"));
        assert_eq!(format_line(err), 8);
    }

    #[test]
    fn doubled_space_between_fields_is_rejected() {
        let err = parse_str(&format!("{HEADER}\n0\n50  50 5\n")).unwrap_err();
        assert!(err.to_string().contains("found 4"));
        assert_eq!(format_line(err), 8);
    }

    #[test]
    fn tab_separated_fields_are_rejected() {
        let err = parse_str(&format!("{HEADER}\n0\n50\t50\t5\n")).unwrap_err();
        assert!(err.to_string().contains("found 1"));
        assert_eq!(format_line(err), 8);

        let err = parse_str(&format!("{HEADER}\n0\n50  50\t5\n")).unwrap_err();
        assert_eq!(format_line(err), 8);
    }

    #[test]
    fn particle_fields_must_be_numeric() {
        let err = parse_str(&format!("{HEADER}\n0\n10.0 abc 1\n")).unwrap_err();
        assert!(err.to_string().contains("y must be a number"));
    }

    #[test]
    fn block_missing_index_line_is_rejected() {
        let err = parse_str(&format!("{HEADER}\n0\n1 1 1\n\n2 2 2\n")).unwrap_err();
        assert!(err.to_string().contains("expected a timestep index"));
        assert_eq!(format_line(err), 10);
    }

    #[test]
    fn negative_timestep_index_is_rejected() {
        let err = parse_str(&format!("{HEADER}\n-3\n1 1 1\n")).unwrap_err();
        assert_eq!(format_line(err), 7);
    }

    #[test]
    fn unchecked_parse_accepts_degenerate_mass_range() {
        let sim = parse_str_unchecked("1\n10\n10\n5\n5\n\n0\n1 1 5\n").unwrap();
        assert_eq!(sim.metadata.min_mass, sim.metadata.max_mass);
        assert!(matches!(parse_str("1\n10\n10\n5\n5\n"), Err(SimError::Validation(_))));
    }
}
