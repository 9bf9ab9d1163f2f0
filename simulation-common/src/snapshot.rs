use crate::error::{Result, SimError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Header of a `.sim` file: particle count, domain size and the global mass range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of particles the producer declared (N).
    pub particle_count: u64,
    /// Domain width; plots span `[0, width + 1]` on X.
    pub width: i64,
    /// Domain height; plots span `[0, height + 1]` on Y.
    pub height: i64,
    /// Smallest mass across the whole run, used for marker-size normalization.
    pub min_mass: i64,
    /// Largest mass across the whole run. Must be strictly greater than `min_mass`.
    pub max_mass: i64,
}

impl Metadata {
    /// Checks the invariants rendering depends on.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(SimError::Validation(format!(
                "domain must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_mass <= self.min_mass {
            return Err(SimError::Validation(format!(
                "max_mass ({}) must be greater than min_mass ({})",
                self.max_mass, self.min_mass
            )));
        }
        Ok(())
    }

    /// Upper plot bounds shared by every frame.
    pub fn plot_bounds(&self) -> (f64, f64) {
        (self.width as f64 + 1.0, self.height as f64 + 1.0)
    }
}

/// One (x, y, mass) record inside a timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub mass: f64,
}

impl Particle {
    pub fn new(x: f64, y: f64, mass: f64) -> Self {
        Particle { x, y, mass }
    }
}

/// A fully loaded `.sim` file.
///
/// Timesteps iterate in order of first appearance in the source. Re-inserting an
/// existing index replaces its particles but keeps its original position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub metadata: Metadata,
    timesteps: IndexMap<u64, Vec<Particle>>,
}

impl Simulation {
    /// Creates a simulation with no timesteps.
    pub fn new(metadata: Metadata) -> Self {
        Simulation {
            metadata,
            timesteps: IndexMap::new(),
        }
    }

    /// Stores `particles` under `index`, returning the block it replaced, if any.
    pub fn insert_timestep(&mut self, index: u64, particles: Vec<Particle>) -> Option<Vec<Particle>> {
        self.timesteps.insert(index, particles)
    }

    pub fn timestep(&self, index: u64) -> Option<&[Particle]> {
        self.timesteps.get(&index).map(Vec::as_slice)
    }

    /// Iterates `(index, particles)` in file order.
    pub fn timesteps(&self) -> impl Iterator<Item = (u64, &[Particle])> + '_ {
        self.timesteps.iter().map(|(&index, particles)| (index, particles.as_slice()))
    }

    pub fn timestep_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.timesteps.keys().copied()
    }

    /// Number of distinct timesteps.
    pub fn len(&self) -> usize {
        self.timesteps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timesteps.is_empty()
    }

    /// Total particle records across all timesteps.
    pub fn total_particles(&self) -> usize {
        self.timesteps.values().map(Vec::len).sum()
    }

    pub fn validate(&self) -> Result<()> {
        self.metadata.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> Metadata {
        Metadata {
            particle_count: 2,
            width: 100,
            height: 50,
            min_mass: 1,
            max_mass: 10,
        }
    }

    #[test]
    fn reinserted_timestep_keeps_first_position() {
        let mut sim = Simulation::new(meta());
        sim.insert_timestep(5, vec![Particle::new(1.0, 1.0, 1.0)]);
        sim.insert_timestep(2, vec![]);
        let replaced = sim.insert_timestep(5, vec![Particle::new(2.0, 2.0, 2.0)]);

        assert_eq!(replaced, Some(vec![Particle::new(1.0, 1.0, 1.0)]));
        assert_eq!(sim.timestep_indices().collect::<Vec<_>>(), vec![5, 2]);
        assert_eq!(sim.timestep(5), Some(&[Particle::new(2.0, 2.0, 2.0)][..]));
    }

    #[test]
    fn equal_mass_bounds_fail_validation() {
        let m = Metadata { max_mass: 1, ..meta() };
        assert!(matches!(m.validate(), Err(SimError::Validation(_))));
    }

    #[test]
    fn zero_width_fails_validation() {
        let m = Metadata { width: 0, ..meta() };
        assert!(matches!(m.validate(), Err(SimError::Validation(_))));
    }

    #[test]
    fn plot_bounds_pad_by_one() {
        assert_eq!(meta().plot_bounds(), (101.0, 51.0));
    }
}
