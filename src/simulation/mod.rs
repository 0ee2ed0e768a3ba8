pub mod lifecycle;
pub mod populate;
pub mod statistics;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::simulation::{PopulationEntry, SimulationConfig};
use crate::config::species::SpeciesTable;
use crate::simulation::statistics::{StepStatistics, StepTally};
use crate::world::{Field, Species};

/// Build the next field from `current`.
///
/// Organisms act in the order they sit in `current`'s collection. One that
/// is already dead when its turn comes (eaten earlier this step) is skipped.
/// `current` may itself be changed: foragers mark their prey dead in it.
pub fn advance_one_step(current: &Field, species: &SpeciesTable, rng: &mut impl Rng) -> Field {
    run_step(current, species, rng).0
}

/// [`advance_one_step`], also returning what happened along the way.
pub fn run_step(
    current: &Field,
    species: &SpeciesTable,
    rng: &mut impl Rng,
) -> (Field, StepTally) {
    let mut next = Field::new(current.depth(), current.width());
    let mut tally = StepTally::default();
    for organism in current.organisms() {
        if !organism.is_alive() {
            continue;
        }
        let outcome = lifecycle::step(organism, species, current, &mut next, rng);
        tally.record(&outcome);
    }
    (next, tally)
}

/// Result of executing a single step.
#[derive(Debug)]
pub struct StepResult {
    pub statistics: StepStatistics,
}

/// The current field plus everything needed to keep stepping it
/// reproducibly.
pub struct Simulation {
    field: Field,
    species: SpeciesTable,
    population: Vec<PopulationEntry>,
    viability: [Species; 2],
    seed: u64,
    rng: ChaCha8Rng,
    step: u64,
}

impl Simulation {
    /// Create and populate a simulation.
    ///
    /// If `config.seed` is 0 a random seed is chosen; the one actually used
    /// is available from [`Simulation::seed`].
    pub fn new(config: &SimulationConfig) -> Self {
        let seed = if config.seed == 0 {
            rand::thread_rng().r#gen()
        } else {
            config.seed
        };
        let mut sim = Simulation {
            field: Field::new(config.depth, config.width),
            species: config.species.clone(),
            population: config.population.clone(),
            viability: config.viability,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            step: 0,
        };
        sim.reset();
        sim
    }

    /// Re-seed the random source and start over with a fresh population.
    pub fn reset(&mut self) {
        self.step = 0;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        populate::populate(&mut self.field, &self.population, &self.species, &mut self.rng);
        info!(
            seed = self.seed,
            depth = self.field.depth(),
            width = self.field.width(),
            organisms = self.field.len(),
            "Simulation reset"
        );
    }

    /// Advance by one step and swap in the freshly built field.
    pub fn step(&mut self) -> StepResult {
        let start = Instant::now();
        let (next, tally) = run_step(&self.field, &self.species, &mut self.rng);
        self.field = next;
        self.step += 1;

        let duration_ms = start.elapsed().as_secs_f32() * 1000.0;
        let statistics = statistics::compute_statistics(
            &self.field,
            self.step,
            self.viability,
            tally,
            duration_ms,
        );
        debug!(
            step = self.step,
            total = statistics.total,
            births = tally.births,
            kills = tally.kills,
            "Step complete"
        );
        StepResult { statistics }
    }

    /// Statistics for the field as it stands, with an empty tally.
    pub fn statistics(&self) -> StepStatistics {
        statistics::compute_statistics(
            &self.field,
            self.step,
            self.viability,
            StepTally::default(),
            0.0,
        )
    }

    pub fn is_viable(&self) -> bool {
        self.field.is_viable(self.viability[0], self.viability[1])
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn species(&self) -> &SpeciesTable {
        &self.species
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}
