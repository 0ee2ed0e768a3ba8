use rand::Rng;
use tracing::debug;

use crate::config::simulation::PopulationEntry;
use crate::config::species::SpeciesTable;
use crate::simulation::lifecycle::spawn;
use crate::world::{Coordinate, Field};

/// Clear `field` and scatter a random initial population over it.
///
/// Each cell walks `plan` in order and is claimed by the first entry whose
/// draw succeeds, so at most one organism lands per cell. Seeded organisms
/// get a random age below their species' maximum.
pub fn populate(
    field: &mut Field,
    plan: &[PopulationEntry],
    species: &SpeciesTable,
    rng: &mut impl Rng,
) {
    field.clear();
    for row in 0..field.depth() {
        for col in 0..field.width() {
            let Some(entry) = plan.iter().find(|e| rng.gen_bool(e.probability)) else {
                continue;
            };
            let config = species.get(entry.species);
            let coord = Coordinate::new(row, col);
            let age = rng.gen_range(0..config.max_age);
            field.place(spawn(entry.species, config, coord, age, rng), coord);
        }
    }
    debug!(organisms = field.len(), "Field populated");
}
