pub mod coordinate;
pub mod field;
pub mod organism;
pub mod species;

pub use coordinate::Coordinate;
pub use field::{Field, PopulationCounts};
pub use organism::{Organism, OrganismRef};
pub use species::Species;
