use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::world::Species;

/// The two behavior shapes every species is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Plant-like: ages, is eaten, spreads, dies from crowding.
    Producer,
    /// Animal-like: ages, may hunger and forage, breeds, moves.
    Consumer,
}

/// How a free neighboring cell is taken for an offspring or a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellChoice {
    /// First cell in the shuffled free list.
    First,
    /// Uniformly random cell from the free list.
    Random,
}

fn default_cell_choice() -> CellChoice {
    CellChoice::First
}

/// Numeric table for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub archetype: Archetype,
    pub breeding_age: u32,
    pub max_age: u32,
    pub breeding_probability: f64,
    pub max_litter_size: u32,
    /// Loses one food unit per step and dies at zero.
    #[serde(default)]
    pub hunger: bool,
    /// Eats the first living adjacent prey each step.
    #[serde(default)]
    pub forages: bool,
    /// Prey species and the food value each one is worth.
    #[serde(default)]
    pub diet: BTreeMap<Species, i32>,
    #[serde(default = "default_cell_choice")]
    pub cell_choice: CellChoice,
}

impl SpeciesConfig {
    /// Largest food value in the diet, or 0 for an empty diet.
    pub fn max_food_value(&self) -> i32 {
        self.diet.values().copied().max().unwrap_or(0)
    }

    pub fn food_value(&self, prey: Species) -> Option<i32> {
        self.diet.get(&prey).copied()
    }

    fn validate(&self, species: Species, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&self.breeding_probability) {
            errors.push(format!(
                "species.{species}.breeding_probability must be 0.0-1.0, got {}. Example: breeding_probability = 0.5",
                self.breeding_probability
            ));
        }
        if self.max_litter_size == 0 {
            errors.push(format!(
                "species.{species}.max_litter_size must be > 0, got 0. Example: max_litter_size = 3"
            ));
        }
        if self.max_age == 0 {
            errors.push(format!(
                "species.{species}.max_age must be > 0, got 0. Example: max_age = 10"
            ));
        }
        for (prey, value) in &self.diet {
            if *value <= 0 {
                errors.push(format!(
                    "species.{species}.diet.{prey} food value must be > 0, got {value}"
                ));
            }
            if *prey == species {
                errors.push(format!("species.{species}.diet must not contain itself"));
            }
        }
        match self.archetype {
            Archetype::Producer => {
                if self.hunger || self.forages {
                    errors.push(format!(
                        "species.{species} is a producer and cannot set hunger or forages"
                    ));
                }
                if !self.diet.is_empty() {
                    errors.push(format!("species.{species} is a producer and cannot have a diet"));
                }
            }
            Archetype::Consumer => {
                if (self.hunger || self.forages) && self.diet.is_empty() {
                    errors.push(format!(
                        "species.{species} hungers or forages but has an empty diet. Example: diet = {{ hare = 12 }}"
                    ));
                }
            }
        }
    }
}

/// Configuration for every species, with predator sets inferred from diets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Species, SpeciesConfig>",
    into = "BTreeMap<Species, SpeciesConfig>"
)]
pub struct SpeciesTable {
    configs: BTreeMap<Species, SpeciesConfig>,
    predators: BTreeMap<Species, Vec<Species>>,
}

impl SpeciesTable {
    /// Build a table from explicit entries; species without one get their
    /// default entry.
    pub fn with_overrides(overrides: BTreeMap<Species, SpeciesConfig>) -> Self {
        let mut configs = default_configs();
        configs.extend(overrides);

        let mut predators: BTreeMap<Species, Vec<Species>> = BTreeMap::new();
        for (&eater, config) in &configs {
            for &prey in config.diet.keys() {
                predators.entry(prey).or_default().push(eater);
            }
        }

        SpeciesTable { configs, predators }
    }

    pub fn get(&self, species: Species) -> &SpeciesConfig {
        // Every species is filled in at construction.
        &self.configs[&species]
    }

    /// Species whose diet includes `prey`.
    pub fn predators_of(&self, prey: Species) -> &[Species] {
        self.predators.get(&prey).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, &SpeciesConfig)> {
        self.configs.iter().map(|(&s, c)| (s, c))
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        for (species, config) in self.iter() {
            config.validate(species, &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        SpeciesTable::with_overrides(BTreeMap::new())
    }
}

impl From<BTreeMap<Species, SpeciesConfig>> for SpeciesTable {
    fn from(overrides: BTreeMap<Species, SpeciesConfig>) -> Self {
        SpeciesTable::with_overrides(overrides)
    }
}

impl From<SpeciesTable> for BTreeMap<Species, SpeciesConfig> {
    fn from(table: SpeciesTable) -> Self {
        table.configs
    }
}

fn consumer(
    breeding_age: u32,
    max_age: u32,
    breeding_probability: f64,
    max_litter_size: u32,
    hunter: bool,
    diet: &[(Species, i32)],
) -> SpeciesConfig {
    SpeciesConfig {
        archetype: Archetype::Consumer,
        breeding_age,
        max_age,
        breeding_probability,
        max_litter_size,
        hunger: hunter,
        forages: hunter,
        diet: diet.iter().copied().collect(),
        cell_choice: CellChoice::First,
    }
}

fn producer(max_age: u32) -> SpeciesConfig {
    SpeciesConfig {
        archetype: Archetype::Producer,
        breeding_age: 0,
        max_age,
        breeding_probability: 1.0,
        max_litter_size: 1,
        hunger: false,
        forages: false,
        diet: BTreeMap::new(),
        cell_choice: CellChoice::Random,
    }
}

/// The forest food web: hares and deer graze, owls, bears and wolves hunt.
fn default_configs() -> BTreeMap<Species, SpeciesConfig> {
    use Species::*;
    BTreeMap::from([
        (Hare, consumer(1, 5, 0.9, 8, false, &[(Berry, 12)])),
        (Deer, consumer(2, 12, 0.8, 5, false, &[(Acorn, 12)])),
        (Owl, consumer(2, 15, 0.5, 3, true, &[(Hare, 12)])),
        (Bear, consumer(4, 20, 0.25, 3, true, &[(Hare, 8), (Berry, 5)])),
        (Wolf, consumer(10, 50, 0.1, 3, true, &[(Hare, 9), (Deer, 12)])),
        (Berry, producer(5)),
        (Acorn, producer(10)),
    ])
}
