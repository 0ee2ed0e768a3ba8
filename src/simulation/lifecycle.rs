//! The per-organism state machine shared by every species.
//!
//! A step reads the current field, builds into the next field, and either
//! places the organism into the next field exactly once or marks it dead.
//! Which sub-steps run is decided by the species' [`Archetype`] and table
//! entry:
//!
//! - Producer: age, eaten check, reproduce, move or die from crowding.
//! - Consumer: age, hunger, forage, reproduce, move or die from crowding.

use std::rc::Rc;

use rand::Rng;
use tracing::trace;

use crate::config::species::{Archetype, CellChoice, SpeciesConfig, SpeciesTable};
use crate::world::{Coordinate, Field, Organism, OrganismRef, Species};

/// How an organism's step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fate {
    Survived,
    OldAge,
    Starved,
    /// A producer found a living consumer of its kind anywhere in the field.
    Eaten,
    Overcrowded,
}

/// Prey consumed by a foraging consumer.
///
/// By the time this is returned the prey has already been marked dead in the
/// current field, so any later organism (including the prey itself, if its
/// turn has not come yet) sees it as dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meal {
    pub prey: Species,
    pub location: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub fate: Fate,
    pub births: u32,
    pub meal: Option<Meal>,
}

impl StepOutcome {
    fn died(fate: Fate) -> Self {
        StepOutcome {
            fate,
            births: 0,
            meal: None,
        }
    }
}

/// Advance one organism by one step.
///
/// # Panics
/// Panics if the organism is already dead, or if a surviving organism ends
/// the step without being placed in `next`.
pub fn step(
    organism: &OrganismRef,
    species: &SpeciesTable,
    current: &Field,
    next: &mut Field,
    rng: &mut impl Rng,
) -> StepOutcome {
    assert!(
        organism.is_alive(),
        "step called on a dead {}",
        organism.species()
    );
    let config = species.get(organism.species());

    let outcome = match config.archetype {
        Archetype::Producer => producer_step(organism, config, species, current, next, rng),
        Archetype::Consumer => consumer_step(organism, config, current, next, rng),
    };

    if organism.is_alive() {
        let location = location_of(organism);
        assert!(
            next.organism_at(location)
                .is_some_and(|placed| Rc::ptr_eq(placed, organism)),
            "surviving {} was not placed at {}",
            organism.species(),
            location
        );
    }
    if outcome.fate != Fate::Survived {
        trace!(species = %organism.species(), fate = ?outcome.fate, "organism died");
    }
    outcome
}

fn producer_step(
    organism: &OrganismRef,
    config: &SpeciesConfig,
    species: &SpeciesTable,
    current: &Field,
    next: &mut Field,
    rng: &mut impl Rng,
) -> StepOutcome {
    if !organism.grow_older(config.max_age) {
        return StepOutcome::died(Fate::OldAge);
    }
    if is_eaten(organism.species(), species, current) {
        organism.set_dead();
        return StepOutcome::died(Fate::Eaten);
    }

    let location = location_of(organism);
    let mut free = next.free_adjacent_coordinates(location, rng);
    let births = reproduce(organism, config, next, &mut free, rng);
    let fate = settle(organism, None, &mut free, config.cell_choice, next, rng);
    StepOutcome {
        fate,
        births,
        meal: None,
    }
}

fn consumer_step(
    organism: &OrganismRef,
    config: &SpeciesConfig,
    current: &Field,
    next: &mut Field,
    rng: &mut impl Rng,
) -> StepOutcome {
    if !organism.grow_older(config.max_age) {
        return StepOutcome::died(Fate::OldAge);
    }
    if config.hunger && !organism.grow_hungrier() {
        return StepOutcome::died(Fate::Starved);
    }

    let location = location_of(organism);
    let meal = if config.forages {
        forage(organism, config, current, location, rng)
    } else {
        None
    };

    let mut free = next.free_adjacent_coordinates(location, rng);
    let births = reproduce(organism, config, next, &mut free, rng);
    let fate = settle(
        organism,
        meal.map(|m| m.location),
        &mut free,
        config.cell_choice,
        next,
        rng,
    );
    StepOutcome { fate, births, meal }
}

/// Scan the shuffled neighbors of `location` in the current field and eat
/// the first living organism whose species is in the diet.
///
/// Side effect: the prey is marked dead in `current` immediately, and the
/// predator's food level is reset to that prey's food value. At most one
/// prey is eaten per call.
pub fn forage(
    predator: &Organism,
    config: &SpeciesConfig,
    current: &Field,
    location: Coordinate,
    rng: &mut impl Rng,
) -> Option<Meal> {
    for cell in current.adjacent_coordinates(location, rng) {
        let Some(prey) = current.organism_at(cell) else {
            continue;
        };
        if !prey.is_alive() {
            continue;
        }
        let Some(food_value) = config.food_value(prey.species()) else {
            continue;
        };
        prey.set_dead();
        predator.set_food_level(food_value);
        return Some(Meal {
            prey: prey.species(),
            location: cell,
        });
    }
    None
}

/// Whether any living predator of `prey` exists anywhere in `current`.
///
/// Unlike foraging this is not limited to neighbors.
pub fn is_eaten(prey: Species, species: &SpeciesTable, current: &Field) -> bool {
    let predators = species.predators_of(prey);
    if predators.is_empty() {
        return false;
    }
    current
        .organisms()
        .iter()
        .any(|o| o.is_alive() && predators.contains(&o.species()))
}

/// Maybe give birth into cells taken from `free`. Returns the number born.
///
/// Newborns go straight into `next` with age 0 and do not act until the
/// following step. The litter is capped by the cells left in `free`.
pub fn reproduce(
    parent: &Organism,
    config: &SpeciesConfig,
    next: &mut Field,
    free: &mut Vec<Coordinate>,
    rng: &mut impl Rng,
) -> u32 {
    if free.is_empty() || parent.age() < config.breeding_age {
        return 0;
    }
    if !rng.gen_bool(config.breeding_probability) {
        return 0;
    }

    let litter = rng.gen_range(1..=config.max_litter_size);
    let mut births = 0;
    while births < litter {
        let Some(cell) = take_free_cell(free, config.cell_choice, rng) else {
            break;
        };
        let young = spawn(parent.species(), config, cell, 0, rng);
        next.place(young, cell);
        births += 1;
    }
    births
}

/// Remove and return one cell from `free` according to `choice`.
pub fn take_free_cell(
    free: &mut Vec<Coordinate>,
    choice: CellChoice,
    rng: &mut impl Rng,
) -> Option<Coordinate> {
    if free.is_empty() {
        return None;
    }
    let idx = match choice {
        CellChoice::First => 0,
        CellChoice::Random => rng.gen_range(0..free.len()),
    };
    Some(free.remove(idx))
}

/// Create a new organism. Hungering species start with a random food level
/// below their richest food value.
pub fn spawn(
    species: Species,
    config: &SpeciesConfig,
    location: Coordinate,
    age: u32,
    rng: &mut impl Rng,
) -> OrganismRef {
    let max_food = config.max_food_value();
    let food_level = if config.hunger && max_food > 0 {
        rng.gen_range(0..max_food)
    } else {
        0
    };
    Organism::new(species, location, age, food_level)
}

/// Move to `preferred` if set, else to a free cell, else die.
fn settle(
    organism: &OrganismRef,
    preferred: Option<Coordinate>,
    free: &mut Vec<Coordinate>,
    choice: CellChoice,
    next: &mut Field,
    rng: &mut impl Rng,
) -> Fate {
    let destination = preferred.or_else(|| take_free_cell(free, choice, rng));
    match destination {
        Some(cell) => {
            organism.set_location(cell);
            next.place(Rc::clone(organism), cell);
            Fate::Survived
        }
        None => {
            organism.set_dead();
            Fate::Overcrowded
        }
    }
}

fn location_of(organism: &Organism) -> Coordinate {
    match organism.location() {
        Some(location) => location,
        None => panic!("living {} has no location", organism.species()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeMap;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn put(field: &mut Field, species: Species, row: usize, col: usize, age: u32, food: i32) -> OrganismRef {
        let coord = Coordinate::new(row, col);
        let organism = Organism::new(species, coord, age, food);
        field.place(Rc::clone(&organism), coord);
        organism
    }

    /// Hare that always breeds the largest possible litter.
    fn fertile_hares(litter: u32) -> SpeciesTable {
        let mut hare = SpeciesTable::default().get(Species::Hare).clone();
        hare.breeding_age = 0;
        hare.breeding_probability = 1.0;
        hare.max_litter_size = litter;
        SpeciesTable::with_overrides(BTreeMap::from([(Species::Hare, hare)]))
    }

    #[test]
    fn lone_consumer_in_single_cell_dies_from_crowding() {
        let table = SpeciesTable::default();
        let mut current = Field::new(1, 1);
        let hare = put(&mut current, Species::Hare, 0, 0, 0, 0);
        let mut next = Field::new(1, 1);

        let outcome = step(&hare, &table, &current, &mut next, &mut rng(1));

        assert_eq!(outcome.fate, Fate::Overcrowded);
        assert!(!hare.is_alive());
        assert!(next.is_empty());
    }

    #[test]
    fn old_age_kills_before_anything_else() {
        let table = SpeciesTable::default();
        let mut current = Field::new(3, 3);
        let max_age = table.get(Species::Deer).max_age;
        let deer = put(&mut current, Species::Deer, 1, 1, max_age, 0);
        let mut next = Field::new(3, 3);

        let outcome = step(&deer, &table, &current, &mut next, &mut rng(1));

        assert_eq!(outcome, StepOutcome::died(Fate::OldAge));
        assert!(next.is_empty());
    }

    #[test]
    fn starving_predator_dies_despite_free_space_and_prey() {
        let table = SpeciesTable::default();
        let mut current = Field::new(3, 3);
        let owl = put(&mut current, Species::Owl, 1, 1, 3, 1);
        let hare = put(&mut current, Species::Hare, 0, 0, 0, 0);
        let mut next = Field::new(3, 3);

        let outcome = step(&owl, &table, &current, &mut next, &mut rng(1));

        assert_eq!(outcome.fate, Fate::Starved);
        assert!(!owl.is_alive());
        assert!(hare.is_alive(), "A starved owl does not hunt");
        assert!(next.is_empty());
    }

    #[test]
    fn predator_eats_adjacent_prey_and_takes_its_cell() {
        let table = SpeciesTable::default();
        let mut current = Field::new(1, 2);
        let owl = put(&mut current, Species::Owl, 0, 0, 3, 5);
        let hare = put(&mut current, Species::Hare, 0, 1, 0, 0);
        let mut next = Field::new(1, 2);

        let outcome = step(&owl, &table, &current, &mut next, &mut rng(3));

        assert_eq!(
            outcome.meal,
            Some(Meal {
                prey: Species::Hare,
                location: Coordinate::new(0, 1)
            })
        );
        assert!(!hare.is_alive(), "Prey is marked dead in the current field");
        assert_eq!(hare.location(), None);
        assert_eq!(owl.food_level(), table.get(Species::Owl).food_value(Species::Hare).unwrap());
        assert_eq!(owl.location(), Some(Coordinate::new(0, 1)));
        assert!(Rc::ptr_eq(next.organism_at(Coordinate::new(0, 1)).unwrap(), &owl));
    }

    #[test]
    fn predator_eats_only_one_prey() {
        let table = SpeciesTable::default();
        let mut current = Field::new(3, 3);
        let owl = put(&mut current, Species::Owl, 1, 1, 3, 5);
        let hares: Vec<_> = [(0, 0), (0, 2), (2, 0), (2, 2)]
            .iter()
            .map(|&(r, c)| put(&mut current, Species::Hare, r, c, 0, 0))
            .collect();
        let mut next = Field::new(3, 3);

        step(&owl, &table, &current, &mut next, &mut rng(5));

        assert_eq!(hares.iter().filter(|h| !h.is_alive()).count(), 1);
    }

    #[test]
    fn predator_ignores_dead_and_non_diet_neighbors() {
        let table = SpeciesTable::default();
        let mut current = Field::new(1, 3);
        let owl = put(&mut current, Species::Owl, 0, 1, 3, 5);
        let deer = put(&mut current, Species::Deer, 0, 0, 3, 0);
        let corpse = put(&mut current, Species::Hare, 0, 2, 0, 0);
        corpse.set_dead();

        let meal = forage(&owl, table.get(Species::Owl), &current, Coordinate::new(0, 1), &mut rng(2));

        assert_eq!(meal, None);
        assert!(deer.is_alive());
        assert_eq!(owl.food_level(), 5);
    }

    #[test]
    fn prey_killed_earlier_in_step_is_seen_dead() {
        let table = SpeciesTable::default();
        let mut current = Field::new(1, 2);
        let owl = put(&mut current, Species::Owl, 0, 0, 3, 5);
        let hare = put(&mut current, Species::Hare, 0, 1, 0, 0);
        let mut next = Field::new(1, 2);
        let mut rng = rng(8);

        step(&owl, &table, &current, &mut next, &mut rng);

        let still_to_act: Vec<_> = current
            .organisms()
            .iter()
            .filter(|o| o.is_alive())
            .collect();
        assert_eq!(still_to_act.len(), 1);
        assert!(Rc::ptr_eq(still_to_act[0], &owl));
        assert!(!hare.is_alive());
    }

    #[test]
    fn producer_dies_when_any_consumer_of_it_lives() {
        let table = SpeciesTable::default();
        let mut current = Field::new(10, 10);
        let berry = put(&mut current, Species::Berry, 0, 0, 0, 0);
        // Far away: the eaten check is global, not neighbor-limited.
        put(&mut current, Species::Hare, 9, 9, 0, 0);
        let mut next = Field::new(10, 10);

        let outcome = step(&berry, &table, &current, &mut next, &mut rng(1));

        assert_eq!(outcome, StepOutcome::died(Fate::Eaten));
        assert!(!berry.is_alive());
        assert!(next.is_empty(), "An eaten producer neither spreads nor moves");
    }

    #[test]
    fn producer_survives_when_its_consumers_are_dead() {
        let table = SpeciesTable::default();
        let mut current = Field::new(3, 3);
        let acorn = put(&mut current, Species::Acorn, 1, 1, 0, 0);
        put(&mut current, Species::Deer, 0, 0, 0, 0).set_dead();
        let mut next = Field::new(3, 3);

        let outcome = step(&acorn, &table, &current, &mut next, &mut rng(4));

        assert_eq!(outcome.fate, Fate::Survived);
        assert_eq!(outcome.births, 1);
        assert_eq!(next.len(), 2);
        let spread = next
            .organisms()
            .iter()
            .find(|o| !Rc::ptr_eq(o, &acorn))
            .unwrap();
        assert_eq!(spread.age(), 0);
        assert_eq!(spread.species(), Species::Acorn);
        assert_ne!(spread.location(), acorn.location());
    }

    #[test]
    fn litter_capped_by_free_cells() {
        let table = fertile_hares(8);
        let mut current = Field::new(2, 2);
        let hare = put(&mut current, Species::Hare, 0, 0, 2, 0);
        let mut next = Field::new(2, 2);

        for seed in 0..20 {
            let mut next_try = Field::new(2, 2);
            let mut free = next_try.free_adjacent_coordinates(Coordinate::new(0, 0), &mut rng(seed));
            let births = reproduce(&hare, table.get(Species::Hare), &mut next_try, &mut free, &mut rng(seed));
            assert!(births <= 3, "Corner cell has only 3 free neighbors");
            assert_eq!(next_try.len() as u32, births);
        }

        let outcome = step(&hare, &table, &current, &mut next, &mut rng(0));
        assert!(next.len() <= 3);
        if outcome.births == 3 {
            assert_eq!(outcome.fate, Fate::Overcrowded, "Offspring filled every cell");
        }
    }

    #[test]
    fn parent_below_breeding_age_does_not_breed() {
        let mut hare_config = fertile_hares(4).get(Species::Hare).clone();
        hare_config.breeding_age = 3;
        let table = SpeciesTable::with_overrides(BTreeMap::from([(Species::Hare, hare_config)]));
        let mut current = Field::new(3, 3);
        let hare = put(&mut current, Species::Hare, 1, 1, 0, 0);
        let mut next = Field::new(3, 3);

        let outcome = step(&hare, &table, &current, &mut next, &mut rng(0));

        assert_eq!(outcome.births, 0);
        assert_eq!(outcome.fate, Fate::Survived);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn free_cells_reflect_partial_next_field() {
        let table = SpeciesTable::default();
        let mut current = Field::new(1, 2);
        let hare = put(&mut current, Species::Hare, 0, 0, 0, 0);
        let mut next = Field::new(1, 2);
        // Someone processed earlier already claimed the only neighbor.
        put(&mut next, Species::Deer, 0, 1, 0, 0);

        let outcome = step(&hare, &table, &current, &mut next, &mut rng(1));

        assert_eq!(outcome.fate, Fate::Overcrowded);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn first_choice_takes_head_of_list() {
        let mut free = vec![Coordinate::new(0, 1), Coordinate::new(1, 0)];
        let taken = take_free_cell(&mut free, CellChoice::First, &mut rng(0));
        assert_eq!(taken, Some(Coordinate::new(0, 1)));
        assert_eq!(free, vec![Coordinate::new(1, 0)]);
        assert_eq!(take_free_cell(&mut Vec::new(), CellChoice::Random, &mut rng(0)), None);
    }

    #[test]
    fn random_choice_varies() {
        let cells: Vec<Coordinate> = (0..8).map(|c| Coordinate::new(0, c)).collect();
        let mut rng = rng(11);
        let picks: std::collections::HashSet<_> = (0..50)
            .filter_map(|_| take_free_cell(&mut cells.clone(), CellChoice::Random, &mut rng))
            .collect();
        assert!(picks.len() > 1);
    }

    #[test]
    fn spawn_gives_hungry_species_food_below_max() {
        let table = SpeciesTable::default();
        let mut rng = rng(6);
        for _ in 0..50 {
            let bear = spawn(Species::Bear, table.get(Species::Bear), Coordinate::new(0, 0), 0, &mut rng);
            assert!((0..8).contains(&bear.food_level()));
        }
        let hare = spawn(Species::Hare, table.get(Species::Hare), Coordinate::new(0, 0), 0, &mut rng);
        assert_eq!(hare.food_level(), 0);
    }

    #[test]
    #[should_panic(expected = "dead")]
    fn stepping_dead_organism_panics() {
        let table = SpeciesTable::default();
        let mut current = Field::new(2, 2);
        let hare = put(&mut current, Species::Hare, 0, 0, 0, 0);
        hare.set_dead();
        let mut next = Field::new(2, 2);
        step(&hare, &table, &current, &mut next, &mut rng(0));
    }
}
