use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::world::coordinate::Coordinate;
use crate::world::species::Species;

/// Shared handle to an organism. The same instance may be referenced from the
/// current and the next field during a step.
pub type OrganismRef = Rc<Organism>;

/// One living (or formerly living) member of a species.
///
/// State is held in `Cell`s: a predator foraging in the current field marks
/// its prey dead through a shared reference, and that prey may still be
/// waiting for its own turn in the same step.
pub struct Organism {
    species: Species,
    alive: Cell<bool>,
    location: Cell<Option<Coordinate>>,
    age: Cell<u32>,
    food_level: Cell<i32>,
}

impl Organism {
    pub fn new(species: Species, location: Coordinate, age: u32, food_level: i32) -> OrganismRef {
        Rc::new(Organism {
            species,
            alive: Cell::new(true),
            location: Cell::new(Some(location)),
            age: Cell::new(age),
            food_level: Cell::new(food_level),
        })
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Present iff the organism is alive.
    pub fn location(&self) -> Option<Coordinate> {
        self.location.get()
    }

    pub fn age(&self) -> u32 {
        self.age.get()
    }

    pub fn food_level(&self) -> i32 {
        self.food_level.get()
    }

    /// Terminal transition. Clears the location.
    pub fn set_dead(&self) {
        self.alive.set(false);
        self.location.set(None);
    }

    pub(crate) fn set_location(&self, location: Coordinate) {
        debug_assert!(self.is_alive(), "cannot relocate a dead {}", self.species);
        self.location.set(Some(location));
    }

    pub(crate) fn set_food_level(&self, food_level: i32) {
        self.food_level.set(food_level);
    }

    /// Age by one step. Returns `false` if the organism died of old age.
    pub(crate) fn grow_older(&self, max_age: u32) -> bool {
        let age = self.age.get().saturating_add(1);
        self.age.set(age);
        if age > max_age {
            self.set_dead();
            return false;
        }
        true
    }

    /// Burn one unit of food. Returns `false` if the organism starved.
    pub(crate) fn grow_hungrier(&self) -> bool {
        let food = self.food_level.get().saturating_sub(1);
        self.food_level.set(food);
        if food <= 0 {
            self.set_dead();
            return false;
        }
        true
    }
}

impl fmt::Debug for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Organism")
            .field("species", &self.species)
            .field("alive", &self.is_alive())
            .field("location", &self.location())
            .field("age", &self.age())
            .field("food_level", &self.food_level())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_organism_is_alive_at_location() {
        let hare = Organism::new(Species::Hare, Coordinate::new(1, 2), 0, 0);
        assert!(hare.is_alive());
        assert_eq!(hare.location(), Some(Coordinate::new(1, 2)));
    }

    #[test]
    fn set_dead_clears_location() {
        let hare = Organism::new(Species::Hare, Coordinate::new(1, 2), 0, 0);
        hare.set_dead();
        assert!(!hare.is_alive());
        assert_eq!(hare.location(), None);
    }

    #[test]
    fn dies_only_when_age_exceeds_max() {
        let deer = Organism::new(Species::Deer, Coordinate::new(0, 0), 11, 0);
        assert!(deer.grow_older(12));
        assert_eq!(deer.age(), 12);
        assert!(!deer.grow_older(12));
        assert!(!deer.is_alive());
    }

    #[test]
    fn starves_at_zero_food() {
        let owl = Organism::new(Species::Owl, Coordinate::new(0, 0), 3, 2);
        assert!(owl.grow_hungrier());
        assert!(!owl.grow_hungrier());
        assert!(!owl.is_alive());
        assert_eq!(owl.location(), None);
    }

    #[test]
    fn shared_handle_observes_death() {
        let prey = Organism::new(Species::Hare, Coordinate::new(0, 0), 0, 0);
        let held_by_field = Rc::clone(&prey);
        prey.set_dead();
        assert!(!held_by_field.is_alive());
    }
}
