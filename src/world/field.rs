use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::world::coordinate::Coordinate;
use crate::world::organism::OrganismRef;
use crate::world::species::Species;

/// Alive organisms per species, zero-filled for every known species.
pub type PopulationCounts = BTreeMap<Species, u32>;

/// Moore neighborhood offsets, excluding the center cell.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A rectangular grid holding at most one organism per cell.
///
/// Two views are kept consistent: the coordinate map and the flat list of
/// organisms in placement order. The list order is the order organisms act
/// in on the following step.
pub struct Field {
    depth: usize,
    width: usize,
    cells: HashMap<Coordinate, OrganismRef>,
    organisms: Vec<OrganismRef>,
}

impl Field {
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(depth: usize, width: usize) -> Self {
        assert!(depth > 0, "Field depth must be at least 1");
        assert!(width > 0, "Field width must be at least 1");
        Field {
            depth,
            width,
            cells: HashMap::new(),
            organisms: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.row < self.depth && coord.col < self.width
    }

    /// Bind `organism` to `coord`.
    ///
    /// A previous occupant is evicted from this field without touching its
    /// alive flag: it may remain alive yet belong to no field.
    ///
    /// # Panics
    /// Panics if `coord` lies outside the field.
    pub fn place(&mut self, organism: OrganismRef, coord: Coordinate) {
        assert!(
            self.contains(coord),
            "placement at {} outside {}x{} field",
            coord,
            self.depth,
            self.width
        );
        if let Some(evicted) = self.cells.insert(coord, Rc::clone(&organism)) {
            if let Some(idx) = self.organisms.iter().position(|o| Rc::ptr_eq(o, &evicted)) {
                self.organisms.remove(idx);
            }
        }
        self.organisms.push(organism);
    }

    pub fn organism_at(&self, coord: Coordinate) -> Option<&OrganismRef> {
        self.cells.get(&coord)
    }

    /// In-bounds Moore neighbors of `coord`, shuffled with `rng`.
    ///
    /// Callers that take "the first" neighbor rely on this shuffle.
    pub fn adjacent_coordinates(&self, coord: Coordinate, rng: &mut impl Rng) -> Vec<Coordinate> {
        let mut adjacent: Vec<Coordinate> = NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|&(dr, dc)| coord.offset(dr, dc))
            .filter(|&c| self.contains(c))
            .collect();
        adjacent.shuffle(rng);
        adjacent
    }

    /// Neighbors that are empty, or hold a dead organism, in this field as it
    /// stands right now. Mid-step on the next field this reflects only what
    /// has been placed so far.
    pub fn free_adjacent_coordinates(
        &self,
        coord: Coordinate,
        rng: &mut impl Rng,
    ) -> Vec<Coordinate> {
        self.adjacent_coordinates(coord, rng)
            .into_iter()
            .filter(|c| self.organism_at(*c).is_none_or(|o| !o.is_alive()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.organisms.clear();
    }

    /// Organisms tracked by this field, in placement order.
    pub fn organisms(&self) -> &[OrganismRef] {
        &self.organisms
    }

    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    pub fn population_counts(&self) -> PopulationCounts {
        let mut counts: PopulationCounts = Species::ALL.iter().map(|&s| (s, 0)).collect();
        for organism in self.organisms.iter().filter(|o| o.is_alive()) {
            *counts.entry(organism.species()).or_insert(0) += 1;
        }
        counts
    }

    /// True once a living `first` and a living `second` have both been seen.
    pub fn is_viable(&self, first: Species, second: Species) -> bool {
        let mut first_found = false;
        let mut second_found = false;
        for organism in &self.organisms {
            if first_found && second_found {
                break;
            }
            if !organism.is_alive() {
                continue;
            }
            let species = organism.species();
            if species == first {
                first_found = true;
            }
            if species == second {
                second_found = true;
            }
        }
        first_found && second_found
    }
}
