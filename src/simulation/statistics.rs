use serde::Serialize;

use crate::simulation::lifecycle::{Fate, StepOutcome};
use crate::world::{Field, PopulationCounts, Species};

/// Deaths during one step, by cause. Prey killed by a forager are counted in
/// [`StepTally::kills`] instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Deaths {
    pub old_age: u32,
    pub starved: u32,
    pub eaten: u32,
    pub overcrowded: u32,
}

/// What happened while one step was being built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepTally {
    /// Organisms that took a turn.
    pub acted: u32,
    pub births: u32,
    pub kills: u32,
    pub deaths: Deaths,
}

impl StepTally {
    pub fn record(&mut self, outcome: &StepOutcome) {
        self.acted += 1;
        self.births += outcome.births;
        if outcome.meal.is_some() {
            self.kills += 1;
        }
        match outcome.fate {
            Fate::Survived => {}
            Fate::OldAge => self.deaths.old_age += 1,
            Fate::Starved => self.deaths.starved += 1,
            Fate::Eaten => self.deaths.eaten += 1,
            Fate::Overcrowded => self.deaths.overcrowded += 1,
        }
    }
}

/// Per-step population snapshot handed to reporting.
#[derive(Debug, Clone, Serialize)]
pub struct StepStatistics {
    pub step: u64,
    pub counts: PopulationCounts,
    pub total: u32,
    pub viable: bool,
    pub tally: StepTally,
    pub step_duration_ms: f32,
}

/// Compute statistics for a field after a step.
pub fn compute_statistics(
    field: &Field,
    step: u64,
    viability: [Species; 2],
    tally: StepTally,
    step_duration_ms: f32,
) -> StepStatistics {
    let counts = field.population_counts();
    let total = counts.values().sum();
    StepStatistics {
        step,
        counts,
        total,
        viable: field.is_viable(viability[0], viability[1]),
        tally,
        step_duration_ms,
    }
}

/// One-line text report, e.g. `Step 3: Hares: 12  Wolves: 4  ...`.
pub fn summary_line(stats: &StepStatistics) -> String {
    let parts: Vec<String> = Species::ALL
        .iter()
        .map(|s| format!("{}: {}", s.label(), stats.counts.get(s).copied().unwrap_or(0)))
        .collect();
    format!("Step {}: {}", stats.step, parts.join("  "))
}
