use std::fmt;

use serde::{Deserialize, Serialize};

/// Every species the forest model knows about.
///
/// Behavior is not attached to the variant; it is read from the
/// [`SpeciesTable`](crate::config::species::SpeciesTable) at step time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Hare,
    Wolf,
    Deer,
    Owl,
    Bear,
    Berry,
    Acorn,
}

impl Species {
    /// All species in reporting order.
    pub const ALL: [Species; 7] = [
        Species::Hare,
        Species::Wolf,
        Species::Deer,
        Species::Owl,
        Species::Bear,
        Species::Berry,
        Species::Acorn,
    ];

    /// Lowercase name as used in config files.
    pub fn name(self) -> &'static str {
        match self {
            Species::Hare => "hare",
            Species::Wolf => "wolf",
            Species::Deer => "deer",
            Species::Owl => "owl",
            Species::Bear => "bear",
            Species::Berry => "berry",
            Species::Acorn => "acorn",
        }
    }

    /// Plural label for population reports.
    pub fn label(self) -> &'static str {
        match self {
            Species::Hare => "Hares",
            Species::Wolf => "Wolves",
            Species::Deer => "Deer",
            Species::Owl => "Owls",
            Species::Bear => "Bears",
            Species::Berry => "Berries",
            Species::Acorn => "Acorns",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_name() {
        for species in Species::ALL {
            let json = serde_json::to_string(&species).unwrap();
            assert_eq!(json, format!("\"{}\"", species.name()));
        }
    }

    #[test]
    fn all_is_unique() {
        let mut sorted = Species::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), Species::ALL.len());
    }
}
