//! Currency amounts

use serde::{Deserialize, Serialize};
use std::fmt;

const COPPER_PER_SILVER: u64 = 100;
const COPPER_PER_GOLD: u64 = 10_000;

/// An amount of in-game currency in copper (the minor unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Copper(pub u64);

impl Copper {
    pub fn gold(&self) -> u64 {
        self.0 / COPPER_PER_GOLD
    }

    pub fn silver(&self) -> u64 {
        (self.0 % COPPER_PER_GOLD) / COPPER_PER_SILVER
    }

    pub fn copper(&self) -> u64 {
        self.0 % COPPER_PER_SILVER
    }

    /// Signed percentage difference of `self` relative to `reference`
    ///
    /// Returns `None` when the reference is zero.
    pub fn percent_diff(&self, reference: Copper) -> Option<f64> {
        if reference.0 == 0 {
            return None;
        }
        Some((self.0 as f64 - reference.0 as f64) / reference.0 as f64 * 100.0)
    }

    /// Render an optional amount, using a dash for missing values
    pub fn display_opt(amount: Option<Copper>) -> String {
        match amount {
            Some(c) => c.to_string(),
            None => "—".to_string(),
        }
    }
}

impl From<u64> for Copper {
    fn from(v: u64) -> Self {
        Copper(v)
    }
}

impl fmt::Display for Copper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}g {}s {}c", self.gold(), self.silver(), self.copper())
    }
}
