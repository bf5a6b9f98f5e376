//! Species catalogue: class index / label mapping, display colors and the
//! mean-measurement profiles drawn on the radar chart.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Setosa,
    Versicolor,
    Virginica,
}

impl Species {
    /// Backend class order.
    pub const ALL: [Species; 3] = [Species::Setosa, Species::Versicolor, Species::Virginica];

    pub fn from_index(index: u64) -> Result<Self> {
        Species::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| anyhow!("class index {} out of range", index))
    }

    /// Accepts `Iris-setosa` or `setosa`, any case.
    pub fn from_label(label: &str) -> Result<Self> {
        let lower = label.trim().to_lowercase();
        let short = lower.strip_prefix("iris-").unwrap_or(&lower);
        Species::ALL
            .into_iter()
            .find(|s| s.short_name() == short)
            .ok_or_else(|| anyhow!("unknown species label {:?}", label))
    }

    pub fn index(&self) -> usize {
        match self {
            Species::Setosa => 0,
            Species::Versicolor => 1,
            Species::Virginica => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Species::Setosa => "Iris-setosa",
            Species::Versicolor => "Iris-versicolor",
            Species::Virginica => "Iris-virginica",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Species::Setosa => "setosa",
            Species::Versicolor => "versicolor",
            Species::Virginica => "virginica",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Species::Setosa => "#00f2ff",
            Species::Versicolor => "#7a3cff",
            Species::Virginica => "#ff2e88",
        }
    }

    /// Mean (SL, SW, PL, PW) of the species.
    pub fn profile(&self) -> [f64; 4] {
        match self {
            Species::Setosa => [5.01, 3.43, 1.46, 0.25],
            Species::Versicolor => [5.94, 2.77, 4.26, 1.33],
            Species::Virginica => [6.59, 2.97, 5.55, 2.03],
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
