//! Prediction service collaborators.
//!
//! The dispatcher only sees the [`PredictionService`] trait. The HTTP client
//! talks to the hosted classifier; the simulated service classifies locally
//! with configurable latency so overlapping requests can be exercised offline.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::measurements::Measurements;
use crate::species::Species;

mod http;
mod sim;
pub mod retry;

pub use http::HttpPredictionService;
pub use sim::{classify, SimulatedService};

/// Class-name to probability mapping as returned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub setosa: f64,
    pub versicolor: f64,
    pub virginica: f64,
}

impl Probabilities {
    pub fn as_array(&self) -> [f64; 3] {
        [self.setosa, self.versicolor, self.virginica]
    }

    pub fn get(&self, species: Species) -> f64 {
        self.as_array()[species.index()]
    }

    pub fn max(&self) -> f64 {
        self.as_array().into_iter().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// `prediction` is either a class index or a label depending on how the
/// backend model was trained.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WirePrediction {
    Index(u64),
    Float(f64),
    Label(String),
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    prediction: WirePrediction,
    probabilities: Probabilities,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictResponse {
    pub species: Species,
    pub probabilities: Probabilities,
}

impl PredictResponse {
    /// Decodes a backend body. Unknown classes are malformed responses.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let wire: WireResponse = serde_json::from_slice(body)?;
        let species = match wire.prediction {
            WirePrediction::Index(i) => Species::from_index(i)?,
            WirePrediction::Float(f) if !f.is_finite() || f.fract() != 0.0 => {
                return Err(anyhow!("non-integral class index {}", f))
            }
            WirePrediction::Float(f) if f < 0.0 => {
                return Err(anyhow!("class index {} out of range", f))
            }
            WirePrediction::Float(f) => Species::from_index(f as u64)?,
            WirePrediction::Label(label) => Species::from_label(&label)?,
        };
        Ok(Self { species, probabilities: wire.probabilities })
    }
}

#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, input: &Measurements) -> Result<PredictResponse>;
}
