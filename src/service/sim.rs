use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use tokio::time::{sleep, Duration};

use crate::measurements::Measurements;
use crate::service::{PredictResponse, PredictionService, Probabilities};
use crate::species::Species;

/// Offline nearest-profile classifier with a random response delay.
pub struct SimulatedService {
    latency_ms: (u64, u64),
}

impl SimulatedService {
    pub fn new(latency_ms: (u64, u64)) -> Self {
        Self { latency_ms }
    }

    fn delay(&self) -> Duration {
        let (lo, hi) = self.latency_ms;
        if hi <= lo {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

/// Softmax over negative squared distance to each species profile.
pub fn classify(input: &Measurements) -> PredictResponse {
    let x = input.as_array();
    let scores = Species::ALL.map(|s| {
        let d2: f64 = s.profile().iter().zip(x.iter()).map(|(p, v)| (p - v).powi(2)).sum();
        -d2
    });
    let top = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = scores.map(|s| (s - top).exp());
    let total: f64 = exp.iter().sum();
    let p = exp.map(|e| e / total);

    let best = (0..3)
        .max_by(|&a, &b| p[a].total_cmp(&p[b]))
        .unwrap_or(0);
    PredictResponse {
        species: Species::ALL[best],
        probabilities: Probabilities {
            setosa: p[0],
            versicolor: p[1],
            virginica: p[2],
        },
    }
}

#[async_trait]
impl PredictionService for SimulatedService {
    async fn predict(&self, input: &Measurements) -> Result<PredictResponse> {
        sleep(self.delay()).await;
        Ok(classify(input))
    }
}
