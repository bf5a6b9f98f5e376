use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::measurements::Measurements;
use crate::service::{PredictResponse, PredictionService};

pub struct HttpPredictionService {
    client: Client,
    predict_url: Url,
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HttpPredictionService {
    pub fn new(predict_url: Url, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("building http client")?;
        Ok(Self { client, predict_url })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    /// Root of the backend origin, where the liveness route lives.
    pub fn health_url(&self) -> Result<Url> {
        self.predict_url
            .join("/")
            .with_context(|| format!("deriving health url from {}", self.predict_url))
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let resp = self.client.get(self.health_url()?).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("health check returned {}", status));
        }
        Ok(resp.json::<HealthStatus>().await?)
    }
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn predict(&self, input: &Measurements) -> Result<PredictResponse> {
        let resp = self
            .client
            .post(self.predict_url.clone())
            .json(input)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(anyhow!(
                "predict returned {}: {}",
                status,
                String::from_utf8_lossy(&body).chars().take(200).collect::<String>()
            ));
        }
        PredictResponse::from_json(&body)
    }
}
