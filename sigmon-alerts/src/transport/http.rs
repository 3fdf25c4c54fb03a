//! HTTP bulk reader for the monitoring service
//!
//! `GET {api_base_url}/data` returns a JSON array of measurement records.
//! Records that fail to decode are skipped individually so one bad form
//! submission does not hide every other site's status.

use async_trait::async_trait;
use sigmon_common::config::TomlConfig;
use sigmon_common::{Measurement, TransportError};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::MeasurementSource;

const USER_AGENT: &str = concat!("sigmon-alerts/", env!("CARGO_PKG_VERSION"));

/// Reads all measurements with one GET request
pub struct HttpMeasurementSource {
    http_client: reqwest::Client,
    data_url: String,
}

impl HttpMeasurementSource {
    pub fn new(data_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            data_url: data_url.into(),
        })
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self, TransportError> {
        Self::new(config.data_url(), config.request_timeout())
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

#[async_trait]
impl MeasurementSource for HttpMeasurementSource {
    async fn fetch_all(&self) -> Result<Vec<Measurement>, TransportError> {
        debug!(url = %self.data_url, "Fetching measurements");

        let response = self
            .http_client
            .get(&self.data_url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TransportError::Status(status.as_u16(), error_text));
        }

        let records: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))?;

        let total = records.len();
        let measurements = decode_records(records);

        info!(
            url = %self.data_url,
            received = total,
            decoded = measurements.len(),
            "Measurement fetch successful"
        );

        Ok(measurements)
    }
}

/// Decode each record independently, dropping malformed ones
pub fn decode_records(records: Vec<serde_json::Value>) -> Vec<Measurement> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match Measurement::from_json_value(value) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(index, "Skipping record: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let source = HttpMeasurementSource::from_config(&TomlConfig::default()).unwrap();
        assert_eq!(source.data_url(), "https://api.ocrapp.biz.id/data");
    }

    #[test]
    fn test_decode_records_skips_malformed() {
        let records = vec![
            json!({
                "daerah": "Bandung", "kecamatan": "Coblong",
                "power": 40, "cn": 22, "mer": 29, "linkMargin": 7,
                "audioVideo": "Tampil", "lat": 0, "lon": 0,
                "date": "2025-03-01T08:00:00Z", "user_name": "a"
            }),
            json!({ "daerah": "Broken" }),
            json!({
                "daerah": "Garut", "kecamatan": "Tarogong",
                "power": 50, "cn": 22, "mer": 29, "linkMargin": 7,
                "audioVideo": "Tidak Tampil", "lat": 0, "lon": 0,
                "date": "2025-03-01T09:00:00Z", "user_name": "b"
            }),
        ];

        let decoded = decode_records(records);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].region, "Bandung");
        assert_eq!(decoded[1].region, "Garut");
    }
}
