//! Current-conditions lookup against a wttr.in compatible service.
//!
//! Configuration mirrors the command line:
//! - `HUELLA_WEATHER_URL` - Base URL (default: `https://wttr.in`)
//! - `HUELLA_WEATHER_TIMEOUT_SECS` - Request timeout (default: 5)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

pub const DEFAULT_WEATHER_URL: &str = "https://wttr.in";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Shown when the service answers with a non-success status.
pub const WEATHER_UNAVAILABLE: &str = "No se pudo obtener la información del clima";
/// Shown when the service cannot be reached at all.
pub const WEATHER_CONNECTION_ERROR: &str = "Error al conectar con el servicio del clima";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("could not reach weather service: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("weather service answered {0}")]
    Status(StatusCode),
    #[error("invalid weather URL {0:?}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait WeatherService {
    /// Short condition-and-temperature text for `city`.
    async fn current(&self, city: &str) -> Result<String, WeatherError>;
}

/// HTTP client for wttr.in style endpoints (`GET {base}/{city}?format=%C+%t`).
#[derive(Debug, Clone)]
pub struct WttrClient {
    base_url: String,
    client: Client,
}

impl WttrClient {
    /// Create a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn url_for(&self, city: &str) -> Result<Url, WeatherError> {
        let invalid = || WeatherError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .push(city.trim());
        url.set_query(Some("format=%C+%t"));
        Ok(url)
    }
}

#[async_trait]
impl WeatherService for WttrClient {
    async fn current(&self, city: &str) -> Result<String, WeatherError> {
        let url = self.url_for(city)?;
        log::debug!("fetching weather from {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| WeatherError::Network(Box::new(err)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status));
        }
        let body = response
            .text()
            .await
            .map_err(|err| WeatherError::Network(Box::new(err)))?;
        Ok(body.trim().to_string())
    }
}

/// Weather text for display. Never fails: errors become a fallback message.
pub async fn describe<W>(service: &W, city: &str) -> String
where
    W: WeatherService + ?Sized,
{
    match service.current(city).await {
        Ok(report) => report,
        Err(WeatherError::Status(status)) => {
            log::warn!("weather lookup for {city:?} answered {status}");
            WEATHER_UNAVAILABLE.to_string()
        }
        Err(err) => {
            log::warn!("weather lookup for {city:?} failed: {err}");
            WEATHER_CONNECTION_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(fn() -> Result<String, WeatherError>);

    #[async_trait]
    impl WeatherService for Scripted {
        async fn current(&self, _city: &str) -> Result<String, WeatherError> {
            (self.0)()
        }
    }

    #[test]
    fn url_encodes_city_and_keeps_format_query() {
        let client = WttrClient::new("https://wttr.in/", Duration::from_secs(1)).unwrap();
        let url = client.url_for(" San José ").unwrap();
        assert_eq!(url.as_str(), "https://wttr.in/San%20Jos%C3%A9?format=%C+%t");
    }

    #[test]
    fn rejects_unusable_base_url() {
        let client = WttrClient::new("not a url", Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.url_for("Lima"),
            Err(WeatherError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn describe_maps_failures_to_fallback_text() {
        let ok = Scripted(|| Ok("Soleado +21°C".to_string()));
        assert_eq!(describe(&ok, "Lima").await, "Soleado +21°C");

        let rejected = Scripted(|| Err(WeatherError::Status(StatusCode::SERVICE_UNAVAILABLE)));
        assert_eq!(describe(&rejected, "Lima").await, WEATHER_UNAVAILABLE);

        let down = Scripted(|| Err(WeatherError::Network("connection refused".into())));
        assert_eq!(describe(&down, "Lima").await, WEATHER_CONNECTION_ERROR);
    }

    #[tokio::test]
    async fn unreachable_host_reports_connection_error() {
        let client = WttrClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert_eq!(describe(&client, "Lima").await, WEATHER_CONNECTION_ERROR);
    }
}
