use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::traits::HttpTransport;
use crate::configure::GeocoderConfig;
use crate::geocode::error::GeocodeError;

/// reqwest-backed transport with a pooled client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("geocoder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodeError::InternalFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        Self::new(
            Duration::from_millis(config.http_timeout_ms),
            Duration::from_millis(config.http_connect_timeout_ms),
        )
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: Url) -> Result<String, GeocodeError> {
        let response = self.client.get(url).send().await?;
        log::debug!("HTTP {} from {}", response.status(), response.url().host_str().unwrap_or("?"));
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_default_config() {
        let transport = ReqwestTransport::from_config(&GeocoderConfig::default());
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let transport =
            ReqwestTransport::new(Duration::from_millis(500), Duration::from_millis(500)).unwrap();
        // grab a free port, then close it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/geocode", port)).unwrap();
        let err = transport.get(url).await.unwrap_err();
        assert_eq!(err.error_code(), "TRANSPORT_FAILURE");
    }
}
