//! Shared REST provider adapter
//!
//! A REST backend only has to say how to build its URLs and how to read its
//! response document; fetching and JSON decoding live here, once.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use super::traits::{HttpTransport, ProviderAdapter};
use crate::geocode::error::GeocodeError;
use crate::geocode::types::{Coordinate, GeocodeResult, ProviderKind};

/// Per-provider REST capability: build request, parse payload
pub trait RestApi: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn forward_url(&self, address: &str) -> Result<Url, GeocodeError>;

    fn reverse_url(&self, coordinate: Coordinate) -> Result<Url, GeocodeError>;

    /// Turn a decoded response document into records, or reject it
    fn parse(&self, document: &Value) -> GeocodeResult;
}

/// Builds `endpoint?k=v&...` with form-encoded values
pub(crate) fn build_url(endpoint: &str, params: &[(&str, &str)]) -> Result<Url, GeocodeError> {
    Ok(Url::parse_with_params(endpoint, params)?)
}

/// Credential or `MissingCredential` for `kind`
pub(crate) fn require_credential(
    credential: Option<&str>,
    kind: ProviderKind,
) -> Result<&str, GeocodeError> {
    match credential {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(GeocodeError::MissingCredential(kind)),
    }
}

/// [`ProviderAdapter`] over any [`RestApi`]
pub struct RestAdapter<A> {
    api: A,
    transport: Arc<dyn HttpTransport>,
}

impl<A: RestApi> RestAdapter<A> {
    pub fn new(api: A, transport: Arc<dyn HttpTransport>) -> Self {
        Self { api, transport }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    async fn fetch(&self, url: Url) -> GeocodeResult {
        log::debug!(
            "[{}] GET {}{}",
            self.api.kind(),
            url.host_str().unwrap_or(""),
            url.path()
        );

        let body = self.transport.get(url).await?;
        let document: Value = serde_json::from_str(&body)?;
        let records = self.api.parse(&document)?;

        log::debug!("[{}] {} record(s)", self.api.kind(), records.len());
        Ok(records)
    }
}

#[async_trait]
impl<A: RestApi> ProviderAdapter for RestAdapter<A> {
    async fn geocode(&self, address: &str) -> GeocodeResult {
        let url = self.api.forward_url(address)?;
        self.fetch(url).await
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> GeocodeResult {
        let url = self.api.reverse_url(coordinate)?;
        self.fetch(url).await
    }

    fn kind(&self) -> ProviderKind {
        self.api.kind()
    }
}
