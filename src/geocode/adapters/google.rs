//! Google Geocoding API
//!
//! Success is signalled by the document's top-level `status == "OK"`; every
//! other status is a provider rejection, even over a successful HTTP response.

use serde_json::Value;

use super::rest::{build_url, require_credential, RestApi};
use crate::geocode::address::{AddressRecord, ProviderPayload};
use crate::geocode::error::GeocodeError;
use crate::geocode::types::{Coordinate, GeocodeResult, ProviderKind};

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const STATUS_OK: &str = "OK";

pub struct GoogleApi {
    endpoint: String,
    api_key: Option<String>,
}

impl GoogleApi {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

impl RestApi for GoogleApi {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn forward_url(&self, address: &str) -> Result<url::Url, GeocodeError> {
        let key = require_credential(self.api_key.as_deref(), ProviderKind::Google)?;
        build_url(&self.endpoint, &[("address", address), ("key", key)])
    }

    fn reverse_url(&self, coordinate: Coordinate) -> Result<url::Url, GeocodeError> {
        let key = require_credential(self.api_key.as_deref(), ProviderKind::Google)?;
        let latlng = coordinate.to_query_value();
        build_url(&self.endpoint, &[("latlng", latlng.as_str()), ("key", key)])
    }

    fn parse(&self, document: &Value) -> GeocodeResult {
        let status = document.get("status").and_then(Value::as_str).unwrap_or("");
        if status != STATUS_OK {
            if let Some(message) = document.get("error_message").and_then(Value::as_str) {
                log::warn!("[google] status {}: {}", status, message);
            }
            return Err(GeocodeError::ProviderRejected {
                provider: ProviderKind::Google,
                status: if status.is_empty() {
                    "missing status".to_string()
                } else {
                    status.to_string()
                },
            });
        }

        let results = document
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| GeocodeError::ParseFailure("missing results array".to_string()))?;

        Ok(results
            .iter()
            .filter_map(|result| AddressRecord::from_provider_payload(ProviderPayload::Google(result)))
            .collect())
    }
}
