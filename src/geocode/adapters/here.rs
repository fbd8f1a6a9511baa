//! HERE Geocoder API (6.2)
//!
//! Success is structural: the document must carry `Response.View[0].Result`.

use serde_json::Value;

use super::rest::{build_url, require_credential, RestApi};
use crate::geocode::address::{AddressRecord, ProviderPayload};
use crate::geocode::error::GeocodeError;
use crate::geocode::types::{Coordinate, GeocodeResult, ProviderKind};

pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://geocoder.ls.hereapi.com/6.2/geocode.json";
pub const DEFAULT_REVERSE_ENDPOINT: &str =
    "https://reverse.geocoder.ls.hereapi.com/6.2/reversegeocode.json";
pub const DEFAULT_REVERSE_RADIUS_M: u32 = 250;

const RESULTS_POINTER: &str = "/Response/View/0/Result";
const GENERATION: &str = "9";

pub struct HereApi {
    geocode_endpoint: String,
    reverse_endpoint: String,
    reverse_radius_m: u32,
    api_key: Option<String>,
}

impl HereApi {
    pub fn new(
        geocode_endpoint: impl Into<String>,
        reverse_endpoint: impl Into<String>,
        reverse_radius_m: u32,
        api_key: Option<String>,
    ) -> Self {
        Self {
            geocode_endpoint: geocode_endpoint.into(),
            reverse_endpoint: reverse_endpoint.into(),
            reverse_radius_m,
            api_key,
        }
    }
}

impl RestApi for HereApi {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Here
    }

    fn forward_url(&self, address: &str) -> Result<url::Url, GeocodeError> {
        let key = require_credential(self.api_key.as_deref(), ProviderKind::Here)?;
        build_url(
            &self.geocode_endpoint,
            &[("searchtext", address), ("apiKey", key), ("gen", GENERATION)],
        )
    }

    fn reverse_url(&self, coordinate: Coordinate) -> Result<url::Url, GeocodeError> {
        let key = require_credential(self.api_key.as_deref(), ProviderKind::Here)?;
        let prox = format!("{},{}", coordinate.to_query_value(), self.reverse_radius_m);
        build_url(
            &self.reverse_endpoint,
            &[
                ("prox", prox.as_str()),
                ("mode", "retrieveAddresses"),
                ("maxresults", "1"),
                ("apiKey", key),
                ("gen", GENERATION),
            ],
        )
    }

    fn parse(&self, document: &Value) -> GeocodeResult {
        let results = document
            .pointer(RESULTS_POINTER)
            .and_then(Value::as_array)
            .ok_or_else(|| GeocodeError::ProviderRejected {
                provider: ProviderKind::Here,
                status: "missing Response.View[0].Result".to_string(),
            })?;

        Ok(results
            .iter()
            .filter_map(|result| AddressRecord::from_provider_payload(ProviderPayload::Here(result)))
            .collect())
    }
}
