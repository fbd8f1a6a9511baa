//! Provider adapter traits
//!
//! Defines the interface the request state machine drives, and the transport
//! seam the REST providers are built on.

use async_trait::async_trait;
use url::Url;

use crate::geocode::error::GeocodeError;
use crate::geocode::types::{Coordinate, GeocodeQuery, GeocodeResult, ProviderKind};

/// Provider adapter trait - implemented once per geocoding backend
///
/// Each call performs exactly one provider round trip. Dropping the returned
/// future abandons the call; that is how an in-flight attempt is cancelled.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Forward geocode address text into normalized records
    async fn geocode(&self, address: &str) -> GeocodeResult;

    /// Reverse geocode a coordinate into normalized records
    async fn reverse_geocode(&self, coordinate: Coordinate) -> GeocodeResult;

    /// Which backend this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Dispatch a query to the forward or reverse operation
    ///
    /// Inputs are expected to be validated already; an absent input is
    /// reported with the matching validation error.
    async fn lookup(&self, query: &GeocodeQuery) -> GeocodeResult {
        match query {
            GeocodeQuery::Forward(Some(address)) => self.geocode(address).await,
            GeocodeQuery::Reverse(Some(coordinate)) => self.reverse_geocode(*coordinate).await,
            GeocodeQuery::Forward(None) => Err(GeocodeError::InvalidAddressInput),
            GeocodeQuery::Reverse(None) => Err(GeocodeError::InvalidCoordinateInput),
        }
    }
}

/// Minimal async HTTP GET used by the REST providers
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// Network-level errors are reported as `TransportFailure`. Status codes
    /// are not interpreted: the body always goes to the provider's parser.
    async fn get(&self, url: Url) -> Result<String, GeocodeError>;
}
