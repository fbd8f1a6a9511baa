//! Platform-native geocoder adapter
//!
//! The operating system's geocoding service is an opaque capability: the host
//! application supplies a [`NativeGeocoder`] implementation, this adapter only
//! normalizes its placemarks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::traits::ProviderAdapter;
use crate::geocode::address::{AddressRecord, ProviderPayload};
use crate::geocode::error::GeocodeError;
use crate::geocode::types::{Coordinate, GeocodeResult, ProviderKind};

/// Structured placemark as reported by the OS geocoder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub location: Option<Coordinate>,
    pub name: Option<String>,
    pub thoroughfare: Option<String>,
    pub sub_thoroughfare: Option<String>,
    pub locality: Option<String>,
    pub sub_locality: Option<String>,
    pub administrative_area: Option<String>,
    pub sub_administrative_area: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub iso_country_code: Option<String>,
}

/// The OS geocoding service
#[async_trait]
pub trait NativeGeocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Vec<Placemark>, String>;

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<Placemark>, String>;

    /// Locale-aware mailing address, when the platform has a formatter
    fn format_postal_address(&self, _placemark: &Placemark) -> Option<String> {
        None
    }
}

/// Adapter over an optional native geocoder
///
/// Without an installed geocoder every attempt fails with `InternalFailure`,
/// which still lets the request fall back to a REST provider.
pub struct PlatformAdapter {
    geocoder: Option<Arc<dyn NativeGeocoder>>,
}

impl PlatformAdapter {
    pub fn new(geocoder: Option<Arc<dyn NativeGeocoder>>) -> Self {
        Self { geocoder }
    }

    fn geocoder(&self) -> Result<&dyn NativeGeocoder, GeocodeError> {
        self.geocoder
            .as_deref()
            .ok_or_else(|| GeocodeError::InternalFailure("platform geocoder not available".to_string()))
    }

    fn normalize(
        geocoder: &dyn NativeGeocoder,
        outcome: Result<Vec<Placemark>, String>,
    ) -> GeocodeResult {
        let placemarks = outcome.map_err(|reason| {
            log::warn!("[platform] geocoder failed: {}", reason);
            GeocodeError::ProviderRejected {
                provider: ProviderKind::Platform,
                status: reason,
            }
        })?;

        Ok(placemarks
            .iter()
            .filter_map(|placemark| {
                let formatted = geocoder.format_postal_address(placemark);
                AddressRecord::from_provider_payload(ProviderPayload::Placemark(
                    placemark,
                    formatted.as_deref(),
                ))
            })
            .collect())
    }
}

#[async_trait]
impl ProviderAdapter for PlatformAdapter {
    async fn geocode(&self, address: &str) -> GeocodeResult {
        let geocoder = self.geocoder()?;
        log::debug!("[platform] geocode");
        let outcome = geocoder.geocode(address).await;
        Self::normalize(geocoder, outcome)
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> GeocodeResult {
        let geocoder = self.geocoder()?;
        log::debug!("[platform] reverse geocode {}", coordinate);
        let outcome = geocoder.reverse_geocode(coordinate).await;
        Self::normalize(geocoder, outcome)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Platform
    }
}
