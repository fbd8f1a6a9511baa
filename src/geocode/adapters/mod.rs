//! Adapters module - one adapter per geocoding backend

pub mod traits;
pub mod http;
pub mod rest;
pub mod google;
pub mod here;
pub mod platform;
pub mod mock;

use std::fmt;
use std::sync::Arc;

pub use traits::{HttpTransport, ProviderAdapter};
pub use http::ReqwestTransport;
pub use rest::{RestAdapter, RestApi};
pub use google::GoogleApi;
pub use here::HereApi;
pub use platform::{NativeGeocoder, Placemark, PlatformAdapter};
pub use mock::{MockNativeGeocoder, MockResponse, MockTransport};

use crate::configure::GeocoderConfig;
use crate::geocode::types::ProviderKind;

/// Remote provider credentials, snapshotted into each request at creation
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub google_api_key: Option<String>,
    pub here_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("here_api_key", &redact(&self.here_api_key))
            .finish()
    }
}

/// Builds the adapter for a provider kind from endpoints and a credential snapshot
pub struct ProviderFactory {
    transport: Arc<dyn HttpTransport>,
    native: Option<Arc<dyn NativeGeocoder>>,
    google_endpoint: String,
    here_geocode_endpoint: String,
    here_reverse_endpoint: String,
    here_reverse_radius_m: u32,
}

impl ProviderFactory {
    pub fn new(
        config: &GeocoderConfig,
        transport: Arc<dyn HttpTransport>,
        native: Option<Arc<dyn NativeGeocoder>>,
    ) -> Self {
        Self {
            transport,
            native,
            google_endpoint: config.google_endpoint.clone(),
            here_geocode_endpoint: config.here_geocode_endpoint.clone(),
            here_reverse_endpoint: config.here_reverse_endpoint.clone(),
            here_reverse_radius_m: config.here_reverse_radius_m,
        }
    }

    pub fn adapter(&self, kind: ProviderKind, credentials: &Credentials) -> Arc<dyn ProviderAdapter> {
        match kind {
            ProviderKind::Platform => Arc::new(PlatformAdapter::new(self.native.clone())),
            ProviderKind::Google => Arc::new(RestAdapter::new(
                GoogleApi::new(self.google_endpoint.clone(), credentials.google_api_key.clone()),
                self.transport.clone(),
            )),
            ProviderKind::Here => Arc::new(RestAdapter::new(
                HereApi::new(
                    self.here_geocode_endpoint.clone(),
                    self.here_reverse_endpoint.clone(),
                    self.here_reverse_radius_m,
                    credentials.here_api_key.clone(),
                ),
                self.transport.clone(),
            )),
        }
    }
}
