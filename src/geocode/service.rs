//! Geocode Service
//!
//! Public facade over the single-flight queue. Construct one per process and
//! hand out references; each call supersedes whatever request is current.
//!
//! Only the most recently admitted request's callback fires under normal
//! operation. A superseded request that completes in the narrow window before
//! its cancellation is observed may still deliver: this is best-effort, not a
//! guarantee.

use std::sync::{Arc, RwLock};
use tokio::sync::oneshot;

use crate::configure::GeocoderConfig;
use crate::geocode::adapters::{
    Credentials, HttpTransport, NativeGeocoder, ProviderFactory, ReqwestTransport,
};
use crate::geocode::error::GeocodeError;
use crate::geocode::request::GeocodeRequest;
use crate::geocode::types::{Coordinate, GeocodeCallback, GeocodeQuery, GeocodeResult, ProviderKind};
use crate::geocode::worker::RequestQueue;

pub struct GeocodeService {
    queue: RequestQueue,
    factory: ProviderFactory,
    credentials: RwLock<Credentials>,
}

impl GeocodeService {
    /// Create the service and spawn its worker task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: &GeocoderConfig,
        transport: Arc<dyn HttpTransport>,
        native: Option<Arc<dyn NativeGeocoder>>,
    ) -> Self {
        let (queue, worker) = RequestQueue::new();
        worker.spawn();

        log::info!(
            "Geocode service ready (google key: {}, here key: {}, platform geocoder: {})",
            config.google_api_key.is_some(),
            config.here_api_key.is_some(),
            native.is_some()
        );

        Self {
            queue,
            factory: ProviderFactory::new(config, transport, native),
            credentials: RwLock::new(Credentials {
                google_api_key: config.google_api_key.clone(),
                here_api_key: config.here_api_key.clone(),
            }),
        }
    }

    /// Service with a reqwest transport and no platform geocoder
    pub fn from_config(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let transport = ReqwestTransport::from_config(config)?;
        Ok(Self::new(config, Arc::new(transport), None))
    }

    /// Forward geocode `address`; an empty address reports `InvalidAddressInput`
    pub fn geocode<F>(
        &self,
        address: &str,
        service: ProviderKind,
        alternative: Option<ProviderKind>,
        callback: F,
    ) where
        F: FnOnce(GeocodeResult) + Send + 'static,
    {
        self.submit(
            GeocodeQuery::Forward(Some(address.to_string())),
            service,
            alternative,
            Box::new(callback),
        );
    }

    /// Reverse geocode `coordinate`; out-of-range or sentinel input reports `InvalidCoordinateInput`
    pub fn reverse_geocode<F>(
        &self,
        coordinate: Coordinate,
        service: ProviderKind,
        alternative: Option<ProviderKind>,
        callback: F,
    ) where
        F: FnOnce(GeocodeResult) + Send + 'static,
    {
        self.submit(
            GeocodeQuery::Reverse(Some(coordinate)),
            service,
            alternative,
            Box::new(callback),
        );
    }

    /// Admit a request for `query`, cancelling the current one
    pub fn submit(
        &self,
        query: GeocodeQuery,
        service: ProviderKind,
        alternative: Option<ProviderKind>,
        callback: GeocodeCallback,
    ) {
        let credentials = self.credentials();
        let primary = self.factory.adapter(service, &credentials);
        let alternative = alternative.map(|kind| self.factory.adapter(kind, &credentials));

        let request = Arc::new(GeocodeRequest::new(query, primary, alternative, callback));
        log::info!(
            "Admitting {} on {} (fallback: {:?})",
            request.query(),
            request.service(),
            request.alternative_service()
        );
        self.queue.admit(request);
    }

    /// Forward geocode and wait. `None` means the request was cancelled or superseded.
    pub async fn geocode_async(
        &self,
        address: &str,
        service: ProviderKind,
        alternative: Option<ProviderKind>,
    ) -> Option<GeocodeResult> {
        let (sender, receiver) = oneshot::channel();
        self.geocode(address, service, alternative, move |result| {
            let _ = sender.send(result);
        });
        receiver.await.ok()
    }

    /// Reverse geocode and wait. `None` means the request was cancelled or superseded.
    pub async fn reverse_geocode_async(
        &self,
        coordinate: Coordinate,
        service: ProviderKind,
        alternative: Option<ProviderKind>,
    ) -> Option<GeocodeResult> {
        let (sender, receiver) = oneshot::channel();
        self.reverse_geocode(coordinate, service, alternative, move |result| {
            let _ = sender.send(result);
        });
        receiver.await.ok()
    }

    /// Cancel the current request, if any. No-op when idle or already finished.
    pub fn cancel_geocode(&self) {
        self.queue.cancel_current();
    }

    /// True while a request occupies the queue and has not finished
    pub fn is_busy(&self) -> bool {
        self.queue.is_busy()
    }

    pub fn google_api_key(&self) -> Option<String> {
        self.credentials().google_api_key
    }

    /// Applies to requests created after this call
    pub fn set_google_api_key(&self, key: Option<String>) {
        self.write_credentials(|credentials| credentials.google_api_key = key);
    }

    pub fn here_api_key(&self) -> Option<String> {
        self.credentials().here_api_key
    }

    /// Applies to requests created after this call
    pub fn set_here_api_key(&self, key: Option<String>) {
        self.write_credentials(|credentials| credentials.here_api_key = key);
    }

    fn credentials(&self) -> Credentials {
        self.credentials
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write_credentials(&self, update: impl FnOnce(&mut Credentials)) {
        let mut credentials = self
            .credentials
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut credentials);
    }
}
