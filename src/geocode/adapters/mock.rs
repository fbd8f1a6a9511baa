//! Mock transport and native geocoder for testing
//!
//! Allows scripting provider responses per URL pattern and observing calls.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use super::platform::{NativeGeocoder, Placemark};
use super::traits::HttpTransport;
use crate::geocode::error::GeocodeError;
use crate::geocode::types::Coordinate;

/// What the mock transport does for a matching URL
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Respond with this body
    Body(String),
    /// Fail with a transport error
    Fail(String),
    /// Never respond; the call only ends when its future is dropped
    Hang,
}

/// Mock HTTP transport
///
/// Rules are `(pattern, response)` pairs checked in insertion order; the first
/// rule whose pattern occurs in the full URL wins.
pub struct MockTransport {
    rules: Mutex<Vec<(String, MockResponse)>>,
    default_response: Mutex<MockResponse>,
    calls: Mutex<Vec<Url>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default_response: Mutex::new(MockResponse::Fail("no mock response".to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Respond with `response` for URLs containing `pattern`
    pub fn when(&self, pattern: &str, response: MockResponse) {
        self.rules.lock().unwrap().push((pattern.to_string(), response));
    }

    /// Set the response used when no rule matches
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = response;
    }

    /// All URLs requested so far
    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests whose host equals `host`
    pub fn call_count_for(&self, host: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.host_str() == Some(host))
            .count()
    }

    fn response_for(&self, url: &Url) -> MockResponse {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| url.as_str().contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: Url) -> Result<String, GeocodeError> {
        log::debug!("[mock] GET {}", url);
        let response = self.response_for(&url);
        self.calls.lock().unwrap().push(url);

        match response {
            MockResponse::Body(body) => Ok(body),
            MockResponse::Fail(reason) => Err(GeocodeError::TransportFailure(reason)),
            MockResponse::Hang => std::future::pending().await,
        }
    }
}

/// Mock OS geocoder returning fixed placemarks or a fixed failure
pub struct MockNativeGeocoder {
    outcome: Result<Vec<Placemark>, String>,
    formatted: Option<String>,
    calls: AtomicUsize,
}

impl MockNativeGeocoder {
    pub fn new(placemarks: Vec<Placemark>) -> Self {
        Self {
            outcome: Ok(placemarks),
            formatted: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            formatted: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every placemark formats to `formatted`
    pub fn with_formatter(mut self, formatted: &str) -> Self {
        self.formatted = Some(formatted.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NativeGeocoder for MockNativeGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<Placemark>, String> {
        log::debug!("[mock-native] geocode({})", address);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Vec<Placemark>, String> {
        log::debug!("[mock-native] reverse_geocode({})", coordinate);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    fn format_postal_address(&self, _placemark: &Placemark) -> Option<String> {
        self.formatted.clone()
    }
}
