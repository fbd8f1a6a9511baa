//! Geocode Request
//!
//! One forward or reverse geocode attempt chain: primary provider, at most one
//! fallback hop to the alternative provider, cooperative cancellation and
//! exactly-once completion delivery.
//!
//! Delivery contract:
//! - a request that is not cancelled invokes its callback exactly once, with
//!   records on success or an error on failure;
//! - a cancelled request never invokes its callback;
//! - the callback runs on the task that drives [`GeocodeRequest::run`] (the
//!   service's worker task), never while an internal lock is held.
//!
//! Cancellation is best-effort: if a provider completes in the narrow window
//! before `cancel()` takes effect, the callback may still fire.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::geocode::adapters::ProviderAdapter;
use crate::geocode::error::GeocodeError;
use crate::geocode::state::{transition, RequestEvent, RequestState};
use crate::geocode::types::{GeocodeCallback, GeocodeQuery, GeocodeResult, ProviderKind};

/// The provider call currently in flight
struct Attempt {
    provider: ProviderKind,
    token: CancellationToken,
}

struct Inner {
    state: RequestState,
    callback: Option<GeocodeCallback>,
    /// Replaced, never accumulated, when falling back
    attempt: Option<Attempt>,
}

pub struct GeocodeRequest {
    query: GeocodeQuery,
    primary: Arc<dyn ProviderAdapter>,
    alternative: Option<Arc<dyn ProviderAdapter>>,
    cancel: CancellationToken,
    inner: Mutex<Inner>,
}

impl GeocodeRequest {
    pub fn new(
        query: GeocodeQuery,
        primary: Arc<dyn ProviderAdapter>,
        alternative: Option<Arc<dyn ProviderAdapter>>,
        callback: GeocodeCallback,
    ) -> Self {
        Self {
            query,
            primary,
            alternative,
            cancel: CancellationToken::new(),
            inner: Mutex::new(Inner {
                state: RequestState::Ready,
                callback: Some(callback),
                attempt: None,
            }),
        }
    }

    pub fn query(&self) -> &GeocodeQuery {
        &self.query
    }

    pub fn service(&self) -> ProviderKind {
        self.primary.kind()
    }

    pub fn alternative_service(&self) -> Option<ProviderKind> {
        self.alternative.as_ref().map(|adapter| adapter.kind())
    }

    pub fn state(&self) -> RequestState {
        self.lock().state
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Provider of the in-flight attempt, if any
    pub fn current_attempt(&self) -> Option<ProviderKind> {
        self.lock().attempt.as_ref().map(|attempt| attempt.provider)
    }

    /// Request cancellation
    ///
    /// Aborts the in-flight attempt (its future is dropped at the next poll)
    /// and suppresses the callback. A request that was never admitted finishes
    /// immediately. Cancelling a finished request is a no-op.
    pub fn cancel(&self) {
        self.cancel.cancel();

        let mut inner = self.lock();
        if inner.state == RequestState::Ready {
            inner.state = transition(inner.state, RequestEvent::Cancel);
            inner.callback = None;
            log::debug!("Cancelled {} before admission", self.query);
        }
    }

    /// Finish an unadmitted request with `err` without running it
    ///
    /// Used when the request can never reach the worker. A cancelled request
    /// still finishes silently.
    pub fn reject(&self, err: GeocodeError) {
        if self.admit() {
            log::warn!("Rejected {}: {}", self.query, err);
            self.finish(Err(err));
        }
    }

    /// Drive the request to `Finished`
    ///
    /// Called once by the queue when the request is admitted. Returns
    /// immediately if the request already finished.
    pub async fn run(&self) {
        if !self.admit() {
            return;
        }

        if let Err(err) = self.query.validate() {
            log::info!("Rejected {}: {}", self.query, err);
            self.finish(Err(err));
            return;
        }

        let mut adapter = self.primary.clone();
        let mut alternative = self.alternative.clone();

        loop {
            let token = self.begin_attempt(adapter.kind());

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = adapter.lookup(&self.query) => Some(result),
            };

            let result = match outcome {
                Some(result) => result,
                None => {
                    log::debug!("Attempt on {} for {} cancelled", adapter.kind(), self.query);
                    self.finish_silently();
                    return;
                }
            };

            match result {
                Ok(records) => {
                    log::info!(
                        "Geocoded {} via {}: {} record(s)",
                        self.query,
                        adapter.kind(),
                        records.len()
                    );
                    self.finish(Ok(records));
                    return;
                }
                Err(err) => {
                    if self.is_cancelled() {
                        self.finish_silently();
                        return;
                    }

                    match alternative.take() {
                        Some(next) if err.allows_fallback() => {
                            log::warn!(
                                "{} failed on {} ({}), falling back to {}",
                                self.query,
                                adapter.kind(),
                                err.error_code(),
                                next.kind()
                            );
                            self.apply(RequestEvent::Fallback);
                            adapter = next;
                        }
                        _ => {
                            log::warn!("{} failed on {}: {}", self.query, adapter.kind(), err);
                            self.finish(Err(err));
                            return;
                        }
                    }
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner is never left half-updated, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, event: RequestEvent) {
        let mut inner = self.lock();
        let next = transition(inner.state, event);
        log::debug!("{}: {} -> {} on {:?}", self.query, inner.state.as_str(), next.as_str(), event);
        inner.state = next;
    }

    /// Ready -> Executing, or Ready -> Finished when already cancelled
    fn admit(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != RequestState::Ready {
            return false;
        }
        if self.cancel.is_cancelled() {
            inner.state = transition(inner.state, RequestEvent::AdmitCancelled);
            inner.callback = None;
            return false;
        }
        inner.state = transition(inner.state, RequestEvent::Admit);
        true
    }

    fn begin_attempt(&self, provider: ProviderKind) -> CancellationToken {
        let token = self.cancel.child_token();
        let mut inner = self.lock();
        if let Some(previous) = inner.attempt.replace(Attempt {
            provider,
            token: token.clone(),
        }) {
            previous.token.cancel();
        }
        token
    }

    /// Executing -> Finished; hands back the callback unless cancelled
    fn close(&self) -> Option<GeocodeCallback> {
        let mut inner = self.lock();
        inner.state = transition(inner.state, RequestEvent::Complete);
        if let Some(attempt) = inner.attempt.take() {
            attempt.token.cancel();
        }
        let callback = inner.callback.take();
        if self.cancel.is_cancelled() {
            None
        } else {
            callback
        }
    }

    fn finish(&self, result: GeocodeResult) {
        if let Some(callback) = self.close() {
            callback(result);
        }
    }

    fn finish_silently(&self) {
        let _ = self.close();
    }
}

impl fmt::Debug for GeocodeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodeRequest")
            .field("query", &self.query)
            .field("service", &self.service())
            .field("alternative", &self.alternative_service())
            .field("state", &self.state().as_str())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
