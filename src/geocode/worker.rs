//! Single-flight request queue and its worker
//!
//! The queue has exactly one logical slot. Admitting a request cancels the
//! current occupant and installs the newcomer in one step under the slot lock,
//! so two requests can never both believe they are current. A single worker
//! task runs admitted requests one at a time, in admission order; superseded
//! requests reach it already cancelled and finish without doing any work.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

use crate::geocode::error::GeocodeError;
use crate::geocode::request::GeocodeRequest;

/// Single-slot queue of geocode requests
pub struct RequestQueue {
    slot: Mutex<Option<Arc<GeocodeRequest>>>,
    sender: mpsc::UnboundedSender<Arc<GeocodeRequest>>,
}

impl RequestQueue {
    /// Create the queue and the worker that drains it
    pub fn new() -> (Self, GeocodeWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue = Self {
            slot: Mutex::new(None),
            sender,
        };
        (queue, GeocodeWorker { receiver })
    }

    /// Replace the occupant with `request`
    ///
    /// Never fails for capacity reasons. Returns the superseded request, if
    /// one was still unfinished.
    pub fn admit(&self, request: Arc<GeocodeRequest>) -> Option<Arc<GeocodeRequest>> {
        let (superseded, sent) = {
            let mut slot = self.lock();

            let superseded = slot.take().filter(|previous| !previous.is_finished());
            if let Some(previous) = &superseded {
                log::info!("Superseding {}", previous.query());
                previous.cancel();
            }

            let sent = self.sender.send(request.clone()).is_ok();
            *slot = Some(request.clone());
            (superseded, sent)
        };

        // callback runs outside the slot lock
        if !sent {
            log::error!("Geocode worker is gone, failing {}", request.query());
            request.reject(GeocodeError::InternalFailure("geocode worker stopped".to_string()));
        }

        superseded
    }

    /// Cancel the occupant without replacing it. Returns false when idle.
    pub fn cancel_current(&self) -> bool {
        let slot = self.lock();
        match slot.as_ref() {
            Some(current) if !current.is_finished() => {
                log::info!("Cancelling {}", current.query());
                current.cancel();
                true
            }
            _ => false,
        }
    }

    /// True while the occupant exists and has not finished
    pub fn is_busy(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|current| !current.is_finished())
    }

    pub fn current(&self) -> Option<Arc<GeocodeRequest>> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<GeocodeRequest>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Background worker: runs one request at a time until the queue is dropped
pub struct GeocodeWorker {
    receiver: mpsc::UnboundedReceiver<Arc<GeocodeRequest>>,
}

impl GeocodeWorker {
    pub async fn run(mut self) {
        log::debug!("Geocode worker started");

        while let Some(request) = self.receiver.recv().await {
            // a panicking callback only takes down its own task
            let running = request.clone();
            if let Err(e) = tokio::spawn(async move { running.run().await }).await {
                log::error!("Geocode request {} aborted: {}", request.query(), e);
            }
        }

        log::debug!("Geocode worker stopped");
    }

    /// Start the worker in a background task
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::adapters::{MockResponse, MockTransport, ProviderAdapter, RestAdapter};
    use crate::geocode::adapters::google::{GoogleApi, DEFAULT_ENDPOINT};
    use crate::geocode::state::RequestState;
    use crate::geocode::types::{GeocodeCallback, GeocodeQuery, GeocodeResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    const OK_BODY: &str = r#"{"status":"OK","results":[{"formatted_address":"A, B"}]}"#;

    fn google(transport: Arc<MockTransport>) -> Arc<dyn ProviderAdapter> {
        Arc::new(RestAdapter::new(
            GoogleApi::new(DEFAULT_ENDPOINT, Some("k".to_string())),
            transport,
        ))
    }

    fn counting_callback(counter: Arc<AtomicUsize>) -> GeocodeCallback {
        Box::new(move |_result: GeocodeResult| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn request(address: &str, adapter: Arc<dyn ProviderAdapter>, counter: Arc<AtomicUsize>) -> Arc<GeocodeRequest> {
        Arc::new(GeocodeRequest::new(
            GeocodeQuery::Forward(Some(address.to_string())),
            adapter,
            None,
            counting_callback(counter),
        ))
    }

    #[tokio::test]
    async fn test_admit_supersedes_occupant() {
        let transport = Arc::new(MockTransport::new());
        let (queue, _worker) = RequestQueue::new();
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));

        let first = request("a", google(transport.clone()), first_calls.clone());
        let second = request("b", google(transport), second_calls.clone());

        assert!(queue.admit(first.clone()).is_none());
        assert!(queue.is_busy());

        let superseded = queue.admit(second.clone()).unwrap();
        assert!(Arc::ptr_eq(&superseded, &first));
        assert!(first.is_cancelled());
        assert_eq!(first.state(), RequestState::Finished);
        assert!(Arc::ptr_eq(&queue.current().unwrap(), &second));
        assert!(queue.is_busy());
    }

    #[tokio::test]
    async fn test_cancel_current() {
        let (queue, _worker) = RequestQueue::new();
        assert!(!queue.cancel_current());

        let counter = Arc::new(AtomicUsize::new(0));
        let only = request("a", google(Arc::new(MockTransport::new())), counter);
        queue.admit(only.clone());

        assert!(queue.cancel_current());
        assert!(only.is_cancelled());
        assert!(!queue.is_busy());
        assert!(!queue.cancel_current());
    }

    #[tokio::test]
    async fn test_worker_runs_latest_only() {
        let transport = Arc::new(MockTransport::new());
        transport.set_default_response(MockResponse::Body(OK_BODY.to_string()));
        let (queue, worker) = RequestQueue::new();

        let stale = Arc::new(AtomicUsize::new(0));
        let latest = Arc::new(AtomicUsize::new(0));
        queue.admit(request("a", google(transport.clone()), stale.clone()));
        queue.admit(request("b", google(transport.clone()), stale.clone()));
        let last = request("c", google(transport.clone()), latest.clone());
        queue.admit(last.clone());

        drop(queue);
        worker.run().await;

        assert_eq!(stale.load(Ordering::SeqCst), 0);
        assert_eq!(latest.load(Ordering::SeqCst), 1);
        assert!(last.is_finished());
        assert_eq!(transport.calls().len(), 1);
    }

    fn delivering_request(
        address: &str,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> (Arc<GeocodeRequest>, oneshot::Receiver<GeocodeResult>) {
        let (sender, receiver) = oneshot::channel();
        let request = Arc::new(GeocodeRequest::new(
            GeocodeQuery::Forward(Some(address.to_string())),
            adapter,
            None,
            Box::new(move |result: GeocodeResult| {
                let _ = sender.send(result);
            }),
        ));
        (request, receiver)
    }

    #[tokio::test]
    async fn test_admit_after_worker_gone() {
        let transport = Arc::new(MockTransport::new());
        let (queue, worker) = RequestQueue::new();
        drop(worker);

        let (orphan, receiver) = delivering_request("a", google(transport.clone()));
        queue.admit(orphan.clone());

        assert!(!orphan.is_cancelled());
        assert!(orphan.is_finished());
        assert!(!queue.is_busy());
        assert_eq!(
            receiver.await.unwrap().unwrap_err(),
            GeocodeError::InternalFailure("geocode worker stopped".to_string())
        );
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_worker_survives_panicking_callback() {
        let transport = Arc::new(MockTransport::new());
        transport.set_default_response(MockResponse::Body(OK_BODY.to_string()));
        let (queue, worker) = RequestQueue::new();
        let handle = worker.spawn();

        let faulty = Arc::new(GeocodeRequest::new(
            GeocodeQuery::Forward(Some("a".to_string())),
            google(transport.clone()),
            None,
            Box::new(|_result: GeocodeResult| panic!("callback bug")),
        ));
        queue.admit(faulty.clone());
        tokio::time::timeout(Duration::from_secs(2), async {
            while !faulty.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let (next, receiver) = delivering_request("b", google(transport.clone()));
        queue.admit(next);

        let records = tokio::time::timeout(Duration::from_secs(2), receiver)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(records[0].formatted_address.as_deref(), Some("A, B"));
        assert_eq!(transport.calls().len(), 2);

        drop(queue);
        handle.await.unwrap();
    }
}
