//! Geocode request state machine
//!
//! Defines the request lifecycle states, events, and the transition function.
//! Cancellation is not a state: it is a flag carried next to the state and
//! consulted at every decision point.

/// Request lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Created, waiting for the queue to admit it
    Ready,
    /// Admitted; a provider attempt is (or is about to be) in flight
    Executing,
    /// Terminal
    Finished,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Ready => "ready",
            RequestState::Executing => "executing",
            RequestState::Finished => "finished",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Finished)
    }
}

/// Events that drive a request through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    /// Queue admitted the request
    Admit,
    /// Admitted while already cancelled
    AdmitCancelled,
    /// Provider attempt failed and an alternative provider remains
    Fallback,
    /// Success, final failure, validation failure or observed cancellation
    Complete,
    /// Cancelled before admission, nothing outstanding
    Cancel,
}

/// State transition function
///
/// Invalid transitions return the current state (no change).
pub fn transition(current: RequestState, event: RequestEvent) -> RequestState {
    use RequestEvent::*;
    use RequestState::*;

    match (current, event) {
        (Ready, Admit) => Executing,
        (Ready, AdmitCancelled) => Finished,
        (Ready, Cancel) => Finished,

        // One more attempt against the alternative provider
        (Executing, Fallback) => Executing,
        (Executing, Complete) => Finished,

        _ => current,
    }
}
