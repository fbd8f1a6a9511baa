//! Geocode module - main module file
//!
//! Single-flight geocoding over interchangeable providers: request state
//! machine, provider adapters, the single-slot queue and its worker, and the
//! public service facade.

pub mod types;
pub mod error;
pub mod address;
pub mod state;
pub mod adapters;
pub mod request;
pub mod worker;
pub mod service;

// Re-export commonly used types
pub use address::AddressRecord;
pub use error::GeocodeError;
pub use request::GeocodeRequest;
pub use service::GeocodeService;
pub use state::RequestState;
pub use types::{Coordinate, GeocodeCallback, GeocodeQuery, GeocodeResult, ProviderKind};
pub use worker::{GeocodeWorker, RequestQueue};
