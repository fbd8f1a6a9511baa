//! Core types for the geocoding core
//!
//! Coordinates, provider identifiers, request input and completion callbacks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geocode::address::AddressRecord;
use crate::geocode::error::GeocodeError;

/// A WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// The "no coordinate" sentinel. Never valid for reverse geocoding.
    pub const INVALID: Coordinate = Coordinate {
        latitude: -180.0,
        longitude: -180.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90], longitude within [-180, 180], no NaN, not the sentinel
    pub fn is_valid(&self) -> bool {
        if *self == Self::INVALID {
            return false;
        }
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// "lat,lng" as used in provider query strings
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Geocoding backend identifier
///
/// Uses strum for String conversion:
/// - `kind.as_ref()` -> &str "google"
/// - `"here".parse::<ProviderKind>()` -> Result<ProviderKind>
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// The operating system's geocoder
    Platform,
    /// Google Geocoding REST API
    Google,
    /// HERE Geocoder REST API
    Here,
}

/// What a request asks for. Forward and reverse input are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeQuery {
    /// Address text -> coordinate + structured address
    Forward(Option<String>),
    /// Coordinate -> structured address
    Reverse(Option<Coordinate>),
}

impl GeocodeQuery {
    /// Checks the input before any provider is contacted
    pub fn validate(&self) -> Result<(), GeocodeError> {
        match self {
            GeocodeQuery::Forward(address) => match address.as_deref() {
                Some(text) if !text.is_empty() => Ok(()),
                _ => Err(GeocodeError::InvalidAddressInput),
            },
            GeocodeQuery::Reverse(coordinate) => match coordinate {
                Some(c) if c.is_valid() => Ok(()),
                _ => Err(GeocodeError::InvalidCoordinateInput),
            },
        }
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, GeocodeQuery::Reverse(_))
    }
}

impl fmt::Display for GeocodeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeQuery::Forward(Some(address)) => write!(f, "forward \"{}\"", address),
            GeocodeQuery::Forward(None) => write!(f, "forward <none>"),
            GeocodeQuery::Reverse(Some(c)) => write!(f, "reverse {}", c),
            GeocodeQuery::Reverse(None) => write!(f, "reverse <none>"),
        }
    }
}

/// Outcome delivered to a caller: records on success, an error otherwise
pub type GeocodeResult = Result<Vec<AddressRecord>, GeocodeError>;

/// Completion callback, invoked at most once and never for a cancelled request
pub type GeocodeCallback = Box<dyn FnOnce(GeocodeResult) + Send + 'static>;
