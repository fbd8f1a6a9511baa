// Error types for geocoding requests
use std::fmt;

use crate::geocode::types::ProviderKind;

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeError {
    // Validation errors
    InvalidAddressInput,
    InvalidCoordinateInput,

    // Provider errors
    TransportFailure(String),
    ProviderRejected { provider: ProviderKind, status: String },
    ParseFailure(String),
    MissingCredential(ProviderKind),

    // Defensive-only failures (URL construction, missing platform geocoder)
    InternalFailure(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddressInput => write!(f, "Invalid address string"),
            Self::InvalidCoordinateInput => write!(f, "Invalid coordinate"),
            Self::TransportFailure(msg) => write!(f, "Transport failure: {}", msg),
            Self::ProviderRejected { provider, status } => {
                write!(f, "Provider {} rejected the request: {}", provider, status)
            }
            Self::ParseFailure(msg) => write!(f, "Failed to parse provider response: {}", msg),
            Self::MissingCredential(provider) => {
                write!(f, "No credential configured for provider {}", provider)
            }
            Self::InternalFailure(msg) => write!(f, "Internal failure: {}", msg),
        }
    }
}

impl std::error::Error for GeocodeError {}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::TransportFailure(err.to_string())
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(err: serde_json::Error) -> Self {
        GeocodeError::ParseFailure(err.to_string())
    }
}

impl From<url::ParseError> for GeocodeError {
    fn from(err: url::ParseError) -> Self {
        GeocodeError::InternalFailure(format!("invalid request URL: {}", err))
    }
}

impl GeocodeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAddressInput => "INVALID_ADDRESS_INPUT",
            Self::InvalidCoordinateInput => "INVALID_COORDINATE_INPUT",
            Self::TransportFailure(_) => "TRANSPORT_FAILURE",
            Self::ProviderRejected { .. } => "PROVIDER_REJECTED",
            Self::ParseFailure(_) => "PARSE_FAILURE",
            Self::MissingCredential(_) => "MISSING_CREDENTIAL",
            Self::InternalFailure(_) => "INTERNAL_FAILURE",
        }
    }

    /// Caller bugs never move on to the alternative provider; everything else gets one hop
    pub fn allows_fallback(&self) -> bool {
        !self.is_user_error()
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidAddressInput | Self::InvalidCoordinateInput)
    }
}
