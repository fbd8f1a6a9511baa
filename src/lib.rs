pub mod configure;
pub mod logger;
pub mod geocode;

pub use geocode::{
    AddressRecord, Coordinate, GeocodeError, GeocodeQuery, GeocodeResult, GeocodeService,
    ProviderKind,
};
