//! Normalized address model
//!
//! Every provider response, whatever its shape, is mapped into a sequence of
//! [`AddressRecord`]. Mapping is pure: no I/O, no logging side effects beyond
//! what the caller does with the result.

use serde::Serialize;
use serde_json::Value;

use crate::geocode::adapters::platform::Placemark;
use crate::geocode::types::{Coordinate, ProviderKind};

/// Separator used to split a single formatted address into lines
pub const LINE_SEPARATOR: &str = ", ";

/// Normalized result of a geocode lookup
///
/// Every field is independently optional. No provider guarantees any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddressRecord {
    pub coordinate: Option<Coordinate>,
    pub street_number: Option<String>,
    pub route: Option<String>,
    pub locality: Option<String>,
    pub sub_locality: Option<String>,
    pub administrative_area: Option<String>,
    pub sub_administrative_area: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub iso_country_code: Option<String>,
    pub formatted_address: Option<String>,
    /// `formatted_address` split on ", " (Google only)
    pub lines: Option<Vec<String>>,
    /// Provider payload kept for diagnostics, never interpreted further
    pub raw_source: Value,
}

/// A payload fetched from one provider, before normalization
#[derive(Debug, Clone, Copy)]
pub enum ProviderPayload<'a> {
    /// One placemark from the platform geocoder, with its formatted postal address if any
    Placemark(&'a Placemark, Option<&'a str>),
    /// One entry of Google's `results` array
    Google(&'a Value),
    /// One entry of HERE's `Response.View[0].Result` array
    Here(&'a Value),
}

impl<'a> ProviderPayload<'a> {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderPayload::Placemark(..) => ProviderKind::Platform,
            ProviderPayload::Google(_) => ProviderKind::Google,
            ProviderPayload::Here(_) => ProviderKind::Here,
        }
    }
}

/// Google component name variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameVariant {
    Long,
    Short,
}

impl NameVariant {
    fn key(self) -> &'static str {
        match self {
            NameVariant::Long => "long_name",
            NameVariant::Short => "short_name",
        }
    }
}

impl AddressRecord {
    /// Normalizes one provider entry. `None` means the entry is dropped.
    pub fn from_provider_payload(payload: ProviderPayload<'_>) -> Option<Self> {
        match payload {
            ProviderPayload::Placemark(placemark, formatted) => {
                Some(Self::from_placemark(placemark, formatted.map(str::to_string)))
            }
            ProviderPayload::Google(result) => {
                let record = Self::from_google_result(result);
                if record.is_none() {
                    log::debug!("[{}] dropping malformed result entry", payload.kind());
                }
                record
            }
            ProviderPayload::Here(result) => Some(Self::from_here_result(result)),
        }
    }

    /// Maps a platform placemark field by field.
    ///
    /// The platform exposes no route or neighborhood, and the thoroughfare is
    /// reported as the street number.
    pub fn from_placemark(placemark: &Placemark, formatted_address: Option<String>) -> Self {
        Self {
            coordinate: placemark.location,
            street_number: placemark.thoroughfare.clone(),
            route: None,
            locality: placemark.locality.clone(),
            sub_locality: placemark.sub_locality.clone(),
            administrative_area: placemark.administrative_area.clone(),
            sub_administrative_area: placemark.sub_administrative_area.clone(),
            neighborhood: None,
            postal_code: placemark.postal_code.clone(),
            country: placemark.country.clone(),
            iso_country_code: placemark.iso_country_code.clone(),
            formatted_address,
            lines: None,
            raw_source: serde_json::to_value(placemark).unwrap_or(Value::Null),
        }
    }

    /// Maps one entry of a Google `results` array. Non-object entries are dropped.
    pub fn from_google_result(result: &Value) -> Option<Self> {
        if !result.is_object() {
            return None;
        }

        let location = &result["geometry"]["location"];
        let coordinate = Coordinate::new(
            location["lat"].as_f64().unwrap_or(0.0),
            location["lng"].as_f64().unwrap_or(0.0),
        );

        let components = result.get("address_components").and_then(Value::as_array);
        let component = |kind: &str, variant: NameVariant| google_component(components, kind, variant);

        let formatted_address = result
            .get("formatted_address")
            .and_then(Value::as_str)
            .map(str::to_string);
        let lines = formatted_address
            .as_deref()
            .map(|text| text.split(LINE_SEPARATOR).map(str::to_string).collect());

        Some(Self {
            coordinate: Some(coordinate),
            street_number: component("street_number", NameVariant::Long),
            route: component("route", NameVariant::Long),
            locality: component("locality", NameVariant::Long),
            sub_locality: component("sublocality", NameVariant::Long),
            administrative_area: component("administrative_area_level_1", NameVariant::Long),
            sub_administrative_area: component("administrative_area_level_2", NameVariant::Long),
            neighborhood: component("neighborhood", NameVariant::Long),
            postal_code: component("postal_code", NameVariant::Short),
            country: component("country", NameVariant::Long),
            iso_country_code: component("country", NameVariant::Short),
            formatted_address,
            lines,
            raw_source: result.clone(),
        })
    }

    /// Maps one entry of a HERE `Result` array.
    ///
    /// An entry without `Location` or `Location.Address` still produces a
    /// record, carrying only the raw source.
    pub fn from_here_result(result: &Value) -> Self {
        let location = match result.get("Location") {
            Some(location) if location.is_object() => location,
            _ => return Self::raw_only(result),
        };
        let address = match location.get("Address") {
            Some(address) if address.is_object() => address,
            _ => return Self::raw_only(result),
        };

        let position = &location["DisplayPosition"];
        let coordinate = Coordinate::new(
            position["Latitude"].as_f64().unwrap_or(0.0),
            position["Longitude"].as_f64().unwrap_or(0.0),
        );
        let field = |key: &str| address.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            coordinate: Some(coordinate),
            street_number: field("HouseNumber"),
            route: field("Street"),
            locality: field("Subdistrict"),
            administrative_area: field("City"),
            sub_administrative_area: field("District"),
            postal_code: field("PostalCode"),
            country: field("Country"),
            formatted_address: field("Label"),
            raw_source: result.clone(),
            ..Default::default()
        }
    }

    fn raw_only(raw: &Value) -> Self {
        Self {
            raw_source: raw.clone(),
            ..Default::default()
        }
    }

    pub fn has_coordinate(&self) -> bool {
        self.coordinate.is_some()
    }

    /// First display line: the first split line, else the whole formatted address
    pub fn first_line(&self) -> Option<&str> {
        self.lines
            .as_ref()
            .and_then(|lines| lines.first())
            .map(String::as_str)
            .or(self.formatted_address.as_deref())
    }
}

/// First component whose `types` contains `kind`, then its name variant
fn google_component(components: Option<&Vec<Value>>, kind: &str, variant: NameVariant) -> Option<String> {
    components?
        .iter()
        .find(|component| {
            component
                .get("types")
                .and_then(Value::as_array)
                .is_some_and(|types| types.iter().any(|t| t.as_str() == Some(kind)))
        })
        .and_then(|component| component.get(variant.key()))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn google_result() -> Value {
        json!({
            "formatted_address": "425 Market St, San Francisco, CA 94105, USA",
            "geometry": { "location": { "lat": 37.7913, "lng": -122.3987 } },
            "address_components": [
                { "long_name": "425", "short_name": "425", "types": ["street_number"] },
                { "long_name": "Market Street", "short_name": "Market St", "types": ["route"] },
                { "long_name": "Financial District", "short_name": "FiDi", "types": ["neighborhood", "political"] },
                { "long_name": "San Francisco", "short_name": "SF", "types": ["locality", "political"] },
                { "long_name": "San Francisco County", "short_name": "San Francisco County", "types": ["administrative_area_level_2", "political"] },
                { "long_name": "California", "short_name": "CA", "types": ["administrative_area_level_1", "political"] },
                { "long_name": "United States", "short_name": "US", "types": ["country", "political"] },
                { "long_name": "94105", "short_name": "94105", "types": ["postal_code"] }
            ]
        })
    }

    #[test]
    fn test_google_full_mapping() {
        let record = AddressRecord::from_google_result(&google_result()).unwrap();

        assert_eq!(record.coordinate, Some(Coordinate::new(37.7913, -122.3987)));
        assert_eq!(record.street_number.as_deref(), Some("425"));
        assert_eq!(record.route.as_deref(), Some("Market Street"));
        assert_eq!(record.neighborhood.as_deref(), Some("Financial District"));
        assert_eq!(record.locality.as_deref(), Some("San Francisco"));
        assert_eq!(record.administrative_area.as_deref(), Some("California"));
        assert_eq!(record.sub_administrative_area.as_deref(), Some("San Francisco County"));
        assert_eq!(record.country.as_deref(), Some("United States"));
        assert_eq!(record.iso_country_code.as_deref(), Some("US"));
        assert_eq!(record.postal_code.as_deref(), Some("94105"));
        assert_eq!(record.sub_locality, None);
        assert_eq!(
            record.lines,
            Some(vec![
                "425 Market St".to_string(),
                "San Francisco".to_string(),
                "CA 94105".to_string(),
                "USA".to_string(),
            ])
        );
        assert_eq!(record.first_line(), Some("425 Market St"));
        assert_eq!(record.raw_source, google_result());
    }

    #[test]
    fn test_google_postal_code_uses_short_name() {
        let result = json!({
            "address_components": [
                { "long_name": "94105-1804", "short_name": "94105", "types": ["postal_code"] }
            ]
        });
        let record = AddressRecord::from_google_result(&result).unwrap();
        assert_eq!(record.postal_code.as_deref(), Some("94105"));
    }

    #[test]
    fn test_google_first_matching_component_wins() {
        let result = json!({
            "address_components": [
                { "long_name": "First", "short_name": "F", "types": ["locality"] },
                { "long_name": "Second", "short_name": "S", "types": ["locality"] }
            ]
        });
        let record = AddressRecord::from_google_result(&result).unwrap();
        assert_eq!(record.locality.as_deref(), Some("First"));
    }

    #[test]
    fn test_google_missing_geometry_defaults_to_zero() {
        let result = json!({ "geometry": { "location": { "lat": "north", "lng": null } } });
        let record = AddressRecord::from_google_result(&result).unwrap();
        assert_eq!(record.coordinate, Some(Coordinate::new(0.0, 0.0)));
        assert_eq!(record.locality, None);
        assert_eq!(record.formatted_address, None);
        assert_eq!(record.lines, None);
    }

    #[test]
    fn test_google_non_object_entry_dropped() {
        assert!(AddressRecord::from_google_result(&json!("oops")).is_none());
        assert!(AddressRecord::from_google_result(&json!([1, 2])).is_none());
        assert!(AddressRecord::from_google_result(&Value::Null).is_none());
    }

    #[test]
    fn test_google_malformed_components_leave_fields_absent() {
        let result = json!({ "address_components": "not-an-array" });
        let record = AddressRecord::from_google_result(&result).unwrap();
        assert_eq!(record.street_number, None);
        assert_eq!(record.country, None);
    }

    #[test]
    fn test_here_mapping() {
        let result = json!({
            "Relevance": 1.0,
            "Location": {
                "DisplayPosition": { "Latitude": 52.5309, "Longitude": 13.3847 },
                "Address": {
                    "Label": "Invalidenstraße 116, 10115 Berlin, Deutschland",
                    "Country": "DEU",
                    "City": "Berlin",
                    "District": "Mitte",
                    "Subdistrict": "Mitte",
                    "Street": "Invalidenstraße",
                    "HouseNumber": "116",
                    "PostalCode": "10115"
                }
            }
        });
        let record = AddressRecord::from_here_result(&result);

        assert_eq!(record.coordinate, Some(Coordinate::new(52.5309, 13.3847)));
        assert_eq!(record.street_number.as_deref(), Some("116"));
        assert_eq!(record.route.as_deref(), Some("Invalidenstraße"));
        assert_eq!(record.locality.as_deref(), Some("Mitte"));
        assert_eq!(record.administrative_area.as_deref(), Some("Berlin"));
        assert_eq!(record.sub_administrative_area.as_deref(), Some("Mitte"));
        assert_eq!(record.country.as_deref(), Some("DEU"));
        assert_eq!(record.postal_code.as_deref(), Some("10115"));
        assert_eq!(
            record.formatted_address.as_deref(),
            Some("Invalidenstraße 116, 10115 Berlin, Deutschland")
        );
        assert_eq!(record.lines, None);
        assert_eq!(record.first_line(), Some("Invalidenstraße 116, 10115 Berlin, Deutschland"));
    }

    #[test]
    fn test_here_missing_position_defaults_to_zero() {
        let result = json!({ "Location": { "Address": { "City": "Oslo" } } });
        let record = AddressRecord::from_here_result(&result);
        assert_eq!(record.coordinate, Some(Coordinate::new(0.0, 0.0)));
        assert_eq!(record.administrative_area.as_deref(), Some("Oslo"));
    }

    #[test]
    fn test_here_malformed_entry_keeps_raw_source() {
        let no_location = json!({ "Relevance": 0.5 });
        let record = AddressRecord::from_here_result(&no_location);
        assert_eq!(record.raw_source, no_location);
        assert_eq!(record.coordinate, None);
        assert_eq!(record.formatted_address, None);

        let no_address = json!({ "Location": { "DisplayPosition": { "Latitude": 1.0, "Longitude": 2.0 } } });
        let record = AddressRecord::from_here_result(&no_address);
        assert_eq!(record.raw_source, no_address);
        assert_eq!(record.coordinate, None);

        // the asymmetry with Google: the HERE entry is never dropped
        assert!(AddressRecord::from_provider_payload(ProviderPayload::Here(&json!(7))).is_some());
        assert!(AddressRecord::from_provider_payload(ProviderPayload::Google(&json!(7))).is_none());
    }

    #[test]
    fn test_placemark_locality_and_country_only() {
        let placemark = Placemark {
            locality: Some("Lisbon".to_string()),
            country: Some("Portugal".to_string()),
            ..Default::default()
        };
        let record = AddressRecord::from_placemark(&placemark, None);

        assert_eq!(record.locality.as_deref(), Some("Lisbon"));
        assert_eq!(record.country.as_deref(), Some("Portugal"));
        assert_eq!(record.coordinate, None);
        assert_eq!(record.street_number, None);
        assert_eq!(record.route, None);
        assert_eq!(record.sub_locality, None);
        assert_eq!(record.administrative_area, None);
        assert_eq!(record.sub_administrative_area, None);
        assert_eq!(record.neighborhood, None);
        assert_eq!(record.postal_code, None);
        assert_eq!(record.iso_country_code, None);
        assert_eq!(record.formatted_address, None);
        assert_eq!(record.lines, None);
        assert_eq!(record.first_line(), None);
    }

    #[test]
    fn test_placemark_thoroughfare_is_street_number() {
        let placemark = Placemark {
            location: Some(Coordinate::new(48.8584, 2.2945)),
            thoroughfare: Some("Avenue Gustave Eiffel".to_string()),
            postal_code: Some("75007".to_string()),
            iso_country_code: Some("FR".to_string()),
            ..Default::default()
        };
        let record = AddressRecord::from_provider_payload(ProviderPayload::Placemark(
            &placemark,
            Some("Avenue Gustave Eiffel\n75007 Paris\nFrance"),
        ))
        .unwrap();

        assert_eq!(record.street_number.as_deref(), Some("Avenue Gustave Eiffel"));
        assert_eq!(record.route, None);
        assert_eq!(record.postal_code.as_deref(), Some("75007"));
        assert_eq!(record.iso_country_code.as_deref(), Some("FR"));
        assert!(record.has_coordinate());
        assert_eq!(
            record.formatted_address.as_deref(),
            Some("Avenue Gustave Eiffel\n75007 Paris\nFrance")
        );
        assert_eq!(record.raw_source["thoroughfare"], json!("Avenue Gustave Eiffel"));
    }

    #[test]
    fn test_payload_kind() {
        let placemark = Placemark::default();
        assert_eq!(ProviderPayload::Placemark(&placemark, None).kind(), ProviderKind::Platform);
        assert_eq!(ProviderPayload::Google(&Value::Null).kind(), ProviderKind::Google);
        assert_eq!(ProviderPayload::Here(&Value::Null).kind(), ProviderKind::Here);
    }
}
