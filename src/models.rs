use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::duration::parse_duration_minutes;
use crate::format::format_date_for_api;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub one_way: bool,
    #[serde(default)]
    pub last_ticketing_date: Option<NaiveDate>,
    #[serde(default)]
    pub number_of_bookable_seats: Option<u32>,
    pub itineraries: Vec<Itinerary>,
    pub price: Price,
    #[serde(default)]
    pub validating_airline_codes: Vec<String>,
}

impl Offer {
    pub fn first_itinerary(&self) -> Option<&Itinerary> {
        self.itineraries.first()
    }

    /// Carrier shown and filtered on: the first validating airline.
    pub fn primary_carrier(&self) -> Option<&str> {
        self.validating_airline_codes.first().map(String::as_str)
    }

    pub fn total_price(&self) -> f64 {
        self.price.total_amount()
    }

    /// Duration of the outbound itinerary in minutes, zero when unknown.
    pub fn duration_minutes(&self) -> u32 {
        self.first_itinerary()
            .map(|it| parse_duration_minutes(&it.duration))
            .unwrap_or(0)
    }

    /// Departure of the first segment of the outbound itinerary.
    pub fn departure_at(&self) -> Option<NaiveDateTime> {
        self.first_itinerary()
            .and_then(|it| it.segments.first())
            .map(|seg| seg.departure.at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default)]
    pub duration: String,
    pub segments: Vec<Segment>,
}

impl Itinerary {
    /// Connections between segments plus the stops made inside each segment.
    pub fn total_stops(&self) -> u32 {
        let connections = self.segments.len().saturating_sub(1) as u32;
        let internal: u32 = self.segments.iter().map(|s| s.number_of_stops).sum();
        connections + internal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: FlightEndpoint,
    pub arrival: FlightEndpoint,
    pub carrier_code: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub aircraft: Option<AircraftRef>,
    #[serde(default)]
    pub operating: Option<OperatingCarrier>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub number_of_stops: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEndpoint {
    pub iata_code: String,
    #[serde(default)]
    pub terminal: Option<String>,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftRef {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingCarrier {
    pub carrier_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub currency: String,
    pub total: String,
    pub base: String,
    #[serde(default)]
    pub fees: Vec<Fee>,
    #[serde(default)]
    pub grand_total: Option<String>,
}

impl Price {
    /// Decimal value of `total`. Totals that do not parse count as zero.
    pub fn total_amount(&self) -> f64 {
        self.total.trim().parse::<f64>().unwrap_or(0.0)
    }

    pub fn base_amount(&self) -> f64 {
        self.base.trim().parse::<f64>().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Code → display name tables that accompany a flight search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dictionaries {
    #[serde(default)]
    pub carriers: HashMap<String, String>,
    #[serde(default)]
    pub aircraft: HashMap<String, String>,
    #[serde(default)]
    pub currencies: HashMap<String, String>,
    #[serde(default)]
    pub locations: HashMap<String, LocationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEntry {
    #[serde(default)]
    pub city_code: String,
    #[serde(default)]
    pub country_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchResponse {
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(rename = "data", default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub dictionaries: Dictionaries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airport {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub sub_type: String,
    pub name: String,
    #[serde(default)]
    pub detailed_name: String,
    #[serde(default)]
    pub id: String,
    pub iata_code: String,
    #[serde(default)]
    pub time_zone_offset: Option<String>,
    #[serde(default)]
    pub geo_code: Option<GeoCode>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl Airport {
    pub fn city_name(&self) -> Option<&str> {
        self.address.as_ref().map(|a| a.city_name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoCode {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub city_code: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub region_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirportList {
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub data: Vec<Airport>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("'{0}' is not a three-letter IATA location code")]
    InvalidLocationCode(String),
    #[error("passenger count {0} is outside 0..=9")]
    PassengerCountOutOfRange(u8),
    #[error("at least one adult is required")]
    NoAdults,
    #[error("return date {returning} is before departure date {departing}")]
    ReturnBeforeDeparture {
        departing: NaiveDate,
        returning: NaiveDate,
    },
    #[error("max results must be between 1 and 250, got {0}")]
    MaxResultsOutOfRange(u16),
    #[error("unknown cabin class '{0}'")]
    UnknownCabinClass(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub const ALL: [CabinClass; 4] = [
        CabinClass::Economy,
        CabinClass::PremiumEconomy,
        CabinClass::Business,
        CabinClass::First,
    ];

    /// Value sent as `travelClass`.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "ECONOMY",
            CabinClass::PremiumEconomy => "PREMIUM_ECONOMY",
            CabinClass::Business => "BUSINESS",
            CabinClass::First => "FIRST",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::PremiumEconomy => "Premium Economy",
            CabinClass::Business => "Business",
            CabinClass::First => "First Class",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CabinClass {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        CabinClass::ALL
            .into_iter()
            .find(|c| c.as_api_str() == normalized)
            .ok_or_else(|| CriteriaError::UnknownCabinClass(s.to_string()))
    }
}

/// A traveller count for one passenger type, always within `0..=9`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PassengerCount(u8);

impl PassengerCount {
    pub const MAX: u8 = 9;

    pub fn new(count: u8) -> Result<Self, CriteriaError> {
        if count > Self::MAX {
            return Err(CriteriaError::PassengerCountOutOfRange(count));
        }
        Ok(Self(count))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// Immutable description of one flight search submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    origin_code: String,
    destination_code: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    adults: PassengerCount,
    children: Option<PassengerCount>,
    infants: Option<PassengerCount>,
    cabin_class: CabinClass,
    non_stop: Option<bool>,
    currency_code: String,
    max_results: u16,
}

impl SearchCriteria {
    pub const DEFAULT_CURRENCY: &'static str = "USD";
    pub const DEFAULT_MAX_RESULTS: u16 = 50;

    pub fn builder(
        origin_code: impl Into<String>,
        destination_code: impl Into<String>,
        departure_date: NaiveDate,
    ) -> SearchCriteriaBuilder {
        SearchCriteriaBuilder {
            origin_code: origin_code.into(),
            destination_code: destination_code.into(),
            departure_date,
            return_date: None,
            adults: 1,
            children: None,
            infants: None,
            cabin_class: CabinClass::default(),
            non_stop: None,
            currency_code: Self::DEFAULT_CURRENCY.to_string(),
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    pub fn origin_code(&self) -> &str {
        &self.origin_code
    }

    pub fn destination_code(&self) -> &str {
        &self.destination_code
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn adults(&self) -> u8 {
        self.adults.get()
    }

    pub fn children(&self) -> Option<u8> {
        self.children.map(|c| c.get())
    }

    pub fn infants(&self) -> Option<u8> {
        self.infants.map(|c| c.get())
    }

    pub fn cabin_class(&self) -> CabinClass {
        self.cabin_class
    }

    pub fn non_stop(&self) -> Option<bool> {
        self.non_stop
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn max_results(&self) -> u16 {
        self.max_results
    }

    /// Query parameters for the flight-offers endpoint. Optional values that
    /// are unset are left out entirely.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("originLocationCode", self.origin_code.clone()),
            ("destinationLocationCode", self.destination_code.clone()),
            ("departureDate", format_date_for_api(&self.departure_date)),
        ];
        if let Some(date) = self.return_date {
            pairs.push(("returnDate", format_date_for_api(&date)));
        }
        pairs.push(("adults", self.adults.get().to_string()));
        if let Some(children) = self.children {
            pairs.push(("children", children.get().to_string()));
        }
        if let Some(infants) = self.infants {
            pairs.push(("infants", infants.get().to_string()));
        }
        pairs.push(("travelClass", self.cabin_class.as_api_str().to_string()));
        if let Some(non_stop) = self.non_stop {
            pairs.push(("nonStop", non_stop.to_string()));
        }
        pairs.push(("currencyCode", self.currency_code.clone()));
        pairs.push(("max", self.max_results.to_string()));
        pairs
    }

    /// Copy of these criteria with a different origin and destination.
    pub fn with_route(&self, origin: &str, destination: &str) -> Result<Self, CriteriaError> {
        Ok(Self {
            origin_code: normalize_location(origin)?,
            destination_code: normalize_location(destination)?,
            ..self.clone()
        })
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} on {}",
            self.origin_code, self.destination_code, self.departure_date
        )?;
        if let Some(ret) = self.return_date {
            write!(f, ", back {}", ret)?;
        }
        write!(f, " · {} adult(s) · {}", self.adults.get(), self.cabin_class)
    }
}

#[derive(Debug, Clone)]
pub struct SearchCriteriaBuilder {
    origin_code: String,
    destination_code: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    adults: u8,
    children: Option<u8>,
    infants: Option<u8>,
    cabin_class: CabinClass,
    non_stop: Option<bool>,
    currency_code: String,
    max_results: u16,
}

impl SearchCriteriaBuilder {
    pub fn return_date(mut self, date: NaiveDate) -> Self {
        self.return_date = Some(date);
        self
    }

    pub fn adults(mut self, adults: u8) -> Self {
        self.adults = adults;
        self
    }

    pub fn children(mut self, children: u8) -> Self {
        self.children = Some(children);
        self
    }

    pub fn infants(mut self, infants: u8) -> Self {
        self.infants = Some(infants);
        self
    }

    pub fn cabin_class(mut self, cabin: CabinClass) -> Self {
        self.cabin_class = cabin;
        self
    }

    pub fn non_stop(mut self, non_stop: bool) -> Self {
        self.non_stop = Some(non_stop);
        self
    }

    pub fn currency_code(mut self, currency: impl Into<String>) -> Self {
        self.currency_code = currency.into();
        self
    }

    pub fn max_results(mut self, max: u16) -> Self {
        self.max_results = max;
        self
    }

    pub fn build(self) -> Result<SearchCriteria, CriteriaError> {
        let adults = PassengerCount::new(self.adults)?;
        if adults.get() == 0 {
            return Err(CriteriaError::NoAdults);
        }
        if let Some(returning) = self.return_date {
            if returning < self.departure_date {
                return Err(CriteriaError::ReturnBeforeDeparture {
                    departing: self.departure_date,
                    returning,
                });
            }
        }
        if !(1..=250).contains(&self.max_results) {
            return Err(CriteriaError::MaxResultsOutOfRange(self.max_results));
        }

        Ok(SearchCriteria {
            origin_code: normalize_location(&self.origin_code)?,
            destination_code: normalize_location(&self.destination_code)?,
            departure_date: self.departure_date,
            return_date: self.return_date,
            adults,
            children: self.children.map(PassengerCount::new).transpose()?,
            infants: self.infants.map(PassengerCount::new).transpose()?,
            cabin_class: self.cabin_class,
            non_stop: self.non_stop,
            currency_code: self.currency_code.trim().to_ascii_uppercase(),
            max_results: self.max_results,
        })
    }
}

fn normalize_location(code: &str) -> Result<String, CriteriaError> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(CriteriaError::InvalidLocationCode(code))
    }
}
