//! Offer builders shared by the unit tests.

use crate::models::{FlightEndpoint, Itinerary, Offer, Price, Segment};
use chrono::NaiveDateTime;

pub struct OfferSpec<'a> {
    pub id: &'a str,
    pub total: &'a str,
    pub carrier: &'a str,
    pub segment_stops: &'a [u32],
    pub duration: &'a str,
    pub departs: &'a str,
}

impl Default for OfferSpec<'_> {
    fn default() -> Self {
        Self {
            id: "1",
            total: "100.00",
            carrier: "AA",
            segment_stops: &[0],
            duration: "PT5H",
            departs: "2024-06-01T08:00:00",
        }
    }
}

pub fn offer(spec: OfferSpec<'_>) -> Offer {
    let at = NaiveDateTime::parse_from_str(spec.departs, "%Y-%m-%dT%H:%M:%S").unwrap();
    let segments = spec
        .segment_stops
        .iter()
        .enumerate()
        .map(|(i, stops)| Segment {
            departure: FlightEndpoint {
                iata_code: format!("D{}", i),
                terminal: None,
                at,
            },
            arrival: FlightEndpoint {
                iata_code: format!("A{}", i),
                terminal: None,
                at,
            },
            carrier_code: spec.carrier.to_string(),
            number: format!("{}", 100 + i),
            aircraft: None,
            operating: None,
            duration: "PT1H".to_string(),
            id: i.to_string(),
            number_of_stops: *stops,
        })
        .collect();

    Offer {
        id: spec.id.to_string(),
        source: "GDS".to_string(),
        one_way: false,
        last_ticketing_date: None,
        number_of_bookable_seats: Some(9),
        itineraries: vec![Itinerary {
            duration: spec.duration.to_string(),
            segments,
        }],
        price: Price {
            currency: "USD".to_string(),
            total: spec.total.to_string(),
            base: spec.total.to_string(),
            fees: vec![],
            grand_total: Some(spec.total.to_string()),
        },
        validating_airline_codes: vec![spec.carrier.to_string()],
    }
}

pub fn priced(id: &str, total: &str) -> Offer {
    offer(OfferSpec {
        id,
        total,
        ..Default::default()
    })
}

pub fn ids(offers: &[&Offer]) -> Vec<String> {
    offers.iter().map(|o| o.id.clone()).collect()
}
