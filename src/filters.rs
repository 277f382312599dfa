//! Narrowing an offer list by stop count, price and validating carrier.

use crate::models::Offer;
use std::collections::BTreeSet;

/// Stop filter value meaning "two or more stops".
pub const TWO_PLUS_STOPS: u8 = 2;

/// Range returned by [`get_price_range`] when there is nothing to measure.
pub const EMPTY_PRICE_RANGE: PriceRange = PriceRange {
    min: 0.0,
    max: 1000.0,
};

/// Inclusive price bounds. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        EMPTY_PRICE_RANGE
    }
}

/// User-owned filter selections. Empty `stops`/`airlines` mean "any".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    pub stops: BTreeSet<u8>,
    pub price_range: PriceRange,
    pub airlines: BTreeSet<String>,
}

impl FilterState {
    /// No stop or airline restriction, prices limited to `price_range`.
    pub fn with_price_range(price_range: PriceRange) -> Self {
        Self {
            price_range,
            ..Default::default()
        }
    }

    /// Adds or removes a stop bucket (0, 1, or 2 for "2+"); larger values
    /// are folded into the "2+" bucket.
    pub fn toggle_stop(&mut self, stop: u8) {
        let stop = stop.min(TWO_PLUS_STOPS);
        if !self.stops.remove(&stop) {
            self.stops.insert(stop);
        }
    }

    pub fn toggle_airline(&mut self, code: &str) {
        if !self.airlines.remove(code) {
            self.airlines.insert(code.to_string());
        }
    }

    pub fn set_price_range(&mut self, min: f64, max: f64) {
        self.price_range = PriceRange::new(min, max);
    }

    /// Drops stop and airline selections and restores `baseline` prices.
    pub fn clear(&mut self, baseline: PriceRange) {
        *self = Self::with_price_range(baseline);
    }

    /// Whether anything narrows results beyond the `baseline` price range.
    pub fn has_active_filters(&self, baseline: PriceRange) -> bool {
        !self.stops.is_empty() || !self.airlines.is_empty() || self.price_range != baseline
    }

    pub fn matches(&self, offer: &Offer) -> bool {
        self.matches_stops(offer) && self.matches_price(offer) && self.matches_airline(offer)
    }

    fn matches_stops(&self, offer: &Offer) -> bool {
        if self.stops.is_empty() {
            return true;
        }
        let stops = total_stops(offer);
        self.stops.iter().any(|&wanted| {
            if wanted >= TWO_PLUS_STOPS {
                stops >= u32::from(TWO_PLUS_STOPS)
            } else {
                stops == u32::from(wanted)
            }
        })
    }

    fn matches_price(&self, offer: &Offer) -> bool {
        self.price_range.contains(offer.total_price())
    }

    fn matches_airline(&self, offer: &Offer) -> bool {
        if self.airlines.is_empty() {
            return true;
        }
        offer
            .primary_carrier()
            .is_some_and(|code| self.airlines.contains(code))
    }
}

/// Stops on the outbound itinerary: connections plus in-segment stops.
pub fn total_stops(offer: &Offer) -> u32 {
    offer.first_itinerary().map(|it| it.total_stops()).unwrap_or(0)
}

/// Offers passing every active filter, in their original order.
pub fn apply_filters<'a, I>(offers: I, filters: &FilterState) -> Vec<&'a Offer>
where
    I: IntoIterator<Item = &'a Offer>,
{
    offers.into_iter().filter(|o| filters.matches(o)).collect()
}

/// Floor of the cheapest and ceiling of the dearest total price.
pub fn get_price_range<'a, I>(offers: I) -> PriceRange
where
    I: IntoIterator<Item = &'a Offer>,
{
    let bounds = offers
        .into_iter()
        .map(Offer::total_price)
        .fold(None, |acc: Option<(f64, f64)>, price| match acc {
            None => Some((price, price)),
            Some((lo, hi)) => Some((lo.min(price), hi.max(price))),
        });

    match bounds {
        Some((lo, hi)) => PriceRange::new(lo.floor(), hi.ceil()),
        None => EMPTY_PRICE_RANGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ids, offer, priced, OfferSpec};

    fn sample() -> Vec<Offer> {
        vec![
            offer(OfferSpec {
                id: "direct",
                total: "199.99",
                carrier: "AA",
                segment_stops: &[0],
                ..Default::default()
            }),
            offer(OfferSpec {
                id: "one-stop",
                total: "149.50",
                carrier: "DL",
                segment_stops: &[0, 0],
                ..Default::default()
            }),
            offer(OfferSpec {
                id: "two-stop",
                total: "99.00",
                carrier: "UA",
                segment_stops: &[0, 1],
                ..Default::default()
            }),
            offer(OfferSpec {
                id: "three-stop",
                total: "89.00",
                carrier: "AA",
                segment_stops: &[1, 1],
                ..Default::default()
            }),
        ]
    }

    fn wide_open() -> FilterState {
        FilterState::with_price_range(PriceRange::new(0.0, 10_000.0))
    }

    #[test]
    fn test_no_restrictions_keeps_everything_in_order() {
        let offers = sample();
        let filtered = apply_filters(&offers, &wide_open());
        assert_eq!(ids(&filtered), vec!["direct", "one-stop", "two-stop", "three-stop"]);
    }

    #[test]
    fn test_stop_buckets() {
        let offers = sample();
        let mut filters = wide_open();

        filters.toggle_stop(0);
        assert_eq!(ids(&apply_filters(&offers, &filters)), vec!["direct"]);

        filters.toggle_stop(0);
        filters.toggle_stop(1);
        assert_eq!(ids(&apply_filters(&offers, &filters)), vec!["one-stop"]);

        filters.toggle_stop(1);
        filters.toggle_stop(2);
        assert_eq!(
            ids(&apply_filters(&offers, &filters)),
            vec!["two-stop", "three-stop"]
        );
    }

    #[test]
    fn test_internal_stop_counts_towards_total() {
        let offers = vec![offer(OfferSpec {
            segment_stops: &[0, 1],
            ..Default::default()
        })];
        assert_eq!(total_stops(&offers[0]), 2);

        for (stop, expected) in [(0u8, 0usize), (1, 0), (2, 1)] {
            let mut filters = wide_open();
            filters.toggle_stop(stop);
            assert_eq!(apply_filters(&offers, &filters).len(), expected, "stop {}", stop);
        }
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let offers = sample();
        let mut filters = wide_open();
        filters.set_price_range(99.0, 149.5);
        assert_eq!(ids(&apply_filters(&offers, &filters)), vec!["one-stop", "two-stop"]);
    }

    #[test]
    fn test_airline_uses_primary_carrier() {
        let offers = sample();
        let mut filters = wide_open();
        filters.toggle_airline("AA");
        assert_eq!(ids(&apply_filters(&offers, &filters)), vec!["direct", "three-stop"]);

        filters.toggle_airline("AA");
        assert!(filters.airlines.is_empty());
    }

    #[test]
    fn test_axes_are_anded() {
        let offers = sample();
        let mut filters = wide_open();
        filters.toggle_airline("AA");
        filters.toggle_stop(2);
        filters.set_price_range(0.0, 95.0);
        assert_eq!(ids(&apply_filters(&offers, &filters)), vec!["three-stop"]);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let offers = sample();
        let mut filters = wide_open();
        filters.toggle_stop(2);
        filters.toggle_stop(0);
        filters.set_price_range(90.0, 500.0);

        let once = apply_filters(&offers, &filters);
        let twice = apply_filters(once.iter().copied(), &filters);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn test_empty_input() {
        let offers: Vec<Offer> = Vec::new();
        assert!(apply_filters(&offers, &wide_open()).is_empty());
        assert_eq!(get_price_range(&offers), PriceRange::new(0.0, 1000.0));
    }

    #[test]
    fn test_price_range_floors_and_ceils() {
        let offers = vec![priced("a", "120.75"), priced("b", "89.10"), priced("c", "300.01")];
        let range = get_price_range(&offers);
        assert_eq!(range.min(), 89.0);
        assert_eq!(range.max(), 301.0);
    }

    #[test]
    fn test_price_range_normalises_reversed_bounds() {
        let range = PriceRange::new(500.0, 100.0);
        assert_eq!((range.min(), range.max()), (100.0, 500.0));
    }

    #[test]
    fn test_active_filters_against_baseline() {
        let baseline = PriceRange::new(89.0, 200.0);
        let mut filters = FilterState::with_price_range(baseline);
        assert!(!filters.has_active_filters(baseline));

        filters.toggle_stop(5);
        assert!(filters.stops.contains(&TWO_PLUS_STOPS));
        assert!(filters.has_active_filters(baseline));

        filters.clear(baseline);
        assert!(!filters.has_active_filters(baseline));

        filters.set_price_range(100.0, 200.0);
        assert!(filters.has_active_filters(baseline));
    }
}
