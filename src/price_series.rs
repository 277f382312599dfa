//! Average price per departure day, for the price chart.
//!
//! Days are keyed by month and day only and ordered as if they all fell in
//! [`REFERENCE_YEAR`]. Results that span New Year therefore list January
//! before December; the chart has always behaved this way.

use crate::models::Offer;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

/// Leap year, so a February 29 departure still has a place in the order.
pub const REFERENCE_YEAR: i32 = 2024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePoint {
    /// Short label such as `Jun 1`.
    pub date_label: String,
    pub mean_price: i64,
    pub offer_count: usize,
}

#[derive(Default)]
struct Bucket {
    total: f64,
    count: usize,
}

/// Groups offers by outbound departure day and averages their totals.
///
/// Offers without a first segment carry no departure and are skipped.
pub fn build_price_series<'a, I>(offers: I) -> Vec<PricePoint>
where
    I: IntoIterator<Item = &'a Offer>,
{
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for offer in offers {
        let Some(departure) = offer.departure_at() else {
            debug!("Offer {} has no departure, left out of price series", offer.id);
            continue;
        };
        let Some(day) = NaiveDate::from_ymd_opt(REFERENCE_YEAR, departure.month(), departure.day())
        else {
            continue;
        };
        let bucket = buckets.entry(day).or_default();
        bucket.total += offer.total_price();
        bucket.count += 1;
    }

    buckets
        .into_iter()
        .map(|(day, bucket)| PricePoint {
            date_label: day.format("%b %-d").to_string(),
            mean_price: (bucket.total / bucket.count as f64).round() as i64,
            offer_count: bucket.count,
        })
        .collect()
}

/// Cheapest and most expensive days of a series, plus the plain average of
/// the daily means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSummary<'a> {
    pub lowest: &'a PricePoint,
    pub highest: &'a PricePoint,
    pub average: i64,
}

/// Summary of `series`, or `None` when it is empty. Ties go to the earlier day.
pub fn summarize(series: &[PricePoint]) -> Option<SeriesSummary<'_>> {
    let (first, rest) = series.split_first()?;
    let mut lowest = first;
    let mut highest = first;
    let mut sum = first.mean_price as f64;

    for point in rest {
        if point.mean_price < lowest.mean_price {
            lowest = point;
        }
        if point.mean_price > highest.mean_price {
            highest = point;
        }
        sum += point.mean_price as f64;
    }

    Some(SeriesSummary {
        lowest,
        highest,
        average: (sum / series.len() as f64).round() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{offer, OfferSpec};

    fn departing(id: &str, total: &str, departs: &str) -> Offer {
        offer(OfferSpec {
            id,
            total,
            departs,
            ..Default::default()
        })
    }

    #[test]
    fn test_same_day_is_averaged() {
        let offers = vec![
            departing("a", "100", "2024-06-01T06:00:00"),
            departing("b", "200", "2024-06-01T12:30:00"),
            departing("c", "300", "2024-06-01T22:15:00"),
        ];
        assert_eq!(
            build_price_series(&offers),
            vec![PricePoint {
                date_label: "Jun 1".into(),
                mean_price: 200,
                offer_count: 3,
            }]
        );
    }

    #[test]
    fn test_days_are_ordered_and_rounded() {
        let offers = vec![
            departing("a", "120.40", "2024-06-03T06:00:00"),
            departing("b", "99.50", "2024-06-01T06:00:00"),
            departing("c", "150.00", "2024-06-03T09:00:00"),
            departing("d", "80.00", "2024-05-28T09:00:00"),
        ];
        let series = build_price_series(&offers);
        let labels: Vec<&str> = series.iter().map(|p| p.date_label.as_str()).collect();

        assert_eq!(labels, vec!["May 28", "Jun 1", "Jun 3"]);
        assert_eq!(series[1].mean_price, 100);
        assert_eq!(series[2].mean_price, 135);
        assert_eq!(series[2].offer_count, 2);
    }

    #[test]
    fn test_year_boundary_orders_by_month_and_day_only() {
        let offers = vec![
            departing("dec", "400", "2024-12-30T10:00:00"),
            departing("jan", "300", "2025-01-02T10:00:00"),
        ];
        let labels: Vec<String> = build_price_series(&offers)
            .into_iter()
            .map(|p| p.date_label)
            .collect();
        assert_eq!(labels, vec!["Jan 2", "Dec 30"]);
    }

    #[test]
    fn test_same_day_different_years_share_a_bucket() {
        let offers = vec![
            departing("a", "100", "2024-03-10T10:00:00"),
            departing("b", "300", "2025-03-10T10:00:00"),
        ];
        let series = build_price_series(&offers);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].mean_price, 200);
    }

    #[test]
    fn test_empty_input() {
        let offers: Vec<Offer> = vec![];
        assert!(build_price_series(&offers).is_empty());
    }

    fn point(label: &str, mean_price: i64) -> PricePoint {
        PricePoint {
            date_label: label.into(),
            mean_price,
            offer_count: 1,
        }
    }

    #[test]
    fn test_summary_picks_extremes_and_averages_days() {
        let series = vec![point("Jun 1", 412), point("Jun 2", 302), point("Jun 3", 350)];
        let summary = summarize(&series).unwrap();

        assert_eq!(summary.lowest.date_label, "Jun 2");
        assert_eq!(summary.highest.date_label, "Jun 1");
        // (412 + 302 + 350) / 3 = 354.67
        assert_eq!(summary.average, 355);
    }

    #[test]
    fn test_summary_ties_keep_earliest_day() {
        let series = vec![point("Jun 1", 200), point("Jun 2", 200)];
        let summary = summarize(&series).unwrap();

        assert_eq!(summary.lowest.date_label, "Jun 1");
        assert_eq!(summary.highest.date_label, "Jun 1");
        assert_eq!(summary.average, 200);
    }

    #[test]
    fn test_summary_of_empty_series() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_offer_without_segments_is_skipped() {
        let mut bare = departing("bare", "50", "2024-06-01T06:00:00");
        bare.itineraries.clear();
        let offers = vec![bare, departing("ok", "70", "2024-06-01T06:00:00")];

        let series = build_price_series(&offers);
        assert_eq!(series[0].offer_count, 1);
        assert_eq!(series[0].mean_price, 70);
    }
}
