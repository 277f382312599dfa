use crate::models::Offer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    PriceAsc,
    PriceDesc,
    DurationAsc,
    DurationDesc,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::PriceAsc,
        SortMode::PriceDesc,
        SortMode::DurationAsc,
        SortMode::DurationDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::PriceAsc => "price-asc",
            SortMode::PriceDesc => "price-desc",
            SortMode::DurationAsc => "duration-asc",
            SortMode::DurationDesc => "duration-desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::PriceAsc => "Price: Low to High",
            SortMode::PriceDesc => "Price: High to Low",
            SortMode::DurationAsc => "Duration: Shortest",
            SortMode::DurationDesc => "Duration: Longest",
        }
    }

    /// The mode after this one, wrapping around.
    pub fn next(&self) -> SortMode {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn compare(&self, a: &Offer, b: &Offer) -> Ordering {
        match self {
            SortMode::PriceAsc => a.total_price().total_cmp(&b.total_price()),
            SortMode::PriceDesc => b.total_price().total_cmp(&a.total_price()),
            SortMode::DurationAsc => a.duration_minutes().cmp(&b.duration_minutes()),
            SortMode::DurationDesc => b.duration_minutes().cmp(&a.duration_minutes()),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| format!("unknown sort mode '{}'", s))
    }
}

/// New ordering of `offers` by `mode`. Equal keys keep their incoming order.
pub fn sort_flights<'a, I>(offers: I, mode: SortMode) -> Vec<&'a Offer>
where
    I: IntoIterator<Item = &'a Offer>,
{
    let mut sorted: Vec<&Offer> = offers.into_iter().collect();
    sorted.sort_by(|a, b| mode.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ids, offer, priced, OfferSpec};

    fn timed(id: &str, duration: &str) -> Offer {
        offer(OfferSpec {
            id,
            duration,
            ..Default::default()
        })
    }

    #[test]
    fn test_price_orderings() {
        let offers = vec![priced("a", "300"), priced("b", "99.5"), priced("c", "150")];

        assert_eq!(ids(&sort_flights(&offers, SortMode::PriceAsc)), vec!["b", "c", "a"]);
        assert_eq!(ids(&sort_flights(&offers, SortMode::PriceDesc)), vec!["a", "c", "b"]);
        // input untouched
        assert_eq!(offers[0].id, "a");
    }

    #[test]
    fn test_descending_is_reverse_of_ascending_for_distinct_prices() {
        let offers = vec![
            priced("a", "410.10"),
            priced("b", "88"),
            priced("c", "1200"),
            priced("d", "254.99"),
            priced("e", "87.99"),
        ];
        let mut asc = ids(&sort_flights(&offers, SortMode::PriceAsc));
        asc.reverse();
        assert_eq!(asc, ids(&sort_flights(&offers, SortMode::PriceDesc)));
    }

    #[test]
    fn test_ties_keep_original_order() {
        let offers = vec![
            priced("first", "100"),
            priced("cheap", "50"),
            priced("second", "100"),
            priced("third", "100.00"),
        ];
        assert_eq!(
            ids(&sort_flights(&offers, SortMode::PriceAsc)),
            vec!["cheap", "first", "second", "third"]
        );
        assert_eq!(
            ids(&sort_flights(&offers, SortMode::PriceDesc)),
            vec!["first", "second", "third", "cheap"]
        );
    }

    #[test]
    fn test_duration_orderings() {
        let offers = vec![
            timed("long", "PT11H20M"),
            timed("short", "PT1H5M"),
            timed("unknown", "garbage"),
            timed("mid", "PT4H"),
        ];
        assert_eq!(
            ids(&sort_flights(&offers, SortMode::DurationAsc)),
            vec!["unknown", "short", "mid", "long"]
        );
        assert_eq!(
            ids(&sort_flights(&offers, SortMode::DurationDesc)),
            vec!["long", "mid", "short", "unknown"]
        );
    }

    #[test]
    fn test_empty_input() {
        let offers: Vec<Offer> = vec![];
        assert!(sort_flights(&offers, SortMode::DurationDesc).is_empty());
    }

    #[test]
    fn test_mode_names_round_trip_and_cycle() {
        for mode in SortMode::ALL {
            assert_eq!(mode.as_str().parse::<SortMode>(), Ok(mode));
        }
        assert_eq!(SortMode::DurationDesc.next(), SortMode::PriceAsc);
        assert!("cheapest".parse::<SortMode>().is_err());
    }
}
