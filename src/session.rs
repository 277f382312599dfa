//! One user's search session: the current criteria, the offers it produced,
//! and the filter/sort state layered on top of them.
//!
//! Every submitted search is issued a [`SearchTicket`]. Responses are only
//! adopted when they carry the ticket of the latest submission, so a slow
//! response to a superseded search can never overwrite fresher state.

use crate::api::FlightApiClient;
use crate::error::ApiError;
use crate::filters::{apply_filters, get_price_range, FilterState, PriceRange};
use crate::format::airline_name;
use crate::models::{Dictionaries, FlightSearchResponse, Offer, SearchCriteria};
use crate::price_series::{build_price_series, PricePoint};
use crate::retry::RetryPolicy;
use crate::sort::{sort_flights, SortMode};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed {
        message: String,
        auth: bool,
    },
}

/// A carrier that appears as primary validating airline in the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirlineOption {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct SearchSession {
    generation: u64,
    criteria: Option<SearchCriteria>,
    status: SearchStatus,
    offers: Vec<Offer>,
    dictionaries: Dictionaries,
    baseline_range: PriceRange,
    filters: FilterState,
    sort: SortMode,
}

impl SearchSession {
    pub fn new(sort: SortMode) -> Self {
        Self {
            sort,
            ..Default::default()
        }
    }

    /// Registers a new submission. Offers from the previous search are
    /// dropped and filters reset; the sort mode carries over.
    pub fn begin(&mut self, criteria: SearchCriteria) -> SearchTicket {
        self.generation += 1;
        info!("Search #{}: {}", self.generation, criteria);
        self.criteria = Some(criteria);
        self.status = SearchStatus::Loading;
        self.offers.clear();
        self.dictionaries = Dictionaries::default();
        self.baseline_range = PriceRange::default();
        self.filters = FilterState::with_price_range(self.baseline_range);
        SearchTicket(self.generation)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Takes in the outcome of the search identified by `ticket`. Returns
    /// `false` (and changes nothing) when a newer search has been submitted.
    pub fn adopt(
        &mut self,
        ticket: SearchTicket,
        result: Result<FlightSearchResponse, ApiError>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Discarding response for search #{} (current is #{})",
                ticket.0, self.generation
            );
            return false;
        }

        match result {
            Ok(response) => {
                info!("Search #{} adopted {} offers", ticket.0, response.offers.len());
                self.baseline_range = get_price_range(&response.offers);
                self.filters = FilterState::with_price_range(self.baseline_range);
                self.offers = response.offers;
                self.dictionaries = response.dictionaries;
                self.status = SearchStatus::Ready;
            }
            Err(err) => {
                error!("Search #{} failed: {}", ticket.0, err);
                self.status = SearchStatus::Failed {
                    message: err.to_string(),
                    auth: err.is_auth(),
                };
            }
        }
        true
    }

    pub fn criteria(&self) -> Option<&SearchCriteria> {
        self.criteria.as_ref()
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn dictionaries(&self) -> &Dictionaries {
        &self.dictionaries
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn baseline_range(&self) -> PriceRange {
        self.baseline_range
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort
    }

    pub fn set_sort_mode(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear(self.baseline_range);
    }

    pub fn has_active_filters(&self) -> bool {
        self.filters.has_active_filters(self.baseline_range)
    }

    /// Filtered, then sorted, offers for display.
    pub fn visible_offers(&self) -> Vec<&Offer> {
        sort_flights(apply_filters(&self.offers, &self.filters), self.sort)
    }

    /// Price chart series over the currently filtered offers.
    pub fn price_series(&self) -> Vec<PricePoint> {
        build_price_series(apply_filters(&self.offers, &self.filters))
    }

    pub fn available_airlines(&self) -> Vec<AirlineOption> {
        let codes: BTreeSet<&str> = self.offers.iter().filter_map(Offer::primary_carrier).collect();
        codes
            .into_iter()
            .map(|code| AirlineOption {
                code: code.to_string(),
                name: airline_name(code, &self.dictionaries.carriers).to_string(),
            })
            .collect()
    }
}

/// Runs a flight search under `policy`. Authentication failures are returned
/// straight away; other failures are retried with backoff.
pub async fn search_with_retry(
    client: &FlightApiClient,
    criteria: &SearchCriteria,
    policy: RetryPolicy,
) -> Result<FlightSearchResponse, ApiError> {
    policy.run(|| client.search_flights(criteria)).await
}
