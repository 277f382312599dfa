//! Flight offer search and browsing.
//!
//! The library half is the data layer: an authenticated client for the
//! flight-offers API ([`api`], [`auth`]) and the pure engine that turns a raw
//! offer list into what the user browses ([`filters`], [`sort`],
//! [`price_series`]), tied together per search by [`session`]. The terminal
//! front end ([`app`], [`events`], [`ui`]) consumes it.

pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod events;
pub mod filters;
pub mod format;
pub mod logging;
pub mod models;
pub mod price_series;
pub mod retry;
pub mod session;
pub mod sort;
pub mod ui;

#[cfg(test)]
mod fixtures;

pub use api::FlightApiClient;
pub use error::{ApiError, AuthError};
pub use filters::{apply_filters, get_price_range, FilterState, PriceRange};
pub use models::{CabinClass, Offer, SearchCriteria};
pub use price_series::{build_price_series, summarize, PricePoint, SeriesSummary};
pub use sort::{sort_flights, SortMode};
