use crate::config::SearchDefaults;
use crate::models::{CabinClass, CriteriaError, SearchCriteria};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;

/// Search flight offers and browse them in the terminal.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "farefinder", version, about)]
pub struct Cli {
    /// Origin airport or city (IATA code)
    #[arg(short, long)]
    pub origin: Option<String>,

    /// Destination airport or city (IATA code)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Departure date, YYYY-MM-DD
    #[arg(long = "date")]
    pub departure_date: Option<NaiveDate>,

    /// Return date for a round trip, YYYY-MM-DD
    #[arg(long)]
    pub return_date: Option<NaiveDate>,

    #[arg(short, long)]
    pub adults: Option<u8>,

    #[arg(long)]
    pub children: Option<u8>,

    #[arg(long)]
    pub infants: Option<u8>,

    /// economy, premium-economy, business or first
    #[arg(long)]
    pub cabin: Option<CabinClass>,

    /// Only request non-stop itineraries
    #[arg(long)]
    pub non_stop: bool,

    #[arg(long)]
    pub currency: Option<String>,

    /// Maximum number of offers to request
    #[arg(long)]
    pub max: Option<u16>,

    /// Path to the configuration file
    #[arg(long, env = "FAREFINDER_CONFIG", default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

impl Cli {
    /// Builds search criteria from the flags, filling gaps from `defaults`.
    pub fn criteria(&self, defaults: &SearchDefaults) -> Result<SearchCriteria, CriteriaError> {
        let departure = self
            .departure_date
            .unwrap_or_else(|| Local::now().date_naive() + Duration::days(defaults.departure_in_days));

        let mut builder = SearchCriteria::builder(
            self.origin.as_deref().unwrap_or(&defaults.origin),
            self.destination.as_deref().unwrap_or(&defaults.destination),
            departure,
        )
        .adults(self.adults.unwrap_or(defaults.adults))
        .cabin_class(self.cabin.unwrap_or(defaults.cabin))
        .currency_code(self.currency.as_deref().unwrap_or(&defaults.currency))
        .max_results(self.max.unwrap_or(defaults.max_results));

        if let Some(date) = self.return_date {
            builder = builder.return_date(date);
        }
        if let Some(children) = self.children {
            builder = builder.children(children);
        }
        if let Some(infants) = self.infants {
            builder = builder.infants(infants);
        }
        if self.non_stop {
            builder = builder.non_stop(true);
        }
        builder.build()
    }
}
