use crate::error::ApiError;
use crate::models::{Airport, AirportList, FlightSearchResponse, SearchCriteria};
use crate::session::{AirlineOption, SearchSession, SearchStatus, SearchTicket};
use crate::sort::SortMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum ViewMode {
    #[default]
    Results,
    PriceGraph,
    Filters,
    Airports,
}

/// Work the main loop has to start on the app's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search {
        ticket: SearchTicket,
        criteria: SearchCriteria,
    },
    LookupAirports(String),
}

/// A row of the filter panel.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterRow {
    Stops(u8),
    Airline(AirlineOption),
}

#[derive(Default)]
pub struct App {
    pub view_mode: ViewMode,
    pub session: SearchSession,
    pub selected_index: usize,
    pub tick_count: usize,
    pub should_quit: bool,

    // Filter panel
    pub filter_cursor: usize,

    // Airport lookup
    pub airport_query: String,
    pub airports: Vec<Airport>,
    pub airport_selected: usize,
    pub airport_pending: Option<String>,
    pub airport_error: Option<String>,

    pub last_update: Option<Instant>,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(default_sort: SortMode) -> Self {
        Self {
            session: SearchSession::new(default_sort),
            ..Default::default()
        }
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    /// Starts a new search session for `criteria`.
    pub fn submit_search(&mut self, criteria: SearchCriteria) -> Command {
        let ticket = self.session.begin(criteria.clone());
        self.selected_index = 0;
        self.filter_cursor = 0;
        self.status_message = None;
        Command::Search { ticket, criteria }
    }

    pub fn on_search_finished(
        &mut self,
        ticket: SearchTicket,
        result: Result<FlightSearchResponse, ApiError>,
    ) {
        if self.session.adopt(ticket, result) {
            self.last_update = Some(Instant::now());
            self.selected_index = 0;
        }
    }

    pub fn on_airports_finished(&mut self, keyword: String, result: Result<AirportList, ApiError>) {
        if self.airport_pending.as_deref() != Some(keyword.as_str()) {
            debug!("Ignoring airport results for superseded keyword '{}'", keyword);
            return;
        }
        self.airport_pending = None;
        match result {
            Ok(list) => {
                self.airports = list.data;
                self.airport_selected = 0;
                self.airport_error = None;
            }
            Err(e) => {
                warn!("Airport lookup for '{}' failed: {}", keyword, e);
                self.airports.clear();
                self.airport_error = Some(e.to_string());
            }
        }
    }

    pub fn filter_rows(&self) -> Vec<FilterRow> {
        let mut rows: Vec<FilterRow> = (0..=2).map(FilterRow::Stops).collect();
        rows.extend(
            self.session
                .available_airlines()
                .into_iter()
                .map(FilterRow::Airline),
        );
        rows
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        if self.view_mode == ViewMode::Airports {
            return self.handle_airport_key(key);
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.view_mode = ViewMode::Results,
            KeyCode::Char('2') => self.view_mode = ViewMode::PriceGraph,
            KeyCode::Char('3') => self.view_mode = ViewMode::Filters,
            KeyCode::Char('4') | KeyCode::Char('/') => self.view_mode = ViewMode::Airports,
            KeyCode::Char('s') => {
                let next = self.session.sort_mode().next();
                self.session.set_sort_mode(next);
                self.selected_index = 0;
            }
            KeyCode::Char('r') => {
                if let Some(criteria) = self.session.criteria().cloned() {
                    return Some(self.submit_search(criteria));
                }
            }
            _ => match self.view_mode {
                ViewMode::Filters => self.handle_filter_key(key),
                _ => self.handle_results_key(key),
            },
        }
        None
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        let len = self.session.visible_offers().len();
        if len == 0 {
            return;
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_index = (self.selected_index + 1) % len;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.checked_sub(1).unwrap_or(len - 1);
            }
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        let rows = self.filter_rows();
        let baseline = self.session.baseline_range();
        let step = ((baseline.max() - baseline.min()) / 20.0).round().max(1.0);
        let current = self.session.filters().price_range;

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if !rows.is_empty() {
                    self.filter_cursor = (self.filter_cursor + 1) % rows.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !rows.is_empty() {
                    self.filter_cursor = self.filter_cursor.checked_sub(1).unwrap_or(rows.len() - 1);
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => match rows.get(self.filter_cursor) {
                Some(FilterRow::Stops(stop)) => self.session.filters_mut().toggle_stop(*stop),
                Some(FilterRow::Airline(airline)) => {
                    self.session.filters_mut().toggle_airline(&airline.code)
                }
                None => {}
            },
            KeyCode::Char('[') => self.set_price_bounds(
                (current.min() - step).max(baseline.min()),
                current.max(),
            ),
            KeyCode::Char(']') => self.set_price_bounds(
                (current.min() + step).min(current.max()),
                current.max(),
            ),
            KeyCode::Char('{') => self.set_price_bounds(
                current.min(),
                (current.max() - step).max(current.min()),
            ),
            KeyCode::Char('}') => self.set_price_bounds(
                current.min(),
                (current.max() + step).min(baseline.max()),
            ),
            KeyCode::Char('c') => self.session.clear_filters(),
            _ => {}
        }
        self.clamp_selection();
    }

    fn set_price_bounds(&mut self, min: f64, max: f64) {
        self.session.filters_mut().set_price_range(min, max);
    }

    fn handle_airport_key(&mut self, key: KeyEvent) -> Option<Command> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.view_mode = ViewMode::Results,
            KeyCode::Char('o') if ctrl => return self.route_from_airport(true),
            KeyCode::Char('d') if ctrl => return self.route_from_airport(false),
            KeyCode::Char(c) => self.airport_query.push(c),
            KeyCode::Backspace => {
                self.airport_query.pop();
            }
            KeyCode::Enter => {
                let keyword = self.airport_query.trim().to_string();
                if keyword.is_empty() {
                    return None;
                }
                self.airport_pending = Some(keyword.clone());
                return Some(Command::LookupAirports(keyword));
            }
            KeyCode::Down => {
                if !self.airports.is_empty() {
                    self.airport_selected = (self.airport_selected + 1) % self.airports.len();
                }
            }
            KeyCode::Up => {
                if !self.airports.is_empty() {
                    self.airport_selected = self
                        .airport_selected
                        .checked_sub(1)
                        .unwrap_or(self.airports.len() - 1);
                }
            }
            _ => {}
        }
        None
    }

    /// Uses the highlighted airport as the new origin (or destination) and
    /// searches again.
    fn route_from_airport(&mut self, as_origin: bool) -> Option<Command> {
        let airport = self.airports.get(self.airport_selected)?;
        let current = self.session.criteria()?;
        let (origin, destination) = if as_origin {
            (airport.iata_code.as_str(), current.destination_code())
        } else {
            (current.origin_code(), airport.iata_code.as_str())
        };

        match current.with_route(origin, destination) {
            Ok(criteria) => {
                self.view_mode = ViewMode::Results;
                Some(self.submit_search(criteria))
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
                None
            }
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.session.visible_offers().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.session.status(), SearchStatus::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{offer, OfferSpec};
    use crate::models::{Dictionaries, ResponseMeta};
    use chrono::NaiveDate;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria::builder("JFK", "LAX", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .build()
            .unwrap()
    }

    fn loaded_app() -> App {
        let mut app = App::new(SortMode::PriceAsc);
        let Command::Search { ticket, .. } = app.submit_search(criteria()) else {
            panic!("expected a search command");
        };
        let offers = vec![
            offer(OfferSpec {
                id: "a",
                total: "300",
                carrier: "AA",
                ..Default::default()
            }),
            offer(OfferSpec {
                id: "b",
                total: "120",
                carrier: "DL",
                segment_stops: &[0, 0],
                ..Default::default()
            }),
        ];
        app.on_search_finished(
            ticket,
            Ok(FlightSearchResponse {
                meta: ResponseMeta { count: 2 },
                offers,
                dictionaries: Dictionaries::default(),
            }),
        );
        app
    }

    fn airport(code: &str) -> Airport {
        serde_json::from_value(serde_json::json!({
            "type": "location",
            "subType": "AIRPORT",
            "name": format!("{} INTL", code),
            "iataCode": code
        }))
        .unwrap()
    }

    #[test]
    fn test_sort_key_cycles_mode() {
        let mut app = loaded_app();
        assert_eq!(app.session.visible_offers()[0].id, "b");

        app.handle_key(press(KeyCode::Char('s')));

        assert_eq!(app.session.sort_mode(), SortMode::PriceDesc);
        assert_eq!(app.session.visible_offers()[0].id, "a");
    }

    #[test]
    fn test_filter_panel_toggles_stops_and_clamps_selection() {
        let mut app = loaded_app();
        app.selected_index = 1;
        app.handle_key(press(KeyCode::Char('3')));
        assert_eq!(app.view_mode, ViewMode::Filters);

        // first row is "non-stop"
        app.handle_key(press(KeyCode::Char(' ')));

        assert!(app.session.filters().stops.contains(&0));
        assert_eq!(app.session.visible_offers().len(), 1);
        assert_eq!(app.selected_index, 0);

        app.handle_key(press(KeyCode::Char('c')));
        assert!(!app.session.has_active_filters());
    }

    #[test]
    fn test_filter_rows_list_airlines() {
        let app = loaded_app();
        let rows = app.filter_rows();
        assert_eq!(rows.len(), 5);
        assert!(matches!(&rows[3], FilterRow::Airline(a) if a.code == "AA"));
    }

    #[test]
    fn test_price_bounds_stay_within_baseline() {
        let mut app = loaded_app();
        app.view_mode = ViewMode::Filters;
        app.handle_key(press(KeyCode::Char('}')));
        app.handle_key(press(KeyCode::Char('[')));
        assert_eq!(app.session.filters().price_range, app.session.baseline_range());

        app.handle_key(press(KeyCode::Char(']')));
        assert!(app.session.filters().price_range.min() > 120.0);
        assert!(app.session.has_active_filters());
    }

    #[test]
    fn test_rerun_issues_new_ticket() {
        let mut app = loaded_app();
        let command = app.handle_key(press(KeyCode::Char('r')));
        assert!(matches!(command, Some(Command::Search { .. })));
        assert!(app.is_loading());
    }

    #[test]
    fn test_airport_lookup_flow() {
        let mut app = loaded_app();
        app.handle_key(press(KeyCode::Char('/')));
        for c in "iqaluit".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        // 'q' is text here, not quit
        assert!(!app.should_quit);
        assert_eq!(app.airport_query, "iqaluit");

        let command = app.handle_key(press(KeyCode::Enter));
        assert_eq!(command, Some(Command::LookupAirports("iqaluit".into())));

        app.on_airports_finished(
            "iqaluit".into(),
            Ok(AirportList {
                meta: ResponseMeta { count: 1 },
                data: vec![airport("YFB")],
            }),
        );
        assert_eq!(app.airports.len(), 1);

        let command = app.handle_key(ctrl('o'));
        match command {
            Some(Command::Search { criteria, .. }) => {
                assert_eq!(criteria.origin_code(), "YFB");
                assert_eq!(criteria.destination_code(), "LAX");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(app.view_mode, ViewMode::Results);
        assert!(app.session.offers().is_empty());
    }

    #[test]
    fn test_superseded_airport_results_ignored() {
        let mut app = App::new(SortMode::PriceAsc);
        app.airport_pending = Some("lond".into());

        app.on_airports_finished(
            "lon".into(),
            Ok(AirportList {
                meta: ResponseMeta { count: 1 },
                data: vec![airport("LHR")],
            }),
        );

        assert!(app.airports.is_empty());
        assert_eq!(app.airport_pending.as_deref(), Some("lond"));
    }

    #[test]
    fn test_stale_search_result_keeps_loading_state() {
        let mut app = loaded_app();
        let Command::Search { ticket: old, .. } = app.submit_search(criteria()) else {
            panic!("expected a search command");
        };
        let _newer = app.submit_search(criteria());

        app.on_search_finished(
            old,
            Ok(FlightSearchResponse {
                meta: ResponseMeta::default(),
                offers: vec![],
                dictionaries: Dictionaries::default(),
            }),
        );

        assert!(app.is_loading());
        assert!(app.last_update.is_some());
    }
}
