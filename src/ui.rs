//! TUI rendering for the fare finder.
//!
//! This module handles all UI rendering logic using the `ratatui` crate:
//! the results list with offer details, the price-per-day chart, the filter
//! panel and the airport lookup.

use crate::app::{App, FilterRow, ViewMode};
use crate::duration::format_duration;
use crate::filters::total_stops;
use crate::format::{
    airline_name, format_airport, format_currency, format_currency_str, format_date, format_date_time,
    format_time, stops_text,
};
use crate::models::Offer;
use crate::price_series::summarize;
use crate::session::SearchStatus;
use ratatui::{prelude::*, widgets::*};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Renders one frame of the TUI based on current application state.
///
/// Draws a header with the active search, the body for
/// [`App::view_mode`], and a footer with the key bindings for that view.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.size());

    render_header(f, app, chunks[0]);

    match app.view_mode {
        ViewMode::Results => render_results_view(f, app, chunks[1]),
        ViewMode::PriceGraph => render_price_graph_view(f, app, chunks[1]),
        ViewMode::Filters => render_filters_view(f, app, chunks[1]),
        ViewMode::Airports => render_airports_view(f, app, chunks[1]),
    }

    render_footer(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let route = session
        .criteria()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "No search yet".to_string());

    let status = match session.status() {
        SearchStatus::Idle => Span::raw("IDLE"),
        SearchStatus::Loading => Span::styled(
            format!("{} SEARCHING", SPINNER[app.tick_count % SPINNER.len()]),
            Style::default().fg(Color::Yellow),
        ),
        SearchStatus::Ready => Span::styled(
            format!(
                "{} of {} offers",
                session.visible_offers().len(),
                session.offers().len()
            ),
            Style::default().fg(Color::Green),
        ),
        SearchStatus::Failed { auth: true, .. } => {
            Span::styled("AUTH FAILED", Style::default().fg(Color::Red))
        }
        SearchStatus::Failed { .. } => Span::styled("FAILED", Style::default().fg(Color::Red)),
    };

    let mut spans = vec![
        Span::styled(route, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  │  "),
        status,
        Span::raw("  │  "),
        Span::styled(
            session.sort_mode().label(),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if session.has_active_filters() {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled("FILTERED", Style::default().fg(Color::Magenta)));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(" FareFinder ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(header, area);
}

/// Results view: offer list (45%) + details of the selected offer (55%).
fn render_results_view(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    if let Some(message) = status_placeholder(session.status()) {
        f.render_widget(message, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let offers = session.visible_offers();
    let carriers = &session.dictionaries().carriers;

    let items: Vec<ListItem> = offers
        .iter()
        .enumerate()
        .map(|(i, offer)| {
            let style = if i == app.selected_index {
                Style::default()
                    .fg(Color::Cyan)
                    .bg(Color::Rgb(30, 30, 60))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let carrier = offer.primary_carrier().unwrap_or("??");
            let duration = offer
                .first_itinerary()
                .map(|it| format_duration(&it.duration))
                .unwrap_or_default();

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" {:>8}", format_currency(offer.total_price(), &offer.price.currency)),
                    style,
                ),
                Span::styled(format!("  {:<3}", carrier), style),
                Span::styled(
                    format!(" │ {:<9} │ {}", stops_text(total_stops(offer)), duration),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("  {}", truncate(airline_name(carrier, carriers), 18)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Offers ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(list, chunks[0]);

    let details = match offers.get(app.selected_index) {
        Some(offer) => offer_details(offer, carriers),
        None => vec![Line::from("No offers match the current filters.")],
    };
    let p = Paragraph::new(details)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Offer Details ")
                .borders(Borders::ALL)
                .padding(Padding::new(2, 2, 1, 1)),
        );
    f.render_widget(p, chunks[1]);
}

fn offer_details<'a>(
    offer: &'a Offer,
    carriers: &'a std::collections::HashMap<String, String>,
) -> Vec<Line<'a>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total:   ", bold),
            Span::styled(
                format_currency(offer.total_price(), &offer.price.currency),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!(
                "  (base {})",
                format_currency_str(&offer.price.base, &offer.price.currency)
            )),
        ]),
    ];

    for fee in &offer.price.fees {
        lines.push(Line::from(vec![
            Span::raw(format!("  fee {:<12}", fee.kind)),
            Span::raw(format_currency_str(&fee.amount, &offer.price.currency)),
        ]));
    }

    if let Some(seats) = offer.number_of_bookable_seats {
        lines.push(Line::from(vec![
            Span::styled("Seats:   ", bold),
            Span::raw(seats.to_string()),
        ]));
    }
    if let Some(date) = &offer.last_ticketing_date {
        lines.push(Line::from(vec![
            Span::styled("Book by: ", bold),
            Span::raw(format_date(date)),
        ]));
    }

    for (i, itinerary) in offer.itineraries.iter().enumerate() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                if i == 0 { "Outbound " } else { "Return   " },
                bold,
            ),
            Span::raw(format!(
                "{} · {}",
                format_duration(&itinerary.duration),
                stops_text(itinerary.total_stops())
            )),
        ]));

        for seg in &itinerary.segments {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}{:<5}", seg.carrier_code, seg.number),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(format!(
                    "{} {} → {} {}",
                    seg.departure.iata_code,
                    format_date_time(&seg.departure.at),
                    seg.arrival.iata_code,
                    format_time(&seg.arrival.at),
                )),
            ]));
            let operated_by = seg
                .operating
                .as_ref()
                .filter(|op| op.carrier_code != seg.carrier_code)
                .map(|op| format!(" · operated by {}", airline_name(&op.carrier_code, carriers)))
                .unwrap_or_default();
            lines.push(Line::from(Span::styled(
                format!(
                    "        {}{}{}",
                    format_duration(&seg.duration),
                    if seg.number_of_stops > 0 {
                        format!(" · {}", stops_text(seg.number_of_stops))
                    } else {
                        String::new()
                    },
                    operated_by
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    lines
}

/// Price chart: one bar per departure day, mean price of the filtered offers.
fn render_price_graph_view(f: &mut Frame, app: &App, area: Rect) {
    if let Some(message) = status_placeholder(app.session.status()) {
        f.render_widget(message, area);
        return;
    }

    let series = app.session.price_series();
    let block = Block::default()
        .title(" Average Price by Departure Date ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    if series.is_empty() {
        f.render_widget(
            Paragraph::new("No data for the current filters.")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)])
        .split(area);

    let data: Vec<(&str, u64)> = series
        .iter()
        .map(|p| (p.date_label.as_str(), p.mean_price.max(0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(data.as_slice())
        .bar_width(7)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, chunks[0]);

    let currency = app
        .session
        .criteria()
        .map(|c| c.currency_code().to_string())
        .unwrap_or_else(|| "USD".to_string());
    let mut spans = Vec::new();
    if let Some(summary) = summarize(&series) {
        let price = |p: i64| format_currency(p as f64, &currency);
        spans.push(Span::styled(
            format!(
                " Lowest {} ({})",
                price(summary.lowest.mean_price),
                summary.lowest.date_label
            ),
            Style::default().fg(Color::Green),
        ));
        spans.push(Span::styled(
            format!(
                "   Highest {} ({})",
                price(summary.highest.mean_price),
                summary.highest.date_label
            ),
            Style::default().fg(Color::Red),
        ));
        spans.push(Span::styled(
            format!("   Average {}", price(summary.average)),
            Style::default().fg(Color::Yellow),
        ));
    }
    let counts: Vec<Span> = series
        .iter()
        .map(|p| {
            Span::raw(format!(
                " {}: {} offer{} ",
                p.date_label,
                p.offer_count,
                if p.offer_count == 1 { "" } else { "s" }
            ))
        })
        .collect();

    f.render_widget(
        Paragraph::new(vec![Line::from(spans), Line::from(counts)])
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::TOP)),
        chunks[1],
    );
}

fn render_filters_view(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let filters = session.filters();
    let baseline = session.baseline_range();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let currency = session
        .criteria()
        .map(|c| c.currency_code().to_string())
        .unwrap_or_else(|| "USD".to_string());
    let price = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Price: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(
                    "{} – {}",
                    format_currency(filters.price_range.min(), &currency),
                    format_currency(filters.price_range.max(), &currency)
                ),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!(
                    "   (available {} – {})",
                    format_currency(baseline.min(), &currency),
                    format_currency(baseline.max(), &currency)
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ])
    .block(
        Block::default()
            .title(" Price Range ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(price, chunks[0]);

    let items: Vec<ListItem> = app
        .filter_rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let (checked, label) = match row {
                FilterRow::Stops(stop) => (
                    filters.stops.contains(stop),
                    match stop {
                        0 => "Non-stop".to_string(),
                        1 => "1 Stop".to_string(),
                        _ => "2+ Stops".to_string(),
                    },
                ),
                FilterRow::Airline(airline) => (
                    filters.airlines.contains(&airline.code),
                    format!("{} ({})", airline.name, airline.code),
                ),
            };
            let style = if i == app.filter_cursor {
                Style::default()
                    .fg(Color::Cyan)
                    .bg(Color::Rgb(30, 30, 60))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" [{}] {}", if checked { "x" } else { " " }, label)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Stops & Airlines ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(list, chunks[1]);
}

fn render_airports_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let cursor = if app.tick_count % 6 < 3 { "▏" } else { " " };
    let input = Paragraph::new(format!(" {}{}", app.airport_query, cursor)).block(
        Block::default()
            .title(" Airport / City Search ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(input, chunks[0]);

    let block = Block::default().title(" Matches ").borders(Borders::ALL);

    if let Some(keyword) = &app.airport_pending {
        f.render_widget(
            Paragraph::new(format!("Looking up '{}'...", keyword)).block(block),
            chunks[1],
        );
        return;
    }
    if let Some(err) = &app.airport_error {
        f.render_widget(
            Paragraph::new(err.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(block),
            chunks[1],
        );
        return;
    }

    let items: Vec<ListItem> = app
        .airports
        .iter()
        .enumerate()
        .map(|(i, airport)| {
            let style = if i == app.airport_selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            let label = format_airport(
                &airport.iata_code,
                Some(airport.name.as_str()),
                airport.city_name(),
            );
            ListItem::new(format!(" {:<7} {}", airport.sub_type, label)).style(style)
        })
        .collect();

    f.render_widget(List::new(items).block(block), chunks[1]);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.view_mode {
        ViewMode::Results | ViewMode::PriceGraph => {
            " ↑/↓ select   s sort   r re-run   1 results  2 chart  3 filters  4 airports   q quit"
        }
        ViewMode::Filters => {
            " ↑/↓ move   Space toggle   [ ] min price   { } max price   c clear   s sort   q quit"
        }
        ViewMode::Airports => {
            " type keyword   Enter search   ↑/↓ select   Ctrl+O origin   Ctrl+D destination   Esc back"
        }
    };
    let text = match &app.status_message {
        Some(msg) => Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Yellow))),
        None => Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))),
    };
    f.render_widget(Paragraph::new(text), area);
}

fn status_placeholder(status: &SearchStatus) -> Option<Paragraph<'_>> {
    let (text, color) = match status {
        SearchStatus::Idle => ("Waiting for a search.".to_string(), Color::DarkGray),
        SearchStatus::Loading => ("Searching for flights...".to_string(), Color::Yellow),
        SearchStatus::Failed { message, auth: true } => (
            format!(
                "Could not authenticate with the flight API. Check client_id / client_secret.\n\n{}",
                message
            ),
            Color::Red,
        ),
        SearchStatus::Failed { message, .. } => (
            format!("Something went wrong while searching. Press r to retry.\n\n{}", message),
            Color::Red,
        ),
        SearchStatus::Ready => return None,
    };
    Some(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL)),
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}
