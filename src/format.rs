//! Display helpers shared by the terminal views.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// Whole-unit price with grouped thousands, e.g. `$1,235` or `CHF 980`.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = group_thousands(rounded.abs() as u64);

    match currency_symbol(currency) {
        Some(symbol) => format!("{}{}{}", sign, symbol, digits),
        None => format!("{}{} {}", sign, currency, digits),
    }
}

/// Same as [`format_currency`] for decimal strings as the API sends them.
pub fn format_currency_str(amount: &str, currency: &str) -> String {
    format_currency(amount.trim().parse::<f64>().unwrap_or(0.0), currency)
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        "CAD" => Some("CA$"),
        "AUD" => Some("A$"),
        _ => None,
    }
}

fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `Jun 1, 8:05 AM`
pub fn format_date_time(at: &NaiveDateTime) -> String {
    at.format("%b %-d, %-I:%M %p").to_string()
}

/// `8:05 AM`
pub fn format_time(at: &NaiveDateTime) -> String {
    at.format("%-I:%M %p").to_string()
}

/// `Jun 1, 2024`
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `2024-06-01`, the form the search endpoint expects.
pub fn format_date_for_api(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_airport(code: &str, name: Option<&str>, city: Option<&str>) -> String {
    match (name, city) {
        (_, Some(city)) if !city.is_empty() => format!("{} - {}", code, city),
        (Some(name), _) if !name.is_empty() => format!("{} - {}", code, name),
        _ => code.to_string(),
    }
}

pub fn stops_text(stops: u32) -> String {
    match stops {
        0 => "Non-stop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    }
}

/// Carrier display name from the response dictionary, or the code itself.
pub fn airline_name<'a>(code: &'a str, carriers: &'a HashMap<String, String>) -> &'a str {
    carriers.get(code).map(String::as_str).unwrap_or(code)
}
