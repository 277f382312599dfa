//! Parsing and display of the compact `PT#H#M` duration tokens used by the
//! flight-offers API for itinerary and segment lengths.
//!
//! Parsing is best effort: a token with no recognisable hour or minute part
//! yields zero, which callers must read as "unknown" rather than "instant".

use std::fmt;

/// Hour and minute components read from a duration token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationParts {
    pub hours: u32,
    pub minutes: u32,
}

impl DurationParts {
    pub fn total_minutes(&self) -> u32 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }
}

impl fmt::Display for DurationParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hours, self.minutes) {
            (0, m) => write!(f, "{}m", m),
            (h, 0) => write!(f, "{}h", h),
            (h, m) => write!(f, "{}h {}m", h, m),
        }
    }
}

/// Reads the hour and minute parts of a token such as `PT2H30M`.
///
/// Each part is a run of digits immediately followed by its designator
/// (`H` or `M`). Absent parts count as zero, and so does any run of digits
/// that overflows.
pub fn parse_duration(text: &str) -> DurationParts {
    let mut parts = DurationParts::default();
    let mut digits = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if !digits.is_empty() {
            let value = digits.parse::<u32>().unwrap_or(0);
            match c {
                'H' => parts.hours = value,
                'M' => parts.minutes = value,
                _ => {}
            }
            digits.clear();
        }
    }

    parts
}

/// Total length of a duration token in minutes; zero when malformed.
pub fn parse_duration_minutes(text: &str) -> u32 {
    parse_duration(text).total_minutes()
}

/// Human readable rendering of a duration token, e.g. `"2h 30m"`.
pub fn format_duration(text: &str) -> String {
    parse_duration(text).to_string()
}
