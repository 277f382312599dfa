//! Event types and the main event loop driver for the terminal front end.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks, and the
//! results of background API calls) and the [`EventHandler`], which runs a
//! background task that polls crossterm for key events and emits periodic
//! [`Event::Tick`]s. The main loop in `main.rs` receives events via
//! [`EventHandler::next`]; API tasks post their results via [`EventHandler::tx`].

use crate::error::ApiError;
use crate::models::{AirportList, FlightSearchResponse};
use crate::session::SearchTicket;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::error;

/// Events processed by the application event loop.
pub enum Event {
    /// Periodic tick used for UI refresh (spinner, elapsed time).
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// A flight search finished, successfully or not.
    SearchFinished {
        /// Ticket issued when the search was submitted; stale tickets are ignored.
        ticket: SearchTicket,
        result: Result<FlightSearchResponse, ApiError>,
    },
    /// An airport lookup finished.
    AirportsFinished {
        /// Keyword the lookup was issued for.
        keyword: String,
        result: Result<AirportList, ApiError>,
    },
}

/// Multiplexes terminal input, ticks and API results into one event stream.
///
/// The sender ([`tx`](EventHandler::tx)) can be cloned into spawned API
/// tasks, while the receiver is consumed by [`next`](EventHandler::next) in
/// the main loop.
pub struct EventHandler {
    /// Sender for posting events (e.g. from a search task).
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The task polls crossterm with a timeout of `tick_rate_ms`, sending
    /// [`Event::Input`] on key press and [`Event::Tick`] whenever the interval
    /// elapses. It stops if the terminal can no longer be read.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            event_tx.send(Event::Input(key)).ok();
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    ///
    /// Returns `None` when all senders have been dropped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
