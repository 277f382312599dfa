use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use farefinder_tui::{
    app::{App, Command},
    cli::Cli,
    config::Config,
    events::{Event, EventHandler},
    logging,
    retry::RetryPolicy,
    session::search_with_retry,
    ui, FlightApiClient,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load_from(&cli.config);

    // Instrumentation and safety
    let _log_guard = logging::initialize_logging(&loaded.config.logging);
    loaded.report();
    let config = loaded.config;
    color_eyre::install()?;
    install_panic_hook();

    if !config.has_credentials() {
        warn!("No API credentials configured; the first search will fail to authenticate.");
    }

    let criteria = cli
        .criteria(&config.search)
        .wrap_err("invalid search options")?;
    let client = Arc::new(
        FlightApiClient::new(&config.api).wrap_err("could not create the flight API client")?,
    );

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new(config.ui.default_sort);
    let mut events = EventHandler::new(config.ui.tick_rate_ms);

    let first = app.submit_search(criteria);
    dispatch(first, &client, &events.tx);

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        if let Some(event) = events.next().await {
            match event {
                Event::Tick => app.on_tick(),
                Event::Input(key) => {
                    if let Some(command) = app.handle_key(key) {
                        dispatch(command, &client, &events.tx);
                    }
                }
                Event::SearchFinished { ticket, result } => app.on_search_finished(ticket, result),
                Event::AirportsFinished { keyword, result } => {
                    app.on_airports_finished(keyword, result)
                }
            }
        }
    }

    restore_terminal(terminal)?;
    info!("Exiting.");
    Ok(())
}

/// Runs a command from the app on a background task; its result comes back
/// through the event channel.
fn dispatch(command: Command, client: &Arc<FlightApiClient>, tx: &UnboundedSender<Event>) {
    let client = Arc::clone(client);
    let tx = tx.clone();

    match command {
        Command::Search { ticket, criteria } => {
            tokio::spawn(async move {
                let result = search_with_retry(&client, &criteria, RetryPolicy::default()).await;
                let _ = tx.send(Event::SearchFinished { ticket, result });
            });
        }
        Command::LookupAirports(keyword) => {
            tokio::spawn(async move {
                let result = client.search_airports(&keyword).await;
                let _ = tx.send(Event::AirportsFinished { keyword, result });
            });
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen, crossterm::cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
        original_hook(panic_info);
    }));
}
