//! wxlookup - look up current weather, forecasts and a live watch view
//!
//! One-shot mode prints conditions and exits. Watch mode opens a terminal UI
//! that refreshes on an interval until you quit.

use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use wxlookup::app::WatchApp;
use wxlookup::cli::{apply_overrides, Cli, StartupConfig};
use wxlookup::config::Config;
use wxlookup::display;
use wxlookup::location::LocationQuery;
use wxlookup::logging::{self, LogTarget};
use wxlookup::refresh::{try_recv, RefreshConfig, RefreshHandle};
use wxlookup::service::WeatherService;
use wxlookup::ui;

type BoxError = Box<dyn std::error::Error>;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("wxlookup: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let log_target = if cli.watch {
        LogTarget::watch_file().unwrap_or(LogTarget::Stderr)
    } else {
        LogTarget::Stderr
    };
    logging::init(cli.verbose, log_target)?;

    let startup = StartupConfig::from_cli(&cli)?;
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&cli, &mut config)?;

    let service = Arc::new(WeatherService::from_config(&config)?);

    let query = match startup.location.clone() {
        Some(query) => query,
        None => service.locate().await?,
    };

    if startup.watch {
        let refresh = RefreshConfig {
            interval: config.refresh_interval(),
            with_forecast: startup.forecast,
            enabled: true,
        };
        return run_watch(service, query, refresh).await;
    }

    let report = service.report(&query, startup.forecast).await?;
    print!("{}", display::render_report(&report));

    if startup.suggest {
        // Suggestions are extra; a failure here should not hide the weather
        match service.suggest(&query).await {
            Ok(places) => print!("\n{}", display::render_suggestions(&places)),
            Err(err) => eprintln!("wxlookup: suggestions unavailable: {}", err),
        }
    }

    Ok(())
}

/// Runs the live view until the user quits
async fn run_watch(
    service: Arc<WeatherService>,
    query: LocationQuery,
    refresh: RefreshConfig,
) -> Result<(), BoxError> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = WatchApp::new(query.to_string());
    let mut handle = RefreshHandle::spawn(service, query, refresh);

    let result = event_loop(&mut terminal, &mut app, &mut handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    handle.shutdown().await;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut WatchApp,
    handle: &mut RefreshHandle,
) -> Result<(), BoxError> {
    loop {
        while let Some(message) = try_recv(handle) {
            app.apply(message);
        }

        // Render UI
        terminal.draw(|f| ui::render_watch(f, app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.take_refresh_request() {
            handle.request_refresh();
        }

        // Check if we should quit
        if app.should_quit {
            return Ok(());
        }
    }
}
