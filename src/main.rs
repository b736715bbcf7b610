use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fxcard::app::{App, Popup};
use fxcard::card::{ConverterCard, FetchStatus};
use fxcard::config::AppConfig;
use fxcard::currency::flags::flag_emoji;
use fxcard::currency::Currency;
use fxcard::exchange::RateClient;
use fxcard::{theme, ui};

#[derive(Parser, Debug)]
#[command(name = "fxcard")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "A terminal currency converter card")]
struct Args {
    /// Currency to convert from (e.g. USD)
    #[arg(short, long)]
    from: Option<String>,

    /// Currency to convert to (e.g. KES)
    #[arg(short, long)]
    to: Option<String>,

    /// Amount to convert
    #[arg(short, long)]
    amount: Option<String>,

    /// Fetch a single conversion, print it and exit
    #[arg(long)]
    once: bool,

    /// With --once, print the result as JSON
    #[arg(long, requires = "once")]
    json: bool,

    /// List supported currencies and exit
    #[arg(short, long)]
    list: bool,

    /// Rate API key (overrides FXCARD_API_KEY and config.toml)
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The TUI owns the terminal, so it logs to a file instead
    let interactive = !(args.once || args.list);
    init_logging(interactive);

    if args.list {
        return list_currencies();
    }

    let config = AppConfig::load().unwrap_or_default();
    let card = build_card(&args, &config)?;

    if args.once {
        return print_once(card, args.json).await;
    }

    ui::init_theme(theme::Theme::from_config(&config.theme));
    run_tui(card).await
}

fn init_logging(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_file = if interactive {
        log_path().and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        })
    } else {
        None
    };

    match log_file {
        Some(file) => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(std::sync::Mutex::new(file)))
            .with(filter)
            .init(),
        None if interactive => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
            .with(filter)
            .init(),
        None => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init(),
    }
}

fn log_path() -> Option<PathBuf> {
    let dir = dirs::state_dir().or_else(dirs::cache_dir)?.join("fxcard");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join("fxcard.log"))
}

fn parse_currency(code: &str) -> Result<Currency> {
    Currency::parse(code).with_context(|| format!("Unsupported currency: {} (see --list)", code))
}

/// Build the card from CLI flags, falling back to config and environment
fn build_card(args: &Args, config: &AppConfig) -> Result<ConverterCard> {
    let from = parse_currency(args.from.as_deref().unwrap_or(&config.default_from))?;
    let to = parse_currency(args.to.as_deref().unwrap_or(&config.default_to))?;
    let amount = args.amount.as_deref().unwrap_or(&config.default_amount);

    let api_key = args.api_key.clone().or_else(|| config.resolve_api_key());
    if api_key.is_none() {
        tracing::warn!("No API key configured; rate requests will fail");
    }

    let client = RateClient::new(&config.api_base_url, api_key, config.request_timeout())?;
    Ok(ConverterCard::new(client, &config.flag_base_url, amount, from, to))
}

fn list_currencies() -> Result<()> {
    for c in Currency::all() {
        let emoji = flag_emoji(c.flag_code()).unwrap_or_default();
        println!("{}  {}  {}", c.code(), c.flag_code(), emoji);
    }
    Ok(())
}

async fn print_once(mut card: ConverterCard, json: bool) -> Result<()> {
    card.fetch_exchange_rate();
    let result = card.settle().await.unwrap_or_default().to_string();

    if json {
        let output = serde_json::json!({
            "text": result,
            "ok": card.status() == FetchStatus::Success,
            "amount": card.amount(),
            "from": card.from_currency().code(),
            "to": card.to_currency().code(),
            "from_flag": card.from_flag().image_url,
            "to_flag": card.to_flag().image_url,
            "last_updated": card.last_updated(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", result);
    }

    if card.status() == FetchStatus::Error {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_tui(card: ConverterCard) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(card);
    app.start();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Let spawned fetches make progress between polls
        tokio::task::yield_now().await;
        app.tick();
    }
}
