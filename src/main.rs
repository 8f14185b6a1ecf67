mod api;
mod app;
mod commands;
mod config;
mod debounce;
mod events;
mod favorites;
mod filters;
mod logging;
mod normalize;
mod search;
mod storage;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;

use api::ApiClient;
use app::App;
use config::{Config, DEFAULT_API_URL};
use filters::EventCategory;
use normalize::DEFAULT_DATE_FORMAT;
use search::DEFAULT_PAGE_SIZE;

#[derive(Parser, Debug)]
#[command(name = "event-explorer")]
#[command(about = "Terminal client for discovering live events", long_about = None)]
struct Args {
    /// Discovery API base URL
    #[arg(long, default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Discovery API key
    #[arg(long, env = "TICKETMASTER_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "10", global = true)]
    timeout: u64,

    /// Directory for favorites and the dashboard log
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Events per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, global = true)]
    page_size: u32,

    /// strftime pattern used to display event dates
    #[arg(long, default_value = DEFAULT_DATE_FORMAT, global = true)]
    date_format: String,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the interactive dashboard
    #[command(name = "explore", alias = "tui")]
    Explore,

    /// Search one page of events
    #[command(name = "search")]
    Search {
        /// Free-text keyword (artist, team, genre)
        #[arg(short, long, default_value = "")]
        keyword: String,
        /// City name
        #[arg(short, long, default_value = "")]
        city: String,
        /// all, music, sports, arts, film or misc
        #[arg(long, default_value = "all")]
        category: EventCategory,
        /// Zero-based page index
        #[arg(short, long, default_value = "0")]
        page: u32,
    },

    /// Show the full details of an event
    #[command(name = "show")]
    Show {
        /// Event ID
        event_id: String,
    },

    /// List saved favorites
    #[command(name = "favorites")]
    Favorites,

    /// Toggle an event in favorites
    #[command(name = "favorite")]
    Favorite {
        /// Event ID
        event_id: String,
    },

    /// Remove an event from favorites
    #[command(name = "unfavorite")]
    Unfavorite {
        /// Event ID
        event_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::new(
        args.api_url,
        args.api_key,
        args.timeout,
        args.data_dir,
        args.page_size,
        args.date_format,
        args.log_level,
    )?;

    match args.command {
        Some(Commands::Search {
            keyword,
            city,
            category,
            page,
        }) => {
            logging::init_stderr(&config);
            commands::search(&config, keyword, city, category, page).await?;
        }

        Some(Commands::Show { event_id }) => {
            logging::init_stderr(&config);
            commands::show(&config, &event_id).await?;
        }

        Some(Commands::Favorites) => {
            logging::init_stderr(&config);
            commands::list_favorites(&config)?;
        }

        Some(Commands::Favorite { event_id }) => {
            logging::init_stderr(&config);
            commands::favorite(&config, &event_id).await?;
        }

        Some(Commands::Unfavorite { event_id }) => {
            logging::init_stderr(&config);
            commands::unfavorite(&config, &event_id)?;
        }

        // Dashboard mode (default)
        Some(Commands::Explore) | None => {
            logging::init_dashboard(&config);
            run_tui(&config).await?;
        }
    }

    Ok(())
}

async fn run_tui(config: &Config) -> Result<()> {
    // Fail before touching the terminal
    let client = ApiClient::new(config.api_url.clone(), config.api_key()?.to_string(), config.timeout_secs)?;
    let favorites = commands::open_favorites(config);
    tracing::info!(favorites = favorites.len(), "starting dashboard");

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(client, config.date_formatter(), favorites, config.page_size);
    let res = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "dashboard exited with an error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
