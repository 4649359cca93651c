pub mod commands;
pub mod render;

use clap::{Parser, Subcommand};
use marquee_core::config::{AppConfig, LoadOptions, LogFormat};
use marquee_core::domain::intent::{BookingRequest, IntentRequest};
use marquee_core::domain::showtime::ShowId;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "marquee",
    about = "Movie booking assistant",
    long_about = "Chat with the booking assistant, query and book showtimes directly, seed the demo inventory, and inspect configuration.",
    after_help = "Examples:\n  marquee seed\n  marquee movies --location Delhi\n  marquee book --show-id S1 --seats 2\n  marquee chat"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive booking conversation (requires an LLM)")]
    Chat,
    #[command(about = "List movies playing in a city")]
    Movies {
        #[arg(long)]
        location: String,
        #[arg(long, help = "Render for humans instead of JSON")]
        text: bool,
    },
    #[command(about = "Show showtimes for a movie in a city")]
    Showtimes {
        #[arg(long = "movie")]
        movie_name: String,
        #[arg(long)]
        location: String,
        #[arg(long, help = "Render for humans instead of JSON")]
        text: bool,
    },
    #[command(about = "Book seats for a showtime")]
    Book {
        #[arg(long)]
        show_id: String,
        #[arg(long, allow_negative_numbers = true)]
        seats: i64,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long, help = "Render for humans instead of JSON")]
        text: bool,
    },
    #[command(about = "Write the demo inventory into the configured store")]
    Seed {
        #[arg(long, help = "Overwrite an inventory that already holds movies")]
        force: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, inventory store readiness, and LLM credentials")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Chat => commands::chat::run(),
        Command::Movies { location, text } => {
            commands::query::run("movies", IntentRequest::ListMovies { location }, text)
        }
        Command::Showtimes { movie_name, location, text } => commands::query::run(
            "showtimes",
            IntentRequest::GetShowtimes { movie_name, location },
            text,
        ),
        Command::Book { show_id, seats, user_id, text } => commands::query::run(
            "book",
            IntentRequest::BookTicket(BookingRequest { show_id: ShowId(show_id), seats, user_id }),
            text,
        ),
        Command::Seed { force } => commands::seed::run(force),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Sends tracing output to stderr so stdout carries only command results.
/// Commands report configuration errors themselves, so a config that fails
/// to load just leaves logging off.
fn init_logging() {
    use LogFormat::*;

    let Ok(config) = AppConfig::load(LoadOptions::default()) else {
        return;
    };
    let Ok(log_level) = config.logging.max_level() else {
        return;
    };
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded; keep it.
    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
