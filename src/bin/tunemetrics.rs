//! tunemetrics: guess-the-track CLI.
//!
//! Builds rounds from an artist's catalog, dumps catalogs, and plays a
//! text-only game in the terminal.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use tunemetrics::config::{Config, Secrets};
use tunemetrics::proxy::Credentials;
use tunemetrics::round::GameSession;
use tunemetrics::ticker::Ticker;
use tunemetrics::{GameService, TuneError, TuneMetricsBuilder};

/// Guess-the-track round builder
#[derive(Parser)]
#[command(name = "tunemetrics")]
#[command(version = tunemetrics::PKG_VERSION)]
#[command(about = "Build guess-the-track rounds from an artist catalog")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build one round and print it as JSON
    Round {
        /// Upstream artist id
        artist_id: String,
        /// User access token
        #[arg(long, env = "TUNEMETRICS_TOKEN")]
        token: String,
    },

    /// Print an artist's catalog as JSON
    Catalog {
        /// Upstream artist id
        artist_id: String,
        /// User access token (client credentials are used when omitted)
        #[arg(long, env = "TUNEMETRICS_TOKEN")]
        token: Option<String>,
    },

    /// Play a game in the terminal
    Play {
        /// Upstream artist id
        artist_id: String,
        /// User access token
        #[arg(long, env = "TUNEMETRICS_TOKEN")]
        token: String,
        /// Number of rounds
        #[arg(short, long, default_value_t = tunemetrics::round::session::DEFAULT_ROUNDS)]
        rounds: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let service = TuneMetricsBuilder::from_config(&config, &secrets).build()?;

    info!(version = tunemetrics::version_string(), "tunemetrics starting");

    match args.command {
        Command::Round { artist_id, token } => {
            match service.build_round(&artist_id, &token).await? {
                Some(round) => println!("{}", serde_json::to_string_pretty(&round)?),
                None => println!("null"),
            }
        }

        Command::Catalog { artist_id, token } => {
            let credentials = match token {
                Some(token) => Credentials::Token(token),
                None => Credentials::Client,
            };
            let tracks = service.artist_catalog(&artist_id, &credentials).await?;
            println!("{}", serde_json::to_string_pretty(&tracks)?);
        }

        Command::Play {
            artist_id,
            token,
            rounds,
        } => play(&service, &artist_id, &token, rounds).await?,
    }

    Ok(())
}

async fn play(
    service: &GameService,
    artist_id: &str,
    token: &str,
    rounds: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::from_entropy();
    let mut session = GameSession::new(rounds);
    let snippet = Duration::from_millis(tunemetrics::round::session::DEFAULT_SNIPPET_MS);

    while !session.is_finished() {
        let round = service
            .build_round(artist_id, token)
            .await?
            .ok_or_else(|| TuneError::InvalidInput(format!("artist {artist_id} has no playable tracks")))?;
        let options = round.options.clone();

        let snippet_start_ms = session.start_round(round, &mut rng)?.snippet_start_ms;
        println!(
            "\nround {}/{}: listen from {}s",
            session.total_rounds() - session.rounds_left(),
            session.total_rounds(),
            snippet_start_ms / 1000
        );

        let total = snippet.as_secs();
        let ticker = Ticker::spawn(Duration::from_secs(1), Some(snippet), move |tick| {
            println!("  {}s left", total.saturating_sub(tick + 1));
        })?;
        ticker.finished().await;
        session.snippet_ended()?;

        for (i, option) in options.iter().enumerate() {
            println!("  [{}] {option}", i + 1);
        }
        let choice = read_choice(options.len()).await?;
        let result = session.answer(&options[choice])?;
        if result.is_correct {
            println!("correct!");
        } else {
            println!("wrong, it was {}", result.correct_answer);
        }
    }

    println!("\nscore: {}/{}", session.score(), session.total_rounds());
    Ok(())
}

/// Read a 1-based option number from stdin, returning the 0-based index.
async fn read_choice(count: usize) -> Result<usize, Box<dyn std::error::Error>> {
    loop {
        print!("your guess: ");
        io::stdout().flush()?;
        let (read, line) = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().read_line(&mut line).map(|read| (read, line))
        })
        .await??;
        if read == 0 {
            return Err("stdin closed before an answer was given".into());
        }

        match line.trim().parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => return Ok(n - 1),
            _ => println!("enter a number between 1 and {count}"),
        }
    }
}
