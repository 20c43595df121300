//! SQLite card store and host wiring for the review scheduler.

pub mod db;
pub mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use review_core::{Grade, ReviewCollection, SystemClock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::SqliteCardSource;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "review-store")]
#[command(version, about = "Spaced repetition review queue backed by SQLite", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show per-state totals and the next due cards (default)
    Summary {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Add new cards for a note
    Add {
        note_id: i64,
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Show the outcome of each grade for a card
    Preview { card_id: i64 },
    /// Answer a card with a grade from 0 (fail severe) to 5 (easy)
    Answer { card_id: i64, grade: u8 },
    Suspend { card_id: i64 },
    Dismiss { card_id: i64 },
    Restore { card_id: i64 },
    /// Print a card's review history
    History { card_id: i64 },
}

pub fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = Settings::from_env();

    if let Some(parent) = settings.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
    }

    tracing::info!(path = ?settings.db_path, "opening card database");
    let source = SqliteCardSource::open(&settings.db_path, SystemClock)
        .with_context(|| format!("Failed to open database: {:?}", settings.db_path))?;

    // A config file wins over the stored config; the file's policy is then persisted.
    let config = match settings.collection_config()? {
        Some(config) => {
            source.save_config(&config)?;
            config
        }
        None => source.load_config()?.unwrap_or_default(),
    };
    tracing::info!(
        algorithm = config.algorithm().name(),
        version = config.algorithm().version(),
        "scheduler configured"
    );

    let collection = ReviewCollection::new(source, config);
    execute(&collection, args.command.unwrap_or(Command::Summary { limit: 10 }))
}

/// Run one command against a collection, printing results to stdout.
pub fn execute<C: review_core::Clock>(
    collection: &ReviewCollection<SqliteCardSource<C>>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Summary { limit } => {
            let stats = collection.stats()?;
            println!(
                "{} cards: {} new, {} learning, {} due, {} suspended, {} dismissed",
                stats.total_cards,
                stats.new_cards,
                stats.learning_cards,
                stats.due_cards,
                stats.suspended_cards,
                stats.dismissed_cards
            );
            println!("{} ready for review (average ease {:.2})", stats.due_now, stats.average_ease);
            for card in collection.next_due(limit)? {
                println!("  #{} [{}] due {}", card.id(), card.state(), card.due_at().to_rfc3339());
            }
        }
        Command::Add { note_id, count } => {
            for _ in 0..count {
                let card = collection.source().insert_new_card(note_id, collection.config())?;
                println!("added card #{} for note {}", card.id(), note_id);
            }
        }
        Command::Preview { card_id } => {
            for info in collection.preview(card_id)? {
                println!(
                    "  {:<11} -> {:<8} in {:>5} (ease {:.2})",
                    info.grade.as_str(),
                    info.state.as_str(),
                    info.label(),
                    info.ease_factor
                );
            }
        }
        Command::Answer { card_id, grade } => {
            let grade = Grade::from_value(grade)?;
            let card = collection.answer(card_id, grade)?;
            println!(
                "card #{} is {}; next review in {} ({})",
                card.id(),
                card.state(),
                card.interval(),
                card.due_at().to_rfc3339()
            );
        }
        Command::Suspend { card_id } => print_state(&collection.suspend(card_id)?),
        Command::Dismiss { card_id } => print_state(&collection.dismiss(card_id)?),
        Command::Restore { card_id } => print_state(&collection.restore(card_id)?),
        Command::History { card_id } => {
            for record in collection.source().review_log(card_id)? {
                println!(
                    "  {} {:<11} {} -> {} interval {} -> {}",
                    record.reviewed_at.to_rfc3339(),
                    record.grade.as_str(),
                    record.state_before,
                    record.state_after,
                    record.interval_before,
                    record.interval_after
                );
            }
        }
    }
    Ok(())
}

fn print_state(card: &review_core::Card) {
    println!("card #{} is {}", card.id(), card.state());
}
