mod metacog;
mod models;
mod scheduler;
mod session;
mod store;

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::warn;
use std::path::PathBuf;

use models::{JsonOutput, ReviewCard};
use store::Store;

const DEFAULT_DB_NAME: &str = "practicum.db";

#[derive(Parser)]
#[command(name = "practicum")]
#[command(about = "An adaptive practice CLI: SM-2 scheduling, calibration tracking, and session composition")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Show deck statistics
    Stats,

    /// List cards due for review, most overdue first
    Due,

    /// Compose a practice session
    #[command(subcommand)]
    Session(SessionCommands),

    /// Record an answer: updates the card schedule and the calibration log
    Answer {
        /// Question ID
        id: String,

        /// Topic of the question
        #[arg(long, short)]
        topic: String,

        /// Stated confidence before answering, 1-5
        #[arg(long, short)]
        confidence: i64,

        /// Outcome: correct/wrong
        #[arg(long, short)]
        outcome: String,
    },

    /// Rate a recall directly with a 0-5 quality score
    Review {
        /// Question ID
        id: String,

        /// Topic of the question
        #[arg(long, short)]
        topic: String,

        /// Recall quality: 0 = blackout, 5 = perfect (clamped)
        #[arg(long, short)]
        quality: i64,
    },

    /// Show calibration summary and per-topic error rates
    Calibration,
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Mix topics in random order
    Interleaved {
        /// Number of questions
        #[arg(long, short, default_value_t = 10)]
        count: usize,

        /// Comma-separated topic filter
        #[arg(long, short)]
        topics: Option<String>,

        /// Comma-separated difficulty filter
        #[arg(long, short)]
        difficulties: Option<String>,

        /// Path to the question pool JSON file
        #[arg(long, short)]
        pool: PathBuf,
    },

    /// Weight topics by historical error rate
    Adaptive {
        /// Number of questions
        #[arg(long, short, default_value_t = 10)]
        count: usize,

        /// Path to the question pool JSON file
        #[arg(long, short)]
        pool: PathBuf,
    },
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("PRACTICUM_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("practicum");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

/// Quality signal derived from stated confidence and actual correctness.
/// A correct answer is at least quality 3; a confident miss scores lower
/// than a hesitant one.
fn quality_from_answer(confidence: u8, correct: bool) -> u8 {
    if correct {
        confidence.max(3)
    } else {
        confidence.saturating_sub(1).min(2)
    }
}

fn parse_correct(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "correct" | "right" | "c" | "y" | "yes" | "1" => Some(true),
        "wrong" | "incorrect" | "w" | "n" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(0, 5) as u8
}

fn clamp_confidence(confidence: i64) -> u8 {
    confidence.clamp(1, 5) as u8
}

fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Replaces the card with the same question id, or appends a new one.
fn upsert_card(cards: &mut Vec<ReviewCard>, card: ReviewCard) {
    match cards.iter_mut().find(|c| c.question_id == card.question_id) {
        Some(slot) => *slot = card,
        None => cards.push(card),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let store = Store::open(&db_path)?;
    store.init()?;

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Stats => {
            let cards = store.load_cards();
            let stats = scheduler::deck_stats(&cards, Utc::now());

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else {
                println!("=== Deck Statistics ===");
                println!("Total cards: {}", stats.total);
                println!("Due now: {}", stats.due);
                println!("Learning: {}", stats.learning);
                println!("Reviewing: {}", stats.reviewing);
                println!("Mature: {}", stats.mature);
                println!("Accuracy: {:.1}%", stats.accuracy);
                println!("Day streak: {}", stats.streak);
            }
        }

        Commands::Due => {
            let cards = store.load_cards();
            let now = Utc::now();
            let due = scheduler::due_cards(&cards, now);

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&due))?);
            } else if due.is_empty() {
                println!("Nothing due. Come back later!");
            } else {
                println!("{:<24} {:<16} {:>8} {:>12}", "QUESTION", "TOPIC", "INTERVAL", "OVERDUE");
                println!("{}", "-".repeat(64));
                for card in due {
                    let overdue = now - card.next_review;
                    let overdue_label = if overdue.num_days() > 0 {
                        format!("{}d", overdue.num_days())
                    } else {
                        format!("{}m", overdue.num_minutes())
                    };
                    println!(
                        "{:<24} {:<16} {:>7}d {:>12}",
                        card.question_id, card.topic, card.interval, overdue_label
                    );
                }
            }
        }

        Commands::Session(session_cmd) => {
            let mut rng = rand::thread_rng();
            let questions = match session_cmd {
                SessionCommands::Interleaved {
                    count,
                    topics,
                    difficulties,
                    pool,
                } => {
                    let pool = store::load_questions(&pool);
                    session::interleaved_session(
                        &pool,
                        count,
                        &parse_list(topics),
                        &parse_list(difficulties),
                        &mut rng,
                    )
                }
                SessionCommands::Adaptive { count, pool } => {
                    let pool = store::load_questions(&pool);
                    let entries = store.load_entries();
                    session::adaptive_session(&pool, &entries, count, &mut rng)
                }
            };

            let distribution = session::session_distribution(&questions);

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "questions": questions,
                        "distribution": distribution,
                    })))?
                );
            } else if questions.is_empty() {
                println!("No questions matched. Check the pool file and filters.");
            } else {
                println!("=== Practice Session ({} questions) ===", questions.len());
                for (i, q) in questions.iter().enumerate() {
                    println!("{:>3}. {} [{} / {}]", i + 1, q.id, q.topic, q.difficulty);
                }
                println!();
                println!("Topic distribution:");
                let mut topics: Vec<_> = distribution.iter().collect();
                topics.sort();
                for (topic, n) in topics {
                    println!("  {:<16} {}", topic, n);
                }
            }
        }

        Commands::Answer {
            id,
            topic,
            confidence,
            outcome,
        } => {
            let correct = parse_correct(&outcome)
                .ok_or_else(|| format!("Invalid outcome '{}'. Use: correct or wrong", outcome))?;
            let confidence = clamp_confidence(confidence);
            let now = Utc::now();

            let mut cards = store.load_cards();
            let card = cards
                .iter()
                .find(|c| c.question_id == id)
                .cloned()
                .unwrap_or_else(|| scheduler::create_card(&id, &topic, now));

            let quality = quality_from_answer(confidence, correct);
            let updated = scheduler::calculate_next_review(&card, quality, now);
            let entry = metacog::create_entry(&id, &topic, confidence, correct, now);
            let feedback = metacog::calibration_feedback(entry.calibration);

            let mut entries = store.load_entries();
            upsert_card(&mut cards, updated.clone());
            entries.push(entry.clone());

            // The in-memory result stands even if a write is dropped.
            if let Err(e) = store.save_cards(&cards) {
                warn!("dropping card write: {}", e);
            }
            if let Err(e) = store.save_entries(&entries) {
                warn!("dropping entry write: {}", e);
            }

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "card": updated,
                        "entry": entry,
                        "feedback": feedback,
                    })))?
                );
            } else {
                println!(
                    "{} {} ({})",
                    feedback.emoji,
                    feedback.message,
                    entry.calibration.label()
                );
                println!("Tip: {}", feedback.tip);
                println!();
                println!("Quality: {} | Streak: {}", quality, updated.repetitions);
                if updated.interval == 0 {
                    println!("Back in this session at: {}", updated.next_review);
                } else {
                    println!(
                        "Next review in {} day(s): {}",
                        updated.interval, updated.next_review
                    );
                }
            }
        }

        Commands::Review { id, topic, quality } => {
            let quality = clamp_quality(quality);
            let now = Utc::now();

            let mut cards = store.load_cards();
            let card = cards
                .iter()
                .find(|c| c.question_id == id)
                .cloned()
                .unwrap_or_else(|| scheduler::create_card(&id, &topic, now));

            let updated = scheduler::calculate_next_review(&card, quality, now);
            upsert_card(&mut cards, updated.clone());

            if let Err(e) = store.save_cards(&cards) {
                warn!("dropping card write: {}", e);
            }

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&updated))?);
            } else {
                println!("Review recorded for {}.", id);
                println!(
                    "Streak: {} | Ease: {:.2} | Interval: {} day(s)",
                    updated.repetitions, updated.ease_factor, updated.interval
                );
                println!("Next review: {}", updated.next_review);
            }
        }

        Commands::Calibration => {
            let entries = store.load_entries();
            let summary = metacog::calibration_summary(&entries);
            let rates = metacog::topic_error_rates(&entries);

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "summary": summary,
                        "topicErrorRates": rates,
                    })))?
                );
            } else if entries.is_empty() {
                println!("No answers logged yet.");
            } else {
                println!("=== Calibration ===");
                println!("Total answers: {}", summary.total);
                println!("Calibrated: {}", summary.calibrated);
                println!("Overconfident: {}", summary.overconfident);
                println!("Underconfident: {}", summary.underconfident);
                println!();
                println!("{:<16} {:>8} {:>8} {:>12}", "TOPIC", "TOTAL", "ERRORS", "ERROR RATE");
                println!("{}", "-".repeat(48));
                let mut topics: Vec<_> = rates.iter().collect();
                topics.sort_by(|a, b| a.0.cmp(b.0));
                for (topic, rate) in topics {
                    println!(
                        "{:<16} {:>8} {:>8} {:>11.0}%",
                        topic,
                        rate.total,
                        rate.errors,
                        rate.error_rate * 100.0
                    );
                }
            }
        }
    }

    Ok(())
}
