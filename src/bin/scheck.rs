//! CLI entry point for the `scheck` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use scripture_check::cli::commands;
use scripture_check::config::EngineConfig;
use scripture_check::history::JsonlHistory;
use scripture_check::types::{Claim, ClaimType};
use scripture_check::ScriptureError;

#[derive(Parser)]
#[command(
    name = "scheck",
    about = "scheck: check claims about scripture against a passage corpus"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a claim and print a verdict with citations
    Check {
        /// The claim text
        claim: String,
        /// Language tag of the claim
        #[arg(long, default_value = "en")]
        language: String,
        /// Claim type hint: textual, historical, theological, mixed
        #[arg(long)]
        hint: Option<String>,
        /// Directory of JSON corpus files (default: built-in sample corpus)
        #[arg(long)]
        corpus: Option<PathBuf>,
        /// Skip embeddings and use keyword matching only
        #[arg(long)]
        offline: bool,
        /// Append the result to this JSON-lines history file
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// List scripture references found in text
    Refs {
        /// Text to scan
        text: String,
    },
    /// Classify a claim and show which rules fired
    Classify {
        /// The claim text
        text: String,
    },
    /// Show raw retrieval hits for a query
    Search {
        /// Query text
        query: String,
        /// Language tag of the query
        #[arg(long, default_value = "en")]
        language: String,
        /// Directory of JSON corpus files
        #[arg(long)]
        corpus: Option<PathBuf>,
        /// Maximum hits to show
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Skip embeddings and use keyword matching only
        #[arg(long)]
        offline: bool,
    },
    /// Summarize a corpus
    Corpus {
        /// Directory of JSON corpus files
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
    /// List stored results, newest first
    History {
        /// History file (default: data directory)
        #[arg(long)]
        history: Option<PathBuf>,
        /// Maximum results
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Results to skip
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Print the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let (config, config_source) = match &cli.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => (config, Some(path.clone())),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(3);
            }
        },
        None => EngineConfig::load_or_default_from(&EngineConfig::default_path()),
    };

    let result = match cli.command {
        Commands::Check {
            claim,
            language,
            hint,
            corpus,
            offline,
            history,
        } => {
            let mut claim = Claim::new(claim).language(language);
            if let Some(hint) = hint {
                match ClaimType::from_name(&hint) {
                    Some(ct) => claim = claim.hint(ct),
                    None => {
                        eprintln!("Invalid claim type: {}", hint);
                        process::exit(2);
                    }
                }
            }
            commands::cmd_check(
                &config,
                &claim,
                corpus.as_deref(),
                offline,
                history.as_deref(),
                json,
            )
        }
        Commands::Refs { text } => commands::cmd_refs(&config, &text, json),
        Commands::Classify { text } => commands::cmd_classify(&config, &text, json),
        Commands::Search {
            query,
            language,
            corpus,
            limit,
            offline,
        } => commands::cmd_search(
            &config,
            &query,
            &language,
            corpus.as_deref(),
            limit,
            offline,
            json,
        ),
        Commands::Corpus { corpus } => commands::cmd_corpus(corpus.as_deref(), json),
        Commands::History {
            history,
            limit,
            offset,
        } => {
            let path = history.unwrap_or_else(JsonlHistory::default_path);
            commands::cmd_history(&path, limit, offset, json)
        }
        Commands::Config => commands::cmd_config(&config, config_source.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            ScriptureError::Io(_) => 1,
            ScriptureError::EmptyClaim => 2,
            ScriptureError::InvalidConfig(_) | ScriptureError::Toml(_) => 3,
            ScriptureError::IndexNotBuilt => 4,
            _ => 5,
        };
        process::exit(code);
    }
}
