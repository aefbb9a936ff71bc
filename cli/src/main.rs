//! # finrag CLI
//!
//! Answers customer questions from a knowledge base of financial articles.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `finrag embed` | Embed the article corpus, reusing the cache when it is current |
//! | `finrag search "<question>"` | Show the closest articles with their scores |
//! | `finrag run` | Answer every question and write the submission CSV |
//!
//! Settings come from an optional TOML file (`--config`), then `.env` and
//! the environment (`EMBEDDER_API_KEY`, `LLM_API_KEY`), then the flags below.

mod commands;
mod progress;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use finrag_embeddings::{LogProgress, ProgressSink};
use finrag_retrieval::{EmbedField, RetrievalConfig};
use tracing_subscriber::EnvFilter;

use crate::progress::BarProgress;

#[derive(Parser, Debug)]
#[command(name = "finrag", version, about = "Retrieval-augmented answers over a financial knowledge base")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Articles CSV (must contain an `id` column).
    #[arg(long, global = true)]
    articles: Option<PathBuf>,

    /// Questions CSV.
    #[arg(long, global = true)]
    questions: Option<PathBuf>,

    /// Where to write the answered questions.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Embedding cache file.
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Questions answered in parallel.
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Texts per embedding batch.
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Embed full article text instead of annotations.
    #[arg(long, global = true)]
    use_text: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed the corpus and refresh the cache.
    Embed,

    /// Rank articles against a question.
    Search {
        question: String,

        /// Number of articles to show.
        #[arg(short = 'k', long, default_value_t = 3)]
        limit: usize,
    },

    /// Answer all questions and write the output CSV.
    Run,
}

impl Cli {
    fn apply(&self, config: &mut RetrievalConfig) {
        let data = &mut config.data;
        if let Some(path) = &self.articles {
            data.articles_path = path.clone();
        }
        if let Some(path) = &self.questions {
            data.questions_path = path.clone();
        }
        if let Some(path) = &self.output {
            data.output_path = path.clone();
        }
        if let Some(path) = &self.cache {
            data.cache_path = path.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(batch_size) = self.batch_size {
            config.embedding.batch_size = batch_size;
        }
        if self.use_text {
            config.embed_field = EmbedField::Text;
        }
    }
}

/// Bars on a terminal, log lines otherwise.
fn progress_sink() -> Box<dyn ProgressSink> {
    if std::io::stderr().is_terminal() {
        Box::new(BarProgress::new())
    } else {
        Box::new(LogProgress::new())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = RetrievalConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let progress = progress_sink();
    let progress = progress.as_ref();
    match &cli.command {
        Command::Embed => commands::embed(&config, progress).await,
        Command::Search { question, limit } => {
            commands::search(&config, question, *limit, progress).await
        }
        Command::Run => commands::run(&config, progress).await,
    }
}
