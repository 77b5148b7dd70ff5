//! `falsify`: command-line front end for the deepfake-detection backend.
//!
//! Uploads media for analysis, keeps a per-category history of the results
//! in a local SQLite file, and collects feedback on the verdicts.
//!
//! # Usage
//!
//! ```
//! falsify analyze portrait.jpg
//! falsify history image --filter fake
//! falsify feedback 1700000000000 --actual real
//! falsify --server-url http://detector:5000 stats
//! ```

mod render;
mod settings;

use std::{
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use falsify_client::BackendClient;
use falsify_core::{
  Category, HistoryFilter, HistoryLedger,
  feedback::{FeedbackInput, FeedbackWorkflow},
  record::AnalysisRecord,
  storage::HistoryStorage,
};
use falsify_store_sqlite::SqliteStorage;
use settings::{Overrides, Settings};
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

type Ledger = HistoryLedger<SqliteStorage>;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "falsify", version, about = "Deepfake and AI-content detection client")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, global = true, default_value = "falsify.toml")]
  config: PathBuf,

  /// Base URL of the detection backend (default: http://localhost:5000).
  #[arg(long, global = true, env = "FALSIFY_SERVER_URL")]
  server_url: Option<String>,

  /// Location of the history database.
  #[arg(long, global = true, env = "FALSIFY_STORE_PATH")]
  store_path: Option<PathBuf>,

  /// HTTP request timeout in seconds (default: 30).
  #[arg(long, global = true, env = "FALSIFY_REQUEST_TIMEOUT_SECS")]
  timeout: Option<u64>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Upload a file for analysis and record the result.
  Analyze {
    file:     PathBuf,
    /// Override the category inferred from the file extension.
    #[arg(long)]
    category: Option<Category>,
  },

  /// List the recorded analyses of one category, newest first.
  History {
    category: Category,
    #[arg(long, default_value_t = HistoryFilter::All)]
    filter:   HistoryFilter,
  },

  /// Show one recorded analysis in full.
  Show { id: String },

  /// Confirm or correct the verdict of a recorded analysis.
  Feedback {
    id:     String,
    /// The verdict was right.
    #[arg(long, conflicts_with = "actual", required_unless_present = "actual")]
    agree:  bool,
    /// The verdict was wrong; this is what the content actually is.
    #[arg(long, value_enum)]
    actual: Option<Verdict>,
  },

  /// Remove the feedback from a recorded analysis.
  ClearFeedback { id: String },

  /// Delete every recorded analysis of one category.
  Clear {
    category: Category,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes:      bool,
  },

  /// Totals across every category.
  Stats,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
  Fake,
  Real,
}

impl Cli {
  fn overrides(&self) -> Overrides {
    Overrides {
      server_url:           self.server_url.clone(),
      store_path:           self.store_path.clone(),
      request_timeout_secs: self.timeout,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config, cli.overrides())?;
  debug!(?settings, "configuration loaded");

  let storage = SqliteStorage::open(&settings.store_path)
    .await
    .with_context(|| {
      format!("failed to open history at {}", settings.store_path.display())
    })?;
  let mut ledger = HistoryLedger::open(storage).await;
  let client = Arc::new(BackendClient::new(settings.client_config())?);

  run(cli.command, &mut ledger, client).await
}

async fn run(
  command: Command,
  ledger: &mut Ledger,
  client: Arc<BackendClient>,
) -> Result<()> {
  match command {
    Command::Analyze { file, category } => analyze(ledger, &client, &file, category).await,

    Command::History { category, filter } => {
      let records = ledger.list(category, filter);
      if records.is_empty() {
        println!("No {category} analyses recorded.");
      } else {
        println!("{}", render::history_header());
        for record in records {
          println!("{}", render::history_row(record));
        }
      }
      match ledger.storage().updated_at(&category.storage_key()).await {
        Ok(Some(at)) => println!("{}", render::last_saved(at)),
        Ok(None) => {}
        Err(e) => warn!(%category, error = %e, "could not read last-saved time"),
      }
      Ok(())
    }

    Command::Show { id } => {
      match ledger.find(&id) {
        Some(record) => println!("{}", render::card(record)),
        None => println!("No analysis with id {id}."),
      }
      Ok(())
    }

    Command::Feedback { id, actual, .. } => {
      let input = match actual {
        Some(verdict) => FeedbackInput::Correct {
          actually_fake: verdict == Verdict::Fake,
        },
        None => FeedbackInput::Agree,
      };
      feedback(ledger, client, &id, input).await
    }

    Command::ClearFeedback { id } => {
      let cleared = FeedbackWorkflow::new(client)
        .clear_feedback(ledger, &id)
        .await?;
      if cleared {
        println!("Feedback cleared.");
      } else {
        println!("No analysis with id {id}.");
      }
      Ok(())
    }

    Command::Clear { category, yes } => {
      let count = ledger.list(category, HistoryFilter::All).len();
      if !yes && !confirm(&format!("Delete all {count} {category} analyses?"))? {
        println!("Nothing deleted.");
        return Ok(());
      }
      ledger.clear(category).await?;
      println!("Cleared {category} history.");
      Ok(())
    }

    Command::Stats => {
      println!("{}", render::stats(&ledger.stats()));
      Ok(())
    }
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

/// Validate `file`, upload it, decode the reply, and append the record.
/// Nothing is appended unless the upload succeeds and the payload decodes.
async fn analyze<S: HistoryStorage>(
  ledger: &mut HistoryLedger<S>,
  client: &BackendClient,
  file: &Path,
  category: Option<Category>,
) -> Result<()> {
  let filename = file
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .with_context(|| format!("{} does not name a file", file.display()))?;

  let category = match category {
    Some(category) => {
      category.check_filename(&filename)?;
      category
    }
    None => Category::from_filename(&filename)
      .ok_or_else(|| falsify_core::Error::UnsupportedFile(filename.clone()))?,
  };

  info!(%category, file = %file.display(), server = client.base_url(), "analyzing");
  let response = client.upload(file).await.context("analysis failed")?;
  let record = AnalysisRecord::from_backend(
    category,
    filename,
    response.analysis_id,
    response.results,
  )?;

  println!("{}", render::card(&record));
  ledger
    .append(record)
    .await
    .context("the result could not be saved to history")
}

async fn feedback(
  ledger: &mut Ledger,
  client: Arc<BackendClient>,
  id: &str,
  input: FeedbackInput,
) -> Result<()> {
  let Some(receipt) = FeedbackWorkflow::new(client)
    .submit_feedback(ledger, id, input)
    .await?
  else {
    println!("No analysis with id {id}.");
    return Ok(());
  };

  if receipt.feedback.agrees_with_model {
    println!("Feedback recorded: the model was correct.");
  } else {
    println!(
      "Feedback recorded: the model was incorrect, actually {}.",
      if receipt.feedback.corrected_label { "FAKE" } else { "AUTHENTIC" }
    );
  }

  // Both tasks must finish before the runtime shuts down.
  if let Err(e) = receipt.notification.await {
    warn!(error = %e, "feedback delivery task failed");
  }
  if let Some(learning) = receipt.learning {
    match learning.await {
      Ok(Ok(())) => println!("Learning system updated."),
      Ok(Err(e)) => eprintln!("warning: learning system was not updated: {e}"),
      Err(e) => eprintln!("warning: learning update task failed: {e}"),
    }
  }
  Ok(())
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` is a no.
fn confirm(question: &str) -> Result<bool> {
  print!("{question} [y/N] ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin()
    .lock()
    .read_line(&mut line)
    .context("reading confirmation")?;
  Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
