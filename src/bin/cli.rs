//! book-import CLI
//!
//! Analyze a text file or page scans into an editable preview, adjust its
//! chapters, then submit it to the backend import endpoint.

use std::path::PathBuf;

use book_import::{
    error::Result,
    models::{Config, MoveDirection, PreviewBook},
    pipeline::{self, DraftEdit, ImportSource},
    services::{BackendSubmitter, GeminiAnalyzer, SessionHandle},
    storage::{DraftStorage, LocalStorage},
};
use clap::{Parser, Subcommand, ValueEnum};

/// book-import - AI-assisted book import
#[derive(Parser, Debug)]
#[command(
    name = "book-import",
    version,
    about = "Turn book text or page scans into lessons"
)]
struct Cli {
    /// Path to storage directory containing config and drafts
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a text file or page images into a draft
    Analyze {
        /// Text file to analyze (file mode)
        #[arg(long, conflicts_with = "images", required_unless_present = "images")]
        text: Option<PathBuf>,

        /// Page images to analyze, in reading order (scan mode)
        #[arg(long, num_args = 1..)]
        images: Vec<PathBuf>,

        /// Submit the draft right after a successful analysis
        #[arg(long)]
        save: bool,
    },

    /// Print the current draft
    Show {
        /// Maximum characters of item preview per lesson
        #[arg(long, default_value_t = 60)]
        width: usize,
    },

    /// Move a chapter one position up or down
    Move {
        /// 0-based chapter index
        index: usize,
        direction: Direction,
    },

    /// Rename a chapter (an empty title restores the default)
    Rename {
        /// 0-based chapter index
        index: usize,
        title: String,
    },

    /// Submit the current draft to the backend
    Save,

    /// Discard the current draft
    Reset,

    /// Validate configuration
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_preview(preview: &PreviewBook, width: usize) {
    for line in pipeline::describe_preview(preview, width) {
        println!("{}", line);
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    log::debug!("Loaded configuration from {}", cli.storage_dir.display());

    let storage = LocalStorage::new(&cli.storage_dir);
    let session = SessionHandle::new();

    match cli.command {
        Command::Analyze { text, images, save } => {
            let source = match text {
                Some(path) => ImportSource::Text(path),
                None => ImportSource::Images(images),
            };

            let analyzer = GeminiAnalyzer::from_config(&config.analyzer)?;
            let preview =
                pipeline::run_analyze(&config, &storage, &session, &analyzer, &source).await?;
            print_preview(&preview, 60);

            if save {
                let submitter = BackendSubmitter::new(&config.backend)?;
                pipeline::run_save(&storage, &session, &submitter).await?;
                log::info!("Import request submitted.");
            }
        }

        Command::Show { width } => match storage.load_draft().await? {
            Some(draft) => {
                print_preview(&draft.preview, width);
                if draft.has_unsubmitted_changes() {
                    log::info!("Draft has changes that were not submitted yet.");
                }
            }
            None => log::info!("{}", pipeline::import::MSG_NO_DRAFT),
        },

        Command::Move { index, direction } => {
            let edit = DraftEdit::Move {
                index,
                direction: direction.into(),
            };
            let preview = pipeline::run_edit(&storage, &session, &edit).await?;
            print_preview(&preview, 60);
        }

        Command::Rename { index, title } => {
            let edit = DraftEdit::Rename { index, title };
            let preview = pipeline::run_edit(&storage, &session, &edit).await?;
            print_preview(&preview, 60);
        }

        Command::Save => {
            let submitter = BackendSubmitter::new(&config.backend)?;
            pipeline::run_save(&storage, &session, &submitter).await?;
            log::info!("Import request submitted.");
        }

        Command::Reset => {
            if pipeline::run_reset(&storage, &session).await? {
                log::info!("Draft discarded.");
            } else {
                log::info!("Nothing to discard.");
            }
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
        }
    }

    Ok(())
}
