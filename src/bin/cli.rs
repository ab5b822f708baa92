//! NovelStore CLI
//!
//! Inspect and tweak a novel directory.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use novelstore::{Config, NovelData, Table};
use tracing_subscriber::{fmt, EnvFilter};

/// NovelStore CLI
#[derive(Parser, Debug)]
#[command(name = "novelstore-cli")]
#[command(about = "Inspect a novel directory")]
#[command(version)]
struct Args {
    /// Novel directory
    #[arg(short, long)]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show novel details and counts
    Show,

    /// List downloaded chapters
    Chapters,

    /// List pending chapters
    Pending,

    /// List metadata pairs
    Metadata,

    /// Get a misc setting
    MiscGet {
        /// The key to get
        key: String,
    },

    /// Set a misc setting
    MiscSet {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete the pending store file
    DropPending,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,novelstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> novelstore::Result<()> {
    // Inspection never creates directories, and skips payload reads
    let config = Config::builder()
        .data_dir(&args.dir)
        .should_create(false)
        .load_chapters(false)
        .build();
    let mut data = NovelData::open(config)?;

    match args.command {
        Commands::Show => {
            let novel = data.novel.require()?;
            println!("title:    {}", novel.title.unwrap_or_default());
            println!("author:   {}", novel.author.unwrap_or_default());
            println!("url:      {}", novel.url.unwrap_or_default());
            println!("lang:     {}", novel.lang.unwrap_or_default());
            println!("chapters: {}", data.chapters.len());
            println!("pending:  {}", data.pending.len());
            println!("metadata: {}", data.metadata.len());
        }
        Commands::Chapters => {
            for chapter in data.chapters.parse()? {
                let mark = if data.chapters.has_payload(&chapter) { "*" } else { " " };
                println!(
                    "{} {:>5}  {}  {}",
                    mark,
                    chapter.index,
                    chapter.title.unwrap_or_default(),
                    chapter.url
                );
            }
        }
        Commands::Pending => {
            for chapter in data.pending.parse()? {
                println!(
                    "{:>5}  {}  {}",
                    chapter.index,
                    chapter.title.unwrap_or_default(),
                    chapter.url
                );
            }
        }
        Commands::Metadata => {
            for meta in data.metadata_records()? {
                println!("{}\t{}", meta.name, meta.value);
            }
        }
        Commands::MiscGet { key } => match data.misc.get(&key) {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        Commands::MiscSet { key, value } => {
            data.misc.put(&key, &value)?;
            println!("OK");
        }
        Commands::DropPending => {
            let path = data.pending.path().to_path_buf();
            data.pending.drop_backing()?;
            println!("Removed {}", path.display());
        }
    }

    data.close()
}
