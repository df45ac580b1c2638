//! # TaggerDB CLI (`taggerdb`)
//!
//! Catalog a storage tree by content and tag what's in it.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `taggerdb init` | Create a new, empty catalog |
//! | `taggerdb scan -d <DIR>` | Catalogue content not seen before |
//! | `taggerdb tag <LOCATION> <TAG>...` | Tag a catalogued file |
//! | `taggerdb describe <TAG> [TEXT]` | Set or clear a tag's description |
//! | `taggerdb files [--tag <TAG>]` | List catalogued files |
//! | `taggerdb tags` | List tags with file counts |
//! | `taggerdb stats` | Catalog summary |
//!
//! ## Examples
//!
//! ```bash
//! taggerdb init -b ~/tagger.db3
//! taggerdb scan -b ~/tagger.db3 -d /srv/storage --tags inbox
//! taggerdb tag -b ~/tagger.db3 photos/2023/cat.jpg pets cats
//! taggerdb files -b ~/tagger.db3 --tag pets
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use taggerdb::config;
use taggerdb::list;
use taggerdb::migrate;
use taggerdb::progress::ProgressMode;
use taggerdb::scan;
use taggerdb::stats;
use taggerdb::tagging;

/// TaggerDB — catalog files by content and organize them with tags.
#[derive(Parser)]
#[command(
    name = "taggerdb",
    about = "TaggerDB — catalog files by content and organize them with tags",
    version,
    long_about = "TaggerDB walks a storage directory, fingerprints every file with SHA-256, \
    and records each distinct piece of content once in a SQLite catalog. Catalogued files \
    can then be tagged and listed by tag."
)]
struct Cli {
    /// Catalog database file.
    ///
    /// Defaults to `tagger.db3` in the working directory, or `catalog.path`
    /// from the config file.
    #[arg(short = 'b', long, global = true)]
    database: Option<PathBuf>,

    /// Storage directory to scan (overrides `scan.root`).
    #[arg(short = 'd', long, global = true)]
    directory: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Log debug diagnostics to stderr. `RUST_LOG` takes precedence.
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty catalog.
    ///
    /// Fails if anything already exists at the catalog path; an existing
    /// file is never overwritten.
    Init,

    /// Catalogue the files of the storage directory.
    ///
    /// Every regular file is hashed; content already in the catalog (under
    /// any name) is skipped, new content is recorded with its path relative
    /// to the storage directory.
    Scan {
        /// Tag every file added by this scan.
        #[arg(long, num_args = 1.., value_parser = parse_tag_name)]
        tags: Vec<String>,

        /// Emit one JSON object per line instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Attach tags to a catalogued file.
    ///
    /// Tags are created on first use. Tagging a file with a tag it already
    /// carries is a no-op.
    Tag {
        /// Location of the file as recorded by `scan` (relative to the storage root).
        location: String,

        /// Tag names.
        #[arg(required = true, value_parser = parse_tag_name)]
        tags: Vec<String>,
    },

    /// Set or clear the description of an existing tag.
    Describe {
        /// Tag name.
        tag: String,

        /// Description text; omit to clear it.
        description: Option<String>,
    },

    /// List catalogued files.
    Files {
        /// Only files carrying this tag.
        #[arg(long)]
        tag: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// List tags with the number of files carrying each.
    Tags {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show catalog statistics.
    Stats,
}

/// Tag names must be non-blank and carry no surrounding whitespace.
fn parse_tag_name(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("tag name must not be empty".to_string());
    }
    if s.trim() != s {
        return Err(format!(
            "tag name '{}' has leading or trailing whitespace",
            s
        ));
    }
    Ok(s.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "taggerdb=debug" } else { "taggerdb=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(cli.config.as_deref())?.with_overrides(cli.database, cli.directory);

    match cli.command {
        Commands::Init => {
            migrate::run_init(&cfg).await?;
        }
        Commands::Scan { tags, json } => {
            let mode = if json {
                ProgressMode::Json
            } else {
                ProgressMode::Human
            };
            scan::run_scan(&cfg, &tags, mode).await?;
        }
        Commands::Tag { location, tags } => {
            tagging::run_tag(&cfg, &location, &tags).await?;
        }
        Commands::Describe { tag, description } => {
            tagging::run_describe(&cfg, &tag, description.as_deref()).await?;
        }
        Commands::Files { tag, json } => {
            list::run_files(&cfg, tag.as_deref(), json).await?;
        }
        Commands::Tags { json } => {
            list::run_tags(&cfg, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scan_with_tags() {
        let cli = Cli::parse_from([
            "taggerdb", "scan", "-d", "/srv", "-b", "x.db3", "--tags", "a", "b",
        ]);
        assert_eq!(cli.directory, Some(PathBuf::from("/srv")));
        assert_eq!(cli.database, Some(PathBuf::from("x.db3")));
        match cli.command {
            Commands::Scan { tags, json } => {
                assert_eq!(tags, vec!["a", "b"]);
                assert!(!json);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn rejects_blank_tag_names() {
        assert!(parse_tag_name("").is_err());
        assert!(parse_tag_name("   ").is_err());
        assert!(parse_tag_name(" padded").is_err());
        assert_eq!(parse_tag_name("two words").unwrap(), "two words");
    }

    #[test]
    fn tag_requires_names() {
        assert!(Cli::try_parse_from(["taggerdb", "tag", "a.txt"]).is_err());
    }
}
