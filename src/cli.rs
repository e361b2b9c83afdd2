use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Batch URL lists into sitemaps.org sitemap files and indexes.
#[derive(Debug, Parser)]
#[command(name = "mapgen", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON), layered over the user config
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// More logging; repeat for even more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read URL records and write them out as numbered sitemap files
    ///
    /// One record per line: a location, optionally followed by tab-separated
    /// lastmod, changefreq and priority columns. Blank lines and lines
    /// starting with `#` are skipped.
    Generate {
        /// Read records from FILE instead of stdin
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Don't write an index of the generated files
        #[arg(long)]
        no_index: bool,
        /// Ping search engines once the index is written
        #[arg(long, conflicts_with = "no_index")]
        ping: bool,
    },
    /// Write an index of every sitemap file in the output folder
    Index {
        /// Ping search engines once the index is written
        #[arg(long)]
        ping: bool,
    },
    /// Tell search engines that an index changed
    Ping {
        /// Public index URL; defaults to the configured index location
        index_url: Option<String>,
    },
    /// Print the entries of a sitemap or index file
    Inspect {
        /// Sitemap or index file, compressed or not
        file: PathBuf,
    },
}

impl Cli {
    /// Log filter implied by `-v`, or `None` to defer to `RUST_LOG`.
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
