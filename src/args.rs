use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docjoin",
    about = "Inspect ContentVersion and ContentDocumentLink exports to see why they do not join",
    version,
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the ContentVersion export
    #[arg(
        long,
        global = true,
        env = "DOCJOIN_CONTENT_VERSION",
        default_value = "ContentVersion.csv"
    )]
    pub content_version: PathBuf,

    /// Path to the ContentDocumentLink export
    #[arg(
        long,
        global = true,
        env = "DOCJOIN_CONTENT_DOCUMENT_LINK",
        default_value = "ContentDocumentLink.csv"
    )]
    pub content_document_link: PathBuf,

    /// Field delimiter of both exports
    #[arg(long, global = true, env = "DOCJOIN_DELIMITER", default_value_t = ',')]
    pub delimiter: char,

    /// Number of leading rows to print per export
    #[arg(long, global = true, default_value_t = 5)]
    pub rows: usize,

    /// Number of sample ids to print
    #[arg(long, global = true, default_value_t = 10)]
    pub samples: usize,

    /// Number of LinkedEntityId prefixes to display
    #[arg(short, long, global = true, default_value_t = 10)]
    pub top: usize,

    /// LinkedEntityId prefix to treat as a target (repeatable)
    #[arg(short, long = "prefix", global = true, default_values = ["001", "003"])]
    pub prefixes: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Headers, sample rows, counts and the ContentDocumentId overlap
    Overview,
    /// Restrict links to target prefixes and match them against ContentVersion
    Targets,
    /// Run overview followed by targets
    All,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::All)
    }
}
