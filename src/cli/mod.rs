use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lexikeep")]
#[command(author, version, about = "Personal multilingual dictionary kept in a row store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the store and the dictionary row
    Init(InitArgs),

    /// Print the dictionary, optionally through a translation overlay
    Show(ShowArgs),

    /// Save an edited JSON tree, reconciling it with stored rows
    Save(SaveArgs),

    /// Export the dictionary as a plain-text listing
    Export(ExportArgs),

    /// Write a translation template to fill in by hand
    Template(TemplateArgs),

    /// Import a filled translation template or JSON document
    Import(ImportArgs),

    /// Fill missing translations via an external provider
    Translate(TranslateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., store.path or api.deepl_api_key)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show config file path
    Path,

    /// Edit config file with default editor
    Edit,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Load a small sample dictionary
    #[arg(long, default_value_t = false)]
    pub seed: bool,

    /// Store location (http(s) URL for REST, otherwise a SQLite path)
    #[arg(long)]
    pub store: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Language to display (en, de, pt)
    #[arg(short, long, default_value = "en")]
    pub lang: String,

    /// Print the canonical JSON tree instead of a listing
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Store location (http(s) URL for REST, otherwise a SQLite path)
    #[arg(long)]
    pub store: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SaveArgs {
    /// JSON dictionary tree to save
    #[arg(required = true)]
    pub file: PathBuf,

    /// Store location (http(s) URL for REST, otherwise a SQLite path)
    #[arg(long)]
    pub store: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Output file (defaults to <title>_dictionary.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Store location (http(s) URL for REST, otherwise a SQLite path)
    #[arg(long)]
    pub store: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TemplateArgs {
    /// Target language (de, pt); defaults to the configured language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Output file (defaults to translation_template_<lang>.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Store location (http(s) URL for REST, otherwise a SQLite path)
    #[arg(long)]
    pub store: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Filled template (.txt) or translation document (.json)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Target language (de, pt)
    #[arg(short, long)]
    pub lang: String,

    /// Store location (http(s) URL for REST, otherwise a SQLite path)
    #[arg(long)]
    pub store: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// Target language (de, pt); defaults to the configured language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// API provider (google, deepl, openai, claude, ollama)
    #[arg(long, default_value = "google")]
    pub api: String,

    /// API key (can also be set via environment variable)
    #[arg(long)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Model name to use
    #[arg(long)]
    pub model: Option<String>,

    /// Re-translate fields that already have a translation
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Store location (http(s) URL for REST, otherwise a SQLite path)
    #[arg(long)]
    pub store: Option<String>,
}
