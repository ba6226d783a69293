use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::translation::DuplicatePolicy;

#[derive(Parser, Debug)]
#[command(name = "subtl")]
#[command(about = "LLM-powered ASS subtitle translation CLI tool")]
#[command(version)]
pub struct Args {
    /// ASS subtitle file to translate
    pub file: Option<PathBuf>,

    /// Target language (e.g., Chinese, English)
    #[arg(short = 't', long = "to")]
    pub to: Option<String>,

    /// Source language of the subtitle
    #[arg(short = 'f', long = "from")]
    pub from: Option<String>,

    /// Provider name (deepseek, gemini, openai, openrouter, or one from config)
    #[arg(short = 'p', long)]
    pub provider: Option<String>,

    /// Model name
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Dialogue lines per request
    #[arg(short = 'b', long)]
    pub batch_size: Option<usize>,

    /// How to key lines that share a start time within a batch
    #[arg(long = "duplicates", value_enum)]
    pub duplicates: Option<DuplicatePolicy>,

    /// Directory for the translated subtitle and log (defaults to the input's directory)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Disable cache
    #[arg(short = 'n', long)]
    pub no_cache: bool,

    /// Skip the account balance query after the job
    #[arg(long)]
    pub no_balance: bool,

    /// Suppress status output (warnings are still shown)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Show per-sentence detail
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configure default settings
    Configure,
    /// List providers and their models
    Providers {
        /// Show details for one provider
        provider: Option<String>,

        /// Check the API key by listing the provider's models
        #[arg(long, requires = "provider")]
        check: bool,
    },
}
