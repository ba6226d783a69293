//! # subtl - ASS Subtitle Translation CLI
//!
//! `subtl` translates the dialogue of an Advanced SubStation Alpha (`.ass`)
//! subtitle file with a chat-completion LLM behind an OpenAI-compatible
//! endpoint. Dialogue lines are sent in batches; the model merges fragments
//! into whole sentences and each translated sentence is written back as one
//! dialogue line spanning the fragments it covers.
//!
//! ## Quick Start
//!
//! ```bash
//! # Translate a subtitle with the configured defaults
//! subtl ./episode01.ass
//!
//! # Override languages and provider
//! subtl --from English --to Chinese --provider openrouter ./episode01.ass
//!
//! # Smaller batches, no cache
//! subtl --batch-size 40 --no-cache ./episode01.ass
//! ```
//!
//! The job writes `<stem>_readytogo.ass` and `<stem>_translation_log.txt`
//! next to the input (or into `--output-dir`).
//!
//! ## Configuration
//!
//! Settings are stored in `~/.config/subtl/config.toml`:
//!
//! ```toml
//! [subtl]
//! provider = "deepseek"
//! model = "deepseek-chat"
//! from = "Japanese"
//! to = "Chinese"
//! batch_size = 80
//!
//! [providers.local]
//! endpoint = "http://localhost:11434/v1"
//! models = ["qwen2.5:14b"]
//! ```

/// Response cache keyed by batch and request settings, stored in `SQLite`.
pub mod cache;

/// Cooperative cancellation between the CLI and a running job.
pub mod cancel;

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file management and setting resolution.
pub mod config;

/// API key lookup from environment, config, or an interactive prompt.
pub mod credentials;

/// The translation job pipeline and its output files.
pub mod job;

/// Global output configuration (quiet mode, colors, stderr routing).
pub mod output;

/// XDG-style path utilities for configuration and cache.
pub mod paths;

/// ASS parsing, dialogue entries, and batching.
pub mod subtitle;

/// Request building, chat-completion client, and response reconstruction.
pub mod translation;

/// Terminal UI components (progress bar, colors, prompts).
pub mod ui;
