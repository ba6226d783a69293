use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::paths;
use crate::subtitle::DEFAULT_BATCH_SIZE;
use crate::translation::{
    CompatibleProvider, DEFAULT_MAX_HISTORY, DuplicatePolicy, Provider, SYSTEM_PROMPT_TEMPLATE,
    build_system_prompt,
};
use crate::ui::Style;

pub const DEFAULT_PROVIDER: &str = "deepseek";
pub const DEFAULT_SOURCE_LANGUAGE: &str = "Japanese";
pub const DEFAULT_TARGET_LANGUAGE: &str = "Chinese";
pub const DEFAULT_TEMPERATURE: f32 = 1.3;

/// Default settings in the `[subtl]` section of config.toml.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtlConfig {
    /// Default provider name.
    pub provider: Option<String>,
    /// Default model name.
    pub model: Option<String>,
    /// Default target language.
    pub to: Option<String>,
    /// Default source language.
    pub from: Option<String>,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f32>,
    /// Dialogue lines per request.
    pub batch_size: Option<usize>,
    /// Prior assistant replies replayed with each request.
    pub max_history: Option<usize>,
    /// Collision policy for duplicate start times within a batch.
    pub duplicate_starts: Option<DuplicatePolicy>,
    /// Replace full-width sentence punctuation in the output.
    pub normalize_punctuation: Option<bool>,
    /// Ask the provider for the remaining balance after a job.
    pub query_balance: Option<bool>,
    /// System prompt override. `{source_language}` and `{target_language}`
    /// are substituted.
    pub system_prompt: Option<String>,
}

/// Configuration for a translation provider.
///
/// A name matching a built-in provider only overrides its key settings;
/// any other name declares an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The OpenAI-compatible API base URL (required for custom providers).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// API key stored directly in config (not recommended).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable name containing the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// List of available models for this provider.
    #[serde(default)]
    pub models: Vec<String>,
}

impl ProviderConfig {
    /// Returns `true` if a custom provider declares a key.
    pub const fn requires_api_key(&self) -> bool {
        self.api_key.is_some() || self.api_key_env.is_some()
    }
}

/// The complete configuration file structure.
///
/// Corresponds to `~/.config/subtl/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Default settings.
    #[serde(default)]
    pub subtl: SubtlConfig,
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl ConfigFile {
    /// Settings declared for `provider`, matched case-insensitively.
    pub fn provider_config(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name).or_else(|| {
            self.providers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, config)| config)
        })
    }
}

/// Where the API key for the selected provider may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySettings {
    /// Key written into the config file.
    pub configured: Option<String>,
    /// Environment variable to read first.
    pub env_var: String,
    /// Whether the provider needs a key at all.
    pub required: bool,
}

/// Resolved configuration after merging CLI arguments and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub provider: Provider,
    /// The model as the user named it (before provider namespacing).
    pub model: String,
    pub key: KeySettings,
    pub source_language: String,
    pub target_language: String,
    pub temperature: f32,
    pub batch_size: NonZeroUsize,
    pub max_history: usize,
    pub duplicates: DuplicatePolicy,
    pub normalize_punctuation: bool,
    pub query_balance: bool,
    /// System prompt with languages filled in.
    pub system_prompt: String,
}

/// Options for resolving configuration.
///
/// Contains CLI overrides that take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub to: Option<String>,
    pub from: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub batch_size: Option<usize>,
    pub duplicates: Option<DuplicatePolicy>,
    /// Skip the balance query even if the config enables it.
    pub no_balance: bool,
}

/// Looks up a provider by name among the built-ins and the config file.
pub fn find_provider(name: &str, config_file: &ConfigFile) -> Result<Provider> {
    if let Some(provider) = Provider::builtin(name) {
        return Ok(provider);
    }

    let Some(provider_config) = config_file.provider_config(name) else {
        let mut available: Vec<String> = Provider::BUILTIN
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        let mut custom: Vec<String> = config_file.providers.keys().cloned().collect();
        custom.sort();
        available.extend(custom);
        bail!(
            "Provider '{name}' not found\n\n\
             Available providers:\n  \
             - {}\n\n\
             Add providers to ~/.config/subtl/config.toml",
            available.join("\n  - ")
        );
    };

    let endpoint = provider_config.endpoint.clone().ok_or_else(|| {
        anyhow!(
            "Provider '{name}' has no endpoint\n\n\
             Set it in ~/.config/subtl/config.toml:\n  \
             [providers.{name}]\n  \
             endpoint = \"http://localhost:11434/v1\""
        )
    })?;

    Ok(Provider::Compatible(CompatibleProvider {
        name: name.to_string(),
        base_url: endpoint,
        models: provider_config.models.clone(),
    }))
}

/// Key sources for `provider`: its config entry, else the provider's
/// conventional environment variable.
pub fn key_settings(provider: &Provider, config_file: &ConfigFile) -> KeySettings {
    let provider_config = config_file.provider_config(provider.name());
    let configured = provider_config.and_then(|c| c.api_key.clone());
    let env_var = provider_config
        .and_then(|c| c.api_key_env.clone())
        .unwrap_or_else(|| provider.default_api_key_env());
    let required = match provider {
        Provider::Compatible(_) => provider_config.is_some_and(ProviderConfig::requires_api_key),
        _ => true,
    };

    KeySettings {
        configured,
        env_var,
        required,
    }
}

/// Resolves configuration by merging CLI options with config file settings.
///
/// CLI options take precedence over config file values, which take
/// precedence over built-in defaults.
///
/// # Errors
///
/// Returns an error if the provider is unknown, no model can be chosen,
/// or a numeric setting is out of range.
pub fn resolve_config(
    options: &ResolveOptions,
    config_file: &ConfigFile,
) -> Result<ResolvedConfig> {
    let file = &config_file.subtl;

    // Resolve provider
    let provider_name = options
        .provider
        .as_deref()
        .or(file.provider.as_deref())
        .unwrap_or(DEFAULT_PROVIDER);
    let provider = find_provider(provider_name, config_file)?;

    // Resolve model
    let model = options
        .model
        .as_deref()
        .or(file.model.as_deref())
        .or_else(|| provider.default_model())
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow!(
                "Missing required configuration: 'model'\n\n\
                 Please provide it via:\n  \
                 - CLI option: subtl --model <name>\n  \
                 - Config file: ~/.config/subtl/config.toml"
            )
        })?;

    // Warn if model is not in provider's models list
    let known_models = provider.model_options();
    if !known_models.is_empty()
        && !model.contains('/')
        && !known_models.contains(&model.as_str())
    {
        crate::warn!(
            "{} Model '{}' is not in the models list for '{}'\n\
             Known models: {}\n\
             Proceeding anyway...\n",
            Style::warning("Warning:"),
            model,
            provider.name(),
            known_models.join(", ")
        );
    }

    let temperature = options
        .temperature
        .or(file.temperature)
        .unwrap_or(DEFAULT_TEMPERATURE);
    if !(0.0..=2.0).contains(&temperature) {
        bail!("Invalid temperature {temperature}: must be between 0.0 and 2.0");
    }

    let batch_size = match options.batch_size.or(file.batch_size) {
        None => DEFAULT_BATCH_SIZE,
        Some(size) => NonZeroUsize::new(size).ok_or_else(|| {
            anyhow!(
                "Invalid batch size 0: must be at least 1\n\n\
                 Check --batch-size or batch_size in ~/.config/subtl/config.toml"
            )
        })?,
    };

    let source_language = options
        .from
        .as_deref()
        .or(file.from.as_deref())
        .unwrap_or(DEFAULT_SOURCE_LANGUAGE)
        .to_string();
    let target_language = options
        .to
        .as_deref()
        .or(file.to.as_deref())
        .unwrap_or(DEFAULT_TARGET_LANGUAGE)
        .to_string();

    let template = file.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT_TEMPLATE);
    let system_prompt = build_system_prompt(template, &source_language, &target_language);

    Ok(ResolvedConfig {
        key: key_settings(&provider, config_file),
        provider,
        model,
        source_language,
        target_language,
        temperature,
        batch_size,
        max_history: file.max_history.unwrap_or(DEFAULT_MAX_HISTORY),
        duplicates: options
            .duplicates
            .or(file.duplicate_starts)
            .unwrap_or_default(),
        normalize_punctuation: file.normalize_punctuation.unwrap_or(true),
        query_balance: !options.no_balance && file.query_balance.unwrap_or(true),
        system_prompt,
    })
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager.
    ///
    /// Configuration is stored at `$XDG_CONFIG_HOME/subtl/config.toml`
    /// or `~/.config/subtl/config.toml` if `XDG_CONFIG_HOME` is not set.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: paths::config_dir()?.join("config.toml"),
        })
    }

    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub const fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load(&self) -> Result<ConfigFile> {
        let contents = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        let config_file: ConfigFile = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse config file: {}", self.config_path.display())
        })?;

        Ok(config_file)
    }

    pub fn save(&self, config: &ConfigFile) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, contents).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;

        Ok(())
    }

    /// Loads the config file; a missing file yields defaults, a broken one
    /// is an error.
    pub fn load_or_default(&self) -> Result<ConfigFile> {
        if self.config_path.exists() {
            self.load()
        } else {
            Ok(ConfigFile::default())
        }
    }
}
