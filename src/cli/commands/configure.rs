//! Configure command handler for editing default settings.

use anyhow::{Result, bail};
use inquire::{CustomType, Select, Text};

use crate::config::{
    ConfigFile, ConfigManager, DEFAULT_PROVIDER, DEFAULT_SOURCE_LANGUAGE,
    DEFAULT_TARGET_LANGUAGE, DEFAULT_TEMPERATURE, find_provider,
};
use crate::subtitle::DEFAULT_BATCH_SIZE;
use crate::translation::{DuplicatePolicy, Provider};
use crate::ui::{Style, handle_prompt_cancellation};

const DUPLICATE_CHOICES: [(DuplicatePolicy, &str); 3] = [
    (
        DuplicatePolicy::Disambiguate,
        "disambiguate - send later duplicates as START#2, START#3, ...",
    ),
    (
        DuplicatePolicy::KeepFirst,
        "keep-first - the first line keeps the start time",
    ),
    (
        DuplicatePolicy::Overwrite,
        "overwrite - the last line wins the start time",
    ),
];

/// Runs the configure command to edit default settings.
///
/// Lets the user pick the default provider, model, languages, temperature,
/// batch size and duplicate-start policy.
pub fn run_configure() -> Result<()> {
    handle_prompt_cancellation(run_configure_inner)
}

fn run_configure_inner() -> Result<()> {
    let manager = ConfigManager::new()?;
    let mut config = manager.load_or_default()?;

    // Display current defaults
    print_current_defaults(&config);

    let provider_name = select_provider(&config)?;
    let provider = find_provider(&provider_name, &config)?;

    let model = select_model(&provider, config.subtl.model.as_deref())?;

    let from = Text::new("Source language:")
        .with_default(
            config
                .subtl
                .from
                .as_deref()
                .unwrap_or(DEFAULT_SOURCE_LANGUAGE),
        )
        .prompt()?;
    let to = Text::new("Target language:")
        .with_default(config.subtl.to.as_deref().unwrap_or(DEFAULT_TARGET_LANGUAGE))
        .prompt()?;

    let temperature = CustomType::<f32>::new("Temperature:")
        .with_default(config.subtl.temperature.unwrap_or(DEFAULT_TEMPERATURE))
        .with_help_message("0.0 - 2.0")
        .prompt()?;
    if !(0.0..=2.0).contains(&temperature) {
        bail!("Temperature must be between 0.0 and 2.0");
    }

    let batch_size = CustomType::<usize>::new("Batch size (lines per request):")
        .with_default(config.subtl.batch_size.unwrap_or(DEFAULT_BATCH_SIZE.get()))
        .prompt()?;
    if batch_size == 0 {
        bail!("Batch size must be at least 1");
    }

    let duplicates = select_duplicate_policy(config.subtl.duplicate_starts.unwrap_or_default())?;

    // Update config
    config.subtl.provider = Some(provider_name);
    config.subtl.model = Some(model);
    config.subtl.from = Some(from.trim().to_string());
    config.subtl.to = Some(to.trim().to_string());
    config.subtl.temperature = Some(temperature);
    config.subtl.batch_size = Some(batch_size);
    config.subtl.duplicate_starts = Some(duplicates);

    // Save config
    manager.save(&config)?;

    println!();
    println!(
        "{} Configuration saved to {}",
        Style::success("✓"),
        Style::secondary(manager.config_path().display())
    );

    Ok(())
}

fn print_current_defaults(config: &ConfigFile) {
    let defaults = &config.subtl;
    let show = |value: Option<String>| value.map_or_else(|| Style::secondary("(not set)"), Style::value);

    println!("{}", Style::header("Current defaults"));
    println!("  {}     {}", Style::label("provider"), show(defaults.provider.clone()));
    println!("  {}        {}", Style::label("model"), show(defaults.model.clone()));
    println!("  {}         {}", Style::label("from"), show(defaults.from.clone()));
    println!("  {}           {}", Style::label("to"), show(defaults.to.clone()));
    println!(
        "  {}  {}",
        Style::label("temperature"),
        show(defaults.temperature.map(|t| t.to_string()))
    );
    println!(
        "  {}   {}",
        Style::label("batch_size"),
        show(defaults.batch_size.map(|b| b.to_string()))
    );
    println!(
        "  {}   {}",
        Style::label("duplicates"),
        show(defaults.duplicate_starts.map(|d| format!("{d:?}").to_lowercase()))
    );
    println!();
}

fn select_provider(config: &ConfigFile) -> Result<String> {
    let mut names: Vec<String> = Provider::BUILTIN
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    let mut custom: Vec<String> = config
        .providers
        .keys()
        .filter(|name| Provider::builtin(name).is_none())
        .cloned()
        .collect();
    custom.sort();
    names.extend(custom);

    let default = config.subtl.provider.as_deref().unwrap_or(DEFAULT_PROVIDER);
    let default_index = names
        .iter()
        .position(|p| p.eq_ignore_ascii_case(default))
        .unwrap_or(0);

    let selection = Select::new("Default provider:", names)
        .with_starting_cursor(default_index)
        .prompt()?;

    Ok(selection)
}

fn select_model(provider: &Provider, default: Option<&str>) -> Result<String> {
    let available_models: Vec<String> = provider
        .model_options()
        .into_iter()
        .map(str::to_string)
        .collect();

    if available_models.is_empty() {
        // No models known, fall back to text input
        let mut prompt = Text::new("Default model:").with_help_message("Enter the model name");

        if let Some(d) = default {
            prompt = prompt.with_default(d);
        }

        let model = prompt.prompt()?;

        if model.trim().is_empty() {
            bail!("Model name cannot be empty");
        }

        Ok(model.trim().to_string())
    } else {
        let default_index = default
            .and_then(|d| available_models.iter().position(|m| m == d))
            .unwrap_or(0);

        let selection = Select::new("Default model:", available_models)
            .with_starting_cursor(default_index)
            .prompt()?;

        Ok(selection)
    }
}

fn select_duplicate_policy(current: DuplicatePolicy) -> Result<DuplicatePolicy> {
    let labels: Vec<&str> = DUPLICATE_CHOICES.iter().map(|(_, label)| *label).collect();
    let default_index = DUPLICATE_CHOICES
        .iter()
        .position(|(policy, _)| *policy == current)
        .unwrap_or(0);

    let selection = Select::new("Lines sharing a start time:", labels)
        .with_starting_cursor(default_index)
        .prompt()?;

    Ok(DUPLICATE_CHOICES
        .iter()
        .find(|(_, label)| *label == selection)
        .map_or(current, |(policy, _)| *policy))
}
