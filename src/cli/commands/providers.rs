//! Provider listing command handler.

use anyhow::{Context, Result};

use crate::config::{ConfigFile, ConfigManager, DEFAULT_PROVIDER, find_provider, key_settings};
use crate::credentials::{CredentialSource, KeyResolver};
use crate::translation::{HttpBackend, Provider};
use crate::ui::Style;

use super::ConfigError;

/// Prints the provider catalog to stdout.
///
/// If `specific_provider` is provided, shows detailed information for that
/// provider, and with `check` also verifies its key by listing models.
/// Otherwise, lists built-in and configured providers.
pub async fn print_providers(specific_provider: Option<&str>, check: bool) -> Result<()> {
    let manager = ConfigManager::new().map_err(ConfigError)?;
    let config = manager.load_or_default().map_err(ConfigError)?;

    let Some(name) = specific_provider else {
        print_catalog(&config);
        return Ok(());
    };

    let provider = find_provider(name, &config).map_err(ConfigError)?;
    print_details(&provider, &config);

    if check {
        check_provider(&provider, &config).await?;
    }

    Ok(())
}

fn default_marker(name: &str, config: &ConfigFile) -> String {
    let default = config
        .subtl
        .provider
        .as_deref()
        .unwrap_or(DEFAULT_PROVIDER);
    if default.eq_ignore_ascii_case(name) {
        format!(" {}", Style::default_marker())
    } else {
        String::new()
    }
}

fn print_catalog(config: &ConfigFile) {
    println!("{}\n", Style::header("Built-in providers"));
    for provider in &Provider::BUILTIN {
        println!(
            "  {}{}",
            Style::value(provider.name()),
            default_marker(provider.name(), config)
        );
        println!("    {} {}", Style::label("endpoint:"), Style::secondary(provider.base_url()));
        println!("    {} {}", Style::label("models:"), provider.model_options().join(", "));
    }

    let mut custom: Vec<&String> = config
        .providers
        .keys()
        .filter(|name| Provider::builtin(name).is_none())
        .collect();
    if custom.is_empty() {
        return;
    }
    custom.sort();

    println!("\n{}\n", Style::header("Configured providers"));
    for name in custom {
        let endpoint = config.providers[name]
            .endpoint
            .as_deref()
            .unwrap_or("(no endpoint)");
        println!("  {}{}", Style::value(name), default_marker(name, config));
        println!("    {} {}", Style::label("endpoint:"), Style::secondary(endpoint));
        let models = &config.providers[name].models;
        if !models.is_empty() {
            println!("    {} {}", Style::label("models:"), models.join(", "));
        }
    }
}

fn print_details(provider: &Provider, config: &ConfigFile) {
    println!(
        "{} {}{}",
        Style::header("Provider:"),
        Style::value(provider.name()),
        default_marker(provider.name(), config)
    );
    println!("  endpoint = {}", provider.base_url());

    let key = key_settings(provider, config);
    let has_key =
        std::env::var(&key.env_var).is_ok_and(|v| !v.is_empty()) || key.configured.is_some();
    let status = match (has_key, key.required) {
        (true, _) => "(set)",
        (false, true) => "(not set)",
        (false, false) => "(not required)",
    };
    println!("  api_key  = {status} {}", Style::hint(format!("${}", key.env_var)));

    if let Some(balance) = provider.balance_endpoint() {
        println!(
            "  balance  = {} ({})",
            balance.url,
            balance.currency.code()
        );
    }

    let models = provider.model_options();
    if models.is_empty() {
        println!("  models   = (none configured)");
    } else {
        println!("  models:");
        for model in models {
            println!("    - {model}");
        }
    }
}

async fn check_provider(provider: &Provider, config: &ConfigFile) -> Result<()> {
    let api_key = KeyResolver::new(key_settings(provider, config))
        .plaintext_api_key(provider)
        .await?;
    let backend =
        HttpBackend::new(provider, api_key).context("Failed to create HTTP client")?;

    println!();
    match backend.list_models().await {
        Ok(models) => {
            println!(
                "{} {} models available",
                Style::success("✓"),
                models.len()
            );
            for model in models.iter().take(20) {
                println!("    - {model}");
            }
            if models.len() > 20 {
                println!("    {}", Style::hint(format!("... and {} more", models.len() - 20)));
            }
            Ok(())
        }
        Err(e) => anyhow::bail!("{} {e}", Style::error("✗")),
    }
}
