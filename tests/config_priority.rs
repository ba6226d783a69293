#![allow(clippy::unwrap_used)]
//! Config priority contract tests.
//!
//! These tests verify that CLI options take priority over config file settings.
//! Priority order (highest to lowest):
//! 1. CLI arguments
//! 2. Config file defaults
//! 3. Built-in defaults

use std::collections::HashMap;
use subtl_cli::config::{ConfigFile, ProviderConfig, ResolveOptions, SubtlConfig, resolve_config};
use subtl_cli::translation::{DuplicatePolicy, Provider};

fn make_config_with_defaults() -> ConfigFile {
    let mut providers = HashMap::new();
    providers.insert(
        "test_provider".to_string(),
        ProviderConfig {
            endpoint: Some("http://test.local/v1".to_string()),
            api_key: Some("test_key".to_string()),
            api_key_env: None,
            models: vec!["test_model".to_string()],
        },
    );

    ConfigFile {
        subtl: SubtlConfig {
            provider: Some("test_provider".to_string()),
            model: Some("config_model".to_string()),
            to: Some("English".to_string()),
            from: Some("Korean".to_string()),
            temperature: Some(0.5),
            batch_size: Some(20),
            duplicate_starts: Some(DuplicatePolicy::Overwrite),
            ..SubtlConfig::default()
        },
        providers,
    }
}

#[test]
fn test_cli_to_overrides_config() {
    let config = make_config_with_defaults();
    let options = ResolveOptions {
        to: Some("Chinese".to_string()),
        ..ResolveOptions::default()
    };

    let resolved = resolve_config(&options, &config).unwrap();

    assert_eq!(resolved.target_language, "Chinese");
    assert_eq!(resolved.source_language, "Korean");
}

#[test]
fn test_cli_provider_overrides_config() {
    let config = make_config_with_defaults();
    let options = ResolveOptions {
        provider: Some("openrouter".to_string()),
        model: Some("deepseek/deepseek-chat".to_string()),
        ..ResolveOptions::default()
    };

    let resolved = resolve_config(&options, &config).unwrap();

    assert_eq!(resolved.provider, Provider::OpenRouter);
    assert_eq!(resolved.model, "deepseek/deepseek-chat");
}

#[test]
fn test_cli_model_overrides_config() {
    let config = make_config_with_defaults();
    let options = ResolveOptions {
        model: Some("cli_model".to_string()),
        ..ResolveOptions::default()
    };

    let resolved = resolve_config(&options, &config).unwrap();

    assert_eq!(resolved.model, "cli_model");
}

#[test]
fn test_cli_numbers_override_config() {
    let config = make_config_with_defaults();
    let options = ResolveOptions {
        temperature: Some(1.0),
        batch_size: Some(5),
        duplicates: Some(DuplicatePolicy::KeepFirst),
        ..ResolveOptions::default()
    };

    let resolved = resolve_config(&options, &config).unwrap();

    assert!((resolved.temperature - 1.0).abs() < f32::EPSILON);
    assert_eq!(resolved.batch_size.get(), 5);
    assert_eq!(resolved.duplicates, DuplicatePolicy::KeepFirst);
}

#[test]
fn test_config_used_when_cli_not_specified() {
    let config = make_config_with_defaults();

    let resolved = resolve_config(&ResolveOptions::default(), &config).unwrap();

    assert_eq!(resolved.provider.name(), "test_provider");
    assert_eq!(resolved.model, "config_model");
    assert_eq!(resolved.target_language, "English");
    assert!((resolved.temperature - 0.5).abs() < f32::EPSILON);
    assert_eq!(resolved.batch_size.get(), 20);
    assert_eq!(resolved.duplicates, DuplicatePolicy::Overwrite);
    assert_eq!(resolved.key.configured.as_deref(), Some("test_key"));
    assert!(resolved.key.required);
}

#[test]
fn test_builtin_defaults_fill_gaps() {
    let resolved = resolve_config(&ResolveOptions::default(), &ConfigFile::default()).unwrap();

    assert_eq!(resolved.provider, Provider::DeepSeek);
    assert_eq!(resolved.source_language, "Japanese");
    assert_eq!(resolved.target_language, "Chinese");
    assert_eq!(resolved.duplicates, DuplicatePolicy::Disambiguate);
}

#[test]
fn test_invalid_cli_batch_size_beats_valid_config() {
    let config = make_config_with_defaults();
    let options = ResolveOptions {
        batch_size: Some(0),
        ..ResolveOptions::default()
    };

    let err = resolve_config(&options, &config).unwrap_err();

    assert!(err.to_string().contains("batch size"));
}
