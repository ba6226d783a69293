mod manager;

pub use manager::{
    ConfigFile, ConfigManager, DEFAULT_PROVIDER, DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE,
    DEFAULT_TEMPERATURE, KeySettings, ProviderConfig, ResolveOptions, ResolvedConfig, SubtlConfig,
    find_provider, key_settings, resolve_config,
};
