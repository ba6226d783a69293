//! API key lookup for the selected provider.
//!
//! Keys come from the environment or the config file. When neither has
//! one, the job asks the interactive side over a channel and waits for
//! the answer; it never prompts on its own.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::config::KeySettings;
use crate::translation::Provider;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The user dismissed the key prompt.
    #[error("API key entry for '{0}' was cancelled")]
    Cancelled(String),

    /// No key in the environment or config, and nobody to ask.
    #[error(
        "Provider '{provider}' requires an API key\n\n\
         Set the {env} environment variable:\n  \
         export {env}=\"your-api-key\"\n\n\
         Or set api_key in ~/.config/subtl/config.toml"
    )]
    Unavailable { provider: String, env: String },
}

/// A request for a human to supply a provider's key.
///
/// The receiver answers with `Some(key)`, or `None` if the prompt was
/// dismissed.
#[derive(Debug)]
pub struct CredentialRequest {
    pub provider: String,
    pub reply: oneshot::Sender<Option<String>>,
}

/// Source of plaintext API keys.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Returns the key for `provider`, or `None` if it needs none.
    async fn plaintext_api_key(
        &self,
        provider: &Provider,
    ) -> Result<Option<String>, CredentialError>;
}

/// Environment, then config file, then an optional interactive channel.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    settings: KeySettings,
    prompt: Option<mpsc::Sender<CredentialRequest>>,
}

impl KeyResolver {
    pub const fn new(settings: KeySettings) -> Self {
        Self {
            settings,
            prompt: None,
        }
    }

    /// Ask over `prompt` when no stored key exists.
    #[must_use]
    pub fn with_prompt(mut self, prompt: mpsc::Sender<CredentialRequest>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    fn stored_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(&self.settings.env_var)
            && !key.is_empty()
        {
            return Some(key);
        }
        self.settings
            .configured
            .clone()
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl CredentialSource for KeyResolver {
    async fn plaintext_api_key(
        &self,
        provider: &Provider,
    ) -> Result<Option<String>, CredentialError> {
        if let Some(key) = self.stored_key() {
            return Ok(Some(key));
        }
        if !self.settings.required {
            return Ok(None);
        }

        let unavailable = || CredentialError::Unavailable {
            provider: provider.name().to_string(),
            env: self.settings.env_var.clone(),
        };

        let Some(prompt) = &self.prompt else {
            return Err(unavailable());
        };

        let (reply, answer) = oneshot::channel();
        prompt
            .send(CredentialRequest {
                provider: provider.name().to_string(),
                reply,
            })
            .await
            .map_err(|_| unavailable())?;

        match answer.await {
            Ok(Some(key)) if !key.trim().is_empty() => Ok(Some(key.trim().to_string())),
            Ok(_) => Err(CredentialError::Cancelled(provider.name().to_string())),
            Err(_) => Err(unavailable()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn settings(env_var: &str, configured: Option<&str>, required: bool) -> KeySettings {
        KeySettings {
            configured: configured.map(str::to_string),
            env_var: env_var.to_string(),
            required,
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_wins_over_config() {
        unsafe { std::env::set_var("SUBTL_TEST_KEY_A", "from-env") };

        let resolver = KeyResolver::new(settings("SUBTL_TEST_KEY_A", Some("from-file"), true));
        let key = resolver.plaintext_api_key(&Provider::DeepSeek).await.unwrap();

        unsafe { std::env::remove_var("SUBTL_TEST_KEY_A") };
        assert_eq!(key.as_deref(), Some("from-env"));
    }

    #[tokio::test]
    #[serial]
    async fn test_config_key_fallback() {
        unsafe { std::env::remove_var("SUBTL_TEST_KEY_B") };

        let resolver = KeyResolver::new(settings("SUBTL_TEST_KEY_B", Some("from-file"), true));
        let key = resolver.plaintext_api_key(&Provider::DeepSeek).await.unwrap();
        assert_eq!(key.as_deref(), Some("from-file"));
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_key_without_prompt_is_unavailable() {
        unsafe { std::env::remove_var("SUBTL_TEST_KEY_C") };

        let resolver = KeyResolver::new(settings("SUBTL_TEST_KEY_C", None, true));
        let err = resolver
            .plaintext_api_key(&Provider::OpenAi)
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::Unavailable { .. }));
        assert!(err.to_string().contains("SUBTL_TEST_KEY_C"));
    }

    #[tokio::test]
    #[serial]
    async fn test_optional_key_is_none() {
        unsafe { std::env::remove_var("SUBTL_TEST_KEY_D") };

        let resolver = KeyResolver::new(settings("SUBTL_TEST_KEY_D", None, false));
        assert_eq!(
            resolver.plaintext_api_key(&Provider::OpenAi).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_prompt_channel_answers() {
        unsafe { std::env::remove_var("SUBTL_TEST_KEY_E") };

        let (tx, mut rx) = mpsc::channel::<CredentialRequest>(1);
        let responder = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            assert_eq!(request.provider, "openrouter");
            request.reply.send(Some("  typed-key ".to_string())).unwrap();
        });

        let resolver = KeyResolver::new(settings("SUBTL_TEST_KEY_E", None, true)).with_prompt(tx);
        let key = resolver
            .plaintext_api_key(&Provider::OpenRouter)
            .await
            .unwrap();

        responder.await.unwrap();
        assert_eq!(key.as_deref(), Some("typed-key"));
    }

    #[tokio::test]
    #[serial]
    async fn test_dismissed_prompt_is_cancelled() {
        unsafe { std::env::remove_var("SUBTL_TEST_KEY_F") };

        let (tx, mut rx) = mpsc::channel::<CredentialRequest>(1);
        tokio::spawn(async move {
            if let Some(request) = rx.recv().await {
                let _ = request.reply.send(None);
            }
        });

        let resolver = KeyResolver::new(settings("SUBTL_TEST_KEY_F", None, true)).with_prompt(tx);
        let err = resolver
            .plaintext_api_key(&Provider::DeepSeek)
            .await
            .unwrap_err();

        assert_eq!(err, CredentialError::Cancelled("deepseek".to_string()));
    }
}
