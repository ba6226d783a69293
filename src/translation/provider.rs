//! Built-in chat-completion providers and model-name resolution.

use std::fmt;

/// Completion token ceiling sent to providers that accept one.
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Currency a provider reports its balance in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Cny,
    Usd,
}

impl Currency {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Cny => "CNY",
            Self::Usd => "USD",
        }
    }
}

/// Shape of a provider's balance endpoint response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceFormat {
    /// `{"balance_infos": [{"total_balance": "..."}]}`
    DeepSeek,
    /// `{"data": {"total_credits": n, "total_usage": n}}`
    OpenRouter,
}

/// Where and how to ask a provider for the remaining account balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceEndpoint {
    pub url: String,
    pub format: BalanceFormat,
    pub currency: Currency,
}

/// A user-declared OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibleProvider {
    pub name: String,
    pub base_url: String,
    pub models: Vec<String>,
}

/// A chat-completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    DeepSeek,
    Gemini,
    OpenAi,
    OpenRouter,
    Compatible(CompatibleProvider),
}

impl Provider {
    /// The built-in catalog, in display order.
    pub const BUILTIN: [Self; 4] = [Self::DeepSeek, Self::Gemini, Self::OpenAi, Self::OpenRouter];

    /// Looks up a built-in provider by name, ignoring case.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "deepseek" => Some(Self::DeepSeek),
            "gemini" | "genimi" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            "openrouter" => Some(Self::OpenRouter),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::DeepSeek => "deepseek",
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Compatible(p) => &p.name,
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            Self::DeepSeek => "https://api.deepseek.com",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Compatible(p) => &p.base_url,
        }
    }

    pub fn model_options(&self) -> Vec<&str> {
        match self {
            Self::DeepSeek => vec!["deepseek-chat", "deepseek-reasoner"],
            Self::Gemini => vec!["gemini-2.5-pro", "gemini-2.5-flash"],
            Self::OpenAi => vec!["gpt-4o", "gpt-5", "gpt-4.1", "gpt-4.1-mini", "gpt-4o-mini"],
            Self::OpenRouter => vec![
                "gpt-4o",
                "gpt-5",
                "gpt-4.1",
                "gpt-4.1-mini",
                "gpt-4o-mini",
                "gemini-2.5-flash",
                "gemini-2.5-pro",
            ],
            Self::Compatible(p) => p.models.iter().map(String::as_str).collect(),
        }
    }

    pub fn default_model(&self) -> Option<&str> {
        self.model_options().first().copied()
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn default_api_key_env(&self) -> String {
        match self {
            Self::DeepSeek => "DEEPSEEK_API_KEY".to_string(),
            Self::Gemini => "GEMINI_API_KEY".to_string(),
            Self::OpenAi => "OPENAI_API_KEY".to_string(),
            Self::OpenRouter => "OPENROUTER_API_KEY".to_string(),
            Self::Compatible(p) => format!(
                "{}_API_KEY",
                p.name
                    .to_ascii_uppercase()
                    .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
            ),
        }
    }

    pub fn balance_endpoint(&self) -> Option<BalanceEndpoint> {
        match self {
            Self::DeepSeek => Some(BalanceEndpoint {
                url: "https://api.deepseek.com/user/balance".to_string(),
                format: BalanceFormat::DeepSeek,
                currency: Currency::Cny,
            }),
            Self::OpenRouter => Some(BalanceEndpoint {
                url: "https://openrouter.ai/api/v1/credits".to_string(),
                format: BalanceFormat::OpenRouter,
                currency: Currency::Usd,
            }),
            Self::Gemini | Self::OpenAi | Self::Compatible(_) => None,
        }
    }

    /// Completion token ceiling to request, if this provider accepts one
    /// for `model`. Gemini models reject the larger ceiling.
    pub fn max_tokens(&self, model: &str) -> Option<u32> {
        match self {
            Self::Gemini | Self::Compatible(_) => None,
            _ if model.contains("gemini") => None,
            Self::DeepSeek | Self::OpenAi | Self::OpenRouter => Some(DEFAULT_MAX_TOKENS),
        }
    }

    /// Full URL of the chat-completions endpoint.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url().trim_end_matches('/'))
    }

    /// Full URL of the model listing endpoint.
    pub fn models_url(&self) -> String {
        format!("{}/models", self.base_url().trim_end_matches('/'))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the model identifier to put on the wire.
///
/// OpenRouter routes by vendor namespace, so bare catalog names get the
/// matching prefix; names that already carry one are left alone.
pub fn resolve_model_name(provider: &Provider, model: &str) -> String {
    match provider {
        Provider::OpenRouter if !model.contains('/') => {
            let vendor = if model.contains("gemini") {
                Some("google")
            } else if model.contains("gpt") {
                Some("openai")
            } else if model.contains("deepseek") {
                Some("deepseek")
            } else {
                None
            };
            vendor.map_or_else(|| model.to_string(), |v| format!("{v}/{model}"))
        }
        _ => model.to_string(),
    }
}
