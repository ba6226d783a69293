//! Token accounting and provider balance lookup.

use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::translation::{ApiError, BalanceEndpoint, BalanceFormat, Currency};

/// Running total of tokens spent by one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounter {
    total_tokens: u64,
    calls: usize,
}

impl UsageCounter {
    /// Records one client call. Failed calls are recorded with 0 tokens.
    pub const fn record(&mut self, tokens: u64) {
        self.total_tokens = self.total_tokens.saturating_add(tokens);
        self.calls += 1;
    }

    pub const fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub const fn calls(&self) -> usize {
        self.calls
    }
}

/// Remaining account balance as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balance {
    pub amount: f64,
    pub currency: Currency,
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency.code())
    }
}

/// Extracts the remaining balance from a balance endpoint response.
pub fn parse_balance(format: BalanceFormat, body: &Value) -> Option<f64> {
    match format {
        BalanceFormat::DeepSeek => {
            let total = body.pointer("/balance_infos/0/total_balance")?;
            total
                .as_f64()
                .or_else(|| total.as_str().and_then(|s| s.trim().parse().ok()))
        }
        BalanceFormat::OpenRouter => {
            let data = body.get("data")?;
            let credits = data.get("total_credits")?.as_f64()?;
            let usage = data
                .get("total_usage")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            Some(credits - usage)
        }
    }
}

/// GETs the provider's balance endpoint with the bearer key.
pub async fn query_balance(
    endpoint: &BalanceEndpoint,
    api_key: Option<&str>,
) -> Result<Balance, ApiError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    let mut request = client.get(&endpoint.url);
    if let Some(api_key) = api_key {
        request = request.bearer_auth(api_key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(ApiError::from_status(status.as_u16(), &text));
    }

    let body: Value =
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
    let amount = parse_balance(endpoint.format, &body)
        .ok_or_else(|| ApiError::InvalidResponse("no balance in response".to_string()))?;

    Ok(Balance {
        amount,
        currency: endpoint.currency,
    })
}
