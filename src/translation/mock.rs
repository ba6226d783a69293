//! Scripted chat backend for exercising the pipeline without a network.
//!
//! Each call to [`ScriptedBackend::complete`] pops the next scripted result;
//! once the script runs out every call fails with a transport error.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::client::{ChatBackend, ChatCompletion, ChatRequest};
use super::error::ApiError;

#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<ChatCompletion, ApiError>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<ChatCompletion, ApiError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// A backend answering every call with `content`, in order.
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            replies
                .into_iter()
                .map(|content| {
                    Ok(ChatCompletion {
                        content: content.into(),
                        total_tokens: 10,
                    })
                })
                .collect(),
        )
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, serialized as it would go on the wire.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<ChatCompletion, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let (Ok(mut requests), Ok(value)) = (self.requests.lock(), serde_json::to_value(request))
        {
            requests.push(value);
        }

        self.script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(ApiError::Transport("script exhausted".to_string())))
    }
}
