mod client;
mod error;
mod history;
pub mod mock;
mod prompt;
mod provider;
mod reconstruct;
mod repair;
mod request;

pub use client::{
    BatchReply, ChatBackend, ChatCompletion, ChatRequest, CompletionSettings, HttpBackend,
    Message, ResponseFormat, RetryPolicy, TranslationClient, build_messages,
};
pub use error::ApiError;
pub use history::{ConversationHistory, DEFAULT_MAX_HISTORY, Role, Turn};
pub use prompt::{SYSTEM_PROMPT_TEMPLATE, build_system_prompt};
pub use provider::{
    BalanceEndpoint, BalanceFormat, CompatibleProvider, Currency, Provider, resolve_model_name,
};
pub use reconstruct::{
    AuditRecord, ReconstructOutcome, RelatedItem, TranslatedSentence, reconstruct,
};
pub use repair::repair;
pub use request::{
    BatchRequest, ContextMap, DuplicatePolicy, TranslationRequestItem, build_request,
};
