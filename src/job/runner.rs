use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use super::context::{JobContext, JobStats};
use super::usage::{Balance, query_balance};
use super::writer::{OutputAssembler, OutputPaths};
use super::JobError;
use crate::cache::{CacheManager, CacheRequest};
use crate::cancel::CancelToken;
use crate::config::ResolvedConfig;
use crate::credentials::CredentialSource;
use crate::subtitle::{DialogueEntry, SubtitleFile};
use crate::translation::{
    AuditRecord, ChatBackend, CompletionSettings, DuplicatePolicy, HttpBackend,
    ReconstructOutcome, Role, TranslationClient, build_request, reconstruct,
};
use crate::ui::{BatchProgress, Style};

/// Responses per batch that may fail to reconstruct before it is skipped.
pub const MAX_PARSE_ATTEMPTS: usize = 3;

/// Everything the worker needs to know besides the file itself.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub completion: CompletionSettings,
    /// Provider base URL; part of the cache key.
    pub endpoint: String,
    pub batch_size: NonZeroUsize,
    pub max_history: usize,
    pub duplicates: DuplicatePolicy,
    pub normalize_punctuation: bool,
    pub parse_attempts: usize,
}

impl JobSettings {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            completion: CompletionSettings::for_provider(
                &config.provider,
                &config.model,
                config.temperature,
                config.system_prompt.clone(),
            ),
            endpoint: config.provider.base_url().to_string(),
            batch_size: config.batch_size,
            max_history: config.max_history,
            duplicates: config.duplicates,
            normalize_punctuation: config.normalize_punctuation,
            parse_attempts: MAX_PARSE_ATTEMPTS,
        }
    }
}

/// What a finished (or cancelled) job reports.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub paths: OutputPaths,
    pub stats: JobStats,
    pub total_tokens: u64,
    /// Batch requests sent, failed ones included. Transport retries count once.
    pub requests: usize,
    pub balance: Option<Balance>,
    pub cancelled: bool,
}

/// Knobs of a job that come from the command line rather than config.
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    pub output_dir: Option<PathBuf>,
    pub use_cache: bool,
    pub show_progress: bool,
}

enum BatchOutcome {
    Translated {
        lines: Vec<DialogueEntry>,
        audit: Vec<AuditRecord>,
    },
    Skipped,
    Cancelled,
}

/// Drives batches through the client strictly in file order.
pub struct JobRunner<B> {
    client: TranslationClient<B>,
    settings: JobSettings,
    cache: Option<CacheManager>,
    cancel: CancelToken,
    show_progress: bool,
}

impl<B: ChatBackend> JobRunner<B> {
    pub fn new(client: TranslationClient<B>, settings: JobSettings) -> Self {
        Self {
            client,
            settings,
            cache: None,
            cancel: CancelToken::never(),
            show_progress: false,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Cancels between batches and interrupts the client's backoff.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.client = self.client.with_cancel(cancel.clone());
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub const fn client(&self) -> &TranslationClient<B> {
        &self.client
    }

    /// Translates `input`, writing outputs next to it or into `output_dir`.
    pub async fn run(&self, input: &Path, output_dir: Option<&Path>) -> Result<JobSummary, JobError> {
        let file = read_subtitle(input)?;
        self.run_file(&file, OutputPaths::for_input(input, output_dir))
            .await
    }

    pub async fn run_file(
        &self,
        file: &SubtitleFile,
        paths: OutputPaths,
    ) -> Result<JobSummary, JobError> {
        let size = self.settings.batch_size;
        let total = file.batch_count(size);
        let mut ctx = JobContext::new(self.settings.max_history, total);
        let mut output =
            OutputAssembler::create(paths, file.header(), self.settings.normalize_punctuation)?;

        if file.entries().is_empty() {
            crate::warn!(
                "{} No dialogue lines found; writing header only",
                Style::warning("Warning:")
            );
        }

        let mut cancelled = false;
        {
            let progress = BatchProgress::new(total, self.show_progress);

            for batch in file.batches(size) {
                let batch_no = batch.index + 1;
                let outcome = if self.cancel.is_cancelled() {
                    BatchOutcome::Cancelled
                } else {
                    progress.set_message(format!("(batch {batch_no})"));
                    self.translate(batch_no, batch.entries, &mut ctx).await?
                };

                match outcome {
                    BatchOutcome::Translated { lines, audit } => {
                        output.append_batch(&lines, &audit)?;
                        ctx.stats.batches_translated += 1;
                    }
                    BatchOutcome::Skipped => {
                        ctx.stats.batches_skipped += 1;
                        crate::warn!(
                            "{} Batch {batch_no}/{total} skipped after {} unusable responses",
                            Style::warning("Warning:"),
                            self.settings.parse_attempts.max(1)
                        );
                    }
                    BatchOutcome::Cancelled => {
                        cancelled = true;
                        ctx.stats.batches_not_attempted = total - batch.index;
                        break;
                    }
                }
                progress.advance();
            }
        }

        ctx.stats.lines_written = output.lines_written();
        let paths = output.finish(file.body())?;

        Ok(JobSummary {
            paths,
            stats: ctx.stats,
            total_tokens: ctx.usage.total_tokens(),
            requests: ctx.usage.calls(),
            balance: None,
            cancelled,
        })
    }

    async fn translate(
        &self,
        batch_no: usize,
        entries: &[DialogueEntry],
        ctx: &mut JobContext,
    ) -> Result<BatchOutcome, JobError> {
        let total = ctx.stats.batches_total;
        let request = build_request(entries, self.settings.duplicates);
        if request.collisions > 0 {
            ctx.stats.start_collisions += request.collisions;
            crate::warn!(
                "{} Batch {batch_no}/{total}: {} lines reuse a start time",
                Style::warning("Warning:"),
                request.collisions
            );
        }

        let payload = request.payload()?;
        let cache_request = CacheRequest {
            batch_text: &payload,
            model: &self.settings.completion.model,
            endpoint: &self.settings.endpoint,
            system_prompt: &self.settings.completion.system_prompt,
        };

        if let Some(content) = self.cached(&cache_request)
            && let ReconstructOutcome::Lines {
                lines,
                audit,
                dropped,
            } = reconstruct(&content, &request.context)
        {
            crate::info!("Batch {batch_no}/{total}: cache hit");
            ctx.stats.cache_hits += 1;
            ctx.stats.sentences_dropped += dropped;
            ctx.history.push(Role::Assistant, content);
            return Ok(BatchOutcome::Translated { lines, audit });
        }

        crate::status!(
            "Batch {batch_no}/{total}: translating {} lines",
            entries.len()
        );

        let attempts = self.settings.parse_attempts.max(1);
        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Ok(BatchOutcome::Cancelled);
            }

            let reply = self
                .client
                .translate_batch(batch_no, &payload, &self.settings.completion, &ctx.history)
                .await;
            ctx.usage.record(reply.tokens);

            let Some(content) = reply.content else {
                if self.cancel.is_cancelled() {
                    return Ok(BatchOutcome::Cancelled);
                }
                crate::warn!("Batch {batch_no}/{total}: no response (attempt {attempt}/{attempts})");
                continue;
            };

            match reconstruct(&content, &request.context) {
                ReconstructOutcome::Lines {
                    lines,
                    audit,
                    dropped,
                } => {
                    if dropped > 0 {
                        crate::warn!(
                            "Batch {batch_no}/{total}: dropped {dropped} sentences with unknown timestamps"
                        );
                    }
                    ctx.stats.sentences_dropped += dropped;
                    self.store(&cache_request, &content);
                    ctx.history.push(Role::Assistant, content);
                    crate::status!(
                        "Batch {batch_no}/{total}: {} lines ({} tokens)",
                        lines.len(),
                        reply.tokens
                    );
                    return Ok(BatchOutcome::Translated { lines, audit });
                }
                ReconstructOutcome::Unparseable => {
                    crate::warn!(
                        "Batch {batch_no}/{total}: response is not usable JSON (attempt {attempt}/{attempts})"
                    );
                }
            }
        }

        Ok(BatchOutcome::Skipped)
    }

    fn cached(&self, request: &CacheRequest<'_>) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.get(request) {
            Ok(hit) => hit,
            Err(e) => {
                crate::warn!("{} Cache lookup failed: {e:#}", Style::warning("Warning:"));
                None
            }
        }
    }

    fn store(&self, request: &CacheRequest<'_>, content: &str) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(request, content)
        {
            crate::warn!("{} Failed to cache response: {e:#}", Style::warning("Warning:"));
        }
    }
}

fn read_subtitle(input: &Path) -> Result<SubtitleFile, JobError> {
    let content = fs::read_to_string(input).map_err(|source| JobError::io(input, source))?;
    Ok(SubtitleFile::parse(&content))
}

/// Runs a whole job against the configured provider: key lookup, batch
/// loop, then the optional balance query.
pub async fn run_job(
    config: &ResolvedConfig,
    credentials: &dyn CredentialSource,
    input: &Path,
    options: &JobOptions,
    cancel: CancelToken,
) -> Result<JobSummary, JobError> {
    let file = read_subtitle(input)?;
    let paths = OutputPaths::for_input(input, options.output_dir.as_deref());

    let api_key = credentials.plaintext_api_key(&config.provider).await?;
    let backend = HttpBackend::new(&config.provider, api_key.clone())?;

    let mut runner = JobRunner::new(TranslationClient::new(backend), JobSettings::from_config(config))
        .with_cancel(cancel)
        .with_progress(options.show_progress);

    if options.use_cache {
        match CacheManager::new() {
            Ok(cache) => runner = runner.with_cache(cache),
            Err(e) => crate::warn!(
                "{} Cache disabled: {e:#}",
                Style::warning("Warning:")
            ),
        }
    }

    let mut summary = runner.run_file(&file, paths).await?;

    if config.query_balance
        && !summary.cancelled
        && let Some(endpoint) = config.provider.balance_endpoint()
    {
        match query_balance(&endpoint, api_key.as_deref()).await {
            Ok(balance) => summary.balance = Some(balance),
            Err(e) => crate::warn!("Balance unavailable: {e}"),
        }
    }

    Ok(summary)
}
