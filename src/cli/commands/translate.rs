use anyhow::{Context, Result, anyhow};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::cancel::cancel_pair;
use crate::config::{ConfigManager, ResolveOptions, ResolvedConfig, resolve_config};
use crate::credentials::{CredentialRequest, KeyResolver};
use crate::job::{JobOptions, JobSummary, run_job};
use crate::output;
use crate::translation::resolve_model_name;
use crate::ui::{Style, prompt_api_key};

use super::ConfigError;

pub struct TranslateOptions {
    pub file: Option<PathBuf>,
    pub resolve: ResolveOptions,
    pub output_dir: Option<PathBuf>,
    pub no_cache: bool,
}

/// Translates one subtitle file and prints the job summary.
///
/// Ctrl-C cancels the job after the current request; the partial output
/// is still finalized.
pub async fn run_translate(options: TranslateOptions) -> Result<JobSummary> {
    let Some(input) = options.file else {
        return Err(ConfigError(anyhow!(
            "Missing required argument: FILE\n\n\
             Usage: subtl [OPTIONS] <FILE>\n\n\
             Run 'subtl --help' for more information."
        ))
        .into());
    };

    let config = load_config(&options.resolve).map_err(ConfigError)?;

    crate::status!(
        "{} {} ({} → {}) with {} / {}",
        Style::header("Translating"),
        Style::value(input.display()),
        config.source_language,
        config.target_language,
        Style::value(config.provider.name()),
        Style::value(resolve_model_name(&config.provider, &config.model)),
    );

    let interactive = std::io::stdin().is_terminal();
    let job_options = JobOptions {
        output_dir: options.output_dir,
        use_cache: !options.no_cache,
        show_progress: !output::is_quiet() && std::io::stderr().is_terminal(),
    };

    let (cancel, token) = cancel_pair();
    let (prompt_tx, mut prompt_rx) = mpsc::channel::<CredentialRequest>(1);

    let mut resolver = KeyResolver::new(config.key.clone());
    if interactive {
        resolver = resolver.with_prompt(prompt_tx);
    } else {
        drop(prompt_tx);
    }

    let mut worker = tokio::spawn(async move {
        run_job(&config, &resolver, &input, &job_options, token).await
    });

    let mut interrupted = false;
    let summary = loop {
        tokio::select! {
            joined = &mut worker => {
                break joined.context("Translation worker failed")??;
            }
            Some(request) = prompt_rx.recv() => {
                answer_credential_request(request).await;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                if interrupted {
                    crate::warn!("Interrupted twice, exiting");
                    std::process::exit(130);
                }
                interrupted = true;
                crate::warn!(
                    "{} Cancelling after the current request (Ctrl-C again to quit now)",
                    Style::warning("Warning:")
                );
                cancel.cancel();
            }
        }
    };

    print_summary(&summary);
    Ok(summary)
}

fn load_config(options: &ResolveOptions) -> Result<ResolvedConfig> {
    let manager = ConfigManager::new()?;
    let config_file = manager.load_or_default()?;
    resolve_config(options, &config_file)
}

async fn answer_credential_request(request: CredentialRequest) {
    let provider = request.provider.clone();
    let answer = tokio::task::spawn_blocking(move || prompt_api_key(&provider)).await;

    let key = match answer {
        Ok(Ok(key)) => key,
        Ok(Err(e)) => {
            crate::warn!("{} {e:#}", Style::error("Error:"));
            None
        }
        Err(e) => {
            crate::warn!("{} Key prompt failed: {e}", Style::error("Error:"));
            None
        }
    };

    // The worker may have given up waiting; nothing to do then.
    let _ = request.reply.send(key);
}

fn print_summary(summary: &JobSummary) {
    let stats = &summary.stats;
    let heading = if summary.cancelled {
        Style::warning("Cancelled")
    } else {
        Style::success("Done")
    };

    crate::status!(
        "\n{heading}: {} lines written, {}/{} batches translated",
        stats.lines_written,
        stats.batches_translated,
        stats.batches_total
    );
    if stats.batches_skipped > 0 {
        crate::status!("  {} {}", Style::label("skipped"), stats.batches_skipped);
    }
    if stats.batches_not_attempted > 0 {
        crate::status!(
            "  {} {}",
            Style::label("not attempted"),
            stats.batches_not_attempted
        );
    }
    if stats.sentences_dropped > 0 {
        crate::status!(
            "  {} {}",
            Style::label("sentences dropped"),
            stats.sentences_dropped
        );
    }
    if stats.cache_hits > 0 {
        crate::status!("  {} {}", Style::label("cache hits"), stats.cache_hits);
    }
    crate::status!(
        "  {} {} ({} requests)",
        Style::label("tokens"),
        summary.total_tokens,
        summary.requests
    );
    if let Some(balance) = &summary.balance {
        crate::status!("  {} {}", Style::label("balance"), Style::value(balance));
    }
    crate::status!(
        "  {} {}",
        Style::label("subtitle"),
        Style::secondary(summary.paths.subtitle.display())
    );
    crate::status!(
        "  {} {}",
        Style::label("log"),
        Style::secondary(summary.paths.log.display())
    );
}
