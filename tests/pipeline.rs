#![allow(clippy::unwrap_used)]
//! End-to-end job tests against a scripted backend.
//!
//! A whole subtitle file goes through batching, request building, the
//! client, reconstruction and the output writer; only the HTTP call is
//! replaced.

use std::fs;
use std::num::NonZeroUsize;
use std::time::Duration;

use subtl_cli::job::{JobRunner, JobSettings, MAX_PARSE_ATTEMPTS};
use subtl_cli::translation::mock::ScriptedBackend;
use subtl_cli::translation::{
    CompletionSettings, DuplicatePolicy, Provider, RetryPolicy, SYSTEM_PROMPT_TEMPLATE,
    TranslationClient, build_system_prompt,
};
use tempfile::TempDir;

const EPISODE: &str = "[Script Info]\n\
    ScriptType: v4.00+\n\
    \n\
    [Events]\n\
    Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
    Dialogue: 0,0:00:01.00,0:00:02.50,Default,,0,0,0,,こんにちは\n\
    Dialogue: 0,0:00:02.50,0:00:04.00,Default,,0,0,0,,元気ですか\n\
    Dialogue: 0,0:00:05.00,0:00:06.00,Top,,0,0,0,,看板\n\
    Dialogue: 0,0:00:05.00,0:00:07.00,Default,,0,0,0,,そうですね\n";

fn settings(batch_size: usize, duplicates: DuplicatePolicy) -> JobSettings {
    let provider = Provider::DeepSeek;
    JobSettings {
        completion: CompletionSettings::for_provider(
            &provider,
            "deepseek-chat",
            1.3,
            build_system_prompt(SYSTEM_PROMPT_TEMPLATE, "Japanese", "Chinese"),
        ),
        endpoint: provider.base_url().to_string(),
        batch_size: NonZeroUsize::new(batch_size).unwrap(),
        max_history: 10,
        duplicates,
        normalize_punctuation: true,
        parse_attempts: MAX_PARSE_ATTEMPTS,
    }
}

fn runner(backend: ScriptedBackend, settings: JobSettings) -> JobRunner<ScriptedBackend> {
    let client = TranslationClient::new(backend).with_retry(RetryPolicy {
        max_attempts: 1,
        initial_delay: Duration::from_millis(1),
    });
    JobRunner::new(client, settings)
}

const MERGED_REPLY: &str = r#"{"translatedSentences":[
    {"sentence":"你好，你好吗？","relatedInputItems":[
        {"timestamp":"0:00:01.00","text":"こんにちは"},
        {"timestamp":"0:00:02.50","text":"元気ですか"}]},
    {"sentence":"招牌","relatedInputItems":[{"timestamp":"0:00:05.00","text":"看板"}]},
    {"sentence":"“是啊”","relatedInputItems":[{"timestamp":"0:00:05.00#2","text":"そうですね"}]}
]}"#;

#[tokio::test]
async fn test_fragments_merge_into_one_line() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("episode01.ass");
    fs::write(&input, EPISODE).unwrap();

    let job = runner(
        ScriptedBackend::replying([MERGED_REPLY]),
        settings(80, DuplicatePolicy::Disambiguate),
    );
    let summary = job.run(&input, None).await.unwrap();

    assert_eq!(summary.stats.batches_total, 1);
    assert_eq!(summary.stats.lines_written, 3);
    assert_eq!(summary.stats.start_collisions, 1);
    assert_eq!(
        summary.paths.subtitle,
        dir.path().join("episode01_readytogo.ass")
    );

    let output = fs::read_to_string(&summary.paths.subtitle).unwrap();
    assert!(output.starts_with("[Script Info]\nScriptType: v4.00+\n"));
    assert!(output.contains("Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,你好 你好吗\n"));
    assert!(output.contains("Dialogue: 0,0:00:05.00,0:00:06.00,Top,,0,0,0,,招牌\n"));
    assert!(output.contains("Dialogue: 0,0:00:05.00,0:00:07.00,Default,,0,0,0,,「是啊」\n"));
    // Original dialogue follows as reference.
    assert!(output.ends_with("Dialogue: 0,0:00:05.00,0:00:07.00,Default,,0,0,0,,そうですね\n"));

    let log = fs::read_to_string(&summary.paths.log).unwrap();
    assert!(log.starts_with("你好，你好吗？\nこんにちは\n元気ですか\n\n"));
}

#[tokio::test]
async fn test_duplicate_starts_sent_with_suffix() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("episode01.ass");
    fs::write(&input, EPISODE).unwrap();

    let job = runner(
        ScriptedBackend::replying([MERGED_REPLY]),
        settings(80, DuplicatePolicy::Disambiguate),
    );
    job.run(&input, None).await.unwrap();

    let requests = job.client().backend().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["response_format"]["type"], "json_object");

    let messages = requests[0]["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    let user = messages.last().unwrap()["content"].as_str().unwrap();
    assert!(user.contains("0:00:05.00#2"));
    assert!(user.contains("こんにちは"));
}

#[tokio::test]
async fn test_keep_first_drops_second_speaker() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("episode01.ass");
    fs::write(&input, EPISODE).unwrap();

    let reply = r#"{"translatedSentences":[
        {"sentence":"招牌","relatedInputItems":[{"timestamp":"0:00:05.00"}]}]}"#;
    let job = runner(
        ScriptedBackend::replying([reply]),
        settings(80, DuplicatePolicy::KeepFirst),
    );
    let summary = job.run(&input, Some(dir.path())).await.unwrap();

    assert_eq!(summary.stats.start_collisions, 1);
    let output = fs::read_to_string(&summary.paths.subtitle).unwrap();
    assert!(output.contains("Dialogue: 0,0:00:05.00,0:00:06.00,Top,,0,0,0,,招牌\n"));
}

#[tokio::test]
async fn test_output_dir_receives_both_files() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = dir.path().join("episode01.ass");
    fs::write(&input, EPISODE).unwrap();

    let job = runner(
        ScriptedBackend::replying([MERGED_REPLY]),
        settings(80, DuplicatePolicy::Disambiguate),
    );
    let summary = job.run(&input, Some(out.path())).await.unwrap();

    assert!(out.path().join("episode01_readytogo.ass").exists());
    assert!(out.path().join("episode01_translation_log.txt").exists());
    assert!(!dir.path().join("episode01_readytogo.ass").exists());
    assert_eq!(summary.total_tokens, 10);
}

#[tokio::test]
async fn test_transport_failure_skips_batch() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("episode01.ass");
    fs::write(&input, EPISODE).unwrap();

    // Empty script: every call fails at the transport level.
    let job = runner(
        ScriptedBackend::default(),
        settings(2, DuplicatePolicy::Disambiguate),
    );
    let summary = job.run(&input, None).await.unwrap();

    assert_eq!(summary.stats.batches_total, 2);
    assert_eq!(summary.stats.batches_skipped, 2);
    assert_eq!(summary.stats.lines_written, 0);
    assert_eq!(job.client().backend().calls(), 2 * MAX_PARSE_ATTEMPTS);

    let output = fs::read_to_string(&summary.paths.subtitle).unwrap();
    assert!(output.contains(",,こんにちは\n"));
}
