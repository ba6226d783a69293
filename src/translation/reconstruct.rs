//! Rebuilding timed dialogue lines from the model's sentence list.

use serde::Deserialize;

use super::request::ContextMap;
use crate::subtitle::DialogueEntry;

/// One original line the model says a sentence was built from.
#[derive(Debug, Clone, Deserialize)]
pub struct RelatedItem {
    pub timestamp: String,
    #[serde(default)]
    pub text: String,
}

/// A translated sentence and the input items it covers, in order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedSentence {
    pub sentence: String,
    #[serde(default)]
    pub related_input_items: Vec<RelatedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationResponse {
    translated_sentences: Vec<TranslatedSentence>,
}

/// A translated sentence paired with the source lines that fed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub sentence: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconstructOutcome {
    /// Not JSON, or no `translatedSentences` array.
    Unparseable,
    Lines {
        lines: Vec<DialogueEntry>,
        audit: Vec<AuditRecord>,
        /// Sentences that referenced a timestamp missing from the batch.
        dropped: usize,
    },
}

/// Rebuilds dialogue lines from a (repaired) model response.
///
/// Each sentence takes its start time and metadata from the first related
/// item and its end time from the last one. Sentences pointing at a
/// timestamp outside this batch are dropped and counted.
pub fn reconstruct(response: &str, context: &ContextMap<'_>) -> ReconstructOutcome {
    let Ok(parsed) = serde_json::from_str::<TranslationResponse>(response) else {
        return ReconstructOutcome::Unparseable;
    };

    let mut lines = Vec::with_capacity(parsed.translated_sentences.len());
    let mut audit = Vec::with_capacity(parsed.translated_sentences.len());
    let mut dropped = 0;

    for sentence in parsed.translated_sentences {
        let (Some(first), Some(last)) = (
            sentence.related_input_items.first(),
            sentence.related_input_items.last(),
        ) else {
            continue;
        };

        let (Some(first_entry), Some(last_entry)) =
            (context.get(&first.timestamp), context.get(&last.timestamp))
        else {
            dropped += 1;
            crate::info!(
                "  dropped sentence referencing unknown timestamp {} .. {}",
                first.timestamp,
                last.timestamp
            );
            continue;
        };

        let text = to_ass_text(&sentence.sentence);
        lines.push(first_entry.retimed(&last_entry.end, text));

        let sources = sentence
            .related_input_items
            .iter()
            .map(|item| {
                context
                    .get(&item.timestamp)
                    .map_or_else(|| item.text.clone(), |entry| entry.text.clone())
            })
            .collect();
        audit.push(AuditRecord {
            sentence: sentence.sentence,
            sources,
        });
    }

    ReconstructOutcome::Lines {
        lines,
        audit,
        dropped,
    }
}

/// ASS text is a single line; embedded newlines become hard breaks.
fn to_ass_text(sentence: &str) -> String {
    sentence.trim().replace("\r\n", "\\N").replace('\n', "\\N")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::subtitle::parse_dialogue;
    use crate::translation::request::{DuplicatePolicy, build_request};

    fn entries(lines: &[&str]) -> Vec<DialogueEntry> {
        lines
            .iter()
            .map(|l| parse_dialogue(l).into_entry().unwrap())
            .collect()
    }

    fn expect_lines(outcome: ReconstructOutcome) -> (Vec<DialogueEntry>, Vec<AuditRecord>, usize) {
        match outcome {
            ReconstructOutcome::Lines {
                lines,
                audit,
                dropped,
            } => (lines, audit, dropped),
            ReconstructOutcome::Unparseable => panic!("expected lines"),
        }
    }

    #[test]
    fn test_two_lines_merge_into_one_sentence() {
        let batch = entries(&[
            "Dialogue: 0,0:00:01.00,0:00:02.50,Default,,0,0,0,,こんにちは",
            "Dialogue: 0,0:00:02.50,0:00:04.00,Default,,0,0,0,,元気ですか",
        ]);
        let request = build_request(&batch, DuplicatePolicy::default());
        let response = r#"{"translatedSentences":[{"sentence":"你好，你好吗","relatedInputItems":[{"timestamp":"0:00:01.00","text":"こんにちは"},{"timestamp":"0:00:02.50","text":"元気ですか"}]}]}"#;

        let (lines, audit, dropped) = expect_lines(reconstruct(response, &request.context));

        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].to_string(),
            "Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,你好，你好吗"
        );
        assert_eq!(dropped, 0);
        assert_eq!(audit[0].sentence, "你好，你好吗");
        assert_eq!(audit[0].sources, vec!["こんにちは", "元気ですか"]);
    }

    #[test]
    fn test_span_uses_first_start_and_last_end() {
        let batch = entries(&[
            "Dialogue: 1,0:00:01.00,0:00:02.00,Top,A,1,2,3,,one",
            "Dialogue: 0,0:00:02.00,0:00:03.00,Default,,0,0,0,,two",
            "Dialogue: 0,0:00:03.00,0:00:07.25,Default,,0,0,0,,three",
        ]);
        let request = build_request(&batch, DuplicatePolicy::default());
        let response = r#"{"translatedSentences":[{"sentence":"一二三","relatedInputItems":[
            {"timestamp":"0:00:01.00","text":"one"},
            {"timestamp":"0:00:02.00","text":"two"},
            {"timestamp":"0:00:03.00","text":"three"}]}]}"#;

        let (lines, _, _) = expect_lines(reconstruct(response, &request.context));

        assert_eq!(lines[0].start, request.context["0:00:01.00"].start);
        assert_eq!(lines[0].end, request.context["0:00:03.00"].end);
        assert_eq!(lines[0].style, "Top");
        assert_eq!(lines[0].layer, "1");
        assert_eq!(lines[0].name, "A");
    }

    #[test]
    fn test_dangling_reference_is_dropped() {
        let batch = entries(&[
            "Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,one",
            "Dialogue: 0,0:00:02.00,0:00:03.00,Default,,0,0,0,,two",
        ]);
        let request = build_request(&batch, DuplicatePolicy::default());
        let response = r#"{"translatedSentences":[
            {"sentence":"ghost","relatedInputItems":[{"timestamp":"9:99:99.99","text":"?"}]},
            {"sentence":"二","relatedInputItems":[{"timestamp":"0:00:02.00","text":"two"}]}]}"#;

        let (lines, audit, dropped) = expect_lines(reconstruct(response, &request.context));

        assert_eq!(dropped, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "二");
        assert!(lines.iter().all(|l| l.text != "ghost"));
        assert_eq!(audit.len(), 1);
    }

    #[test]
    fn test_empty_related_items_are_skipped() {
        let batch = entries(&["Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,one"]);
        let request = build_request(&batch, DuplicatePolicy::default());
        let response = r#"{"translatedSentences":[{"sentence":"x","relatedInputItems":[]},{"sentence":"y"}]}"#;

        let (lines, _, dropped) = expect_lines(reconstruct(response, &request.context));
        assert!(lines.is_empty());
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_unparseable_responses() {
        let batch = entries(&["Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,one"]);
        let request = build_request(&batch, DuplicatePolicy::default());

        for response in [
            "",
            "not json",
            r#"{"sentences": []}"#,
            r#"[{"sentence": "x"}]"#,
            r#"{"translatedSentences": "nope"}"#,
        ] {
            assert_eq!(
                reconstruct(response, &request.context),
                ReconstructOutcome::Unparseable,
                "response: {response}"
            );
        }
    }

    #[test]
    fn test_multiline_sentence_uses_hard_breaks() {
        let batch = entries(&["Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,one"]);
        let request = build_request(&batch, DuplicatePolicy::default());
        let response = r#"{"translatedSentences":[{"sentence":"a\nb","relatedInputItems":[{"timestamp":"0:00:01.00"}]}]}"#;

        let (lines, _, _) = expect_lines(reconstruct(response, &request.context));
        assert_eq!(lines[0].text, "a\\Nb");
    }

    #[test]
    fn test_disambiguated_keys_resolve_duplicates() {
        let batch = entries(&[
            "Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,top",
            "Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,bottom",
        ]);
        let request = build_request(&batch, DuplicatePolicy::Disambiguate);
        let response = r#"{"translatedSentences":[
            {"sentence":"上","relatedInputItems":[{"timestamp":"0:00:01.00"}]},
            {"sentence":"下","relatedInputItems":[{"timestamp":"0:00:01.00#2"}]}]}"#;

        let (lines, _, _) = expect_lines(reconstruct(response, &request.context));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].start, "0:00:01.00");
        assert_eq!(lines[1].end, "0:00:03.00");
    }
}
