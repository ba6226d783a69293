//! Projection of a batch into the model payload and the local join map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::subtitle::DialogueEntry;

/// What to do when two entries in one batch share a start time.
///
/// The start time is the join key between the request and the model's
/// answer, so a collision makes one of the entries unreachable unless the
/// key is made unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later entry replaces the earlier one in the join map.
    Overwrite,
    /// The earlier entry keeps the key.
    KeepFirst,
    /// Later duplicates are sent under `START#2`, `START#3`, ...
    #[default]
    Disambiguate,
}

/// The externally visible projection of one dialogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequestItem {
    pub timestamp: String,
    pub text: String,
}

/// Join key → original entry, for one batch.
pub type ContextMap<'a> = HashMap<String, &'a DialogueEntry>;

/// A batch ready to send: payload items plus the map to rebuild timing.
#[derive(Debug, Clone)]
pub struct BatchRequest<'a> {
    pub items: Vec<TranslationRequestItem>,
    pub context: ContextMap<'a>,
    /// Number of entries whose start time was already taken in this batch.
    pub collisions: usize,
}

impl BatchRequest<'_> {
    /// Pretty-printed JSON array of the request items.
    pub fn payload(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.items)
    }
}

/// Builds the request items and context map for a batch. No I/O.
pub fn build_request(entries: &[DialogueEntry], policy: DuplicatePolicy) -> BatchRequest<'_> {
    let mut items = Vec::with_capacity(entries.len());
    let mut context: ContextMap<'_> = HashMap::with_capacity(entries.len());
    let mut collisions = 0;

    for entry in entries {
        let mut key = entry.start.clone();

        if context.contains_key(&key) {
            collisions += 1;
            match policy {
                DuplicatePolicy::Overwrite => {
                    context.insert(key.clone(), entry);
                }
                DuplicatePolicy::KeepFirst => {}
                DuplicatePolicy::Disambiguate => {
                    key = (2..)
                        .map(|n| format!("{}#{n}", entry.start))
                        .find(|candidate| !context.contains_key(candidate))
                        .unwrap_or_default();
                    context.insert(key.clone(), entry);
                }
            }
        } else {
            context.insert(key.clone(), entry);
        }

        items.push(TranslationRequestItem {
            timestamp: key,
            text: entry.text.clone(),
        });
    }

    BatchRequest {
        items,
        context,
        collisions,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::subtitle::parse_dialogue;

    fn entry(start: &str, end: &str, text: &str) -> DialogueEntry {
        parse_dialogue(&format!("Dialogue: 0,{start},{end},Default,,0,0,0,,{text}"))
            .into_entry()
            .unwrap()
    }

    #[test]
    fn test_items_follow_batch_order() {
        let entries = vec![
            entry("0:00:01.00", "0:00:02.00", "a"),
            entry("0:00:02.00", "0:00:03.00", "b"),
        ];
        let request = build_request(&entries, DuplicatePolicy::default());

        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].timestamp, "0:00:01.00");
        assert_eq!(request.items[1].text, "b");
        assert_eq!(request.context["0:00:02.00"].end, "0:00:03.00");
        assert_eq!(request.collisions, 0);
    }

    #[test]
    fn test_payload_is_pretty_json_with_unicode() {
        let entries = vec![entry("0:00:01.00", "0:00:02.00", "こんにちは")];
        let payload = build_request(&entries, DuplicatePolicy::default())
            .payload()
            .unwrap();

        assert!(payload.contains("こんにちは"));
        assert!(payload.contains("\n  {"));
        assert!(payload.contains("\"timestamp\": \"0:00:01.00\""));
    }

    #[test]
    fn test_overwrite_policy_replaces_earlier_entry() {
        let entries = vec![
            entry("0:00:01.00", "0:00:02.00", "first"),
            entry("0:00:01.00", "0:00:05.00", "second"),
        ];
        let request = build_request(&entries, DuplicatePolicy::Overwrite);

        assert_eq!(request.collisions, 1);
        assert_eq!(request.context.len(), 1);
        assert_eq!(request.context["0:00:01.00"].text, "second");
        assert_eq!(request.items[1].timestamp, "0:00:01.00");
    }

    #[test]
    fn test_keep_first_policy() {
        let entries = vec![
            entry("0:00:01.00", "0:00:02.00", "first"),
            entry("0:00:01.00", "0:00:05.00", "second"),
        ];
        let request = build_request(&entries, DuplicatePolicy::KeepFirst);

        assert_eq!(request.collisions, 1);
        assert_eq!(request.context["0:00:01.00"].text, "first");
    }

    #[test]
    fn test_disambiguate_policy_keeps_every_entry_reachable() {
        let entries = vec![
            entry("0:00:01.00", "0:00:02.00", "first"),
            entry("0:00:01.00", "0:00:03.00", "second"),
            entry("0:00:01.00", "0:00:04.00", "third"),
        ];
        let request = build_request(&entries, DuplicatePolicy::Disambiguate);

        assert_eq!(request.collisions, 2);
        assert_eq!(request.context.len(), 3);
        assert_eq!(request.items[1].timestamp, "0:00:01.00#2");
        assert_eq!(request.items[2].timestamp, "0:00:01.00#3");
        assert_eq!(request.context["0:00:01.00#3"].text, "third");
    }
}
