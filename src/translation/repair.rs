//! Pre-parse repair of near-valid JSON emitted by language models.
//!
//! Three defects show up often enough to fix mechanically, and they are
//! fixed in this order:
//!
//! 1. An empty string wedged between a key and its value:
//!    `"timestamp": " "1:39:30.60"` or `"sentence": "" "text"`.
//! 2. A string value split mid-sentence and rejoined with a quote pair:
//!    `"...直接" "连袋子..."`, `"Well," "he said"`, `"I went " "home"`.
//! 3. Adjacent objects or arrays with no separating comma: `} {`.
//!
//! The passes run until the text stops changing, so `repair` is idempotent.
//! Nothing here guarantees the result parses.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

// unwrap is safe in the patterns below: they are compile-time constants

/// `: "<ws>"` followed by either the value's own opening quote or the first
/// character of a value whose opening quote went missing.
#[allow(clippy::unwrap_used)]
static EMPTY_BEFORE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(:\s*)"\s*"(\s*"|[^\s,}\]"])"#).unwrap());

/// A quote pair after string content (punctuation and spaces included) and
/// before more content. Whitespace after the pair is kept with the right
/// half; a structural character there means the pair closes a real `""`.
#[allow(clippy::unwrap_used)]
static SPLICED_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^:\[{"])"\s*"(\s*[^\s:,}\]"])"#).unwrap());

/// A closing bracket directly followed by an opening one.
#[allow(clippy::unwrap_used)]
static MISSING_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([}\]])\s*([{\[])").unwrap());

/// Applies all fixes until a fixed point is reached.
pub fn repair(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = repair_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn repair_pass(input: &str) -> String {
    let step = collapse_empty_before_value(input);
    let step = stitch_spliced_strings(&step);
    insert_missing_separators(&step).into_owned()
}

fn collapse_empty_before_value(input: &str) -> Cow<'_, str> {
    EMPTY_BEFORE_VALUE.replace_all(input, |caps: &Captures<'_>| {
        let next = &caps[2];
        if next.ends_with('"') {
            format!("{}\"", &caps[1])
        } else {
            format!("{}\"{next}", &caps[1])
        }
    })
}

fn stitch_spliced_strings(input: &str) -> Cow<'_, str> {
    SPLICED_STRING.replace_all(input, "$1$2")
}

fn insert_missing_separators(input: &str) -> Cow<'_, str> {
    MISSING_SEPARATOR.replace_all(input, "$1,$2")
}
