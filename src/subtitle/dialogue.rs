//! Parsing and rendering of ASS `Dialogue:` event lines.

use std::fmt;

/// The literal marker every dialogue event line starts with.
pub const DIALOGUE_MARKER: &str = "Dialogue:";

/// Number of comma-separated metadata fields before the free-form text.
const METADATA_FIELDS: usize = 9;

/// One timed-text event line.
///
/// Times are kept in their original `h:mm:ss.cc` text form; the translator
/// never does arithmetic on them, it only copies them between lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueEntry {
    pub layer: String,
    pub start: String,
    pub end: String,
    pub style: String,
    pub name: String,
    pub margin_l: String,
    pub margin_r: String,
    pub margin_v: String,
    pub effect: String,
    pub text: String,
}

/// Result of trying to read a line as a dialogue event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The line is not a dialogue event (header, comment, blank, malformed).
    NotDialogue,
    Entry(DialogueEntry),
}

impl ParseOutcome {
    pub fn into_entry(self) -> Option<DialogueEntry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::NotDialogue => None,
        }
    }

    pub const fn is_dialogue(&self) -> bool {
        matches!(self, Self::Entry(_))
    }
}

impl DialogueEntry {
    /// Returns a copy of this entry's metadata spanning `start..end` with new text.
    pub fn retimed(&self, end: &str, text: impl Into<String>) -> Self {
        Self {
            end: end.to_string(),
            text: text.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for DialogueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{DIALOGUE_MARKER} {},{},{},{},{},{},{},{},{},{}",
            self.layer,
            self.start,
            self.end,
            self.style,
            self.name,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.effect,
            self.text
        )
    }
}

/// Parses a single subtitle line.
///
/// Lines that do not start with [`DIALOGUE_MARKER`] (after leading
/// whitespace) or that have fewer than ten fields are reported as
/// [`ParseOutcome::NotDialogue`] so the caller can pass them through.
/// Commas after the ninth separator belong to the text.
pub fn parse_dialogue(line: &str) -> ParseOutcome {
    let Some(rest) = line.trim_start().strip_prefix(DIALOGUE_MARKER) else {
        return ParseOutcome::NotDialogue;
    };
    let rest = rest.trim_start().trim_end_matches(['\r', '\n']);

    let fields: Vec<&str> = rest.splitn(METADATA_FIELDS + 1, ',').collect();
    let [layer, start, end, style, name, margin_l, margin_r, margin_v, effect, text] =
        fields.as_slice()
    else {
        return ParseOutcome::NotDialogue;
    };

    ParseOutcome::Entry(DialogueEntry {
        layer: (*layer).to_string(),
        start: (*start).to_string(),
        end: (*end).to_string(),
        style: (*style).to_string(),
        name: (*name).to_string(),
        margin_l: (*margin_l).to_string(),
        margin_r: (*margin_r).to_string(),
        margin_v: (*margin_v).to_string(),
        effect: (*effect).to_string(),
        text: (*text).to_string(),
    })
}
