//! Header/body split and fixed-size batch partitioning.

use std::num::NonZeroUsize;
use std::slice::Chunks;

use super::dialogue::{DialogueEntry, parse_dialogue};

/// Default number of dialogue entries sent per model request.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(80) {
    Some(size) => size,
    None => unreachable!(),
};

/// A subtitle file split into its pass-through header and dialogue body.
///
/// Lines keep their original terminators so the header and the trailing
/// reference section can be written back byte-for-byte.
#[derive(Debug, Clone, Default)]
pub struct SubtitleFile {
    header: Vec<String>,
    body: Vec<String>,
    entries: Vec<DialogueEntry>,
}

/// An ordered, contiguous run of dialogue entries translated in one request.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Zero-based position of this batch in the file.
    pub index: usize,
    pub entries: &'a [DialogueEntry],
}

impl SubtitleFile {
    /// Splits file content at the first parseable dialogue line.
    ///
    /// A file without any dialogue line is all header.
    pub fn parse(content: &str) -> Self {
        let lines: Vec<&str> = content.split_inclusive('\n').collect();

        let Some(first) = first_dialogue_index(&lines) else {
            return Self {
                header: lines.into_iter().map(str::to_string).collect(),
                ..Self::default()
            };
        };

        let (header, body) = lines.split_at(first);
        let entries = body
            .iter()
            .filter_map(|line| parse_dialogue(line).into_entry())
            .collect();

        Self {
            header: header.iter().map(|l| (*l).to_string()).collect(),
            body: body.iter().map(|l| (*l).to_string()).collect(),
            entries,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Every line from the first dialogue line onward, verbatim.
    pub fn body(&self) -> &[String] {
        &self.body
    }

    pub fn entries(&self) -> &[DialogueEntry] {
        &self.entries
    }

    pub fn batch_count(&self, size: NonZeroUsize) -> usize {
        self.entries.len().div_ceil(size.get())
    }

    /// Iterates over the dialogue entries in batches of at most `size`.
    pub fn batches(&self, size: NonZeroUsize) -> impl Iterator<Item = Batch<'_>> {
        partition(&self.entries, size)
            .enumerate()
            .map(|(index, entries)| Batch { index, entries })
    }
}

/// Index of the first line that parses as a dialogue event.
pub fn first_dialogue_index<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
    lines
        .iter()
        .position(|line| parse_dialogue(line.as_ref()).is_dialogue())
}

/// Splits `items` into consecutive, non-overlapping runs of `size`; the
/// last run may be shorter.
pub fn partition<T>(items: &[T], size: NonZeroUsize) -> Chunks<'_, T> {
    items.chunks(size.get())
}
