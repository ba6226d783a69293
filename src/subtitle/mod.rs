//! ASS subtitle data model: dialogue lines, header/body split, batching.

mod batch;
mod dialogue;
pub mod punctuation;

pub use batch::{Batch, DEFAULT_BATCH_SIZE, SubtitleFile, first_dialogue_index, partition};
pub use dialogue::{DIALOGUE_MARKER, DialogueEntry, ParseOutcome, parse_dialogue};
