use super::usage::UsageCounter;
use crate::translation::ConversationHistory;

/// Counters reported in the job summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    pub batches_total: usize,
    pub batches_translated: usize,
    pub batches_skipped: usize,
    /// Batches never sent because the job was cancelled.
    pub batches_not_attempted: usize,
    pub lines_written: usize,
    pub sentences_dropped: usize,
    pub start_collisions: usize,
    pub cache_hits: usize,
}

/// Mutable state of one job, owned by the worker.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub history: ConversationHistory,
    pub usage: UsageCounter,
    pub stats: JobStats,
}

impl JobContext {
    pub fn new(max_history: usize, batches_total: usize) -> Self {
        Self {
            history: ConversationHistory::new(max_history),
            usage: UsageCounter::default(),
            stats: JobStats {
                batches_total,
                ..JobStats::default()
            },
        }
    }
}
