//! One translation job: read, batch, translate, reconstruct, write.

mod context;
mod runner;
mod usage;
mod writer;

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::credentials::CredentialError;

pub use context::{JobContext, JobStats};
pub use runner::{JobOptions, JobRunner, JobSettings, JobSummary, MAX_PARSE_ATTEMPTS, run_job};
pub use usage::{Balance, UsageCounter, parse_balance, query_balance};
pub use writer::{OutputAssembler, OutputPaths};

#[derive(Error, Debug)]
pub enum JobError {
    /// Reading the source or writing an output file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// A batch could not be serialized into a request payload.
    #[error("failed to build request payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl JobError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
