use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::JobError;
use crate::subtitle::{DialogueEntry, punctuation};
use crate::translation::AuditRecord;

const SUBTITLE_SUFFIX: &str = "_readytogo.ass";
const LOG_SUFFIX: &str = "_translation_log.txt";

/// Where a job writes its translated subtitle and audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub subtitle: PathBuf,
    pub log: PathBuf,
}

impl OutputPaths {
    /// `<stem>_readytogo.ass` and `<stem>_translation_log.txt`, next to
    /// `input` unless `output_dir` is given.
    pub fn for_input(input: &Path, output_dir: Option<&Path>) -> Self {
        let stem = input
            .file_stem()
            .map_or_else(|| "subtitle".into(), |s| s.to_string_lossy());
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        Self {
            subtitle: dir.join(format!("{stem}{SUBTITLE_SUFFIX}")),
            log: dir.join(format!("{stem}{LOG_SUFFIX}")),
        }
    }
}

/// Appends translated batches to the output files as the job progresses.
pub struct OutputAssembler {
    paths: OutputPaths,
    subtitle: BufWriter<File>,
    log: BufWriter<File>,
    normalize: bool,
    lines_written: usize,
}

impl OutputAssembler {
    /// Truncates both files and writes the header block followed by a
    /// blank line.
    pub fn create(
        paths: OutputPaths,
        header: &[String],
        normalize: bool,
    ) -> Result<Self, JobError> {
        let subtitle = create_file(&paths.subtitle)?;
        let log = create_file(&paths.log)?;

        let mut assembler = Self {
            paths,
            subtitle,
            log,
            normalize,
            lines_written: 0,
        };

        for line in header {
            assembler.write_subtitle(line)?;
        }
        assembler.write_subtitle("\n")?;
        assembler.flush()?;

        Ok(assembler)
    }

    pub const fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Appends one batch of lines and its audit records, then flushes both
    /// files.
    pub fn append_batch(
        &mut self,
        lines: &[DialogueEntry],
        audit: &[AuditRecord],
    ) -> Result<(), JobError> {
        for line in lines {
            let rendered = if self.normalize {
                line.retimed(&line.end, punctuation::normalize(&line.text))
            } else {
                line.clone()
            };
            self.write_subtitle(&format!("{rendered}\n"))?;
            self.lines_written += 1;
        }

        for record in audit {
            let mut entry = String::with_capacity(record.sentence.len() * 4);
            entry.push_str(&record.sentence);
            entry.push('\n');
            for source in &record.sources {
                entry.push_str(source);
                entry.push('\n');
            }
            entry.push('\n');
            self.write_log(&entry)?;
        }

        self.flush()
    }

    /// Appends a blank line and the original dialogue body, then closes
    /// the files.
    pub fn finish(mut self, body: &[String]) -> Result<OutputPaths, JobError> {
        self.write_subtitle("\n")?;
        for line in body {
            self.write_subtitle(line)?;
        }
        self.flush()?;
        Ok(self.paths)
    }

    fn write_subtitle(&mut self, text: &str) -> Result<(), JobError> {
        self.subtitle
            .write_all(text.as_bytes())
            .map_err(|source| JobError::io(&self.paths.subtitle, source))
    }

    fn write_log(&mut self, text: &str) -> Result<(), JobError> {
        self.log
            .write_all(text.as_bytes())
            .map_err(|source| JobError::io(&self.paths.log, source))
    }

    fn flush(&mut self) -> Result<(), JobError> {
        self.subtitle
            .flush()
            .map_err(|source| JobError::io(&self.paths.subtitle, source))?;
        self.log
            .flush()
            .map_err(|source| JobError::io(&self.paths.log, source))
    }
}

fn create_file(path: &Path) -> Result<BufWriter<File>, JobError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| JobError::io(path, source))
}
