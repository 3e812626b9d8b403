//! Run statistics and caption-length reporting.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::PipelineError;

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Papers loaded from the archive.
    pub documents: u64,
    /// Papers skipped because their output already exists.
    pub documents_skipped: u64,
    /// Papers that could not be loaded.
    pub documents_failed: u64,
    /// Papers that produced at least one pair.
    pub documents_with_captions: u64,
    /// Markup files handed to an extractor.
    pub markup_files: u64,
    /// Markup files that failed to parse.
    pub unparseable: u64,
    /// Image/caption pairs written.
    pub pairs_written: u64,
    /// Pairs dropped because the image could not be read or normalized.
    pub image_failures: u64,
    /// Pairs dropped because writing them failed.
    pub write_failures: u64,
    /// Sum of written caption lengths in characters.
    pub caption_chars: u64,
}

impl RunStats {
    /// Combine counters from two partial runs.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            documents: self.documents + other.documents,
            documents_skipped: self.documents_skipped + other.documents_skipped,
            documents_failed: self.documents_failed + other.documents_failed,
            documents_with_captions: self.documents_with_captions + other.documents_with_captions,
            markup_files: self.markup_files + other.markup_files,
            unparseable: self.unparseable + other.unparseable,
            pairs_written: self.pairs_written + other.pairs_written,
            image_failures: self.image_failures + other.image_failures,
            write_failures: self.write_failures + other.write_failures,
            caption_chars: self.caption_chars + other.caption_chars,
        }
    }

    /// Mean caption length in characters over written pairs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_caption_length(&self) -> f64 {
        if self.pairs_written == 0 {
            return 0.0;
        }
        self.caption_chars as f64 / self.pairs_written as f64
    }

    /// Record one written caption.
    pub(crate) fn record_pair(&mut self, caption: &str) {
        self.pairs_written += 1;
        self.caption_chars += caption.chars().count() as u64;
    }
}

/// Caption files found in an output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CaptionLengthStats {
    /// Number of `.txt` caption files.
    pub files: u64,
    /// Total characters across them.
    pub total_chars: u64,
}

impl CaptionLengthStats {
    /// Mean caption length in characters, 0 when there are no files.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.files == 0 {
            return 0.0;
        }
        self.total_chars as f64 / self.files as f64
    }
}

/// Measure the `.txt` caption files below `dir`, skipping hidden entries.
pub fn caption_length_stats(dir: &Path) -> Result<CaptionLengthStats, PipelineError> {
    let mut stats = CaptionLengthStats::default();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|e| PipelineError::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(&current, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                pending.push(path);
            } else if path.extension().is_some_and(|e| e == "txt") {
                let text = fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))?;
                stats.files += 1;
                stats.total_chars += text.chars().count() as u64;
            }
        }
    }

    Ok(stats)
}
