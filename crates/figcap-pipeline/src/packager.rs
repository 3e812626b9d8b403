//! Output packaging: the packager contract and a directory-backed packager.

use std::fs;
use std::path::{Path, PathBuf};

use figcap_core::split_extension;
use serde::Serialize;

use crate::error::PipelineError;
use crate::image::NormalizedImage;
use crate::stats::RunStats;

/// Run statistics file written by [`DirectoryPackager::finish`].
pub const STATS_FILENAME: &str = "stats.json";

/// Directory holding per-document completion markers.
const DONE_DIR: &str = ".done";

/// Receives accepted pairs and writes them to an output container.
///
/// Calls for different documents may arrive concurrently from worker threads.
pub trait OutputPackager: Sync {
    /// Whether `doc_id` was fully packaged by an earlier run.
    fn is_complete(&self, doc_id: &str) -> bool;

    /// Write one image and its caption.
    fn write_pair(
        &self,
        doc_id: &str,
        graphic: &str,
        image: &NormalizedImage,
        caption: &str,
    ) -> Result<(), PipelineError>;

    /// Record that every pair of `doc_id` was handed over.
    fn complete(&self, doc_id: &str) -> Result<(), PipelineError>;

    /// Write run-level statistics after the last document.
    fn finish(&self, stats: &RunStats) -> Result<(), PipelineError>;
}

/// Writes pairs as co-named files in one flat directory.
///
/// ```text
/// {dir}/
/// +-- 2101.00001-figs_plot.png   # image
/// +-- 2101.00001-figs_plot.txt   # caption, UTF-8, no trailing newline
/// +-- stats.json                 # run statistics
/// +-- .done/
///     +-- 2101.00001             # completion marker
/// ```
///
/// The pair name is the document id and the graphic's paper-relative path
/// without its extension, with `/` replaced by `_`. Graphics sharing a stem
/// in different directories get distinct pairs.
#[derive(Debug, Clone)]
pub struct DirectoryPackager {
    dir: PathBuf,
    skip_existing: bool,
}

/// Serialized form of `stats.json`.
#[derive(Serialize)]
struct StatsReport<'a> {
    #[serde(flatten)]
    stats: &'a RunStats,
    mean_caption_length: f64,
}

impl DirectoryPackager {
    /// Create a packager writing into `dir`, which is created if missing.
    ///
    /// With `skip_existing`, documents carrying a completion marker are
    /// reported complete and not processed again.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>, skip_existing: bool) -> Result<Self, PipelineError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        Ok(Self { dir, skip_existing })
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File stem shared by the image and caption of a pair.
    fn pair_stem(doc_id: &str, graphic: &str) -> String {
        let path = graphic.trim_start_matches("./").trim_start_matches('/');
        let (stem, _) = split_extension(path);
        format!("{doc_id}-{}", stem.replace(['/', '\\'], "_"))
    }

    fn marker_path(&self, doc_id: &str) -> PathBuf {
        self.dir.join(DONE_DIR).join(doc_id)
    }
}

impl OutputPackager for DirectoryPackager {
    fn is_complete(&self, doc_id: &str) -> bool {
        self.skip_existing && self.marker_path(doc_id).is_file()
    }

    fn write_pair(
        &self,
        doc_id: &str,
        graphic: &str,
        image: &NormalizedImage,
        caption: &str,
    ) -> Result<(), PipelineError> {
        let stem = Self::pair_stem(doc_id, graphic);

        let image_path = self.dir.join(format!("{stem}.{}", image.extension));
        fs::write(&image_path, &image.bytes).map_err(|e| PipelineError::io(&image_path, e))?;

        let caption_path = self.dir.join(format!("{stem}.txt"));
        fs::write(&caption_path, caption).map_err(|e| PipelineError::io(&caption_path, e))?;

        tracing::debug!(document = doc_id, graphic, pair = %stem, "Wrote pair");
        Ok(())
    }

    fn complete(&self, doc_id: &str) -> Result<(), PipelineError> {
        let marker = self.marker_path(doc_id);
        if let Some(parent) = marker.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::write(&marker, b"").map_err(|e| PipelineError::io(&marker, e))
    }

    fn finish(&self, stats: &RunStats) -> Result<(), PipelineError> {
        let report = StatsReport {
            stats,
            mean_caption_length: stats.mean_caption_length(),
        };
        let json = serde_json::to_string_pretty(&report)?;
        let path = self.dir.join(STATS_FILENAME);
        fs::write(&path, json).map_err(|e| PipelineError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn image(extension: &str) -> NormalizedImage {
        NormalizedImage {
            bytes: b"IMG".to_vec(),
            extension: extension.to_owned(),
        }
    }

    #[test]
    fn test_write_pair_names_files_after_document_and_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let packager = DirectoryPackager::new(temp_dir.path(), true).unwrap();

        packager
            .write_pair("2101.00001", "figs/plot.v2.png", &image("png"), "A plot.")
            .unwrap();
        packager
            .write_pair("2101.00001", "./top.png", &image("png"), "Top.")
            .unwrap();

        let root = temp_dir.path();
        assert_eq!(fs::read(root.join("2101.00001-figs_plot.v2.png")).unwrap(), b"IMG");
        assert_eq!(
            fs::read_to_string(root.join("2101.00001-figs_plot.v2.txt")).unwrap(),
            "A plot."
        );
        assert_eq!(
            fs::read_to_string(root.join("2101.00001-top.txt")).unwrap(),
            "Top."
        );
    }

    #[test]
    fn test_same_stem_in_different_directories_kept_apart() {
        let temp_dir = tempfile::tempdir().unwrap();
        let packager = DirectoryPackager::new(temp_dir.path(), true).unwrap();

        packager
            .write_pair("2101.1", "figs/a.png", &image("png"), "Cat photo.")
            .unwrap();
        packager
            .write_pair("2101.1", "other/a.pdf", &image("pdf"), "Loss curve.")
            .unwrap();

        let root = temp_dir.path();
        assert_eq!(
            fs::read_to_string(root.join("2101.1-figs_a.txt")).unwrap(),
            "Cat photo."
        );
        assert_eq!(
            fs::read_to_string(root.join("2101.1-other_a.txt")).unwrap(),
            "Loss curve."
        );
        assert!(root.join("2101.1-figs_a.png").is_file());
        assert!(root.join("2101.1-other_a.pdf").is_file());
    }

    #[test]
    fn test_new_creates_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("nested/out");
        let packager = DirectoryPackager::new(&out, false).unwrap();
        assert!(out.is_dir());
        assert_eq!(packager.dir(), out.as_path());
    }

    #[test]
    fn test_completion_marker() {
        let temp_dir = tempfile::tempdir().unwrap();
        let packager = DirectoryPackager::new(temp_dir.path(), true).unwrap();

        assert!(!packager.is_complete("PMC1"));
        packager.complete("PMC1").unwrap();
        assert!(packager.is_complete("PMC1"));
        assert!(!packager.is_complete("PMC2"));
    }

    #[test]
    fn test_completion_ignored_without_skip_existing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let packager = DirectoryPackager::new(temp_dir.path(), false).unwrap();

        packager.complete("PMC1").unwrap();
        assert!(!packager.is_complete("PMC1"));
    }

    #[test]
    fn test_finish_writes_stats() {
        let temp_dir = tempfile::tempdir().unwrap();
        let packager = DirectoryPackager::new(temp_dir.path(), true).unwrap();
        let stats = RunStats {
            documents: 2,
            pairs_written: 4,
            caption_chars: 10,
            ..RunStats::default()
        };

        packager.finish(&stats).unwrap();

        let json = fs::read_to_string(temp_dir.path().join(STATS_FILENAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["documents"], 2);
        assert_eq!(value["pairs_written"], 4);
        assert_eq!(value["mean_caption_length"], 2.5);
    }
}
