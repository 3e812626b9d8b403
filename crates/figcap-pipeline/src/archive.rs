//! Paper sources: the archive reader contract and a directory-backed reader.

use std::fs;
use std::path::{Path, PathBuf};

use figcap_core::{Dialect, GraphicSet, split_extension};

use crate::error::PipelineError;

/// One markup file of a paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupFile {
    /// Path relative to the paper root, `/`-separated.
    pub name: String,
    /// Raw bytes; decoding is the dialect's concern.
    pub body: Vec<u8>,
}

/// Everything the engine needs about one paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Paper identifier (arXiv id, PMC id).
    pub id: String,
    /// Markup files in name order.
    pub markup: Vec<MarkupFile>,
    /// Kept graphic filenames, relative to the paper root, in archive order.
    pub graphics: Vec<String>,
}

impl SourceDocument {
    /// Allow-list built from the kept graphics.
    #[must_use]
    pub fn graphic_set(&self) -> GraphicSet {
        GraphicSet::new(self.graphics.iter().map(String::as_str))
    }
}

/// Supplier of paper sources.
///
/// Implementations must be shareable across worker threads; each call
/// reads independently.
pub trait ArchiveReader: Sync {
    /// Identifiers of all papers, in processing order.
    fn documents(&self) -> Result<Vec<String>, PipelineError>;

    /// Load markup and the graphic allow-list of one paper.
    fn load(&self, id: &str) -> Result<SourceDocument, PipelineError>;

    /// Read the bytes of one kept graphic.
    fn read_graphic(&self, id: &str, name: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Archive laid out as one directory per paper.
///
/// ```text
/// input/
///   2101.00001/
///     main.tex
///     figs/plot.pdf
///   PMC7000001/
///     article.nxml
///     pone.0001.g001.jpg
/// ```
///
/// Hidden files and directories are ignored at every level. Markup files are
/// recognized by extension (`.tex`, `.nxml`, `.xml`); graphics by the
/// configured image extensions.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
    accepted_extensions: Vec<String>,
}

impl DirectoryArchive {
    /// Create a reader over `root` keeping graphics with the given extensions
    /// (without dot, case-sensitive).
    pub fn new(root: impl Into<PathBuf>, accepted_extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            accepted_extensions,
        }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn paper_dir(&self, id: &str) -> Result<PathBuf, PipelineError> {
        let dir = self.root.join(id);
        if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) || !dir.is_dir() {
            return Err(PipelineError::DocumentNotFound(id.to_owned()));
        }
        Ok(dir)
    }

    fn is_graphic(&self, name: &str) -> bool {
        let (_, extension) = split_extension(name);
        self.accepted_extensions.iter().any(|e| e == extension)
    }

    /// Collect files below `dir` as `(relative name, path)` pairs.
    fn walk(dir: &Path, prefix: &str, files: &mut Vec<(String, PathBuf)>) -> Result<(), PipelineError> {
        let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                Self::walk(&path, &relative, files)?;
            } else {
                files.push((relative, path));
            }
        }
        Ok(())
    }
}

impl ArchiveReader for DirectoryArchive {
    fn documents(&self) -> Result<Vec<String>, PipelineError> {
        let entries = fs::read_dir(&self.root).map_err(|e| PipelineError::io(&self.root, e))?;

        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn load(&self, id: &str) -> Result<SourceDocument, PipelineError> {
        let dir = self.paper_dir(id)?;
        let mut files = Vec::new();
        Self::walk(&dir, "", &mut files)?;
        files.sort();

        let mut markup = Vec::new();
        let mut graphics = Vec::new();
        for (name, path) in files {
            if Dialect::for_markup_file(&name).is_some() {
                let body = fs::read(&path).map_err(|e| PipelineError::io(&path, e))?;
                markup.push(MarkupFile { name, body });
            } else if self.is_graphic(&name) {
                graphics.push(name);
            }
        }

        Ok(SourceDocument {
            id: id.to_owned(),
            markup,
            graphics,
        })
    }

    fn read_graphic(&self, id: &str, name: &str) -> Result<Vec<u8>, PipelineError> {
        let path = self.paper_dir(id)?.join(name);
        fs::read(&path).map_err(|e| PipelineError::io(path, e))
    }
}
