//! Document fan-out: extraction, image normalization and packaging.

use std::collections::HashMap;

use figcap_config::{Config, PipelineConfig};
use figcap_core::{CaptionExtractor, Dialect};
use figcap_jats::{JatsExtractor, JatsOptions};
use figcap_latex::{LatexExtractor, LatexOptions};
use rayon::prelude::*;

use crate::archive::{ArchiveReader, SourceDocument};
use crate::error::{ImageError, PipelineError};
use crate::image::ImageNormalizer;
use crate::packager::OutputPackager;
use crate::stats::RunStats;

/// Drives caption extraction over every document of an archive.
///
/// Documents are processed in parallel on a dedicated rayon pool. Within a
/// document, each markup file is extracted with the dialect picked from its
/// extension (or the forced dialect), and results are merged in file order
/// with later files winning.
#[derive(Debug, Clone)]
pub struct Pipeline {
    latex: LatexExtractor,
    jats: JatsExtractor,
    forced: Option<Dialect>,
    workers: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(LatexExtractor::default(), JatsExtractor::default())
    }
}

impl Pipeline {
    /// Create a pipeline from configured extractors.
    ///
    /// Uses the default worker count of [`PipelineConfig`] until
    /// [`with_workers`](Self::with_workers) is called.
    #[must_use]
    pub fn new(latex: LatexExtractor, jats: JatsExtractor) -> Self {
        let workers = PipelineConfig::default().worker_count();
        Self {
            latex,
            jats,
            forced: None,
            workers,
        }
    }

    /// Build a pipeline from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let extract = &config.extract;
        let latex = LatexExtractor::new(LatexOptions {
            blocklist: extract.blocklist.clone(),
            accepted_extensions: extract.accepted_extensions.clone(),
            duplicate_policy: extract.on_duplicate,
        });
        let jats = JatsExtractor::new(JatsOptions {
            use_allow_list: extract.jats_allow_list,
            duplicate_policy: extract.on_duplicate,
        });

        Self::new(latex, jats)
            .with_forced_dialect(config.input_resolved.dialect.forced())
            .with_workers(config.pipeline.worker_count())
    }

    /// Use one dialect for every markup file regardless of extension.
    #[must_use]
    pub fn with_forced_dialect(mut self, dialect: Option<Dialect>) -> Self {
        self.forced = dialect;
        self
    }

    /// Set the worker thread count (at least 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Worker thread count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Extractor for a dialect.
    #[must_use]
    pub fn extractor(&self, dialect: Dialect) -> &dyn CaptionExtractor {
        match dialect {
            Dialect::Latex => &self.latex,
            Dialect::Jats => &self.jats,
        }
    }

    /// Dialect used for a markup file, `None` when it is not markup.
    fn dialect_for(&self, name: &str) -> Option<Dialect> {
        self.forced.or_else(|| Dialect::for_markup_file(name))
    }

    /// Process every document of `archive` and package accepted pairs.
    ///
    /// Failures local to one document or pair are logged and counted in the
    /// returned statistics; they never stop the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the document list cannot be read, the worker pool
    /// cannot be built, or the run statistics cannot be written.
    pub fn run(
        &self,
        archive: &dyn ArchiveReader,
        images: &dyn ImageNormalizer,
        packager: &dyn OutputPackager,
    ) -> Result<RunStats, PipelineError> {
        let ids = archive.documents()?;
        tracing::info!(documents = ids.len(), workers = self.workers, "Starting run");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let stats = pool.install(|| {
            ids.par_iter()
                .map(|id| self.process_document(id, archive, images, packager))
                .reduce(RunStats::default, RunStats::combine)
        });

        packager.finish(&stats)?;

        tracing::info!(
            documents = stats.documents,
            skipped = stats.documents_skipped,
            failed = stats.documents_failed,
            with_captions = stats.documents_with_captions,
            unparseable = stats.unparseable,
            pairs = stats.pairs_written,
            image_failures = stats.image_failures,
            write_failures = stats.write_failures,
            mean_caption_length = stats.mean_caption_length(),
            "Run finished"
        );
        Ok(stats)
    }

    fn process_document(
        &self,
        id: &str,
        archive: &dyn ArchiveReader,
        images: &dyn ImageNormalizer,
        packager: &dyn OutputPackager,
    ) -> RunStats {
        let mut stats = RunStats::default();

        if packager.is_complete(id) {
            tracing::debug!(document = id, "Already packaged, skipping");
            stats.documents_skipped = 1;
            return stats;
        }

        let document = match archive.load(id) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(document = id, error = %e, "Failed to load document, skipping");
                stats.documents_failed = 1;
                return stats;
            }
        };
        stats.documents = 1;

        if document.graphics.is_empty() {
            tracing::debug!(document = id, "No graphics, skipping");
            return stats;
        }

        let captions = self.associate(&document, &mut stats);

        for graphic in &document.graphics {
            let Some(caption) = captions.get(graphic.as_str()) else {
                continue;
            };
            Self::package_pair(id, graphic, caption, archive, images, packager, &mut stats);
        }

        if stats.pairs_written > 0 {
            stats.documents_with_captions = 1;
        }

        if let Err(e) = packager.complete(id) {
            tracing::warn!(document = id, error = %e, "Failed to mark document complete");
        }
        stats
    }

    /// Map each kept graphic filename to its caption across all markup files.
    fn associate<'a>(
        &self,
        document: &'a SourceDocument,
        stats: &mut RunStats,
    ) -> HashMap<&'a str, String> {
        let graphics = document.graphic_set();
        let mut captions = HashMap::new();

        for file in &document.markup {
            let Some(dialect) = self.dialect_for(&file.name) else {
                continue;
            };
            stats.markup_files += 1;

            let extractor = self.extractor(dialect);
            let result = match extractor.try_extract(&file.body, Some(&graphics)) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(
                        document = %document.id,
                        file = %file.name,
                        %dialect,
                        error = %e,
                        "Failed to parse markup file, skipping"
                    );
                    stats.unparseable += 1;
                    continue;
                }
            };

            for graphic in &document.graphics {
                if let Some(caption) = result.get(&extractor.graphic_key(graphic)) {
                    captions.insert(graphic.as_str(), caption.to_owned());
                }
            }
        }

        captions
    }

    fn package_pair(
        id: &str,
        graphic: &str,
        caption: &str,
        archive: &dyn ArchiveReader,
        images: &dyn ImageNormalizer,
        packager: &dyn OutputPackager,
        stats: &mut RunStats,
    ) {
        let image = archive
            .read_graphic(id, graphic)
            .map_err(|source| ImageError::Read {
                name: graphic.to_owned(),
                source,
            })
            .and_then(|bytes| images.normalize(graphic, bytes));

        let image = match image {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(document = id, graphic, error = %e, "Failed to prepare image, dropping pair");
                stats.image_failures += 1;
                return;
            }
        };

        match packager.write_pair(id, graphic, &image, caption) {
            Ok(()) => stats.record_pair(caption),
            Err(e) => {
                tracing::warn!(document = id, graphic, error = %e, "Failed to write pair");
                stats.write_failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::archive::DirectoryArchive;
    use crate::image::{NormalizedImage, PassthroughImages};
    use crate::packager::{DirectoryPackager, STATS_FILENAME};

    const LATEX_PAPER: &str = r"\documentclass{article}
\begin{document}
\begin{figure}
  \centering
  \includegraphics[width=\linewidth]{figs/plot}
  \caption{A plot of $x^2$.}
\end{figure}
\begin{figure}
  \includegraphics{link.png}
  \caption{Data at \url{http://example.org}}
\end{figure}
\begin{figure}
  \includegraphics{a.png}
  \includegraphics{b.png}
  \caption{Two panels}
\end{figure}
\end{document}
";

    const JATS_PAPER: &str = r#"<?xml version="1.0"?>
<article xmlns:xlink="http://www.w3.org/1999/xlink">
  <body>
    <fig id="f1">
      <caption><p>Cell growth over time.</p></caption>
      <graphic xlink:href="gr1"/>
    </fig>
    <fig id="f2" fig-type="Scheme">
      <caption><p>Synthesis.</p></caption>
      <graphic xlink:href="gr2"/>
    </fig>
  </body>
</article>
"#;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn extensions() -> Vec<String> {
        ["jpg", "png", "pdf"].map(str::to_owned).to_vec()
    }

    fn setup(input: &Path) {
        write(input, "2101.00001/main.tex", LATEX_PAPER.as_bytes());
        write(input, "2101.00001/figs/plot.png", b"PLOT");
        write(input, "2101.00001/link.png", b"LINK");
        write(input, "2101.00001/a.png", b"A");
        write(input, "2101.00001/b.png", b"B");
        write(input, "PMC100/article.nxml", JATS_PAPER.as_bytes());
        write(input, "PMC100/gr1.jpg", b"GR1");
        write(input, "PMC100/gr2.jpg", b"GR2");
        write(input, "empty/readme.tex", b"\\section{Nothing}");
    }

    fn run(input: &Path, output: &Path, images: &dyn ImageNormalizer) -> RunStats {
        let archive = DirectoryArchive::new(input, extensions());
        let packager = DirectoryPackager::new(output, true).unwrap();
        Pipeline::default()
            .with_workers(2)
            .run(&archive, images, &packager)
            .unwrap()
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_run_packages_both_dialects() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        setup(input.path());

        let stats = run(input.path(), output.path(), &PassthroughImages);

        assert_eq!(
            listing(output.path()),
            vec![
                "2101.00001-figs_plot.png",
                "2101.00001-figs_plot.txt",
                "PMC100-gr1.jpg",
                "PMC100-gr1.txt",
                "stats.json",
            ]
        );
        assert_eq!(
            fs::read_to_string(output.path().join("2101.00001-figs_plot.txt")).unwrap(),
            "A plot of x2."
        );
        assert_eq!(
            fs::read_to_string(output.path().join("PMC100-gr1.txt")).unwrap(),
            "Cell growth over time."
        );
        assert_eq!(fs::read(output.path().join("PMC100-gr1.jpg")).unwrap(), b"GR1");

        assert_eq!(stats.documents, 3);
        assert_eq!(stats.documents_with_captions, 2);
        assert_eq!(stats.markup_files, 2);
        assert_eq!(stats.pairs_written, 2);
        assert_eq!(stats.caption_chars, 13 + 22);
        assert!(output.path().join(STATS_FILENAME).is_file());
    }

    #[test]
    fn test_rerun_skips_completed_documents() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        setup(input.path());

        run(input.path(), output.path(), &PassthroughImages);
        let second = run(input.path(), output.path(), &PassthroughImages);

        assert_eq!(second.documents_skipped, 2);
        assert_eq!(second.documents, 1);
        assert_eq!(second.pairs_written, 0);
    }

    struct RejectJpeg;

    impl ImageNormalizer for RejectJpeg {
        fn normalize(&self, name: &str, bytes: Vec<u8>) -> Result<NormalizedImage, ImageError> {
            if name.ends_with(".jpg") {
                return Err(ImageError::Empty(name.to_owned()));
            }
            PassthroughImages.normalize(name, bytes)
        }
    }

    #[test]
    fn test_image_failure_drops_only_that_pair() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        setup(input.path());

        let stats = run(input.path(), output.path(), &RejectJpeg);

        assert_eq!(stats.image_failures, 1);
        assert_eq!(stats.pairs_written, 1);
        assert!(output.path().join("2101.00001-figs_plot.png").is_file());
        assert!(!output.path().join("PMC100-gr1.txt").exists());
    }

    #[test]
    fn test_unparseable_file_counted_and_siblings_kept() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(input.path(), "PMC7/a.nxml", JATS_PAPER.as_bytes());
        write(input.path(), "PMC7/b.nxml", b"<article><fig><caption>");
        write(input.path(), "PMC7/gr1.jpg", b"GR1");

        let stats = run(input.path(), output.path(), &PassthroughImages);

        assert_eq!(stats.markup_files, 2);
        assert_eq!(stats.unparseable, 1);
        assert_eq!(stats.pairs_written, 1);
    }

    #[test]
    fn test_later_markup_file_wins() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            input.path(),
            "2101.1/a.tex",
            br"\begin{figure}\includegraphics{fig.png}\caption{Draft}\end{figure}",
        );
        write(
            input.path(),
            "2101.1/b.tex",
            br"\begin{figure}\includegraphics{fig}\caption{Final}\end{figure}",
        );
        write(input.path(), "2101.1/fig.png", b"F");

        run(input.path(), output.path(), &PassthroughImages);

        assert_eq!(
            fs::read_to_string(output.path().join("2101.1-fig.txt")).unwrap(),
            "Final"
        );
    }

    #[test]
    fn test_same_stem_graphics_keep_their_own_captions() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            input.path(),
            "2101.1/main.tex",
            br"\begin{figure}\includegraphics{figs/a.png}\caption{Cat photo.}\end{figure}
\begin{figure}\includegraphics{other/a.pdf}\caption{Loss curve.}\end{figure}",
        );
        write(input.path(), "2101.1/figs/a.png", b"CAT");
        write(input.path(), "2101.1/other/a.pdf", b"LOSS");

        let stats = run(input.path(), output.path(), &PassthroughImages);

        assert_eq!(stats.pairs_written, 2);
        assert_eq!(
            listing(output.path()),
            vec![
                "2101.1-figs_a.png",
                "2101.1-figs_a.txt",
                "2101.1-other_a.pdf",
                "2101.1-other_a.txt",
                "stats.json",
            ]
        );
        assert_eq!(fs::read(output.path().join("2101.1-figs_a.png")).unwrap(), b"CAT");
        assert_eq!(
            fs::read_to_string(output.path().join("2101.1-figs_a.txt")).unwrap(),
            "Cat photo."
        );
        assert_eq!(fs::read(output.path().join("2101.1-other_a.pdf")).unwrap(), b"LOSS");
        assert_eq!(
            fs::read_to_string(output.path().join("2101.1-other_a.txt")).unwrap(),
            "Loss curve."
        );
    }

    #[test]
    fn test_forced_dialect_overrides_extension() {
        let pipeline = Pipeline::default().with_forced_dialect(Some(Dialect::Jats));
        assert_eq!(pipeline.dialect_for("main.tex"), Some(Dialect::Jats));
        assert_eq!(Pipeline::default().dialect_for("main.tex"), Some(Dialect::Latex));
        assert_eq!(Pipeline::default().dialect_for("fig.png"), None);
        assert_eq!(pipeline.extractor(Dialect::Latex).dialect(), Dialect::Latex);
    }

    #[test]
    fn test_workers_at_least_one() {
        assert_eq!(Pipeline::default().with_workers(0).workers(), 1);
    }

    #[test]
    fn test_default_workers_match_config_default() {
        let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        let workers = Pipeline::default().workers();
        assert_eq!(workers, PipelineConfig::default().worker_count());
        assert_eq!(workers, (cores * 3).div_ceil(2));
    }
}
