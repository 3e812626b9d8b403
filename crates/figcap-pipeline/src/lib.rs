//! Batch driver for figcap.
//!
//! Walks an archive of paper sources, runs the caption extractor matching
//! each markup file, and hands every accepted `(image, caption)` pair to an
//! output packager. The three collaborators are traits so that archive
//! formats, image processing and output containers can be swapped:
//!
//! - [`ArchiveReader`]: lists papers and loads their markup and graphics
//! - [`ImageNormalizer`]: turns a kept graphic into the output image
//! - [`OutputPackager`]: writes pairs and run statistics
//!
//! The directory-backed implementations ([`DirectoryArchive`],
//! [`PassthroughImages`], [`DirectoryPackager`]) cover unpacked bundles on
//! local disk.
//!
//! # Example
//!
//! ```no_run
//! use figcap_pipeline::{DirectoryArchive, DirectoryPackager, PassthroughImages, Pipeline};
//!
//! let archive = DirectoryArchive::new("data/src", vec!["png".to_owned(), "pdf".to_owned()]);
//! let packager = DirectoryPackager::new("data/out", true)?;
//! let stats = Pipeline::default().run(&archive, &PassthroughImages, &packager)?;
//! println!("{} pairs", stats.pairs_written);
//! # Ok::<(), figcap_pipeline::PipelineError>(())
//! ```

mod archive;
mod error;
mod image;
mod packager;
mod pipeline;
mod stats;

pub use archive::{ArchiveReader, DirectoryArchive, MarkupFile, SourceDocument};
pub use error::{ImageError, PipelineError};
pub use image::{ImageNormalizer, NormalizedImage, PassthroughImages};
pub use packager::{DirectoryPackager, OutputPackager, STATS_FILENAME};
pub use pipeline::Pipeline;
pub use stats::{CaptionLengthStats, RunStats, caption_length_stats};
