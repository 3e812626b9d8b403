//! Caption-figure association contract for figcap.
//!
//! Both document dialects (LaTeX sources and JATS XML) reduce to the same
//! operation: given a markup body and the list of graphic files kept from the
//! paper bundle, produce a mapping from graphic identifier to cleaned caption.
//! This crate holds the pieces that are dialect independent:
//!
//! - [`CaptionExtractor`]: the capability each dialect implements
//! - [`GraphicSet`]: the allow-list of kept graphics and its stem matching rules
//! - [`CaptionSanitizer`]: the shared final text-cleaning stage
//! - [`AssociationResult`]: the per-document output mapping
//!
//! # Example
//!
//! ```
//! use figcap_core::{AssociationResult, CaptionCandidate, CaptionSanitizer, DuplicatePolicy};
//!
//! let candidates = vec![CaptionCandidate::new("fig1.png", "  A  plot\n of x. ")];
//! let result = AssociationResult::from_candidates(
//!     candidates,
//!     &CaptionSanitizer::new(),
//!     DuplicatePolicy::default(),
//! );
//! assert_eq!(result.get("fig1.png"), Some("A plot of x."));
//! ```

mod dialect;
mod error;
mod extractor;
mod graphics;
mod result;
mod sanitize;

pub use dialect::{Dialect, UnknownDialect};
pub use error::{ExtractError, TexParseError};
pub use extractor::CaptionExtractor;
pub use graphics::{GraphicSet, basename, split_extension};
pub use result::{AssociationResult, CaptionCandidate, DuplicatePolicy};
pub use sanitize::CaptionSanitizer;
