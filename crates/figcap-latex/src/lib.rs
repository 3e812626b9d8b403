//! LaTeX-source dialect for figcap.
//!
//! A `.tex` body goes through four stages:
//!
//! 1. [`decode_latin1`] and [`normalize`] turn raw bytes into parser-friendly
//!    text (macro definitions dropped, `\caption {` tightened).
//! 2. [`TexTree::parse`] builds an arena tree of environments, commands and
//!    groups, with math, lists and verbatim kept opaque.
//! 3. [`LatexExtractor`] walks every `\includegraphics`, checks it against
//!    the allow-list, rejects composite figures and blocklisted captions.
//! 4. [`latex_to_text`] renders the surviving caption to plain Unicode.
//!
//! # Example
//!
//! ```
//! use figcap_core::{CaptionExtractor, GraphicSet};
//! use figcap_latex::LatexExtractor;
//!
//! let source = br"\begin{figure}
//!   \includegraphics{fig1.png}
//!   \includegraphics{fig1b.png}
//!   \caption{Two panels.}
//! \end{figure}";
//! let graphics = GraphicSet::new(["fig1.png", "fig1b.png"]);
//!
//! let result = LatexExtractor::default().extract_captions("doc", source, Some(&graphics));
//! assert!(result.is_empty());
//! ```

mod extractor;
mod lexer;
mod normalize;
mod symbols;
mod text;
mod tree;

pub use extractor::{DEFAULT_ACCEPTED_EXTENSIONS, DEFAULT_BLOCKLIST, LatexExtractor, LatexOptions};
pub use normalize::{decode_latin1, normalize};
pub use text::{MAX_NESTING, latex_to_text};
pub use tree::{Arg, ArgKind, Descendants, Node, NodeId, NodeKind, TexTree};
