//! Error types for caption extraction.
//!
//! None of these cross [`CaptionExtractor::extract_captions`](crate::CaptionExtractor::extract_captions):
//! a document that fails to parse degrades to an empty result.

/// LaTeX structural parse failure.
///
/// Offsets are byte positions into the normalized source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TexParseError {
    /// A `{` group or required argument was never closed.
    #[error("unclosed group opened at byte {offset}")]
    UnclosedGroup {
        /// Position of the opening brace.
        offset: usize,
    },

    /// A `\begin{name}` was never matched by `\end{name}`.
    #[error("environment `{name}` opened at byte {offset} is never closed")]
    UnclosedEnvironment {
        /// Environment name.
        name: String,
        /// Position of the `\begin`.
        offset: usize,
    },

    /// Inline or display math was never terminated.
    #[error("unterminated math opened at byte {offset}")]
    UnterminatedMath {
        /// Position of the math delimiter.
        offset: usize,
    },

    /// `\begin` without a braced environment name.
    #[error("\\begin without environment name at byte {offset}")]
    MissingEnvironmentName {
        /// Position of the `\begin`.
        offset: usize,
    },
}

/// Error from a dialect's structural parse.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// LaTeX source could not be parsed into a tree.
    #[error("LaTeX parse error: {0}")]
    Latex(#[from] TexParseError),

    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Encoding error during XML parsing.
    #[error("XML encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}
