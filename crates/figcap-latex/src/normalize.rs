//! Source clean-up applied before structural parsing.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

/// Whole lines that define macros. User macros are never expanded, so their
/// definitions (which often hold unbalanced braces) are dropped outright.
static DEFINITION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r".*\\(?:newcommand|renewcommand|providecommand).*\n").unwrap()
});

/// `\caption` followed by whitespace before its brace.
static SPACED_CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\caption\s*\{").unwrap());

/// Decode bytes as ISO-8859-1.
///
/// Every byte maps to the code point of the same value, so decoding never
/// fails; UTF-8 input comes out as mojibake instead of an error.
///
/// # Example
///
/// ```
/// use figcap_latex::decode_latin1;
///
/// assert_eq!(decode_latin1(b"caf\xe9"), "café");
/// ```
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Strip constructs that break structural parsing.
///
/// - lines containing `\newcommand`, `\renewcommand` or `\providecommand`
///   are removed together with their line break
/// - whitespace between `\caption` and its opening brace is removed
///
/// # Example
///
/// ```
/// use figcap_latex::normalize;
///
/// let src = "\\newcommand{\\fig}[1]{\\includegraphics{#1}\n\\caption\n  {Text}";
/// assert_eq!(normalize(src), "\\caption{Text}");
/// ```
#[must_use]
pub fn normalize(source: &str) -> String {
    let without_definitions = DEFINITION_LINE.replace_all(source, "");
    SPACED_CAPTION
        .replace_all(&without_definitions, NoExpand(r"\caption{"))
        .into_owned()
}
