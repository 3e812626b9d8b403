//! Markup dialect selection.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Markup dialect of a paper's source.
///
/// The caller picks the dialect from the archive format; extractors never
/// sniff content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// LaTeX sources (arXiv bundles).
    Latex,
    /// JATS XML (PubMed Central bundles).
    Jats,
}

impl Dialect {
    /// Pick the dialect for a markup file by its extension.
    ///
    /// Returns `None` for files that are not markup (images, bibliographies).
    ///
    /// # Example
    ///
    /// ```
    /// use figcap_core::Dialect;
    ///
    /// assert_eq!(Dialect::for_markup_file("paper/main.tex"), Some(Dialect::Latex));
    /// assert_eq!(Dialect::for_markup_file("PMC123.nxml"), Some(Dialect::Jats));
    /// assert_eq!(Dialect::for_markup_file("fig1.png"), None);
    /// ```
    #[must_use]
    pub fn for_markup_file(name: &str) -> Option<Self> {
        let (_, ext) = crate::split_extension(name);
        match ext {
            "tex" => Some(Self::Latex),
            "nxml" | "xml" => Some(Self::Jats),
            _ => None,
        }
    }

    /// Lowercase name used in config files and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latex => "latex",
            Self::Jats => "jats",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown dialect name.
#[derive(Debug, thiserror::Error)]
#[error("unknown dialect: {0} (expected `latex` or `jats`)")]
pub struct UnknownDialect(String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latex" | "tex" => Ok(Self::Latex),
            "jats" | "xml" => Ok(Self::Jats),
            _ => Err(UnknownDialect(s.to_owned())),
        }
    }
}
