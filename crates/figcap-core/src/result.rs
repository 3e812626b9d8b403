//! Per-document association output.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::sanitize::CaptionSanitizer;

/// Raw caption paired with the graphic it was resolved to.
///
/// Produced by a dialect resolver in document order and consumed once by
/// [`AssociationResult::from_candidates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionCandidate {
    /// Graphic identifier (allow-list filename for LaTeX, href for JATS).
    pub graphic: String,
    /// Caption text before sanitization.
    pub raw_caption: String,
}

impl CaptionCandidate {
    /// Create a candidate.
    pub fn new(graphic: impl Into<String>, raw_caption: impl Into<String>) -> Self {
        Self {
            graphic: graphic.into(),
            raw_caption: raw_caption.into(),
        }
    }
}

/// What to do when two captions resolve to the same graphic in one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DuplicatePolicy {
    /// Later captions overwrite earlier ones.
    #[default]
    #[serde(rename = "last")]
    LastWriteWins,
    /// A graphic captioned more than once is dropped from the result.
    #[serde(rename = "drop")]
    DropDuplicates,
}

/// Mapping from graphic identifier to sanitized caption for one document.
///
/// Every value is non-empty and every key appears once. Keys iterate in
/// sorted order so repeated runs serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AssociationResult {
    captions: BTreeMap<String, String>,
}

impl AssociationResult {
    /// Create an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize candidates in document order and build the mapping.
    ///
    /// Candidates whose caption sanitizes to nothing are discarded before
    /// the duplicate policy is applied, so they never displace an earlier
    /// caption.
    #[must_use]
    pub fn from_candidates(
        candidates: impl IntoIterator<Item = CaptionCandidate>,
        sanitizer: &CaptionSanitizer,
        policy: DuplicatePolicy,
    ) -> Self {
        let mut captions = BTreeMap::new();
        let mut duplicated = HashSet::new();

        for candidate in candidates {
            let Some(caption) = sanitizer.sanitize(&candidate.raw_caption) else {
                tracing::debug!(graphic = %candidate.graphic, "Caption empty after sanitization");
                continue;
            };
            match policy {
                DuplicatePolicy::LastWriteWins => {
                    captions.insert(candidate.graphic, caption);
                }
                DuplicatePolicy::DropDuplicates => {
                    if duplicated.contains(&candidate.graphic) {
                        continue;
                    }
                    if captions.remove(&candidate.graphic).is_some() {
                        tracing::debug!(graphic = %candidate.graphic, "Graphic captioned twice, dropping");
                        duplicated.insert(candidate.graphic);
                    } else {
                        captions.insert(candidate.graphic, caption);
                    }
                }
            }
        }

        Self { captions }
    }

    /// Caption for a graphic identifier.
    #[must_use]
    pub fn get(&self, graphic: &str) -> Option<&str> {
        self.captions.get(graphic).map(String::as_str)
    }

    /// Whether a graphic has a caption.
    #[must_use]
    pub fn contains(&self, graphic: &str) -> bool {
        self.captions.contains_key(graphic)
    }

    /// Fold in another result; its entries overwrite existing ones.
    ///
    /// Used to combine the results of several markup files of one paper.
    pub fn merge(&mut self, other: Self) {
        self.captions.extend(other.captions);
    }

    /// Iterate over `(graphic, caption)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.captions
            .iter()
            .map(|(graphic, caption)| (graphic.as_str(), caption.as_str()))
    }

    /// Number of captioned graphics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captions.len()
    }

    /// Whether no graphic was captioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }
}

impl IntoIterator for AssociationResult {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.captions.into_iter()
    }
}
