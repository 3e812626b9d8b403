//! The capability each document dialect implements.

use crate::dialect::Dialect;
use crate::error::ExtractError;
use crate::graphics::GraphicSet;
use crate::result::{AssociationResult, CaptionCandidate, DuplicatePolicy};
use crate::sanitize::CaptionSanitizer;

/// Associates the graphics of one document with their captions.
///
/// Implementations are stateless across calls: one call processes one
/// document, never mutates its inputs, and keeps no state for the next call.
/// That makes an extractor safe to share between worker threads.
///
/// Implementors provide [`candidates`](Self::candidates); the provided
/// methods apply the shared sanitization stage and the failure policy.
pub trait CaptionExtractor: Send + Sync {
    /// Dialect handled by this extractor.
    fn dialect(&self) -> Dialect;

    /// Parse `body` and resolve raw caption candidates in document order.
    ///
    /// `graphics` is the allow-list of kept graphic files. `None` means the
    /// caller has no list and every resolvable graphic is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error only when the document cannot be parsed at all.
    /// Figures that cannot be captioned are skipped, not reported.
    fn candidates(
        &self,
        body: &[u8],
        graphics: Option<&GraphicSet>,
    ) -> Result<Vec<CaptionCandidate>, ExtractError>;

    /// Key under which a kept graphic file's caption is stored.
    ///
    /// Defaults to the filename itself.
    fn graphic_key(&self, filename: &str) -> String {
        filename.to_owned()
    }

    /// How to treat a graphic captioned twice in one document.
    fn duplicate_policy(&self) -> DuplicatePolicy {
        DuplicatePolicy::default()
    }

    /// Resolve and sanitize captions, surfacing parse failures.
    fn try_extract(
        &self,
        body: &[u8],
        graphics: Option<&GraphicSet>,
    ) -> Result<AssociationResult, ExtractError> {
        let candidates = self.candidates(body, graphics)?;
        Ok(AssociationResult::from_candidates(
            candidates,
            &CaptionSanitizer::new(),
            self.duplicate_policy(),
        ))
    }

    /// Resolve and sanitize captions for one document.
    ///
    /// A document that cannot be parsed is logged with `document_id` and
    /// yields an empty result; this never fails.
    fn extract_captions(
        &self,
        document_id: &str,
        body: &[u8],
        graphics: Option<&GraphicSet>,
    ) -> AssociationResult {
        match self.try_extract(body, graphics) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    document = document_id,
                    dialect = %self.dialect(),
                    error = %e,
                    "Failed to parse document, skipping"
                );
                AssociationResult::new()
            }
        }
    }
}
