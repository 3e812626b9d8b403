//! `<fig>` resolution over a JATS tree.

use figcap_core::{
    CaptionCandidate, CaptionExtractor, Dialect, DuplicatePolicy, ExtractError, GraphicSet,
    basename, split_extension,
};

use crate::parser::JatsParser;
use crate::tree::XmlNode;

/// `fig-type` value of plain figures.
const FIGURE_TYPE: &str = "Figure";

/// Tunable behavior for [`JatsExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JatsOptions {
    /// Require the graphic href to name a kept image (compared by stem).
    pub use_allow_list: bool,
    /// Treatment of a graphic captioned twice.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for JatsOptions {
    fn default() -> Self {
        Self {
            use_allow_list: true,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Caption extractor for JATS (PubMed Central) XML.
///
/// Results are keyed by the graphic's `href`, which PMC uses as the stem of
/// the figure image file.
///
/// # Example
///
/// ```
/// use figcap_core::{CaptionExtractor, GraphicSet};
/// use figcap_jats::JatsExtractor;
///
/// let xml = br#"<article xmlns:xlink="http://www.w3.org/1999/xlink"><body>
///   <fig id="F1"><caption><p>Growth curve.</p></caption>
///     <graphic xlink:href="pone.0001.g001"/></fig>
/// </body></article>"#;
/// let graphics = GraphicSet::new(["PMC1/pone.0001.g001.jpg"]);
///
/// let extractor = JatsExtractor::default();
/// let result = extractor.extract_captions("PMC1", xml, Some(&graphics));
/// assert_eq!(result.get("pone.0001.g001"), Some("Growth curve."));
/// assert_eq!(extractor.graphic_key("PMC1/pone.0001.g001.jpg"), "pone.0001.g001");
/// ```
#[derive(Debug, Clone, Default)]
pub struct JatsExtractor {
    options: JatsOptions,
    parser: JatsParser,
}

impl JatsExtractor {
    /// Create an extractor with custom options.
    #[must_use]
    pub fn new(options: JatsOptions) -> Self {
        Self {
            options,
            parser: JatsParser::new(),
        }
    }

    /// Active options.
    #[must_use]
    pub fn options(&self) -> JatsOptions {
        self.options
    }

    /// Resolve one `<fig>` to `(href, raw caption)`.
    fn resolve(fig: &XmlNode) -> Option<(String, String)> {
        let id = fig.attr("id").unwrap_or_default();

        if let Some(kind) = fig.attr("fig-type")
            && kind != FIGURE_TYPE
        {
            tracing::debug!(figure = id, fig_type = kind, "Not a plain figure");
            return None;
        }

        // English-tagged figures are rejected and untagged ones pass.
        if let Some((_, lang)) = fig.attr_ending_with("lang")
            && lang.to_lowercase().starts_with("en")
        {
            tracing::debug!(figure = id, lang, "Figure filtered by language");
            return None;
        }

        let Some(caption) = fig.child("caption") else {
            tracing::debug!(figure = id, "Figure without caption");
            return None;
        };
        let text = caption.inner_text();
        if text.trim().is_empty() {
            tracing::debug!(figure = id, "Figure caption is blank");
            return None;
        }

        let Some((_, href)) = fig
            .child("graphic")
            .and_then(|graphic| graphic.attr_ending_with("href"))
        else {
            tracing::debug!(figure = id, "Figure without graphic reference");
            return None;
        };

        Some((href.to_owned(), text))
    }
}

impl CaptionExtractor for JatsExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Jats
    }

    fn candidates(
        &self,
        body: &[u8],
        graphics: Option<&GraphicSet>,
    ) -> Result<Vec<CaptionCandidate>, ExtractError> {
        let document = self.parser.parse(body)?;
        let allow_list = graphics.filter(|_| self.options.use_allow_list);

        Ok(document
            .descendants_named("fig")
            .filter_map(Self::resolve)
            .filter(|(href, _)| {
                let kept = allow_list.is_none_or(|graphics| graphics.contains_basename_stem(href));
                if !kept {
                    tracing::debug!(graphic = %href, "Graphic not in allow-list");
                }
                kept
            })
            .map(|(href, caption)| CaptionCandidate::new(href, caption))
            .collect())
    }

    /// Kept image files are named after the href, so the key is the file's
    /// basename without extension.
    fn graphic_key(&self, filename: &str) -> String {
        split_extension(basename(filename)).0.to_owned()
    }

    fn duplicate_policy(&self) -> DuplicatePolicy {
        self.options.duplicate_policy
    }
}
