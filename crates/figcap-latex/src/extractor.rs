//! Figure resolution over a parsed LaTeX tree.

use figcap_core::{
    CaptionCandidate, CaptionExtractor, Dialect, DuplicatePolicy, ExtractError, GraphicSet,
    split_extension,
};

use crate::normalize::{decode_latin1, normalize};
use crate::text::latex_to_text;
use crate::tree::{ArgKind, NodeId, TexTree};

/// Environments that scope one figure.
const FIGURE_ENVIRONMENTS: &[&str] = &["figure", "figure*", "wrapfigure", "wrapfigure*"];

/// Default caption substrings marking attribution boilerplate.
pub const DEFAULT_BLOCKLIST: &[&str] = &["\\href", "\\url", "\\email"];

/// Default image extensions a graphic path may carry.
pub const DEFAULT_ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "gif", "png", "pdf", "eps", "ps"];

/// Tunable filters for [`LatexExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatexOptions {
    /// Raw caption substrings that exclude a figure.
    pub blocklist: Vec<String>,
    /// Extensions (without dot) that mark a graphic path as a full filename.
    pub accepted_extensions: Vec<String>,
    /// Treatment of a graphic captioned twice.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for LatexOptions {
    fn default() -> Self {
        Self {
            blocklist: DEFAULT_BLOCKLIST.iter().map(|&s| s.to_owned()).collect(),
            accepted_extensions: DEFAULT_ACCEPTED_EXTENSIONS
                .iter()
                .map(|&s| s.to_owned())
                .collect(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

/// Caption extractor for LaTeX sources.
///
/// # Example
///
/// ```
/// use figcap_core::{CaptionExtractor, GraphicSet};
/// use figcap_latex::LatexExtractor;
///
/// let source = br"\begin{figure}
///   \includegraphics[width=\linewidth]{fig1.png}
///   \caption{A plot of $x^2$.}
/// \end{figure}";
/// let graphics = GraphicSet::new(["fig1.png"]);
///
/// let result = LatexExtractor::default().extract_captions("2101.00001", source, Some(&graphics));
/// assert_eq!(result.get("fig1.png"), Some("A plot of x2."));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LatexExtractor {
    options: LatexOptions,
}

impl LatexExtractor {
    /// Create an extractor with custom filters.
    #[must_use]
    pub fn new(options: LatexOptions) -> Self {
        Self { options }
    }

    /// Active filters.
    #[must_use]
    pub fn options(&self) -> &LatexOptions {
        &self.options
    }

    /// Map a graphic path from the markup onto a kept filename.
    ///
    /// A path with an accepted extension must match exactly; any other path
    /// is an extension-less reference matched by stem.
    fn resolve_graphic(&self, path: &str, graphics: Option<&GraphicSet>) -> Option<String> {
        let Some(graphics) = graphics else {
            return Some(path.to_owned());
        };
        let (_, extension) = split_extension(path);
        let has_image_extension = self
            .options
            .accepted_extensions
            .iter()
            .any(|accepted| accepted == extension);
        if has_image_extension {
            graphics.contains(path).then(|| path.to_owned())
        } else {
            graphics.resolve_stem(path).map(str::to_owned)
        }
    }

    /// Resolve the caption for one `\includegraphics` node.
    fn resolve(
        &self,
        tree: &TexTree,
        graphic: NodeId,
        graphics: Option<&GraphicSet>,
    ) -> Option<CaptionCandidate> {
        let node = tree.node(graphic);
        let path = node
            .args
            .iter()
            .rev()
            .find(|arg| arg.kind == ArgKind::Required)
            .map(|arg| tree.arg_text(arg).trim())?;

        let Some(filename) = self.resolve_graphic(path, graphics) else {
            tracing::debug!(graphic = path, "Graphic not in allow-list");
            return None;
        };

        let Some(figure) = tree.ancestors(graphic).find(|&id| {
            tree.node(id)
                .environment_name()
                .is_some_and(|name| FIGURE_ENVIRONMENTS.contains(&name))
        }) else {
            tracing::debug!(graphic = %filename, "Graphic outside a figure environment");
            return None;
        };

        if tree.commands_named(figure, "includegraphics").nth(1).is_some() {
            tracing::debug!(graphic = %filename, "Composite figure, skipping");
            return None;
        }

        let caption = tree.commands_named(figure, "caption").next()?;
        let Some(raw) = tree
            .node(caption)
            .args
            .iter()
            .rev()
            .find(|arg| arg.kind == ArgKind::Required)
            .map(|arg| tree.arg_text(arg))
        else {
            tracing::debug!(graphic = %filename, "Caption without argument");
            return None;
        };

        if let Some(term) = self
            .options
            .blocklist
            .iter()
            .find(|term| raw.contains(term.as_str()))
        {
            tracing::debug!(graphic = %filename, term = %term, "Caption contains blocklisted term");
            return None;
        }

        Some(CaptionCandidate::new(filename, latex_to_text(raw)))
    }
}

impl CaptionExtractor for LatexExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::Latex
    }

    fn candidates(
        &self,
        body: &[u8],
        graphics: Option<&GraphicSet>,
    ) -> Result<Vec<CaptionCandidate>, ExtractError> {
        let source = normalize(&decode_latin1(body));
        let tree = TexTree::parse(source)?;
        Ok(tree
            .commands_named(tree.root(), "includegraphics")
            .filter_map(|graphic| self.resolve(&tree, graphic, graphics))
            .collect())
    }

    fn duplicate_policy(&self) -> DuplicatePolicy {
        self.options.duplicate_policy
    }
}
