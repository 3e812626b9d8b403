//! Shared caption cleaning stage.

/// Final text-cleaning policy applied to every caption, whatever its dialect.
///
/// Collapses every whitespace run (newlines, tabs, non-breaking spaces) to a
/// single space and trims. Captions that end up empty are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptionSanitizer;

impl CaptionSanitizer {
    /// Create the sanitizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw caption, or `None` if nothing but whitespace remains.
    ///
    /// # Example
    ///
    /// ```
    /// use figcap_core::CaptionSanitizer;
    ///
    /// let sanitizer = CaptionSanitizer::new();
    /// assert_eq!(sanitizer.sanitize(" A\tplot\n\nof x. ").as_deref(), Some("A plot of x."));
    /// assert_eq!(sanitizer.sanitize(" \n\t "), None);
    /// ```
    #[must_use]
    pub fn sanitize(&self, raw: &str) -> Option<String> {
        let collapsed = collapse_whitespace(raw);
        (!collapsed.is_empty()).then_some(collapsed)
    }
}

/// Join whitespace-separated words with single spaces.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
