//! Allow-list of graphic files kept from a paper bundle.

/// Split a path into the part before the extension and the extension.
///
/// The extension is taken from the last path component only, and a component
/// made of leading dots (`.hidden`) has no extension. The returned extension
/// has no dot; it is empty when there is none.
///
/// # Example
///
/// ```
/// use figcap_core::split_extension;
///
/// assert_eq!(split_extension("figs/plot.v2.png"), ("figs/plot.v2", "png"));
/// assert_eq!(split_extension("figs.d/plot"), ("figs.d/plot", ""));
/// assert_eq!(split_extension(".hidden"), (".hidden", ""));
/// ```
#[must_use]
pub fn split_extension(path: &str) -> (&str, &str) {
    let component_start = path.rfind('/').map_or(0, |i| i + 1);
    let component = &path[component_start..];
    match component.rfind('.') {
        Some(dot) if component[..dot].chars().any(|c| c != '.') => {
            let split = component_start + dot;
            (&path[..split], &path[split + 1..])
        }
        _ => (path, ""),
    }
}

/// Final path component.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

/// Ordered set of graphic filenames confirmed kept by the archive reader.
///
/// A caption is only ever attributed to a name in this list. Order matters:
/// stem lookups return the first matching entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicSet {
    names: Vec<String>,
}

impl GraphicSet {
    /// Create an allow-list from filenames in archive order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact membership, extension included.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// First entry whose path without extension equals `stem`.
    ///
    /// Used for markup references that omit the extension
    /// (`\includegraphics{figs/plot}` matches `figs/plot.pdf`).
    #[must_use]
    pub fn resolve_stem(&self, stem: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|name| split_extension(name).0 == stem)
            .map(String::as_str)
    }

    /// Whether any entry's file name without extension equals `id`.
    ///
    /// Directories are ignored: `bundle/gr1.jpg` matches `gr1`.
    #[must_use]
    pub fn contains_basename_stem(&self, id: &str) -> bool {
        self.names
            .iter()
            .any(|name| split_extension(basename(name)).0 == id)
    }

    /// Iterate over filenames in archive order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of filenames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the allow-list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for GraphicSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("fig1.png"), ("fig1", "png"));
        assert_eq!(split_extension("a/b/fig1.eps"), ("a/b/fig1", "eps"));
        assert_eq!(split_extension("fig1"), ("fig1", ""));
        assert_eq!(split_extension("dir.v1/fig"), ("dir.v1/fig", ""));
        assert_eq!(split_extension("a/..png"), ("a/..png", ""));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", "gz"));
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("a/b/c.jpg"), "c.jpg");
        assert_eq!(basename("c.jpg"), "c.jpg");
    }

    #[test]
    fn test_resolve_stem_first_match_wins() {
        let set = GraphicSet::new(["figs/plot.pdf", "figs/plot.png", "other.png"]);
        assert_eq!(set.resolve_stem("figs/plot"), Some("figs/plot.pdf"));
        assert_eq!(set.resolve_stem("plot"), None);
    }

    #[test]
    fn test_contains_is_exact() {
        let set = GraphicSet::new(["fig1.png"]);
        assert!(set.contains("fig1.png"));
        assert!(!set.contains("fig1"));
        assert!(!set.contains("./fig1.png"));
    }

    #[test]
    fn test_contains_basename_stem() {
        let set: GraphicSet = ["PMC1/gr1.jpg", "PMC1/gr2.jpg"].into_iter().collect();
        assert!(set.contains_basename_stem("gr1"));
        assert!(!set.contains_basename_stem("PMC1/gr1"));
        assert!(!set.contains_basename_stem("gr3"));
        assert_eq!(set.len(), 2);
    }
}
