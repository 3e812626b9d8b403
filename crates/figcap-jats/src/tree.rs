//! Owned element tree for JATS documents.

/// Element in a parsed XML document.
///
/// Text follows the ElementTree layout: `text` is the character data before
/// the first child, and each child's `tail` is the data that follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Qualified tag name as written (`fig`, `mml:math`).
    pub tag: String,
    /// Character data before the first child.
    pub text: String,
    /// Character data after this element's end tag.
    pub tail: String,
    /// Attributes in document order, names as written (`xlink:href`).
    pub attrs: Vec<(String, String)>,
    /// Child elements.
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set tail content.
    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<XmlNode>) -> Self {
        self.children = children;
        self
    }

    /// Attribute value by exact name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First attribute whose name ends with `suffix`, as `(name, value)`.
    ///
    /// Matches namespaced names regardless of prefix (`xlink:href`,
    /// `xml:lang`).
    #[must_use]
    pub fn attr_ending_with(&self, suffix: &str) -> Option<(&str, &str)> {
        self.attrs
            .iter()
            .find(|(key, _)| key.ends_with(suffix))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// First direct child with the given tag.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Elements with the given tag at any depth below this one, in document
    /// order.
    pub fn descendants_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        let mut stack: Vec<&XmlNode> = self.children.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
        .filter(move |node| node.tag == tag)
    }

    /// All character data inside this element in document order, excluding
    /// its own tail.
    #[must_use]
    pub fn inner_text(&self) -> String {
        enum Step<'a> {
            Enter(&'a XmlNode),
            Tail(&'a str),
        }

        let mut out = String::new();
        let mut stack = vec![Step::Enter(self)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(node) => {
                    out.push_str(&node.text);
                    for child in node.children.iter().rev() {
                        stack.push(Step::Tail(&child.tail));
                        stack.push(Step::Enter(child));
                    }
                }
                Step::Tail(tail) => out.push_str(tail),
            }
        }
        out
    }
}
