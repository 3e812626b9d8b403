//! JATS XML dialect for figcap.
//!
//! PubMed Central ships articles as JATS XML (`.nxml`). Each `<fig>` element
//! carries its own `<caption>` and `<graphic>`, so association reduces to
//! filtering figures:
//!
//! - `fig-type`, when present, must be `Figure`
//! - a language-tagged figure whose language starts with `en` is dropped
//! - the caption must hold non-blank text
//! - the graphic must carry an `href`, and with an allow-list the href must
//!   match a kept image by stem
//!
//! [`JatsParser`] builds an owned [`XmlNode`] tree with quick-xml;
//! [`JatsExtractor`] applies the filters.

mod extractor;
mod parser;
mod tree;

pub use extractor::{JatsExtractor, JatsOptions};
pub use parser::JatsParser;
pub use tree::XmlNode;
