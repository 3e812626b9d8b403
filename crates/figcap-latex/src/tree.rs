//! Structural tree over LaTeX source.
//!
//! The tree is an arena: nodes live in one `Vec` and refer to each other by
//! [`NodeId`]. Each node owns the ordered list of its children; the parent
//! link is a plain index used only to walk upwards. A tree is built for one
//! document and dropped once captions are resolved.

use std::ops::Range;

use figcap_core::TexParseError;

use crate::lexer::{Lexer, Token, TokenKind};

/// Environments whose content is kept as an opaque leaf.
///
/// Math and list bodies never hold captions, and their braces and brackets
/// routinely confuse a scanner that expects balanced TeX.
const OPAQUE_ENVIRONMENTS: &[&str] = &[
    "align",
    "align*",
    "alignat",
    "alignat*",
    "array",
    "displaymath",
    "eqnarray",
    "eqnarray*",
    "equation",
    "equation*",
    "flalign",
    "flalign*",
    "gather",
    "gather*",
    "math",
    "multline",
    "multline*",
    "split",
    "itemize",
    "enumerate",
    "description",
    "verbatim",
    "verbatim*",
    "lstlisting",
    "minted",
    "comment",
];

/// Index of a node in a [`TexTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Whole document.
    Root,
    /// `\begin{name}` ... `\end{name}`.
    Environment(String),
    /// Control sequence with its arguments (`\caption[short]{long}`).
    Command(String),
    /// Brace group that is not a command argument.
    Group,
    /// Inline or display math, kept opaque.
    Math,
    /// Plain text.
    Text,
}

/// Whether an argument was written in brackets or braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// `{...}`
    Required,
    /// `[...]`
    Optional,
}

/// Command or environment argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    /// Bracket style.
    pub kind: ArgKind,
    /// Byte range of the content between the delimiters.
    pub content: Range<usize>,
}

/// One parsed construct.
#[derive(Debug, Clone)]
pub struct Node {
    /// Construct kind.
    pub kind: NodeKind,
    /// Enclosing node; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Children in document order. For commands these are the parsed
    /// contents of all arguments.
    pub children: Vec<NodeId>,
    /// Arguments in source order (commands and environments only).
    pub args: Vec<Arg>,
    /// Byte range covered in the source.
    pub span: Range<usize>,
}

impl Node {
    /// Command name, if this is a command.
    #[must_use]
    pub fn command_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Command(name) => Some(name),
            _ => None,
        }
    }

    /// Environment name, if this is an environment.
    #[must_use]
    pub fn environment_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Environment(name) => Some(name),
            _ => None,
        }
    }
}

/// Parsed LaTeX document.
#[derive(Debug)]
pub struct TexTree {
    source: String,
    nodes: Vec<Node>,
}

impl TexTree {
    /// Parse LaTeX source into a tree.
    ///
    /// # Errors
    ///
    /// Returns an error when a group, argument, environment or math span is
    /// still open at the end of the input. Stray closing braces and stray
    /// `\end{...}` are tolerated.
    pub fn parse(source: impl Into<String>) -> Result<Self, TexParseError> {
        let source = source.into();
        let nodes = Parser::new(&source).run()?;
        Ok(Self { source, nodes })
    }

    /// Root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Source text the tree was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Raw content of an argument, without its delimiters.
    #[must_use]
    pub fn arg_text(&self, arg: &Arg) -> &str {
        &self.source[arg.content.clone()]
    }

    /// Raw source covered by a node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        &self.source[self.node(id).span.clone()]
    }

    /// Enclosing nodes from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, |&current| self.node(current).parent)
    }

    /// All nodes below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.node(id).children.clone();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Commands named `name` below `id`, in document order.
    pub fn commands_named<'t>(
        &'t self,
        id: NodeId,
        name: &'t str,
    ) -> impl Iterator<Item = NodeId> + 't {
        self.descendants(id)
            .filter(move |&child| self.node(child).command_name() == Some(name))
    }
}

/// Pre-order walk over a subtree.
pub struct Descendants<'t> {
    tree: &'t TexTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

/// What closes an open frame.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Closer {
    Group,
    Arg(ArgKind),
    Environment(String),
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    closer: Closer,
    opened_at: usize,
    content_start: usize,
}

/// Node that may still receive arguments if the next token starts at `at`.
#[derive(Debug, Clone, Copy)]
struct Pending {
    node: NodeId,
    at: usize,
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    nodes: Vec<Node>,
    stack: Vec<Frame>,
    pending: Option<Pending>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        let root = Node {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
            args: Vec::new(),
            span: 0..src.len(),
        };
        Self {
            lexer: Lexer::new(src),
            nodes: vec![root],
            stack: Vec::new(),
            pending: None,
        }
    }

    fn run(mut self) -> Result<Vec<Node>, TexParseError> {
        while let Some(token) = self.lexer.next() {
            if let Some(pending) = self.pending.take()
                && token.start == pending.at
                && self.try_open_arg(pending.node, token)
            {
                continue;
            }

            match token.kind {
                TokenKind::ControlWord => match token.text {
                    "begin" => self.begin_environment(token)?,
                    "end" => self.end_environment(),
                    "verb" | "verb*" => self.inline_verbatim(token),
                    name => {
                        let id = self.push_node(NodeKind::Command(name.to_owned()), token.start..token.end);
                        self.pending = Some(Pending { node: id, at: token.end });
                    }
                },
                TokenKind::ControlSymbol => match token.text {
                    "(" => self.math(token, |t| t.kind == TokenKind::ControlSymbol && t.text == ")")?,
                    "[" => self.math(token, |t| t.kind == TokenKind::ControlSymbol && t.text == "]")?,
                    symbol => {
                        self.push_node(NodeKind::Command(symbol.to_owned()), token.start..token.end);
                    }
                },
                TokenKind::BeginGroup => {
                    let id = self.push_node(NodeKind::Group, token.start..token.end);
                    self.stack.push(Frame {
                        node: id,
                        closer: Closer::Group,
                        opened_at: token.start,
                        content_start: token.end,
                    });
                }
                TokenKind::EndGroup => self.close_brace(token),
                TokenKind::EndOptional
                    if self.top_closer() == Some(&Closer::Arg(ArgKind::Optional)) =>
                {
                    self.close_arg(token);
                }
                TokenKind::BeginOptional | TokenKind::EndOptional | TokenKind::Text => {
                    self.push_node(NodeKind::Text, token.start..token.end);
                }
                TokenKind::MathShift => self.math(token, |t| t.kind == TokenKind::MathShift)?,
                TokenKind::DisplayMathShift => {
                    self.math(token, |t| t.kind == TokenKind::DisplayMathShift)?;
                }
                TokenKind::Comment => {}
            }
        }

        self.finish()
    }

    fn finish(mut self) -> Result<Vec<Node>, TexParseError> {
        let Some(top) = self.stack.pop() else {
            return Ok(self.nodes);
        };
        match top.closer {
            Closer::Group | Closer::Arg(_) => Err(TexParseError::UnclosedGroup {
                offset: top.opened_at,
            }),
            Closer::Environment(name) => Err(TexParseError::UnclosedEnvironment {
                name,
                offset: top.opened_at,
            }),
        }
    }

    /// Closer of the innermost open frame; `None` at the document root.
    fn top_closer(&self) -> Option<&Closer> {
        self.stack.last().map(|frame| &frame.closer)
    }

    fn push_node(&mut self, kind: NodeKind, span: Range<usize>) -> NodeId {
        let parent = self.stack.last().map_or(NodeId(0), |frame| frame.node);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            args: Vec::new(),
            span,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Open an argument for `node` if `token` starts one.
    fn try_open_arg(&mut self, node: NodeId, token: Token<'a>) -> bool {
        let kind = match token.kind {
            TokenKind::BeginGroup => ArgKind::Required,
            TokenKind::BeginOptional if self.has_closing_bracket() => ArgKind::Optional,
            _ => return false,
        };
        self.stack.push(Frame {
            node,
            closer: Closer::Arg(kind),
            opened_at: token.start,
            content_start: token.end,
        });
        true
    }

    /// Whether a `]` closes the bracket just consumed before the enclosing
    /// group ends.
    fn has_closing_bracket(&self) -> bool {
        let mut depth = 0usize;
        for token in self.lexer.clone() {
            match token.kind {
                TokenKind::BeginGroup => depth += 1,
                TokenKind::EndGroup if depth == 0 => return false,
                TokenKind::EndGroup => depth -= 1,
                TokenKind::EndOptional if depth == 0 => return true,
                _ => {}
            }
        }
        false
    }

    fn close_arg(&mut self, token: Token<'a>) {
        let Some(frame) = self
            .stack
            .pop_if(|frame| matches!(frame.closer, Closer::Arg(_)))
        else {
            return;
        };
        let Closer::Arg(kind) = frame.closer else {
            return;
        };
        let node = &mut self.nodes[frame.node.0];
        node.args.push(Arg {
            kind,
            content: frame.content_start..token.start,
        });
        node.span.end = token.end;
        self.pending = Some(Pending {
            node: frame.node,
            at: token.end,
        });
    }

    fn close_brace(&mut self, token: Token<'a>) {
        match self.top_closer() {
            Some(Closer::Group) => {
                if let Some(frame) = self.stack.pop() {
                    self.nodes[frame.node.0].span.end = token.end;
                }
            }
            Some(Closer::Arg(ArgKind::Required)) => self.close_arg(token),
            // Stray closing brace.
            _ => {}
        }
    }

    /// Read `{name}` following `\begin` or `\end`, skipping blank text.
    fn read_environment_name(&mut self) -> Option<(String, usize)> {
        let mut lookahead = self.lexer.clone();
        let mut open = lookahead.next()?;
        if open.kind == TokenKind::Text && open.text.trim().is_empty() {
            open = lookahead.next()?;
        }
        if open.kind != TokenKind::BeginGroup {
            return None;
        }
        let close = lookahead.find(|t| {
            matches!(
                t.kind,
                TokenKind::EndGroup | TokenKind::BeginGroup | TokenKind::ControlWord
            )
        })?;
        if close.kind != TokenKind::EndGroup {
            return None;
        }
        let name = self.lexer.source()[open.end..close.start].trim().to_owned();
        self.lexer.seek(close.end);
        Some((name, close.end))
    }

    fn begin_environment(&mut self, token: Token<'a>) -> Result<(), TexParseError> {
        let (name, name_end) = self
            .read_environment_name()
            .ok_or(TexParseError::MissingEnvironmentName {
                offset: token.start,
            })?;

        if OPAQUE_ENVIRONMENTS.contains(&name.as_str()) {
            let end = find_environment_end(self.lexer.source(), name_end, &name).ok_or(
                TexParseError::UnclosedEnvironment {
                    name: name.clone(),
                    offset: token.start,
                },
            )?;
            self.push_node(NodeKind::Environment(name), token.start..end);
            self.lexer.seek(end);
            return Ok(());
        }

        let id = self.push_node(NodeKind::Environment(name.clone()), token.start..name_end);
        self.stack.push(Frame {
            node: id,
            closer: Closer::Environment(name),
            opened_at: token.start,
            content_start: name_end,
        });
        self.pending = Some(Pending {
            node: id,
            at: name_end,
        });
        Ok(())
    }

    /// Close the innermost matching environment, implicitly closing anything
    /// left open inside it. An `\end` with no matching `\begin` is ignored.
    fn end_environment(&mut self) {
        let Some((name, end)) = self.read_environment_name() else {
            return;
        };
        let Some(index) = self
            .stack
            .iter()
            .rposition(|frame| matches!(&frame.closer, Closer::Environment(open) if *open == name))
        else {
            return;
        };
        for frame in self.stack.drain(index..) {
            self.nodes[frame.node.0].span.end = end;
        }
    }

    /// Keep `\verb|...|` as text so its delimiters never reach the parser.
    fn inline_verbatim(&mut self, token: Token<'a>) {
        let rest = self.lexer.rest();
        let Some(delimiter) = rest.chars().next() else {
            self.push_node(NodeKind::Text, token.start..token.end);
            return;
        };
        let body = &rest[delimiter.len_utf8()..];
        let end = body.find(delimiter).map_or(self.lexer.source().len(), |i| {
            self.lexer.position() + delimiter.len_utf8() * 2 + i
        });
        self.push_node(NodeKind::Text, token.start..end);
        self.lexer.seek(end);
    }

    fn math(
        &mut self,
        open: Token<'a>,
        is_close: impl Fn(&Token<'a>) -> bool,
    ) -> Result<(), TexParseError> {
        let close = self
            .lexer
            .clone()
            .find(|t| is_close(t))
            .ok_or(TexParseError::UnterminatedMath { offset: open.start })?;
        self.push_node(NodeKind::Math, open.start..close.end);
        self.lexer.seek(close.end);
        Ok(())
    }
}

/// Byte offset just past the `\end{name}` matching a `\begin{name}` whose
/// name ended at `from`, honouring nesting of the same environment.
fn find_environment_end(src: &str, from: usize, name: &str) -> Option<usize> {
    let begin = format!("\\begin{{{name}}}");
    let end = format!("\\end{{{name}}}");
    let mut depth = 0usize;
    let mut pos = from;
    loop {
        let rest = &src[pos..];
        let next_end = rest.find(&end)?;
        match rest.find(&begin) {
            Some(next_begin) if next_begin < next_end => {
                depth += 1;
                pos += next_begin + begin.len();
            }
            _ if depth == 0 => return Some(pos + next_end + end.len()),
            _ => {
                depth -= 1;
                pos += next_end + end.len();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn names(tree: &TexTree, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| match &tree.node(id).kind {
            NodeKind::Root => "root".to_owned(),
            NodeKind::Environment(name) => format!("env:{name}"),
            NodeKind::Command(name) => format!("cmd:{name}"),
            NodeKind::Group => "group".to_owned(),
            NodeKind::Math => "math".to_owned(),
            NodeKind::Text => "text".to_owned(),
        })
        .collect()
    }

    #[test]
    fn test_command_arguments() {
        let tree = TexTree::parse(r"\caption[Short]{Long {nested} text}").unwrap();
        let caption = tree.commands_named(tree.root(), "caption").next().unwrap();
        let args = &tree.node(caption).args;
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].kind, ArgKind::Optional);
        assert_eq!(tree.arg_text(&args[0]), "Short");
        assert_eq!(args[1].kind, ArgKind::Required);
        assert_eq!(tree.arg_text(&args[1]), "Long {nested} text");
        assert_eq!(tree.text(caption), r"\caption[Short]{Long {nested} text}");
    }

    #[test]
    fn test_arguments_must_be_adjacent() {
        let tree = TexTree::parse(r"\centering {x}").unwrap();
        let centering = tree.commands_named(tree.root(), "centering").next().unwrap();
        assert!(tree.node(centering).args.is_empty());
    }

    #[test]
    fn test_bracket_without_close_is_text() {
        let tree = TexTree::parse(r"{\item[oops} \textbf{b}").unwrap();
        let item = tree.commands_named(tree.root(), "item").next().unwrap();
        assert!(tree.node(item).args.is_empty());
        assert_eq!(tree.commands_named(tree.root(), "textbf").count(), 1);
    }

    #[test]
    fn test_environment_structure_and_parents() {
        let src = r"\begin{figure}[t]
\centering
\subfloat[a]{\includegraphics{a.png}}
\caption{Both}
\end{figure}";
        let tree = TexTree::parse(src).unwrap();
        let figure = tree.descendants(tree.root()).next().unwrap();
        assert_eq!(tree.node(figure).environment_name(), Some("figure"));
        assert_eq!(tree.node(figure).args.len(), 1);
        assert_eq!(tree.text(figure), src);

        let graphic = tree.commands_named(tree.root(), "includegraphics").next().unwrap();
        assert_eq!(
            names(&tree, tree.ancestors(graphic)),
            vec!["cmd:subfloat", "env:figure", "root"]
        );
    }

    #[test]
    fn test_math_and_lists_are_opaque() {
        let src = r"$\caption{x}$ \begin{itemize}\item \caption{y}\end{itemize} \[ \} \] \begin{equation}a_{1\end{equation}";
        let tree = TexTree::parse(src).unwrap();
        assert_eq!(tree.commands_named(tree.root(), "caption").count(), 0);
        assert_eq!(
            names(&tree, tree.node(tree.root()).children.iter().copied())
                .into_iter()
                .filter(|n| n != "text")
                .collect::<Vec<_>>(),
            vec!["math", "env:itemize", "math", "env:equation"]
        );
    }

    #[test]
    fn test_nested_opaque_environment() {
        let src = r"\begin{itemize}\begin{itemize}a\end{itemize}b\end{itemize}c";
        let tree = TexTree::parse(src).unwrap();
        let first = tree.node(tree.root()).children[0];
        assert_eq!(tree.text(first), &src[..src.len() - 1]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let tree = TexTree::parse("% \\caption{hidden}\n\\caption{shown}").unwrap();
        let captions: Vec<_> = tree.commands_named(tree.root(), "caption").collect();
        assert_eq!(captions.len(), 1);
        assert_eq!(tree.arg_text(&tree.node(captions[0]).args[0]), "shown");
    }

    #[test]
    fn test_verb_hides_braces() {
        let tree = TexTree::parse(r"\verb|{| \caption{ok}").unwrap();
        assert_eq!(tree.commands_named(tree.root(), "caption").count(), 1);
    }

    #[test]
    fn test_recovers_from_stray_closers() {
        let src = r"} \end{center} \begin{figure} {\includegraphics{a}\end{figure}";
        let tree = TexTree::parse(src).unwrap();
        let graphic = tree.commands_named(tree.root(), "includegraphics").next().unwrap();
        assert_eq!(names(&tree, tree.ancestors(graphic)), vec!["group", "env:figure", "root"]);
    }

    #[test]
    fn test_unclosed_group_fails() {
        let err = TexTree::parse(r"text \caption{never closed").unwrap_err();
        assert_eq!(err, TexParseError::UnclosedGroup { offset: 13 });
    }

    #[test]
    fn test_unclosed_environment_fails() {
        let err = TexTree::parse(r"\begin{figure} body").unwrap_err();
        assert!(matches!(err, TexParseError::UnclosedEnvironment { ref name, offset: 0 } if name == "figure"));
    }

    #[test]
    fn test_unterminated_math_fails() {
        let err = TexTree::parse("cost $x + 1").unwrap_err();
        assert_eq!(err, TexParseError::UnterminatedMath { offset: 5 });
    }

    #[test]
    fn test_missing_environment_name_fails() {
        let err = TexTree::parse(r"\begin figure").unwrap_err();
        assert_eq!(err, TexParseError::MissingEnvironmentName { offset: 0 });
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let src = format!("{}x{}", "{".repeat(20_000), "}".repeat(20_000));
        let tree = TexTree::parse(src).unwrap();
        assert_eq!(tree.descendants(tree.root()).count(), 20_001);
    }
}
