//! Rendering LaTeX fragments as plain Unicode text.
//!
//! Used on extracted captions only: accents, symbols and styling commands
//! become the characters they typeset, references become placeholders, and
//! layout directives disappear. Rendering never fails; unbalanced input
//! renders up to the end of the string.
//!
//! Plain brace groups are flattened in a loop. Macro arguments, accents and
//! inline math recurse, bounded by [`MAX_NESTING`]; a fragment nested deeper
//! renders as empty text, which the caption sanitizer rejects.

use crate::lexer::{Lexer, Token, TokenKind};
use crate::symbols::{accent_mark, compose, control_symbol, symbol};

/// Deepest macro, accent or math nesting rendered.
pub const MAX_NESTING: usize = 128;

/// How a known macro treats its arguments.
#[derive(Debug, Clone, Copy)]
enum Macro {
    /// Render the single argument.
    Render,
    /// Drop `n` arguments and emit fixed text.
    Replace(&'static str, usize),
    /// Drop `n` arguments.
    Discard(usize),
    /// Drop `n` arguments, then render the next one.
    SkipThenRender(usize),
    /// `\frac{a}{b}` as `a/b`.
    Fraction,
    /// `\sqrt{x}` as `√x`.
    Root,
}

fn macro_spec(name: &str) -> Option<Macro> {
    let spec = match name {
        "textbf" | "textit" | "textsl" | "emph" | "textrm" | "textsf" | "texttt" | "textsc"
        | "textup" | "textmd" | "textnormal" | "underline" | "uline" | "mbox" | "hbox"
        | "makebox" | "fbox" | "text" | "textsuperscript" | "textsubscript" | "mathrm"
        | "mathbf" | "mathit" | "mathsf" | "mathtt" | "mathcal" | "mathbb" | "mathfrak"
        | "mathscr" | "mathnormal" | "boldsymbol" | "bm" | "operatorname" | "ensuremath"
        | "overline" | "hat" | "widehat" | "tilde" | "widetilde" | "bar" | "vec" | "dot"
        | "ddot" | "url" | "nolinkurl" => Macro::Render,
        "cite" | "citep" | "citet" | "citealp" | "citealt" | "citeauthor" | "citeyear"
        | "parencite" | "textcite" | "autocite" => Macro::Replace("<cite>", 1),
        "ref" | "eqref" | "autoref" | "cref" | "Cref" | "pageref" | "subref" | "vref" => {
            Macro::Replace("<ref>", 1)
        }
        "label" | "index" | "footnote" | "footnotetext" | "thanks" | "vspace" | "vspace*"
        | "hspace" | "hspace*" | "phantom" | "hphantom" | "vphantom" | "nocite" | "color"
        | "includegraphics" | "linespread" | "bibliography" | "bibliographystyle" => {
            Macro::Discard(1)
        }
        "setlength" | "addtolength" | "setcounter" | "rule" | "fontsize" => Macro::Discard(2),
        "textcolor" | "colorbox" | "href" | "foreignlanguage" | "raisebox" | "scalebox" => {
            Macro::SkipThenRender(1)
        }
        "multicolumn" | "resizebox" => Macro::SkipThenRender(2),
        "frac" | "dfrac" | "tfrac" | "cfrac" => Macro::Fraction,
        "sqrt" => Macro::Root,
        _ => return None,
    };
    Some(spec)
}

/// Accents written as control words (`\v{s}`, `\c c`).
fn is_word_accent(name: &str) -> bool {
    matches!(name, "u" | "v" | "H" | "c" | "d" | "b" | "r" | "k" | "t")
}

/// Where a nested render stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    EndOfInput,
    EndGroup,
    MathShift,
    DisplayMathShift,
    CloseParen,
    CloseBracket,
}

impl Stop {
    fn matches(self, token: &Token<'_>) -> bool {
        match self {
            Self::EndOfInput => false,
            Self::EndGroup => token.kind == TokenKind::EndGroup,
            Self::MathShift => token.kind == TokenKind::MathShift,
            Self::DisplayMathShift => token.kind == TokenKind::DisplayMathShift,
            Self::CloseParen => token.kind == TokenKind::ControlSymbol && token.text == ")",
            Self::CloseBracket => token.kind == TokenKind::ControlSymbol && token.text == "]",
        }
    }
}

/// Convert a LaTeX fragment to plain text.
///
/// Whitespace is passed through as written; collapsing it is left to the
/// caption sanitizer.
///
/// # Example
///
/// ```
/// use figcap_latex::latex_to_text;
///
/// assert_eq!(latex_to_text(r"A plot of $x^2$."), "A plot of x2.");
/// assert_eq!(latex_to_text(r"Erd\H{o}s--R\'enyi \emph{graph}"), "Erdős–Rényi graph");
/// assert_eq!(latex_to_text(r"see Fig.~\ref{fig:a}\label{x}"), "see Fig. <ref>");
/// ```
#[must_use]
pub fn latex_to_text(source: &str) -> String {
    let mut renderer = Renderer {
        lexer: Lexer::new(source),
        depth: 0,
        too_deep: false,
    };
    let text = renderer.render(false, Stop::EndOfInput);
    if renderer.too_deep {
        tracing::debug!(max = MAX_NESTING, "Fragment nested too deeply, dropping");
        return String::new();
    }
    text
}

struct Renderer<'a> {
    lexer: Lexer<'a>,
    /// Control sequences currently being rendered.
    depth: usize,
    /// Set once `depth` hit [`MAX_NESTING`].
    too_deep: bool,
}

impl Renderer<'_> {
    fn render(&mut self, math: bool, stop: Stop) -> String {
        let mut out = String::new();
        // Plain groups only scope declarations, so they are flattened in place.
        let mut depth = 0usize;
        while let Some(token) = self.lexer.next() {
            match token.kind {
                TokenKind::BeginGroup => {
                    depth += 1;
                    continue;
                }
                TokenKind::EndGroup if depth > 0 => {
                    depth -= 1;
                    continue;
                }
                _ => {}
            }
            if stop.matches(&token) {
                break;
            }
            match token.kind {
                TokenKind::Text => push_text(&mut out, token.text, math),
                TokenKind::BeginOptional => out.push('['),
                TokenKind::EndOptional => out.push(']'),
                TokenKind::MathShift if !math => out.push_str(&self.render(true, Stop::MathShift)),
                TokenKind::DisplayMathShift if !math => {
                    out.push_str(&self.render(true, Stop::DisplayMathShift));
                }
                TokenKind::ControlWord | TokenKind::ControlSymbol => {
                    out.push_str(&self.render_control(token, math));
                }
                TokenKind::BeginGroup
                | TokenKind::EndGroup
                | TokenKind::MathShift
                | TokenKind::DisplayMathShift
                | TokenKind::Comment => {}
            }
        }
        out
    }

    /// Render one control sequence that has just been consumed.
    ///
    /// Every recursive path (arguments, accents, `\(`/`\[` math) passes
    /// through here, so this is where nesting is bounded. Past the limit the
    /// sequence is left unexpanded and the outer loop flattens what follows.
    fn render_control(&mut self, token: Token<'_>, math: bool) -> String {
        if self.depth >= MAX_NESTING {
            self.too_deep = true;
            return String::new();
        }
        self.depth += 1;
        let out = self.expand_control(token, math);
        self.depth -= 1;
        out
    }

    fn expand_control(&mut self, token: Token<'_>, math: bool) -> String {
        if token.kind == TokenKind::ControlSymbol {
            return match token.text {
                "(" => self.render(true, Stop::CloseParen),
                "[" => self.render(true, Stop::CloseBracket),
                name if accent_mark(name).is_some() => self.accent(name, math),
                symbol => control_symbol(symbol).unwrap_or_default().to_owned(),
            };
        }

        let name = token.text;
        match name {
            "begin" | "end" => {
                self.skip_environment_name();
                return String::new();
            }
            "verb" | "verb*" => return self.verbatim(),
            _ => {}
        }
        if is_word_accent(name) {
            return self.accent(name, math);
        }
        if let Some(spec) = macro_spec(name) {
            return self.apply_macro(spec, math);
        }
        symbol(name).unwrap_or_default().to_owned()
    }

    fn apply_macro(&mut self, spec: Macro, math: bool) -> String {
        match spec {
            Macro::Render => self.next_arg(math).unwrap_or_default(),
            Macro::Replace(text, count) => {
                self.discard_args(count, math);
                text.to_owned()
            }
            Macro::Discard(count) => {
                self.discard_args(count, math);
                String::new()
            }
            Macro::SkipThenRender(count) => {
                self.discard_args(count, math);
                self.next_arg(math).unwrap_or_default()
            }
            Macro::Fraction => {
                let numerator = self.next_arg(math).unwrap_or_default();
                let denominator = self.next_arg(math).unwrap_or_default();
                format!("{numerator}/{denominator}")
            }
            Macro::Root => format!("√{}", self.next_arg(math).unwrap_or_default()),
        }
    }

    fn discard_args(&mut self, count: usize, math: bool) {
        for _ in 0..count {
            self.next_arg(math);
        }
    }

    fn accent(&mut self, name: &str, math: bool) -> String {
        let Some(mark) = accent_mark(name) else {
            return String::new();
        };
        let arg = self.next_arg(math).unwrap_or_default();
        let mut chars = arg.chars();
        match chars.next() {
            Some(base) => compose(mark, base) + chars.as_str(),
            None => match name {
                "~" => "~".to_owned(),
                "^" => "^".to_owned(),
                _ => String::new(),
            },
        }
    }

    /// Read and render one macro argument: a brace group, a single control
    /// sequence, or a single character. Leading whitespace, comments and
    /// bracketed optional arguments are skipped.
    fn next_arg(&mut self, math: bool) -> Option<String> {
        loop {
            let rest = self.lexer.rest();
            let skipped = rest.len() - rest.trim_start().len();
            self.lexer.seek(self.lexer.position() + skipped);

            let token = self.lexer.peek()?;
            match token.kind {
                TokenKind::BeginOptional => {
                    self.lexer.next();
                    self.skip_optional();
                }
                TokenKind::Comment => {
                    self.lexer.next();
                }
                TokenKind::BeginGroup => {
                    self.lexer.next();
                    return Some(self.render(math, Stop::EndGroup));
                }
                TokenKind::ControlWord | TokenKind::ControlSymbol => {
                    self.lexer.next();
                    return Some(self.render_control(token, math));
                }
                TokenKind::Text => {
                    let first = token.text.chars().next()?;
                    let end = token.start + first.len_utf8();
                    self.lexer.seek(end);
                    let mut out = String::new();
                    push_text(&mut out, &token.text[..first.len_utf8()], math);
                    return Some(out);
                }
                TokenKind::EndGroup
                | TokenKind::EndOptional
                | TokenKind::MathShift
                | TokenKind::DisplayMathShift => return None,
            }
        }
    }

    /// Consume tokens up to the `]` closing an optional argument.
    fn skip_optional(&mut self) {
        let mut depth = 0usize;
        for token in self.lexer.by_ref() {
            match token.kind {
                TokenKind::BeginGroup => depth += 1,
                TokenKind::EndGroup => depth = depth.saturating_sub(1),
                TokenKind::EndOptional if depth == 0 => return,
                _ => {}
            }
        }
    }

    fn skip_environment_name(&mut self) {
        let rest = self.lexer.rest();
        if rest.starts_with('{')
            && let Some(close) = rest.find('}')
        {
            self.lexer.seek(self.lexer.position() + close + 1);
        }
    }

    /// `\verb|...|` content, verbatim.
    fn verbatim(&mut self) -> String {
        let rest = self.lexer.rest();
        let Some(delimiter) = rest.chars().next() else {
            return String::new();
        };
        let body = &rest[delimiter.len_utf8()..];
        let len = body.find(delimiter).unwrap_or(body.len());
        let content = body[..len].to_owned();
        let mut consumed = delimiter.len_utf8() + len;
        if len < body.len() {
            consumed += delimiter.len_utf8();
        }
        self.lexer.seek(self.lexer.position() + consumed);
        content
    }
}

/// Append a text run, applying TeX ligatures and math-mode rules.
fn push_text(out: &mut String, text: &str, math: bool) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '~' => out.push(' '),
            '^' | '_' if math => {}
            '-' if !math => {
                let mut run = 1;
                while run < 3 && chars.next_if_eq(&'-').is_some() {
                    run += 1;
                }
                out.push(match run {
                    3 => '—',
                    2 => '–',
                    _ => '-',
                });
            }
            '`' if !math => {
                out.push(if chars.next_if_eq(&'`').is_some() { '“' } else { '‘' });
            }
            '\'' if !math && chars.next_if_eq(&'\'').is_some() => out.push('”'),
            _ => out.push(c),
        }
    }
}
