//! TeX tokenizer shared by the tree parser and the text renderer.

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// `\name`, with an optional trailing `*`.
    ControlWord,
    /// `\` followed by one non-letter character.
    ControlSymbol,
    /// `{`
    BeginGroup,
    /// `}`
    EndGroup,
    /// `[`
    BeginOptional,
    /// `]`
    EndOptional,
    /// `$`
    MathShift,
    /// `$$`
    DisplayMathShift,
    /// `%` up to (not including) the end of the line.
    Comment,
    /// Run of characters with no special meaning.
    Text,
}

/// One token with its byte span in the source.
///
/// For control sequences `text` is the name without the backslash; for every
/// other kind it is the raw source slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Cursor over TeX source producing tokens on demand.
///
/// The cursor can be repositioned, which lets callers skip raw regions
/// (verbatim, math) without tokenizing them.
#[derive(Debug, Clone)]
pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor to a byte offset on a char boundary.
    pub fn seek(&mut self, pos: usize) {
        debug_assert!(self.src.is_char_boundary(pos));
        self.pos = pos.min(self.src.len());
    }

    pub fn peek(&self) -> Option<Token<'a>> {
        self.clone().next()
    }

    /// Unconsumed source.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }
}

fn is_special(c: char) -> bool {
    matches!(c, '\\' | '{' | '}' | '[' | ']' | '$' | '%')
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        let first = rest.chars().next()?;
        let start = self.pos;

        let (kind, len, text) = match first {
            '\\' => {
                let after = &rest[1..];
                let word_len = after.bytes().take_while(u8::is_ascii_alphabetic).count();
                if word_len > 0 {
                    let star = usize::from(after[word_len..].starts_with('*'));
                    let len = 1 + word_len + star;
                    (TokenKind::ControlWord, len, &rest[1..len])
                } else if let Some(symbol) = after.chars().next() {
                    let len = 1 + symbol.len_utf8();
                    (TokenKind::ControlSymbol, len, &rest[1..len])
                } else {
                    (TokenKind::Text, 1, &rest[..1])
                }
            }
            '{' => (TokenKind::BeginGroup, 1, &rest[..1]),
            '}' => (TokenKind::EndGroup, 1, &rest[..1]),
            '[' => (TokenKind::BeginOptional, 1, &rest[..1]),
            ']' => (TokenKind::EndOptional, 1, &rest[..1]),
            '$' if rest.starts_with("$$") => (TokenKind::DisplayMathShift, 2, &rest[..2]),
            '$' => (TokenKind::MathShift, 1, &rest[..1]),
            '%' => {
                let len = rest.find('\n').unwrap_or(rest.len());
                (TokenKind::Comment, len, &rest[..len])
            }
            _ => {
                let len = rest.find(is_special).unwrap_or(rest.len());
                (TokenKind::Text, len, &rest[..len])
            }
        };

        self.pos += len;
        Some(Token {
            kind,
            text,
            start,
            end: start + len,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        Lexer::new(src).map(|t| (t.kind, t.text)).collect()
    }

    #[test]
    fn test_control_sequences() {
        assert_eq!(
            kinds(r"\section*{A}\%\'e"),
            vec![
                (TokenKind::ControlWord, "section*"),
                (TokenKind::BeginGroup, "{"),
                (TokenKind::Text, "A"),
                (TokenKind::EndGroup, "}"),
                (TokenKind::ControlSymbol, "%"),
                (TokenKind::ControlSymbol, "'"),
                (TokenKind::Text, "e"),
            ]
        );
    }

    #[test]
    fn test_math_and_comments() {
        assert_eq!(
            kinds("a $x$ $$y$$ % note\nb"),
            vec![
                (TokenKind::Text, "a "),
                (TokenKind::MathShift, "$"),
                (TokenKind::Text, "x"),
                (TokenKind::MathShift, "$"),
                (TokenKind::Text, " "),
                (TokenKind::DisplayMathShift, "$$"),
                (TokenKind::Text, "y"),
                (TokenKind::DisplayMathShift, "$$"),
                (TokenKind::Text, " "),
                (TokenKind::Comment, "% note"),
                (TokenKind::Text, "\nb"),
            ]
        );
    }

    #[test]
    fn test_spans_cover_multibyte_text() {
        let src = "é\\ü{ß}";
        let tokens: Vec<_> = Lexer::new(src).collect();
        assert_eq!(tokens[0].text, "é");
        assert_eq!(tokens[1].kind, TokenKind::ControlSymbol);
        assert_eq!(tokens[1].text, "ü");
        assert_eq!(tokens.last().unwrap().end, src.len());
    }

    #[test]
    fn test_trailing_backslash_is_text() {
        assert_eq!(kinds("a\\"), vec![(TokenKind::Text, "a"), (TokenKind::Text, "\\")]);
    }

    #[test]
    fn test_seek_and_peek() {
        let mut lexer = Lexer::new("ab{c}");
        lexer.seek(2);
        assert_eq!(lexer.peek().unwrap().kind, TokenKind::BeginGroup);
        assert_eq!(lexer.position(), 2);
        assert_eq!(lexer.rest(), "{c}");
    }
}
