use rowan::TextRange;
use serde::Serialize;
use std::fmt;

/// The class of a lexed token.
///
/// Several lexer rules may share a kind: the LaTeX rule list has two rules
/// producing [`TokenKind::Command`] (`\word` and the bare `^`/`_`/... forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Whitespace,
    /// `\#`, `\$`, `\\` and friends. The value is the escaped character.
    Escape,
    /// `\alpha`, `\,`, or one of the bare `# $ % ^ & _` characters.
    Command,
    Number,
    Open,
    Close,
    /// Any other single non-whitespace character.
    Letter,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Escape => "escape",
            TokenKind::Command => "command",
            TokenKind::Number => "number",
            TokenKind::Open => "open",
            TokenKind::Close => "close",
            TokenKind::Letter => "letter",
        };
        f.write_str(name)
    }
}

/// A single token borrowed from the lexed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Text of the rule's capture group (the whole match for group 0).
    pub value: &'a str,
    /// The full matched text.
    pub text: &'a str,
    /// Byte range of `text` in the input.
    pub range: TextRange,
}

impl<'a> Token<'a> {
    pub fn is_command(&self, name: &str) -> bool {
        self.kind == TokenKind::Command && self.value == name
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self.value, self.kind)
    }
}
