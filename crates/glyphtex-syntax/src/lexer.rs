use crate::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;
use rowan::{TextRange, TextSize};
use serde::{Deserialize, Serialize};

/// A rule-driven lexer for markup.
///
/// ## Overview
///
/// The lexer holds an **ordered** list of [`TokenDescriptor`]s. At each input
/// position every rule is tried in registration order and the first one whose
/// pattern matches *at that position* wins. This is first-match, not
/// longest-match: rule order encodes precedence, so the `\\` escape rule sits
/// in front of the generic `\word` command rule.
///
/// When no rule matches, the configured [`GapPolicy`] decides whether the
/// offending character is skipped or reported.
///
/// ## Examples
///
/// ```
/// use glyphtex_syntax::lexer::Lexer;
/// use glyphtex_syntax::TokenKind;
///
/// let lexer = Lexer::latex();
/// let tokens: Vec<_> = lexer.tokenize(r"\alpha^2").collect::<Result<_, _>>().unwrap();
///
/// assert_eq!(tokens[0].kind, TokenKind::Command);
/// assert_eq!(tokens[0].value, "alpha"); // capture group 1
/// assert_eq!(tokens[0].text, r"\alpha");
/// assert_eq!(tokens[1].value, "^");
/// assert_eq!(tokens[2].kind, TokenKind::Number);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    rules: Vec<TokenDescriptor>,
    gap_policy: GapPolicy,
}

/// What to do with a character that no rule matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Drop the character and continue with the next one.
    #[default]
    Skip,
    /// Stop and report [`LexError::UnrecognizedCharacter`].
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("invalid pattern `{pattern}` for {kind} rule: {message}")]
    InvalidPattern {
        kind: TokenKind,
        pattern: String,
        message: String,
    },
    #[error("{kind} rule `{pattern}` has no capture group {group}")]
    MissingCaptureGroup {
        kind: TokenKind,
        pattern: String,
        group: usize,
    },
    #[error("unrecognized character {ch:?} at offset {offset}")]
    UnrecognizedCharacter { ch: char, offset: usize },
}

/// One lexer rule: a token kind, an anchored pattern and the capture group
/// whose text becomes the token's value.
#[derive(Debug, Clone)]
pub struct TokenDescriptor {
    kind: TokenKind,
    regex: Regex,
    capture_group: usize,
}

impl TokenDescriptor {
    /// Compiles `pattern` anchored at the current lexer position.
    pub fn new(kind: TokenKind, pattern: &str, capture_group: usize) -> Result<Self, LexError> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| LexError::InvalidPattern {
            kind,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        if capture_group >= regex.captures_len() {
            return Err(LexError::MissingCaptureGroup {
                kind,
                pattern: pattern.to_string(),
                group: capture_group,
            });
        }

        Ok(Self {
            kind,
            regex,
            capture_group,
        })
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Matches at the start of `rest`, returning `(value, full match)`.
    ///
    /// Empty matches are rejected since they would never advance the cursor.
    fn match_at<'a>(&self, rest: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.regex.captures(rest)?;
        let full = captures.get(0)?.as_str();
        if full.is_empty() {
            return None;
        }
        let value = captures
            .get(self.capture_group)
            .map_or("", |m| m.as_str());
        Some((value, full))
    }
}

static LATEX: Lazy<Lexer> = Lazy::new(|| {
    let rules = [
        (TokenKind::Whitespace, r"\s+", 0),
        (TokenKind::Escape, r"\\([#$%^&_{}~\\])", 1),
        // `\ ` is the only whitespace a command may name.
        (TokenKind::Command, r"\\([A-Za-z]+|[^A-Za-z0-9\s]| )", 1),
        (TokenKind::Command, r"[#$%^&_]", 0),
        (TokenKind::Number, r"\d", 0),
        (TokenKind::Open, r"\{", 0),
        (TokenKind::Close, r"\}", 0),
        // Nearly catch-all for anything the rules above leave behind.
        (TokenKind::Letter, r"\S", 0),
    ];

    let mut lexer = Lexer::new();
    for (kind, pattern, group) in rules {
        let rule = TokenDescriptor::new(kind, pattern, group).expect("built-in LaTeX rule is valid");
        lexer.push(rule);
    }
    lexer
});

impl Lexer {
    /// Creates a lexer with no rules. Every character is a gap until rules are pushed.
    pub fn new() -> Self {
        Self::default()
    }

    /// The rule list for the supported LaTeX subset.
    pub fn latex() -> Self {
        LATEX.clone()
    }

    /// Appends a rule with the lowest precedence so far.
    pub fn push(&mut self, rule: TokenDescriptor) {
        self.rules.push(rule);
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    pub fn gap_policy(&self) -> GapPolicy {
        self.gap_policy
    }

    pub fn rules(&self) -> &[TokenDescriptor] {
        &self.rules
    }

    /// Returns a lazy token stream over `input`.
    ///
    /// Each call starts from the beginning of `input`, so the stream can be
    /// restarted by calling `tokenize` again.
    pub fn tokenize<'l, 'a>(&'l self, input: &'a str) -> Tokens<'l, 'a> {
        Tokens {
            lexer: self,
            input,
            position: 0,
            failed: false,
        }
    }
}

/// Tokenizes `input` with the built-in LaTeX rules and the skipping gap policy.
pub fn tokenize(input: &str) -> Tokens<'static, '_> {
    LATEX.tokenize(input)
}

/// Iterator returned by [`Lexer::tokenize`].
pub struct Tokens<'l, 'a> {
    lexer: &'l Lexer,
    input: &'a str,
    position: usize,
    failed: bool,
}

impl<'a> Tokens<'_, 'a> {
    fn next_match(&self, rest: &'a str) -> Option<(TokenKind, &'a str, &'a str)> {
        self.lexer
            .rules
            .iter()
            .find_map(|rule| rule.match_at(rest).map(|(value, text)| (rule.kind, value, text)))
    }
}

impl<'a> Iterator for Tokens<'_, 'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed && self.position < self.input.len() {
            let rest = &self.input[self.position..];

            if let Some((kind, value, text)) = self.next_match(rest) {
                let start = TextSize::from(self.position as u32);
                self.position += text.len();
                return Some(Ok(Token {
                    kind,
                    value,
                    text,
                    range: TextRange::at(start, TextSize::of(text)),
                }));
            }

            let ch = rest.chars().next()?;
            match self.lexer.gap_policy {
                GapPolicy::Skip => {
                    log::debug!(
                        "skipping unrecognized character {:?} at offset {}",
                        ch,
                        self.position
                    );
                    self.position += ch.len_utf8();
                }
                GapPolicy::Fail => {
                    self.failed = true;
                    return Some(Err(LexError::UnrecognizedCharacter {
                        ch,
                        offset: self.position,
                    }));
                }
            }
        }
        None
    }
}
