use crate::lexer::{self, Lexer};
use crate::segment::{LogicalFont, Segment};
use crate::tables;
use crate::token::{Token, TokenKind};
use crate::SyntaxError;
use rowan::TextRange;

/// Deepest nesting of groups and scripts accepted before parsing gives up.
///
/// Every group and every script operand is one level, except that a braced
/// operand (`^{...}`) counts once rather than once for the script and once
/// for the group.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("group opened at {open:?} is never closed")]
    UnterminatedGroup { open: TextRange },
    #[error("`{command}` at {at:?} has nothing to attach to")]
    MissingScriptOperand { command: String, at: TextRange },
    #[error("unexpected '}}' at {at:?}")]
    UnexpectedClose { at: TextRange },
    #[error("nesting deeper than {limit} levels at {at:?}")]
    NestingTooDeep { limit: usize, at: TextRange },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Superscript,
    Subscript,
}

impl Script {
    fn from_command(value: &str) -> Option<Self> {
        match value {
            "^" => Some(Script::Superscript),
            "_" => Some(Script::Subscript),
            _ => None,
        }
    }

    fn partner(self) -> &'static str {
        match self {
            Script::Superscript => "_",
            Script::Subscript => "^",
        }
    }
}

/// Recursive-descent parser over an immutable token slice.
///
/// Every step takes an index into the slice and returns the parsed
/// [`Segment`] together with the number of tokens it consumed, so look-ahead
/// (the `_` after a `^` operand and vice versa) never consumes anything until
/// the pairing is confirmed.
pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens }
    }

    /// Parses the whole token slice.
    ///
    /// No segments yields [`Segment::empty`], a single segment is returned as
    /// is and several are wrapped in a group.
    pub fn parse_all(&self) -> Result<Segment, ParseError> {
        let mut segments = Vec::new();
        let mut pos = 0;
        while let Some((segment, consumed)) = self.parse_one(pos, 0)? {
            segments.push(segment);
            pos += consumed;
        }
        Ok(Segment::from_run(segments))
    }

    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while self
            .tokens
            .get(pos)
            .is_some_and(|t| t.kind == TokenKind::Whitespace)
        {
            pos += 1;
        }
        pos
    }

    /// Parses the next segment at or after `pos`, or `None` at end of input.
    fn parse_one(&self, pos: usize, depth: usize) -> Result<Option<(Segment, usize)>, ParseError> {
        let start = self.skip_whitespace(pos);
        match self.tokens.get(start) {
            Some(token) => {
                let (segment, consumed) = self.parse_token(start, token, depth)?;
                Ok(Some((segment, start - pos + consumed)))
            }
            None => Ok(None),
        }
    }

    fn parse_token(
        &self,
        pos: usize,
        token: &Token<'a>,
        depth: usize,
    ) -> Result<(Segment, usize), ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_DEPTH,
                at: token.range,
            });
        }
        log::trace!("token {} at {}", token, pos);

        match token.kind {
            TokenKind::Letter => Ok((literal(LogicalFont::BodyItalic, token.value), 1)),
            TokenKind::Number => Ok((literal(LogicalFont::Upright, token.value), 1)),
            TokenKind::Escape if token.value == "\\" => Ok((Segment::line_break(), 1)),
            TokenKind::Escape => Ok((literal(LogicalFont::Upright, token.value), 1)),
            TokenKind::Command => self.parse_command(pos, token, depth),
            TokenKind::Open => self.parse_group(pos, depth),
            TokenKind::Close => Err(ParseError::UnexpectedClose { at: token.range }),
            // Only reachable for whitespace the caller did not skip.
            TokenKind::Whitespace => Ok((Segment::empty(), 1)),
        }
    }

    fn parse_command(
        &self,
        pos: usize,
        token: &Token<'a>,
        depth: usize,
    ) -> Result<(Segment, usize), ParseError> {
        if let Some(ch) = tables::greek_letter(token.value) {
            return Ok((Segment::glyph(LogicalFont::BodyItalic, ch), 1));
        }
        if let Some(width) = tables::space_width(token.value) {
            return Ok((Segment::space(width), 1));
        }
        if let Some(script) = Script::from_command(token.value) {
            return self.parse_scripts(pos, script, depth);
        }
        // Unknown command: draw its name.
        Ok((literal(LogicalFont::BodyItalic, token.value), 1))
    }

    fn parse_group(&self, open: usize, depth: usize) -> Result<(Segment, usize), ParseError> {
        let mut children = Vec::new();
        let mut pos = open + 1;
        loop {
            pos = self.skip_whitespace(pos);
            match self.tokens.get(pos) {
                None => {
                    return Err(ParseError::UnterminatedGroup {
                        open: self.tokens[open].range,
                    });
                }
                Some(token) if token.kind == TokenKind::Close => {
                    return Ok((Segment::group(children), pos + 1 - open));
                }
                Some(token) => {
                    let (child, consumed) = self.parse_token(pos, token, depth + 1)?;
                    children.push(child);
                    pos += consumed;
                }
            }
        }
    }

    /// Parses `^x`, `_x`, `^x_y` or `_y^x` starting at the script command.
    fn parse_scripts(
        &self,
        pos: usize,
        first: Script,
        depth: usize,
    ) -> Result<(Segment, usize), ParseError> {
        let (primary, mut consumed) = self.parse_operand(pos, depth)?;

        let mut secondary = Segment::empty();
        if self
            .tokens
            .get(pos + consumed)
            .is_some_and(|t| t.is_command(first.partner()))
        {
            let (segment, n) = self.parse_operand(pos + consumed, depth)?;
            secondary = segment;
            consumed += n;
        }

        let segment = match first {
            Script::Superscript => Segment::sup_sub(primary, secondary),
            Script::Subscript => Segment::sup_sub(secondary, primary),
        };
        Ok((segment, consumed))
    }

    /// Parses the operand of the script command at `command`, counting the
    /// command token itself in the consumed total.
    fn parse_operand(&self, command: usize, depth: usize) -> Result<(Segment, usize), ParseError> {
        let token = &self.tokens[command];
        let start = self.skip_whitespace(command + 1);
        match self.tokens.get(start) {
            Some(operand) if operand.kind != TokenKind::Close => {
                // A group operand adds its own level.
                let depth = if operand.kind == TokenKind::Open {
                    depth
                } else {
                    depth + 1
                };
                let (segment, consumed) = self.parse_token(start, operand, depth)?;
                Ok((segment, start - command + consumed))
            }
            _ => Err(ParseError::MissingScriptOperand {
                command: token.value.to_string(),
                at: token.range,
            }),
        }
    }
}

/// One glyph per character, collapsed like a top-level run.
fn literal(font: LogicalFont, text: &str) -> Segment {
    Segment::from_run(text.chars().map(|ch| Segment::glyph(font, ch)).collect())
}

/// Parses a token slice into a segment tree.
pub fn parse_all(tokens: &[Token<'_>]) -> Result<Segment, ParseError> {
    Parser::new(tokens).parse_all()
}

/// Tokenizes `input` with `lexer` and parses the result.
pub fn parse_with(lexer: &Lexer, input: &str) -> Result<Segment, SyntaxError> {
    let tokens = lexer.tokenize(input).collect::<Result<Vec<_>, _>>()?;
    log::debug!("lexed {} tokens from {} bytes", tokens.len(), input.len());
    Ok(parse_all(&tokens)?)
}

/// Tokenizes `input` with the built-in LaTeX rules and parses the result.
pub fn parse(input: &str) -> Result<Segment, SyntaxError> {
    let tokens = lexer::tokenize(input).collect::<Result<Vec<_>, _>>()?;
    Ok(parse_all(&tokens)?)
}
