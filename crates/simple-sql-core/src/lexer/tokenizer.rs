//! Simple Syntax tokenizer implementation.

use super::Token;
use crate::error::{Result, SyntaxError};

/// A callback that rewrites or validates each scalar leaf.
pub type LeafHook<'h> = &'h dyn Fn(&str) -> Result<String>;

/// A configurable splitter for Simple Syntax strings.
///
/// Top-level splitting happens on the configured delimiters. Quoted spans
/// (`'`, `"`, `` ` ``), backslash escapes, `[...]` brackets and the argument
/// list of a function-like leaf (`name(...)`) are never split. Any other
/// parenthesized span becomes a nested [`Token::Group`].
pub struct Tokenizer<'h> {
    delimiters: Vec<&'static str>,
    operators: Vec<&'static str>,
    leaf_hook: Option<LeafHook<'h>>,
}

impl<'h> Tokenizer<'h> {
    /// Creates a tokenizer splitting on the given delimiters.
    ///
    /// Longer delimiters win over their prefixes, so `<<` is matched before `<`.
    #[must_use]
    pub fn new(delimiters: &[&'static str]) -> Self {
        let mut delimiters = delimiters.to_vec();
        delimiters.sort_by_key(|d| std::cmp::Reverse(d.len()));
        Self {
            delimiters,
            operators: Vec::new(),
            leaf_hook: None,
        }
    }

    /// Sets the operator symbols used by [`Tokenizer::split_clip`].
    #[must_use]
    pub fn with_operators(mut self, operators: &[&'static str]) -> Self {
        let mut operators = operators.to_vec();
        operators.sort_by_key(|o| std::cmp::Reverse(o.len()));
        self.operators = operators;
        self
    }

    /// Sets a callback applied to every scalar leaf during extraction.
    #[must_use]
    pub fn with_leaf_hook(mut self, hook: LeafHook<'h>) -> Self {
        self.leaf_hook = Some(hook);
        self
    }

    /// Tokenizes the entire input into a token tree.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::Tokenize`] on unbalanced parentheses or an
    /// unterminated quote, bracket or escape, and forwards leaf hook errors.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>> {
        let mut scanner = Scanner::new(self, input);
        let tokens = scanner.scan_level(false)?;
        tracing::trace!(input, tokens = tokens.len(), "tokenized syntax");
        Ok(tokens)
    }

    /// Splits one leaf into alternating operand and operator parts.
    ///
    /// A leaf without an operator yields one part; `a=1` yields three. Quoted
    /// spans, brackets, argument lists and JSON arrows (`->`, `->>`) are never
    /// split.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::Tokenize`] on an unterminated span.
    pub fn split_clip(&self, leaf: &str) -> Result<Vec<String>> {
        let mut scanner = Scanner::new(self, leaf);
        let mut parts = Vec::new();
        let mut buf = String::new();

        while let Some(c) = scanner.peek() {
            if scanner.copy_span(&mut buf)? || scanner.take_arrow(&mut buf) {
                continue;
            }
            if let Some(op) = scanner.match_operator() {
                parts.push(buf.trim().to_string());
                parts.push(op.to_string());
                buf.clear();
                scanner.pos += op.len();
                continue;
            }
            buf.push(c);
            scanner.advance();
        }
        parts.push(buf.trim().to_string());
        Ok(parts)
    }
}

/// Cursor over one input string.
struct Scanner<'t, 'h, 'a> {
    tokenizer: &'t Tokenizer<'h>,
    input: &'a str,
    pos: usize,
}

impl<'t, 'h, 'a> Scanner<'t, 'h, 'a> {
    const fn new(tokenizer: &'t Tokenizer<'h>, input: &'a str) -> Self {
        Self {
            tokenizer,
            input,
            pos: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Scans tokens until end of input, or until the closing `)` when nested.
    fn scan_level(&mut self, nested: bool) -> Result<Vec<Token>> {
        let open = self.pos.saturating_sub(1);
        let mut tokens = Vec::new();
        let mut buf = String::new();
        let mut group: Option<(String, Vec<Token>)> = None;

        loop {
            let Some(c) = self.peek() else {
                if nested {
                    return Err(SyntaxError::tokenize(open, "unbalanced `(`"));
                }
                self.flush(&mut tokens, &mut buf, &mut group)?;
                return Ok(tokens);
            };

            if c == '(' && !ends_with_word(&buf) {
                if group.is_some() {
                    return Err(SyntaxError::tokenize(self.pos, "`(` directly after a group"));
                }
                self.advance();
                let inner = self.scan_level(true)?;
                group = Some((buf.trim().to_string(), inner));
                buf.clear();
                continue;
            }
            if c == ')' {
                if !nested {
                    return Err(SyntaxError::tokenize(self.pos, "unbalanced `)`"));
                }
                self.advance();
                self.flush(&mut tokens, &mut buf, &mut group)?;
                return Ok(tokens);
            }
            if self.copy_span(&mut buf)? || self.take_arrow(&mut buf) {
                continue;
            }
            if let Some(delimiter) = self.match_delimiter() {
                self.flush(&mut tokens, &mut buf, &mut group)?;
                tokens.push(Token::Combinator(delimiter.to_string()));
                self.pos += delimiter.len();
                continue;
            }
            buf.push(c);
            self.advance();
        }
    }

    /// Emits the pending group or leaf, if any.
    fn flush(
        &self,
        tokens: &mut Vec<Token>,
        buf: &mut String,
        group: &mut Option<(String, Vec<Token>)>,
    ) -> Result<()> {
        let text = buf.trim();
        if let Some((prefix, inner)) = group.take() {
            tokens.push(Token::Group {
                prefix,
                tokens: inner,
                suffix: text.to_string(),
            });
        } else if !text.is_empty() {
            let leaf = match self.tokenizer.leaf_hook {
                Some(hook) => hook(text)?,
                None => text.to_string(),
            };
            tokens.push(Token::Leaf(leaf));
        }
        buf.clear();
        Ok(())
    }

    /// Copies an opaque span starting at the cursor into `buf`.
    ///
    /// Returns false when the cursor is not on a span opener.
    fn copy_span(&mut self, buf: &mut String) -> Result<bool> {
        match self.peek() {
            Some('\\') => self.copy_escape(buf)?,
            Some('\'' | '"' | '`') => self.copy_quoted(buf)?,
            Some('[') => self.copy_enclosed(buf, '[', ']')?,
            Some('(') if ends_with_word(buf) => self.copy_enclosed(buf, '(', ')')?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn copy_escape(&mut self, buf: &mut String) -> Result<()> {
        let start = self.pos;
        self.advance();
        buf.push('\\');
        match self.advance() {
            Some(c) => {
                buf.push(c);
                Ok(())
            }
            None => Err(SyntaxError::tokenize(start, "dangling escape")),
        }
    }

    fn copy_quoted(&mut self, buf: &mut String) -> Result<()> {
        let start = self.pos;
        let Some(quote) = self.advance() else {
            return Ok(());
        };
        buf.push(quote);
        loop {
            match self.advance() {
                Some('\\') => {
                    buf.push('\\');
                    match self.advance() {
                        Some(c) => buf.push(c),
                        None => return Err(SyntaxError::tokenize(start, "dangling escape")),
                    }
                }
                Some(c) => {
                    buf.push(c);
                    if c == quote {
                        return Ok(());
                    }
                }
                None => {
                    return Err(SyntaxError::tokenize(
                        start,
                        format!("unterminated quote `{quote}`"),
                    ))
                }
            }
        }
    }

    fn copy_enclosed(&mut self, buf: &mut String, open: char, close: char) -> Result<()> {
        let start = self.pos;
        let mut depth = 0_usize;
        loop {
            match self.peek() {
                None => return Err(SyntaxError::tokenize(start, format!("unterminated `{open}`"))),
                Some('\\') => self.copy_escape(buf)?,
                Some('\'' | '"' | '`') => self.copy_quoted(buf)?,
                Some(c) => {
                    buf.push(c);
                    self.advance();
                    if c == open {
                        depth += 1;
                    } else if c == close {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Copies a `->` or `->>` JSON arrow, which is never split.
    fn take_arrow(&mut self, buf: &mut String) -> bool {
        let rest = self.rest();
        let len = if rest.starts_with("->>") {
            3
        } else if rest.starts_with("->") {
            2
        } else {
            return false;
        };
        buf.push_str(&rest[..len]);
        self.pos += len;
        true
    }

    /// A delimiter directly followed by `=` belongs to an operator (`|=`).
    fn match_delimiter(&self) -> Option<&'static str> {
        let rest = self.rest();
        self.tokenizer
            .delimiters
            .iter()
            .copied()
            .find(|d| rest.starts_with(d) && !rest[d.len()..].starts_with('='))
    }

    fn match_operator(&self) -> Option<&'static str> {
        let rest = self.rest();
        self.tokenizer
            .operators
            .iter()
            .copied()
            .find(|op| rest.starts_with(op))
    }
}

fn ends_with_word(buf: &str) -> bool {
    buf.chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}
