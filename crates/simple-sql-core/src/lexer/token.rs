//! Token tree produced by the tokenizer.

/// One node of a token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A scalar leaf, whitespace trimmed.
    Leaf(String),
    /// A parenthesized span.
    Group {
        /// Text between the previous combinator and `(`, e.g. `!!`.
        prefix: String,
        /// The recursively tokenized content.
        tokens: Vec<Token>,
        /// Text between `)` and the next combinator, e.g. a join bracket.
        suffix: String,
    },
    /// A delimiter that joins the neighbouring tokens.
    Combinator(String),
}

impl Token {
    /// Returns true if this token is a combinator.
    #[must_use]
    pub const fn is_combinator(&self) -> bool {
        matches!(self, Self::Combinator(_))
    }

    /// Returns the combinator symbol, if any.
    #[must_use]
    pub fn as_combinator(&self) -> Option<&str> {
        match self {
            Self::Combinator(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the maximum group nesting below and including this token.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Group { tokens, .. } => 1 + tokens.iter().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(text) | Self::Combinator(text) => f.write_str(text),
            Self::Group {
                prefix,
                tokens,
                suffix,
            } => {
                f.write_str(prefix)?;
                f.write_str("(")?;
                for token in tokens {
                    write!(f, "{token}")?;
                }
                f.write_str(")")?;
                f.write_str(suffix)
            }
        }
    }
}
