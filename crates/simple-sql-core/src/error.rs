//! Error types for syntax parsing and SQL compilation.

use thiserror::Error;

/// Errors raised while parsing a Simple Syntax string or compiling it to SQL.
///
/// Every failure is synchronous: a compile either returns the full SQL text
/// or one of these errors, never a partial statement.
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// The tokenizer could not split the input (unbalanced parenthesis,
    /// unterminated quote or bracket).
    #[error("tokenize error at position {position}: {message}")]
    Tokenize {
        /// Byte offset where the problem was detected.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// A leading, trailing or doubled combinator.
    #[error("unexpected combinator `{0}`")]
    Combinator(String),

    /// A clip that does not split into one or three operands.
    #[error("malformed clip `{0}`")]
    MalformedClip(String),

    /// Both sides of a comparison are `?`.
    #[error("both operands of `{0}` are auto-references")]
    DoubleAutoReference(String),

    /// A JSON path operand that does not start with `$`.
    #[error("invalid JSON path `{0}`, a path must start with `$`")]
    InvalidJsonPath(String),

    /// A leaf that classifies as no known operand, or an operand used where
    /// its kind is not allowed.
    #[error("invalid operand `{0}`")]
    InvalidOperand(String),

    /// A malformed array literal consumed as an array.
    #[error("invalid array `{text}`: {message}")]
    InvalidArray {
        /// The array text as written.
        text: String,
        /// Parse failure or shape mismatch.
        message: String,
    },

    /// A token inside a `[:...]` USING bracket is not a plain column name.
    #[error("invalid USING column `{0}`")]
    InvalidUsing(String),

    /// A condition bracket is missing, misplaced or forbidden.
    #[error("condition bracket error: {0}")]
    ConditionBracket(String),

    /// A join leaf that does not match `[alias.]table[->Preset(args)][bracket]`.
    #[error("invalid join syntax `{0}`")]
    InvalidJoin(String),

    /// A preset name with no constructor in the registry.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),

    /// A preset rejected its arguments.
    #[error("invalid arguments for preset `{preset}`: {message}")]
    PresetArguments {
        /// Preset name.
        preset: String,
        /// What was wrong with the arguments.
        message: String,
    },

    /// One join alias names two different presets.
    #[error("alias `{alias}` already uses preset `{existing}`, not `{requested}`")]
    PresetConflict {
        /// The join alias.
        alias: String,
        /// Preset registered first under the alias.
        existing: String,
        /// Preset named by the later reference.
        requested: String,
    },

    /// An update expression list that produced no assignment.
    #[error("no valid update expression for table `{0}`")]
    EmptyUpdate(String),

    /// An empty table or column name.
    #[error("empty {0} name")]
    EmptyName(&'static str),

    /// An operator the active dialect cannot express.
    #[error("operator `{operator}` is not supported by the {dialect} dialect")]
    Unsupported {
        /// Operator symbol as written.
        operator: String,
        /// Dialect name.
        dialect: &'static str,
    },

    /// Driver configuration could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SyntaxError {
    pub(crate) fn tokenize(position: usize, message: impl Into<String>) -> Self {
        Self::Tokenize {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_array(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArray {
            text: text.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for syntax operations.
pub type Result<T> = std::result::Result<T, SyntaxError>;
