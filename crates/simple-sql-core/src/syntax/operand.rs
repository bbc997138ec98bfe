//! Operand classification.
//!
//! Turns one leaf of a clip into a tagged [`Operand`]. Classification is
//! purely lexical: parameter values are looked up when the clip is compiled.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::driver::Driver;
use crate::error::{Result, SyntaxError};
use crate::lexer::{Token, Tokenizer};
use crate::value::Value;

pub(crate) const IDENT: &str = r"[A-Za-z_]\w*|`(?:[^`\\]|\\.)+`";

static COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"^(?:(?P<alias>{IDENT})\.)?(?P<name>{IDENT}|\*)(?:(?P<arrow>->>?)(?P<path>'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|[^'"\s]+))?$"#
    ))
    .expect("Invalid column regex")
});

static PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:(\w+)$").expect("Invalid parameter regex"));

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?$").expect("Invalid number regex")
});

static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?s)(?P<name>[A-Za-z_]\w*)\((?P<args>.*)\)$").expect("Invalid function regex")
});

/// A JSON path applied to a column (`col->'$.a'`, `col->>$.a`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    /// The path, always starting with `$`.
    pub path: String,
    /// `->>` returns the unquoted scalar.
    pub unquote: bool,
}

/// A column reference: `[alias.]name[->path]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Optional table alias qualifier.
    pub table_alias: Option<String>,
    /// Column name, or `*` for a wildcard.
    pub name: String,
    /// Optional JSON path suffix.
    pub json_path: Option<JsonPath>,
}

impl ColumnRef {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table_alias: None,
            name: name.into(),
            json_path: None,
        }
    }

    /// Creates an alias-qualified column reference.
    #[must_use]
    pub fn qualified(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table_alias: Some(alias.into()),
            name: name.into(),
            json_path: None,
        }
    }

    /// Parses a column reference, returning `None` if `text` is not one.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::InvalidJsonPath`] when a JSON path suffix does
    /// not start with `$`.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let Some(caps) = COLUMN.captures(text) else {
            return Ok(None);
        };
        let json_path = match (caps.name("arrow"), caps.name("path")) {
            (Some(arrow), Some(path)) => {
                let path = unquote(path.as_str());
                if !path.starts_with('$') {
                    return Err(SyntaxError::InvalidJsonPath(path));
                }
                Some(JsonPath {
                    path,
                    unquote: arrow.as_str() == "->>",
                })
            }
            _ => None,
        };
        Ok(Some(Self {
            table_alias: caps.name("alias").map(|m| unquote(m.as_str())),
            name: unquote(&caps["name"]),
            json_path,
        }))
    }

    /// Returns true for a wildcard (`*` or `alias.*`).
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }

    /// Returns true for a bare column name with no alias and no JSON path.
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        self.table_alias.is_none() && self.json_path.is_none()
    }

    /// Renders the quoted column reference.
    #[must_use]
    pub fn sql(&self, driver: &Driver) -> String {
        let name = if self.is_wildcard() {
            String::from("*")
        } else {
            driver.quote_identifier(&self.name)
        };
        let column = match &self.table_alias {
            Some(alias) => format!("{}.{name}", driver.quote_identifier(alias)),
            None => name,
        };
        match &self.json_path {
            Some(json) => driver.dialect().json_path(&column, &json.path, json.unquote),
            None => column,
        }
    }
}

impl fmt::Display for ColumnRef {
    /// Writes the reference as it would be written in a syntax string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.table_alias {
            write_name(f, alias)?;
            f.write_str(".")?;
        }
        if self.is_wildcard() {
            f.write_str("*")?;
        } else {
            write_name(f, &self.name)?;
        }
        match &self.json_path {
            Some(json) => {
                let arrow = if json.unquote { "->>" } else { "->" };
                write!(f, "{arrow}'{}'", escape_quoted(&json.path, '\''))
            }
            None => Ok(()),
        }
    }
}

/// A classified operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `?`: resolved from the opposite column's bound parameter.
    Auto,
    /// A column reference.
    Column(ColumnRef),
    /// `:name`: a reference into the parameter bag.
    Parameter(String),
    /// A number, quoted string or bare `$` JSON path, emitted as a quoted string.
    Literal(String),
    /// A JSON array literal.
    Array(Vec<Value>),
    /// An array literal that failed to parse. Only raised when consumed.
    InvalidArray {
        /// The array text as written.
        text: String,
        /// The parse failure.
        message: String,
    },
    /// `null`, case-insensitive.
    Null,
    /// A function call such as `COUNT(*)` or `LOWER(name)`.
    Raw {
        /// Function name.
        name: String,
        /// Classified arguments.
        args: Vec<Operand>,
    },
}

impl Operand {
    /// Classifies one leaf.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::InvalidOperand`] when the leaf matches no
    /// operand form, or [`SyntaxError::InvalidJsonPath`] for a bad column path.
    pub fn classify(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SyntaxError::InvalidOperand(String::new()));
        }
        if text == "?" {
            return Ok(Self::Auto);
        }
        if let Some(caps) = PARAMETER.captures(text) {
            return Ok(Self::Parameter(caps[1].to_string()));
        }
        if text.starts_with('[') && text.ends_with(']') {
            return Ok(parse_array(text));
        }
        if text.eq_ignore_ascii_case("null") {
            return Ok(Self::Null);
        }
        if is_quoted(text) {
            return Ok(Self::Literal(unquote(text)));
        }
        if text.starts_with('$') || NUMBER.is_match(text) {
            return Ok(Self::Literal(text.to_string()));
        }
        if let Some(column) = ColumnRef::parse(text)? {
            if column.is_wildcard() {
                return Err(SyntaxError::InvalidOperand(text.to_string()));
            }
            return Ok(Self::Column(column));
        }
        if let Some(caps) = FUNCTION.captures(text) {
            return Ok(Self::Raw {
                name: caps["name"].to_uppercase(),
                args: parse_arguments(&caps["args"])?,
            });
        }
        Err(SyntaxError::InvalidOperand(text.to_string()))
    }

    /// Returns true if the operand is [`Operand::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the column reference, if any.
    #[must_use]
    pub const fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Self::Column(column) => Some(column),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    /// Writes the operand in its syntax form, e.g. `u.id`, `:name` or `[1,2]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("?"),
            Self::Column(column) => write!(f, "{column}"),
            Self::Parameter(name) => write!(f, ":{name}"),
            Self::Literal(text) if text.starts_with('$') || NUMBER.is_match(text) => {
                f.write_str(text)
            }
            Self::Literal(text) => write!(f, "'{}'", escape_quoted(text, '\'')),
            Self::Array(values) => {
                let json = Value::Array(values.clone())
                    .to_json()
                    .map_err(|_| fmt::Error)?;
                write!(f, "{json}")
            }
            Self::InvalidArray { text, .. } => f.write_str(text),
            Self::Null => f.write_str("null"),
            Self::Raw { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let plain = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        f.write_str(name)
    } else {
        write!(f, "`{}`", escape_quoted(name, '`'))
    }
}

/// Backslash-escapes backslashes and `quote`, the inverse of [`unquote`].
fn escape_quoted(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn parse_array(text: &str) -> Operand {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Array(values)) => {
            Operand::Array(values.into_iter().map(Value::from).collect())
        }
        Ok(other) => Operand::InvalidArray {
            text: text.to_string(),
            message: format!("expected an array, found {other}"),
        },
        Err(e) => Operand::InvalidArray {
            text: text.to_string(),
            message: e.to_string(),
        },
    }
}

/// Classifies function arguments; `*` and `alias.*` are allowed here.
fn parse_arguments(text: &str) -> Result<Vec<Operand>> {
    let tokens = Tokenizer::new(&[","]).tokenize(text)?;
    let mut args = Vec::new();
    let mut expect_operand = true;
    for token in tokens {
        match token {
            Token::Leaf(leaf) if expect_operand => {
                let operand = match ColumnRef::parse(&leaf)? {
                    Some(column) if column.is_wildcard() => Operand::Column(column),
                    _ => Operand::classify(&leaf)?,
                };
                args.push(operand);
                expect_operand = false;
            }
            Token::Combinator(_) if !expect_operand => expect_operand = true,
            Token::Combinator(c) => return Err(SyntaxError::Combinator(c)),
            other => return Err(SyntaxError::InvalidOperand(other.to_string())),
        }
    }
    if expect_operand && !args.is_empty() {
        return Err(SyntaxError::Combinator(String::from(",")));
    }
    Ok(args)
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('\'') && text.ends_with('\'')))
}

/// Strips surrounding quotes or backticks and resolves backslash escapes.
pub(crate) fn unquote(text: &str) -> String {
    let inner = if text.len() >= 2
        && (is_quoted(text) || (text.starts_with('`') && text.ends_with('`')))
    {
        &text[1..text.len() - 1]
    } else {
        return text.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
