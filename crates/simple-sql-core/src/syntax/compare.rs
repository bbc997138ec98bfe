//! Comparison operators and their SQL shapes.

use super::operand::Operand;
use super::CompileContext;
use crate::error::{Result, SyntaxError};
use crate::value::Value;

/// A comparison operator of the condition syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `|=`: membership.
    Membership,
    /// `*=`: contains.
    Contains,
    /// `^=`: starts with.
    StartsWith,
    /// `$=`: ends with.
    EndsWith,
    /// `#=`: regular expression.
    Regexp,
    /// `@=`: JSON key exists.
    JsonKeyExists,
    /// `:=`: JSON path exists.
    JsonPathExists,
    /// `~=`: JSON contains value.
    JsonContains,
    /// `&=`: JSON search value.
    JsonSearch,
    /// `><`: between.
    Between,
    /// `<>`: not between.
    NotBetween,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    GtEq,
    /// `<=`
    LtEq,
}

impl Operator {
    /// Every operator symbol, used to split clips.
    pub const SYMBOLS: [&'static str; 17] = [
        "=", "!=", "|=", "*=", "^=", "$=", "#=", "@=", ":=", "~=", "&=", "><", "<>", ">", "<",
        ">=", "<=",
    ];

    /// Looks up an operator by symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => Self::Eq,
            "!=" => Self::NotEq,
            "|=" => Self::Membership,
            "*=" => Self::Contains,
            "^=" => Self::StartsWith,
            "$=" => Self::EndsWith,
            "#=" => Self::Regexp,
            "@=" => Self::JsonKeyExists,
            ":=" => Self::JsonPathExists,
            "~=" => Self::JsonContains,
            "&=" => Self::JsonSearch,
            "><" => Self::Between,
            "<>" => Self::NotBetween,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::GtEq,
            "<=" => Self::LtEq,
            _ => return None,
        })
    }

    /// Returns the symbol as written in the syntax.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Membership => "|=",
            Self::Contains => "*=",
            Self::StartsWith => "^=",
            Self::EndsWith => "$=",
            Self::Regexp => "#=",
            Self::JsonKeyExists => "@=",
            Self::JsonPathExists => ":=",
            Self::JsonContains => "~=",
            Self::JsonSearch => "&=",
            Self::Between => "><",
            Self::NotBetween => "<>",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::GtEq => ">=",
            Self::LtEq => "<=",
        }
    }

    /// Returns the operator to use once both operands are swapped.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Gt => Self::Lt,
            Self::Lt => Self::Gt,
            Self::GtEq => Self::LtEq,
            Self::LtEq => Self::GtEq,
            other => other,
        }
    }

    const fn ordering_sql(self) -> Option<&'static str> {
        match self {
            Self::Gt => Some(">"),
            Self::Lt => Some("<"),
            Self::GtEq => Some(">="),
            Self::LtEq => Some("<="),
            _ => None,
        }
    }
}

/// An operand resolved against the current parameter values.
#[derive(Debug, Clone)]
enum Term {
    /// Rendered column reference or function call.
    Column(String),
    /// A scalar value.
    Value(Value),
    /// A list of values.
    Array(Vec<Value>),
    /// NULL-typed operand.
    Null,
    /// A nested statement, already wrapped in parentheses.
    Sql(String),
    /// A malformed array literal; raised when rendered.
    Invalid { text: String, message: String },
}

impl Term {
    fn from_value(value: &Value, ctx: &CompileContext<'_>) -> Result<Self> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Array(values) => Self::Array(values.clone()),
            Value::Statement(_) => Self::Sql(ctx.driver.value_sql(value)?),
            other => Self::Value(other.clone()),
        })
    }

    fn invalid_error(&self) -> Option<SyntaxError> {
        match self {
            Self::Invalid { text, message } => {
                Some(SyntaxError::invalid_array(text.clone(), message.clone()))
            }
            _ => None,
        }
    }
}

/// Resolves an operand. `?` is resolved from `other`'s column name.
fn resolve(operand: &Operand, other: &Operand, ctx: &CompileContext<'_>) -> Result<Term> {
    Ok(match operand {
        Operand::Column(column) => Term::Column(column.sql(ctx.driver)),
        Operand::Raw { name, args } => {
            let args = args
                .iter()
                .map(|arg| render(&resolve(arg, &Operand::Null, ctx)?, ctx))
                .collect::<Result<Vec<_>>>()?;
            Term::Column(format!("{name}({})", args.join(", ")))
        }
        Operand::Parameter(name) => match ctx.params.get_value(name) {
            Some(value) => Term::from_value(value, ctx)?,
            None => Term::Null,
        },
        Operand::Literal(text) => Term::Value(Value::Text(text.clone())),
        Operand::Array(values) => Term::Array(values.clone()),
        Operand::InvalidArray { text, message } => Term::Invalid {
            text: text.clone(),
            message: message.clone(),
        },
        Operand::Null => Term::Null,
        Operand::Auto => {
            let Some(column) = other.as_column() else {
                return Err(SyntaxError::InvalidOperand(String::from(
                    "? must be compared with a column",
                )));
            };
            match ctx.params.get_value(&column.name) {
                Some(value) => Term::from_value(value, ctx)?,
                None => Term::Null,
            }
        }
    })
}

fn render(term: &Term, ctx: &CompileContext<'_>) -> Result<String> {
    if let Some(err) = term.invalid_error() {
        return Err(err);
    }
    Ok(match term {
        Term::Column(sql) | Term::Sql(sql) => sql.clone(),
        Term::Value(value) => ctx.driver.value_sql(value)?,
        Term::Array(values) => ctx.driver.value_sql(&Value::Array(values.clone()))?,
        Term::Null | Term::Invalid { .. } => String::from("NULL"),
    })
}

/// Renders a term as a JSON document argument.
fn render_json(term: &Term, ctx: &CompileContext<'_>) -> Result<String> {
    match term {
        Term::Value(value) => Ok(ctx.driver.quote_string(&value.to_json()?.to_string())),
        Term::Null => Ok(ctx.driver.quote_string("null")),
        other => render(other, ctx),
    }
}

fn render_list(values: &[Value], ctx: &CompileContext<'_>) -> Result<String> {
    let items = values
        .iter()
        .map(|v| ctx.driver.value_sql(v))
        .collect::<Result<Vec<_>>>()?;
    Ok(items.join(", "))
}

fn is_null_check(left: &str, negated: bool) -> String {
    if negated {
        format!("{left} IS NOT NULL")
    } else {
        format!("{left} IS NULL")
    }
}

fn require_json(op: Operator, ctx: &CompileContext<'_>) -> Result<()> {
    let dialect = ctx.driver.dialect();
    if dialect.supports_json_functions() {
        Ok(())
    } else {
        Err(SyntaxError::Unsupported {
            operator: op.symbol().to_string(),
            dialect: dialect.name(),
        })
    }
}

/// Compiles `left op right`, negated when `negated` is set.
pub(crate) fn compile_compare(
    left: &Operand,
    op: Operator,
    right: &Operand,
    negated: bool,
    ctx: &CompileContext<'_>,
) -> Result<String> {
    let mut l = resolve(left, right, ctx)?;
    let mut r = resolve(right, left, ctx)?;
    if let Some(err) = l.invalid_error() {
        return Err(err);
    }
    if let Some(err) = r.invalid_error() {
        return Err(err);
    }
    let dialect = ctx.driver.dialect();

    match op {
        Operator::Eq | Operator::NotEq => {
            let negated = negated ^ (op == Operator::NotEq);
            if matches!(l, Term::Null) && !matches!(r, Term::Null) {
                std::mem::swap(&mut l, &mut r);
            }
            let lhs = render(&l, ctx)?;
            Ok(match &r {
                Term::Null => is_null_check(&lhs, negated),
                Term::Array(values) => in_list(&lhs, values, negated, ctx)?,
                other => {
                    let sign = if negated { "<>" } else { "=" };
                    format!("{lhs} {sign} {}", render(other, ctx)?)
                }
            })
        }
        Operator::Membership => {
            if let Term::Column(lhs) = &l {
                return Ok(match &r {
                    Term::Null => is_null_check(lhs, negated),
                    Term::Array(values) => in_list(lhs, values, negated, ctx)?,
                    Term::Sql(sql) => format!("{lhs} {}{sql}", in_keyword(negated)),
                    other => format!("{lhs} {}({})", in_keyword(negated), render(other, ctx)?),
                });
            }
            require_json(op, ctx)?;
            let expr = format!(
                "JSON_CONTAINS({}, {}, '$') > 0",
                render_json(&l, ctx)?,
                render_json(&r, ctx)?
            );
            Ok(negate_if(&expr, negated, ctx))
        }
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let lhs = render(&l, ctx)?;
            let (before, after) = match op {
                Operator::Contains => ("%", "%"),
                Operator::StartsWith => ("", "%"),
                _ => ("%", ""),
            };
            let pattern = match &r {
                Term::Null => return Ok(is_null_check(&lhs, negated)),
                Term::Value(value) => {
                    let text = escape_like(&scalar_text(value)?);
                    format!(
                        "{}{}",
                        ctx.driver.quote_string(&format!("{before}{text}{after}")),
                        dialect.like_escape()
                    )
                }
                Term::Array(_) => {
                    return Err(SyntaxError::InvalidOperand(format!(
                        "array operand for `{}`",
                        op.symbol()
                    )))
                }
                other => {
                    let mut parts = Vec::new();
                    if !before.is_empty() {
                        parts.push(String::from("'%'"));
                    }
                    parts.push(render(other, ctx)?);
                    if !after.is_empty() {
                        parts.push(String::from("'%'"));
                    }
                    dialect.concat(&parts)
                }
            };
            let keyword = if negated { "NOT LIKE" } else { "LIKE" };
            Ok(format!("{lhs} {keyword} {pattern}"))
        }
        Operator::Regexp => Ok(format!(
            "{} {} {}",
            render(&l, ctx)?,
            dialect.regexp_operator(negated),
            render(&r, ctx)?
        )),
        Operator::JsonKeyExists => {
            require_json(op, ctx)?;
            let keys = format!("JSON_KEYS({})", render(&l, ctx)?);
            if let Term::Array(values) = &r {
                let json = Value::Array(values.clone()).to_json()?;
                let expr = format!(
                    "JSON_OVERLAPS({keys}, {})",
                    ctx.driver.quote_string(&json.to_string())
                );
                return Ok(negate_if(&expr, negated, ctx));
            }
            Ok(is_null_check(
                &format!("JSON_SEARCH({keys}, 'one', {})", render(&r, ctx)?),
                !negated,
            ))
        }
        Operator::JsonPathExists => {
            let path = match &r {
                Term::Value(Value::Text(path)) if path.starts_with('$') => path.clone(),
                Term::Value(value) => {
                    return Err(SyntaxError::InvalidJsonPath(scalar_text(value)?))
                }
                other => return Err(SyntaxError::InvalidJsonPath(render(other, ctx)?)),
            };
            Ok(is_null_check(
                &dialect.json_extract(&render(&l, ctx)?, &path),
                !negated,
            ))
        }
        Operator::JsonContains => {
            require_json(op, ctx)?;
            let expr = format!(
                "JSON_CONTAINS({}, {}) = 1",
                render(&l, ctx)?,
                render_json(&r, ctx)?
            );
            Ok(negate_if(&expr, negated, ctx))
        }
        Operator::JsonSearch => {
            require_json(op, ctx)?;
            Ok(is_null_check(
                &format!("JSON_SEARCH({}, 'one', {})", render(&l, ctx)?, render(&r, ctx)?),
                !negated,
            ))
        }
        Operator::Between | Operator::NotBetween => {
            let negated = negated ^ (op == Operator::NotBetween);
            let Term::Array(values) = &r else {
                return Err(SyntaxError::invalid_array(
                    right.to_string(),
                    "BETWEEN needs a two element array",
                ));
            };
            let [low, high] = values.as_slice() else {
                return Err(SyntaxError::invalid_array(
                    right.to_string(),
                    format!("BETWEEN needs 2 elements, found {}", values.len()),
                ));
            };
            let keyword = if negated { "NOT BETWEEN" } else { "BETWEEN" };
            Ok(format!(
                "{} {keyword} {} AND {}",
                render(&l, ctx)?,
                ctx.driver.value_sql(low)?,
                ctx.driver.value_sql(high)?
            ))
        }
        Operator::Gt | Operator::Lt | Operator::GtEq | Operator::LtEq => {
            let sign = op.ordering_sql().unwrap_or(">");
            let expr = format!("{} {sign} {}", render(&l, ctx)?, render(&r, ctx)?);
            Ok(negate_if(&expr, negated, ctx))
        }
    }
}

/// Compiles a single operand used as a boolean.
///
/// A NULL-typed operand is always false (`0`), or always true (`1`) when negated.
pub(crate) fn compile_flag(
    operand: &Operand,
    negated: bool,
    ctx: &CompileContext<'_>,
) -> Result<String> {
    match resolve(operand, &Operand::Null, ctx)? {
        Term::Null => Ok(String::from(if negated { "1" } else { "0" })),
        Term::Array(_) => Err(SyntaxError::InvalidOperand(operand.to_string())),
        term => Ok(negate_if(&render(&term, ctx)?, negated, ctx)),
    }
}

/// Renders an operand on its own, as in a select list or an update value.
pub(crate) fn compile_operand(operand: &Operand, ctx: &CompileContext<'_>) -> Result<String> {
    match resolve(operand, &Operand::Null, ctx)? {
        Term::Array(_) => Err(SyntaxError::InvalidOperand(operand.to_string())),
        term => render(&term, ctx),
    }
}

const fn in_keyword(negated: bool) -> &'static str {
    if negated {
        "NOT IN"
    } else {
        "IN"
    }
}

/// `IN(...)` for a non-empty list; an empty list becomes a NULL check.
fn in_list(lhs: &str, values: &[Value], negated: bool, ctx: &CompileContext<'_>) -> Result<String> {
    if values.is_empty() {
        return Ok(is_null_check(lhs, negated));
    }
    Ok(format!(
        "{lhs} {}({})",
        in_keyword(negated),
        render_list(values, ctx)?
    ))
}

fn negate_if(expr: &str, negated: bool, ctx: &CompileContext<'_>) -> String {
    if negated {
        ctx.driver.dialect().negate(expr)
    } else {
        expr.to_string()
    }
}

fn scalar_text(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Text(text) => text.clone(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        other => return Err(SyntaxError::InvalidOperand(other.to_json()?.to_string())),
    })
}

/// Escapes LIKE wildcards so a bound value matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
