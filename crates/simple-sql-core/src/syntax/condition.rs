//! Condition compiler for WHERE, HAVING and join `ON` clauses.

use super::compare::{compile_compare, compile_flag, Operator};
use super::operand::Operand;
use super::CompileContext;
use crate::error::{Result, SyntaxError};
use crate::lexer::{Token, Tokenizer};

/// A parsed condition.
///
/// `,` binds tighter than `|`, matching SQL's AND/OR precedence, so the
/// compiled text needs no parentheses beyond the ones written in the syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Clips joined by `,`.
    And(Vec<Expr>),
    /// Clips joined by `|`.
    Or(Vec<Expr>),
    /// An odd number of `!` in front of a clip or group.
    Not(Box<Expr>),
    /// A parenthesized group.
    Group(Box<Expr>),
    /// A single operand used as a boolean.
    Flag(Operand),
    /// `left op right`.
    Compare {
        /// Left operand.
        left: Operand,
        /// Operator.
        op: Operator,
        /// Right operand.
        right: Operand,
    },
}

/// A parsed condition syntax such as `a=1,(b|=[2,3]|!c)`.
///
/// The syntax is parsed once; [`WhereSyntax::compile`] re-resolves parameter
/// values on every call, so one instance can be compiled repeatedly against
/// different bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereSyntax {
    source: String,
    expr: Option<Expr>,
}

impl WhereSyntax {
    /// Parses a condition syntax.
    ///
    /// # Errors
    ///
    /// Returns an error for tokenize failures, misplaced combinators,
    /// malformed clips, double auto-references and invalid operands.
    pub fn parse(syntax: &str) -> Result<Self> {
        let tokenizer = Tokenizer::new(&[",", "|"]).with_operators(&Operator::SYMBOLS);
        let tokens = tokenizer.tokenize(syntax)?;
        let expr = parse_sequence(&tokens, &tokenizer)?;
        Ok(Self {
            source: syntax.to_string(),
            expr,
        })
    }

    /// Returns the syntax as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed tree, `None` for an empty syntax.
    #[must_use]
    pub const fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    /// Returns true if the syntax has no clip.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Compiles the condition, `None` for an empty syntax.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error met; no partial text is produced.
    pub fn compile(&self, ctx: &CompileContext<'_>) -> Result<Option<String>> {
        self.expr.as_ref().map(|e| compile_expr(e, ctx)).transpose()
    }
}

fn parse_sequence(tokens: &[Token], tokenizer: &Tokenizer<'_>) -> Result<Option<Expr>> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut or_terms = Vec::new();
    let mut and_terms = Vec::new();
    let mut expect_operand = true;

    for token in tokens {
        match token {
            Token::Combinator(c) => {
                if expect_operand {
                    return Err(SyntaxError::Combinator(c.clone()));
                }
                if c == "|" {
                    or_terms.push(collapse(std::mem::take(&mut and_terms), Expr::And));
                }
                expect_operand = true;
            }
            other => {
                if !expect_operand {
                    return Err(SyntaxError::MalformedClip(other.to_string()));
                }
                and_terms.push(parse_clip(other, tokenizer)?);
                expect_operand = false;
            }
        }
    }
    if expect_operand {
        let last = tokens.last().map(ToString::to_string).unwrap_or_default();
        return Err(SyntaxError::Combinator(last));
    }
    or_terms.push(collapse(and_terms, Expr::And));
    Ok(Some(collapse(or_terms, Expr::Or)))
}

fn collapse(mut items: Vec<Expr>, join: fn(Vec<Expr>) -> Expr) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        join(items)
    }
}

fn parse_clip(token: &Token, tokenizer: &Tokenizer<'_>) -> Result<Expr> {
    match token {
        Token::Leaf(leaf) => parse_leaf(leaf, tokenizer),
        Token::Group {
            prefix,
            tokens,
            suffix,
        } => {
            let bangs = count_negation(prefix)
                .ok_or_else(|| SyntaxError::MalformedClip(token.to_string()))?;
            if !suffix.is_empty() {
                return Err(SyntaxError::MalformedClip(token.to_string()));
            }
            let inner = parse_sequence(tokens, tokenizer)?
                .ok_or_else(|| SyntaxError::MalformedClip(token.to_string()))?;
            Ok(negate(Expr::Group(Box::new(inner)), bangs))
        }
        Token::Combinator(c) => Err(SyntaxError::Combinator(c.clone())),
    }
}

fn parse_leaf(leaf: &str, tokenizer: &Tokenizer<'_>) -> Result<Expr> {
    let body = leaf.trim_start_matches(|c: char| c == '!' || c.is_whitespace());
    let bangs = leaf[..leaf.len() - body.len()].matches('!').count();
    let parts = tokenizer.split_clip(body)?;

    let expr = match parts.as_slice() {
        [single] => Expr::Flag(Operand::classify(single)?),
        [left, symbol, right] => {
            let mut op = Operator::from_symbol(symbol)
                .ok_or_else(|| SyntaxError::MalformedClip(leaf.to_string()))?;
            let mut left = Operand::classify(left)?;
            let mut right = Operand::classify(right)?;
            if left == Operand::Auto && right == Operand::Auto {
                return Err(SyntaxError::DoubleAutoReference(leaf.to_string()));
            }
            let parameter_left = matches!(left, Operand::Parameter(_))
                && !matches!(right, Operand::Parameter(_));
            if parameter_left || left == Operand::Auto {
                std::mem::swap(&mut left, &mut right);
                op = op.mirrored();
            }
            Expr::Compare { left, op, right }
        }
        _ => return Err(SyntaxError::MalformedClip(leaf.to_string())),
    };
    Ok(negate(expr, bangs))
}

/// Counts a prefix made only of `!`, `None` if anything else is present.
fn count_negation(prefix: &str) -> Option<usize> {
    prefix
        .chars()
        .filter(|c| !c.is_whitespace())
        .try_fold(0_usize, |n, c| (c == '!').then_some(n + 1))
}

fn negate(expr: Expr, bangs: usize) -> Expr {
    if bangs % 2 == 1 {
        Expr::Not(Box::new(expr))
    } else {
        expr
    }
}

fn compile_expr(expr: &Expr, ctx: &CompileContext<'_>) -> Result<String> {
    match expr {
        Expr::And(items) => join(items, " AND ", ctx),
        Expr::Or(items) => join(items, " OR ", ctx),
        Expr::Group(inner) => Ok(format!("({})", compile_expr(inner, ctx)?)),
        Expr::Flag(operand) => compile_flag(operand, false, ctx),
        Expr::Compare { left, op, right } => compile_compare(left, *op, right, false, ctx),
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Compare { left, op, right } => compile_compare(left, *op, right, true, ctx),
            Expr::Flag(operand) => compile_flag(operand, true, ctx),
            Expr::Group(group) => Ok(ctx.driver.dialect().negate(&compile_expr(group, ctx)?)),
            other => Ok(ctx.driver.dialect().negate(&compile_expr(other, ctx)?)),
        },
    }
}

fn join(items: &[Expr], separator: &str, ctx: &CompileContext<'_>) -> Result<String> {
    let parts = items
        .iter()
        .map(|e| compile_expr(e, ctx))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use crate::syntax::ColumnRef;
    use crate::value::Parameters;

    fn compile(syntax: &str) -> String {
        let driver = Driver::default();
        let params = Parameters::new();
        WhereSyntax::parse(syntax)
            .unwrap()
            .compile(&CompileContext::new(&driver, &params))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_parse_precedence() {
        let syntax = WhereSyntax::parse("a,b|c").unwrap();
        let column = |n: &str| Expr::Flag(Operand::Column(ColumnRef::new(n)));
        assert_eq!(
            syntax.expr(),
            Some(&Expr::Or(vec![
                Expr::And(vec![column("a"), column("b")]),
                column("c"),
            ]))
        );
    }

    #[test]
    fn test_parse_swaps_parameter_to_the_right() {
        let syntax = WhereSyntax::parse(":min<age").unwrap();
        assert_eq!(
            syntax.expr(),
            Some(&Expr::Compare {
                left: Operand::Column(ColumnRef::new("age")),
                op: Operator::Gt,
                right: Operand::Parameter(String::from("min")),
            })
        );
    }

    #[test]
    fn test_negation_runs_cancel() {
        let once = WhereSyntax::parse("!a=1").unwrap();
        let twice = WhereSyntax::parse("!!a=1").unwrap();
        let thrice = WhereSyntax::parse("!!!a=1").unwrap();
        assert!(matches!(once.expr(), Some(Expr::Not(_))));
        assert!(matches!(twice.expr(), Some(Expr::Compare { .. })));
        assert_eq!(once.expr(), thrice.expr());
    }

    #[test]
    fn test_empty_syntax() {
        let syntax = WhereSyntax::parse("  ").unwrap();
        assert!(syntax.is_empty());
        let driver = Driver::default();
        let params = Parameters::new();
        assert_eq!(
            syntax
                .compile(&CompileContext::new(&driver, &params))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_combinator_errors() {
        for syntax in [",a=1", "a=1,", "a=1,,b=2", "a=1|,b=2", "|"] {
            assert!(
                matches!(WhereSyntax::parse(syntax), Err(SyntaxError::Combinator(_))),
                "expected combinator error for {syntax}"
            );
        }
    }

    #[test]
    fn test_clip_errors() {
        assert!(matches!(
            WhereSyntax::parse("a=b=c"),
            Err(SyntaxError::MalformedClip(_))
        ));
        assert!(matches!(
            WhereSyntax::parse("?=?"),
            Err(SyntaxError::DoubleAutoReference(_))
        ));
        assert!(matches!(
            WhereSyntax::parse("x(a=1)"),
            Err(SyntaxError::InvalidOperand(_))
        ));
        assert!(matches!(
            WhereSyntax::parse("(a=1)b"),
            Err(SyntaxError::MalformedClip(_))
        ));
        assert!(matches!(
            WhereSyntax::parse("()"),
            Err(SyntaxError::MalformedClip(_))
        ));
    }

    #[test]
    fn test_group_and_negated_group() {
        assert_eq!(compile("(a=1|b=2),c"), "(`a` = '1' OR `b` = '2') AND `c`");
        assert_eq!(compile("!(a=1|b=2)"), "!(`a` = '1' OR `b` = '2')");
        assert_eq!(compile("!!(a=1)"), "(`a` = '1')");
    }
}
