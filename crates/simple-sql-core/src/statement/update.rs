//! UPDATE statements.

use std::sync::LazyLock;

use regex::Regex;

use super::{compiled, pushed_clause, split_list, Statement};
use crate::driver::Driver;
use crate::error::{Result, SyntaxError};
use crate::syntax::{compile_operand, unquote, CompileContext, Operand, IDENT};
use crate::value::SqlSyntax;

static STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<col>{IDENT})\s*(?P<op>\+\+|--)$")).expect("Invalid step regex")
});

static ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?s)(?P<col>{IDENT})\s*(?P<op>[-+*/&])?=\s*(?P<expr>.+)$"
    ))
    .expect("Invalid assignment regex")
});

static BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<col>{IDENT})$")).expect("Invalid column regex")
});

#[derive(Debug)]
enum UpdateValue {
    Number(String),
    Operand(Operand),
}

#[derive(Debug)]
struct Assignment {
    column: String,
    op: Option<char>,
    value: UpdateValue,
}

impl Assignment {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(caps) = STEP.captures(text) {
            return Some(Self {
                column: unquote(&caps["col"]),
                op: Some(if &caps["op"] == "++" { '+' } else { '-' }),
                value: UpdateValue::Number(String::from("1")),
            });
        }
        if let Some(caps) = BARE.captures(text) {
            let column = unquote(&caps["col"]);
            return Some(Self {
                value: UpdateValue::Operand(Operand::Parameter(column.clone())),
                column,
                op: None,
            });
        }
        let caps = ASSIGN.captures(text)?;
        let column = unquote(&caps["col"]);
        let expr = caps["expr"].trim();
        let value = if expr.parse::<f64>().is_ok_and(f64::is_finite) {
            UpdateValue::Number(expr.to_string())
        } else {
            match Operand::classify(expr).ok()? {
                Operand::Auto => UpdateValue::Operand(Operand::Parameter(column.clone())),
                Operand::Array(_) | Operand::InvalidArray { .. } => return None,
                operand => UpdateValue::Operand(operand),
            }
        };
        Some(Self {
            column,
            op: caps.name("op").and_then(|m| m.as_str().chars().next()),
            value,
        })
    }

    fn sql(&self, ctx: &CompileContext<'_>) -> Result<String> {
        let column = ctx.driver.quote_identifier(&self.column);
        let value = match &self.value {
            UpdateValue::Number(number) => number.clone(),
            UpdateValue::Operand(operand) => compile_operand(operand, ctx)?,
        };
        Ok(match self.op {
            Some(op) => format!("{column} = {column} {op} {value}"),
            None => format!("{column} = {value}"),
        })
    }
}

/// UPDATE clause state.
#[derive(Debug)]
pub struct Update {
    table: String,
    assignments: Vec<Assignment>,
}

impl Statement<Update> {
    /// Creates an UPDATE statement from comma separated expressions.
    ///
    /// Each expression is `col++`, `col--`, `col OP= value` with OP one of
    /// `+ - * / &`, `col=value`, or a bare `col` standing for `col=:col`.
    /// Expressions matching none of these are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::EmptyUpdate`] if no expression is usable.
    pub fn update(driver: Driver, table: &str, exprs: &str) -> Result<Self> {
        driver.table_name(table)?;
        let mut assignments = Vec::new();
        for expr in split_list(exprs)? {
            match Assignment::parse(&expr) {
                Some(assignment) => assignments.push(assignment),
                None => tracing::warn!(table, expr = %expr, "dropped unrecognized update expression"),
            }
        }
        if assignments.is_empty() {
            return Err(SyntaxError::EmptyUpdate(table.to_string()));
        }
        Ok(Self::with_kind(
            driver,
            Update {
                table: table.to_string(),
                assignments,
            },
        ))
    }
}

impl SqlSyntax for Statement<Update> {
    fn syntax(&self) -> Result<String> {
        let ctx = self.context();
        let sets = self
            .kind
            .assignments
            .iter()
            .map(|a| a.sql(&ctx))
            .collect::<Result<Vec<_>>>()?;
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.driver.table_name(&self.kind.table)?,
            sets.join(", ")
        );
        pushed_clause(&mut sql, "WHERE", self.where_syntax()?);
        Ok(compiled("update", sql))
    }
}
