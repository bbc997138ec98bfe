//! SELECT statements.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use super::{compiled, pushed_clause, split_list, Statement};
use crate::driver::Driver;
use crate::error::{Result, SyntaxError};
use crate::syntax::{
    compile_operand, unquote, ColumnRef, CompileContext, Operand, PresetRegistry, TableJoinSyntax,
    WhereSyntax, IDENT,
};
use crate::value::SqlSyntax;

static ALIASED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)^(?P<expr>.+?)\s+AS\s+(?P<alias>{IDENT})$"))
        .expect("Invalid alias regex")
});

#[derive(Debug)]
struct SelectColumn {
    operand: Operand,
    alias: Option<String>,
}

#[derive(Debug)]
enum OrderKey {
    Column(ColumnRef),
    Expr(WhereSyntax),
}

#[derive(Debug)]
struct OrderItem {
    key: OrderKey,
    descending: bool,
}

/// SELECT clause state.
#[derive(Debug)]
pub struct Select {
    distinct: bool,
    columns: Vec<SelectColumn>,
    from: Option<TableJoinSyntax>,
    subqueries: HashMap<String, Rc<dyn SqlSyntax>>,
    presets: PresetRegistry,
    group: Vec<Operand>,
    having: Option<WhereSyntax>,
    order: Vec<OrderItem>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Statement<Select> {
    /// Creates a SELECT statement.
    ///
    /// `columns` is a comma separated list of `*`, `alias.*`, column
    /// references (JSON paths allowed), function calls, literals and
    /// parameters, each optionally followed by `AS name`.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or unparsable column list.
    pub fn select(driver: Driver, columns: &str) -> Result<Self> {
        let columns = split_list(columns)?
            .iter()
            .map(|item| parse_column(item))
            .collect::<Result<Vec<_>>>()?;
        if columns.is_empty() {
            return Err(SyntaxError::EmptyName("column"));
        }
        Ok(Self::with_kind(
            driver,
            Select {
                distinct: false,
                columns,
                from: None,
                subqueries: HashMap::new(),
                presets: PresetRegistry::new(),
                group: Vec::new(),
                having: None,
                order: Vec::new(),
                limit: None,
                offset: None,
            },
        ))
    }

    /// Emits `SELECT DISTINCT`.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.kind.distinct = true;
        self
    }

    /// Sets the preset registry used by [`Statement::from`]. Call it first.
    #[must_use]
    pub fn with_presets(mut self, presets: PresetRegistry) -> Self {
        self.kind.presets = presets;
        self
    }

    /// Registers a sub-query usable as a table name in the join syntax.
    #[must_use]
    pub fn register_subquery(mut self, name: &str, statement: Rc<dyn SqlSyntax>) -> Self {
        if let Some(from) = &mut self.kind.from {
            from.register_subquery(name, Rc::clone(&statement));
        }
        self.kind.subqueries.insert(name.to_string(), statement);
        self
    }

    /// Sets the FROM clause from a join syntax.
    ///
    /// # Errors
    ///
    /// Returns an error if the join syntax does not parse.
    pub fn from(mut self, syntax: &str) -> Result<Self> {
        let mut join = TableJoinSyntax::parse(syntax, &self.driver, &self.kind.presets)?;
        for (name, statement) in &self.kind.subqueries {
            join.register_subquery(name.clone(), Rc::clone(statement));
        }
        self.kind.from = Some(join);
        Ok(self)
    }

    /// Sets the GROUP BY list.
    ///
    /// # Errors
    ///
    /// Returns an error for an item that is not a column or function call.
    pub fn group(mut self, columns: &str) -> Result<Self> {
        self.kind.group = split_list(columns)?
            .iter()
            .map(|item| match Operand::classify(item)? {
                operand @ (Operand::Column(_) | Operand::Raw { .. }) => Ok(operand),
                _ => Err(SyntaxError::InvalidOperand(item.clone())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// Sets the HAVING condition.
    ///
    /// # Errors
    ///
    /// Returns an error if the condition syntax does not parse.
    pub fn having(mut self, syntax: &str) -> Result<Self> {
        self.kind.having = Some(WhereSyntax::parse(syntax)?);
        Ok(self)
    }

    /// Sets the ORDER BY list.
    ///
    /// Each item is a column or a condition, prefixed with `<` for ascending
    /// (the default) or `>` for descending order. An item that is not a
    /// column reference is compiled as a condition and sorts by its result.
    ///
    /// # Errors
    ///
    /// Returns an error for an item that parses as neither.
    pub fn order(mut self, syntax: &str) -> Result<Self> {
        self.kind.order = split_list(syntax)?
            .iter()
            .map(|item| parse_order(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    /// Sets the row count limit.
    #[must_use]
    pub const fn limit(mut self, length: u64) -> Self {
        self.kind.limit = Some(length);
        self
    }

    /// Sets the row offset. Only emitted together with a limit.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.kind.offset = Some(offset);
        self
    }

    /// Compiles the FROM clause body alone.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error met while compiling.
    pub fn from_syntax(&self) -> Result<Option<String>> {
        self.kind
            .from
            .as_ref()
            .map(|from| from.compile(&self.context()))
            .transpose()
    }

    /// Compiles the HAVING condition alone.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error met while compiling.
    pub fn having_syntax(&self) -> Result<Option<String>> {
        match &self.kind.having {
            Some(having) => having.compile(&self.context()),
            None => Ok(None),
        }
    }

    fn columns_syntax(&self, ctx: &CompileContext<'_>) -> Result<String> {
        let columns = self
            .kind
            .columns
            .iter()
            .map(|column| {
                let sql = compile_operand(&column.operand, ctx)?;
                Ok(match &column.alias {
                    Some(alias) => format!("{sql} AS {}", ctx.driver.quote_identifier(alias)),
                    None => sql,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(columns.join(", "))
    }

    fn group_syntax(&self, ctx: &CompileContext<'_>) -> Result<Option<String>> {
        if self.kind.group.is_empty() {
            return Ok(None);
        }
        let items = self
            .kind
            .group
            .iter()
            .map(|operand| compile_operand(operand, ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(items.join(", ")))
    }

    fn order_syntax(&self, ctx: &CompileContext<'_>) -> Result<Option<String>> {
        if self.kind.order.is_empty() {
            return Ok(None);
        }
        let items = self
            .kind
            .order
            .iter()
            .map(|item| {
                let key = match &item.key {
                    OrderKey::Column(column) => column.sql(ctx.driver),
                    OrderKey::Expr(expr) => expr
                        .compile(ctx)?
                        .ok_or_else(|| SyntaxError::MalformedClip(expr.source().to_string()))?,
                };
                let direction = if item.descending { "DESC" } else { "ASC" };
                Ok(format!("{key} {direction}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(items.join(", ")))
    }
}

impl SqlSyntax for Statement<Select> {
    fn syntax(&self) -> Result<String> {
        let ctx = self.context();
        let mut sql = String::from("SELECT ");
        if self.kind.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.columns_syntax(&ctx)?);
        pushed_clause(&mut sql, "FROM", self.from_syntax()?);
        pushed_clause(&mut sql, "WHERE", self.where_syntax()?);
        pushed_clause(&mut sql, "GROUP BY", self.group_syntax(&ctx)?);
        pushed_clause(&mut sql, "HAVING", self.having_syntax()?);
        pushed_clause(&mut sql, "ORDER BY", self.order_syntax(&ctx)?);
        if let Some(length) = self.kind.limit {
            sql.push(' ');
            sql.push_str(&ctx.driver.dialect().limit(self.kind.offset.unwrap_or(0), length));
        }
        Ok(compiled("select", sql))
    }
}

fn parse_column(item: &str) -> Result<SelectColumn> {
    let (expr, alias) = match ALIASED.captures(item) {
        Some(caps) => (
            caps["expr"].trim().to_string(),
            Some(unquote(&caps["alias"])),
        ),
        None => (item.trim().to_string(), None),
    };
    let operand = match ColumnRef::parse(&expr)? {
        Some(column) if column.is_wildcard() => Operand::Column(column),
        _ => Operand::classify(&expr)?,
    };
    if matches!(operand, Operand::Auto) {
        return Err(SyntaxError::InvalidOperand(expr));
    }
    Ok(SelectColumn { operand, alias })
}

fn parse_order(item: &str) -> Result<OrderItem> {
    let item = item.trim();
    let (descending, rest) = match item.chars().next() {
        Some('>') => (true, &item[1..]),
        Some('<') => (false, &item[1..]),
        _ => (false, item),
    };
    let rest = rest.trim();
    let key = match ColumnRef::parse(rest)? {
        Some(column) if !column.is_wildcard() => OrderKey::Column(column),
        _ => {
            let expr = WhereSyntax::parse(rest)?;
            if expr.is_empty() {
                return Err(SyntaxError::EmptyName("order column"));
            }
            OrderKey::Expr(expr)
        }
    };
    Ok(OrderItem { key, descending })
}
