//! Join compiler for FROM clauses.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use super::condition::WhereSyntax;
use super::operand::{unquote, IDENT};
use super::preset::{Preset, PresetContext, PresetRegistry};
use super::CompileContext;
use crate::driver::Driver;
use crate::error::{Result, SyntaxError};
use crate::lexer::{Token, Tokenizer};
use crate::value::SqlSyntax;

/// `[alias.]table[->Preset(args)][bracket]`
static JOIN_LEAF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"^(?s)(?:(?P<alias>{IDENT})\.)?(?P<table>{IDENT})(?:->(?P<preset>[A-Za-z_]\w*)\((?P<args>(?:'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|[^'")])*)\))?(?P<bracket>\[.*\])?$"#
    ))
    .expect("Invalid join leaf regex")
});

static PLAIN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^(?:{IDENT})$")).expect("Invalid name regex"));

static ALIASED_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?s)(?P<alias>{IDENT})\s*:(?P<columns>.*)$"))
        .expect("Invalid bracket regex")
});

/// A join operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `-`
    Inner,
    /// `<`
    Left,
    /// `>`
    Right,
    /// `<<`
    LeftOuter,
    /// `>>`
    RightOuter,
    /// `*`
    Cross,
}

impl JoinKind {
    /// Every join symbol.
    pub const SYMBOLS: [&'static str; 6] = ["-", "<", ">", "<<", ">>", "*"];

    /// Looks up a join kind by symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "-" => Self::Inner,
            "<" => Self::Left,
            ">" => Self::Right,
            "<<" => Self::LeftOuter,
            ">>" => Self::RightOuter,
            "*" => Self::Cross,
            _ => return None,
        })
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::RightOuter => "RIGHT OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// What one join step reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinSource {
    /// A real table, or the name of a registered sub-query.
    Table {
        /// Table or sub-query name.
        table: String,
        /// Optional alias.
        alias: Option<String>,
    },
    /// A table served by a preset registered under `alias`.
    Preset {
        /// Table named in the leaf.
        table: String,
        /// Alias the preset is registered under.
        alias: String,
        /// Preset name.
        preset: String,
    },
    /// A parenthesized join sequence.
    Group(Vec<JoinStep>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bracket {
    On(String),
    Using(Vec<String>),
    Columns {
        source: Option<String>,
        columns: Vec<String>,
    },
}

/// One table of a join sequence together with how it is joined.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    kind: Option<JoinKind>,
    source: JoinSource,
    bracket: Option<Bracket>,
    condition: Option<WhereSyntax>,
}

impl JoinStep {
    /// The join operator, `None` for the first step of a sequence.
    #[must_use]
    pub const fn kind(&self) -> Option<JoinKind> {
        self.kind
    }

    /// What this step reads from.
    #[must_use]
    pub const fn source(&self) -> &JoinSource {
        &self.source
    }

    /// Returns true if the step carries a condition bracket.
    #[must_use]
    pub const fn has_bracket(&self) -> bool {
        self.bracket.is_some()
    }
}

/// A parsed join syntax such as `a.users-b.orders[user_id]`.
///
/// Sub-queries may be registered before or after parsing: a table name is
/// only looked up among them at compile time.
#[derive(Debug)]
pub struct TableJoinSyntax {
    source: String,
    steps: Vec<JoinStep>,
    subqueries: HashMap<String, Rc<dyn SqlSyntax>>,
    presets: HashMap<String, Box<dyn Preset>>,
}

impl TableJoinSyntax {
    /// Parses a join syntax. Presets are looked up in `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid leaves, misplaced or missing condition
    /// brackets, bad `USING` columns and unknown presets.
    pub fn parse(syntax: &str, driver: &Driver, registry: &PresetRegistry) -> Result<Self> {
        let validate = |leaf: &str| {
            if JOIN_LEAF.is_match(leaf) {
                Ok(leaf.to_string())
            } else {
                Err(SyntaxError::InvalidJoin(leaf.to_string()))
            }
        };
        let tokens = Tokenizer::new(&JoinKind::SYMBOLS)
            .with_leaf_hook(&validate)
            .tokenize(syntax)?;
        if tokens.is_empty() {
            return Err(SyntaxError::EmptyName("table"));
        }
        let mut join = Self {
            source: syntax.to_string(),
            steps: Vec::new(),
            subqueries: HashMap::new(),
            presets: HashMap::new(),
        };
        let mut parser = Parser {
            driver,
            registry,
            presets: &mut join.presets,
            preset_names: HashMap::new(),
        };
        join.steps = parser.sequence(&tokens)?;
        Ok(join)
    }

    /// Returns the syntax as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed steps.
    #[must_use]
    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }

    /// Registers a sub-query usable as a table name.
    pub fn register_subquery(&mut self, name: impl Into<String>, statement: Rc<dyn SqlSyntax>) {
        self.subqueries.insert(name.into(), statement);
    }

    /// Registers a sub-query, builder style.
    #[must_use]
    pub fn with_subquery(mut self, name: impl Into<String>, statement: Rc<dyn SqlSyntax>) -> Self {
        self.register_subquery(name, statement);
        self
    }

    /// Returns the preset registered under `alias`.
    #[must_use]
    pub fn preset(&self, alias: &str) -> Option<&dyn Preset> {
        self.presets.get(alias).map(Box::as_ref)
    }

    /// Compiles the FROM clause body.
    ///
    /// # Errors
    ///
    /// Returns an error when a sub-query has no alias or when a nested
    /// condition, sub-query or preset fails to compile.
    pub fn compile(&self, ctx: &CompileContext<'_>) -> Result<String> {
        self.compile_steps(&self.steps, ctx)
    }

    fn compile_steps(&self, steps: &[JoinStep], ctx: &CompileContext<'_>) -> Result<String> {
        let Some(first) = steps.first() else {
            return Err(SyntaxError::EmptyName("table"));
        };
        let source = reference(first, ctx.driver)?;
        let mut sql = self.compile_source(&first.source, ctx)?;
        for step in &steps[1..] {
            let kind = step.kind.unwrap_or(JoinKind::Inner);
            sql.push(' ');
            sql.push_str(kind.keyword());
            sql.push(' ');
            sql.push_str(&self.compile_source(&step.source, ctx)?);
            if let Some(bracket) = &step.bracket {
                sql.push_str(&compile_bracket(bracket, step, &source, ctx)?);
            }
        }
        Ok(sql)
    }

    fn compile_source(&self, source: &JoinSource, ctx: &CompileContext<'_>) -> Result<String> {
        let driver = ctx.driver;
        match source {
            JoinSource::Table { table, alias } => {
                if let Some(statement) = self.subqueries.get(table) {
                    let alias = alias.as_ref().ok_or_else(|| {
                        SyntaxError::InvalidJoin(format!("sub-query `{table}` needs an alias"))
                    })?;
                    return Ok(format!(
                        "({}) AS {}",
                        statement.syntax()?,
                        driver.quote_identifier(alias)
                    ));
                }
                let name = driver.table_name(table)?;
                Ok(match alias {
                    Some(alias) => format!("{name} AS {}", driver.quote_identifier(alias)),
                    None => name,
                })
            }
            JoinSource::Preset { alias, preset, .. } => {
                let instance = self
                    .presets
                    .get(alias)
                    .ok_or_else(|| SyntaxError::UnknownPreset(preset.clone()))?;
                Ok(format!(
                    "({}) AS {}",
                    instance.syntax()?,
                    driver.quote_identifier(alias)
                ))
            }
            JoinSource::Group(steps) => Ok(format!("({})", self.compile_steps(steps, ctx)?)),
        }
    }
}

/// The quoted name other tables use to refer to a step's columns.
fn reference(step: &JoinStep, driver: &Driver) -> Result<String> {
    match &step.source {
        JoinSource::Table {
            alias: Some(alias), ..
        }
        | JoinSource::Preset { alias, .. } => Ok(driver.quote_identifier(alias)),
        JoinSource::Table { table, alias: None } => driver.table_name(table),
        JoinSource::Group(steps) => match steps.first() {
            Some(first) => reference(first, driver),
            None => Err(SyntaxError::EmptyName("table")),
        },
    }
}

fn compile_bracket(
    bracket: &Bracket,
    step: &JoinStep,
    source: &str,
    ctx: &CompileContext<'_>,
) -> Result<String> {
    let driver = ctx.driver;
    match bracket {
        Bracket::On(text) => {
            let condition = step
                .condition
                .as_ref()
                .ok_or_else(|| SyntaxError::ConditionBracket(text.clone()))?;
            let sql = condition
                .compile(ctx)?
                .ok_or_else(|| SyntaxError::ConditionBracket(text.clone()))?;
            Ok(format!(" ON {sql}"))
        }
        Bracket::Using(columns) => {
            let columns: Vec<String> = columns.iter().map(|c| driver.quote_identifier(c)).collect();
            Ok(format!(" USING ({})", columns.join(", ")))
        }
        Bracket::Columns {
            source: local,
            columns,
        } => {
            let left = match local {
                Some(alias) => driver.quote_identifier(alias),
                None => source.to_string(),
            };
            let right = reference(step, driver)?;
            let pairs: Vec<String> = columns
                .iter()
                .map(|c| {
                    let column = driver.quote_identifier(c);
                    format!("{left}.{column} = {right}.{column}")
                })
                .collect();
            Ok(format!(" ON {}", pairs.join(" AND ")))
        }
    }
}

struct Parser<'p> {
    driver: &'p Driver,
    registry: &'p PresetRegistry,
    presets: &'p mut HashMap<String, Box<dyn Preset>>,
    preset_names: HashMap<String, String>,
}

impl Parser<'_> {
    fn sequence(&mut self, tokens: &[Token]) -> Result<Vec<JoinStep>> {
        let mut steps: Vec<JoinStep> = Vec::new();
        let mut kind = None;
        let mut expect_table = true;

        for token in tokens {
            if let Token::Combinator(symbol) = token {
                if expect_table {
                    return Err(SyntaxError::Combinator(symbol.clone()));
                }
                kind = JoinKind::from_symbol(symbol);
                expect_table = true;
                continue;
            }
            if !expect_table {
                return Err(SyntaxError::InvalidJoin(token.to_string()));
            }
            let step = self.step(token, kind)?;
            check_bracket(&step, steps.is_empty(), token)?;
            steps.push(step);
            expect_table = false;
        }
        if expect_table {
            let last = tokens.last().map(ToString::to_string).unwrap_or_default();
            return Err(SyntaxError::Combinator(last));
        }
        Ok(steps)
    }

    fn step(&mut self, token: &Token, kind: Option<JoinKind>) -> Result<JoinStep> {
        match token {
            Token::Leaf(leaf) => self.leaf(leaf, kind),
            Token::Group {
                prefix,
                tokens,
                suffix,
            } => {
                if !prefix.is_empty() || !(suffix.is_empty() || is_bracket(suffix)) {
                    return Err(SyntaxError::InvalidJoin(token.to_string()));
                }
                let steps = self.sequence(tokens)?;
                let bracket = (!suffix.is_empty()).then_some(suffix.as_str());
                build_step(kind, JoinSource::Group(steps), bracket)
            }
            Token::Combinator(c) => Err(SyntaxError::Combinator(c.clone())),
        }
    }

    fn leaf(&mut self, leaf: &str, kind: Option<JoinKind>) -> Result<JoinStep> {
        let caps = JOIN_LEAF
            .captures(leaf)
            .ok_or_else(|| SyntaxError::InvalidJoin(leaf.to_string()))?;
        let table = unquote(&caps["table"]);
        let alias = caps.name("alias").map(|m| unquote(m.as_str()));

        let source = match caps.name("preset") {
            Some(preset) => {
                let alias = alias.unwrap_or_else(|| table.clone());
                let args = preset_arguments(caps.name("args").map_or("", |m| m.as_str()))?;
                self.preset(preset.as_str(), &table, &alias, &args)?;
                JoinSource::Preset {
                    table,
                    alias,
                    preset: preset.as_str().to_string(),
                }
            }
            None => JoinSource::Table { table, alias },
        };
        build_step(kind, source, caps.name("bracket").map(|m| m.as_str()))
    }

    /// Instantiates the preset on first sighting of `alias`, then re-inits it.
    fn preset(&mut self, name: &str, table: &str, alias: &str, args: &[String]) -> Result<()> {
        if let Some(existing) = self.preset_names.get(alias).filter(|e| *e != name) {
            return Err(SyntaxError::PresetConflict {
                alias: alias.to_string(),
                existing: existing.clone(),
                requested: name.to_string(),
            });
        }
        if !self.presets.contains_key(alias) {
            let ctx = PresetContext {
                driver: self.driver,
                table,
                alias,
            };
            let instance = self.registry.instantiate(name, &ctx)?;
            self.presets.insert(alias.to_string(), instance);
            self.preset_names.insert(alias.to_string(), name.to_string());
        }
        match self.presets.get_mut(alias) {
            Some(instance) => instance.init(args),
            None => Err(SyntaxError::UnknownPreset(name.to_string())),
        }
    }
}

fn build_step(kind: Option<JoinKind>, source: JoinSource, bracket: Option<&str>) -> Result<JoinStep> {
    let bracket = bracket.map(parse_bracket).transpose()?;
    let condition = match &bracket {
        Some(Bracket::On(text)) => Some(WhereSyntax::parse(text)?),
        _ => None,
    };
    if condition.as_ref().is_some_and(WhereSyntax::is_empty) {
        return Err(SyntaxError::ConditionBracket(String::from(
            "empty `[?...]` condition",
        )));
    }
    Ok(JoinStep {
        kind,
        source,
        bracket,
        condition,
    })
}

fn check_bracket(step: &JoinStep, first: bool, token: &Token) -> Result<()> {
    let message = match (first, step.kind, step.has_bracket()) {
        (true, _, true) => "the first table must not have a condition bracket",
        (false, Some(JoinKind::Cross), true) => "a cross join must not have a condition bracket",
        (false, Some(kind), false) if kind != JoinKind::Cross => {
            "a joined table needs a condition bracket"
        }
        _ => return Ok(()),
    };
    Err(SyntaxError::ConditionBracket(format!("{message}: `{token}`")))
}

fn is_bracket(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

fn parse_bracket(text: &str) -> Result<Bracket> {
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| SyntaxError::InvalidJoin(text.to_string()))?
        .trim();

    if let Some(condition) = inner.strip_prefix('?') {
        return Ok(Bracket::On(condition.to_string()));
    }
    if let Some(columns) = inner.strip_prefix(':') {
        let columns = split_names(columns, SyntaxError::InvalidUsing)?;
        return Ok(Bracket::Using(columns));
    }
    let (source, columns) = match ALIASED_COLUMNS.captures(inner) {
        Some(caps) => (
            Some(unquote(&caps["alias"])),
            caps.name("columns").map_or("", |m| m.as_str()).to_string(),
        ),
        None => (None, inner.to_string()),
    };
    let columns = split_names(&columns, SyntaxError::InvalidJoin)?;
    Ok(Bracket::Columns { source, columns })
}

/// Splits a comma separated list of plain column names.
fn split_names(text: &str, error: fn(String) -> SyntaxError) -> Result<Vec<String>> {
    let names = text
        .split(',')
        .map(str::trim)
        .map(|name| {
            if PLAIN_NAME.is_match(name) {
                Ok(unquote(name))
            } else {
                Err(error(name.to_string()))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(names)
}

/// Splits preset arguments on top-level commas; quoted arguments are unquoted.
fn preset_arguments(text: &str) -> Result<Vec<String>> {
    let tokens = Tokenizer::new(&[","]).tokenize(text)?;
    let mut args = Vec::new();
    let mut expect_arg = true;
    for token in &tokens {
        match token {
            Token::Combinator(c) if expect_arg => return Err(SyntaxError::Combinator(c.clone())),
            Token::Combinator(_) => expect_arg = true,
            other => {
                args.push(unquote(&other.to_string()));
                expect_arg = false;
            }
        }
    }
    if expect_arg && !tokens.is_empty() {
        return Err(SyntaxError::Combinator(String::from(",")));
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Parameters;

    fn compile_with(syntax: &str, driver: &Driver) -> Result<String> {
        let params = Parameters::new();
        TableJoinSyntax::parse(syntax, driver, &PresetRegistry::new())?
            .compile(&CompileContext::new(driver, &params))
    }

    fn compile(syntax: &str) -> String {
        compile_with(syntax, &Driver::default()).unwrap()
    }

    #[test]
    fn test_join_kinds() {
        for (symbol, keyword) in [
            ("-", "JOIN"),
            ("<", "LEFT JOIN"),
            (">", "RIGHT JOIN"),
            ("<<", "LEFT OUTER JOIN"),
            (">>", "RIGHT OUTER JOIN"),
        ] {
            assert_eq!(
                compile(&format!("a.t{symbol}b.u[id]")),
                format!("`t` AS `a` {keyword} `u` AS `b` ON `a`.`id` = `b`.`id`")
            );
        }
        assert_eq!(compile("a.t*b.u"), "`t` AS `a` CROSS JOIN `u` AS `b`");
    }

    #[test]
    fn test_single_table() {
        assert_eq!(compile("users"), "`users`");
        assert_eq!(compile("u.users"), "`users` AS `u`");
    }

    #[test]
    fn test_unaliased_tables_use_table_names() {
        let driver = Driver::default().with_prefix("p_");
        assert_eq!(
            compile_with("users-orders[user_id]", &driver).unwrap(),
            "`p_users` JOIN `p_orders` ON `p_users`.`user_id` = `p_orders`.`user_id`"
        );
    }

    #[test]
    fn test_using_and_condition_brackets() {
        assert_eq!(
            compile("a.t-b.u[:id, kind]"),
            "`t` AS `a` JOIN `u` AS `b` USING (`id`, `kind`)"
        );
        assert_eq!(
            compile("a.t<b.u[?a.id=b.a_id,b.deleted=null]"),
            "`t` AS `a` LEFT JOIN `u` AS `b` ON `a`.`id` = `b`.`a_id` AND `b`.`deleted` IS NULL"
        );
    }

    #[test]
    fn test_bracket_source_override() {
        assert_eq!(
            compile("a.t-b.u[id]-c.v[b:id,kind]"),
            "`t` AS `a` JOIN `u` AS `b` ON `a`.`id` = `b`.`id` \
             JOIN `v` AS `c` ON `b`.`id` = `c`.`id` AND `b`.`kind` = `c`.`kind`"
        );
    }

    #[test]
    fn test_bracket_placement_errors() {
        let driver = Driver::default();
        for syntax in ["a.t[id]-b.u[id]", "a.t-b.u", "a.t*b.u[id]", "a.t-(b.u-c.v)"] {
            assert!(
                matches!(
                    compile_with(syntax, &driver),
                    Err(SyntaxError::ConditionBracket(_))
                ),
                "expected bracket error for {syntax}"
            );
        }
        assert!(matches!(
            compile_with("a.t-b.u[?]", &driver),
            Err(SyntaxError::ConditionBracket(_))
        ));
    }

    #[test]
    fn test_invalid_using_and_leaf() {
        let driver = Driver::default();
        assert!(matches!(
            compile_with("a.t-b.u[:a.id]", &driver),
            Err(SyntaxError::InvalidUsing(name)) if name == "a.id"
        ));
        assert!(matches!(
            compile_with("a.t-b u[id]", &driver),
            Err(SyntaxError::InvalidJoin(_))
        ));
        assert!(matches!(
            compile_with("a.t--b.u[id]", &driver),
            Err(SyntaxError::Combinator(_))
        ));
        assert!(matches!(
            compile_with("", &driver),
            Err(SyntaxError::EmptyName("table"))
        ));
    }

    #[test]
    fn test_nested_group() {
        assert_eq!(
            compile("a.t-(b.u<c.v[id])[t_id]"),
            "`t` AS `a` JOIN (`u` AS `b` LEFT JOIN `v` AS `c` ON `b`.`id` = `c`.`id`) \
             ON `a`.`t_id` = `b`.`t_id`"
        );
    }

    #[test]
    fn test_preset_arguments_respect_quotes() {
        assert_eq!(
            preset_arguments(r#"a, 'b,c', "d)""#).unwrap(),
            vec!["a", "b,c", "d)"]
        );
        assert!(preset_arguments("").unwrap().is_empty());
        assert!(matches!(
            preset_arguments("a,,b"),
            Err(SyntaxError::Combinator(_))
        ));
        assert!(JOIN_LEAF.is_match("n.posts->Top('x)', y)[id]"));
        assert!(!JOIN_LEAF.is_match("n.posts->Top(x))[id]"));
    }

    #[test]
    fn test_subquery_needs_alias() {
        #[derive(Debug)]
        struct Fixed;
        impl SqlSyntax for Fixed {
            fn syntax(&self) -> Result<String> {
                Ok(String::from("SELECT 1 AS id"))
            }
        }

        let driver = Driver::default();
        let params = Parameters::new();
        let ctx = CompileContext::new(&driver, &params);
        let join = TableJoinSyntax::parse("a.t-s.one[id]", &driver, &PresetRegistry::new())
            .unwrap()
            .with_subquery("one", Rc::new(Fixed));
        assert_eq!(
            join.compile(&ctx).unwrap(),
            "`t` AS `a` JOIN (SELECT 1 AS id) AS `s` ON `a`.`id` = `s`.`id`"
        );

        let join = TableJoinSyntax::parse("a.t*one", &driver, &PresetRegistry::new())
            .unwrap()
            .with_subquery("one", Rc::new(Fixed));
        assert!(matches!(join.compile(&ctx), Err(SyntaxError::InvalidJoin(_))));
    }
}
