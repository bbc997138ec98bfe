//! Join compiler tests: table resolution, brackets, groups and presets.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{join_on, mysql, postgres};
use simple_sql_core::syntax::{CompileContext, JoinKind, JoinSource};
use simple_sql_core::{
    Driver, Parameters, Preset, PresetRegistry, Result, SqlSyntax, Statement, SyntaxError,
    TableJoinSyntax,
};

#[test]
fn test_prefixed_join() {
    let driver = Driver::default().with_prefix("prefix_");
    assert_eq!(
        join_on(&driver, "a.users-b.orders[id]").unwrap(),
        "`prefix_users` AS `a` JOIN `prefix_orders` AS `b` ON `a`.`id` = `b`.`id`"
    );
}

#[test]
fn test_postgres_quoting() {
    assert_eq!(
        join_on(&postgres(), "a.users>>b.orders[:user_id]").unwrap(),
        "\"users\" AS \"a\" RIGHT OUTER JOIN \"orders\" AS \"b\" USING (\"user_id\")"
    );
}

#[test]
fn test_three_way_join_pairs_with_first_table() {
    assert_eq!(
        join_on(&mysql(), "u.users<o.orders[user_id]<<p.payments[?p.order_id=o.id]").unwrap(),
        "`users` AS `u` LEFT JOIN `orders` AS `o` ON `u`.`user_id` = `o`.`user_id` \
         LEFT OUTER JOIN `payments` AS `p` ON `p`.`order_id` = `o`.`id`"
    );
}

#[test]
fn test_bracket_on_first_table_is_an_error() {
    assert!(matches!(
        join_on(&mysql(), "a.users[id]-b.orders[id]"),
        Err(SyntaxError::ConditionBracket(_))
    ));
}

#[test]
fn test_missing_bracket_is_an_error() {
    assert!(matches!(
        join_on(&mysql(), "a.users-b.orders"),
        Err(SyntaxError::ConditionBracket(_))
    ));
    assert!(matches!(
        join_on(&mysql(), "a.users*b.orders[id]"),
        Err(SyntaxError::ConditionBracket(_))
    ));
    assert_eq!(
        join_on(&mysql(), "a.users*b.orders").unwrap(),
        "`users` AS `a` CROSS JOIN `orders` AS `b`"
    );
}

#[test]
fn test_invalid_using_token() {
    assert!(matches!(
        join_on(&mysql(), "a.t-b.u[:id,x=1]"),
        Err(SyntaxError::InvalidUsing(token)) if token == "x=1"
    ));
}

#[test]
fn test_deeply_nested_groups() {
    let sql = join_on(&mysql(), "a.t-(b.u-(c.v-(d.w[id])[id])[id])[id]");
    // A group's first table takes no bracket, so the innermost group is invalid.
    assert!(matches!(sql, Err(SyntaxError::ConditionBracket(_))));

    assert_eq!(
        join_on(&mysql(), "a.t-(b.u-(c.v-d.w[id])[id])[id]").unwrap(),
        "`t` AS `a` JOIN (`u` AS `b` JOIN (`v` AS `c` JOIN `w` AS `d` ON `c`.`id` = `d`.`id`) \
         ON `b`.`id` = `c`.`id`) ON `a`.`id` = `b`.`id`"
    );
}

#[test]
fn test_parsed_steps() {
    let join = TableJoinSyntax::parse("a.t<b.u[id]", &mysql(), &PresetRegistry::new()).unwrap();
    let steps = join.steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].kind(), None);
    assert_eq!(steps[1].kind(), Some(JoinKind::Left));
    assert_eq!(
        steps[1].source(),
        &JoinSource::Table {
            table: String::from("u"),
            alias: Some(String::from("b")),
        }
    );
    assert_eq!(join.source(), "a.t<b.u[id]");
}

#[test]
fn test_condition_bracket_uses_statement_parameters() {
    let driver = mysql();
    let mut params = Parameters::new();
    params.assign("status", "paid");
    let join = TableJoinSyntax::parse(
        "u.users-o.orders[?o.user_id=u.id,o.status=:status]",
        &driver,
        &PresetRegistry::new(),
    )
    .unwrap();
    assert_eq!(
        join.compile(&CompileContext::new(&driver, &params)).unwrap(),
        "`users` AS `u` JOIN `orders` AS `o` ON `o`.`user_id` = `u`.`id` AND `o`.`status` = 'paid'"
    );
}

// =============================================================================
// Presets
// =============================================================================

/// Records how often it was created and initialized.
#[derive(Debug)]
struct Newest {
    table: String,
    column: String,
    inits: Rc<Cell<usize>>,
}

impl SqlSyntax for Newest {
    fn syntax(&self) -> Result<String> {
        Ok(format!(
            "SELECT * FROM {} ORDER BY {} DESC LIMIT 1",
            self.table, self.column
        ))
    }
}

impl Preset for Newest {
    fn init(&mut self, args: &[String]) -> Result<()> {
        self.column = args.first().cloned().unwrap_or_else(|| String::from("id"));
        self.inits.set(self.inits.get() + 1);
        Ok(())
    }
}

fn newest_registry(created: &Rc<Cell<usize>>, inits: &Rc<Cell<usize>>) -> PresetRegistry {
    let created = Rc::clone(created);
    let inits = Rc::clone(inits);
    PresetRegistry::new().with("Newest", move |ctx| {
        created.set(created.get() + 1);
        Box::new(Newest {
            table: ctx.driver.table_name(ctx.table).unwrap_or_default(),
            column: String::new(),
            inits: Rc::clone(&inits),
        })
    })
}

#[test]
fn test_preset_instantiated_once_per_alias() {
    let created = Rc::new(Cell::new(0));
    let inits = Rc::new(Cell::new(0));
    let registry = newest_registry(&created, &inits);
    let driver = mysql();
    let params = Parameters::new();

    let join = TableJoinSyntax::parse(
        "u.users-n.posts->Newest(created_at)[user_id]*n.posts->Newest(updated_at)",
        &driver,
        &registry,
    );
    // The cross join repeats the alias: the instance is reused and re-initialized.
    let join = join.unwrap();
    assert_eq!(created.get(), 1);
    assert_eq!(inits.get(), 2);
    assert_eq!(
        join.compile(&CompileContext::new(&driver, &params)).unwrap(),
        "`users` AS `u` JOIN (SELECT * FROM `posts` ORDER BY updated_at DESC LIMIT 1) AS `n` \
         ON `u`.`user_id` = `n`.`user_id` \
         CROSS JOIN (SELECT * FROM `posts` ORDER BY updated_at DESC LIMIT 1) AS `n`"
    );
    assert!(join.preset("n").is_some());
}

#[test]
fn test_preset_alias_defaults_to_table() {
    let created = Rc::new(Cell::new(0));
    let inits = Rc::new(Cell::new(0));
    let registry = newest_registry(&created, &inits);
    let driver = mysql();
    let params = Parameters::new();
    let join = TableJoinSyntax::parse("posts->Newest()", &driver, &registry).unwrap();
    assert_eq!(
        join.compile(&CompileContext::new(&driver, &params)).unwrap(),
        "(SELECT * FROM `posts` ORDER BY id DESC LIMIT 1) AS `posts`"
    );
}

#[test]
fn test_preset_arguments_keep_quoted_commas() {
    let created = Rc::new(Cell::new(0));
    let inits = Rc::new(Cell::new(0));
    let registry = newest_registry(&created, &inits);
    let driver = mysql();
    let params = Parameters::new();
    let join = TableJoinSyntax::parse(
        "u.users-n.posts->Newest('COALESCE(a, b)')[user_id]",
        &driver,
        &registry,
    )
    .unwrap();
    assert_eq!(
        join.compile(&CompileContext::new(&driver, &params)).unwrap(),
        "`users` AS `u` JOIN (SELECT * FROM `posts` ORDER BY COALESCE(a, b) DESC LIMIT 1) AS `n` \
         ON `u`.`user_id` = `n`.`user_id`"
    );
}

#[test]
fn test_alias_cannot_switch_presets() {
    let created = Rc::new(Cell::new(0));
    let inits = Rc::new(Cell::new(0));
    let registry = newest_registry(&created, &inits).with("Oldest", |ctx| {
        Box::new(Newest {
            table: ctx.driver.table_name(ctx.table).unwrap_or_default(),
            column: String::new(),
            inits: Rc::new(Cell::new(0)),
        })
    });
    let join = TableJoinSyntax::parse(
        "u.users-n.posts->Newest(id)[user_id]*n.posts->Oldest(id)",
        &mysql(),
        &registry,
    );
    assert!(matches!(
        join,
        Err(SyntaxError::PresetConflict { alias, existing, requested })
            if alias == "n" && existing == "Newest" && requested == "Oldest"
    ));
    assert_eq!(created.get(), 1);
}

#[test]
fn test_unknown_preset() {
    assert!(matches!(
        join_on(&mysql(), "a.t-b.u->Missing(x)[id]"),
        Err(SyntaxError::UnknownPreset(name)) if name == "Missing"
    ));
}

// =============================================================================
// Sub-queries
// =============================================================================

#[test]
fn test_subquery_alias() {
    let driver = mysql();
    let params = Parameters::new();
    let recent = Statement::select(driver.clone(), "user_id")
        .unwrap()
        .from("logins")
        .unwrap()
        .where_clause("at>:since")
        .unwrap()
        .with_value("since", 100);
    let join = TableJoinSyntax::parse("u.users-r.recent[:user_id]", &driver, &PresetRegistry::new())
        .unwrap()
        .with_subquery("recent", Rc::new(recent));
    assert_eq!(
        join.compile(&CompileContext::new(&driver, &params)).unwrap(),
        "`users` AS `u` JOIN (SELECT `user_id` FROM `logins` WHERE `at` > 100) AS `r` \
         USING (`user_id`)"
    );
}
