//! Latest row per group.

use simple_sql_core::{Driver, Preset, PresetContext, Result, SqlSyntax, Statement, SyntaxError};
use tracing::debug;

use crate::column_argument;

/// Selects, for every value of a group column, the row with the greatest
/// order column.
///
/// Arguments: `(group_column, order_column)`. Ties on the order column keep
/// every tied row.
#[derive(Debug)]
pub struct Latest {
    driver: Driver,
    table: String,
    columns: Option<(String, String)>,
}

impl Latest {
    /// Name used in join syntax.
    pub const NAME: &'static str = "Latest";

    /// Creates an uninitialized preset over the context's table.
    #[must_use]
    pub fn new(ctx: &PresetContext<'_>) -> Self {
        Self {
            driver: ctx.driver.clone(),
            table: ctx.table.to_string(),
            columns: None,
        }
    }
}

impl SqlSyntax for Latest {
    fn syntax(&self) -> Result<String> {
        let Some((group, order)) = &self.columns else {
            return Err(SyntaxError::PresetArguments {
                preset: Self::NAME.to_string(),
                message: String::from("used before init"),
            });
        };
        let table = &self.table;
        Statement::select(self.driver.clone(), "l.*")?
            .from(&format!(
                "l.{table}<r.{table}[?l.{group}=r.{group},l.{order}<r.{order}]"
            ))?
            .where_clause(&format!("r.{order}=null"))?
            .syntax()
    }
}

impl Preset for Latest {
    fn init(&mut self, args: &[String]) -> Result<()> {
        let [group, order] = args else {
            return Err(SyntaxError::PresetArguments {
                preset: Self::NAME.to_string(),
                message: format!("expected 2 arguments, got {}", args.len()),
            });
        };
        let group = column_argument(Self::NAME, group)?;
        let order = column_argument(Self::NAME, order)?;
        debug!(table = %self.table, %group, %order, "configured latest preset");
        self.columns = Some((group, order));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest(driver: &Driver) -> Latest {
        Latest::new(&PresetContext {
            driver,
            table: "posts",
            alias: "p",
        })
    }

    #[test]
    fn test_latest_syntax() {
        let driver = Driver::default();
        let mut preset = latest(&driver);
        preset
            .init(&[String::from("user_id"), String::from("created_at")])
            .unwrap();
        assert_eq!(
            preset.syntax().unwrap(),
            "SELECT `l`.* FROM `posts` AS `l` LEFT JOIN `posts` AS `r` \
             ON `l`.`user_id` = `r`.`user_id` AND `l`.`created_at` < `r`.`created_at` \
             WHERE `r`.`created_at` IS NULL"
        );
    }

    #[test]
    fn test_latest_uses_prefix() {
        let driver = Driver::default().with_prefix("app_");
        let mut preset = latest(&driver);
        preset
            .init(&[String::from("user_id"), String::from("id")])
            .unwrap();
        let sql = preset.syntax().unwrap();
        assert!(sql.contains("FROM `app_posts` AS `l` LEFT JOIN `app_posts` AS `r`"));
    }

    #[test]
    fn test_latest_requires_init() {
        let driver = Driver::default();
        assert!(matches!(
            latest(&driver).syntax(),
            Err(SyntaxError::PresetArguments { .. })
        ));
    }

    #[test]
    fn test_latest_argument_count() {
        let driver = Driver::default();
        let mut preset = latest(&driver);
        assert!(matches!(
            preset.init(&[String::from("user_id")]),
            Err(SyntaxError::PresetArguments { message, .. }) if message == "expected 2 arguments, got 1"
        ));
    }

    #[test]
    fn test_reinit_replaces_columns() {
        let driver = Driver::default();
        let mut preset = latest(&driver);
        preset
            .init(&[String::from("user_id"), String::from("created_at")])
            .unwrap();
        preset
            .init(&[String::from("thread_id"), String::from("id")])
            .unwrap();
        let sql = preset.syntax().unwrap();
        assert!(sql.contains("`l`.`thread_id` = `r`.`thread_id`"));
        assert!(sql.ends_with("WHERE `r`.`id` IS NULL"));
    }
}
