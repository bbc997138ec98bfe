#![allow(dead_code)]

use std::sync::Arc;

use simple_sql_core::{Driver, PostgresDialect, Select, Statement};

pub fn mysql() -> Driver {
    Driver::default()
}

pub fn postgres() -> Driver {
    Driver::new(Arc::new(PostgresDialect::new()))
}

/// Starts a SELECT with every preset of this crate registered.
pub fn select(driver: Driver, columns: &str) -> Statement<Select> {
    Statement::select(driver, columns)
        .unwrap_or_else(|e| panic!("Failed to parse columns: {columns}\nError: {e:?}"))
        .with_presets(simple_sql_presets::registry())
}
