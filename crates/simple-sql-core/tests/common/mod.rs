#![allow(dead_code)]

use std::sync::Arc;

use simple_sql_core::syntax::CompileContext;
use simple_sql_core::{
    Driver, Parameters, PostgresDialect, PresetRegistry, SqliteDialect, SyntaxError,
    TableJoinSyntax, Value, WhereSyntax,
};

pub fn mysql() -> Driver {
    Driver::default()
}

pub fn postgres() -> Driver {
    Driver::new(Arc::new(PostgresDialect::new()))
}

pub fn sqlite() -> Driver {
    Driver::new(Arc::new(SqliteDialect::new()))
}

pub fn params<const N: usize>(values: [(&str, Value); N]) -> Parameters {
    let mut params = Parameters::new();
    params.merge(values);
    params
}

/// Compiles a condition on MySQL with the given bindings.
pub fn condition(syntax: &str, params: &Parameters) -> String {
    condition_on(&mysql(), syntax, params)
}

pub fn condition_on(driver: &Driver, syntax: &str, params: &Parameters) -> String {
    WhereSyntax::parse(syntax)
        .unwrap_or_else(|e| panic!("Failed to parse: {syntax}\nError: {e:?}"))
        .compile(&CompileContext::new(driver, params))
        .unwrap_or_else(|e| panic!("Failed to compile: {syntax}\nError: {e:?}"))
        .unwrap_or_else(|| panic!("Empty condition: {syntax}"))
}

/// Parses and compiles a condition, expecting an error at either step.
pub fn condition_err(syntax: &str, params: &Parameters) -> SyntaxError {
    let driver = mysql();
    let result = WhereSyntax::parse(syntax)
        .and_then(|parsed| parsed.compile(&CompileContext::new(&driver, params)));
    match result {
        Ok(sql) => panic!("Expected error for: {syntax}, got {sql:?}"),
        Err(e) => e,
    }
}

pub fn join_on(driver: &Driver, syntax: &str) -> Result<String, SyntaxError> {
    let params = Parameters::new();
    TableJoinSyntax::parse(syntax, driver, &PresetRegistry::new())?
        .compile(&CompileContext::new(driver, &params))
}
