//! Bound values and the parameter bag.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Result, SyntaxError};

/// Anything that compiles to a complete SQL statement.
///
/// Implemented by every [`Statement`](crate::Statement) kind and by presets,
/// so either can be bound as a value or registered as a join sub-query.
pub trait SqlSyntax: std::fmt::Debug {
    /// Compiles the full SQL text.
    ///
    /// # Errors
    ///
    /// Returns the first syntax error met while compiling.
    fn syntax(&self) -> Result<String>;
}

/// A value bound to a statement parameter.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value, rendered as `0`/`1`.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// A list of values. Expands to `IN(...)` lists and is JSON-encoded
    /// where a single literal is needed.
    Array(Vec<Value>),
    /// A JSON document (object), always JSON-encoded.
    Json(serde_json::Value),
    /// A nested statement, embedded as `(<its SQL>)`.
    Statement(Rc<dyn SqlSyntax>),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content of a [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Converts the value to a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error for nested statements, which have no JSON form.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Array(values) => serde_json::Value::Array(
                values.iter().map(Self::to_json).collect::<Result<_>>()?,
            ),
            Self::Json(json) => json.clone(),
            Self::Statement(_) => {
                return Err(SyntaxError::InvalidOperand(String::from(
                    "nested statement cannot be JSON-encoded",
                )))
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Statement(a), Self::Statement(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                // Beyond i64: keep the digits rather than round through f64.
                None if n.is_u64() => Self::Text(n.to_string()),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(values) => {
                Self::Array(values.into_iter().map(Self::from).collect())
            }
            object @ serde_json::Value::Object(_) => Self::Json(object),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i64, i32, i16, i8, u32, u16, u8);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<S: SqlSyntax + 'static> From<Rc<S>> for Value {
    fn from(statement: Rc<S>) -> Self {
        Self::Statement(statement)
    }
}

/// Name to value map owned by one statement.
///
/// Compilers only read it; it changes through [`Parameters::assign`] and
/// [`Parameters::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: HashMap<String, Value>,
}

impl Parameters {
    /// Creates an empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Binds a value, replacing any previous one.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Binds every pair of `values`.
    pub fn merge<K, V, I>(&mut self, values: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.values
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    /// Returns the number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42_i32), Value::Int(42));
        assert_eq!(Value::from(2.5_f64), Value::Float(2.5));
        assert_eq!(Value::from("hello"), Value::Text(String::from("hello")));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec![1_i64, 2]),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_value_from_json() {
        let json: serde_json::Value = serde_json::json!([1, "a", null, 1.5, {"k": 1}]);
        let value = Value::from(json);
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Int(1),
                Value::Text(String::from("a")),
                Value::Null,
                Value::Float(1.5),
                Value::Json(serde_json::json!({"k": 1})),
            ])
        );
    }

    #[test]
    fn test_large_json_integers_keep_digits() {
        let value = Value::from(serde_json::json!(u64::MAX));
        assert_eq!(value, Value::Text(String::from("18446744073709551615")));
        assert_eq!(Value::from(serde_json::json!(i64::MIN)), Value::Int(i64::MIN));
    }

    #[test]
    fn test_value_to_json() {
        let value = Value::Array(vec![Value::Int(1), Value::Text(String::from("x"))]);
        assert_eq!(value.to_json().unwrap(), serde_json::json!([1, "x"]));
    }

    #[test]
    fn test_parameters_assign_and_merge() {
        let mut params = Parameters::new();
        assert!(params.is_empty());
        params.assign("a", 1);
        params.merge([("b", "x"), ("c", "y")]);
        assert_eq!(params.len(), 3);
        assert_eq!(params.get_value("a"), Some(&Value::Int(1)));
        assert_eq!(params.get_value("c"), Some(&Value::Text(String::from("y"))));
        assert_eq!(params.get_value("missing"), None);
    }
}
