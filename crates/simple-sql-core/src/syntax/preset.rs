//! Named sub-query templates pluggable into a join alias.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::driver::Driver;
use crate::error::{Result, SyntaxError};
use crate::value::SqlSyntax;

/// A reusable sub-query template referenced from join syntax as
/// `alias.table->Name(args)`.
///
/// The join compiler creates one instance per alias and calls [`Preset::init`]
/// every time the alias is referenced, so later references can reconfigure it.
pub trait Preset: SqlSyntax {
    /// Configures the preset with the arguments written in the join syntax.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::PresetArguments`] when the arguments are unusable.
    fn init(&mut self, args: &[String]) -> Result<()>;
}

/// What a preset constructor knows about the join leaf it serves.
#[derive(Debug, Clone, Copy)]
pub struct PresetContext<'a> {
    /// The driver of the owning statement.
    pub driver: &'a Driver,
    /// The table named in the leaf, without prefix.
    pub table: &'a str,
    /// The alias the preset is registered under.
    pub alias: &'a str,
}

/// Builds a preset instance.
pub type PresetConstructor = Rc<dyn Fn(&PresetContext<'_>) -> Box<dyn Preset>>;

/// Name to constructor lookup for presets.
///
/// ```rust
/// use simple_sql_core::syntax::PresetRegistry;
///
/// let registry = PresetRegistry::new();
/// assert!(registry.is_empty());
/// assert!(!registry.contains("Latest"));
/// ```
#[derive(Clone, Default)]
pub struct PresetRegistry {
    constructors: HashMap<String, PresetConstructor>,
}

impl PresetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&PresetContext<'_>) -> Box<dyn Preset> + 'static,
    {
        self.constructors.insert(name.into(), Rc::new(constructor));
    }

    /// Registers a constructor, builder style.
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&PresetContext<'_>) -> Box<dyn Preset> + 'static,
    {
        self.register(name, constructor);
        self
    }

    /// Returns true if a preset with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Returns the registered preset names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered presets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns true if no preset is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Creates a new, uninitialized preset instance.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::UnknownPreset`] if `name` is not registered.
    pub fn instantiate(&self, name: &str, ctx: &PresetContext<'_>) -> Result<Box<dyn Preset>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| SyntaxError::UnknownPreset(name.to_string()))?;
        tracing::debug!(preset = name, table = ctx.table, alias = ctx.alias, "instantiated preset");
        Ok(constructor(ctx))
    }
}

impl fmt::Debug for PresetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetRegistry")
            .field("presets", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed {
        table: String,
        args: Vec<String>,
    }

    impl SqlSyntax for Fixed {
        fn syntax(&self) -> Result<String> {
            Ok(format!("SELECT {} FROM {}", self.args.join(", "), self.table))
        }
    }

    impl Preset for Fixed {
        fn init(&mut self, args: &[String]) -> Result<()> {
            self.args = args.to_vec();
            Ok(())
        }
    }

    fn registry() -> PresetRegistry {
        PresetRegistry::new().with("Fixed", |ctx| {
            Box::new(Fixed {
                table: ctx.table.to_string(),
                args: Vec::new(),
            })
        })
    }

    #[test]
    fn test_instantiate_and_init() {
        let driver = Driver::default();
        let ctx = PresetContext {
            driver: &driver,
            table: "users",
            alias: "u",
        };
        let mut preset = registry().instantiate("Fixed", &ctx).unwrap();
        preset.init(&[String::from("id")]).unwrap();
        assert_eq!(preset.syntax().unwrap(), "SELECT id FROM users");
    }

    #[test]
    fn test_unknown_preset() {
        let driver = Driver::default();
        let ctx = PresetContext {
            driver: &driver,
            table: "users",
            alias: "u",
        };
        assert!(matches!(
            registry().instantiate("Missing", &ctx),
            Err(SyntaxError::UnknownPreset(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_names_sorted() {
        let registry = registry().with("Alpha", |ctx| {
            Box::new(Fixed {
                table: ctx.table.to_string(),
                args: Vec::new(),
            })
        });
        assert_eq!(registry.names(), vec!["Alpha", "Fixed"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(format!("{registry:?}"), r#"PresetRegistry { presets: ["Alpha", "Fixed"] }"#);
    }
}
