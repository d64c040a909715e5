//! Function descriptors and the name → descriptor registry.
//!
//! The parser consults a registry once per function call it builds. A
//! registry is filled at start-up and then read concurrently; [`freeze`]
//! makes that hand-over explicit.
//!
//! [`freeze`]: FunctionRegistry::freeze

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// What the parser needs to know about a function: how many arguments it
/// takes and whether it aggregates rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDescriptor {
    /// Lowercased registered name; set by [`FunctionRegistry::register`]
    pub name: String,
    /// Declared argument count; the minimum when `variadic`
    pub arity: usize,
    pub variadic: bool,
    pub aggregate: bool,
    /// False for placeholders built in lenient mode; their arity is not checked
    pub checked: bool,
}

impl FuncDescriptor {
    pub fn new(arity: usize) -> Self {
        FuncDescriptor {
            name: String::new(),
            arity,
            variadic: false,
            aggregate: false,
            checked: true,
        }
    }

    /// Stand-in for a function the registry could not vouch for. Carries
    /// only the name as written in the call.
    pub fn placeholder(name: &str) -> Self {
        FuncDescriptor {
            name: name.to_string(),
            arity: 0,
            variadic: true,
            aggregate: false,
            checked: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn aggregate(mut self) -> Self {
        self.aggregate = true;
        self
    }

    fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn is_placeholder(&self) -> bool {
        !self.checked
    }

    pub fn accepts(&self, got: usize) -> bool {
        !self.checked || got == self.arity || (self.variadic && got > self.arity)
    }

    pub(crate) fn check_arity_for(&self, name: &str, got: usize) -> Result<()> {
        if self.accepts(got) {
            return Ok(());
        }
        let want = if self.variadic {
            format!("at least {}", self.arity)
        } else {
            self.arity.to_string()
        };
        Err(Error::ArityMismatch {
            func_name: name.to_string(),
            want,
            got,
        })
    }
}

/// Name → descriptor map. Names are case-insensitive; the last
/// registration of a name wins.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    funcs: RwLock<HashMap<String, Arc<FuncDescriptor>>>,
    frozen: AtomicBool,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh, unfrozen registry holding the builtin set.
    pub fn with_builtins() -> Self {
        let registry = FunctionRegistry::new();
        {
            let mut funcs = registry.funcs.write();
            for (name, desc) in builtin_descriptors() {
                funcs.insert(name.to_string(), Arc::new(desc.named(name)));
            }
        }
        registry
    }

    /// Register `name`, replacing any earlier descriptor for it.
    ///
    /// Fails once the registry is frozen.
    pub fn register(&self, name: &str, descriptor: FuncDescriptor) -> Result<()> {
        // the flag is only flipped under the write lock
        let mut funcs = self.funcs.write();
        if self.is_frozen() {
            return Err(Error::RegistryFrozen {
                name: name.to_string(),
            });
        }
        let key = name.to_lowercase();
        log::debug!("registering function {key}/{}", descriptor.arity);
        funcs.insert(key.clone(), Arc::new(descriptor.named(&key)));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<FuncDescriptor>> {
        self.funcs.read().get(&name.to_lowercase()).cloned()
    }

    /// Make the registry read-only from now on.
    pub fn freeze(&self) {
        let _funcs = self.funcs.write();
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.funcs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static BUILTINS: LazyLock<FunctionRegistry> = LazyLock::new(|| {
    let registry = FunctionRegistry::with_builtins();
    registry.freeze();
    registry
});

/// The frozen, process-wide builtin registry used by the convenience entry
/// points ([`crate::parse_expression`] and friends).
pub fn builtins() -> &'static FunctionRegistry {
    &BUILTINS
}

fn builtin_descriptors() -> Vec<(&'static str, FuncDescriptor)> {
    vec![
        // Aggregates
        ("count", FuncDescriptor::new(1).aggregate()),
        ("sum", FuncDescriptor::new(1).aggregate()),
        ("avg", FuncDescriptor::new(1).aggregate()),
        ("min", FuncDescriptor::new(1).aggregate()),
        ("max", FuncDescriptor::new(1).aggregate()),
        // Casts
        ("tostring", FuncDescriptor::new(1)),
        ("toint", FuncDescriptor::new(1)),
        ("tonumber", FuncDescriptor::new(1)),
        ("todate", FuncDescriptor::new(1).variadic()),
        // Strings and collections
        ("len", FuncDescriptor::new(1)),
        ("contains", FuncDescriptor::new(2)),
        ("lower", FuncDescriptor::new(1)),
        ("upper", FuncDescriptor::new(1)),
        ("join", FuncDescriptor::new(1).variadic()),
        ("split", FuncDescriptor::new(2)),
        ("hasprefix", FuncDescriptor::new(2)),
        ("hassuffix", FuncDescriptor::new(2)),
        // Logic
        ("exists", FuncDescriptor::new(1)),
        ("eq", FuncDescriptor::new(2)),
        ("now", FuncDescriptor::new(0)),
        // Urls and email
        ("email", FuncDescriptor::new(1)),
        ("domain", FuncDescriptor::new(1)),
        ("host", FuncDescriptor::new(1)),
        ("path", FuncDescriptor::new(1)),
        ("qs", FuncDescriptor::new(2)),
        ("url", FuncDescriptor::new(1)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_case_insensitive() {
        let registry = FunctionRegistry::new();
        registry.register("MyFunc", FuncDescriptor::new(2)).unwrap();
        assert!(registry.resolve("myfunc").is_some());
        assert!(registry.resolve("MYFUNC").is_some());
        assert!(registry.resolve("other").is_none());
        assert_eq!(registry.resolve("MyFunc").unwrap().name, "myfunc");
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = FunctionRegistry::new();
        registry.register("f", FuncDescriptor::new(1)).unwrap();
        registry.register("F", FuncDescriptor::new(3).aggregate()).unwrap();
        let desc = registry.resolve("f").unwrap();
        assert_eq!(desc.arity, 3);
        assert!(desc.aggregate);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_frozen_registry_rejects_registration() {
        let registry = FunctionRegistry::new();
        registry.freeze();
        assert!(matches!(
            registry.register("f", FuncDescriptor::new(1)),
            Err(Error::RegistryFrozen { name }) if name == "f"
        ));
    }

    #[test]
    fn test_arity_rules() {
        let fixed = FuncDescriptor::new(2);
        assert!(fixed.accepts(2));
        assert!(!fixed.accepts(1));
        assert!(!fixed.accepts(3));

        let variadic = FuncDescriptor::new(1).variadic();
        assert!(!variadic.accepts(0));
        assert!(variadic.accepts(1));
        assert!(variadic.accepts(5));

        assert!(FuncDescriptor::placeholder("f").accepts(42));
    }

    #[test]
    fn test_arity_error_names_function() {
        let err = FuncDescriptor::new(2).check_arity_for("f", 1).unwrap_err();
        assert!(matches!(
            err,
            Error::ArityMismatch { ref func_name, got: 1, .. } if func_name == "f"
        ));
    }

    #[test]
    fn test_builtins_are_frozen() {
        assert!(builtins().is_frozen());
        assert!(builtins().resolve("tostring").is_some());
        assert!(builtins().resolve("count").unwrap().aggregate);
        assert_eq!(builtins().resolve("ToString").unwrap().name, "tostring");
    }

    #[test]
    fn test_placeholder_is_name_only() {
        let desc = FuncDescriptor::placeholder("Mystery");
        assert_eq!(desc.name, "Mystery");
        assert!(desc.is_placeholder());
        assert!(!desc.aggregate);
    }

    #[test]
    fn test_nothing_registers_after_freeze_returns() {
        let registry = Arc::new(FunctionRegistry::new());
        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let mut i = 0;
                while registry.register(&format!("f{i}"), FuncDescriptor::new(1)).is_ok() {
                    i += 1;
                }
                i
            })
        };
        while registry.is_empty() {
            std::thread::yield_now();
        }
        registry.freeze();
        let frozen_len = registry.len();

        let registered = writer.join().unwrap();
        assert_eq!(registry.len(), frozen_len);
        assert_eq!(registered, frozen_len);
    }
}
