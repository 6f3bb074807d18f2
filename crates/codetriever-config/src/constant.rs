//! A single tagged, layered configuration constant.
//!
//! Resolution order for [`Constant::get`] is explicit `set` > environment
//! variable (coerced to the tag of the declared default) > default. A
//! constant declared [`Constant::frozen`] refuses `set` entirely, which is
//! used for values a misbehaving caller should never be able to override
//! at runtime (e.g. the embedding dimension baked into the index).

use crate::error::ConfigError;
use crate::value::ConfigValue;
use std::sync::RwLock;

/// A named, typed, layered configuration value.
pub struct Constant {
    name: &'static str,
    env_var: &'static str,
    default: ConfigValue,
    frozen: bool,
    explicit: RwLock<Option<ConfigValue>>,
}

impl Constant {
    /// Declare a constant read from `env_var`, falling back to `default`.
    #[must_use]
    pub const fn new(name: &'static str, env_var: &'static str, default: ConfigValue) -> Self {
        Self {
            name,
            env_var,
            default,
            frozen: false,
            explicit: RwLock::new(None),
        }
    }

    /// Declare a constant that can never be overridden with [`Constant::set`].
    #[must_use]
    pub const fn frozen(name: &'static str, env_var: &'static str, default: ConfigValue) -> Self {
        Self {
            name,
            env_var,
            default,
            frozen: true,
            explicit: RwLock::new(None),
        }
    }

    /// The constant's declared name (for error messages and logging).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve the constant's current value.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned, which only happens if a
    /// prior `set` call panicked mid-write.
    #[must_use]
    pub fn get(&self) -> ConfigValue {
        if let Some(explicit) = self.explicit.read().expect("constant lock poisoned").clone() {
            return explicit;
        }
        if let Ok(raw) = std::env::var(self.env_var) {
            return ConfigValue::coerce(&raw, &self.default);
        }
        self.default.clone()
    }

    /// Explicitly override the constant, bypassing environment and default.
    ///
    /// # Errors
    /// Returns [`ConfigError::Frozen`] if this constant was declared frozen.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn set(&self, value: ConfigValue) -> Result<(), ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen {
                name: self.name.to_string(),
            });
        }
        *self.explicit.write().expect("constant lock poisoned") = Some(value);
        Ok(())
    }

    /// Clear any explicit override, reverting to env/default resolution.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned.
    pub fn reset(&self) {
        *self.explicit.write().expect("constant lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_set_wins_over_default() {
        let c = Constant::new("TEST_A", "CODETRIEVER_TEST_CONSTANT_A", ConfigValue::Int(1));
        assert_eq!(c.get(), ConfigValue::Int(1));
        c.set(ConfigValue::Int(99)).unwrap();
        assert_eq!(c.get(), ConfigValue::Int(99));
    }

    #[test]
    fn frozen_constant_refuses_set() {
        let c = Constant::frozen("TEST_B", "CODETRIEVER_TEST_CONSTANT_B", ConfigValue::Int(7));
        let err = c.set(ConfigValue::Int(8)).unwrap_err();
        assert!(matches!(err, ConfigError::Frozen { .. }));
        assert_eq!(c.get(), ConfigValue::Int(7));
    }

    #[test]
    fn env_var_overrides_default_but_not_explicit_set() {
        // SAFETY: test-local env var name, no other test touches it concurrently
        // within this process thanks to serial execution of this module.
        unsafe {
            std::env::set_var("CODETRIEVER_TEST_CONSTANT_C", "42");
        }
        let c = Constant::new("TEST_C", "CODETRIEVER_TEST_CONSTANT_C", ConfigValue::Int(1));
        assert_eq!(c.get(), ConfigValue::Int(42));
        c.set(ConfigValue::Int(100)).unwrap();
        assert_eq!(c.get(), ConfigValue::Int(100));
        unsafe {
            std::env::remove_var("CODETRIEVER_TEST_CONSTANT_C");
        }
    }
}
