use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{CoreError, CoreErrorKind};
use crate::strategies::{self, TaskStrategy};

pub type RegistryResult<T> = Result<T, CoreError>;

#[derive(Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn TaskStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks the builtin registration list once. A constructor failure skips
    /// that strategy; a duplicate name is a startup integrity error.
    pub fn builtin() -> RegistryResult<Self> {
        let mut registry = Self::new();
        for (name, constructor) in strategies::builtin_registrations() {
            match constructor() {
                Ok(strategy) => registry.register(strategy)?,
                Err(error) => {
                    tracing::warn!(
                        strategy = name,
                        kind = ?error.kind,
                        message = %error.message,
                        "skipping strategy registration"
                    );
                }
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, strategy: Arc<dyn TaskStrategy>) -> RegistryResult<()> {
        let key = strategy.name().to_ascii_lowercase();
        if self.strategies.contains_key(&key) {
            return Err(CoreError {
                strategy: Some(key),
                task: None,
                kind: CoreErrorKind::InvalidInput,
                message: format!("strategy '{}' is already registered", strategy.name()),
            });
        }
        self.strategies.insert(key, strategy);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> RegistryResult<Arc<dyn TaskStrategy>> {
        let key = name.to_ascii_lowercase();
        self.strategies.get(&key).cloned().ok_or_else(|| CoreError {
            strategy: Some(name.to_string()),
            task: None,
            kind: CoreErrorKind::NotFound,
            message: format!(
                "strategy '{name}' not found; available: {:?}",
                self.names()
            ),
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.strategies.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }
}
