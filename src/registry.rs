//! Dependency registry with lazily-constructed entries.
//!
//! Services are registered as factories and constructed on first
//! resolution, so registering a service that is never used costs nothing.
//! Setting an existing key replaces the prior binding.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;

use crate::error::{AppError, AppResult};

/// A memoized lazy provider.
///
/// Holds a construction function and caches the value built on first
/// access; later accesses return the cached value. Construction errors are
/// returned to the caller and the construction is retried on the next
/// access. Concurrent first access constructs exactly once.
pub struct Provider<T> {
    init: Box<dyn Fn() -> AppResult<T> + Send + Sync>,
    cell: OnceCell<Arc<T>>,
}

impl<T: Send + Sync + 'static> Provider<T> {
    pub fn new(init: impl Fn() -> AppResult<T> + Send + Sync + 'static) -> Self {
        Self {
            init: Box::new(init),
            cell: OnceCell::new(),
        }
    }

    /// Resolve the value, constructing it on first access.
    pub fn get(&self) -> AppResult<Arc<T>> {
        self.cell
            .get_or_try_init(|| (self.init)().map(Arc::new))
            .map(Arc::clone)
    }

    /// Whether the value has been constructed.
    pub fn initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

trait AnyProvider: Send + Sync {
    fn initialized(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Send + Sync + 'static> AnyProvider for Provider<T> {
    fn initialized(&self) -> bool {
        Provider::initialized(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// String-keyed service container backing the application.
///
/// Entries are lazy [`Provider`]s. Registration is last-write-wins.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Arc<dyn AnyProvider>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazy factory under `key`, replacing any prior binding.
    pub fn set<T, F>(&self, key: &str, init: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> AppResult<T> + Send + Sync + 'static,
    {
        let provider: Arc<dyn AnyProvider> = Arc::new(Provider::new(init));
        self.entries
            .write()
            .expect("registry lock poisoned")
            .insert(key.to_string(), provider);
    }

    /// Resolve the service under `key`, constructing it on first access.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> AppResult<Arc<T>> {
        let entry = self
            .entries
            .read()
            .expect("registry lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("no service registered under key {key:?}")))?;

        let provider = entry
            .as_any()
            .downcast_ref::<Provider<T>>()
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "service {key:?} is not of the requested type"
                ))
            })?;

        provider.get()
    }

    /// Whether a binding exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .contains_key(key)
    }

    /// Whether the binding under `key` exists and has been constructed.
    pub fn is_initialized(&self, key: &str) -> bool {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .get(key)
            .is_some_and(|entry| entry.initialized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn test_get_is_lazy_and_memoized() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructions);

        let registry = Registry::new();
        registry.set("answer", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42u32)
        });

        assert!(!registry.is_initialized("answer"));
        assert_eq!(constructions.load(Ordering::SeqCst), 0);

        let first = registry.get::<u32>("answer").unwrap();
        let second = registry.get::<u32>("answer").unwrap();

        assert_eq!(*first, 42);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_initialized("answer"));
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_overwrites_prior_binding() {
        let registry = Registry::new();
        registry.set("value", || Ok("first".to_string()));
        registry.set("value", || Ok("second".to_string()));

        let resolved = registry.get::<String>("value").unwrap();
        assert_eq!(*resolved, "second");
    }

    #[test]
    fn test_missing_key_errors() {
        let registry = Registry::new();
        assert!(registry.get::<u32>("nothing").is_err());
        assert!(!registry.contains("nothing"));
    }

    #[test]
    fn test_type_mismatch_errors() {
        let registry = Registry::new();
        registry.set("value", || Ok(7u32));
        assert!(registry.get::<String>("value").is_err());
    }

    #[test]
    fn test_failed_construction_is_retried() {
        let should_fail = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&should_fail);

        let registry = Registry::new();
        registry.set("flaky", move || {
            if flag.load(Ordering::SeqCst) {
                Err(AppError::Internal("not ready".to_string()))
            } else {
                Ok(1u8)
            }
        });

        assert!(registry.get::<u8>("flaky").is_err());
        assert!(!registry.is_initialized("flaky"));

        should_fail.store(false, Ordering::SeqCst);
        assert_eq!(*registry.get::<u8>("flaky").unwrap(), 1);
    }

    #[test]
    fn test_concurrent_first_access_constructs_once() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructions);

        let registry = Arc::new(Registry::new());
        registry.set("shared", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("built".to_string())
        });

        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.get::<String>("shared").unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(*handle.join().unwrap(), "built");
        }
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }
}
