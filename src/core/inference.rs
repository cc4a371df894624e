//! Pooled access to inference engines.
//!
//! Native inference engines are rarely safe to call from several threads at
//! once. [`EnginePool`] holds a bounded set of engine handles, each behind its
//! own mutex, and hands them out to region workers. A pool of one is the
//! "single shared instance behind a mutex" policy; a pool sized to the worker
//! count gives every worker its own instance. The number of regions in an
//! image never changes how many engines are alive.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};
use tracing::debug;

use crate::core::OCRError;

/// A bounded set of engine handles shared by region workers.
pub struct EnginePool<E: ?Sized> {
    /// Engine handles; each is used by at most one worker at a time.
    engines: Vec<Mutex<Box<E>>>,
    /// Next index for round-robin handle selection.
    next_idx: AtomicUsize,
    /// Name used in error context.
    name: String,
}

impl<E: ?Sized> std::fmt::Debug for EnginePool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginePool")
            .field("name", &self.name)
            .field("engines", &self.engines.len())
            .finish()
    }
}

impl<E: ?Sized + Send> EnginePool<E> {
    /// Creates a pool from existing engine instances.
    ///
    /// Returns a configuration error when `engines` is empty.
    pub fn new(name: impl Into<String>, engines: Vec<Box<E>>) -> Result<Self, OCRError> {
        let name = name.into();
        if engines.is_empty() {
            return Err(OCRError::config_error(format!(
                "engine pool '{}' needs at least one engine instance",
                name
            )));
        }

        Ok(Self {
            engines: engines.into_iter().map(Mutex::new).collect(),
            next_idx: AtomicUsize::new(0),
            name,
        })
    }

    /// Creates a pool holding a single shared engine.
    pub fn single(name: impl Into<String>, engine: Box<E>) -> Self {
        Self {
            engines: vec![Mutex::new(engine)],
            next_idx: AtomicUsize::new(0),
            name: name.into(),
        }
    }

    /// Creates `size` engines with `factory` (at least one).
    pub fn from_factory<F>(name: impl Into<String>, size: usize, mut factory: F) -> Result<Self, OCRError>
    where
        F: FnMut() -> Result<Box<E>, OCRError>,
    {
        let name = name.into();
        let size = size.max(1);
        let mut engines = Vec::with_capacity(size);
        for _ in 0..size {
            engines.push(factory()?);
        }
        debug!("Created engine pool '{}' with {} instances", name, size);
        Self::new(name, engines)
    }

    /// Number of engine handles in the pool.
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Always false; a pool holds at least one engine.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Name of the pool.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `f` with exclusive access to one engine handle.
    ///
    /// Free handles are preferred, starting from the round-robin position;
    /// when every handle is busy the caller blocks on the round-robin one.
    pub fn with_engine<R, F>(&self, f: F) -> Result<R, OCRError>
    where
        F: FnOnce(&mut E) -> Result<R, OCRError>,
    {
        let count = self.engines.len();
        let start = self.next_idx.fetch_add(1, Ordering::Relaxed) % count;

        for offset in 0..count {
            let idx = (start + offset) % count;
            match self.engines[idx].try_lock() {
                Ok(mut guard) => return f(&mut **guard),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => return Err(self.poisoned(idx)),
            }
        }

        let mut guard = self.engines[start]
            .lock()
            .map_err(|_| self.poisoned(start))?;
        f(&mut **guard)
    }

    fn poisoned(&self, idx: usize) -> OCRError {
        OCRError::inference_message(
            &self.name,
            format!(
                "engine handle {}/{} is poisoned by an earlier panic",
                idx,
                self.engines.len()
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    trait Counter: Send {
        fn bump(&mut self) -> usize;
    }

    struct Exclusive {
        busy: Arc<AtomicBool>,
        calls: usize,
    }

    impl Counter for Exclusive {
        fn bump(&mut self) -> usize {
            // Two workers inside the same handle would trip this flag.
            assert!(!self.busy.swap(true, Ordering::SeqCst));
            std::thread::sleep(std::time::Duration::from_millis(1));
            self.busy.store(false, Ordering::SeqCst);
            self.calls += 1;
            self.calls
        }
    }

    fn exclusive() -> Box<dyn Counter> {
        Box::new(Exclusive {
            busy: Arc::new(AtomicBool::new(false)),
            calls: 0,
        })
    }

    #[test]
    fn test_empty_pool_is_config_error() {
        let result = EnginePool::<dyn Counter>::new("empty", Vec::new());
        assert!(matches!(result, Err(OCRError::ConfigError { .. })));
    }

    #[test]
    fn test_from_factory_creates_requested_instances() {
        let mut created = 0;
        let pool = EnginePool::<dyn Counter>::from_factory("counter", 3, || {
            created += 1;
            Ok(exclusive())
        })
        .unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(created, 3);
    }

    #[test]
    fn test_factory_error_propagates() {
        let result = EnginePool::<dyn Counter>::from_factory("counter", 2, || {
            Err(OCRError::config_error("model missing"))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_shared_engine_is_never_entered_concurrently() {
        let pool = EnginePool::single("shared", exclusive());

        let total: usize = (0..32)
            .into_par_iter()
            .map(|_| pool.with_engine(|engine| Ok(engine.bump())).unwrap())
            .count();
        assert_eq!(total, 32);

        let calls = pool.with_engine(|engine| Ok(engine.bump())).unwrap();
        assert_eq!(calls, 33);
    }

    #[test]
    fn test_errors_from_closure_pass_through() {
        let pool = EnginePool::single("shared", exclusive());
        let result: Result<(), OCRError> =
            pool.with_engine(|_| Err(OCRError::inference_message("shared", "fault")));
        assert!(matches!(result, Err(OCRError::Inference { .. })));
    }
}
