//! Guarded Access Module
//!
//! Closure-scoped exclusive access to a value.

use parking_lot::Mutex;

// == Guarded ==
/// Owns a value and only lends it out for the duration of a closure.
///
/// Callers on other threads block until the closure returns. The lock is not
/// reentrant: calling `locked` again from inside the closure deadlocks.
#[derive(Debug, Default)]
pub struct Guarded<T> {
    inner: Mutex<T>,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    // == Locked ==
    /// Runs `action` with exclusive access to the guarded value.
    pub fn locked<R>(&self, action: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        action(&mut guard)
    }
}
