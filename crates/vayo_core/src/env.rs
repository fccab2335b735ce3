//! Scoped process-environment overrides.
//!
//! Environment variables are process-global, so every override goes through
//! one lock. A [`ScopedEnv`] holds that lock for its whole lifetime and puts
//! back each variable it touched, newest change first, when dropped.

use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Exclusive, self-restoring view of the process environment.
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl Default for ScopedEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedEnv {
    /// Wait for the environment lock. A panicked previous holder has
    /// already restored its variables on unwind, so poisoning is ignored.
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Set `key=value` until this scope ends.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.apply(key, Some(value));
        self
    }

    /// Unset `key` until this scope ends.
    pub fn remove(mut self, key: &str) -> Self {
        self.apply(key, None);
        self
    }

    /// Change `key` mid-scope; `None` unsets it.
    pub fn apply(&mut self, key: &str, value: Option<&str>) {
        self.saved.push((key.to_string(), std::env::var_os(key)));
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(previous) => std::env::set_var(&key, previous),
                None => std::env::remove_var(&key),
            }
        }
    }
}
