//! The context handed to every operation that can end the main loop.
//!
//! There is no process-global "quit" flag. Hooks, click handlers and the
//! loop itself receive a `&mut LoopContext`; signal handlers write to the
//! shared atomic returned by [`LoopContext::signal_flag`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown state for one run of the main loop.
#[derive(Debug, Default)]
pub struct LoopContext {
    /// Set asynchronously by SIGINT/SIGTERM handlers
    signal_flag: Arc<AtomicBool>,
    /// Set synchronously by hooks (e.g. `quit_panel`)
    requested: bool,
}

impl LoopContext {
    /// Create a context with a fresh, unset signal flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context observing a flag that signal handlers were already
    /// registered with.
    pub fn with_signal_flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            signal_flag: flag,
            requested: false,
        }
    }

    /// The flag signal handlers should set.
    pub fn signal_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.signal_flag)
    }

    /// Ask the main loop to stop at its next check point.
    pub fn request_shutdown(&mut self) {
        if !self.requested {
            tracing::info!("shutdown requested");
        }
        self.requested = true;
    }

    /// Returns true if a hook asked for shutdown or a signal arrived.
    pub fn shutdown_requested(&self) -> bool {
        self.requested || self.interrupted()
    }

    /// Returns true if a termination signal arrived.
    pub fn interrupted(&self) -> bool {
        self.signal_flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shutdown() {
        let mut cx = LoopContext::new();
        assert!(!cx.shutdown_requested());
        cx.request_shutdown();
        assert!(cx.shutdown_requested());
        assert!(!cx.interrupted());
    }

    #[test]
    fn test_signal_flag_is_shared() {
        let cx = LoopContext::new();
        let flag = cx.signal_flag();
        flag.store(true, Ordering::Relaxed);
        assert!(cx.interrupted());
        assert!(cx.shutdown_requested());
    }

    #[test]
    fn test_with_signal_flag_observes_existing_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let cx = LoopContext::with_signal_flag(Arc::clone(&flag));
        assert!(!cx.interrupted());
        flag.store(true, Ordering::Relaxed);
        assert!(cx.interrupted());
        assert!(Arc::ptr_eq(&cx.signal_flag(), &flag));
    }
}
