//! Explicit logging context passed through the tree reader.
//!
//! Events themselves go through `tracing`; [`LogContext`] only decides how
//! much detail a component emits. Each partition owns one context, so the
//! verbosity is a plain [`Cell`]. Temporary adjustments go through
//! [`LogContext::quieter`], whose guard restores the previous level on
//! drop, including on early return through `?`.

use std::cell::Cell;

/// Detail level of a log event. Lower levels are shown more often.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Detail {
    /// Run-level progress and anomaly totals.
    Summary = 0,
    /// Per-snapshot statistics.
    Snapshot = 1,
    /// Per-pointer-file statistics.
    Pointers = 2,
}

/// Verbosity handle for one partition's read.
#[derive(Debug)]
pub struct LogContext {
    verbosity: Cell<i32>,
}

impl LogContext {
    /// Verbosity that shows every [`Detail`] level.
    pub const DEFAULT_VERBOSITY: i32 = Detail::Pointers as i32;

    /// Create a context at the given verbosity.
    pub fn new(verbosity: i32) -> Self {
        Self {
            verbosity: Cell::new(verbosity),
        }
    }

    /// A context that suppresses every level.
    pub fn silent() -> Self {
        Self::new(-1)
    }

    /// Current verbosity.
    pub fn verbosity(&self) -> i32 {
        self.verbosity.get()
    }

    /// Whether events at `detail` should be emitted.
    pub fn shows(&self, detail: Detail) -> bool {
        detail as i32 <= self.verbosity.get()
    }

    /// Lower the verbosity by `by` until the returned guard is dropped.
    #[must_use = "verbosity is restored as soon as the guard is dropped"]
    pub fn quieter(&self, by: i32) -> VerbosityGuard<'_> {
        let saved = self.verbosity.get();
        self.verbosity.set(saved - by);
        VerbosityGuard { ctx: self, saved }
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VERBOSITY)
    }
}

/// Restores a [`LogContext`]'s verbosity when dropped.
#[derive(Debug)]
pub struct VerbosityGuard<'a> {
    ctx: &'a LogContext,
    saved: i32,
}

impl Drop for VerbosityGuard<'_> {
    fn drop(&mut self) {
        self.ctx.verbosity.set(self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shows_everything() {
        let log = LogContext::default();
        assert!(log.shows(Detail::Summary));
        assert!(log.shows(Detail::Pointers));
    }

    #[test]
    fn silent_shows_nothing() {
        let log = LogContext::silent();
        assert!(!log.shows(Detail::Summary));
    }

    #[test]
    fn quieter_restores_on_drop() {
        let log = LogContext::default();
        {
            let _quiet = log.quieter(1);
            assert!(!log.shows(Detail::Pointers));
            assert!(log.shows(Detail::Snapshot));
            {
                let _quieter = log.quieter(1);
                assert!(!log.shows(Detail::Snapshot));
            }
            assert!(log.shows(Detail::Snapshot));
        }
        assert_eq!(log.verbosity(), LogContext::DEFAULT_VERBOSITY);
    }

    #[test]
    fn quieter_restores_on_early_return() {
        fn fails(log: &LogContext) -> Result<(), ()> {
            let _quiet = log.quieter(2);
            Err(())
        }
        let log = LogContext::new(1);
        assert!(fails(&log).is_err());
        assert_eq!(log.verbosity(), 1);
    }
}
