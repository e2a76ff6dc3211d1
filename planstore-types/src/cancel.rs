//! Cooperative cancellation.
//!
//! Long-running work (replaying a transmission log, bulk copies) takes a
//! [`CancellationToken`] and polls it between units of work. Nothing is ever
//! torn down forcibly; the worker notices and unwinds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared cancellation flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Clears a previous request so the token can be reused.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// The two independent cancellation scopes a hosting process holds when the
/// same binary runs both client-role and server-role work.
#[derive(Debug, Clone, Default)]
pub struct CancellationScopes {
    pub client: CancellationToken,
    pub server: CancellationToken,
}

impl CancellationScopes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
