//! Cooperative stop signal shared by the long-running watcher threads.
//!
//! Watchers poll [`CancellationToken::is_cancelled`] between bounded
//! waits, so a stop takes effect within one wait timeout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
}

/// Cloneable stop flag.  Clones observe the same flag; a child token is
/// cancelled when either it or its parent is.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that can be cancelled on its own without touching `self`.
    pub fn child_token(&self) -> Self {
        Self {
            state: Arc::new(TokenState {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
            || self
                .state
                .parent
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
    }
}
