//! Navigation tickets.
//!
//! Every navigation on a panel gets a ticket: a sequence number plus a
//! cancellation token. Issuing a new ticket cancels the previous one. Work
//! holding a stale ticket stops at its next suspension point without any
//! visible effect.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct NavigationTokens {
    latest: AtomicU64,
    cancel: Mutex<CancellationToken>,
}

impl NavigationTokens {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Issues a ticket, superseding whatever was in flight.
    pub fn issue(self: &Arc<Self>) -> NavTicket {
        let mut current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        mem::replace(&mut *current, token.clone()).cancel();
        NavTicket {
            seq,
            tokens: Arc::clone(self),
            cancel: token,
        }
    }

    /// Invalidates the in-flight ticket without issuing a new one.
    pub fn cancel_all(&self) {
        let current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        self.latest.fetch_add(1, Ordering::SeqCst);
        current.cancel();
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct NavTicket {
    seq: u64,
    tokens: Arc<NavigationTokens>,
    cancel: CancellationToken,
}

impl NavTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether this is still the panel's latest navigation.
    pub fn is_current(&self) -> bool {
        !self.cancel.is_cancelled() && self.tokens.latest() == self.seq
    }
}
