//! Last-writer-wins sequencing for overlapping prediction requests.
//!
//! Every dispatch takes a fresh token. A completion may touch visible state
//! only while its token is still the latest one issued. Token issue and
//! compare-and-apply share one lock, so a newer dispatch can never slip in
//! between the comparison and the update.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Dispatch-order identifier. The first token issued is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct StaleGuard {
    latest: Mutex<u64>,
}

impl StaleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        // the counter is a plain integer, a poisoned lock still holds a valid value
        self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issues the token for a new dispatch. Called before the request is sent.
    pub fn next_token(&self) -> RequestToken {
        let mut latest = self.lock();
        *latest += 1;
        RequestToken(*latest)
    }

    /// Most recently issued token, `None` before the first dispatch.
    pub fn latest(&self) -> Option<RequestToken> {
        match *self.lock() {
            0 => None,
            n => Some(RequestToken(n)),
        }
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        *self.lock() == token.0
    }

    /// Runs `apply` iff `token` is still the latest, holding the lock for the
    /// duration so no newer token can be issued mid-update. Returns whether
    /// it ran.
    pub fn apply_if_latest<F: FnOnce()>(&self, token: RequestToken, apply: F) -> bool {
        let latest = self.lock();
        if *latest != token.0 {
            return false;
        }
        apply();
        drop(latest);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_tokens_increase_by_one() {
        let guard = StaleGuard::new();
        assert_eq!(guard.latest(), None);
        let tokens: Vec<u64> = (0..5).map(|_| guard.next_token().value()).collect();
        assert_eq!(tokens, vec![1, 2, 3, 4, 5]);
        assert_eq!(guard.latest().map(|t| t.value()), Some(5));
    }

    #[test]
    fn test_single_dispatch_is_latest() {
        let guard = StaleGuard::new();
        let t = guard.next_token();
        assert!(guard.is_latest(t));
        let mut applied = 0;
        assert!(guard.apply_if_latest(t, || applied += 1));
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_superseded_token_is_not_applied() {
        let guard = StaleGuard::new();
        let a = guard.next_token();
        let b = guard.next_token();
        let mut applied = Vec::new();
        // b answers first, then a arrives late
        assert!(guard.apply_if_latest(b, || applied.push(b)));
        assert!(!guard.apply_if_latest(a, || applied.push(a)));
        assert_eq!(applied, vec![b]);
        assert!(!guard.is_latest(a));
    }

    #[test]
    fn test_concurrent_issue_never_repeats() {
        let guard = Arc::new(StaleGuard::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = guard.clone();
                thread::spawn(move || (0..500).map(|_| g.next_token().value()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=4000).collect::<Vec<u64>>());
    }

    #[test]
    fn test_parallel_applies_are_strictly_ordered() {
        let guard = Arc::new(StaleGuard::new());
        let applied = Arc::new(Mutex::new(Vec::new()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let g = guard.clone();
                let log = applied.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let t = g.next_token();
                        thread::yield_now();
                        g.apply_if_latest(t, || log.lock().unwrap().push(t.value()));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let applied = applied.lock().unwrap();
        assert!(!applied.is_empty());
        assert!(applied.windows(2).all(|w| w[0] < w[1]));
    }
}
