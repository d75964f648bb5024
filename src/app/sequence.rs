//! Last-request-wins sequencing for concurrent analyses.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Issues monotonically increasing tokens; only the newest one is current.
///
/// Shared by the thread that starts requests and the threads that finish them.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, superseding every earlier one.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether a result carrying `token` may still be applied.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::Acquire) == token.0
    }

    /// Invalidate whatever is in flight without starting anything new.
    pub fn supersede(&self) {
        self.issue();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn only_the_latest_token_is_current() {
        let seq = RequestSequencer::new();
        let first = seq.issue();
        assert!(seq.is_current(first));

        let second = seq.issue();
        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));

        seq.supersede();
        assert!(!seq.is_current(second));
    }

    #[test]
    fn out_of_order_completion_keeps_the_newest() {
        let seq = Arc::new(RequestSequencer::new());
        let slow = seq.issue();
        let fast = seq.issue();

        // The fast request finishes first and is applied; the slow one is then discarded.
        let mut applied = Vec::new();
        for token in [fast, slow] {
            if seq.is_current(token) {
                applied.push(token);
            }
        }
        assert_eq!(applied, vec![fast]);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = Arc::clone(&seq);
                thread::spawn(move || seq.issue())
            })
            .collect();
        let tokens: Vec<RequestToken> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(tokens.iter().filter(|t| seq.is_current(**t)).count(), 1);
    }
}
