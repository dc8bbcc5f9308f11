pub mod queue;

use std::sync::atomic::{AtomicU8, Ordering};

pub use crate::queue::{submit_queue, QueueClosed, SubmitQueue, SubmitWorker};

/// Atomic counter that generates u8 transaction IDs.
///
/// IDs are allocated by pre-increment and wrap from 255 back to 1, so 0 is
/// never handed out and any window of 255 consecutive allocations is
/// collision-free.
#[derive(Default)]
pub struct TransactionIds(AtomicU8);

impl TransactionIds {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn next(&self) -> u8 {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = if current >= 255 { 1 } else { current + 1 };
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        let ids = TransactionIds::new();
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
    }

    #[test]
    fn ids_wrap_to_one_and_never_zero() {
        let ids = TransactionIds::new();
        for expected in 1..=255 {
            assert_eq!(ids.next(), expected);
        }
        assert_eq!(ids.next(), 1);
    }

    #[test]
    fn any_255_window_is_distinct() {
        let ids = TransactionIds::new();
        // Offset the counter so the window straddles the wrap point.
        for _ in 0..200 {
            ids.next();
        }

        let mut seen = [false; 256];
        for _ in 0..255 {
            let id = ids.next() as usize;
            assert!(!seen[id], "duplicate ID {}", id);
            seen[id] = true;
        }
        assert!(!seen[0]);
    }
}
