//! Operation Budget - run-wide cap on task attempts shared by all workers

use std::sync::atomic::{AtomicU64, Ordering};

/// Run-level cap on the number of attempts across all workers
///
/// A worker reserves a slot before it starts an attempt. A reserved slot is
/// consumed even if the attempt is later abandoned by a stop request, so the
/// number of recorded events never exceeds the limit.
#[derive(Debug)]
pub struct OperationBudget {
    limit: u64,
    reserved: AtomicU64,
}

impl OperationBudget {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            reserved: AtomicU64::new(0),
        }
    }

    /// Reserve one attempt; `false` once the budget is spent
    pub fn try_reserve(&self) -> bool {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.limit).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn reserved(&self) -> u64 {
        self.reserved.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.reserved() >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_reserve_until_exhausted() {
        let budget = OperationBudget::new(3);

        assert!(budget.try_reserve());
        assert!(budget.try_reserve());
        assert!(budget.try_reserve());
        assert!(!budget.try_reserve());
        assert!(budget.is_exhausted());
        assert_eq!(budget.reserved(), 3);
    }

    #[test]
    fn test_concurrent_reservations_never_overshoot() {
        let budget = Arc::new(OperationBudget::new(1000));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = budget.clone();
                std::thread::spawn(move || {
                    let mut granted = 0u64;
                    while budget.try_reserve() {
                        granted += 1;
                    }
                    granted
                })
            })
            .collect();

        let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 1000);
        assert_eq!(budget.reserved(), 1000);
    }
}
