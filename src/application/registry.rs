//! Open-position registry
//!
//! The set of pair addresses with an open position, shared by the
//! orchestrator and every monitor. A pair enters the set through
//! [`OpenPositions::try_claim`] and leaves it when the returned
//! [`PositionClaim`] is dropped.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct OpenPositions {
    pairs: Arc<Mutex<HashSet<String>>>,
}

impl OpenPositions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked
        self.pairs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically reserve `pair_address`. Returns `None` if it is already held.
    pub fn try_claim(&self, pair_address: &str) -> Option<PositionClaim> {
        let inserted = self.lock().insert(pair_address.to_string());
        inserted.then(|| PositionClaim {
            pair_address: pair_address.to_string(),
            registry: self.clone(),
        })
    }

    pub fn contains(&self, pair_address: &str) -> bool {
        self.lock().contains(pair_address)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted copy of the held pairs
    pub fn snapshot(&self) -> Vec<String> {
        let mut pairs: Vec<String> = self.lock().iter().cloned().collect();
        pairs.sort();
        pairs
    }
}

/// Exclusive hold on one pair; releases it on drop.
#[derive(Debug)]
pub struct PositionClaim {
    pair_address: String,
    registry: OpenPositions,
}

impl PositionClaim {
    pub fn pair_address(&self) -> &str {
        &self.pair_address
    }
}

impl Drop for PositionClaim {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.pair_address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_exclusive() {
        let open = OpenPositions::new();
        let claim = open.try_claim("PairA").unwrap();
        assert_eq!(claim.pair_address(), "PairA");
        assert!(open.try_claim("PairA").is_none());
        assert!(open.contains("PairA"));
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let open = OpenPositions::new();
        {
            let _claim = open.try_claim("PairA").unwrap();
            let _other = open.try_claim("PairB").unwrap();
            assert_eq!(open.snapshot(), vec!["PairA", "PairB"]);
        }
        assert!(open.is_empty());
        assert!(open.try_claim("PairA").is_some());
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let open = OpenPositions::new();
        let barrier = Arc::new(std::sync::Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let open = open.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    // Leak the winning claim so the pair stays held
                    open.try_claim("PairA").map(std::mem::forget).is_some()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(open.contains("PairA"));
    }
}
