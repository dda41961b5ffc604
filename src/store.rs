//! Payment result persistence.
//!
//! The reference deployment keeps results in memory for the lifetime of the
//! process; the trait keeps the backing store pluggable.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::PaymentResult;

/// Mapping from transaction id to final payment result.
///
/// `save` is last-writer-wins per transaction id, and a completed `save` is
/// visible to any subsequent `get`.
pub trait PaymentStore: Send + Sync {
    fn save(&self, result: PaymentResult);
    fn get(&self, transaction_id: &str) -> Option<PaymentResult>;
}

pub struct InMemoryPaymentStore {
    results: RwLock<HashMap<String, PaymentResult>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self {
            results: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPaymentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentStore for InMemoryPaymentStore {
    fn save(&self, result: PaymentResult) {
        let mut results = self.results.write().expect("payment store lock poisoned");
        results.insert(result.transaction_id.clone(), result);
    }

    fn get(&self, transaction_id: &str) -> Option<PaymentResult> {
        let results = self.results.read().expect("payment store lock poisoned");
        results.get(transaction_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentStatus;
    use std::sync::Arc;

    #[test]
    fn save_then_get_round_trips() {
        let store = InMemoryPaymentStore::new();
        store.save(PaymentResult::new("tx-100", PaymentStatus::Approved));

        let stored = store.get("tx-100").expect("result should be found");
        assert_eq!(stored.transaction_id, "tx-100");
        assert_eq!(stored.status, PaymentStatus::Approved);

        assert!(store.get("tx-missing").is_none());
    }

    #[test]
    fn save_overwrites_by_transaction_id() {
        let store = InMemoryPaymentStore::new();
        store.save(PaymentResult::new("tx-100", PaymentStatus::Declined));
        store.save(PaymentResult::new("tx-100", PaymentStatus::Approved));

        let stored = store.get("tx-100").unwrap();
        assert_eq!(stored.status, PaymentStatus::Approved);
    }

    #[test]
    fn concurrent_save_and_get() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let mut handles = Vec::new();

        for i in 0..100 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let id = format!("tx-{i}");
                store.save(PaymentResult::new(&id, PaymentStatus::Approved));
                store.get(&id)
            }));
        }

        for handle in handles {
            let fetched = handle.join().unwrap();
            assert!(fetched.is_some());
        }
    }
}
