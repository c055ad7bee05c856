//! The payment correlation record.
//!
//! One merchant transaction id is tracked per session, in session-scoped
//! storage. Starting a second payment before the first is verified
//! replaces the first id.

use clubhouse_common::{SharedStore, StorageError};
use tracing::{debug, warn};

pub const CORRELATION_KEY: &str = "current_transaction_id";

#[derive(Clone)]
pub struct CorrelationStore {
    store: SharedStore,
}

impl CorrelationStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn current(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .store
            .get(CORRELATION_KEY)?
            .filter(|id| !id.trim().is_empty()))
    }

    pub fn remember(&self, merchant_transaction_id: &str) -> Result<(), StorageError> {
        if let Some(previous) = self.current()? {
            if previous != merchant_transaction_id {
                warn!(
                    "replacing unverified payment {} with {}",
                    previous, merchant_transaction_id
                );
            }
        }
        self.store.set(CORRELATION_KEY, merchant_transaction_id)?;
        debug!("stored correlation id {}", merchant_transaction_id);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(CORRELATION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_common::MemoryStore;

    #[test]
    fn single_slot_keeps_latest_id() {
        let store = CorrelationStore::new(MemoryStore::shared());
        assert_eq!(store.current().unwrap(), None);

        store.remember("MT1").unwrap();
        store.remember("MT2").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("MT2"));

        store.clear().unwrap();
        assert_eq!(store.current().unwrap(), None);
    }
}
