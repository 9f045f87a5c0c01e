use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::CartEntry;

/// Per-session spare-part cart. Checkout reads it once to freeze the
/// snapshot onto the payment; settlement clears it once on BUY success.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds an entry, merging quantity with an existing entry for the
    /// same spare part. The first price seen wins for the session.
    async fn add(&self, session: &str, entry: CartEntry) -> Result<()>;

    /// Returns a copy of the session's entries.
    async fn snapshot(&self, session: &str) -> Result<Vec<CartEntry>>;

    async fn clear(&self, session: &str) -> Result<()>;
}

/// In-memory cart store keyed by session id.
#[derive(Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<String, Vec<CartEntry>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn add(&self, session: &str, entry: CartEntry) -> Result<()> {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(session.to_string()).or_default();

        match cart.iter_mut().find(|e| e.spare_part_id == entry.spare_part_id) {
            Some(existing) => existing.quantity += entry.quantity,
            None => cart.push(entry),
        }
        Ok(())
    }

    async fn snapshot(&self, session: &str) -> Result<Vec<CartEntry>> {
        let carts = self.carts.read().await;
        Ok(carts.get(session).cloned().unwrap_or_default())
    }

    async fn clear(&self, session: &str) -> Result<()> {
        self.carts.write().await.remove(session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn entry(part: Uuid, quantity: i32) -> CartEntry {
        CartEntry {
            spare_part_id: part,
            quantity,
            unit_price: dec!(50),
        }
    }

    #[tokio::test]
    async fn test_add_merges_same_part() {
        let store = InMemoryCartStore::new();
        let part = Uuid::new_v4();

        store.add("s1", entry(part, 1)).await.unwrap();
        store.add("s1", entry(part, 2)).await.unwrap();

        let snapshot = store.snapshot("s1").await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryCartStore::new();
        store.add("s1", entry(Uuid::new_v4(), 1)).await.unwrap();

        assert!(store.snapshot("s2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_session() {
        let store = InMemoryCartStore::new();
        store.add("s1", entry(Uuid::new_v4(), 1)).await.unwrap();
        store.clear("s1").await.unwrap();

        assert!(store.snapshot("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_a_copy() {
        let store = InMemoryCartStore::new();
        let part = Uuid::new_v4();
        store.add("s1", entry(part, 1)).await.unwrap();

        let frozen = store.snapshot("s1").await.unwrap();
        store.add("s1", entry(part, 5)).await.unwrap();

        // Later cart mutation must not affect an earlier snapshot.
        assert_eq!(frozen[0].quantity, 1);
    }
}
