//! Order number generator backed by a persisted counter.
//!
//! Numbers are `ORD-NNNN`. The counter starts at 99 (first order is `ORD-0100`)
//! and every call consumes a number, whether or not the order is ever submitted.
//! A counter at `u64::MAX` restarts from the initial value.
//! The read-then-write is not guarded: callers that need exclusivity serialize
//! access themselves. Counters on different machines are independent.

use crate::db::LocalStore;
use crate::errors::AppError;

/// Store key of the last issued counter value.
pub const SEQUENCE_KEY: &str = "lfp_order_seq";

/// Counter value assumed when nothing usable is stored.
pub const INITIAL_SEQUENCE: u64 = 99;

/// Reserve the next order number.
pub async fn next_order_number(store: &dyn LocalStore) -> Result<String, AppError> {
    let last = store
        .get(SEQUENCE_KEY)
        .await?
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(INITIAL_SEQUENCE);

    let next = match last.checked_add(1) {
        Some(next) => next,
        None => {
            tracing::warn!("Order counter {} cannot advance, restarting", last);
            INITIAL_SEQUENCE + 1
        }
    };
    store.set(SEQUENCE_KEY, &next.to_string()).await?;

    Ok(format_order_number(next))
}

pub fn format_order_number(n: u64) -> String {
    format!("ORD-{:04}", n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_first_number_is_0100() {
        let store = MemoryStore::new();
        assert_eq!(next_order_number(&store).await.unwrap(), "ORD-0100");
        assert_eq!(store.get(SEQUENCE_KEY).await.unwrap().as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn test_continues_from_stored_value() {
        let store = MemoryStore::new();
        store.set(SEQUENCE_KEY, "41").await.unwrap();
        assert_eq!(next_order_number(&store).await.unwrap(), "ORD-0042");
        assert_eq!(store.get(SEQUENCE_KEY).await.unwrap().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_non_numeric_counter_falls_back() {
        let store = MemoryStore::new();
        store.set(SEQUENCE_KEY, "abc").await.unwrap();
        assert_eq!(next_order_number(&store).await.unwrap(), "ORD-0100");
    }

    #[tokio::test]
    async fn test_exhausted_counter_restarts() {
        let store = MemoryStore::new();
        store.set(SEQUENCE_KEY, &u64::MAX.to_string()).await.unwrap();
        assert_eq!(next_order_number(&store).await.unwrap(), "ORD-0100");
        assert_eq!(store.get(SEQUENCE_KEY).await.unwrap().as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn test_sequential_calls_are_distinct_and_increasing() {
        let store = MemoryStore::new();
        store.set(SEQUENCE_KEY, "9998").await.unwrap();

        let mut numbers = Vec::new();
        for _ in 0..4 {
            numbers.push(next_order_number(&store).await.unwrap());
        }

        assert_eq!(numbers, vec!["ORD-9999", "ORD-10000", "ORD-10001", "ORD-10002"]);
        assert_eq!(store.get(SEQUENCE_KEY).await.unwrap().as_deref(), Some("10002"));
    }
}
