//! ID allocators.
//!
//! Two allocators implement [`IdAllocator`] over an [`AtomicCounterStore`]:
//!
//! - [`SimpleAllocator`] increments the counter on every request.
//! - [`BlockAllocator`] reserves blocks of IDs in one increment and serves
//!   requests from the held block, going back to the store only when the
//!   block runs out.
//!
//! # Design
//!
//! An increment of `size` that returns `new_total` reserves
//! `new_total - size + 1 ..= new_total` exclusively for the caller. Because the
//! store's increments are linearizable, the blocks handed to all allocators
//! sharing a key partition `1..=total` without overlap, so every ID is issued
//! at most once no matter how many processes share the counter.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::counter::AtomicCounterStore;
use crate::error::{Error, Result};
use crate::model::{CounterKey, ReservedBlock};

/// Default number of IDs reserved per round-trip by a [`BlockAllocator`].
pub const DEFAULT_BLOCK_SIZE: u64 = 100;

/// Issues globally unique, increasing IDs.
///
/// Callers depend on this trait rather than on a concrete allocator.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Returns the next ID.
    async fn next_id(&self) -> Result<u64>;

    /// Returns `count` IDs in increasing order.
    ///
    /// The IDs are consecutive unless a block allocator had to continue the
    /// range in a fresh block after another allocator on the same counter
    /// reserved IDs in between.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `count` is zero; no reservation is
    /// attempted in that case.
    async fn id_range(&self, count: u64) -> Result<Vec<u64>>;
}

fn validate_count(count: u64) -> Result<()> {
    if count == 0 {
        return Err(Error::InvalidInput(
            "count must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Reserves `size` IDs from the store.
async fn reserve(
    store: &dyn AtomicCounterStore,
    key: &CounterKey,
    size: u64,
) -> Result<ReservedBlock> {
    let new_total = store.increment_and_get(key, size).await?;
    let block = ReservedBlock::from_total(new_total, size)?;
    tracing::debug!(key = %key, start = block.start, end = block.end, "reserved id block");
    Ok(block)
}

/// Allocator that goes to the counter store on every request.
///
/// Each call is one increment, so ranges are reserved atomically and are
/// always contiguous.
pub struct SimpleAllocator {
    store: Arc<dyn AtomicCounterStore>,
    key: CounterKey,
    lock: Mutex<()>,
}

impl SimpleAllocator {
    pub fn new(store: Arc<dyn AtomicCounterStore>, key: CounterKey) -> Self {
        Self {
            store,
            key,
            lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &CounterKey {
        &self.key
    }
}

#[async_trait]
impl IdAllocator for SimpleAllocator {
    async fn next_id(&self) -> Result<u64> {
        let _guard = self.lock.lock().await;
        let block = reserve(self.store.as_ref(), &self.key, 1).await?;
        Ok(block.start)
    }

    async fn id_range(&self, count: u64) -> Result<Vec<u64>> {
        validate_count(count)?;
        let _guard = self.lock.lock().await;
        let block = reserve(self.store.as_ref(), &self.key, count).await?;
        Ok(block.ids())
    }
}

/// Allocates IDs from pre-reserved blocks.
///
/// The allocator holds at most one block. Its unissued part is kept as a
/// [`ReservedBlock`] whose `start` is the cursor: the next ID to hand out.
/// When nothing is left, the next request reserves a new block of
/// `block_size` IDs (or more, for a range request larger than that).
///
/// A range request drains the held block before reserving, and the unused
/// tail of the fresh block is kept for later calls, so no reserved ID is
/// ever dropped. If the fresh block does not directly follow the held one,
/// the range jumps over the IDs other allocators took in between.
///
/// # Thread Safety
///
/// All state sits behind one tokio mutex that every operation holds for its
/// whole duration, including while waiting on the store. Concurrent callers
/// queue behind a refill instead of racing it.
///
/// # Failures
///
/// A new state is computed on the side and committed only once every
/// reservation the call needs has succeeded. A failed increment therefore
/// leaves the held block and cursor exactly as they were.
pub struct BlockAllocator {
    store: Arc<dyn AtomicCounterStore>,
    key: CounterKey,
    block_size: u64,
    unissued: Mutex<Option<ReservedBlock>>,
}

impl BlockAllocator {
    /// Creates a block allocator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `block_size` is zero.
    pub fn new(
        store: Arc<dyn AtomicCounterStore>,
        key: CounterKey,
        block_size: u64,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::InvalidInput(
                "block_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            store,
            key,
            block_size,
            unissued: Mutex::new(None),
        })
    }

    pub fn key(&self) -> &CounterKey {
        &self.key
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Returns the ID the next [`next_id`](IdAllocator::next_id) call would
    /// return from the held block, or `None` if a reservation is needed first.
    ///
    /// This does not consume or reserve anything.
    pub async fn peek_next_id(&self) -> Option<u64> {
        self.unissued.lock().await.map(|block| block.start)
    }

    async fn reserve(&self, size: u64) -> Result<ReservedBlock> {
        reserve(self.store.as_ref(), &self.key, size).await
    }

    /// Takes `count` IDs, the held block first, then one fresh reservation
    /// of `max(block_size, shortfall)` if the held block runs short.
    ///
    /// Returns the taken IDs and the new unissued remainder. Nothing is
    /// committed here; the caller installs the remainder.
    async fn take(
        &self,
        held: Option<ReservedBlock>,
        count: u64,
    ) -> Result<(Vec<u64>, Option<ReservedBlock>)> {
        let mut ids = Vec::new();
        let mut remaining = count;

        if let Some(block) = held {
            let (taken, rest) = block.split_front(remaining);
            if rest.is_some() {
                return Ok((taken.ids(), rest));
            }
            ids.extend(taken.start..=taken.end);
            remaining -= taken.size();
            if remaining == 0 {
                return Ok((ids, None));
            }
        }

        let fresh = self.reserve(self.block_size.max(remaining)).await?;
        if let Some(leftover) = held.filter(|block| !block.is_followed_by(&fresh)) {
            // Another allocator reserved in between: the range is still
            // increasing but skips the IDs it took.
            tracing::debug!(
                key = %self.key,
                leftover_end = leftover.end,
                fresh_start = fresh.start,
                "range spans non-adjacent blocks"
            );
        }

        let (taken, rest) = fresh.split_front(remaining);
        ids.extend(taken.start..=taken.end);
        Ok((ids, rest))
    }
}

#[async_trait]
impl IdAllocator for BlockAllocator {
    async fn next_id(&self) -> Result<u64> {
        let mut unissued = self.unissued.lock().await;

        let block = match *unissued {
            Some(block) => block,
            None => self.reserve(self.block_size).await?,
        };
        let (taken, rest) = block.split_front(1);
        *unissued = rest;

        Ok(taken.start)
    }

    async fn id_range(&self, count: u64) -> Result<Vec<u64>> {
        validate_count(count)?;
        let mut unissued = self.unissued.lock().await;

        let (ids, rest) = self.take(*unissued, count).await?;
        *unissued = rest;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use common::StorageError;
    use common::storage::in_memory::{FailingStorage, InMemoryStorage};
    use rstest::rstest;

    use super::*;
    use crate::counter::StorageCounterStore;

    /// Counter store wrapper that counts increments.
    struct CountingStore {
        inner: StorageCounterStore,
        increments: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: StorageCounterStore::new(Arc::new(InMemoryStorage::new())),
                increments: AtomicUsize::new(0),
            })
        }

        fn increments(&self) -> usize {
            self.increments.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AtomicCounterStore for CountingStore {
        async fn initialize(&self, key: &CounterKey) -> Result<()> {
            self.inner.initialize(key).await
        }

        async fn increment_and_get(&self, key: &CounterKey, delta: u64) -> Result<u64> {
            self.increments.fetch_add(1, Ordering::SeqCst);
            self.inner.increment_and_get(key, delta).await
        }
    }

    fn test_key() -> CounterKey {
        CounterKey::new("global").unwrap()
    }

    fn block_allocator(store: Arc<dyn AtomicCounterStore>, block_size: u64) -> BlockAllocator {
        BlockAllocator::new(store, test_key(), block_size).unwrap()
    }

    #[test]
    fn should_reject_zero_block_size() {
        // given
        let store = CountingStore::new();

        // when
        let result = BlockAllocator::new(store, test_key(), 0);

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn should_issue_sequential_ids_from_fresh_counter() {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), 16);

        // when
        let mut ids = Vec::new();
        for _ in 0..10 {
            ids.push(allocator.next_id().await.unwrap());
        }

        // then
        assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
        assert_eq!(store.increments(), 1);
    }

    #[tokio::test]
    async fn should_continue_range_from_cursor_within_block() {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), 16);
        for _ in 0..10 {
            allocator.next_id().await.unwrap();
        }

        // when
        let range = allocator.id_range(6).await.unwrap();

        // then
        assert_eq!(range, vec![11, 12, 13, 14, 15, 16]);
        assert_eq!(store.increments(), 1);
    }

    #[tokio::test]
    async fn should_span_refill_when_range_exceeds_remaining() {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), 12);
        for _ in 0..10 {
            allocator.next_id().await.unwrap();
        }

        // when
        let range = allocator.id_range(6).await.unwrap();

        // then
        assert_eq!(range, vec![11, 12, 13, 14, 15, 16]);
        assert_eq!(store.increments(), 2);
        assert_eq!(allocator.peek_next_id().await, Some(17));
    }

    #[tokio::test]
    async fn should_reserve_one_block_per_block_size_issuances() {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), 8);

        // when
        for _ in 0..33 {
            allocator.next_id().await.unwrap();
        }

        // then
        assert_eq!(store.increments(), 5);
    }

    #[tokio::test]
    async fn should_refill_after_exact_exhaustion() {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), 4);
        allocator.id_range(4).await.unwrap();

        // when
        let peeked = allocator.peek_next_id().await;
        let next = allocator.next_id().await.unwrap();

        // then
        assert_eq!(peeked, None);
        assert_eq!(next, 5);
        assert_eq!(store.increments(), 2);
    }

    #[tokio::test]
    async fn should_oversize_reservation_for_large_range() {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), 10);

        // when
        let range = allocator.id_range(250).await.unwrap();
        let next = allocator.next_id().await.unwrap();

        // then
        assert_eq!(range, (1..=250).collect::<Vec<u64>>());
        assert_eq!(next, 251);
        assert_eq!(store.increments(), 2);
    }

    #[tokio::test]
    async fn should_keep_leftover_capacity_across_calls() {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), 100);
        allocator.id_range(95).await.unwrap();

        // when
        let range = allocator.id_range(20).await.unwrap();

        // then
        assert_eq!(range, (96..=115).collect::<Vec<u64>>());
        assert_eq!(store.increments(), 2);
        assert_eq!(allocator.peek_next_id().await, Some(116));
    }

    #[rstest]
    #[tokio::test]
    async fn should_reject_zero_count_without_reserving(#[values(1, 16)] block_size: u64) {
        // given
        let store = CountingStore::new();
        let allocator = block_allocator(store.clone(), block_size);

        // when
        let result = allocator.id_range(0).await;

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.increments(), 0);
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(16)]
    #[case(17)]
    #[case(1000)]
    #[tokio::test]
    async fn should_return_contiguous_range_of_requested_length(#[case] count: u64) {
        // given
        let allocator = block_allocator(CountingStore::new(), 16);
        allocator.next_id().await.unwrap();

        // when
        let range = allocator.id_range(count).await.unwrap();

        // then
        assert_eq!(range.len() as u64, count);
        assert_eq!(range, (range[0]..range[0] + count).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn should_issue_every_reserved_id_across_instances_mixing_ranges() {
        // given
        let store: Arc<dyn AtomicCounterStore> = CountingStore::new();
        let first = block_allocator(Arc::clone(&store), 5);
        let second = block_allocator(Arc::clone(&store), 5);

        // when
        let mut issued = Vec::new();
        for round in 0..20 {
            issued.push(first.next_id().await.unwrap());
            issued.extend(second.id_range(1 + round % 3).await.unwrap());
            issued.extend(first.id_range(1 + round % 7).await.unwrap());
        }
        // drain what each instance still holds so the union is complete
        while first.peek_next_id().await.is_some() {
            issued.push(first.next_id().await.unwrap());
        }
        while second.peek_next_id().await.is_some() {
            issued.push(second.next_id().await.unwrap());
        }

        // then
        let unique: HashSet<u64> = issued.iter().copied().collect();
        assert_eq!(unique.len(), issued.len());
        let max = *issued.iter().max().unwrap();
        assert_eq!(unique, (1..=max).collect::<HashSet<u64>>());
    }

    #[tokio::test]
    async fn should_issue_gap_free_ids_across_instances_using_next_id() {
        // given
        let store: Arc<dyn AtomicCounterStore> = CountingStore::new();
        let first = block_allocator(Arc::clone(&store), 3);
        let second = block_allocator(Arc::clone(&store), 4);

        // when
        let mut issued = Vec::new();
        for _ in 0..12 {
            issued.push(first.next_id().await.unwrap());
            issued.push(second.next_id().await.unwrap());
        }

        // then
        let unique: HashSet<u64> = issued.iter().copied().collect();
        assert_eq!(unique, (1..=24).collect::<HashSet<u64>>());
    }

    #[tokio::test]
    async fn should_drain_leftover_before_non_adjacent_refill() {
        // given
        let store: Arc<dyn AtomicCounterStore> = CountingStore::new();
        let allocator = block_allocator(Arc::clone(&store), 10);
        allocator.id_range(8).await.unwrap(); // holds 9..=10
        store.increment_and_get(&test_key(), 5).await.unwrap(); // 11..=15 elsewhere

        // when
        let range = allocator.id_range(4).await.unwrap();

        // then
        assert_eq!(range, vec![9, 10, 16, 17]);
        assert_eq!(allocator.peek_next_id().await, Some(18));
    }

    #[tokio::test]
    async fn should_not_lose_ids_when_instances_interleave_ranges() {
        // given
        let store: Arc<dyn AtomicCounterStore> = CountingStore::new();
        let first = block_allocator(Arc::clone(&store), 10);
        let second = block_allocator(Arc::clone(&store), 10);
        let mut issued = first.id_range(2).await.unwrap(); // first holds 3..=10
        issued.push(second.next_id().await.unwrap()); // second holds 12..=20

        // when
        let range = first.id_range(12).await.unwrap();
        issued.extend(range.iter().copied());
        while first.peek_next_id().await.is_some() {
            issued.push(first.next_id().await.unwrap());
        }
        while second.peek_next_id().await.is_some() {
            issued.push(second.next_id().await.unwrap());
        }

        // then
        let expected: Vec<u64> = (3..=10).chain(21..=24).collect();
        assert_eq!(range, expected);
        issued.sort_unstable();
        assert_eq!(issued, (1..=30).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn should_leave_state_untouched_when_reservation_fails() {
        // given
        let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
        let store = Arc::new(StorageCounterStore::new(storage.clone()));
        let allocator = block_allocator(store, 4);
        allocator.id_range(3).await.unwrap(); // holds 4..=4
        storage.fail_put(StorageError::Storage("unavailable".to_string()));

        // when
        let failed = allocator.id_range(3).await;
        let peeked = allocator.peek_next_id().await;
        storage.clear_put();
        let recovered = allocator.id_range(3).await.unwrap();

        // then
        assert_eq!(failed, Err(Error::Storage("unavailable".to_string())));
        assert_eq!(peeked, Some(4));
        assert_eq!(recovered, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn should_propagate_failure_from_next_id_on_empty_block() {
        // given
        let storage = FailingStorage::wrap(Arc::new(InMemoryStorage::new()));
        let store = Arc::new(StorageCounterStore::new(storage.clone()));
        let allocator = block_allocator(store, 4);
        storage.fail_get_once(StorageError::Storage("timeout".to_string()));

        // when
        let failed = allocator.next_id().await;
        let next = allocator.next_id().await;

        // then
        assert_eq!(failed, Err(Error::Storage("timeout".to_string())));
        assert_eq!(next, Ok(1));
    }

    #[tokio::test]
    async fn should_issue_unique_ids_to_concurrent_callers() {
        // given
        let allocator = Arc::new(block_allocator(CountingStore::new(), 16));

        // when
        let mut handles = Vec::new();
        for _ in 0..1000 {
            let allocator = Arc::clone(&allocator);
            handles.push(tokio::spawn(async move { allocator.next_id().await.unwrap() }));
        }
        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        // then
        assert_eq!(ids, (1..=1000).collect::<HashSet<u64>>());
    }

    #[tokio::test]
    async fn should_issue_ids_with_simple_allocator() {
        // given
        let store = CountingStore::new();
        let allocator = SimpleAllocator::new(store.clone(), test_key());

        // when
        let first = allocator.next_id().await.unwrap();
        let second = allocator.next_id().await.unwrap();
        let range = allocator.id_range(3).await.unwrap();

        // then
        assert_eq!((first, second), (1, 2));
        assert_eq!(range, vec![3, 4, 5]);
        assert_eq!(store.increments(), 3);
    }

    #[tokio::test]
    async fn should_serve_range_after_preseeded_total_with_simple_allocator() {
        // given
        let store = CountingStore::new();
        store.increment_and_get(&test_key(), 100).await.unwrap();
        let allocator = SimpleAllocator::new(store, test_key());

        // when
        let range = allocator.id_range(5).await.unwrap();

        // then
        assert_eq!(range, vec![101, 102, 103, 104, 105]);
    }

    #[tokio::test]
    async fn should_reject_zero_count_with_simple_allocator() {
        // given
        let store = CountingStore::new();
        let allocator = SimpleAllocator::new(store.clone(), test_key());

        // when
        let result = allocator.id_range(0).await;

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.increments(), 0);
    }

    #[tokio::test]
    async fn should_share_counter_between_simple_and_block_allocators() {
        // given
        let store: Arc<dyn AtomicCounterStore> = CountingStore::new();
        let block = block_allocator(Arc::clone(&store), 10);
        let simple = SimpleAllocator::new(Arc::clone(&store), test_key());

        // when
        let from_block = block.next_id().await.unwrap();
        let from_simple = simple.id_range(3).await.unwrap();

        // then
        assert_eq!(from_block, 1);
        assert_eq!(from_simple, vec![11, 12, 13]);
    }
}
