//! Data types shared by the counter store and the allocators.

use crate::error::{Error, Result};

/// Name of one logical ID sequence.
///
/// Every allocator using the same key draws from the same counter, so IDs are
/// unique across all of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey(String);

impl CounterKey {
    /// Creates a counter key. The name must not be empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "counter key must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inclusive range of IDs, `start..=end`, reserved by one counter increment.
///
/// A block is never empty: `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedBlock {
    pub start: u64,
    pub end: u64,
}

impl ReservedBlock {
    /// Derives the block reserved by an increment of `size` that produced
    /// `new_total`: `new_total - size + 1 ..= new_total`.
    ///
    /// Fails if `size` is zero, or if `new_total` is too small to contain a
    /// block of `size` IDs starting at 1, which means the store broke its
    /// contract.
    pub fn from_total(new_total: u64, size: u64) -> Result<Self> {
        if size == 0 {
            return Err(Error::Internal(
                "cannot derive a block from a zero-sized increment".to_string(),
            ));
        }
        if new_total < size {
            return Err(Error::Internal(format!(
                "counter total {} is smaller than the increment {}",
                new_total, size
            )));
        }
        Ok(Self {
            start: new_total - size + 1,
            end: new_total,
        })
    }

    /// Number of IDs in the block.
    ///
    /// Saturates at `u64::MAX` for the single block covering every ID.
    pub fn size(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// Returns true if `next` directly follows this block.
    pub fn is_followed_by(&self, next: &ReservedBlock) -> bool {
        self.end.checked_add(1) == Some(next.start)
    }

    /// Splits off the first `count` IDs.
    ///
    /// Returns the taken prefix and whatever remains, or `None` for the
    /// remainder when the whole block was taken. `count` must be at least 1;
    /// a count larger than the block takes the whole block.
    pub fn split_front(self, count: u64) -> (ReservedBlock, Option<ReservedBlock>) {
        debug_assert!(count > 0, "split_front requires a positive count");
        if count >= self.size() {
            return (self, None);
        }
        let last = self.start + count - 1;
        (
            ReservedBlock {
                start: self.start,
                end: last,
            },
            Some(ReservedBlock {
                start: last + 1,
                end: self.end,
            }),
        )
    }

    /// All IDs in the block, in increasing order.
    pub fn ids(&self) -> Vec<u64> {
        (self.start..=self.end).collect()
    }
}
