//! idgen - Globally unique, strictly increasing IDs over an atomic counter.
//!
//! idgen issues integer IDs to many concurrent callers across many processes.
//! Every logical sequence is backed by one counter that supports an atomic
//! add-and-return operation; each increment of `n` reserves the `n` IDs just
//! below the returned total for the caller.
//!
//! # Architecture
//!
//! The counter lives in a [`common::Storage`] (in memory or SlateDB) and is
//! accessed through an [`AtomicCounterStore`]. Allocators sit on top:
//!
//! - [`BlockAllocator`] reserves blocks of IDs per increment and serves
//!   requests from memory, amortizing round-trips to the store.
//! - [`SimpleAllocator`] increments the counter on every request.
//!
//! [`IdGenerator`] wires storage, counter and allocator together from a
//! [`Config`], and the [`server`] module exposes it over HTTP.
//!
//! # Guarantees
//!
//! - No ID is issued twice across all allocators sharing a counter.
//! - IDs returned by one allocator are strictly increasing.
//! - [`id_range`](IdAllocator::id_range) returns increasing IDs, consecutive
//!   unless another allocator on the same counter reserved in between.
//! - No reserved ID is discarded: once every allocator's held block is
//!   drained, the issued IDs are exactly `1..=total`.
//! - ID `0` is never issued.
//!
//! IDs reserved but not handed out before a process exits are never issued.
//!
//! # Example
//!
//! ```ignore
//! use idgen::{Config, IdAllocator, IdGenerator};
//!
//! let generator = IdGenerator::open(Config::default()).await?;
//! let id = generator.next_id().await?;
//! let batch = generator.id_range(100).await?;
//! ```

mod allocator;
mod config;
mod counter;
mod error;
mod idgen;
mod model;
mod serde;
pub mod server;

pub use allocator::{BlockAllocator, DEFAULT_BLOCK_SIZE, IdAllocator, SimpleAllocator};
pub use config::{AllocatorConfig, Config};
pub use counter::{AtomicCounterStore, StorageCounterStore};
pub use error::{Error, Result};
pub use idgen::IdGenerator;
pub use model::{CounterKey, ReservedBlock};
