//! HTTP server for idgen.
//!
//! Exposes the shared allocator over REST endpoints:
//!
//! - `GET /next`: one ID.
//! - `GET /range?count=N`: `N` IDs in increasing order.
//! - `GET /-/healthy`, `GET /-/ready`: probes.
//! - `GET /metrics`: Prometheus metrics.

mod config;
mod error;
mod handlers;
mod metrics;
mod middleware;
mod request;
mod response;
mod server;

pub use config::{CliArgs, IdServerConfig};
pub use request::MAX_RANGE_COUNT;
pub use server::{IdServer, build_app};
