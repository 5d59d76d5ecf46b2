//! mercato-core
//!
//! Provider adapter traits shared across the mercato ecosystem.
//!
//! - `adapter`: the `ProviderAdapter` trait and its per-data-type role traits.
//! - `middleware`: the `Middleware` trait for adapter wrappers.
//! - Re-exports every type from `mercato-types` so adapter crates need a
//!   single dependency.
//!
//! Adapters are async (via `async-trait`) and must be `Send + Sync`; the
//! service drives them on a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Adapter capability traits and the primary `ProviderAdapter` interface.
pub mod adapter;
/// Middleware trait implemented by adapter wrappers.
pub mod middleware;

pub use adapter::{ProviderAdapter, fetch_from};
pub use middleware::Middleware;
pub use mercato_types::*;
