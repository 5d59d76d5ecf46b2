//! mercato-middleware
//!
//! Wrappers that sit between the service and a provider adapter.
//!
//! - [`RateLimitedAdapter`]: sliding-window request budget consulted before
//!   every outbound call. An exhausted budget surfaces as
//!   `MercatoError::RateLimited`, the same error a provider returns when it
//!   throttles us, so both paths share the registry's cooldown handling.

mod rate_limit;

pub use crate::rate_limit::{RateLimitMiddleware, RateLimitedAdapter, RateLimiter};
