//! Retry with exponential backoff
//!
//! [`RetryPolicy`] is plain configuration; [`retry`] drives any fallible
//! async operation with it. The HTTP client layers its idempotency rules on
//! top through [`retry_when`].

pub mod executor;
pub mod policy;

pub use executor::{retry, retry_when};
pub use policy::{RetryObserver, RetryPolicy, RetryPredicate, DEFAULT_RETRYABLE_STATUSES};
