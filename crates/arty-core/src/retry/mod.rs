//! Retry execution engine with policy-based configuration
//!
//! # Features
//!
//! - Strategies: fixed, exponential, and incrementing backoff
//! - Optional jitter
//! - `RetryPredicate` to separate fatal errors from transient ones
//! - `DelayOverride` to give specific errors their own backoff schedule
//! - Observable attempts via `RetryObserver`, with `TracingObserver` for logs
//!
//! # Example
//!
//! ```rust,no_run
//! use arty_core::retry::{RetryError, RetryExecutorBuilder, TracingObserver};
//! use arty_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, RetryError<std::io::Error>> {
//!     RetryExecutorBuilder::new()
//!         .with_policy(RetryPolicy::for_actions(3))
//!         .with_observer(TracingObserver::new("example"))
//!         .build()
//!         .execute(|| async { Ok("done".to_string()) })
//!         .await
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::{RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, TracingObserver};
pub use strategies::{
    calculate_delay, AlwaysRetry, ClosurePredicate, DefaultDelay, DelayOverride, HttpStatusError,
    HttpStatusPredicate, RetryPredicate, StatusBackoff,
};
