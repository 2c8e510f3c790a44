//! Shared test utilities for ductwork integration tests.
//!
//! This module provides:
//! - Builder patterns for desired-state entities
//! - `MockInstance`, an in-memory instance API recording every call

pub mod builders;
pub mod mock;

pub use builders::*;
pub use mock::MockInstance;
