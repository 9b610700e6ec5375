//! Foundation types for the profile tree.
//!
//! This module provides the pieces every other layer builds on:
//! - [`ProfileError`] / [`ProfileResult`] - the crate error type
//! - [`EventEmitter`] - ordered observer lists replacing signal/slot wiring
//! - Domain constants (sentinel container ids, generic definition id)
//!
//! This module has NO dependencies on other crate modules.

pub mod constants;
mod error;
mod events;

pub use error::{ProfileError, ProfileResult};
pub use events::{EventEmitter, SubscriptionId};
