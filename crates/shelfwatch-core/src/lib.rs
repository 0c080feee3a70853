//! Core types, trait definitions, and the alert engine for shelfwatch.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The engine turns shelf-sensor snapshots into deduplicated, stateful
//! operational alerts; storage backends implement the traits in [`store`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod alert;
pub mod catalog;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod misplacement;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
