//! Core types and the history ledger for the falsify analysis client.
//!
//! This crate is free of HTTP and database dependencies. Storage
//! backends implement [`storage::HistoryStorage`]; the HTTP client implements
//! [`feedback::FeedbackNotifier`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod category;
pub mod error;
pub mod feedback;
pub mod ledger;
pub mod payload;
pub mod record;
pub mod stats;
pub mod storage;

pub use category::{Category, HistoryFilter};
pub use error::{Error, Result};
pub use ledger::{HISTORY_CAPACITY, HistoryLedger};
