//! HTTP client for the detection backend.
//!
//! [`BackendClient`] uploads media for analysis and delivers feedback. It
//! implements [`falsify_core::feedback::FeedbackNotifier`], so it plugs
//! straight into the feedback workflow.

mod client;
pub mod error;

pub use client::{BackendClient, ClientConfig, UploadResponse};
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
