//! # Data Retrieval Module
//!
//! Generic HTTP retrieval shared by the market-data clients. Request building,
//! retries and response classification live here so callers only deal with
//! parsing and degradation.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `ApiClient`, built on `reqwest` and `reqwest-middleware`,
//!   with exponential-backoff retries.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with retry middleware.
pub mod ky_http;

pub use ky_http::{ApiClient, ApiResponse, RetrieveError};
