//! # Markets Module
//!
//! Market-data clients built on the [`crate::retrieve`] layer.
//!
//! - **`rates`**: currency exchange rates for the price display.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Currency exchange rates.
pub mod rates;

pub use rates::{fetch_exchange_rates, ExchangeRates, RateTable};
