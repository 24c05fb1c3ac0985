//! # Exchange Rates
//!
//! One-shot retrieval of currency rates relative to a base currency.
//! The fetch never fails from the caller's point of view: any problem (non-2xx
//! status, undecodable body, transport error) is logged and reported as an
//! empty map, which the UI treats as "rates unavailable".

use std::collections::HashMap;

use serde::Deserialize;

use crate::retrieve::ky_http::{ApiClient, RetrieveError};

/// Base currency used when none is given.
pub const DEFAULT_BASE_CURRENCY: &str = "RUB";

/// Public rate API; the base currency code is appended as the last segment.
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/";

/// Currency code → rate against the base currency.
pub type RateTable = HashMap<String, f64>;

#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: RateTable,
}

/// Client for the rate API.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    client: ApiClient,
}

impl ExchangeRates {
    /// A client for the rate API rooted at `base_url`. Each fetch is a single
    /// GET; failures are not retried.
    pub fn new(base_url: &str) -> Result<Self, RetrieveError> {
        Ok(Self::with_client(ApiClient::new(base_url, 0)?))
    }

    /// Wraps an already configured [`ApiClient`].
    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetches the rate table for `base` (empty or blank means
    /// [`DEFAULT_BASE_CURRENCY`]). Returns an empty table on any failure.
    pub async fn fetch_exchange_rates(&self, base: &str) -> RateTable {
        let base = normalize_base(base);

        match self.client.get_json::<RatesPayload>(&base).await {
            Ok(response) if response.success => {
                let rates = response.data.map(|payload| payload.rates).unwrap_or_default();
                tracing::debug!(base = %base, currencies = rates.len(), "exchange rates fetched");
                rates
            }
            Ok(response) => {
                tracing::error!(
                    base = %base,
                    status = response.status,
                    body = response.error_body.as_deref().unwrap_or(""),
                    "exchange rate request failed"
                );
                RateTable::new()
            }
            Err(e) => {
                tracing::error!(base = %base, error = %e, "exchange rate request failed");
                RateTable::new()
            }
        }
    }
}

/// Fetches rates for `base` from [`DEFAULT_RATES_URL`].
pub async fn fetch_exchange_rates(base: &str) -> RateTable {
    match ExchangeRates::new(DEFAULT_RATES_URL) {
        Ok(client) => client.fetch_exchange_rates(base).await,
        Err(e) => {
            tracing::error!(error = %e, "exchange rate client unavailable");
            RateTable::new()
        }
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        DEFAULT_BASE_CURRENCY.to_string()
    } else {
        trimmed.to_ascii_uppercase()
    }
}
