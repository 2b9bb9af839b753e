//! HTTP/JSON quote source implementation.
//!
//! Fetches snapshots from a broker-style quote endpoint that takes a
//! comma-separated list of instrument tokens and returns per-token OHLC,
//! last price, circuit limits, and last-trade time.
//!
//! # Request Format
//!
//! `GET {base_url}/quotes?i={token},{token},...` with an `X-Api-Key`
//! header. Requests are chunked so a large universe never exceeds the
//! endpoint's URL limits.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::warn;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::market_data::{Ohlc, QuoteSnapshot, QuoteSourceError, QuoteSourceTrait};

const SOURCE_ID: &str = "BROKER_HTTP";

/// Default HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum tokens per request; broker quote endpoints cap the batch size.
const MAX_TOKENS_PER_REQUEST: usize = 250;

/// Timestamp format used by the quote endpoint for last-trade times.
const LTT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    status: String,
    #[serde(default)]
    data: HashMap<String, QuoteDto>,
}

#[derive(Debug, Deserialize)]
struct QuoteDto {
    instrument_token: i64,
    #[serde(default)]
    ohlc: OhlcDto,
    last_price: Decimal,
    lower_circuit_limit: Decimal,
    upper_circuit_limit: Decimal,
    /// "%Y-%m-%d %H:%M:%S", empty or absent when the instrument has not
    /// traded.
    #[serde(default)]
    last_trade_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OhlcDto {
    #[serde(default)]
    open: Decimal,
    #[serde(default)]
    high: Decimal,
    #[serde(default)]
    low: Decimal,
    #[serde(default)]
    close: Decimal,
}

/// Broker HTTP quote source.
pub struct HttpQuoteSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpQuoteSource {
    /// Create a new source against the given endpoint.
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn fetch_chunk(&self, tokens: &[i64]) -> Result<Vec<QuoteSnapshot>, QuoteSourceError> {
        let joined = tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/quotes?i={}", self.base_url, joined);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QuoteSourceError::Timeout {
                        source_id: SOURCE_ID.to_string(),
                    }
                } else {
                    QuoteSourceError::Network(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteSourceError::RateLimited {
                source_id: SOURCE_ID.to_string(),
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(QuoteSourceError::AuthFailed {
                source_id: SOURCE_ID.to_string(),
            });
        }
        if !status.is_success() {
            return Err(QuoteSourceError::BadResponse {
                source_id: SOURCE_ID.to_string(),
                message: format!("HTTP error: {}", status),
            });
        }

        let envelope: QuoteEnvelope =
            response
                .json()
                .await
                .map_err(|e| QuoteSourceError::BadResponse {
                    source_id: SOURCE_ID.to_string(),
                    message: e.to_string(),
                })?;

        if envelope.status != "success" {
            return Err(QuoteSourceError::BadResponse {
                source_id: SOURCE_ID.to_string(),
                message: format!("status: {}", envelope.status),
            });
        }

        Ok(envelope
            .data
            .into_values()
            .map(QuoteSnapshot::from)
            .collect())
    }
}

impl From<QuoteDto> for QuoteSnapshot {
    fn from(dto: QuoteDto) -> Self {
        let last_trade_time = dto
            .last_trade_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| NaiveDateTime::parse_from_str(s, LTT_FORMAT).ok())
            .filter(|ltt| !is_default_ltt(ltt));

        QuoteSnapshot {
            instrument_token: dto.instrument_token,
            ohlc: Ohlc {
                open: dto.ohlc.open,
                high: dto.ohlc.high,
                low: dto.ohlc.low,
                close: dto.ohlc.close,
            },
            last_price: dto.last_price,
            lower_circuit_limit: dto.lower_circuit_limit,
            upper_circuit_limit: dto.upper_circuit_limit,
            last_trade_time,
        }
    }
}

/// Sources report never-traded instruments with an epoch/default
/// timestamp rather than omitting the field.
fn is_default_ltt(ltt: &NaiveDateTime) -> bool {
    ltt.and_utc().timestamp() <= 0
}

#[async_trait]
impl QuoteSourceTrait for HttpQuoteSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    async fn fetch_quotes(
        &self,
        instrument_tokens: &[i64],
    ) -> Result<Vec<QuoteSnapshot>, QuoteSourceError> {
        let mut snapshots = Vec::with_capacity(instrument_tokens.len());

        for chunk in instrument_tokens.chunks(MAX_TOKENS_PER_REQUEST) {
            let mut batch = self.fetch_chunk(chunk).await?;
            if batch.len() < chunk.len() {
                warn!(
                    "{}: {} of {} requested instruments missing from response",
                    SOURCE_ID,
                    chunk.len() - batch.len(),
                    chunk.len()
                );
            }
            snapshots.append(&mut batch);
        }

        Ok(snapshots)
    }
}
