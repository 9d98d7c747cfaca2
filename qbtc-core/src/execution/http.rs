// ====
// HTTP Execution Sink
// ====
// Forwards amplification requests to an external order-execution service.
// ====

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::errors::ExecutionError;
use super::traits::ExecutionSink;

const AMPLIFY_PATH: &str = "/positions/amplify";

#[derive(Debug, Serialize)]
struct AmplifyRequest<'a> {
    symbol: &'a str,
    leverage: f64,
    size: Decimal,
}

pub struct HttpExecutionSink {
    /// HTTP client
    client: Client,
    /// Full URL of the amplify endpoint
    url: String,
}

impl HttpExecutionSink {
    /// Example:
    /// ```no_run
    /// use qbtc_core::execution::HttpExecutionSink;
    /// use std::time::Duration;
    ///
    /// let sink = HttpExecutionSink::new("http://localhost:14503", Duration::from_secs(5)).unwrap();
    /// ```
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ExecutionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}{}", endpoint.trim_end_matches('/'), AMPLIFY_PATH),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExecutionSink for HttpExecutionSink {
    async fn execute_amplification(
        &self,
        symbol: &str,
        new_leverage: f64,
        new_size: Decimal,
    ) -> Result<(), ExecutionError> {
        let body = AmplifyRequest {
            symbol,
            leverage: new_leverage,
            size: new_size,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExecutionError::Timeout(symbol.to_string())
                } else {
                    ExecutionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Amplification accepted for {} ({})", symbol, status);
            return Ok(());
        }

        let reason = response.text().await.unwrap_or_default();
        Err(ExecutionError::Rejected {
            symbol: symbol.to_string(),
            reason: if reason.is_empty() {
                status.to_string()
            } else {
                format!("{}: {}", status, reason)
            },
        })
    }
}
