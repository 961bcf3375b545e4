//! HttpTransport - POSTs envelopes to queue endpoints

use contracts::{encode_batch, ContractError, Destination, Message, QueueEnvelope, Transport};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Configuration for HttpTransport
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Optional bearer token sent with every request
    pub auth_token: Option<String>,
}

impl HttpTransportConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let timeout_ms = match params.get("timeout_ms") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| format!("invalid timeout_ms '{}': {}", raw, e))?,
            None => 5000,
        };

        let auth_token = params
            .get("auth_token")
            .filter(|t| !t.trim().is_empty())
            .cloned();

        Ok(Self {
            timeout: Duration::from_millis(timeout_ms),
            auth_token,
        })
    }
}

/// Body of a batch request
#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    entries: &'a [contracts::BatchEntry],
}

/// Transport that POSTs JSON to the destination endpoint URL
pub struct HttpTransport {
    name: String,
    config: HttpTransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new HttpTransport
    pub fn new(name: impl Into<String>, config: HttpTransportConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("notify-dispatch/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("failed to create HTTP client: {}", e))?;

        Ok(Self {
            name: name.into(),
            config,
            client,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, String> {
        Self::new(name, HttpTransportConfig::from_params(params)?)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        destination: &Destination,
        body: &B,
    ) -> Result<(), ContractError> {
        let mut request = self.client.post(&destination.endpoint).json(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            ContractError::transport(&self.name, destination.name.as_str(), e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            warn!(
                transport = %self.name,
                destination = %destination.name,
                status = status.as_u16(),
                "Queue endpoint rejected request"
            );
            return Err(ContractError::transport(
                &self.name,
                destination.name.as_str(),
                format!("status={} body={}", status.as_u16(), body_text),
            ));
        }

        debug!(
            transport = %self.name,
            destination = %destination.name,
            status = status.as_u16(),
            "Request accepted"
        );
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_transport_send_one",
        skip(self, destination, message),
        fields(destination = %destination.name, message_id = %message.id)
    )]
    async fn send_one(
        &self,
        destination: &Destination,
        message: &Message,
    ) -> Result<(), ContractError> {
        let envelope = QueueEnvelope::from_message(message)?;
        self.post(destination, &envelope).await
    }

    #[instrument(
        name = "http_transport_send_batch",
        skip(self, destination, messages),
        fields(destination = %destination.name, batch_len = messages.len())
    )]
    async fn send_batch(
        &self,
        destination: &Destination,
        messages: &[Message],
    ) -> Result<(), ContractError> {
        let entries = encode_batch(messages)?;
        self.post(destination, &BatchRequest { entries: &entries })
            .await
    }
}
