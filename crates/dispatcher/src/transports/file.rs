//! FileTransport - appends envelopes to JSON-lines files

use contracts::{encode_batch, ContractError, Destination, Message, QueueEnvelope, Transport};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

/// Configuration for FileTransport
#[derive(Debug, Clone)]
pub struct FileTransportConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileTransportConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./outbox"));

        Self { base_path }
    }
}

/// Transport that writes one line per envelope to `<base_path>/<endpoint>.jsonl`
pub struct FileTransport {
    name: String,
    config: FileTransportConfig,
    // serializes appends so lines from concurrent flushes never interleave
    write_lock: Mutex<()>,
}

impl FileTransport {
    /// Create a new FileTransport
    pub fn new(name: impl Into<String>, config: FileTransportConfig) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileTransportConfig::from_params(params))
    }

    /// Output file for a destination
    pub fn path_for(&self, destination: &Destination) -> PathBuf {
        self.config
            .base_path
            .join(format!("{}.jsonl", destination.endpoint))
    }

    async fn append_lines<S: Serialize>(
        &self,
        destination: &Destination,
        records: &[S],
    ) -> Result<(), ContractError> {
        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        let path = self.path_for(destination);
        let _guard = self.write_lock.lock().await;

        let result = async {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            file.write_all(&buf).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            error!(
                transport = %self.name,
                path = %path.display(),
                error = %e,
                "Failed to append envelopes"
            );
            return Err(ContractError::transport(
                &self.name,
                destination.name.as_str(),
                e.to_string(),
            ));
        }

        debug!(
            transport = %self.name,
            path = %path.display(),
            lines = records.len(),
            "Envelopes appended"
        );
        Ok(())
    }
}

impl Transport for FileTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_transport_send_one",
        skip(self, destination, message),
        fields(destination = %destination.name, message_id = %message.id)
    )]
    async fn send_one(
        &self,
        destination: &Destination,
        message: &Message,
    ) -> Result<(), ContractError> {
        let envelope = QueueEnvelope::from_message(message)?;
        self.append_lines(destination, &[envelope]).await
    }

    #[instrument(
        name = "file_transport_send_batch",
        skip(self, destination, messages),
        fields(destination = %destination.name, batch_len = messages.len())
    )]
    async fn send_batch(
        &self,
        destination: &Destination,
        messages: &[Message],
    ) -> Result<(), ContractError> {
        let entries = encode_batch(messages)?;
        self.append_lines(destination, &entries).await
    }
}
