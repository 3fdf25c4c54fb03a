//! SSE push client
//!
//! Subscribes to the service's `text/event-stream` endpoint and forwards
//! every frame whose event name matches the subscription as a decoded
//! measurement. The connection is re-established after `reconnect_delay`
//! whenever it drops; the subscriber only sees a continuous stream.

use futures::StreamExt;
use sigmon_common::config::TomlConfig;
use sigmon_common::{Measurement, TransportError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{PushChannel, PushSubscription};

/// One dispatched SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// `message` when the frame carried no `event:` field
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Incremental `text/event-stream` parser
///
/// Bytes may be split anywhere, including inside a UTF-8 sequence or
/// between `\r` and `\n`; partial lines are buffered until complete.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every frame completed by them
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop(); // '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // retry and unknown fields are ignored
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
            id: self.id.clone(),
        })
    }
}

/// SSE-backed push channel
pub struct SsePushChannel {
    http_client: reqwest::Client,
    url: String,
    reconnect_delay: Duration,
}

impl SsePushChannel {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Result<Self, TransportError> {
        // No overall timeout: the stream is long-lived
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
            reconnect_delay,
        })
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self, TransportError> {
        Self::new(config.push_url(), config.reconnect_delay())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PushChannel for SsePushChannel {
    fn subscribe(&self, event_name: &str) -> Result<PushSubscription, TransportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Closed(format!("no async runtime: {}", e)))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_connection_loop(
            self.http_client.clone(),
            self.url.clone(),
            event_name.to_string(),
            self.reconnect_delay,
            tx,
        ));

        info!(url = %self.url, event = %event_name, "Push subscription opened");
        Ok(PushSubscription::new(rx, move || task.abort()))
    }
}

async fn run_connection_loop(
    client: reqwest::Client,
    url: String,
    event_name: String,
    reconnect_delay: Duration,
    tx: mpsc::UnboundedSender<Measurement>,
) {
    loop {
        match stream_once(&client, &url, &event_name, &tx).await {
            Ok(()) => debug!(url = %url, "Push stream ended"),
            Err(e) => warn!(url = %url, "Push stream error: {}", e),
        }

        if tx.is_closed() {
            break;
        }

        debug!("Reconnecting push stream in {:?}", reconnect_delay);
        tokio::time::sleep(reconnect_delay).await;
    }

    debug!(url = %url, "Push connection loop stopped");
}

/// Hold one connection open until it ends or the subscriber goes away
async fn stream_once(
    client: &reqwest::Client,
    url: &str,
    event_name: &str,
    tx: &mpsc::UnboundedSender<Measurement>,
) -> Result<(), TransportError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(TransportError::Status(status.as_u16(), error_text));
    }

    info!(url = %url, "Push stream connected");

    let mut parser = SseParser::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| TransportError::Network(e.to_string()))?;

        for frame in parser.feed(&chunk) {
            if frame.event != event_name {
                continue;
            }
            match Measurement::from_json_str(&frame.data) {
                Ok(measurement) => {
                    if tx.send(measurement).is_err() {
                        return Ok(());
                    }
                }
                Err(e) => warn!(event = %frame.event, "Skipping push record: {}", e),
            }
        }
    }

    Ok(())
}
