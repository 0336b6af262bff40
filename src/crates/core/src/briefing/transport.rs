//! Client side of `POST /api/briefing`

use super::types::BriefingRequest;
use crate::util::errors::{OneThingError, OneThingResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, warn};

/// Raw response body fragments in arrival order.
pub type ByteStream = BoxStream<'static, OneThingResult<Vec<u8>>>;

#[async_trait]
pub trait BriefingTransport: Send + Sync {
    /// Send one turn and return the streamed reply body.
    ///
    /// Must fail (rather than stream an error body) on a non-success status.
    async fn open_stream(&self, request: &BriefingRequest) -> OneThingResult<ByteStream>;
}

pub struct HttpBriefingTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBriefingTransport {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/briefing", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl BriefingTransport for HttpBriefingTransport {
    async fn open_stream(&self, request: &BriefingRequest) -> OneThingResult<ByteStream> {
        debug!(
            "Briefing request: endpoint={}, messages={}, tasks={}",
            self.endpoint,
            request.messages.len(),
            request.tasks.len()
        );

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Briefing request rejected: status={}, body={}", status, body);
            return Err(OneThingError::Transport(format!(
                "Briefing request failed: status={}",
                status
            )));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(OneThingError::from));
        Ok(stream.boxed())
    }
}
