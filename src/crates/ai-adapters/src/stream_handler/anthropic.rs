use crate::types::anthropic::{
    AnthropicSSEError, ContentBlockDelta, MessageDelta, MessageStart, Usage,
};
use crate::types::unified::UnifiedResponse;
use anyhow::{anyhow, Result};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use log::{debug, error, trace};
use reqwest::Response;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Convert an Anthropic SSE byte stream into unified responses.
///
/// The sender is dropped on `message_stop`, so a closed channel without a
/// trailing `Err` means the generation finished normally.
///
/// # Arguments
/// * `response` - HTTP response with an `text/event-stream` body
/// * `tx_event` - parsed event sender
/// * `idle_timeout` - maximum wait between two SSE events
pub async fn handle_anthropic_stream(
    response: Response,
    tx_event: mpsc::UnboundedSender<Result<UnifiedResponse>>,
    idle_timeout: Duration,
) {
    let mut stream = response.bytes_stream().eventsource();
    let mut usage = Usage::default();

    loop {
        let sse_event = timeout(idle_timeout, stream.next()).await;
        let sse = match sse_event {
            Ok(Some(Ok(sse))) => sse,
            Ok(None) => {
                let error_msg = "SSE Error: stream closed before response completed";
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
            Ok(Some(Err(e))) => {
                let error_msg = format!("SSE Error: {}", e);
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
            Err(_) => {
                let error_msg = format!("SSE Timeout: no event within {}s", idle_timeout.as_secs());
                error!("{}", error_msg);
                let _ = tx_event.send(Err(anyhow!(error_msg)));
                return;
            }
        };

        trace!("Anthropic SSE: {:?}", sse);
        let event_type = sse.event;
        let data = sse.data;

        match event_type.as_str() {
            "message_start" => {
                let message_start: MessageStart = match serde_json::from_str(&data) {
                    Ok(message_start) => message_start,
                    Err(e) => {
                        error!("SSE Parsing Error: {e}, data: {}", &data);
                        continue;
                    }
                };
                if let Some(message_usage) = message_start.message.usage {
                    usage.update(&message_usage);
                }
            }
            "content_block_delta" => {
                let content_block_delta: ContentBlockDelta = match serde_json::from_str(&data) {
                    Ok(content_block_delta) => content_block_delta,
                    Err(e) => {
                        error!("SSE Parsing Error: {e}, data: {}", &data);
                        continue;
                    }
                };
                match UnifiedResponse::try_from(content_block_delta) {
                    Ok(unified_response) => {
                        trace!("Anthropic unified response: {:?}", unified_response);
                        if tx_event.send(Ok(unified_response)).is_err() {
                            debug!("Anthropic stream receiver dropped, stopping");
                            return;
                        }
                    }
                    Err(e) => {
                        debug!("Skipping content_block_delta: {}", e);
                    }
                };
            }
            "message_delta" => {
                let mut message_delta: MessageDelta = match serde_json::from_str(&data) {
                    Ok(message_delta) => message_delta,
                    Err(e) => {
                        error!("SSE Parsing Error: {e}, data: {}", &data);
                        continue;
                    }
                };
                if let Some(delta_usage) = message_delta.usage.as_ref() {
                    usage.update(delta_usage);
                }
                message_delta.usage = if usage.is_empty() {
                    None
                } else {
                    Some(usage.clone())
                };
                let unified_response = UnifiedResponse::from(message_delta);
                trace!("Anthropic unified response: {:?}", unified_response);
                let _ = tx_event.send(Ok(unified_response));
            }
            "error" => {
                let sse_error: AnthropicSSEError = match serde_json::from_str(&data) {
                    Ok(sse_error) => sse_error,
                    Err(e) => {
                        let err_str = format!("SSE Parsing Error: {e}, data: {}", &data);
                        error!("{}", err_str);
                        let _ = tx_event.send(Err(anyhow!(err_str)));
                        return;
                    }
                };
                let _ = tx_event.send(Err(anyhow!(String::from(sse_error.error))));
                return;
            }
            "message_stop" => {
                return;
            }
            _ => {}
        }
    }
}
